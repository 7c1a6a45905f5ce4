//! Seeded Voronoi site sampling
//!
//! Sites are drawn uniformly in `[-0.5, 0.5]²` from a ChaCha8 stream seeded
//! by the grid seed, so the same seed always yields the same sites on every
//! platform. Exact duplicates are redrawn; they would give an empty cell.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashSet;

/// Generate `count` distinct random sites
///
/// # Example
///
/// ```rust
/// use territory_grid::generation::generate_sites;
///
/// let sites = generate_sites(100, 42);
/// assert_eq!(sites.len(), 100);
/// assert_eq!(sites, generate_sites(100, 42));
/// ```
pub fn generate_sites(count: usize, seed: u32) -> Vec<DVec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
    let mut seen: FxHashSet<(u64, u64)> = FxHashSet::default();
    let mut sites = Vec::with_capacity(count);
    while sites.len() < count {
        let p = DVec2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5));
        if seen.insert((p.x.to_bits(), p.y.to_bits())) {
            sites.push(p);
        }
    }
    sites
}

/// Drop sites that coincide within `epsilon` with an earlier site
pub fn dedup_sites(sites: &[DVec2], epsilon: f64) -> Vec<DVec2> {
    let eps2 = epsilon * epsilon;
    let mut kept: Vec<DVec2> = Vec::with_capacity(sites.len());
    let mut sorted: Vec<usize> = (0..sites.len()).collect();
    sorted.sort_by(|&a, &b| sites[a].x.total_cmp(&sites[b].x));
    let mut drop = vec![false; sites.len()];
    for (k, &i) in sorted.iter().enumerate() {
        if drop[i] {
            continue;
        }
        for &j in &sorted[k + 1..] {
            if sites[j].x - sites[i].x > epsilon {
                break;
            }
            if sites[i].distance_squared(sites[j]) <= eps2 {
                // keep the earliest index
                if j > i {
                    drop[j] = true;
                } else {
                    drop[i] = true;
                }
            }
        }
    }
    for (i, &p) in sites.iter().enumerate() {
        if !drop[i] {
            kept.push(p);
        }
    }
    kept
}
