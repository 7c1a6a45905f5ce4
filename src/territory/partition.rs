//! Seeded region growing
//!
//! Every territory starts from one seed cell and claims one free neighbour
//! per visit, round after round, until a whole round claims nothing. Each
//! territory keeps a cursor into its own cell list: cells before the cursor
//! have no claimable neighbour left and are never scanned again.

use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cell::Cell;
use crate::config::{SeedMethod, TerritoryConfig, Topology};
use crate::graph::lattice_distance;

use super::Territory;

struct Growth<'a> {
    topology: Topology,
    even_layout: bool,
    config: &'a TerritoryConfig,
}

impl Growth<'_> {
    #[inline]
    fn usable(&self, cell: &Cell) -> bool {
        self.config.allow_in_invisible_cells || cell.effectively_visible()
    }

    fn in_range(&self, cells: &[Cell], origin: usize, candidate: usize) -> bool {
        match self.config.max_range {
            Some(max) if self.topology.is_regular() => {
                lattice_distance(self.topology, self.even_layout, &cells[origin], &cells[candidate])
                    .map_or(true, |d| d <= max)
            }
            _ => true,
        }
    }

    /// First claimable neighbour of `cell` for a territory grown from `origin`
    fn claimable(&self, cells: &[Cell], cell: usize, origin: usize) -> Option<usize> {
        cells[cell].neighbours.iter().copied().find(|&n| {
            cells[n].territory_index.is_none()
                && self.usable(&cells[n])
                && self.in_range(cells, origin, n)
        })
    }
}

/// Assign every reachable cell to one of `config.count` territories
///
/// The territory count is clamped to the number of usable cells. Cells that
/// no territory can reach stay unassigned. The result is a pure function of
/// the cells and the configuration.
pub fn partition(
    cells: &mut [Cell],
    topology: Topology,
    even_layout: bool,
    config: &TerritoryConfig,
) -> Vec<Territory> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed as u64);
    let growth = Growth {
        topology,
        even_layout,
        config,
    };

    for cell in cells.iter_mut() {
        cell.territory_index = None;
    }

    let usable = cells.iter().filter(|c| growth.usable(c)).count();
    let count = config.count.min(usable);
    if count < config.count {
        debug!(
            "territory count {} clamped to {} usable cells",
            config.count, count
        );
    }

    let mut territories: Vec<Territory> = (0..count).map(Territory::new).collect();
    for (t, territory) in territories.iter_mut().enumerate() {
        let user = match config.seed_method {
            SeedMethod::UserDefined => config.user_seeds.get(t).copied().filter(|&i| {
                i < cells.len() && cells[i].territory_index.is_none() && growth.usable(&cells[i])
            }),
            SeedMethod::RandomBasedOnSeed => None,
        };
        let seed = user.or_else(|| {
            let start = rng.gen_range(0..cells.len());
            (start..cells.len())
                .chain(0..start)
                .find(|&i| cells[i].territory_index.is_none() && growth.usable(&cells[i]))
        });
        if let Some(seed) = seed {
            cells[seed].territory_index = Some(t);
            territory.cells.push(seed);
            territory.origin = Some(seed);
        }
    }

    let mut cursors = vec![0usize; count];
    let mut round = 0;
    loop {
        if config.max_iterations > 0 && round >= config.max_iterations {
            break;
        }
        round += 1;
        let mut claimed_in_round = 0;

        let mut k = 0;
        while k < count {
            if grow_once(&growth, cells, &mut territories[k], &mut cursors[k], &mut rng) {
                claimed_in_round += 1;
                let revisit = (1.0 - (k as f64 + config.asymmetry) / count as f64).clamp(0.0, 1.0);
                if revisit > 0.0 && rng.gen::<f64>() < revisit {
                    continue;
                }
            }
            k += 1;
        }

        trace!("growth round {} claimed {} cells", round, claimed_in_round);
        if claimed_in_round == 0 {
            break;
        }
    }

    for territory in &mut territories {
        territory.update_center(cells);
    }
    debug!(
        "partitioned {} cells into {} territories in {} rounds",
        cells.len(),
        territories.len(),
        round
    );
    territories
}

/// Claim a single cell for `territory`; false when it cannot grow
fn grow_once(
    growth: &Growth,
    cells: &mut [Cell],
    territory: &mut Territory,
    cursor: &mut usize,
    rng: &mut ChaCha8Rng,
) -> bool {
    let Some(origin) = territory.origin else {
        return false;
    };
    let len = territory.cells.len();
    if *cursor >= len {
        return false;
    }

    let organic = growth.config.organic;
    let start = if organic > 0.0 {
        let offset = ((len - *cursor) as f64 * rng.gen::<f64>() * organic) as usize;
        (*cursor + offset).min(len - 1)
    } else {
        *cursor
    };

    let order = (start..len).chain(*cursor..start);
    for i in order {
        let cell = territory.cells[i];
        match growth.claimable(cells, cell, origin) {
            Some(n) => {
                cells[n].territory_index = Some(territory.index);
                territory.cells.push(n);
                return true;
            }
            None => {
                if i == *cursor {
                    *cursor += 1;
                }
            }
        }
    }
    false
}
