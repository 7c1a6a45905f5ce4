//! Stitching loose segments into closed contours
//!
//! Frontier segments come out of the grid in arbitrary order and direction.
//! The connector snaps their endpoints together within [`MIN_VERTEX_DISTANCE`],
//! walks the resulting vertex graph into closed rings, and splits rings that
//! pass through the same vertex twice (two cells of a territory touching only
//! at a corner).

use glam::DVec2;
use log::trace;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::polygon::Contour;
use super::segment::Segment;

/// Endpoints closer than this are treated as the same vertex
pub const MIN_VERTEX_DISTANCE: f64 = 1e-6;

/// Accumulates segments and stitches them into contours
#[derive(Debug, Clone, Default)]
pub struct Connector {
    edges: Vec<(DVec2, DVec2)>,
}

impl Connector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, start: DVec2, end: DVec2) {
        self.edges.push((start, end));
    }

    pub fn add_segment(&mut self, segment: &Segment) {
        self.add(segment.start, segment.end);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// Stitch every accumulated segment into closed contours
    ///
    /// Open chains and rings with fewer than three points are dropped.
    /// Orientation of the returned rings is unspecified.
    pub fn stitch(&self) -> Vec<Contour> {
        let mut pool = VertexPool::new(MIN_VERTEX_DISTANCE);
        let mut edges: Vec<(usize, usize)> = Vec::with_capacity(self.edges.len());
        for &(a, b) in &self.edges {
            let va = pool.snap(a);
            let vb = pool.snap(b);
            if va != vb {
                edges.push((va, vb));
            }
        }

        let mut incident: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); pool.points.len()];
        for (e, &(a, b)) in edges.iter().enumerate() {
            incident[a].push(e);
            incident[b].push(e);
        }

        let mut used = vec![false; edges.len()];
        let mut contours = Vec::new();
        for first in 0..edges.len() {
            if used[first] {
                continue;
            }
            used[first] = true;
            let (start, mut current) = edges[first];
            let mut ring = vec![start, current];
            let mut closed = false;
            loop {
                if current == start {
                    ring.pop();
                    closed = true;
                    break;
                }
                let next = incident[current].iter().copied().find(|&e| !used[e]);
                let Some(e) = next else { break };
                used[e] = true;
                let (a, b) = edges[e];
                current = if a == current { b } else { a };
                ring.push(current);
            }
            if !closed {
                trace!("connector dropped open chain of {} vertices", ring.len());
                continue;
            }
            for loop_ids in split_repeated_vertices(&ring) {
                if loop_ids.len() >= 3 {
                    contours.push(Contour::new(
                        loop_ids.iter().map(|&v| pool.points[v]).collect(),
                    ));
                }
            }
        }
        contours
    }
}

/// Split a closed ring of vertex ids into simple loops
///
/// Whenever a vertex reappears, the stretch since its first appearance is
/// emitted as a separate loop.
fn split_repeated_vertices(ring: &[usize]) -> Vec<Vec<usize>> {
    let mut loops = Vec::new();
    let mut stack: Vec<usize> = Vec::with_capacity(ring.len());
    let mut position: FxHashMap<usize, usize> = FxHashMap::default();
    for &v in ring {
        if let Some(&p) = position.get(&v) {
            let tail: Vec<usize> = stack.drain(p..).collect();
            for id in &tail {
                position.remove(id);
            }
            loops.push(tail);
        }
        position.insert(v, stack.len());
        stack.push(v);
    }
    if !stack.is_empty() {
        loops.push(stack);
    }
    loops
}

/// Snaps points to shared vertices using a hash grid with cell size `epsilon`
struct VertexPool {
    epsilon: f64,
    points: Vec<DVec2>,
    buckets: FxHashMap<(i64, i64), SmallVec<[usize; 2]>>,
}

impl VertexPool {
    fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            points: Vec::new(),
            buckets: FxHashMap::default(),
        }
    }

    fn key(&self, p: DVec2) -> (i64, i64) {
        (
            (p.x / self.epsilon).floor() as i64,
            (p.y / self.epsilon).floor() as i64,
        )
    }

    fn snap(&mut self, p: DVec2) -> usize {
        let (kx, ky) = self.key(p);
        let eps2 = self.epsilon * self.epsilon;
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(ids) = self.buckets.get(&(kx + dx, ky + dy)) {
                    if let Some(&id) = ids
                        .iter()
                        .find(|&&id| self.points[id].distance_squared(p) <= eps2)
                    {
                        return id;
                    }
                }
            }
        }
        let id = self.points.len();
        self.points.push(p);
        self.buckets.entry((kx, ky)).or_default().push(id);
        id
    }
}
