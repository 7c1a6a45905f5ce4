//! A* core with a generation-stamped node arena
//!
//! Node state is kept between queries. Instead of clearing it, every query
//! bumps the open/closed stamp values by two; a node whose status matches
//! neither stamp is untouched in the current query. Only when the stamps
//! approach the top of the byte range is the arena cleared once.

use log::trace;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::PathResult;

/// Stamp value after which the arena is cleared
const STAMP_LIMIT: u8 = 250;

/// A graph the A* core can walk
pub trait SearchSpace {
    fn node_count(&self) -> usize;

    /// Append `(neighbour, step cost)` for every move out of `node`
    fn expand(&self, node: usize, out: &mut Vec<(usize, f64)>);

    /// Estimated remaining cost from `node` to `goal`
    fn heuristic(&self, node: usize, goal: usize) -> f64;
}

/// Budget of a single query; zero disables a limit
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchLimits {
    pub max_steps: usize,
    pub max_search_cost: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Node {
    g: f64,
    f: f64,
    parent: usize,
    steps: usize,
    status: u8,
}

#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reusable A* search state
///
/// One instance serves one caller; queries take `&mut self`.
#[derive(Debug, Clone)]
pub struct PathFinder {
    nodes: Vec<Node>,
    open_value: u8,
    close_value: u8,
    open: BinaryHeap<OpenEntry>,
    scratch: Vec<(usize, f64)>,
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathFinder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            open_value: 1,
            close_value: 2,
            open: BinaryHeap::new(),
            scratch: Vec::new(),
        }
    }

    fn prepare(&mut self, node_count: usize) {
        if self.nodes.len() < node_count {
            self.nodes.resize(node_count, Node::default());
        }
        if self.close_value >= STAMP_LIMIT {
            for node in &mut self.nodes {
                node.status = 0;
            }
            self.open_value = 1;
            self.close_value = 2;
        } else {
            self.open_value += 2;
            self.close_value += 2;
        }
        self.open.clear();
    }

    /// Cheapest path from `start` to `goal`, or `None` when the open list runs dry
    ///
    /// Indices outside the space yield `None`; callers validate them first.
    pub fn search<S: SearchSpace + ?Sized>(
        &mut self,
        space: &S,
        start: usize,
        goal: usize,
        limits: SearchLimits,
    ) -> Option<PathResult> {
        let count = space.node_count();
        if start >= count || goal >= count {
            return None;
        }
        if start == goal {
            return Some(PathResult::default());
        }
        self.prepare(count);
        let (open_value, close_value) = (self.open_value, self.close_value);

        let h = space.heuristic(start, goal);
        self.nodes[start] = Node {
            g: 0.0,
            f: h,
            parent: start,
            steps: 0,
            status: open_value,
        };
        self.open.push(OpenEntry { f: h, node: start });

        let mut scratch = std::mem::take(&mut self.scratch);
        let mut expanded = 0usize;
        let mut found = false;

        while let Some(OpenEntry { f, node: current }) = self.open.pop() {
            let state = self.nodes[current];
            if state.status != open_value || f > state.f {
                continue;
            }
            if current == goal {
                found = true;
                break;
            }
            self.nodes[current].status = close_value;
            expanded += 1;

            scratch.clear();
            space.expand(current, &mut scratch);
            for &(next, step) in &scratch {
                let g = state.g + step;
                let steps = state.steps + 1;
                if limits.max_search_cost > 0.0 && g > limits.max_search_cost {
                    continue;
                }
                if limits.max_steps > 0 && steps > limits.max_steps {
                    continue;
                }
                let node = &mut self.nodes[next];
                if (node.status == open_value || node.status == close_value) && g >= node.g {
                    continue;
                }
                let f = g + space.heuristic(next, goal);
                *node = Node {
                    g,
                    f,
                    parent: current,
                    steps,
                    status: open_value,
                };
                self.open.push(OpenEntry { f, node: next });
            }
        }
        self.scratch = scratch;

        trace!(
            "search {} -> {}: expanded {} nodes, found={}",
            start,
            goal,
            expanded,
            found
        );
        if !found {
            return None;
        }

        let mut cells = Vec::with_capacity(self.nodes[goal].steps);
        let mut current = goal;
        while current != start {
            cells.push(current);
            current = self.nodes[current].parent;
        }
        cells.reverse();
        Some(PathResult {
            cells,
            cost: self.nodes[goal].g,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Weighted adjacency lists
    struct Graph(Vec<Vec<(usize, f64)>>);

    impl SearchSpace for Graph {
        fn node_count(&self) -> usize {
            self.0.len()
        }

        fn expand(&self, node: usize, out: &mut Vec<(usize, f64)>) {
            out.extend_from_slice(&self.0[node]);
        }

        fn heuristic(&self, _node: usize, _goal: usize) -> f64 {
            0.0
        }
    }

    fn diamond() -> Graph {
        // 0 -> 1 -> 3 costs 2, 0 -> 2 -> 3 costs 5
        Graph(vec![
            vec![(1, 1.0), (2, 1.0)],
            vec![(0, 1.0), (3, 1.0)],
            vec![(0, 1.0), (3, 4.0)],
            vec![(1, 1.0), (2, 4.0)],
        ])
    }

    #[test]
    fn test_cheapest_path() {
        let mut finder = PathFinder::new();
        let path = finder.search(&diamond(), 0, 3, SearchLimits::default()).unwrap();
        assert_eq!(path.cells, vec![1, 3]);
        assert_eq!(path.cost, 2.0);
    }

    #[test]
    fn test_start_equals_goal() {
        let mut finder = PathFinder::new();
        let path = finder.search(&diamond(), 2, 2, SearchLimits::default()).unwrap();
        assert!(path.is_empty());
        assert_eq!(path.cost, 0.0);
    }

    #[test]
    fn test_unreachable() {
        let graph = Graph(vec![vec![(1, 1.0)], vec![(0, 1.0)], vec![]]);
        let mut finder = PathFinder::new();
        assert!(finder.search(&graph, 0, 2, SearchLimits::default()).is_none());
        assert!(finder.search(&graph, 0, 9, SearchLimits::default()).is_none());
    }

    #[test]
    fn test_limits() {
        let mut finder = PathFinder::new();
        let limits = SearchLimits {
            max_steps: 1,
            max_search_cost: 0.0,
        };
        assert!(finder.search(&diamond(), 0, 3, limits).is_none());
        let limits = SearchLimits {
            max_steps: 0,
            max_search_cost: 1.5,
        };
        assert!(finder.search(&diamond(), 0, 3, limits).is_none());
        let limits = SearchLimits {
            max_steps: 2,
            max_search_cost: 2.0,
        };
        assert!(finder.search(&diamond(), 0, 3, limits).is_some());
    }

    #[test]
    fn test_stamps_wrap_around() {
        let mut finder = PathFinder::new();
        let graph = diamond();
        for _ in 0..500 {
            let path = finder.search(&graph, 0, 3, SearchLimits::default()).unwrap();
            assert_eq!(path.cost, 2.0);
            assert!(finder.close_value <= STAMP_LIMIT + 1);
        }
    }

    #[test]
    fn test_reuse_on_larger_graph() {
        let mut finder = PathFinder::new();
        finder.search(&diamond(), 0, 3, SearchLimits::default());
        let line = Graph(
            (0..10)
                .map(|i| {
                    let mut edges = Vec::new();
                    if i > 0 {
                        edges.push((i - 1, 1.0));
                    }
                    if i < 9 {
                        edges.push((i + 1, 1.0));
                    }
                    edges
                })
                .collect(),
        );
        let path = finder.search(&line, 0, 9, SearchLimits::default()).unwrap();
        assert_eq!(path.len(), 9);
        assert_eq!(path.cost, 9.0);
    }
}
