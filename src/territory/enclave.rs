//! Enclosed pockets subtracted from territory polygons
//!
//! A pocket of territory `t` is a maximal connected set of cells not shown
//! as part of `t` that never reaches the outer grid border. Everything
//! around such a pocket belongs to `t`, so its outline becomes a hole.

use std::collections::VecDeque;

use crate::cell::Cell;
use crate::geometry::{Connector, Contour, Segment};

#[inline]
fn shown_in(cell: &Cell, t: usize) -> bool {
    cell.effectively_visible() && cell.territory_index == Some(t)
}

/// Outlines of every pocket fully enclosed by territory `t`
///
/// `owners` is the per-segment cell pair from
/// [`segment_owners`](crate::graph::segment_owners).
pub fn enclosed_holes(
    cells: &[Cell],
    segments: &[Segment],
    owners: &[[Option<usize>; 2]],
    t: usize,
) -> Vec<Contour> {
    let mut component: Vec<Option<usize>> = vec![None; cells.len()];
    let mut holes = Vec::new();
    let mut next_id = 0;

    for start in 0..cells.len() {
        if component[start].is_some() || shown_in(&cells[start], t) {
            continue;
        }
        let id = next_id;
        next_id += 1;
        component[start] = Some(id);
        let mut members = vec![start];
        let mut queue = VecDeque::from([start]);
        let mut touches_border = false;

        while let Some(current) = queue.pop_front() {
            for &seg in &cells[current].region.segments {
                if segments[seg].border {
                    touches_border = true;
                }
            }
            for &n in &cells[current].neighbours {
                if component[n].is_none() && !shown_in(&cells[n], t) {
                    component[n] = Some(id);
                    members.push(n);
                    queue.push_back(n);
                }
            }
        }
        if touches_border {
            continue;
        }

        let mut connector = Connector::new();
        for &c in &members {
            for &seg in &cells[c].region.segments {
                let other = match owners[seg] {
                    [Some(a), Some(b)] if a == c => Some(b),
                    [Some(a), Some(_)] => Some(a),
                    _ => None,
                };
                if other.map_or(true, |o| component[o] != Some(id)) {
                    connector.add_segment(&segments[seg]);
                }
            }
        }
        // Islands of `t` inside the pocket give extra rings; the largest is the pocket outline
        if let Some(outline) = connector
            .stitch()
            .into_iter()
            .filter(|c| c.len() >= 3)
            .max_by(|a, b| a.area().total_cmp(&b.area()))
        {
            holes.push(outline);
        }
    }
    holes
}
