//! Voronoi cells from a Delaunay triangulation
//!
//! Sites are triangulated with `spade` together with four far-away guard
//! sites, so every real site is interior and its Voronoi cell is the closed
//! fan of circumcentres around it. The fan is clipped to the unit square.
//! Every fan edge is dual to one Delaunay edge and remembers the site across
//! it, which gives the cell adjacency directly and lets neighbouring cells
//! share one segment. Guard cells never reach into the square.

use glam::DVec2;
use log::warn;
use rustc_hash::FxHashMap;
use spade::handles::{DirectedEdgeHandle, FixedVertexHandle, VertexHandle};
use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::cell::Cell;
use crate::geometry::{Contour, Segment, SegmentId};
use crate::region::Region;

use super::RawGrid;

/// Consecutive clipped vertices closer than this are merged
const VERTEX_MERGE_DISTANCE: f64 = 1e-10;

/// Guard sites sit on the corners of `[-GUARD, GUARD]²`. Every point of the
/// unit square is closer to any site inside it than to a guard.
const GUARD: f64 = 4.0;

type Delaunay = DelaunayTriangulation<Point2<f64>>;

/// Geometry of one Voronoi cell
///
/// `edge_neighbours[i]` names the site across the edge from `vertices[i]` to
/// `vertices[i + 1]`, or `None` on the outer square.
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiCellGeometry {
    pub site: DVec2,
    pub vertices: Vec<DVec2>,
    pub edge_neighbours: Vec<Option<u32>>,
}

impl VoronoiCellGeometry {
    /// Area centroid of the cell, or the site when the cell is empty
    pub fn centroid(&self) -> DVec2 {
        if self.vertices.len() < 3 {
            return self.site;
        }
        Contour::new(self.vertices.clone()).centroid()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }
}

#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    p: DVec2,
    /// Site across the edge leaving this vertex
    edge: Option<u32>,
}

#[inline]
fn to_dvec(p: Point2<f64>) -> DVec2 {
    DVec2::new(p.x, p.y)
}

/// Compute the clipped Voronoi cell of every site
///
/// # Arguments
///
/// * `sites` - Generators in `[-0.5, 0.5]²`
///
/// # Returns
///
/// One cell per site, in site order. A site that repeats an earlier one, or
/// that the triangulation rejects, gets an empty cell.
///
/// # Performance
///
/// O(n log n) expected for the incremental triangulation, then linear in the
/// total fan size.
pub fn compute_cells(sites: &[DVec2]) -> Vec<VoronoiCellGeometry> {
    let mut triangulation = Delaunay::new();
    for (x, y) in [(-GUARD, -GUARD), (GUARD, -GUARD), (GUARD, GUARD), (-GUARD, GUARD)] {
        if let Err(err) = triangulation.insert(Point2::new(x, y)) {
            warn!("guard site rejected by triangulation: {:?}", err);
        }
    }

    // `owners`: vertex index to site, `handles`: site to vertex
    let mut owners: Vec<Option<u32>> = Vec::with_capacity(sites.len() + 4);
    let mut handles: Vec<Option<FixedVertexHandle>> = Vec::with_capacity(sites.len());
    for (i, &site) in sites.iter().enumerate() {
        let handle = match triangulation.insert(Point2::new(site.x, site.y)) {
            Ok(handle) => handle,
            Err(err) => {
                warn!("site {} at {} rejected by triangulation: {:?}", i, site, err);
                handles.push(None);
                continue;
            }
        };
        let index = handle.index();
        if owners.len() <= index {
            owners.resize(index + 1, None);
        }
        if owners[index].is_some() {
            handles.push(None);
        } else {
            owners[index] = Some(i as u32);
            handles.push(Some(handle));
        }
    }

    let mut scratch: Vec<ClipVertex> = Vec::with_capacity(16);
    sites
        .iter()
        .zip(&handles)
        .map(|(&site, handle)| {
            let mut poly = match handle {
                Some(h) => circumcentre_fan(triangulation.vertex(*h), &owners),
                None => Vec::new(),
            };
            merge_close_vertices(&mut poly);
            clip_to_unit_square(&mut poly, &mut scratch);
            if poly.len() < 3 {
                poly.clear();
            }
            VoronoiCellGeometry {
                site,
                vertices: poly.iter().map(|v| v.p).collect(),
                edge_neighbours: poly.iter().map(|v| v.edge).collect(),
            }
        })
        .collect()
}

/// Circumcentres of the triangles around `vertex`, counter-clockwise
///
/// Each out edge `v -> w` is dual to the Voronoi edge running from the
/// circumcentre on its right to the one on its left; that edge is tagged
/// with `w`. Empty when any incident face is the outer face.
fn circumcentre_fan(vertex: VertexHandle<Point2<f64>>, owners: &[Option<u32>]) -> Vec<ClipVertex> {
    let site = to_dvec(vertex.position());
    let mut fan: Vec<(f64, ClipVertex)> = Vec::new();
    for edge in vertex.out_edges() {
        let Some(start) = right_circumcentre(edge) else {
            return Vec::new();
        };
        let across = edge.to();
        let direction = to_dvec(across.position()) - site;
        let edge_tag = owners.get(across.fix().index()).copied().flatten();
        fan.push((
            direction.y.atan2(direction.x),
            ClipVertex {
                p: start,
                edge: edge_tag,
            },
        ));
    }
    fan.sort_by(|a, b| a.0.total_cmp(&b.0));
    fan.into_iter().map(|(_, v)| v).collect()
}

/// Circumcentre of the triangle to the right of `edge`
fn right_circumcentre(edge: DirectedEdgeHandle<Point2<f64>, (), (), ()>) -> Option<DVec2> {
    edge.rev()
        .face()
        .as_inner()
        .map(|face| to_dvec(face.circumcenter()))
}

fn clip_to_unit_square(poly: &mut Vec<ClipVertex>, scratch: &mut Vec<ClipVertex>) {
    for normal in [DVec2::X, DVec2::Y, DVec2::NEG_X, DVec2::NEG_Y] {
        if poly.len() < 3 {
            return;
        }
        clip(poly, scratch, normal * 0.5, normal);
    }
}

/// Keep the half-plane behind the line through `anchor` facing `normal`
///
/// Edges created along the line are outer edges.
fn clip(poly: &mut Vec<ClipVertex>, scratch: &mut Vec<ClipVertex>, anchor: DVec2, normal: DVec2) {
    let side = |p: DVec2| (p - anchor).dot(normal);

    let n = poly.len();
    if poly.iter().all(|v| side(v.p) <= 0.0) {
        return;
    }
    scratch.clear();
    for k in 0..n {
        let cur = poly[k];
        let nxt = poly[(k + 1) % n];
        let dc = side(cur.p);
        let dn = side(nxt.p);
        let cur_in = dc <= 0.0;
        if cur_in {
            scratch.push(cur);
        }
        if cur_in != (dn <= 0.0) {
            let t = dc / (dc - dn);
            let p = cur.p + (nxt.p - cur.p) * t;
            let edge = if cur_in { None } else { cur.edge };
            scratch.push(ClipVertex { p, edge });
        }
    }
    std::mem::swap(poly, scratch);
    merge_close_vertices(poly);
}

/// Drop vertices whose outgoing edge has collapsed
fn merge_close_vertices(poly: &mut Vec<ClipVertex>) {
    let eps2 = VERTEX_MERGE_DISTANCE * VERTEX_MERGE_DISTANCE;
    let mut k = 0;
    while poly.len() >= 3 && k < poly.len() {
        let next = (k + 1) % poly.len();
        if poly[k].p.distance_squared(poly[next].p) <= eps2 {
            poly.remove(k);
        } else {
            k += 1;
        }
    }
}

/// Turn cell geometry into grid cells with shared segments
///
/// The first cell to emit an edge towards a neighbour creates the segment;
/// the neighbour reuses it when it reaches the same edge from its side.
pub fn build_cells(geometry: &[VoronoiCellGeometry]) -> RawGrid {
    let mut segments: Vec<Segment> = Vec::new();
    let mut shared: FxHashMap<(u32, u32), SegmentId> = FxHashMap::default();
    let mut cells = Vec::with_capacity(geometry.len());

    for (i, g) in geometry.iter().enumerate() {
        let n = g.vertices.len();
        let ids: Vec<SegmentId> = (0..n)
            .map(|k| {
                let a = g.vertices[k];
                let b = g.vertices[(k + 1) % n];
                match g.edge_neighbours[k] {
                    None => {
                        segments.push(Segment::new(a, b, true));
                        segments.len() - 1
                    }
                    Some(j) => {
                        let key = ((i as u32).min(j), (i as u32).max(j));
                        *shared.entry(key).or_insert_with(|| {
                            segments.push(Segment::new(a, b, false));
                            segments.len() - 1
                        })
                    }
                }
            })
            .collect();
        let region = Region::new(g.vertices.clone(), ids);
        let center = if g.is_empty() { g.site } else { region.centroid() };
        cells.push(Cell::new(i, 0, 0, center, region));
    }

    RawGrid {
        cells,
        segments,
        voronoi: Some(geometry.to_vec()),
    }
}
