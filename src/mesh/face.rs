use glam::DVec3;

use crate::error::QhullError;
use crate::vec3::StableNormalize;

use super::half_edge::HalfEdgeId;
use super::vertex::VertexId;
use super::HalfEdgeMesh;

slotmap::new_key_type! {
    /// Identifies a face in a [`super::HalfEdgeMesh`]'s face arena.
    pub struct FaceId;
}

/// Lifecycle state of a [`Face`]. Deletion is logical: a `Deleted` face is
/// kept in the arena (its half-edges may still be referenced by local
/// traversal state) until the driver's final filter pass drops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// Part of the current hull boundary.
    Visible,
    /// Newly erected but found non-convex against a neighbor; pending the
    /// second merge pass.
    NonConvex,
    /// Logically removed.
    Deleted,
}

/// A convex polygonal face of the evolving hull.
#[derive(Debug, Clone)]
pub struct Face {
    /// One half-edge on this face's ring; the rest are reachable via `next`.
    pub anchor: HalfEdgeId,
    /// Unit outward normal.
    pub normal: DVec3,
    /// `normal . centroid`, cached so `distance_to_plane` is one dot and a
    /// subtraction.
    pub plane_offset: f64,
    /// Polygon area.
    pub area: f64,
    /// Average of the ring's vertex positions.
    pub centroid: DVec3,
    /// Current lifecycle state.
    pub mark: Mark,
    /// Head of this face's segment of the *claimed* list, or `None` if no
    /// input point currently sees this face.
    pub outside: Option<VertexId>,
}

impl Face {
    /// Distance from `p` to this face's supporting plane along the normal.
    /// Positive means `p` is outside (above) the face.
    pub fn distance_to_plane(&self, p: DVec3) -> f64 {
        self.normal.dot(p) - self.plane_offset
    }
}

/// Builds a triangular face from three vertices, already wound
/// counter-clockwise as seen from outside the hull: the ring is `v0 -> v1`,
/// `v1 -> v2`, `v2 -> v0` (so `edge(face, 0)` is the `v0 -> v1` edge).
/// `min_area` triggers the thin-face stabilization in
/// [`compute_normal_and_centroid`] when nonzero.
pub fn create_triangle(
    mesh: &mut HalfEdgeMesh,
    v0: VertexId,
    v1: VertexId,
    v2: VertexId,
    min_area: f64,
) -> FaceId {
    let face = mesh.faces.insert(Face {
        anchor: HalfEdgeId::default(),
        normal: DVec3::ZERO,
        plane_offset: 0.0,
        area: 0.0,
        centroid: DVec3::ZERO,
        mark: Mark::Visible,
        outside: None,
    });

    let he0 = mesh.half_edges.insert(super::half_edge::HalfEdge {
        head: v1,
        face,
        next: HalfEdgeId::default(),
        prev: HalfEdgeId::default(),
        opposite: None,
    });
    let he1 = mesh.half_edges.insert(super::half_edge::HalfEdge {
        head: v2,
        face,
        next: HalfEdgeId::default(),
        prev: HalfEdgeId::default(),
        opposite: None,
    });
    let he2 = mesh.half_edges.insert(super::half_edge::HalfEdge {
        head: v0,
        face,
        next: HalfEdgeId::default(),
        prev: HalfEdgeId::default(),
        opposite: None,
    });

    mesh.half_edges[he0].next = he1;
    mesh.half_edges[he0].prev = he2;
    mesh.half_edges[he1].next = he2;
    mesh.half_edges[he1].prev = he0;
    mesh.half_edges[he2].next = he0;
    mesh.half_edges[he2].prev = he1;

    mesh.faces[face].anchor = he0;

    compute_normal_and_centroid(mesh, face, min_area);
    face
}

/// Walks `face`'s ring and returns the half-edges in order.
pub fn ring_edges(mesh: &HalfEdgeMesh, face: FaceId) -> Vec<HalfEdgeId> {
    let anchor = mesh.faces[face].anchor;
    let mut edges = vec![anchor];
    let mut h = mesh.half_edges[anchor].next;
    while h != anchor {
        edges.push(h);
        h = mesh.half_edges[h].next;
    }
    edges
}

/// Returns the `i`-th edge of `face`'s ring, per the anchor-relative
/// indexing in the module docs: non-negative indices walk forward from
/// the anchor via `next`; negative indices walk backward via `prev`.
pub fn edge(mesh: &HalfEdgeMesh, face: FaceId, i: isize) -> HalfEdgeId {
    let anchor = mesh.faces[face].anchor;
    if i >= 0 {
        let mut h = anchor;
        for _ in 0..i {
            h = mesh.half_edges[h].next;
        }
        h
    } else {
        let mut h = anchor;
        for _ in 0..(-i) {
            h = mesh.half_edges[h].prev;
        }
        h
    }
}

/// Recomputes `normal`, `centroid`, `plane_offset` and `area` from the
/// current ring. When `min_area` is positive and the freshly computed area
/// falls below it, the normal is instead derived from the component of the
/// fan-sum normal perpendicular to the ring's longest edge: thin faces
/// produced by a merge have an unreliable fan-sum direction but a
/// well-defined longest edge.
pub fn compute_normal_and_centroid(mesh: &mut HalfEdgeMesh, face: FaceId, min_area: f64) {
    let edges = ring_edges(mesh, face);
    let pts: Vec<DVec3> = edges.iter().map(|&h| mesh.vertices[mesh.half_edges[h].head].pnt).collect();

    let centroid = pts.iter().fold(DVec3::ZERO, |acc, &p| acc + p) / pts.len() as f64;

    let v0 = pts[0];
    let mut normal_sum = DVec3::ZERO;
    for i in 1..pts.len() - 1 {
        normal_sum += (pts[i] - v0).cross(pts[i + 1] - v0);
    }
    let area = 0.5 * normal_sum.length();

    let mut normal = normal_sum.stable_normalize();
    if min_area > 0.0 && area < min_area {
        normal = stabilize_thin_face_normal(&pts, normal_sum);
    }

    let f = &mut mesh.faces[face];
    f.centroid = centroid;
    f.normal = normal;
    f.plane_offset = normal.dot(centroid);
    f.area = area;
}

/// Finds the longest edge of the ring and projects `normal_sum` onto the
/// plane perpendicular to it, to stabilize the normal of a nearly
/// degenerate (sliver) face.
fn stabilize_thin_face_normal(pts: &[DVec3], normal_sum: DVec3) -> DVec3 {
    let n = pts.len();
    let mut longest_dir = DVec3::ZERO;
    let mut longest_len_sq = 0.0;
    for i in 0..n {
        let a = pts[i];
        let b = pts[(i + 1) % n];
        let len_sq = (b - a).length_squared();
        if len_sq > longest_len_sq {
            longest_len_sq = len_sq;
            longest_dir = b - a;
        }
    }
    if longest_len_sq <= 0.0 {
        return normal_sum.stable_normalize();
    }
    let d = longest_dir.stable_normalize();
    let perp = normal_sum - normal_sum.dot(d) * d;
    if perp.length_squared() > 0.0 {
        perp.stable_normalize()
    } else {
        normal_sum.stable_normalize()
    }
}

/// Verifies the ring's topological invariants: at least 3 edges, every
/// edge's opposite is wired and symmetric, the adjacent face across every
/// edge differs from `face`, and `next`/`prev` close the ring.
pub fn check_consistency(mesh: &HalfEdgeMesh, face: FaceId) -> Result<(), QhullError> {
    let edges = ring_edges(mesh, face);
    if edges.len() < 3 {
        return Err(QhullError::Invariant("face has fewer than 3 edges"));
    }
    for &h in &edges {
        let he = &mesh.half_edges[h];
        if mesh.half_edges[he.next].prev != h {
            return Err(QhullError::Invariant("next/prev closure broken"));
        }
        if mesh.half_edges[he.prev].next != h {
            return Err(QhullError::Invariant("next/prev closure broken"));
        }
        if he.head == mesh.half_edges[he.prev].head {
            return Err(QhullError::Invariant("degenerate zero-length edge"));
        }
        match he.opposite {
            None => return Err(QhullError::Invariant("half-edge has no opposite")),
            Some(opp) => {
                if mesh.half_edges[opp].opposite != Some(h) {
                    return Err(QhullError::Invariant("opposite pairing not symmetric"));
                }
                if mesh.half_edges[opp].face == face {
                    return Err(QhullError::Invariant("edge is adjacent to itself"));
                }
            }
        }
    }
    Ok(())
}

/// Collects the original-input indices of this face's ring, walked from
/// the anchor, in counter-clockwise order.
pub fn indices(mesh: &HalfEdgeMesh, face: FaceId) -> Vec<usize> {
    ring_edges(mesh, face)
        .into_iter()
        .map(|h| mesh.vertices[mesh.half_edges[h].head].index)
        .collect()
}

/// Number of edges in `face`'s ring.
pub fn vertex_count(mesh: &HalfEdgeMesh, face: FaceId) -> usize {
    ring_edges(mesh, face).len()
}

fn opposite_face(mesh: &HalfEdgeMesh, h: HalfEdgeId) -> Option<FaceId> {
    mesh.half_edges[h].opposite.map(|o| mesh.half_edges[o].face)
}

/// Absorbs the face across `hedge_adj` into `face`, splicing the two rings
/// into one polygon and sweeping away any redundant vertices (a vertex
/// whose two incident ring edges share the same opposite face) produced by
/// the splice. Returns the faces that must be marked `Deleted`: the
/// absorbed face, plus any further face discarded by redundant-vertex
/// cleanup.
///
/// This is the half-edge splice at the heart of non-convex merging; see
/// the module-level docs for why it's encoded this way rather than as a
/// from-scratch re-triangulation.
pub fn merge_adjacent_face(
    mesh: &mut HalfEdgeMesh,
    face: FaceId,
    hedge_adj: HalfEdgeId,
) -> Result<Vec<FaceId>, QhullError> {
    let opp_face = opposite_face(mesh, hedge_adj)
        .ok_or(QhullError::Invariant("merge edge has no opposite face"))?;

    let mut discarded = vec![opp_face];
    mesh.faces[opp_face].mark = Mark::Deleted;

    let hedge_opp = mesh.half_edges[hedge_adj]
        .opposite
        .ok_or(QhullError::Invariant("merge edge has no opposite"))?;

    let mut hedge_adj_prev = mesh.half_edges[hedge_adj].prev;
    let mut hedge_adj_next = mesh.half_edges[hedge_adj].next;
    let mut hedge_opp_prev = mesh.half_edges[hedge_opp].prev;
    let mut hedge_opp_next = mesh.half_edges[hedge_opp].next;

    while opposite_face(mesh, hedge_adj_prev) == Some(opp_face) {
        hedge_adj_prev = mesh.half_edges[hedge_adj_prev].prev;
        hedge_opp_next = mesh.half_edges[hedge_opp_next].next;
    }
    while opposite_face(mesh, hedge_adj_next) == Some(opp_face) {
        hedge_opp_prev = mesh.half_edges[hedge_opp_prev].prev;
        hedge_adj_next = mesh.half_edges[hedge_adj_next].next;
    }

    // Re-home the absorbed ring's surviving edges onto `face`.
    let mut h = hedge_opp_next;
    loop {
        mesh.half_edges[h].face = face;
        if h == hedge_opp_prev {
            break;
        }
        h = mesh.half_edges[h].next;
    }

    if mesh.faces[face].anchor == hedge_adj {
        mesh.faces[face].anchor = hedge_adj_next;
    }

    if let Some(extra) = connect_half_edges(mesh, face, hedge_opp_prev, hedge_adj_next)? {
        discarded.push(extra);
    }
    if let Some(extra) = connect_half_edges(mesh, face, hedge_adj_prev, hedge_opp_next)? {
        discarded.push(extra);
    }

    let prev_area = mesh.faces[face].area;
    compute_normal_and_centroid(mesh, face, prev_area);
    check_consistency(mesh, face)?;

    Ok(discarded)
}

/// Splices `hedge` onto `hedge_prev` (`hedge_prev.next = hedge`). If both
/// now share the same opposite face, the shared vertex between them is
/// redundant (its two incident edges lead to the same neighbor) and is
/// spliced out, possibly discarding the neighbor face entirely if it was a
/// triangle. Returns the discarded face, if any.
fn connect_half_edges(
    mesh: &mut HalfEdgeMesh,
    face: FaceId,
    hedge_prev: HalfEdgeId,
    hedge: HalfEdgeId,
) -> Result<Option<FaceId>, QhullError> {
    let prev_opp_face = opposite_face(mesh, hedge_prev);
    let this_opp_face = opposite_face(mesh, hedge);

    if prev_opp_face.is_some() && prev_opp_face == this_opp_face {
        let opp_face = this_opp_face.unwrap();
        let mut discarded = None;

        if mesh.faces[face].anchor == hedge_prev {
            mesh.faces[face].anchor = hedge;
        }

        let hedge_this_opp = mesh.half_edges[hedge]
            .opposite
            .ok_or(QhullError::Invariant("redundant-vertex edge has no opposite"))?;

        let hedge_opp;
        if vertex_count(mesh, opp_face) == 3 {
            let h_opp_prev = mesh.half_edges[hedge_this_opp].prev;
            hedge_opp = mesh.half_edges[h_opp_prev]
                .opposite
                .ok_or(QhullError::Invariant("redundant-vertex edge has no opposite"))?;

            mesh.faces[opp_face].mark = Mark::Deleted;
            discarded = Some(opp_face);
        } else {
            hedge_opp = mesh.half_edges[hedge_this_opp].next;

            if mesh.faces[opp_face].anchor == mesh.half_edges[hedge_opp].prev {
                mesh.faces[opp_face].anchor = hedge_opp;
            }
            let new_prev = mesh.half_edges[mesh.half_edges[hedge_opp].prev].prev;
            mesh.half_edges[hedge_opp].prev = new_prev;
            mesh.half_edges[new_prev].next = hedge_opp;
        }

        mesh.half_edges[hedge].prev = mesh.half_edges[hedge_prev].prev;
        let new_prev = mesh.half_edges[hedge].prev;
        mesh.half_edges[new_prev].next = hedge;

        mesh.half_edges[hedge].opposite = Some(hedge_opp);
        mesh.half_edges[hedge_opp].opposite = Some(hedge);

        // `opp_face` was modified (its ring shrank), so its cached plane
        // data needs to catch up even when it was just marked Deleted.
        compute_normal_and_centroid(mesh, opp_face, 0.0);

        Ok(discarded)
    } else {
        mesh.half_edges[hedge_prev].next = hedge;
        mesh.half_edges[hedge].prev = hedge_prev;
        Ok(None)
    }
}
