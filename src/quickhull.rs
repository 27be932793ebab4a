//! The Quickhull driver: bounds and tolerance, initial simplex, and the
//! main loop (eye selection, horizon walk, fan erection, two-pass
//! non-convex merging, unclaimed-point resolution).

use glam::DVec3;
use log::{debug, info, trace};

use crate::error::QhullError;
use crate::mesh::{face, ClaimList, FaceId, HalfEdgeId, HalfEdgeMesh, Mark, Vertex, VertexId};
use crate::vec3::StableNormalize;

/// Sentinel stored in `explicit_tolerance` meaning "compute automatically
/// from the input's coordinate magnitudes".
const AUTOMATIC_TOLERANCE: f64 = -1.0;

/// Simplex-degeneracy checks (coincident/colinear/coplanar) use a coarser
/// multiple of the base tolerance than ordinary above-plane tests, since
/// they're deciding whether an entire point set collapses to a lower
/// dimension rather than whether one point clears one face.
const SIMPLEX_DEGENERACY_TOL_MULT: f64 = 100.0;

/// Unclaimed-point resolution stops looking for a better face once a point
/// clears one by this much; at that distance no other face could plausibly
/// claim it instead.
const EARLY_EXIT_TOL_MULT: f64 = 1000.0;

/// A three-dimensional convex hull engine implementing Quickhull (Barber,
/// Dobkin, Huhdanpaa 1996) over a half-edge mesh.
///
/// ```no_run
/// use quickhull3d::QuickHull3d;
///
/// let coords = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
/// let mut hull = QuickHull3d::new(&coords).unwrap();
/// hull.build_hull().unwrap();
/// assert_eq!(hull.faces().len(), 4);
/// ```
#[derive(Debug)]
pub struct QuickHull3d {
    points: Vec<DVec3>,
    mesh: HalfEdgeMesh,
    vertex_ids: Vec<VertexId>,
    claimed: ClaimList,
    unclaimed: ClaimList,
    explicit_tolerance: f64,
    tolerance: f64,
    debug: bool,
}

impl QuickHull3d {
    /// Builds an engine over `coords`, a flat array of `x, y, z` triplets.
    /// Fails if `coords.len()` isn't a multiple of 3, or describes fewer
    /// than 4 points.
    pub fn new(coords: &[f64]) -> Result<Self, QhullError> {
        if coords.len() % 3 != 0 {
            return Err(QhullError::MalformedInput(
                "coordinate array length must be a multiple of 3",
            ));
        }
        let points: Vec<DVec3> = coords
            .chunks_exact(3)
            .map(|c| DVec3::new(c[0], c[1], c[2]))
            .collect();
        Self::from_points(&points)
    }

    /// Builds an engine directly from a point slice. Fails if fewer than 4
    /// points are given.
    pub fn from_points(points: &[DVec3]) -> Result<Self, QhullError> {
        if points.len() < 4 {
            return Err(QhullError::MalformedInput(
                "at least 4 points are required to build a 3d hull",
            ));
        }

        Ok(Self {
            points: points.to_vec(),
            mesh: HalfEdgeMesh::new(),
            vertex_ids: Vec::new(),
            claimed: ClaimList::new(),
            unclaimed: ClaimList::new(),
            explicit_tolerance: AUTOMATIC_TOLERANCE,
            tolerance: 0.0,
            debug: false,
        })
    }

    /// The distance tolerance actually in effect: the explicit override if
    /// one was set, otherwise the value computed from the input's bounds
    /// during the last `build_hull`.
    pub fn distance_tolerance(&self) -> f64 {
        if self.explicit_tolerance >= 0.0 {
            self.explicit_tolerance
        } else {
            self.tolerance
        }
    }

    /// Overrides the automatic tolerance. Pass a negative value to restore
    /// automatic computation.
    pub fn set_explicit_distance_tolerance(&mut self, tol: f64) {
        self.explicit_tolerance = tol;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Runs the full Quickhull construction: bounds and tolerance, initial
    /// simplex, then the main loop until no point remains outside the hull.
    /// Safe to call more than once (e.g. after changing the tolerance);
    /// each call rebuilds the mesh from scratch.
    pub fn build_hull(&mut self) -> Result<(), QhullError> {
        self.mesh = HalfEdgeMesh::new();
        self.vertex_ids = self
            .points
            .iter()
            .enumerate()
            .map(|(i, &p)| self.mesh.vertices.insert(Vertex::new(p, i)))
            .collect();
        self.claimed.clear();
        self.unclaimed.clear();

        let (min_vtx, max_vtx, auto_tol) = compute_bounds(&self.mesh, &self.vertex_ids);
        self.tolerance = auto_tol;
        let tol = self.distance_tolerance();

        if self.debug {
            info!(
                "quickhull3d: building hull over {} points, tolerance {:e}",
                self.vertex_ids.len(),
                tol
            );
        }

        let simplex = build_initial_simplex(&mut self.mesh, &self.vertex_ids, min_vtx, max_vtx, tol)?;
        if self.debug {
            info!(
                "quickhull3d: initial simplex formed from points {}, {}, {}, {}",
                self.mesh.vertex(simplex.v0).index,
                self.mesh.vertex(simplex.v1).index,
                self.mesh.vertex(simplex.v2).index,
                self.mesh.vertex(simplex.v3).index,
            );
        }

        for &v in &self.vertex_ids {
            if simplex.contains(v) {
                continue;
            }
            let p = self.mesh.vertex(v).pnt;
            if let Some((face, dist)) = best_face(&self.mesh, &simplex.faces, p) {
                if dist > tol {
                    add_point_to_face(&mut self.mesh, &mut self.claimed, v, face);
                }
            }
        }

        let mut iteration = 0usize;
        while let Some(first) = self.claimed.first() {
            iteration += 1;
            let eye_face = self
                .mesh
                .vertex(first)
                .face
                .expect("claimed vertex must have a claiming face");
            let eye_vtx = find_eye_vertex(&self.mesh, eye_face);
            let eye_pnt = self.mesh.vertex(eye_vtx).pnt;

            remove_point_from_face(&mut self.mesh, &mut self.claimed, eye_vtx, eye_face);

            if self.debug {
                trace!(
                    "quickhull3d: iteration {iteration}: eye = point {}, claimed by face across {} faces",
                    self.mesh.vertex(eye_vtx).index,
                    self.mesh.face_count()
                );
            }

            let horizon = compute_horizon(
                &mut self.mesh,
                &mut self.claimed,
                &mut self.unclaimed,
                eye_pnt,
                eye_face,
                tol,
            );
            if self.debug {
                debug!("quickhull3d: horizon has {} edges", horizon.len());
            }

            let new_faces = erect_new_faces(&mut self.mesh, eye_vtx, &horizon);

            merge_non_convex_wrt_larger_face(
                &mut self.mesh,
                &mut self.claimed,
                &mut self.unclaimed,
                &new_faces,
                tol,
                self.debug,
            );
            merge_non_convex(
                &mut self.mesh,
                &mut self.claimed,
                &mut self.unclaimed,
                &new_faces,
                tol,
                self.debug,
            );

            resolve_unclaimed(
                &mut self.mesh,
                &mut self.claimed,
                &mut self.unclaimed,
                &new_faces,
                tol,
            );
        }

        self.mesh.retain_visible_faces();

        if self.debug {
            info!(
                "quickhull3d: hull built: {} faces over {} iterations",
                self.mesh.face_count(),
                iteration
            );
        }

        Ok(())
    }

    /// The hull's faces, each as a counter-clockwise list of indices into
    /// the original input.
    pub fn faces(&self) -> Vec<Vec<usize>> {
        self.mesh
            .faces_iter()
            .map(|f| face::indices(&self.mesh, f))
            .collect()
    }

    /// Runs the consistency and point-inclusion checks of
    /// [`crate::checker`] against the current hull.
    pub fn check(&mut self, sink: Option<&mut dyn std::io::Write>) -> bool {
        crate::checker::check(&self.mesh, &self.points, self.distance_tolerance(), sink)
    }
}

/// The four simplex vertices and the four initial faces built from them, in
/// the order `create_triangle` produced them.
struct InitialSimplex {
    v0: VertexId,
    v1: VertexId,
    v2: VertexId,
    v3: VertexId,
    faces: [FaceId; 4],
}

impl InitialSimplex {
    fn contains(&self, v: VertexId) -> bool {
        v == self.v0 || v == self.v1 || v == self.v2 || v == self.v3
    }
}

/// Scans all input points once, tracking the extreme vertex on each axis,
/// and derives the base distance tolerance from their magnitudes.
fn compute_bounds(
    mesh: &HalfEdgeMesh,
    vertex_ids: &[VertexId],
) -> ([VertexId; 3], [VertexId; 3], f64) {
    let first = vertex_ids[0];
    let mut min_vtx = [first; 3];
    let mut max_vtx = [first; 3];
    let mut min_val = [mesh.vertex(first).pnt.x, mesh.vertex(first).pnt.y, mesh.vertex(first).pnt.z];
    let mut max_val = min_val;

    for &v in &vertex_ids[1..] {
        let p = mesh.vertex(v).pnt;
        for axis in 0..3 {
            let c = p[axis];
            if c < min_val[axis] {
                min_val[axis] = c;
                min_vtx[axis] = v;
            }
            if c > max_val[axis] {
                max_val[axis] = c;
                max_vtx[axis] = v;
            }
        }
    }

    let tol = 3.0
        * f64::EPSILON
        * ((max_val[0].abs().max(min_val[0].abs()))
            + (max_val[1].abs().max(min_val[1].abs()))
            + (max_val[2].abs().max(min_val[2].abs())));

    (min_vtx, max_vtx, tol)
}

/// Builds the initial tetrahedron: picks the widest axis for the
/// first edge, the point furthest off that line for the third vertex, and
/// the point furthest off their plane for the fourth, then wires four
/// triangular faces oriented outward.
fn build_initial_simplex(
    mesh: &mut HalfEdgeMesh,
    vertex_ids: &[VertexId],
    min_vtx: [VertexId; 3],
    max_vtx: [VertexId; 3],
    tol: f64,
) -> Result<InitialSimplex, QhullError> {
    let mut widest_axis = 0;
    let mut widest_spread = f64::NEG_INFINITY;
    for axis in 0..3 {
        let spread = mesh.vertex(max_vtx[axis]).pnt[axis] - mesh.vertex(min_vtx[axis]).pnt[axis];
        if spread > widest_spread {
            widest_spread = spread;
            widest_axis = axis;
        }
    }
    if widest_spread <= tol {
        return Err(QhullError::Coincident);
    }

    let v0 = max_vtx[widest_axis];
    let v1 = min_vtx[widest_axis];
    let p0 = mesh.vertex(v0).pnt;
    let p1 = mesh.vertex(v1).pnt;
    let u01 = (p1 - p0).stable_normalize();

    let mut v2 = v0;
    let mut best_cross = DVec3::ZERO;
    let mut best_sq = -1.0;
    for &v in vertex_ids {
        if v == v0 || v == v1 {
            continue;
        }
        let p = mesh.vertex(v).pnt;
        let c = u01.cross(p - p0);
        let sq = c.length_squared();
        if sq > best_sq {
            best_sq = sq;
            best_cross = c;
            v2 = v;
        }
    }
    if best_sq.sqrt() <= SIMPLEX_DEGENERACY_TOL_MULT * tol {
        return Err(QhullError::Collinear);
    }

    let nrml = (best_cross - best_cross.dot(u01) * u01).stable_normalize();
    let p2 = mesh.vertex(v2).pnt;
    let d0 = nrml.dot(p2);

    let mut v3 = v0;
    let mut best_abs = -1.0;
    for &v in vertex_ids {
        if v == v0 || v == v1 || v == v2 {
            continue;
        }
        let p = mesh.vertex(v).pnt;
        let d = (nrml.dot(p) - d0).abs();
        if d > best_abs {
            best_abs = d;
            v3 = v;
        }
    }
    if best_abs <= SIMPLEX_DEGENERACY_TOL_MULT * tol {
        return Err(QhullError::Coplanar);
    }

    let p3 = mesh.vertex(v3).pnt;
    let below = (nrml.dot(p3) - d0) < 0.0;

    let faces = wire_simplex(mesh, v0, v1, v2, v3, below);

    Ok(InitialSimplex { v0, v1, v2, v3, faces })
}

/// Builds and wires the four simplex faces. `below == true` is the case
/// where `v3` sits below the plane `(v0, v1, v2)` (standard winding);
/// `below == false` swaps `v0`/`v2` in the base face and adjusts the other
/// three faces' vertex order to match.
///
/// The opposite-pairing indices here were independently re-derived from
/// the geometric twin requirement (each pair of faces sharing an edge must
/// carry opposite-direction half-edges along it) rather than quoted from
/// any reference source; see DESIGN.md.
fn wire_simplex(
    mesh: &mut HalfEdgeMesh,
    v0: VertexId,
    v1: VertexId,
    v2: VertexId,
    v3: VertexId,
    below: bool,
) -> [FaceId; 4] {
    let faces = if below {
        [
            face::create_triangle(mesh, v0, v1, v2, 0.0),
            face::create_triangle(mesh, v3, v1, v0, 0.0),
            face::create_triangle(mesh, v3, v2, v1, 0.0),
            face::create_triangle(mesh, v3, v0, v2, 0.0),
        ]
    } else {
        [
            face::create_triangle(mesh, v0, v2, v1, 0.0),
            face::create_triangle(mesh, v3, v0, v1, 0.0),
            face::create_triangle(mesh, v3, v1, v2, 0.0),
            face::create_triangle(mesh, v3, v2, v0, 0.0),
        ]
    };

    for i in 0..3 {
        let k0 = if below { i } else { (2 - i) % 3 };
        let e_a = face::edge(mesh, faces[i + 1], 1);
        let e_b = face::edge(mesh, faces[0], k0 as isize);
        mesh.set_opposite(e_a, e_b);

        let k1 = if below { (i + 1) % 3 } else { (i + 2) % 3 };
        let e_c = face::edge(mesh, faces[i + 1], 0);
        let e_d = face::edge(mesh, faces[k1 + 1], 2);
        mesh.set_opposite(e_c, e_d);
    }

    faces
}

/// Finds the face (among `faces`) with the greatest `distance_to_plane(p)`,
/// paired with that distance.
fn best_face(mesh: &HalfEdgeMesh, faces: &[FaceId], p: DVec3) -> Option<(FaceId, f64)> {
    faces
        .iter()
        .map(|&f| (f, mesh.face(f).distance_to_plane(p)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// Claims `vertex` for `face`, inserting it at the front of the face's
/// outside segment so the segment stays contiguous regardless of insertion
/// order.
fn add_point_to_face(mesh: &mut HalfEdgeMesh, claimed: &mut ClaimList, vertex: VertexId, face: FaceId) {
    mesh.vertex_mut(vertex).face = Some(face);
    match mesh.face(face).outside {
        None => claimed.add(mesh, vertex),
        Some(first) => claimed.insert_before(mesh, vertex, first),
    }
    mesh.face_mut(face).outside = Some(vertex);
}

/// Unclaims `vertex` from `face`'s outside segment and the claimed list.
fn remove_point_from_face(mesh: &mut HalfEdgeMesh, claimed: &mut ClaimList, vertex: VertexId, face: FaceId) {
    if mesh.face(face).outside == Some(vertex) {
        let next = mesh.vertex(vertex).next;
        let next_same_face = next.filter(|&n| mesh.vertex(n).face == Some(face));
        mesh.face_mut(face).outside = next_same_face;
    }
    claimed.delete(mesh, vertex);
}

/// Detaches `face`'s entire outside segment from the claimed list and
/// returns its head, leaving `face.outside` empty.
fn remove_all_points_from_face(mesh: &mut HalfEdgeMesh, claimed: &mut ClaimList, face: FaceId) -> Option<VertexId> {
    let start = mesh.face(face).outside?;
    let mut end = start;
    loop {
        match mesh.vertex(end).next {
            Some(n) if mesh.vertex(n).face == Some(face) => end = n,
            _ => break,
        }
    }
    claimed.delete_range(mesh, start, end);
    mesh.face_mut(face).outside = None;
    Some(start)
}

/// Finds the vertex in `face`'s outside segment with the greatest
/// `distance_to_plane`.
fn find_eye_vertex(mesh: &HalfEdgeMesh, face: FaceId) -> VertexId {
    let mut best = mesh.face(face).outside.expect("eye face must have an outside point");
    let mut best_dist = mesh.face(face).distance_to_plane(mesh.vertex(best).pnt);
    let mut cur = mesh.vertex(best).next;
    while let Some(v) = cur {
        if mesh.vertex(v).face != Some(face) {
            break;
        }
        let d = mesh.face(face).distance_to_plane(mesh.vertex(v).pnt);
        if d > best_dist {
            best_dist = d;
            best = v;
        }
        cur = mesh.vertex(v).next;
    }
    best
}

/// Marks `face` `Deleted` and releases its outside points into `unclaimed`;
/// the shared entry point for every face consumed by a horizon walk.
fn delete_and_release(mesh: &mut HalfEdgeMesh, claimed: &mut ClaimList, unclaimed: &mut ClaimList, face: FaceId) {
    if let Some(head) = remove_all_points_from_face(mesh, claimed, face) {
        unclaimed.add_all(mesh, Some(head));
    }
    mesh.face_mut(face).mark = Mark::Deleted;
}

/// One level of the horizon walk's explicit-stack recursion-to-iteration
/// transform: `sentinel` is the ring edge the walk must stop short of
/// (either the anchor, for the face the eye vertex is over, or the edge
/// crossed into this face, for every face visited afterward); `current` is
/// the next edge to examine.
struct HorizonFrame {
    sentinel: HalfEdgeId,
    current: HalfEdgeId,
    first: bool,
}

/// Walks the boundary of the region of `eye_face`'s mesh visible from
/// `eye_pnt`, deleting every visible face it crosses into and collecting
/// the ordered list of horizon edges where it crosses into a face that
/// isn't visible. Implemented with an explicit stack rather than
/// recursion so a long horizon chain can't overflow the call stack.
fn compute_horizon(
    mesh: &mut HalfEdgeMesh,
    claimed: &mut ClaimList,
    unclaimed: &mut ClaimList,
    eye_pnt: DVec3,
    eye_face: FaceId,
    tol: f64,
) -> Vec<HalfEdgeId> {
    let mut horizon = Vec::new();

    delete_and_release(mesh, claimed, unclaimed, eye_face);
    let root = face::edge(mesh, eye_face, 0);
    let mut stack = vec![HorizonFrame { sentinel: root, current: root, first: true }];

    while let Some(frame) = stack.last_mut() {
        if !frame.first && frame.current == frame.sentinel {
            stack.pop();
            continue;
        }
        frame.first = false;
        let edge = frame.current;
        frame.current = mesh.half_edge(edge).next;

        let opp_edge = mesh
            .half_edge(edge)
            .opposite
            .expect("ring edge missing opposite during horizon walk");
        let opp_face = mesh.half_edge(opp_edge).face;

        if mesh.face(opp_face).mark == Mark::Visible {
            if mesh.face(opp_face).distance_to_plane(eye_pnt) > tol {
                delete_and_release(mesh, claimed, unclaimed, opp_face);
                let start = mesh.half_edge(opp_edge).next;
                stack.push(HorizonFrame { sentinel: opp_edge, current: start, first: true });
            } else {
                horizon.push(edge);
            }
        }
    }

    horizon
}

/// Erects one new triangular face per horizon edge, fanning out from
/// `eye_vtx`, and stitches the new faces to each other and to the
/// surviving hull across the horizon.
fn erect_new_faces(mesh: &mut HalfEdgeMesh, eye_vtx: VertexId, horizon: &[HalfEdgeId]) -> Vec<FaceId> {
    let mut new_faces = Vec::with_capacity(horizon.len());
    let mut prev_face: Option<FaceId> = None;
    let mut first_side: Option<HalfEdgeId> = None;

    for &h in horizon {
        let tail = mesh.half_edge(h).tail(mesh);
        let head = mesh.half_edge(h).head;
        let face = face::create_triangle(mesh, eye_vtx, tail, head, 0.0);

        let h_opp = mesh.half_edge(h).opposite.expect("horizon edge must have an opposite");
        let edge1 = face::edge(mesh, face, 1);
        mesh.set_opposite(edge1, h_opp);

        // The new face's edge(0), eyeVtx -> tail, is the twin of the
        // *previous* new face's edge(2), (previous tail's head, which is
        // this edge's tail) -> eyeVtx, since consecutive horizon edges
        // share a vertex.
        let side = face::edge(mesh, face, 0);
        if let Some(prev) = prev_face {
            let prev_edge2 = face::edge(mesh, prev, 2);
            mesh.set_opposite(side, prev_edge2);
        } else {
            first_side = Some(side);
        }

        new_faces.push(face);
        prev_face = Some(face);
    }

    if let (Some(first), Some(last_face)) = (first_side, prev_face) {
        let last_edge2 = face::edge(mesh, last_face, 2);
        mesh.set_opposite(first, last_edge2);
    }

    new_faces
}

/// `e.face.distance_to_plane(e.opposite.face.centroid)`: negative means
/// the neighbor's centroid sits clearly below this face's plane (convex);
/// non-negative means non-convex or coplanar.
pub(crate) fn opp_face_distance(mesh: &HalfEdgeMesh, edge: HalfEdgeId) -> f64 {
    let face = mesh.half_edge(edge).face;
    let opp_face = mesh.half_edge(edge).opposite_face(mesh).expect("edge must have an opposite face");
    mesh.face(face).distance_to_plane(mesh.face(opp_face).centroid)
}

/// Which of the two merge passes [`do_adjacent_merge`] is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeType {
    /// Only merge when the *larger* of the two faces shows non-convexity
    /// against the smaller; if only the smaller shows it, defer by marking
    /// the face `NonConvex` instead of merging now.
    NonConvexWrtLargerFace,
    /// Merge greedily whenever either side shows non-convexity.
    NonConvex,
}

/// Reassigns the outside points a just-absorbed face was still holding: each
/// is re-claimed by `absorbing_face` when it clears that face's plane by
/// more than `tol`, otherwise it is released into `unclaimed` for the
/// current iteration's resolution pass to pick up. Without this, a claimed
/// point belonging to a face absorbed by a coplanar merge would stay linked
/// with `vertex.face` pointing at a now-deleted face.
fn redistribute_absorbed_face_points(
    mesh: &mut HalfEdgeMesh,
    claimed: &mut ClaimList,
    unclaimed: &mut ClaimList,
    discarded: FaceId,
    absorbing_face: FaceId,
    tol: f64,
) {
    let Some(mut cur) = remove_all_points_from_face(mesh, claimed, discarded) else {
        return;
    };
    loop {
        let next = mesh.vertex(cur).next;
        let p = mesh.vertex(cur).pnt;
        if mesh.face(absorbing_face).distance_to_plane(p) > tol {
            add_point_to_face(mesh, claimed, cur, absorbing_face);
        } else {
            unclaimed.add(mesh, cur);
        }
        match next {
            Some(n) => cur = n,
            None => break,
        }
    }
}

/// Walks `face`'s ring looking for one edge to merge across, per
/// `merge_type`. Performs at most one merge (the ring is invalidated by a
/// merge, so the caller re-walks from scratch); returns whether it merged.
/// When pass 1 finds non-convexity only from the smaller face's side, it
/// marks `face` `NonConvex` for pass 2 to pick up, without merging.
fn do_adjacent_merge(
    mesh: &mut HalfEdgeMesh,
    claimed: &mut ClaimList,
    unclaimed: &mut ClaimList,
    face: FaceId,
    merge_type: MergeType,
    tol: f64,
    log_debug: bool,
) -> bool {
    let edges = face::ring_edges(mesh, face);
    let mut convex = true;

    for h in edges {
        let Some(opp_face) = mesh.half_edge(h).opposite_face(mesh) else {
            continue;
        };
        let h_opp = mesh.half_edge(h).opposite.unwrap();

        let merge = match merge_type {
            MergeType::NonConvex => {
                opp_face_distance(mesh, h) > -tol || opp_face_distance(mesh, h_opp) > -tol
            }
            MergeType::NonConvexWrtLargerFace => {
                if mesh.face(face).area > mesh.face(opp_face).area {
                    if opp_face_distance(mesh, h) > -tol {
                        true
                    } else {
                        if opp_face_distance(mesh, h_opp) > -tol {
                            convex = false;
                        }
                        false
                    }
                } else if opp_face_distance(mesh, h_opp) > -tol {
                    true
                } else {
                    if opp_face_distance(mesh, h) > -tol {
                        convex = false;
                    }
                    false
                }
            }
        };

        if merge {
            if log_debug {
                debug!("quickhull3d: merge ({merge_type:?}): absorbing non-convex neighbor");
            }
            let discarded = face::merge_adjacent_face(mesh, face, h)
                .expect("merge during build must preserve mesh invariants");
            for d in discarded {
                redistribute_absorbed_face_points(mesh, claimed, unclaimed, d, face, tol);
                mesh.face_mut(d).mark = Mark::Deleted;
            }
            return true;
        }
    }

    if !convex {
        mesh.face_mut(face).mark = Mark::NonConvex;
    }
    false
}

/// Merge pass 1: run [`do_adjacent_merge`] against `NonConvexWrtLargerFace`
/// repeatedly for each newly erected face still `Visible`, until it reports
/// no merge.
fn merge_non_convex_wrt_larger_face(
    mesh: &mut HalfEdgeMesh,
    claimed: &mut ClaimList,
    unclaimed: &mut ClaimList,
    new_faces: &[FaceId],
    tol: f64,
    log_debug: bool,
) {
    for &face in new_faces {
        if mesh.face(face).mark != Mark::Visible {
            continue;
        }
        while do_adjacent_merge(mesh, claimed, unclaimed, face, MergeType::NonConvexWrtLargerFace, tol, log_debug) {}
    }
}

/// Merge pass 2: every face left `NonConvex` by pass 1 is reset to
/// `Visible` and merged greedily via [`do_adjacent_merge`] with
/// `NonConvex` until it reports no merge.
fn merge_non_convex(
    mesh: &mut HalfEdgeMesh,
    claimed: &mut ClaimList,
    unclaimed: &mut ClaimList,
    new_faces: &[FaceId],
    tol: f64,
    log_debug: bool,
) {
    for &face in new_faces {
        if mesh.face(face).mark != Mark::NonConvex {
            continue;
        }
        mesh.face_mut(face).mark = Mark::Visible;
        while do_adjacent_merge(mesh, claimed, unclaimed, face, MergeType::NonConvex, tol, log_debug) {}
    }
}

/// Re-assigns every point released into `unclaimed` during this iteration
/// to whichever surviving face it clears by the most; points that clear no
/// face are now interior and dropped.
fn resolve_unclaimed(
    mesh: &mut HalfEdgeMesh,
    claimed: &mut ClaimList,
    unclaimed: &mut ClaimList,
    new_faces: &[FaceId],
    tol: f64,
) {
    let visible_new: Vec<FaceId> = new_faces.iter().copied().filter(|&f| mesh.face(f).mark == Mark::Visible).collect();

    while let Some(v) = unclaimed.first() {
        unclaimed.delete(mesh, v);
        let p = mesh.vertex(v).pnt;

        let mut best: Option<(FaceId, f64)> = None;
        for &f in &visible_new {
            let d = mesh.face(f).distance_to_plane(p);
            if d > tol {
                match best {
                    Some((_, bd)) if bd >= d => {}
                    _ => best = Some((f, d)),
                }
                if d > EARLY_EXIT_TOL_MULT * tol {
                    break;
                }
            }
        }

        if let Some((face, _)) = best {
            add_point_to_face(mesh, claimed, v, face);
        } else {
            mesh.vertex_mut(v).face = None;
        }
    }
}
