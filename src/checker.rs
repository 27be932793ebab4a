//! Post-build validation: re-derives the invariants the driver is supposed
//! to maintain by construction, and checks that every input point actually
//! ended up on or inside the hull. Meant for tests and debugging, not the
//! hot path; it's `O(faces * points)` in the worst case.

use std::io::Write;

use glam::DVec3;

use crate::mesh::{face, HalfEdgeMesh, Mark};

const POINT_INCLUSION_TOL_MULT: f64 = 10.0;

/// Checks that `mesh`'s visible faces form a consistent convex polyhedron
/// and that every point in `points` lies on or inside it, within `tol`
/// (scaled per-check as the driver itself scales it). Diagnostics are
/// written to `sink` one line per failure found; returns `false` on the
/// first failure category it hits (it does not try to enumerate every
/// problem once the mesh is known to be broken).
pub fn check(mesh: &HalfEdgeMesh, points: &[DVec3], tol: f64, mut sink: Option<&mut dyn Write>) -> bool {
    if !check_face_consistency(mesh, tol, &mut sink) {
        return false;
    }
    check_point_inclusion(mesh, points, tol, &mut sink)
}

fn check_face_consistency(mesh: &HalfEdgeMesh, tol: f64, sink: &mut Option<&mut dyn Write>) -> bool {
    for f in mesh.faces_iter() {
        if mesh.face(f).mark != Mark::Visible {
            continue;
        }
        if let Err(e) = face::check_consistency(mesh, f) {
            note(sink, &format!("face consistency check failed: {e}"));
            return false;
        }
        for h in face::ring_edges(mesh, f) {
            let opp = mesh.half_edge(h).opposite.expect("checked face has a wired ring");
            let d_fwd = crate::quickhull::opp_face_distance(mesh, h);
            let d_bwd = crate::quickhull::opp_face_distance(mesh, opp);
            if d_fwd > tol || d_bwd > tol {
                note(sink, &format!("non-convex edge: {d_fwd} / {d_bwd} exceeds tolerance {tol}"));
                return false;
            }
            let next = mesh.half_edge(h).next;
            if mesh.half_edge(next).opposite_face(mesh) == mesh.half_edge(h).opposite_face(mesh) {
                note(sink, "redundant vertex: two consecutive edges share the same neighbor face");
                return false;
            }
        }
    }
    true
}

fn check_point_inclusion(mesh: &HalfEdgeMesh, points: &[DVec3], tol: f64, sink: &mut Option<&mut dyn Write>) -> bool {
    let point_tol = POINT_INCLUSION_TOL_MULT * tol;
    let visible: Vec<_> = mesh
        .faces_iter()
        .filter(|&f| mesh.face(f).mark == Mark::Visible)
        .collect();
    for &p in points {
        for &f in &visible {
            let d = mesh.face(f).distance_to_plane(p);
            if d > point_tol {
                note(sink, &format!("point {p} lies {d} outside a hull face, exceeding tolerance {point_tol}"));
                return false;
            }
        }
    }
    true
}

fn note(sink: &mut Option<&mut dyn Write>, msg: &str) {
    if let Some(w) = sink.as_mut() {
        let _ = writeln!(w, "{msg}");
    }
}
