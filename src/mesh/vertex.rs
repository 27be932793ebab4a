use glam::DVec3;

use super::FaceId;

slotmap::new_key_type! {
    /// Identifies a vertex in a [`super::HalfEdgeMesh`]'s vertex arena.
    pub struct VertexId;
}

/// One input point, plus the doubly-linked claim-list links threaded
/// through it while it is outside the current hull.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The point's coordinates.
    pub pnt: DVec3,
    /// This vertex's position in the original input array.
    pub index: usize,
    /// Previous vertex in whichever claim list currently holds this one.
    pub prev: Option<VertexId>,
    /// Next vertex in whichever claim list currently holds this one.
    pub next: Option<VertexId>,
    /// The face currently claiming this vertex as an outside point, if any.
    pub face: Option<FaceId>,
}

impl Vertex {
    pub fn new(pnt: DVec3, index: usize) -> Self {
        Self {
            pnt,
            index,
            prev: None,
            next: None,
            face: None,
        }
    }
}
