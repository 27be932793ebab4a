use super::{FaceId, VertexId};

slotmap::new_key_type! {
    /// Identifies a half-edge in a [`super::HalfEdgeMesh`]'s half-edge arena.
    pub struct HalfEdgeId;
}

/// One oriented edge of a face's ring. The edge points *to* `head`; its
/// tail is `prev.head`.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    /// The vertex this edge points to.
    pub head: VertexId,
    /// The face to the left of this edge.
    pub face: FaceId,
    /// Next edge in `face`'s ring.
    pub next: HalfEdgeId,
    /// Previous edge in `face`'s ring.
    pub prev: HalfEdgeId,
    /// The paired half-edge on the adjacent face. `None` only transiently
    /// while the mesh is being rewired (erecting a new fan, splicing a
    /// merge).
    pub opposite: Option<HalfEdgeId>,
}

impl HalfEdge {
    /// The vertex this edge points away from.
    pub fn tail(&self, mesh: &super::HalfEdgeMesh) -> VertexId {
        mesh.half_edges[self.prev].head
    }

    /// The face on the other side of this edge, if its opposite is wired up.
    pub fn opposite_face(&self, mesh: &super::HalfEdgeMesh) -> Option<FaceId> {
        self.opposite.map(|o| mesh.half_edges[o].face)
    }
}
