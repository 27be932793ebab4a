//! The half-edge mesh: an evolving polyhedron with strict topological
//! invariants (edge-opposite pairing, next/prev ring closure).
//!
//! Half-edges form a cyclic pointer graph: a face's ring refers to edges,
//! each edge refers to its face, its neighbors in the ring, and the twin
//! edge across the adjacent face. Rather than own these as owning handles
//! (which cycles would make impossible to express without reference
//! counting and interior mutability), every cross-reference is a
//! [`slotmap`] key into one of three arenas owned by [`HalfEdgeMesh`].
//! Deletion is logical: a face's [`Mark`] is set to `Deleted` and it is
//! dropped from the arena only when [`HalfEdgeMesh::retain_visible_faces`]
//! runs, at the end of the build.

pub mod claim_list;
pub mod face;
pub mod half_edge;
pub mod vertex;

pub use claim_list::ClaimList;
pub use face::{Face, FaceId, Mark};
pub use half_edge::{HalfEdge, HalfEdgeId};
pub use slotmap::SlotMap;
pub use vertex::{Vertex, VertexId};

/// Owns the three arenas (vertices, half-edges, faces) that make up a
/// half-edge mesh, addressed by strongly-typed slotmap keys.
#[derive(Debug, Default)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: SlotMap<VertexId, Vertex>,
    pub(crate) half_edges: SlotMap<HalfEdgeId, HalfEdge>,
    pub(crate) faces: SlotMap<FaceId, Face>,
}

impl HalfEdgeMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id]
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id]
    }

    pub fn half_edge(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.half_edges[id]
    }

    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id]
    }

    pub fn face_mut(&mut self, id: FaceId) -> &mut Face {
        &mut self.faces[id]
    }

    pub fn faces_iter(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.keys()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Wires a symmetric opposite pairing: `a.opposite = b` and
    /// `b.opposite = a`.
    pub fn set_opposite(&mut self, a: HalfEdgeId, b: HalfEdgeId) {
        self.half_edges[a].opposite = Some(b);
        self.half_edges[b].opposite = Some(a);
    }

    /// Drops every face not marked [`Mark::Visible`] from the arena. Their
    /// half-edges become unreachable garbage in the arena; they are never
    /// freed individually since nothing else holds their ids past this
    /// point.
    pub fn retain_visible_faces(&mut self) {
        let doomed: Vec<FaceId> = self
            .faces
            .iter()
            .filter(|(_, f)| f.mark != Mark::Visible)
            .map(|(id, _)| id)
            .collect();
        for id in doomed {
            self.faces.remove(id);
        }
    }
}
