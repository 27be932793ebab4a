//! The doubly-linked outside-point lists (*claimed* and *unclaimed*),
//! threaded through [`super::Vertex::prev`]/[`super::Vertex::next`].
//!
//! The CLAIMED list groups vertices by the face that claims them: each
//! face's segment is contiguous, addressed by [`super::Face::outside`],
//! and ends where the next vertex's `face` differs. This is an
//! optimization over "each face owns its own `Vec` of outside points";
//! the invariant that actually matters is that at most one face claims
//! each point, not this specific threading.

use super::vertex::VertexId;
use super::HalfEdgeMesh;

/// A doubly-linked list of vertices threaded through the mesh's vertex
/// arena. Used for both the *claimed* and *unclaimed* outside-point lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimList {
    head: Option<VertexId>,
}

impl ClaimList {
    pub fn new() -> Self {
        Self { head: None }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn first(&self) -> Option<VertexId> {
        self.head
    }

    pub fn clear(&mut self) {
        self.head = None;
    }

    /// Appends `v` at the tail of the list.
    pub fn add(&mut self, mesh: &mut HalfEdgeMesh, v: VertexId) {
        match self.head {
            None => {
                mesh.vertices[v].prev = None;
                mesh.vertices[v].next = None;
                self.head = Some(v);
            }
            Some(head) => {
                let tail = tail_of(mesh, head);
                mesh.vertices[tail].next = Some(v);
                mesh.vertices[v].prev = Some(tail);
                mesh.vertices[v].next = None;
            }
        }
    }

    /// Splices the chain starting at `sub_head` onto the tail of this list.
    pub fn add_all(&mut self, mesh: &mut HalfEdgeMesh, sub_head: Option<VertexId>) {
        let Some(sub_head) = sub_head else {
            return;
        };
        match self.head {
            None => {
                self.head = Some(sub_head);
            }
            Some(head) => {
                let tail = tail_of(mesh, head);
                mesh.vertices[tail].next = Some(sub_head);
                mesh.vertices[sub_head].prev = Some(tail);
            }
        }
    }

    /// Inserts `v` immediately before `anchor`, which must already be in
    /// this list.
    pub fn insert_before(&mut self, mesh: &mut HalfEdgeMesh, v: VertexId, anchor: VertexId) {
        let prev = mesh.vertices[anchor].prev;
        mesh.vertices[v].prev = prev;
        mesh.vertices[v].next = Some(anchor);
        mesh.vertices[anchor].prev = Some(v);
        match prev {
            Some(p) => mesh.vertices[p].next = Some(v),
            None => self.head = Some(v),
        }
    }

    /// Unlinks `v` from wherever it sits in this list.
    pub fn delete(&mut self, mesh: &mut HalfEdgeMesh, v: VertexId) {
        let prev = mesh.vertices[v].prev;
        let next = mesh.vertices[v].next;
        match prev {
            Some(p) => mesh.vertices[p].next = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            mesh.vertices[n].prev = prev;
        }
        mesh.vertices[v].prev = None;
        mesh.vertices[v].next = None;
    }

    /// Unlinks the inclusive segment `from..=to`, which must be a
    /// contiguous run in this list.
    pub fn delete_range(&mut self, mesh: &mut HalfEdgeMesh, from: VertexId, to: VertexId) {
        let prev = mesh.vertices[from].prev;
        let next = mesh.vertices[to].next;
        match prev {
            Some(p) => mesh.vertices[p].next = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            mesh.vertices[n].prev = prev;
        }
        mesh.vertices[from].prev = None;
        mesh.vertices[to].next = None;
    }
}

fn tail_of(mesh: &HalfEdgeMesh, mut v: VertexId) -> VertexId {
    while let Some(next) = mesh.vertices[v].next {
        v = next;
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{HalfEdgeMesh, Vertex};
    use glam::DVec3;

    fn push(mesh: &mut HalfEdgeMesh, i: usize) -> VertexId {
        mesh.vertices.insert(Vertex::new(DVec3::new(i as f64, 0.0, 0.0), i))
    }

    #[test]
    fn add_then_first_and_order() {
        let mut mesh = HalfEdgeMesh::new();
        let mut list = ClaimList::new();
        let a = push(&mut mesh, 0);
        let b = push(&mut mesh, 1);
        let c = push(&mut mesh, 2);
        list.add(&mut mesh, a);
        list.add(&mut mesh, b);
        list.add(&mut mesh, c);

        assert_eq!(list.first(), Some(a));
        assert_eq!(mesh.vertices[a].next, Some(b));
        assert_eq!(mesh.vertices[b].next, Some(c));
        assert_eq!(mesh.vertices[c].next, None);
        assert_eq!(mesh.vertices[c].prev, Some(b));
    }

    #[test]
    fn delete_head_advances_head() {
        let mut mesh = HalfEdgeMesh::new();
        let mut list = ClaimList::new();
        let a = push(&mut mesh, 0);
        let b = push(&mut mesh, 1);
        list.add(&mut mesh, a);
        list.add(&mut mesh, b);

        list.delete(&mut mesh, a);
        assert_eq!(list.first(), Some(b));
        assert_eq!(mesh.vertices[b].prev, None);
    }

    #[test]
    fn delete_range_removes_contiguous_segment() {
        let mut mesh = HalfEdgeMesh::new();
        let mut list = ClaimList::new();
        let ids: Vec<_> = (0..5).map(|i| push(&mut mesh, i)).collect();
        for &id in &ids {
            list.add(&mut mesh, id);
        }

        list.delete_range(&mut mesh, ids[1], ids[3]);
        assert_eq!(list.first(), Some(ids[0]));
        assert_eq!(mesh.vertices[ids[0]].next, Some(ids[4]));
        assert_eq!(mesh.vertices[ids[4]].prev, Some(ids[0]));
    }

    #[test]
    fn insert_before_splices_in_place() {
        let mut mesh = HalfEdgeMesh::new();
        let mut list = ClaimList::new();
        let a = push(&mut mesh, 0);
        let b = push(&mut mesh, 1);
        list.add(&mut mesh, a);
        list.add(&mut mesh, b);

        let x = push(&mut mesh, 2);
        list.insert_before(&mut mesh, x, b);

        assert_eq!(mesh.vertices[a].next, Some(x));
        assert_eq!(mesh.vertices[x].next, Some(b));
        assert_eq!(mesh.vertices[b].prev, Some(x));
    }

    #[test]
    fn add_all_splices_external_chain_at_tail() {
        let mut mesh = HalfEdgeMesh::new();
        let mut list = ClaimList::new();
        let a = push(&mut mesh, 0);
        list.add(&mut mesh, a);

        let mut other = ClaimList::new();
        let b = push(&mut mesh, 1);
        let c = push(&mut mesh, 2);
        other.add(&mut mesh, b);
        other.add(&mut mesh, c);

        list.add_all(&mut mesh, other.first());
        assert_eq!(mesh.vertices[a].next, Some(b));
        assert_eq!(mesh.vertices[b].prev, Some(a));
        assert_eq!(mesh.vertices[c].next, None);
    }
}
