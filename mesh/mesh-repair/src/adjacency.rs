//! Mesh adjacency data structures.
//!
//! Every repair stage derives connectivity fresh from the face array it is
//! given; nothing here is cached across stages.

use hashbrown::HashMap;
use mesh_types::IndexedMesh;

/// Normalize an edge so the smaller vertex index comes first.
#[inline]
pub(crate) fn normalize_edge(v0: u32, v1: u32) -> (u32, u32) {
    if v0 < v1 {
        (v0, v1)
    } else {
        (v1, v0)
    }
}

/// Undirected edge and vertex incidence for a triangle mesh.
///
/// Face lists are kept in face-iteration order, so queries are
/// deterministic for a given input mesh.
#[derive(Debug, Clone)]
pub struct MeshAdjacency {
    /// Maps a normalized edge `(min, max)` to the faces containing it.
    edge_to_faces: HashMap<(u32, u32), Vec<usize>>,
    /// Faces containing each vertex, indexed densely by vertex.
    vertex_to_faces: Vec<Vec<usize>>,
}

impl MeshAdjacency {
    /// Build adjacency from a face list.
    ///
    /// `vertex_count` sizes the per-vertex table; faces must only reference
    /// indices below it.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_repair::MeshAdjacency;
    ///
    /// let faces = vec![[0, 1, 2], [1, 3, 2]];
    /// let adj = MeshAdjacency::build(4, &faces);
    ///
    /// assert_eq!(adj.boundary_edge_count(), 4);
    /// assert_eq!(adj.faces_for_vertex(1), &[0, 1]);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if a face references a vertex index `>= vertex_count`.
    #[must_use]
    pub fn build(vertex_count: usize, faces: &[[u32; 3]]) -> Self {
        let mut edge_to_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
        let mut vertex_to_faces: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];

        for (face_idx, face) in faces.iter().enumerate() {
            let edges = [
                normalize_edge(face[0], face[1]),
                normalize_edge(face[1], face[2]),
                normalize_edge(face[2], face[0]),
            ];
            for edge in edges {
                edge_to_faces.entry(edge).or_default().push(face_idx);
            }
            for &vertex in face {
                vertex_to_faces[vertex as usize].push(face_idx);
            }
        }

        Self {
            edge_to_faces,
            vertex_to_faces,
        }
    }

    /// Build adjacency for a mesh.
    ///
    /// # Panics
    ///
    /// Panics if a face references a missing vertex; [`crate::repair_mesh`]
    /// validates this precondition up front.
    #[must_use]
    pub fn from_mesh(mesh: &IndexedMesh) -> Self {
        Self::build(mesh.vertex_count(), &mesh.faces)
    }

    /// Faces containing the undirected edge `(v0, v1)`, in face order.
    #[must_use]
    pub fn faces_for_edge(&self, v0: u32, v1: u32) -> Option<&[usize]> {
        self.edge_to_faces
            .get(&normalize_edge(v0, v1))
            .map(Vec::as_slice)
    }

    /// Faces containing `vertex`, in face order. Empty when out of range.
    #[must_use]
    pub fn faces_for_vertex(&self, vertex: u32) -> &[usize] {
        self.vertex_to_faces
            .get(vertex as usize)
            .map_or(&[], Vec::as_slice)
    }

    /// Number of distinct undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }

    /// Number of edges with exactly one incident face.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() == 1)
            .count()
    }

    /// Number of edges with more than two incident faces.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() > 2)
            .count()
    }

    /// Whether every edge has at most two incident faces.
    ///
    /// This is the edge-level condition only; vertex fans are checked
    /// separately by [`crate::validate_mesh`].
    #[must_use]
    pub fn is_edge_manifold(&self) -> bool {
        self.non_manifold_edge_count() == 0
    }

    /// Whether every edge has exactly two incident faces.
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() == 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_faces() -> Vec<[u32; 3]> {
        vec![[0, 1, 2], [0, 2, 3]]
    }

    #[test]
    fn build_counts_edges() {
        let adj = MeshAdjacency::build(4, &quad_faces());
        // 4 perimeter edges plus the shared diagonal.
        assert_eq!(adj.edge_count(), 5);
    }

    #[test]
    fn shared_edge_has_two_faces() {
        let adj = MeshAdjacency::build(4, &quad_faces());
        assert_eq!(adj.faces_for_edge(0, 2), Some(&[0, 1][..]));
        assert_eq!(adj.faces_for_edge(2, 0), Some(&[0, 1][..]));
    }

    #[test]
    fn missing_edge_returns_none() {
        let adj = MeshAdjacency::build(4, &quad_faces());
        assert_eq!(adj.faces_for_edge(1, 3), None);
    }

    #[test]
    fn vertex_faces_in_face_order() {
        let adj = MeshAdjacency::build(4, &quad_faces());
        assert_eq!(adj.faces_for_vertex(0), &[0, 1]);
        assert_eq!(adj.faces_for_vertex(1), &[0]);
        assert_eq!(adj.faces_for_vertex(3), &[1]);
    }

    #[test]
    fn out_of_range_vertex_has_no_faces() {
        let adj = MeshAdjacency::build(4, &quad_faces());
        assert!(adj.faces_for_vertex(99).is_empty());
    }

    #[test]
    fn quad_boundary() {
        let adj = MeshAdjacency::build(4, &quad_faces());
        assert_eq!(adj.boundary_edge_count(), 4);
        assert!(!adj.is_watertight());
        assert!(adj.is_edge_manifold());
    }

    #[test]
    fn tetrahedron_is_watertight() {
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let adj = MeshAdjacency::build(4, &faces);
        assert_eq!(adj.edge_count(), 6);
        assert_eq!(adj.boundary_edge_count(), 0);
        assert!(adj.is_watertight());
        assert!(adj.is_edge_manifold());
    }

    #[test]
    fn triple_incidence_is_non_manifold() {
        let faces = vec![[0, 1, 2], [0, 1, 3], [0, 1, 4]];
        let adj = MeshAdjacency::build(5, &faces);
        assert_eq!(adj.non_manifold_edge_count(), 1);
        assert!(!adj.is_edge_manifold());
        assert!(!adj.is_watertight());
        assert_eq!(adj.faces_for_edge(0, 1), Some(&[0, 1, 2][..]));
    }

    #[test]
    fn empty_face_list() {
        let adj = MeshAdjacency::build(0, &[]);
        assert_eq!(adj.edge_count(), 0);
        assert_eq!(adj.boundary_edge_count(), 0);
        assert!(adj.is_edge_manifold());
        // Vacuously true: there are no edges to violate it.
        assert!(adj.is_watertight());
    }

    #[test]
    fn normalize_edge_orders_pairs() {
        assert_eq!(normalize_edge(5, 2), (2, 5));
        assert_eq!(normalize_edge(2, 5), (2, 5));
        assert_eq!(normalize_edge(3, 3), (3, 3));
    }
}
