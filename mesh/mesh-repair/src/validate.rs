//! Mesh validation and health reporting.
//!
//! Read-only diagnostics over a mesh: counts of boundary edges,
//! non-manifold edges and vertices, degenerate and duplicate faces. Useful
//! before a repair run to see what is wrong, and after one to confirm the
//! result is clean.

use std::fmt;

use hashbrown::HashSet;
use mesh_types::IndexedMesh;

use crate::adjacency::MeshAdjacency;
use crate::manifold::fan_components;
use crate::repair::normalize_face;

/// Report of mesh validation results.
#[derive(Debug, Clone, Default)]
pub struct MeshReport {
    /// Total number of vertices.
    pub vertex_count: usize,
    /// Total number of faces.
    pub face_count: usize,
    /// Total number of distinct undirected edges.
    pub edge_count: usize,

    /// Number of edges with only one adjacent face.
    pub boundary_edge_count: usize,
    /// Number of edges with more than two adjacent faces.
    pub non_manifold_edge_count: usize,
    /// Number of vertices whose incident faces form more than one fan.
    pub non_manifold_vertex_count: usize,
    /// Number of faces with area at or below the configured threshold.
    pub degenerate_face_count: usize,
    /// Number of faces repeating an earlier face up to cyclic rotation.
    pub duplicate_face_count: usize,

    /// Whether every edge has exactly two adjacent faces.
    pub is_watertight: bool,
    /// Whether the mesh is manifold at both edges and vertices.
    pub is_manifold: bool,
}

impl MeshReport {
    /// Whether the mesh has any issue a repair run would act on.
    #[must_use]
    pub fn has_issues(&self) -> bool {
        self.boundary_edge_count > 0
            || self.non_manifold_edge_count > 0
            || self.non_manifold_vertex_count > 0
            || self.degenerate_face_count > 0
            || self.duplicate_face_count > 0
    }

    /// Total count of individual issues found.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.boundary_edge_count
            + self.non_manifold_edge_count
            + self.non_manifold_vertex_count
            + self.degenerate_face_count
            + self.duplicate_face_count
    }
}

impl fmt::Display for MeshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Report:")?;
        writeln!(
            f,
            "  Vertices: {}, Faces: {}, Edges: {}",
            self.vertex_count, self.face_count, self.edge_count
        )?;
        writeln!(f, "  Boundary edges: {}", self.boundary_edge_count)?;
        writeln!(f, "  Non-manifold edges: {}", self.non_manifold_edge_count)?;
        writeln!(
            f,
            "  Non-manifold vertices: {}",
            self.non_manifold_vertex_count
        )?;
        writeln!(f, "  Degenerate faces: {}", self.degenerate_face_count)?;
        writeln!(f, "  Duplicate faces: {}", self.duplicate_face_count)?;
        writeln!(f, "  Watertight: {}", self.is_watertight)?;
        write!(f, "  Manifold: {}", self.is_manifold)
    }
}

/// Options for mesh validation.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Faces with area at or below this are counted as degenerate.
    /// Matches the repair pipeline's default threshold.
    pub degenerate_area_threshold: f64,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            degenerate_area_threshold: 1e-10,
        }
    }
}

/// Validate a mesh with default options.
#[must_use]
pub fn validate_mesh(mesh: &IndexedMesh) -> MeshReport {
    validate_mesh_with_options(mesh, &ValidationOptions::default())
}

/// Validate a mesh and report its issues.
///
/// Faces referencing missing vertices are counted as degenerate rather
/// than panicking, so this is safe to call on unchecked input.
#[must_use]
pub fn validate_mesh_with_options(mesh: &IndexedMesh, options: &ValidationOptions) -> MeshReport {
    // Clamp out-of-range indices before touching adjacency; validation
    // must not panic on garbage input.
    let valid_faces: Vec<[u32; 3]> = mesh
        .faces
        .iter()
        .filter(|face| face.iter().all(|&v| (v as usize) < mesh.vertices.len()))
        .copied()
        .collect();
    let invalid_face_count = mesh.faces.len() - valid_faces.len();

    let adjacency = MeshAdjacency::build(mesh.vertices.len(), &valid_faces);

    let non_manifold_vertex_count = (0..mesh.vertices.len())
        .filter(|&vertex| {
            let vertex = vertex as u32;
            fan_components(vertex, adjacency.faces_for_vertex(vertex), &valid_faces).len() > 1
        })
        .count();

    let degenerate_face_count = invalid_face_count
        + mesh
            .triangles()
            .filter(|triangle| triangle.area() <= options.degenerate_area_threshold)
            .count();

    let duplicate_face_count = count_duplicate_faces(&mesh.faces);

    let boundary_edge_count = adjacency.boundary_edge_count();
    let non_manifold_edge_count = adjacency.non_manifold_edge_count();

    MeshReport {
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        edge_count: adjacency.edge_count(),
        boundary_edge_count,
        non_manifold_edge_count,
        non_manifold_vertex_count,
        degenerate_face_count,
        duplicate_face_count,
        is_watertight: adjacency.is_watertight(),
        is_manifold: non_manifold_edge_count == 0 && non_manifold_vertex_count == 0,
    }
}

/// Count faces that repeat an earlier face up to cyclic rotation.
///
/// Winding matters: a reversed copy of a face is not a duplicate, it is
/// the far side of a two-sided patch.
fn count_duplicate_faces(faces: &[[u32; 3]]) -> usize {
    let mut seen = HashSet::with_capacity(faces.len());
    faces
        .iter()
        .filter(|&&face| !seen.insert(normalize_face(face)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::Vertex;

    fn mesh_from(positions: &[[f64; 3]], faces: &[[u32; 3]]) -> IndexedMesh {
        IndexedMesh::from_parts(
            positions.iter().map(|&[x, y, z]| Vertex::from_coords(x, y, z)).collect(),
            faces.to_vec(),
        )
    }

    fn unit_tetrahedron() -> IndexedMesh {
        mesh_from(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, 1.0, 0.0],
                [0.5, 0.5, 1.0],
            ],
            &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]],
        )
    }

    #[test]
    fn tetrahedron_is_clean() {
        let report = validate_mesh(&unit_tetrahedron());
        assert_eq!(report.vertex_count, 4);
        assert_eq!(report.face_count, 4);
        assert_eq!(report.edge_count, 6);
        assert!(report.is_watertight);
        assert!(report.is_manifold);
        assert!(!report.has_issues());
        assert_eq!(report.issue_count(), 0);
    }

    #[test]
    fn single_triangle_has_boundary() {
        let mesh = mesh_from(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2]],
        );
        let report = validate_mesh(&mesh);
        assert_eq!(report.boundary_edge_count, 3);
        assert!(!report.is_watertight);
        assert!(report.is_manifold);
        assert!(report.has_issues());
    }

    #[test]
    fn counts_non_manifold_edges() {
        let mesh = mesh_from(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, 1.0, 0.0],
                [0.5, 0.0, 1.0],
                [0.5, -1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 1, 3], [0, 1, 4]],
        );
        let report = validate_mesh(&mesh);
        assert_eq!(report.non_manifold_edge_count, 1);
        assert!(!report.is_manifold);
    }

    #[test]
    fn counts_non_manifold_vertices() {
        // Bowtie: two fans sharing only vertex 0. Edge-manifold but not
        // vertex-manifold.
        let mesh = mesh_from(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [-1.0, 0.0, 0.0],
                [-1.0, -1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 3, 4]],
        );
        let report = validate_mesh(&mesh);
        assert_eq!(report.non_manifold_edge_count, 0);
        assert_eq!(report.non_manifold_vertex_count, 1);
        assert!(!report.is_manifold);
    }

    #[test]
    fn counts_degenerate_faces() {
        let mesh = mesh_from(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            &[[0, 1, 2]],
        );
        let report = validate_mesh(&mesh);
        assert_eq!(report.degenerate_face_count, 1);
    }

    #[test]
    fn counts_rotated_duplicate_but_not_reversed() {
        let mesh = mesh_from(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2], [1, 2, 0], [0, 2, 1]],
        );
        let report = validate_mesh(&mesh);
        // [1,2,0] is a rotation of [0,1,2]; [0,2,1] is its back side.
        assert_eq!(report.duplicate_face_count, 1);
    }

    #[test]
    fn invalid_indices_do_not_panic() {
        let mesh = mesh_from(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], &[[0, 1, 9]]);
        let report = validate_mesh(&mesh);
        assert_eq!(report.degenerate_face_count, 1);
        assert!(report.has_issues());
    }

    #[test]
    fn empty_mesh_is_trivially_watertight() {
        let report = validate_mesh(&IndexedMesh::new());
        assert_eq!(report.vertex_count, 0);
        assert!(report.is_watertight);
        assert!(report.is_manifold);
        assert!(!report.has_issues());
    }

    #[test]
    fn report_display_lists_counts() {
        let report = validate_mesh(&unit_tetrahedron());
        let text = report.to_string();
        assert!(text.contains("Mesh Report:"));
        assert!(text.contains("Vertices: 4"));
        assert!(text.contains("Watertight: true"));
    }

    #[test]
    fn threshold_is_inclusive() {
        // Right triangle with legs 1 and 2: area exactly 1.0.
        let mesh = mesh_from(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
            &[[0, 1, 2]],
        );
        let options = ValidationOptions {
            degenerate_area_threshold: 1.0,
        };
        let report = validate_mesh_with_options(&mesh, &options);
        assert_eq!(report.degenerate_face_count, 1);
    }
}
