//! Property-based tests for mesh repair.
//!
//! These tests use proptest to generate random meshes and verify invariants.
//!
//! Run with: cargo test -p mesh-repair -- proptest

use mesh_repair::{
    RepairError, RepairOptions, fix_non_manifold_edges, fix_non_manifold_vertices,
    remove_degenerate_faces, repair_mesh, stitch_vertices, validate_mesh,
};
use mesh_types::{IndexedMesh, Triangle, Vertex};
use proptest::prelude::*;

// =============================================================================
// Strategies for generating random meshes
// =============================================================================

/// Generate a random vertex position in a bounded range.
fn arb_position() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-100.0..100.0f64)
}

/// Generate a random vertex with position only.
fn arb_vertex() -> impl Strategy<Value = Vertex> {
    arb_position().prop_map(|[x, y, z]| Vertex::from_coords(x, y, z))
}

/// Generate a mesh whose faces all reference valid vertices. The faces are
/// otherwise unconstrained: degenerate, duplicated, and non-manifold
/// configurations all occur.
fn arb_mesh(max_vertices: usize, max_faces: usize) -> impl Strategy<Value = IndexedMesh> {
    prop::collection::vec(arb_vertex(), 3..=max_vertices).prop_flat_map(move |vertices| {
        let n = vertices.len() as u32;
        let face = prop::array::uniform3(0..n);
        prop::collection::vec(face, 0..=max_faces)
            .prop_map(move |faces| IndexedMesh::from_parts(vertices.clone(), faces))
    })
}

/// Generate a mesh where face indices may run past the vertex array.
fn arb_mesh_with_garbage_indices() -> impl Strategy<Value = IndexedMesh> {
    prop::collection::vec(arb_vertex(), 3..=20).prop_flat_map(move |vertices| {
        let n = vertices.len() as u32;
        let face = prop::array::uniform3(0..n + 3);
        prop::collection::vec(face, 1..=30)
            .prop_map(move |faces| IndexedMesh::from_parts(vertices.clone(), faces))
    })
}

/// Triangulated unit cube centered at the origin.
fn cube_mesh() -> IndexedMesh {
    let mut mesh = IndexedMesh::new();

    let verts = [
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
    ];
    for v in &verts {
        mesh.vertices.push(Vertex::from_coords(v[0], v[1], v[2]));
    }

    let faces = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [2, 6, 5],
        [2, 5, 1],
        [2, 3, 7],
        [2, 7, 6],
        [3, 0, 4],
        [3, 4, 7],
    ];
    for f in &faces {
        mesh.faces.push(*f);
    }

    mesh
}

fn assert_valid_indices(mesh: &IndexedMesh) -> Result<(), TestCaseError> {
    let n = mesh.vertices.len() as u32;
    for face in &mesh.faces {
        for &v in face {
            prop_assert!(v < n, "face index {} >= vertex count {}", v, n);
        }
    }
    Ok(())
}

// =============================================================================
// Property Tests: Validation
// =============================================================================

proptest! {
    /// Validation should never panic, even on garbage indices.
    #[test]
    fn validation_never_panics(mesh in arb_mesh_with_garbage_indices()) {
        let _ = validate_mesh(&mesh);
    }

    /// Validation is read-only: two runs agree.
    #[test]
    fn validation_is_repeatable(mesh in arb_mesh(30, 50)) {
        let report1 = validate_mesh(&mesh);
        let report2 = validate_mesh(&mesh);

        prop_assert_eq!(report1.vertex_count, report2.vertex_count);
        prop_assert_eq!(report1.face_count, report2.face_count);
        prop_assert_eq!(report1.issue_count(), report2.issue_count());
        prop_assert_eq!(report1.is_manifold, report2.is_manifold);
        prop_assert_eq!(report1.is_watertight, report2.is_watertight);
    }
}

// =============================================================================
// Property Tests: Vertex Stitching
// =============================================================================

proptest! {
    /// Stitching never increases vertex count, and the merge count matches.
    #[test]
    fn stitch_never_increases_vertices(mesh in arb_mesh(30, 50)) {
        let result = stitch_vertices(&mesh, 0.001);
        prop_assert!(result.vertices.len() <= mesh.vertices.len());
        prop_assert_eq!(result.merged, mesh.vertices.len() - result.vertices.len());
    }

    /// Every surviving vertex pair is separated by at least the tolerance.
    #[test]
    fn stitch_output_is_separated(mesh in arb_mesh(25, 0)) {
        let tolerance = 0.5;
        let result = stitch_vertices(&mesh, tolerance);

        for (i, a) in result.vertices.iter().enumerate() {
            for b in &result.vertices[i + 1..] {
                let dist_sq = (a.position - b.position).norm_squared();
                prop_assert!(dist_sq >= tolerance * tolerance);
            }
        }
    }

    /// All face indices remain valid after stitching.
    #[test]
    fn stitch_produces_valid_indices(mesh in arb_mesh(30, 50)) {
        let result = stitch_vertices(&mesh, 0.01);
        let stitched = IndexedMesh::from_parts(result.vertices, result.faces);
        assert_valid_indices(&stitched)?;
    }
}

// =============================================================================
// Property Tests: Stage postconditions
// =============================================================================

proptest! {
    /// Every face surviving the degenerate filter has area above the threshold.
    #[test]
    fn degenerate_filter_output_exceeds_threshold(mesh in arb_mesh(30, 50)) {
        let threshold = 1e-10;
        let (faces, removed) = remove_degenerate_faces(&mesh, threshold);

        prop_assert_eq!(faces.len() + removed, mesh.faces.len());
        for face in &faces {
            let triangle = Triangle::new(
                mesh.vertices[face[0] as usize].position,
                mesh.vertices[face[1] as usize].position,
                mesh.vertices[face[2] as usize].position,
            );
            prop_assert!(triangle.area() > threshold);
        }
    }

    /// After the edge fix, no edge has more than two incident faces.
    #[test]
    fn edge_fix_removes_all_over_shared_edges(mesh in arb_mesh(20, 40)) {
        let fix = fix_non_manifold_edges(&mesh);
        let fixed = IndexedMesh::from_parts(mesh.vertices.clone(), fix.faces);
        prop_assert_eq!(validate_mesh(&fixed).non_manifold_edge_count, 0);
    }

    /// After the vertex fix, every vertex owns a single fan.
    #[test]
    fn vertex_fix_leaves_single_fans(mesh in arb_mesh(20, 40)) {
        let fix = fix_non_manifold_vertices(&mesh);
        let fixed = IndexedMesh::from_parts(fix.vertices, fix.faces);
        assert_valid_indices(&fixed)?;
        prop_assert_eq!(validate_mesh(&fixed).non_manifold_vertex_count, 0);
    }
}

// =============================================================================
// Property Tests: Full Repair
// =============================================================================

proptest! {
    /// Repair accepts any index-valid mesh and returns an index-valid mesh.
    #[test]
    fn repair_round_trips_valid_meshes(mesh in arb_mesh(30, 50)) {
        let (repaired, _) = repair_mesh(&mesh, &RepairOptions::default()).unwrap();
        assert_valid_indices(&repaired)?;
    }

    /// Repairing the repaired mesh also succeeds.
    #[test]
    fn repair_can_run_twice(mesh in arb_mesh(20, 30)) {
        let options = RepairOptions::default();
        let (repaired, _) = repair_mesh(&mesh, &options).unwrap();
        let (again, _) = repair_mesh(&repaired, &options).unwrap();
        assert_valid_indices(&again)?;
    }

    /// Hole filling is bounded by the boundary edge count, so repair never
    /// explodes the face count.
    #[test]
    fn repair_does_not_explode_faces(mesh in arb_mesh(30, 50)) {
        let (repaired, _) = repair_mesh(&mesh, &RepairOptions::default()).unwrap();
        prop_assert!(repaired.face_count() <= mesh.face_count() * 4 + 16);
    }

    /// With the defaults, every output face beats the degenerate area
    /// threshold: the filter enforces it for surviving faces and the fill
    /// stage declines patches that fall below it.
    #[test]
    fn repair_output_faces_exceed_area_threshold(mesh in arb_mesh(30, 50)) {
        let options = RepairOptions::default();
        let (repaired, _) = repair_mesh(&mesh, &options).unwrap();
        for triangle in repaired.triangles() {
            prop_assert!(triangle.area() > options.degenerate_area_threshold);
        }
    }

    /// Garbage indices are rejected with an error, never a panic.
    #[test]
    fn repair_rejects_garbage_indices(mesh in arb_mesh_with_garbage_indices()) {
        let has_garbage = {
            let n = mesh.vertices.len() as u32;
            mesh.faces.iter().any(|f| f.iter().any(|&v| v >= n))
        };
        match repair_mesh(&mesh, &RepairOptions::default()) {
            Ok(_) => prop_assert!(!has_garbage),
            Err(RepairError::IndexOutOfBounds { vertex_count, .. }) => {
                prop_assert!(has_garbage);
                prop_assert_eq!(vertex_count, mesh.vertices.len());
            }
        }
    }
}

// =============================================================================
// Fixed fixtures: cube invariants
// =============================================================================

#[test]
fn cube_is_valid() {
    let report = validate_mesh(&cube_mesh());
    assert_eq!(report.vertex_count, 8);
    assert_eq!(report.face_count, 12);
    assert_eq!(report.edge_count, 18);
    assert!(report.is_watertight);
    assert!(report.is_manifold);
    assert!(!report.has_issues());
}

#[test]
fn cube_repair_is_a_no_op() {
    let cube = cube_mesh();
    let (repaired, report) = repair_mesh(&cube, &RepairOptions::default()).unwrap();

    assert!(!report.had_changes());
    assert_eq!(repaired.vertex_count(), cube.vertex_count());
    assert_eq!(repaired.face_count(), cube.face_count());
    assert_eq!(repaired.faces, cube.faces);
}

#[test]
fn cube_stitch_is_a_no_op() {
    let cube = cube_mesh();
    let result = stitch_vertices(&cube, 0.001);
    assert_eq!(result.merged, 0);
    assert_eq!(result.vertices.len(), cube.vertices.len());
    assert_eq!(result.faces.len(), cube.faces.len());
}
