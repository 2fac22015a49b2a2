//! Mesh repair operations for fixing common mesh issues.
//!
//! This crate provides tools for:
//! - Mesh validation (manifold checks, watertight checks)
//! - Vertex stitching (merge vertices within a tolerance)
//! - Degenerate face removal
//! - Duplicate face removal
//! - Non-manifold edge and vertex resolution
//! - Boundary loop detection and hole filling
//! - Unreferenced vertex removal
//!
//! The pipeline entry point is [`repair_mesh`], which runs the stages in a
//! fixed order and returns a repaired copy plus a [`RepairReport`] of what
//! each stage did. Every stage is also exported on its own for callers
//! that need just one of them. Stages never mutate their input; they take
//! a mesh by reference and return new collections.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero engine dependencies.
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexedMesh, Vertex};
//! use mesh_repair::{validate_mesh, repair_mesh, RepairOptions};
//!
//! // A triangle with a duplicated corner vertex.
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0 + 1e-9, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
//! mesh.faces.push([0, 2, 3]);
//!
//! let report = validate_mesh(&mesh);
//! assert_eq!(report.boundary_edge_count, 3);
//!
//! let (repaired, report) = repair_mesh(&mesh, &RepairOptions::default())?;
//! assert_eq!(report.vertices_merged, 1);
//! assert!(validate_mesh(&repaired).is_watertight);
//! # Ok::<(), mesh_repair::RepairError>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod adjacency;
mod degenerate;
mod error;
pub mod holes;
pub mod manifold;
mod repair;
mod stitch;
mod validate;

pub use adjacency::MeshAdjacency;
pub use degenerate::remove_degenerate_faces;
pub use error::{RepairError, RepairResult};
pub use repair::{
    RepairOptions, RepairReport, remove_duplicate_faces, remove_unreferenced_vertices,
    repair_mesh,
};
pub use stitch::{StitchResult, stitch_vertices};
pub use validate::{MeshReport, ValidationOptions, validate_mesh, validate_mesh_with_options};

// Re-export commonly used items from submodules
pub use holes::{BoundaryLoop, fill_hole, fill_hole_refined, find_boundary_loops};
pub use manifold::{
    EdgeFix, VertexFix, VertexSplit, fix_non_manifold_edges, fix_non_manifold_vertices,
};
