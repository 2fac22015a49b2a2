//! Vertex stitching.
//!
//! Merges vertices that lie within a distance tolerance of each other and
//! remaps faces accordingly. Stitching closes the hairline cracks left by
//! exporters that emit one vertex per corner instead of sharing them.

use mesh_types::{IndexedMesh, Vertex};
use tracing::debug;

/// Outcome of a stitching pass.
#[derive(Debug, Clone)]
pub struct StitchResult {
    /// Deduplicated vertex array.
    pub vertices: Vec<Vertex>,
    /// Faces remapped onto the new vertex array. Faces whose corners
    /// collapsed onto a single vertex are dropped.
    pub faces: Vec<[u32; 3]>,
    /// Number of vertices merged away.
    pub merged: usize,
}

/// Merge vertices closer than `tolerance` and remap faces.
///
/// Each vertex is compared against the vertices already accepted, in input
/// order, and merged into the first one within `tolerance` (squared distance
/// strictly below `tolerance * tolerance`). Comparing against accepted
/// vertices only keeps the pass order-stable: a chain of vertices spaced
/// just under the tolerance does not collapse transitively onto one end.
///
/// Faces left with fewer than three distinct corners after remapping are
/// dropped. The scan is a direct pairwise comparison, quadratic in vertex
/// count.
///
/// # Panics
///
/// Panics if a face references a missing vertex; [`crate::repair_mesh`]
/// validates this precondition up front.
#[must_use]
pub fn stitch_vertices(mesh: &IndexedMesh, tolerance: f64) -> StitchResult {
    let tolerance_sq = tolerance * tolerance;

    let mut vertices: Vec<Vertex> = Vec::with_capacity(mesh.vertices.len());
    let mut remap: Vec<u32> = Vec::with_capacity(mesh.vertices.len());

    for vertex in &mesh.vertices {
        let target = vertices
            .iter()
            .position(|kept| (kept.position - vertex.position).norm_squared() < tolerance_sq);
        match target {
            Some(kept_idx) => remap.push(kept_idx as u32),
            None => {
                remap.push(vertices.len() as u32);
                vertices.push(*vertex);
            }
        }
    }

    let merged = mesh.vertices.len() - vertices.len();

    let mut faces: Vec<[u32; 3]> = Vec::with_capacity(mesh.faces.len());
    for face in &mesh.faces {
        let mapped = [
            remap[face[0] as usize],
            remap[face[1] as usize],
            remap[face[2] as usize],
        ];
        if mapped[0] != mapped[1] && mapped[1] != mapped[2] && mapped[2] != mapped[0] {
            faces.push(mapped);
        }
    }

    if merged > 0 {
        debug!(
            merged,
            tolerance,
            faces_dropped = mesh.faces.len() - faces.len(),
            "stitched coincident vertices"
        );
    }

    StitchResult {
        vertices,
        faces,
        merged,
    }
}
