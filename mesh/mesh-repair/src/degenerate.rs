//! Degenerate face removal.

use mesh_types::IndexedMesh;
use rayon::prelude::*;
use tracing::debug;

/// Remove faces whose area is at or below `area_threshold`.
///
/// Returns the surviving faces and the number removed. Faces with repeated
/// vertex indices have zero area and are always removed; faces referencing
/// missing vertices are removed as well, since they have no area at all.
///
/// Area evaluation is read-only per face, so it is farmed out to a parallel
/// iterator; the filter pass that follows is sequential and preserves face
/// order.
#[must_use]
pub fn remove_degenerate_faces(
    mesh: &IndexedMesh,
    area_threshold: f64,
) -> (Vec<[u32; 3]>, usize) {
    let keep: Vec<bool> = (0..mesh.faces.len())
        .into_par_iter()
        .map(|face_idx| {
            mesh.triangle(face_idx)
                .is_some_and(|triangle| triangle.area() > area_threshold)
        })
        .collect();

    let faces: Vec<[u32; 3]> = mesh
        .faces
        .iter()
        .zip(&keep)
        .filter_map(|(face, &kept)| kept.then_some(*face))
        .collect();

    let removed = mesh.faces.len() - faces.len();
    if removed > 0 {
        debug!(removed, area_threshold, "removed degenerate faces");
    }
    (faces, removed)
}
