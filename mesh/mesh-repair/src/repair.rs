//! The repair pipeline: options, report, and the stage orchestrator.

use std::fmt;

use hashbrown::HashSet;
use mesh_types::{IndexedMesh, Triangle, Vertex};
use tracing::{info, warn};

use crate::degenerate::remove_degenerate_faces;
use crate::error::{RepairError, RepairResult};
use crate::holes::{fill_hole, fill_hole_refined, find_boundary_loops};
use crate::manifold::{fix_non_manifold_edges, fix_non_manifold_vertices};
use crate::stitch::stitch_vertices;

/// Configuration for a repair run.
///
/// All distances and areas are in the same units as the mesh coordinates.
///
/// # Example
///
/// ```
/// use mesh_repair::RepairOptions;
///
/// // Defaults are tuned for millimeter-scale meshes.
/// let options = RepairOptions::default();
///
/// // Or adjust individual knobs.
/// let options = RepairOptions {
///     stitch_tolerance: 1e-4,
///     ..Default::default()
/// };
/// let options = RepairOptions::default().with_max_fillable_loop_length(64);
/// ```
#[derive(Debug, Clone)]
pub struct RepairOptions {
    /// Vertices closer than this are merged. Default: `1e-6`.
    pub stitch_tolerance: f64,

    /// Faces with area at or below this are removed. Default: `1e-10`.
    pub degenerate_area_threshold: f64,

    /// Longest boundary loop filled with the minimum-area triangulation;
    /// fillable loops above this get a centroid fan instead. The
    /// triangulation is cubic in loop length, so raise this with care.
    /// Default: `20`.
    pub min_area_loop_limit: usize,

    /// Longest boundary loop that gets filled at all. Longer loops are
    /// left open and reported. Default: `20`.
    pub max_fillable_loop_length: usize,

    /// Merge vertices within `stitch_tolerance`. Default: `true`.
    pub stitch: bool,
    /// Remove faces repeating an earlier face up to rotation. Default: `true`.
    pub remove_duplicates: bool,
    /// Remove faces at or below `degenerate_area_threshold`. Default: `true`.
    pub remove_degenerate: bool,
    /// Drop excess faces from edges shared by more than two. Default: `true`.
    pub fix_nonmanifold_edges: bool,
    /// Split vertices whose incident faces form several fans. Default: `true`.
    pub fix_nonmanifold_vertices: bool,
    /// Detect boundary loops and fill the fillable ones. Default: `true`.
    pub fill_holes: bool,
    /// Drop vertices no face references. Default: `true`.
    pub remove_unreferenced: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            stitch_tolerance: 1e-6,
            degenerate_area_threshold: 1e-10,
            min_area_loop_limit: 20,
            max_fillable_loop_length: 20,
            stitch: true,
            remove_duplicates: true,
            remove_degenerate: true,
            fix_nonmanifold_edges: true,
            fix_nonmanifold_vertices: true,
            fill_holes: true,
            remove_unreferenced: true,
        }
    }
}

impl RepairOptions {
    /// Set the vertex stitching tolerance.
    #[must_use]
    pub fn with_stitch_tolerance(mut self, tolerance: f64) -> Self {
        self.stitch_tolerance = tolerance;
        self
    }

    /// Set the degenerate-face area threshold.
    #[must_use]
    pub fn with_degenerate_area_threshold(mut self, threshold: f64) -> Self {
        self.degenerate_area_threshold = threshold;
        self
    }

    /// Set the longest loop the minimum-area triangulation is applied to.
    #[must_use]
    pub fn with_min_area_loop_limit(mut self, limit: usize) -> Self {
        self.min_area_loop_limit = limit;
        self
    }

    /// Set the longest loop that gets filled at all.
    #[must_use]
    pub fn with_max_fillable_loop_length(mut self, length: usize) -> Self {
        self.max_fillable_loop_length = length;
        self
    }
}

/// Summary of what a repair run did.
///
/// `operations` gets one line per enabled stage, zero counts included, so
/// a log of the run reads top to bottom in execution order.
#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    /// Human-readable description of each stage that ran, in order.
    pub operations: Vec<String>,

    /// Loop lengths of holes left open: loops longer than
    /// [`RepairOptions::max_fillable_loop_length`], and loops whose patch
    /// would have contained a face at or below the degenerate threshold.
    pub unfilled_holes: Vec<usize>,

    /// Vertices merged by stitching.
    pub vertices_merged: usize,
    /// Duplicate faces removed.
    pub duplicate_faces_removed: usize,
    /// Degenerate faces removed.
    pub degenerate_faces_removed: usize,
    /// Faces removed from over-shared edges.
    pub nonmanifold_faces_removed: usize,
    /// Edges that had more than two incident faces.
    pub nonmanifold_edges_flagged: usize,
    /// Duplicate vertices created by fan splits.
    pub vertices_split: usize,
    /// Boundary loops that were filled.
    pub holes_filled: usize,
    /// Triangles added by hole filling.
    pub fill_faces_added: usize,
    /// Unreferenced vertices dropped.
    pub unreferenced_vertices_removed: usize,
}

impl RepairReport {
    /// Whether the run changed the mesh at all.
    #[must_use]
    pub fn had_changes(&self) -> bool {
        self.vertices_merged > 0
            || self.duplicate_faces_removed > 0
            || self.degenerate_faces_removed > 0
            || self.nonmanifold_faces_removed > 0
            || self.vertices_split > 0
            || self.holes_filled > 0
            || self.unreferenced_vertices_removed > 0
    }
}

impl fmt::Display for RepairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repair Report:")?;
        if self.operations.is_empty() {
            writeln!(f, "  (no stages ran)")?;
        }
        for operation in &self.operations {
            writeln!(f, "  - {operation}")?;
        }
        if !self.unfilled_holes.is_empty() {
            writeln!(
                f,
                "  Unfilled hole loop lengths: {:?}",
                self.unfilled_holes
            )?;
        }
        Ok(())
    }
}

/// Rotate a face so its smallest vertex index comes first, preserving
/// winding.
pub(crate) fn normalize_face(face: [u32; 3]) -> [u32; 3] {
    let first = if face[0] <= face[1] && face[0] <= face[2] {
        0
    } else if face[1] <= face[2] {
        1
    } else {
        2
    };
    [face[first], face[(first + 1) % 3], face[(first + 2) % 3]]
}

/// Remove faces that repeat an earlier face up to cyclic rotation.
///
/// Winding is preserved in the comparison: a reversed copy of a face is
/// the far side of a two-sided patch, not a duplicate, and removing it
/// would reopen a closed surface.
///
/// Returns the kept faces in input order and the number removed.
#[must_use]
pub fn remove_duplicate_faces(faces: &[[u32; 3]]) -> (Vec<[u32; 3]>, usize) {
    let mut seen: HashSet<[u32; 3]> = HashSet::with_capacity(faces.len());
    let mut kept: Vec<[u32; 3]> = Vec::with_capacity(faces.len());

    for &face in faces {
        if seen.insert(normalize_face(face)) {
            kept.push(face);
        }
    }

    let removed = faces.len() - kept.len();
    (kept, removed)
}

/// Remove vertices no face references and remap the faces.
///
/// Returns the kept vertices, the remapped faces, and the number of
/// vertices removed. Kept vertices stay in their original relative order.
///
/// # Panics
///
/// Panics if a face references a missing vertex; [`repair_mesh`] validates
/// this precondition up front.
#[must_use]
pub fn remove_unreferenced_vertices(
    vertices: &[Vertex],
    faces: &[[u32; 3]],
) -> (Vec<Vertex>, Vec<[u32; 3]>, usize) {
    let mut referenced = vec![false; vertices.len()];
    for face in faces {
        for &v in face {
            referenced[v as usize] = true;
        }
    }

    let mut remap = vec![0_u32; vertices.len()];
    let mut kept: Vec<Vertex> = Vec::with_capacity(vertices.len());
    for (idx, vertex) in vertices.iter().enumerate() {
        if referenced[idx] {
            remap[idx] = kept.len() as u32;
            kept.push(*vertex);
        }
    }

    let removed = vertices.len() - kept.len();
    let faces: Vec<[u32; 3]> = faces
        .iter()
        .map(|f| [remap[f[0] as usize], remap[f[1] as usize], remap[f[2] as usize]])
        .collect();

    (kept, faces, removed)
}

/// Run the repair pipeline on a mesh.
///
/// Stages run in a fixed order: stitch, duplicate faces, degenerate faces,
/// non-manifold edges, non-manifold vertices, hole filling, unreferenced
/// vertices. Each enabled stage appends one line to the report whether or
/// not it changed anything. The input mesh is left untouched; the repaired
/// mesh is returned alongside the report.
///
/// The order matters: stitching first closes hairline cracks so the hole
/// detector does not chase them, and degenerate removal before the
/// manifold fixes keeps sliver faces from inflating edge incidence counts.
/// Hole patches are checked against the degenerate threshold before they
/// are appended; a hole whose patch would immediately fall to the filter
/// is left open and recorded instead.
///
/// # Errors
///
/// Returns [`RepairError::IndexOutOfBounds`] if any face references a
/// vertex index outside the vertex array. No stage runs in that case.
///
/// # Example
///
/// ```
/// use mesh_repair::{repair_mesh, RepairOptions};
/// use mesh_types::IndexedMesh;
///
/// // A single triangle: its own outline is the hole.
/// let mesh = IndexedMesh::from_raw(
///     &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
///     &[0, 1, 2],
/// );
/// let (repaired, report) = repair_mesh(&mesh, &RepairOptions::default())?;
/// assert_eq!(report.holes_filled, 1);
/// assert_eq!(repaired.face_count(), 2);
/// # Ok::<(), mesh_repair::RepairError>(())
/// ```
pub fn repair_mesh(
    mesh: &IndexedMesh,
    options: &RepairOptions,
) -> RepairResult<(IndexedMesh, RepairReport)> {
    validate_indices(mesh)?;

    let mut report = RepairReport::default();
    let mut current = mesh.clone();

    if options.stitch {
        let result = stitch_vertices(&current, options.stitch_tolerance);
        report.vertices_merged = result.merged;
        report.operations.push(format!(
            "stitched {} vertices within {:e} ({} -> {} vertices)",
            result.merged,
            options.stitch_tolerance,
            current.vertex_count(),
            result.vertices.len()
        ));
        current = IndexedMesh::from_parts(result.vertices, result.faces);
    }

    if options.remove_duplicates {
        let (faces, removed) = remove_duplicate_faces(&current.faces);
        report.duplicate_faces_removed = removed;
        report
            .operations
            .push(format!("removed {removed} duplicate faces"));
        current.faces = faces;
    }

    if options.remove_degenerate {
        let (faces, removed) =
            remove_degenerate_faces(&current, options.degenerate_area_threshold);
        report.degenerate_faces_removed = removed;
        report.operations.push(format!(
            "removed {} degenerate faces (area <= {:e})",
            removed, options.degenerate_area_threshold
        ));
        current.faces = faces;
    }

    if options.fix_nonmanifold_edges {
        let fix = fix_non_manifold_edges(&current);
        report.nonmanifold_faces_removed = fix.removed_faces.len();
        report.nonmanifold_edges_flagged = fix.flagged_edges.len();
        report.operations.push(format!(
            "removed {} faces from {} non-manifold edges",
            fix.removed_faces.len(),
            fix.flagged_edges.len()
        ));
        current.faces = fix.faces;
    }

    if options.fix_nonmanifold_vertices {
        let fix = fix_non_manifold_vertices(&current);
        report.vertices_split = fix.splits.len();
        let distinct: HashSet<u32> = fix.splits.iter().map(|s| s.original).collect();
        report.operations.push(format!(
            "split {} non-manifold vertices ({} duplicates added)",
            distinct.len(),
            fix.splits.len()
        ));
        current = IndexedMesh::from_parts(fix.vertices, fix.faces);
    }

    if options.fill_holes {
        let loops = find_boundary_loops(&current);
        let mut filled = 0_usize;
        let mut added = 0_usize;

        for boundary in &loops {
            let len = boundary.len();
            if len > options.max_fillable_loop_length {
                warn!(
                    len,
                    limit = options.max_fillable_loop_length,
                    "hole exceeds fillable loop length; leaving open"
                );
                report.unfilled_holes.push(len);
                continue;
            }
            let (new_vertices, patch) = if len <= options.min_area_loop_limit {
                (Vec::new(), fill_hole(&current, boundary))
            } else {
                fill_hole_refined(&current, boundary)
            };
            // A collinear rim run (or a centroid on a rim edge) puts a
            // zero-area triangle in the patch; the degenerate filter would
            // strip it on the next run and reopen the hole.
            if patch_min_area(&current, &new_vertices, &patch)
                <= options.degenerate_area_threshold
            {
                warn!(len, "patch contains a degenerate face; leaving hole open");
                report.unfilled_holes.push(len);
                continue;
            }
            added += patch.len();
            current.vertices.extend(new_vertices);
            current.faces.extend(patch);
            filled += 1;
        }

        report.holes_filled = filled;
        report.fill_faces_added = added;
        report.operations.push(if report.unfilled_holes.is_empty() {
            format!("filled {filled} holes with {added} triangles")
        } else {
            format!(
                "filled {filled} holes with {added} triangles ({} left open)",
                report.unfilled_holes.len()
            )
        });
    }

    if options.remove_unreferenced {
        let (vertices, faces, removed) =
            remove_unreferenced_vertices(&current.vertices, &current.faces);
        report.unreferenced_vertices_removed = removed;
        report
            .operations
            .push(format!("removed {removed} unreferenced vertices"));
        current = IndexedMesh::from_parts(vertices, faces);
    }

    info!(
        vertices = current.vertex_count(),
        faces = current.face_count(),
        changed = report.had_changes(),
        "mesh repair complete"
    );

    Ok((current, report))
}

/// Smallest triangle area in a candidate patch. Indices at or past the
/// mesh's vertex count resolve into `pending`, the vertices the patch
/// would append.
fn patch_min_area(mesh: &IndexedMesh, pending: &[Vertex], patch: &[[u32; 3]]) -> f64 {
    let position = |index: u32| {
        let index = index as usize;
        match mesh.vertices.get(index) {
            Some(vertex) => vertex.position,
            None => pending[index - mesh.vertices.len()].position,
        }
    };
    patch
        .iter()
        .map(|&[a, b, c]| Triangle::new(position(a), position(b), position(c)).area())
        .fold(f64::INFINITY, f64::min)
}

/// Check that every face references an existing vertex.
fn validate_indices(mesh: &IndexedMesh) -> RepairResult<()> {
    let vertex_count = mesh.vertices.len();
    for (face_idx, face) in mesh.faces.iter().enumerate() {
        for &index in face {
            if index as usize >= vertex_count {
                return Err(RepairError::IndexOutOfBounds {
                    face: face_idx,
                    index,
                    vertex_count,
                });
            }
        }
    }
    Ok(())
}
