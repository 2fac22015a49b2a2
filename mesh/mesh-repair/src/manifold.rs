//! Non-manifold edge and vertex resolution.
//!
//! An edge is non-manifold when more than two faces contain it; a vertex is
//! non-manifold when its incident faces do not form a single connected fan.
//! Edges are resolved by removing the excess faces, vertices by duplicating
//! the shared vertex so each fan gets its own copy. Both passes read a
//! frozen snapshot of the mesh and return new collections.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use mesh_types::{IndexedMesh, Vertex};
use rayon::prelude::*;
use tracing::debug;

use crate::adjacency::{MeshAdjacency, normalize_edge};

/// Result of resolving non-manifold edges.
#[derive(Debug, Clone)]
pub struct EdgeFix {
    /// Faces kept after removing excess incidences, in input order.
    pub faces: Vec<[u32; 3]>,
    /// Positions (in the input face list) of the removed faces, ascending.
    pub removed_faces: Vec<usize>,
    /// Offending edges as normalized `(min, max)` pairs, in the order the
    /// face scan first encountered them.
    pub flagged_edges: Vec<(u32, u32)>,
}

/// Remove faces until no edge has more than two incident faces.
///
/// For each over-shared edge the first two faces in input order are kept
/// and the rest removed. A face kept for one edge can still be removed for
/// another; removal wins. Removing faces only ever lowers incidence counts,
/// so a single pass suffices.
///
/// # Panics
///
/// Panics if a face references a missing vertex; [`crate::repair_mesh`]
/// validates this precondition up front.
#[must_use]
pub fn fix_non_manifold_edges(mesh: &IndexedMesh) -> EdgeFix {
    let adjacency = MeshAdjacency::from_mesh(mesh);

    let mut flagged_edges: Vec<(u32, u32)> = Vec::new();
    let mut flagged_seen: HashSet<(u32, u32)> = HashSet::new();
    let mut removal: HashSet<usize> = HashSet::new();

    // Scan faces in input order so flagged edges and removals do not
    // depend on hash iteration order.
    for face in &mesh.faces {
        let edges = [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])];
        for (a, b) in edges {
            let edge = normalize_edge(a, b);
            let Some(incident) = adjacency.faces_for_edge(a, b) else {
                continue;
            };
            if incident.len() <= 2 || !flagged_seen.insert(edge) {
                continue;
            }
            flagged_edges.push(edge);
            for &excess in &incident[2..] {
                removal.insert(excess);
            }
        }
    }

    let mut removed_faces: Vec<usize> = removal.iter().copied().collect();
    removed_faces.sort_unstable();

    let faces: Vec<[u32; 3]> = mesh
        .faces
        .iter()
        .enumerate()
        .filter_map(|(face_idx, face)| (!removal.contains(&face_idx)).then_some(*face))
        .collect();

    if !flagged_edges.is_empty() {
        debug!(
            edges = flagged_edges.len(),
            faces_removed = removed_faces.len(),
            "resolved non-manifold edges"
        );
    }

    EdgeFix {
        faces,
        removed_faces,
        flagged_edges,
    }
}

/// Record of one vertex duplication performed by
/// [`fix_non_manifold_vertices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexSplit {
    /// The vertex that was shared by multiple fans.
    pub original: u32,
    /// The duplicate created for one extra fan.
    pub duplicate: u32,
    /// Number of faces remapped onto the duplicate.
    pub moved_faces: usize,
}

/// Result of resolving non-manifold vertices.
#[derive(Debug, Clone)]
pub struct VertexFix {
    /// Vertex array with one duplicate appended per extra fan.
    pub vertices: Vec<Vertex>,
    /// Faces remapped so each fan references its own vertex copy.
    pub faces: Vec<[u32; 3]>,
    /// One entry per duplicate created, in ascending original-vertex order.
    pub splits: Vec<VertexSplit>,
}

/// Split vertices whose incident faces form more than one fan.
///
/// Two faces incident to a vertex belong to the same fan when they share an
/// edge containing that vertex. For each extra fan a positionally identical
/// duplicate vertex is appended and the fan's faces are remapped to it; the
/// fan containing the earliest incident face keeps the original index.
///
/// The per-vertex fan analysis reads a frozen snapshot and runs in
/// parallel; the remap is applied sequentially afterwards, so results do
/// not depend on scheduling.
///
/// The duplicates coincide in space. A later stitching pass would merge
/// them back, which is why the pipeline stitches before this stage rather
/// than after.
///
/// # Panics
///
/// Panics if a face references a missing vertex; [`crate::repair_mesh`]
/// validates this precondition up front.
#[must_use]
pub fn fix_non_manifold_vertices(mesh: &IndexedMesh) -> VertexFix {
    let adjacency = MeshAdjacency::from_mesh(mesh);

    let fans: Vec<Vec<Vec<usize>>> = (0..mesh.vertices.len())
        .into_par_iter()
        .map(|vertex| {
            let vertex = vertex as u32;
            fan_components(vertex, adjacency.faces_for_vertex(vertex), &mesh.faces)
        })
        .collect();

    let mut vertices = mesh.vertices.clone();
    let mut faces = mesh.faces.clone();
    let mut splits: Vec<VertexSplit> = Vec::new();

    for (vertex, components) in fans.iter().enumerate() {
        let original = vertex as u32;
        for component in components.iter().skip(1) {
            let duplicate = vertices.len() as u32;
            vertices.push(mesh.vertices[vertex]);
            for &face_idx in component {
                for slot in &mut faces[face_idx] {
                    if *slot == original {
                        *slot = duplicate;
                    }
                }
            }
            splits.push(VertexSplit {
                original,
                duplicate,
                moved_faces: component.len(),
            });
        }
    }

    if !splits.is_empty() {
        debug!(splits = splits.len(), "split non-manifold vertex fans");
    }

    VertexFix {
        vertices,
        faces,
        splits,
    }
}

/// Group the faces incident to `vertex` into connected fans.
///
/// Faces are adjacent when they share an edge containing `vertex`, i.e.
/// when they have a wing vertex in common. Components are returned in
/// order of their earliest face, each sorted by face index.
pub(crate) fn fan_components(
    vertex: u32,
    incident: &[usize],
    faces: &[[u32; 3]],
) -> Vec<Vec<usize>> {
    if incident.len() <= 1 {
        return if incident.is_empty() {
            Vec::new()
        } else {
            vec![incident.to_vec()]
        };
    }

    // Wing vertex -> positions into `incident` of the faces touching it.
    let mut wings: HashMap<u32, Vec<usize>> = HashMap::new();
    for (pos, &face_idx) in incident.iter().enumerate() {
        let face = &faces[face_idx];
        for corner in 0..3 {
            if face[corner] == vertex {
                wings.entry(face[(corner + 1) % 3]).or_default().push(pos);
                wings.entry(face[(corner + 2) % 3]).or_default().push(pos);
            }
        }
    }

    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); incident.len()];
    for positions in wings.values() {
        for (i, &a) in positions.iter().enumerate() {
            for &b in &positions[i + 1..] {
                neighbors[a].push(b);
                neighbors[b].push(a);
            }
        }
    }

    let mut visited = vec![false; incident.len()];
    let mut components: Vec<Vec<usize>> = Vec::new();

    for start in 0..incident.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        let mut component = Vec::new();
        while let Some(pos) = queue.pop_front() {
            component.push(incident[pos]);
            for &next in &neighbors[pos] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }

    components
}
