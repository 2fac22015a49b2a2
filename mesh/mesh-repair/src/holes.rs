//! Boundary loop detection and hole filling.
//!
//! A hole shows up as a run of boundary edges: directed edges that no
//! neighboring face traverses in the opposite direction. [`find_boundary_loops`]
//! walks those edges into ordered loops, and the two fillers triangulate a
//! loop either with a minimum-area patch ([`fill_hole`]) or a centroid fan
//! ([`fill_hole_refined`]).
//!
//! # Example
//!
//! ```
//! use mesh_types::IndexedMesh;
//! use mesh_repair::holes::{fill_hole, find_boundary_loops};
//!
//! // A single triangle is bounded by one loop of three vertices.
//! let mesh = IndexedMesh::from_raw(
//!     &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
//!     &[0, 1, 2],
//! );
//! let loops = find_boundary_loops(&mesh);
//! assert_eq!(loops.len(), 1);
//! assert_eq!(loops[0].len(), 3);
//!
//! // Filling it adds the back face and closes the surface.
//! let patch = fill_hole(&mesh, &loops[0]);
//! assert_eq!(patch, vec![[2, 1, 0]]);
//! ```

use hashbrown::{HashMap, HashSet};
use mesh_types::{IndexedMesh, Point3, Triangle, Vector3, Vertex};
use tracing::{debug, warn};

/// An ordered run of boundary vertices bounding one hole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryLoop {
    /// Vertex indices in walk order. A closed loop does not repeat its
    /// starting vertex at the end.
    pub vertices: Vec<u32>,
    /// Whether the walk returned to its starting vertex. Open chains come
    /// from non-manifold boundary configurations the walk could not close.
    pub closed: bool,
}

impl BoundaryLoop {
    /// Number of vertices on the loop.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the loop has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Whether the walk closed back on its starting vertex.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of boundary edges on the loop: `len` when closed, `len - 1`
    /// for an open chain.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        if self.closed {
            self.vertices.len()
        } else {
            self.vertices.len().saturating_sub(1)
        }
    }
}

/// Find the boundary loops of a mesh.
///
/// An edge is a boundary edge when some face traverses it in one direction
/// and no face traverses it in the other. Unpaired directed edges are
/// collected in face-iteration order and chained into loops; at a vertex
/// with several unused outgoing boundary edges the walk takes the first
/// collected one, so results are deterministic for a given mesh.
///
/// Walks that dead-end are kept as open chains with
/// [`BoundaryLoop::is_closed`] `false`; anything shorter than three
/// vertices is discarded. A watertight mesh yields no loops.
#[must_use]
pub fn find_boundary_loops(mesh: &IndexedMesh) -> Vec<BoundaryLoop> {
    // Pairing state per directed edge. An entry is true once a face
    // traversing the opposite direction has claimed it.
    let mut directed: HashMap<(u32, u32), bool> = HashMap::new();

    for face in &mesh.faces {
        let edges = [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])];
        for (a, b) in edges {
            match directed.get(&(b, a)).copied() {
                Some(false) => {
                    directed.insert((b, a), true);
                    directed.insert((a, b), true);
                }
                // A third incidence on an already paired edge belongs to
                // the non-manifold resolver; keep the walk away from it.
                Some(true) => {
                    directed.insert((a, b), true);
                }
                None => {
                    directed.entry((a, b)).or_insert(false);
                }
            }
        }
    }

    // Surviving one-directional edges, in face-iteration order so the walk
    // below does not depend on hash iteration order.
    let mut boundary: Vec<(u32, u32)> = Vec::new();
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    for face in &mesh.faces {
        let edges = [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])];
        for edge in edges {
            if directed.get(&edge) == Some(&false) && seen.insert(edge) {
                boundary.push(edge);
            }
        }
    }

    let mut outgoing: HashMap<u32, Vec<usize>> = HashMap::new();
    for (edge_idx, &(from, _)) in boundary.iter().enumerate() {
        outgoing.entry(from).or_default().push(edge_idx);
    }

    let mut used = vec![false; boundary.len()];
    let mut loops: Vec<BoundaryLoop> = Vec::new();

    for start in 0..boundary.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (first, second) = boundary[start];
        let mut vertices = vec![first, second];
        let mut current = second;
        let mut closed = false;

        loop {
            let next = outgoing
                .get(&current)
                .and_then(|candidates| candidates.iter().copied().find(|&c| !used[c]));
            let Some(edge_idx) = next else {
                break;
            };
            used[edge_idx] = true;
            let (_, to) = boundary[edge_idx];
            if to == first {
                closed = true;
                break;
            }
            vertices.push(to);
            current = to;
        }

        if vertices.len() < 3 {
            debug!(len = vertices.len(), "discarded short boundary chain");
            continue;
        }
        if !closed {
            warn!(
                len = vertices.len(),
                "boundary walk dead-ended; keeping open chain"
            );
        }
        loops.push(BoundaryLoop { vertices, closed });
    }

    if !loops.is_empty() {
        debug!(loops = loops.len(), "found boundary loops");
    }
    loops
}

/// Fill a hole with a minimum-area triangulation of its boundary loop.
///
/// Classic interval dynamic program: `best(i, j)` is the least total
/// triangle area needed to triangulate the span from loop position `i` to
/// `j`, minimizing over the apex `k` between them. Ties keep the smallest
/// `k`. Cubic time and quadratic space in the loop length, which is why
/// [`crate::RepairOptions::min_area_loop_limit`] bounds what gets sent
/// here.
///
/// No new vertices are introduced; a closed loop of `n` vertices yields
/// exactly `n - 2` triangles. Emitted triangles are wound against the walk
/// order of the loop, so every patch edge on the rim pairs with the
/// existing face that produced the boundary edge. Open chains are
/// triangulated the same way; the chord between the chain's endpoints
/// remains a boundary edge.
///
/// Area is the only objective, so a collinear run on the rim draws the
/// patch toward zero-area triangles (they cost nothing). [`crate::repair_mesh`]
/// checks patches against its degenerate threshold before appending them.
///
/// Loops shorter than three vertices yield no triangles.
///
/// # Panics
///
/// Panics if the loop references vertices missing from `mesh`. Loops from
/// [`find_boundary_loops`] on the same mesh are always valid.
#[must_use]
pub fn fill_hole(mesh: &IndexedMesh, boundary: &BoundaryLoop) -> Vec<[u32; 3]> {
    let n = boundary.vertices.len();
    if n < 3 {
        return Vec::new();
    }

    let positions: Vec<Point3<f64>> = boundary
        .vertices
        .iter()
        .map(|&v| mesh.vertices[v as usize].position)
        .collect();

    // Flat n*n tables; only the upper triangle (i < j) is used.
    let idx = |i: usize, j: usize| i * n + j;
    let mut best = vec![0.0_f64; n * n];
    let mut split = vec![0_usize; n * n];

    for span in 2..n {
        for i in 0..n - span {
            let j = i + span;
            let mut best_cost = f64::INFINITY;
            let mut best_k = i + 1;
            for k in i + 1..j {
                let area = Triangle::new(positions[i], positions[k], positions[j]).area();
                let cost = best[idx(i, k)] + best[idx(k, j)] + area;
                if cost < best_cost {
                    best_cost = cost;
                    best_k = k;
                }
            }
            best[idx(i, j)] = best_cost;
            split[idx(i, j)] = best_k;
        }
    }

    let mut triangles = Vec::with_capacity(n - 2);
    emit_span(&boundary.vertices, &split, n, 0, n - 1, &mut triangles);
    triangles
}

/// Emit the triangles for the span `(i, j)` of the dynamic program.
fn emit_span(
    loop_vertices: &[u32],
    split: &[usize],
    n: usize,
    i: usize,
    j: usize,
    out: &mut Vec<[u32; 3]>,
) {
    if j - i < 2 {
        return;
    }
    let k = split[i * n + j];
    // Wound against walk order so rim edges pair with existing faces.
    out.push([loop_vertices[j], loop_vertices[k], loop_vertices[i]]);
    emit_span(loop_vertices, split, n, i, k, out);
    emit_span(loop_vertices, split, n, k, j, out);
}

/// Fill a hole with a fan around the loop centroid.
///
/// A new vertex is placed at the arithmetic mean of the loop's positions
/// and one triangle is emitted per boundary edge, wound against the walk
/// order like [`fill_hole`]. A closed loop of `n` vertices yields `n`
/// triangles, an open chain `n - 1`.
///
/// Returns the vertices to append and the new faces. The new vertex's
/// index starts at `mesh.vertex_count()`, so the faces are only valid once
/// the vertices are appended to that same mesh.
///
/// Used for loops too long for the minimum-area dynamic program.
///
/// # Panics
///
/// Panics if the loop references vertices missing from `mesh`. Loops from
/// [`find_boundary_loops`] on the same mesh are always valid.
#[must_use]
pub fn fill_hole_refined(
    mesh: &IndexedMesh,
    boundary: &BoundaryLoop,
) -> (Vec<Vertex>, Vec<[u32; 3]>) {
    let n = boundary.vertices.len();
    if n < 3 {
        return (Vec::new(), Vec::new());
    }

    let mut sum = Vector3::zeros();
    for &v in &boundary.vertices {
        sum += mesh.vertices[v as usize].position.coords;
    }
    let centroid = Point3::from(sum / n as f64);
    let centroid_idx = mesh.vertices.len() as u32;

    let mut triangles = Vec::with_capacity(boundary.edge_count());
    for e in 0..boundary.edge_count() {
        let from = boundary.vertices[e];
        let to = boundary.vertices[(e + 1) % n];
        triangles.push([centroid_idx, to, from]);
    }

    (vec![Vertex::new(centroid)], triangles)
}
