//! Error types for mesh repair operations.

use thiserror::Error;

/// Result type for repair operations.
pub type RepairResult<T> = Result<T, RepairError>;

/// Errors that can occur during mesh repair.
#[derive(Debug, Error)]
pub enum RepairError {
    /// A face references a vertex index outside the vertex array.
    ///
    /// Checked once before the pipeline runs; every stage assumes valid
    /// indices.
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfBounds {
        /// Position of the offending face in the face array.
        face: usize,
        /// The out-of-range vertex index.
        index: u32,
        /// Number of vertices actually present.
        vertex_count: usize,
    },
}
