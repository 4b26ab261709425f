//! Build-time error types.
//!
//! Only blueprint construction can fail. Runtime tear rejection (pool
//! exhaustion, topologically impossible splits) is reported as a no-op
//! result, never as an error.

use thiserror::Error;

/// Result type alias using [`BuildError`].
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors raised while validating the input mesh and building a blueprint.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The input mesh has no vertices.
    #[error("input mesh has no vertices")]
    EmptyMesh,

    /// The triangle index list length is not a multiple of three.
    #[error("triangle index count {0} is not a multiple of 3")]
    IndexCountNotTriangular(usize),

    /// A triangle references a vertex index outside the vertex list.
    #[error("triangle {triangle} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The triangle index.
        triangle: usize,
        /// The out-of-range vertex index.
        vertex: usize,
    },

    /// Every input triangle collided with an already-registered edge and was
    /// dropped, leaving no topology to build constraints over.
    #[error("all {0} input triangles were degenerate or duplicate")]
    NoUsableTriangles(usize),
}
