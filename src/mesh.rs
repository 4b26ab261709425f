//! Input triangle mesh.

use glam::Vec3;

use crate::error::{BuildError, Result};

/// An immutable source triangle mesh, read once at blueprint build time.
///
/// Vertices may be duplicated along UV or normal seams, as exported by
/// content tools; half-edge generation welds exact-position duplicates into
/// single topological vertices.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangle index list, three indices per triangle.
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    /// Number of triangles described by the index list.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Fail fast on structurally invalid input: an empty vertex list, an
    /// index list that is not triangles, or an out-of-range index.
    pub fn validate(&self) -> Result<()> {
        if self.positions.is_empty() {
            return Err(BuildError::EmptyMesh);
        }
        if self.indices.len() % 3 != 0 {
            return Err(BuildError::IndexCountNotTriangular(self.indices.len()));
        }
        for (t, tri) in self.indices.chunks_exact(3).enumerate() {
            for &i in tri {
                if i as usize >= self.positions.len() {
                    return Err(BuildError::InvalidVertexIndex {
                        triangle: t,
                        vertex: i as usize,
                    });
                }
            }
        }
        Ok(())
    }

    /// Axis-aligned grid of `(nx+1) * (ny+1)` vertices in the XY plane,
    /// quads split into alternating diagonals. Handy for tests and demos.
    pub fn grid(nx: usize, ny: usize, spacing: f32) -> Self {
        let mut positions = Vec::with_capacity((nx + 1) * (ny + 1));
        for y in 0..=ny {
            for x in 0..=nx {
                positions.push(Vec3::new(x as f32 * spacing, y as f32 * spacing, 0.0));
            }
        }

        let stride = (nx + 1) as u32;
        let mut indices = Vec::with_capacity(nx * ny * 6);
        for y in 0..ny as u32 {
            for x in 0..nx as u32 {
                let v00 = y * stride + x;
                let v10 = v00 + 1;
                let v01 = v00 + stride;
                let v11 = v01 + 1;
                if (x + y) % 2 == 0 {
                    indices.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
                } else {
                    indices.extend_from_slice(&[v00, v10, v01, v10, v11, v01]);
                }
            }
        }

        Self { positions, indices }
    }
}
