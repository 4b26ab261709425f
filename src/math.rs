//! Small geometry helpers shared by topology generation and tearing.

use glam::{Mat3, Quat, Vec3};

/// A plane in normal-distance form, `dot(normal, p) + d == 0`.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    /// Build a plane from a unit normal and a point on the plane.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Signed distance from `p` to the plane, positive on the normal side.
    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }

    /// True if `p` lies strictly on the positive side of the plane.
    #[inline]
    pub fn side(&self, p: Vec3) -> bool {
        self.signed_distance(p) > 0.0
    }
}

/// Build a rotation whose local Z axis points along `forward`, with `up`
/// resolving the roll. The rest orientation of a vertex is the inverse of
/// this frame, so split geometry can be skinned consistently.
///
/// Falls back to an arbitrary orthonormal frame when `up` is (nearly)
/// parallel to `forward` or either input is degenerate.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let f_len = forward.length();
    if f_len < 1e-8 {
        return Quat::IDENTITY;
    }
    let z = forward / f_len;

    let mut x = up.cross(z);
    if x.length_squared() < 1e-12 {
        // up parallel to forward; pick any perpendicular axis.
        x = z.any_orthonormal_vector();
    }
    let x = x.normalize();
    let y = z.cross(x);

    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

/// Area of the triangle `(a, b, c)`.
#[inline]
pub fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (b - a).cross(c - a).length() / 2.0
}

/// Signed volume contribution of triangle `(a, b, c)` relative to the
/// origin (divergence theorem). Summed over a closed mesh this yields the
/// enclosed volume.
#[inline]
pub fn triangle_volume(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    a.cross(b).dot(c) / 6.0
}
