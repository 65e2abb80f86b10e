//! Picking geometry: clip-space projection, screen-to-world rays and
//! ray/triangle intersection (Möller–Trumbore).

use crate::{Mat4, Vec2, Vec3, vec3};

/// Near clip plane shared by the forward projection and unprojection.
pub const Z_NEAR: f32 = 0.1;
/// Far clip plane shared by the forward projection and unprojection.
pub const Z_FAR: f32 = 100.0;
/// Tolerance for parallel-ray rejection and hit-point rounding.
pub const EPSILON: f32 = 1e-7;

/// World-space ray produced by [`unproject`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point along the ray at parameter `t`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Triangle given by its three corners, winding as declared.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// The same triangle with reversed winding.
    #[inline]
    pub fn reversed(&self) -> Self {
        Self::new(self.c, self.b, self.a)
    }
}

/// Snap each component to the nearest multiple of [`EPSILON`].
///
/// Intersection points are rounded this way so they compare stably.
#[inline]
pub fn round_to_epsilon(v: Vec3) -> Vec3 {
    (v / EPSILON).round() * EPSILON
}

/// Apply a homogeneous transform and divide by the resulting `w`.
///
/// Undefined when the transformed `w` is zero; callers must pass
/// non-degenerate matrices.
#[inline]
pub fn project(matrix: &Mat4, point: Vec3) -> Vec3 {
    matrix.project_point3(point)
}

/// Map a clip-space screen coordinate back to a world-space ray.
///
/// Projects `(x, y, Z_NEAR)` and `(x, y, Z_FAR)` through the inverse of
/// `projection`; the ray starts at the near point and points at the far one.
pub fn unproject(projection: &Mat4, screen: Vec2) -> Ray {
    let inverse = projection.inverse();
    let near = project(&inverse, vec3(screen.x, screen.y, Z_NEAR));
    let far = project(&inverse, vec3(screen.x, screen.y, Z_FAR));
    Ray::new(near, far - near)
}

/// Möller–Trumbore ray/triangle intersection.
///
/// Returns the epsilon-rounded hit point, or `None` when the ray is
/// parallel to the triangle plane (a zero direction counts as parallel),
/// the hit lies outside the triangle, or it sits behind the origin.
pub fn intersects(origin: Vec3, direction: Vec3, triangle: &Triangle) -> Option<Vec3> {
    let edge1 = triangle.b - triangle.a;
    let edge2 = triangle.c - triangle.a;

    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None; // parallel
    }
    let inv_det = 1.0 / det;

    let s = origin - triangle.a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    if t > EPSILON {
        Some(round_to_epsilon(origin + direction * t))
    } else {
        None // behind or at the origin
    }
}

/// Like [`intersects`] but accepts triangles facing either way by also
/// testing the reversed winding.
pub fn intersects_double_sided(
    origin: Vec3,
    direction: Vec3,
    triangle: &Triangle,
) -> Option<Vec3> {
    intersects(origin, direction, triangle)
        .or_else(|| intersects(origin, direction, &triangle.reversed()))
}
