use crate::geometry::{Z_FAR, Z_NEAR};
use crate::{Mat4, Vec3, vec3, vec4};

/// Vertical field of view shared by every projection here (45 degrees).
pub const FIELD_OF_VIEW: f32 = std::f32::consts::FRAC_PI_4;

/// Camera placed by position plus Euler rotation (radians, XYZ order).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Camera {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }

    /// Combined projection for this camera: perspective, then the camera
    /// translation, then rotations about X, Y and Z in that fixed order.
    ///
    /// The translation negates x and y but keeps +z, matching the clip
    /// conventions the rest of the pipeline was built against.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        perspective(aspect)
            * Mat4::from_translation(vec3(-self.position.x, -self.position.y, self.position.z))
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z)
    }

    /// Aim this camera at `target`, folding the view into `projection`.
    ///
    /// Builds a right-handed basis from `up_hint` (right = up × forward,
    /// true up = forward × right). The hint must not be parallel to the
    /// forward vector.
    pub fn look_at_perspective(&self, target: Vec3, up_hint: Vec3, projection: &Mat4) -> Mat4 {
        let forward = (self.position - target).normalize();
        let right = up_hint.cross(forward).normalize();
        let up = forward.cross(right).normalize();

        let translation = vec3(
            self.position.dot(right),
            self.position.dot(up),
            self.position.dot(forward),
        );
        let look_at = Mat4::from_cols(
            vec4(right.x, up.x, forward.x, 0.0),
            vec4(right.y, up.y, forward.y, 0.0),
            vec4(right.z, up.z, forward.z, 0.0),
            vec4(-translation.x, -translation.y, -translation.z, 1.0),
        );

        *projection
            * look_at
            * Mat4::from_translation(vec3(-self.position.x, -self.position.y, self.position.z))
    }
}

/// Standard perspective matrix (45° fov, GL-style z in [-1, 1]).
#[inline]
pub fn perspective(aspect: f32) -> Mat4 {
    Mat4::perspective_rh_gl(FIELD_OF_VIEW, aspect.max(1e-6), Z_NEAR, Z_FAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_is_finite() {
        let cam = Camera::new(vec3(0.0, 2.0, 8.0), vec3(0.3, 0.0, 0.0));
        let m = cam.projection(16.0 / 9.0).to_cols_array();
        assert!(m.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn identity_camera_projection_is_plain_perspective() {
        let cam = Camera::default();
        let a = cam.projection(1.0).to_cols_array();
        let b = perspective(1.0).to_cols_array();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn look_at_keeps_target_centered() {
        let cam = Camera::new(vec3(0.0, 0.0, 10.0), Vec3::ZERO);
        let m = cam.look_at_perspective(Vec3::ZERO, Vec3::Y, &perspective(1.0));
        // A point on the view axis projects onto the screen center.
        let p = m.project_point3(vec3(0.0, 0.0, 2.0));
        assert!(p.x.abs() < 1e-4, "x = {}", p.x);
        assert!(p.y.abs() < 1e-4, "y = {}", p.y);
    }
}
