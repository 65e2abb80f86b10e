use crate::{Mat4, Vec3};

/// Model matrix from a location plus Euler rotation: translate first, then
/// rotate about world X, Y and Z in that fixed order.
#[inline]
pub fn matrix_from_location_rotation(location: Vec3, rotation: Vec3) -> Mat4 {
    Mat4::from_translation(location)
        * Mat4::from_rotation_x(rotation.x)
        * Mat4::from_rotation_y(rotation.y)
        * Mat4::from_rotation_z(rotation.z)
}

/// Placement of an object in the world (Euler angles in radians, XYZ order).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub location: Vec3,
    pub rotation: Vec3,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation: Vec3::ZERO,
        }
    }

    #[inline]
    pub fn new(location: Vec3, rotation: Vec3) -> Self {
        Self { location, rotation }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        matrix_from_location_rotation(self.location, self.rotation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
