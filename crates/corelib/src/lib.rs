//! Core types: math re-exports, Transform, Camera, picking geometry.

pub use glam::{Mat4, Vec2, Vec3, Vec4, vec2, vec3, vec4};

pub mod camera;
pub mod geometry;
pub mod transform;
