//! Vertex attribute layout of the packed buffer.
//!
//! The layout travels with the factory and the built buffer instead of
//! living in module-level constants, so independent pipelines never share
//! state. The rendering backend reads the offsets and stride from here
//! when wiring up its vertex attributes.

use std::sync::Arc;

use asset::{Bone, TextureHandle};
use bytemuck::{Pod, Zeroable};

/// Float widths of each attribute, in packing order: position, normal,
/// texture coordinate, joint ids, joint weights.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferLayout {
    pub values_per_vert: usize,
    pub values_per_normal: usize,
    pub values_per_texture_coordinate: usize,
    pub values_per_joint_id: usize,
    pub values_per_joint_weight: usize,
}

impl BufferLayout {
    /// The standard layout: 3 + 3 + 2 + 3 + 3 = 14 floats per vertex.
    pub const fn standard() -> Self {
        Self {
            values_per_vert: 3,
            values_per_normal: 3,
            values_per_texture_coordinate: 2,
            values_per_joint_id: 3,
            values_per_joint_weight: 3,
        }
    }

    /// Floats per vertex.
    pub const fn stride_floats(&self) -> usize {
        self.values_per_vert
            + self.values_per_normal
            + self.values_per_texture_coordinate
            + self.values_per_joint_id
            + self.values_per_joint_weight
    }

    /// Bytes per vertex, the GPU vertex stride.
    pub const fn stride_bytes(&self) -> usize {
        self.stride_floats() * size_of::<f32>()
    }

    pub const fn vert_offset(&self) -> usize {
        0
    }

    pub const fn normal_offset(&self) -> usize {
        self.values_per_vert
    }

    pub const fn texture_coordinate_offset(&self) -> usize {
        self.normal_offset() + self.values_per_normal
    }

    pub const fn joint_id_offset(&self) -> usize {
        self.texture_coordinate_offset() + self.values_per_texture_coordinate
    }

    pub const fn joint_weight_offset(&self) -> usize {
        self.joint_id_offset() + self.values_per_joint_id
    }
}

impl Default for BufferLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Typed view of one vertex in the [standard layout].
///
/// [standard layout]: BufferLayout::standard
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PackedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub joint_ids: [f32; 3],
    pub joint_weights: [f32; 3],
}

/// Which shader/material a draw range is rendered with.
///
/// A closed set plus an escape hatch for app-registered shaders, so
/// dispatch over the built-in groups stays exhaustive.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShadingGroup {
    Main,
    Animated,
    Terrain,
    Custom(String),
}

/// One model's contiguous span of the packed buffer, consumed by the
/// rendering backend as a single draw call. Never mutated once created.
#[derive(Clone, Debug)]
pub struct DrawRange {
    /// First vertex of this model in the packed buffer.
    pub offset: usize,
    pub vertex_count: usize,
    pub shading_group: ShadingGroup,
    /// None means the backend should fall back to the batch default skin.
    pub texture: Option<TextureHandle>,
    /// The source model's skeleton, shared read-only.
    pub skeleton: Arc<[Bone]>,
}

/// The packed interleaved attribute array plus the layout describing it.
#[derive(Clone, Debug)]
pub struct InterleavedBuffer {
    data: Vec<f32>,
    layout: BufferLayout,
}

impl InterleavedBuffer {
    pub(crate) fn new(data: Vec<f32>, layout: BufferLayout) -> Self {
        Self { data, layout }
    }

    pub fn as_floats(&self) -> &[f32] {
        &self.data
    }

    /// Byte view for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Typed vertex view; only the standard layout matches [`PackedVertex`].
    pub fn as_vertices(&self) -> Option<&[PackedVertex]> {
        (self.layout == BufferLayout::standard()).then(|| bytemuck::cast_slice(&self.data))
    }

    pub fn into_floats(self) -> Vec<f32> {
        self.data
    }

    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    pub fn vertex_count(&self) -> usize {
        self.data.len() / self.layout.stride_floats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_is_fourteen_floats() {
        let layout = BufferLayout::standard();
        assert_eq!(layout.stride_floats(), 14);
        assert_eq!(layout.stride_bytes(), 56);
    }

    #[test]
    fn offsets_follow_packing_order() {
        let layout = BufferLayout::standard();
        assert_eq!(layout.vert_offset(), 0);
        assert_eq!(layout.normal_offset(), 3);
        assert_eq!(layout.texture_coordinate_offset(), 6);
        assert_eq!(layout.joint_id_offset(), 8);
        assert_eq!(layout.joint_weight_offset(), 11);
    }

    #[test]
    fn byte_view_matches_float_length() {
        let buffer = InterleavedBuffer::new(vec![0.0; 28], BufferLayout::standard());
        assert_eq!(buffer.as_bytes().len(), 28 * 4);
        assert_eq!(buffer.vertex_count(), 2);
    }

    #[test]
    fn typed_view_splits_on_stride() {
        let mut data = vec![0.0f32; 14];
        data[0] = 1.5; // position.x
        data[11] = 1.0; // joint_weights[0]
        let buffer = InterleavedBuffer::new(data, BufferLayout::standard());

        let vertices = buffer.as_vertices().expect("standard layout");
        assert_eq!(vertices.len(), 1);
        assert_eq!(vertices[0].position[0], 1.5);
        assert_eq!(vertices[0].joint_weights[0], 1.0);
        assert_eq!(size_of::<PackedVertex>(), BufferLayout::standard().stride_bytes());
    }
}
