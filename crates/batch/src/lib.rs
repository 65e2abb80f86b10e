//! Batches parsed models into one GPU-ready interleaved vertex buffer.
//!
//! Models are registered up front; each registration records a
//! [`DrawRange`] (offset + vertex count + shading group) while the buffer
//! itself is only materialized by [`BufferFactory::build`], since the
//! backend uploads it exactly once.

use std::collections::HashMap;

use asset::{Model, TextureHandle};
use thiserror::Error;

pub mod layout;

pub use layout::{BufferLayout, DrawRange, InterleavedBuffer, PackedVertex, ShadingGroup};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("a model named '{0}' is already registered")]
    DuplicateName(String),
}

/// Accumulates models and packs them into a single interleaved buffer.
///
/// Pure accumulator: `add_model` only records bookkeeping, `build` walks
/// the stored models. Chaining consumes the factory, so a single instance
/// is never shared across threads mid-registration.
#[derive(Debug, Default)]
pub struct BufferFactory {
    layout: BufferLayout,
    models: Vec<Model>,
    ranges: HashMap<String, DrawRange>,
    cursor: usize,
    default_skin: Option<TextureHandle>,
}

impl BufferFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: BufferLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Skin used by the backend for ranges without their own texture.
    pub fn with_default_skin(mut self, skin: TextureHandle) -> Self {
        self.default_skin = Some(skin);
        self
    }

    /// Register a model under a unique name.
    ///
    /// Records the draw range at the current cursor and advances it by
    /// `faces.len() * 3`; the buffer is not touched until [`build`].
    ///
    /// [`build`]: BufferFactory::build
    pub fn add_model(
        mut self,
        name: impl Into<String>,
        model: Model,
        shading_group: ShadingGroup,
    ) -> Result<Self, BatchError> {
        let name = name.into();
        if self.ranges.contains_key(&name) {
            return Err(BatchError::DuplicateName(name));
        }

        let vertex_count = model.expanded_vertex_count();
        let range = DrawRange {
            offset: self.cursor,
            vertex_count,
            shading_group,
            texture: model.texture.clone(),
            skeleton: model.skeleton.clone(),
        };
        log::debug!(
            "Registered model '{}': offset {}, {} vertices",
            name,
            range.offset,
            range.vertex_count
        );
        self.ranges.insert(name, range);
        self.cursor += vertex_count;
        self.models.push(model);
        Ok(self)
    }

    pub fn range(&self, name: &str) -> Option<&DrawRange> {
        self.ranges.get(name)
    }

    /// All registered ranges, keyed by model name.
    pub fn ranges(&self) -> &HashMap<String, DrawRange> {
        &self.ranges
    }

    pub fn default_skin(&self) -> Option<&TextureHandle> {
        self.default_skin.as_ref()
    }

    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    /// Materialize the interleaved buffer.
    ///
    /// Per model in registration order, per face, per corner: position,
    /// normal, uv, joint ids, joint weights. Triangle order is preserved
    /// exactly as declared and vertices are duplicated per face instance,
    /// never deduplicated. Faces without texture coordinates pack (0, 0)
    /// and log a warning.
    pub fn build(&self) -> InterleavedBuffer {
        let mut data = Vec::with_capacity(self.cursor * self.layout.stride_floats());
        for model in &self.models {
            for (face_index, face) in model.faces.iter().enumerate() {
                // One normal per triangle, addressed the way the exporter
                // authored it.
                let normal = model.normals[face_index / 3];
                for (corner, &vert_index) in face.iter().enumerate() {
                    let vert = vert_index as usize;
                    let position = model.verts[vert];
                    data.extend_from_slice(&[position.x, position.y, position.z]);
                    data.extend_from_slice(&[normal.x, normal.y, normal.z]);

                    let coord = model
                        .texture_coordinates
                        .get(&face_index)
                        .and_then(|coords| coords.get(corner));
                    match coord {
                        Some(tex) => data.extend_from_slice(&[tex.uv.x, tex.uv.y]),
                        None => {
                            log::warn!(
                                "model has no UVs for face {face_index}; packing (0, 0)"
                            );
                            data.extend_from_slice(&[0.0, 0.0]);
                        }
                    }

                    self.pack_joints(&mut data, model, vert);
                }
            }
        }
        InterleavedBuffer::new(data, self.layout)
    }

    /// Append the joint id and weight slots for one vertex, zero-padded to
    /// the layout widths. A vertex with no influences gets weight 1 on
    /// joint 0.
    fn pack_joints(&self, data: &mut Vec<f32>, model: &Model, vert: usize) {
        let id_slots = self.layout.values_per_joint_id;
        let start = data.len();
        data.resize(start + id_slots, 0.0);
        for (slot, name) in model.joint_ids[vert].iter().take(id_slots).enumerate() {
            // The parser guarantees every referenced joint is registered.
            let numeric = model.joint_id_to_number.get(name).copied().unwrap_or(0);
            data[start + slot] = numeric as f32;
        }

        let weight_slots = self.layout.values_per_joint_weight;
        let start = data.len();
        data.resize(start + weight_slots, 0.0);
        let weights = &model.joint_weights[vert];
        if weights.is_empty() {
            data[start] = 1.0;
        } else {
            for (slot, &weight) in weights.iter().take(weight_slots).enumerate() {
                data[start + slot] = weight;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::parse_ps;
    use corelib::vec3;

    const TRIANGLE_PS: &str = "\
vertices:
0 0 0
1 0 0
0 1 0
faces:
0 1 2
normals:
0 0 1
textureCoordinates:
0 0 0.25 1.0
0 1 0.5 1.0
0 2 0.75 1.0
bones:
root 0 0.6
root 1 0.4
skeleton:
root root 1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1
";

    const NO_UV_PS: &str = "\
vertices:
0 0 0
1 0 0
0 1 0
faces:
0 1 2
normals:
0 0 1
textureCoordinates:
bones:
skeleton:
";

    fn triangle_model() -> Model {
        parse_ps(TRIANGLE_PS, None).expect("fixture parses")
    }

    #[test]
    fn interleaves_basic_attributes() {
        let factory = BufferFactory::new()
            .add_model("test", triangle_model(), ShadingGroup::Main)
            .expect("unique name");
        let buffer = factory.build();
        let floats = buffer.as_floats();

        assert_eq!(&floats[0..3], &[0.0, 0.0, 0.0]); // vertex 0 position
        assert_eq!(&floats[3..6], &[0.0, 0.0, 1.0]); // face normal
        assert_eq!(&floats[6..8], &[0.25, 0.0]); // uv, v already flipped
        // Second corner starts one stride in.
        assert_eq!(&floats[14..17], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn ranges_stack_models_back_to_back() {
        let factory = BufferFactory::new()
            .add_model("first", triangle_model(), ShadingGroup::Main)
            .and_then(|f| f.add_model("second", triangle_model(), ShadingGroup::Animated))
            .expect("unique names");

        let first = factory.range("first").expect("registered");
        let second = factory.range("second").expect("registered");
        assert_eq!((first.offset, first.vertex_count), (0, 3));
        assert_eq!((second.offset, second.vertex_count), (3, 3));
        assert_eq!(second.shading_group, ShadingGroup::Animated);

        let buffer = factory.build();
        assert_eq!(buffer.as_floats().len(), 6 * 14);
        assert_eq!(buffer.vertex_count(), 6);
    }

    #[test]
    fn rejects_duplicate_model_names() {
        let result = BufferFactory::new()
            .add_model("dup", triangle_model(), ShadingGroup::Main)
            .and_then(|f| f.add_model("dup", triangle_model(), ShadingGroup::Main));
        assert!(matches!(result, Err(BatchError::DuplicateName(name)) if name == "dup"));
    }

    #[test]
    fn packs_declared_joint_influences() {
        let factory = BufferFactory::new()
            .add_model("test", triangle_model(), ShadingGroup::Animated)
            .expect("unique name");
        let floats = factory.build().into_floats();
        let layout = BufferLayout::standard();

        // Vertex 0 has one influence: joint "root" (numeric id 1), weight 0.6.
        assert_eq!(&floats[layout.joint_id_offset()..layout.joint_id_offset() + 3], &[
            1.0, 0.0, 0.0
        ]);
        assert_eq!(
            &floats[layout.joint_weight_offset()..layout.joint_weight_offset() + 3],
            &[0.6, 0.0, 0.0]
        );
    }

    #[test]
    fn vertex_without_influences_defaults_to_weight_one() {
        let model = parse_ps(NO_UV_PS, None).expect("fixture parses");
        let factory = BufferFactory::new()
            .add_model("bare", model, ShadingGroup::Main)
            .expect("unique name");
        let floats = factory.build().into_floats();
        let layout = BufferLayout::standard();

        assert_eq!(&floats[layout.joint_id_offset()..layout.joint_id_offset() + 3], &[
            0.0, 0.0, 0.0
        ]);
        assert_eq!(
            &floats[layout.joint_weight_offset()..layout.joint_weight_offset() + 3],
            &[1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn missing_uvs_pack_zeros() {
        let model = parse_ps(NO_UV_PS, None).expect("fixture parses");
        let factory = BufferFactory::new()
            .add_model("bare", model, ShadingGroup::Main)
            .expect("unique name");
        let floats = factory.build().into_floats();
        let layout = BufferLayout::standard();

        let uv = &floats[layout.texture_coordinate_offset()..layout.texture_coordinate_offset() + 2];
        assert_eq!(uv, &[0.0, 0.0]);
    }

    #[test]
    fn range_shares_the_model_skeleton() {
        let factory = BufferFactory::new()
            .add_model("test", triangle_model(), ShadingGroup::Animated)
            .expect("unique name");
        let range = factory.range("test").expect("registered");
        assert_eq!(range.skeleton.len(), 1);
        assert_eq!(range.skeleton[0].name, "root");
        assert!(range.texture.is_none());
    }

    #[test]
    fn default_skin_rides_on_the_factory() {
        let factory = BufferFactory::new().with_default_skin(TextureHandle::new("default.png"));
        assert_eq!(
            factory.default_skin().map(TextureHandle::name),
            Some("default.png")
        );
    }

    #[test]
    fn positions_survive_packing_unchanged() {
        let model = triangle_model();
        let expected = model.verts.clone();
        let factory = BufferFactory::new()
            .add_model("test", model, ShadingGroup::Main)
            .expect("unique name");
        let floats = factory.build().into_floats();
        for (corner, vert) in expected.iter().enumerate() {
            let base = corner * 14;
            assert_eq!(vec3(floats[base], floats[base + 1], floats[base + 2]), *vert);
        }
    }
}
