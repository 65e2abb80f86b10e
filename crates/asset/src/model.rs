//! Parsed model data: mesh arrays, per-vertex joint influences and the
//! bind-pose skeleton.

use std::collections::HashMap;
use std::sync::Arc;

use corelib::{Mat4, Vec2, Vec3};

use crate::texture::TextureHandle;

/// One texture-coordinate assignment within a face, in encounter order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexCoord {
    pub vertex_id: u32,
    pub uv: Vec2,
}

/// A skeleton node. Built once by the parser; immutable afterwards.
#[derive(Clone, Debug)]
pub struct Bone {
    pub name: String,
    /// 1-based order of appearance in the skeleton section; gives the
    /// stable sort key for the flattened joint array.
    pub numeric_id: u32,
    pub local_bind_transform: Mat4,
    /// Maps model space back into this bone's local space at bind time.
    /// Computed from the accumulated parent bind transforms, not stored
    /// in the file.
    pub inverse_bind_transform: Mat4,
    pub children: Vec<Bone>,
}

impl Bone {
    pub(crate) fn new(name: String, numeric_id: u32, local_bind_transform: Mat4) -> Self {
        Self {
            name,
            numeric_id,
            local_bind_transform,
            inverse_bind_transform: Mat4::IDENTITY,
            children: Vec::new(),
        }
    }

    /// Accumulate bind transforms down the hierarchy and store each
    /// bone's inverse.
    pub(crate) fn compute_inverse_bind_transforms(&mut self, parent_bind: Mat4) {
        let bind = parent_bind * self.local_bind_transform;
        self.inverse_bind_transform = bind.inverse();
        for child in &mut self.children {
            child.compute_inverse_bind_transforms(bind);
        }
    }
}

/// Flatten a skeleton forest into parse order (by `numeric_id`), the order
/// the skinning palette is uploaded in.
pub fn joint_array(skeleton: &[Bone]) -> Vec<&Bone> {
    fn collect<'a>(bones: &'a [Bone], out: &mut Vec<&'a Bone>) {
        for bone in bones {
            out.push(bone);
            collect(&bone.children, out);
        }
    }
    let mut out = Vec::new();
    collect(skeleton, &mut out);
    out.sort_by_key(|bone| bone.numeric_id);
    out
}

/// The parsed result of one ps model file.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub verts: Vec<Vec3>,
    /// Triangles only; indices into `verts`.
    pub faces: Vec<[u32; 3]>,
    /// One normal per triangle (flat shading), not per vertex.
    pub normals: Vec<Vec3>,
    /// Face index -> texture coordinates in encounter order. Faces with no
    /// entry have no UVs and are packed as (0, 0).
    pub texture_coordinates: HashMap<usize, Vec<TexCoord>>,
    /// Per-vertex bone names, parallel to `joint_weights`.
    pub joint_ids: Vec<Vec<String>>,
    /// Raw per-influence weights exactly as exported.
    pub joint_weights: Vec<Vec<f32>>,
    /// Bone name -> dense numeric id assigned during skeleton parsing.
    pub joint_id_to_number: HashMap<String, u32>,
    /// Skeleton roots, shared read-only with draw ranges after batching.
    pub skeleton: Arc<[Bone]>,
    /// None means "use the batch's default skin".
    pub texture: Option<TextureHandle>,
}

impl Model {
    /// Total vertex count after flat triangle expansion.
    pub fn expanded_vertex_count(&self) -> usize {
        self.faces.len() * 3
    }
}
