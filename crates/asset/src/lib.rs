//! Asset parsing for the "ps" model format: mesh geometry plus a bind-pose
//! skeleton with inverse bind transforms, ready for batching and skinning.

pub mod model;
pub mod ps;
pub mod texture;

pub use model::{Bone, Model, TexCoord, joint_array};
pub use ps::{PsError, load_ps_from_path, load_ps_from_str, parse_ps};
pub use texture::TextureHandle;
