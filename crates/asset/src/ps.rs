//! Parser for the "ps" text model format (pumpkin spice exporter).
//!
//! A file is a fixed sequence of line-oriented sections, each opened by a
//! sentinel line: `vertices:`, `faces:`, `normals:`, `textureCoordinates:`,
//! `bones:` (per-vertex joint weights) and `skeleton:` (bone hierarchy with
//! bind transforms, ended by a blank line). Parents always precede their
//! children in the skeleton section.

use std::fs;
use std::path::Path;

use anyhow::Context;
use corelib::{Mat4, vec2, vec3};
use thiserror::Error;

use crate::model::{Bone, Model, TexCoord};
use crate::texture::TextureHandle;

/// Fatal parse failures. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum PsError {
    #[error("not a ps model file: expected 'vertices:' header, found '{found}'")]
    Format { found: String },
    #[error("missing '{sentinel}' section header")]
    MissingSection { sentinel: &'static str },
    #[error("line {line}: invalid number '{token}'")]
    Number { line: usize, token: String },
    #[error("line {line}: missing {what}")]
    MissingField { line: usize, what: &'static str },
    #[error("line {line}: {detail}")]
    Structure { line: usize, detail: String },
    #[error("invalid model: {detail}")]
    Invalid { detail: String },
}

/// Load a ps model from a file path.
pub fn load_ps_from_path(
    path: impl AsRef<Path>,
    texture: Option<TextureHandle>,
) -> anyhow::Result<Model> {
    let path = path.as_ref();
    log::info!("Loading ps model from {}", path.display());
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ps file: {}", path.display()))?;
    let model = parse_ps(&text, texture)
        .with_context(|| format!("Failed to parse ps file: {}", path.display()))?;
    Ok(model)
}

/// Convenience alias for parsing an in-memory string.
pub fn load_ps_from_str(text: &str, texture: Option<TextureHandle>) -> Result<Model, PsError> {
    parse_ps(text, texture)
}

/// Parse ps model text into a [`Model`].
///
/// `texture` is the externally loaded skin for this model, if any; the
/// format itself never names one.
pub fn parse_ps(text: &str, texture: Option<TextureHandle>) -> Result<Model, PsError> {
    let lines: Vec<&str> = text.lines().collect();

    let header = lines.first().map(|l| l.trim()).unwrap_or("");
    if header != "vertices:" {
        return Err(PsError::Format {
            found: header.to_string(),
        });
    }

    let mut model = Model {
        texture,
        ..Model::default()
    };
    let mut pos = 1;

    // Vertices. Each vertex also seeds empty joint influence slots.
    pos = scan_section(&lines, pos, "faces:", |line, line_no| {
        let [x, y, z] = parse_floats::<3>(line, line_no)?;
        model.verts.push(vec3(x, y, z));
        model.joint_ids.push(Vec::new());
        model.joint_weights.push(Vec::new());
        Ok(())
    })?;

    // Faces: triangle vertex indices.
    pos = scan_section(&lines, pos, "normals:", |line, line_no| {
        let [a, b, c] = parse_ints::<3>(line, line_no)?;
        model.faces.push([a, b, c]);
        Ok(())
    })?;

    // Normals: one per triangle.
    pos = scan_section(&lines, pos, "textureCoordinates:", |line, line_no| {
        let [x, y, z] = parse_floats::<3>(line, line_no)?;
        model.normals.push(vec3(x, y, z));
        Ok(())
    })?;

    // Texture coordinates: `faceId vertexSlot u v`, v flipped for the
    // target texture convention, grouped by face in encounter order.
    pos = scan_section(&lines, pos, "bones:", |line, line_no| {
        let mut fields = line.split_whitespace();
        let face_id = parse_int_field(&mut fields, line_no, "face id")? as usize;
        let vertex_id = parse_int_field(&mut fields, line_no, "vertex id")?;
        let u = parse_float_field(&mut fields, line_no, "u coordinate")?;
        let v = parse_float_field(&mut fields, line_no, "v coordinate")?;
        model
            .texture_coordinates
            .entry(face_id)
            .or_default()
            .push(TexCoord {
                vertex_id,
                uv: vec2(u, 1.0 - v),
            });
        Ok(())
    })?;

    // Joint weights: `boneName vertexId weight`, appended raw. The
    // exporter's weights are kept as-is, not renormalized.
    pos = scan_section(&lines, pos, "skeleton:", |line, line_no| {
        let mut fields = line.split_whitespace();
        let name = fields
            .next()
            .ok_or(PsError::MissingField {
                line: line_no,
                what: "bone name",
            })?;
        let vertex_id = parse_int_field(&mut fields, line_no, "vertex id")? as usize;
        let weight = parse_float_field(&mut fields, line_no, "weight")?;
        if vertex_id >= model.verts.len() {
            return Err(PsError::Structure {
                line: line_no,
                detail: format!(
                    "vertex id {} out of range ({} vertices)",
                    vertex_id,
                    model.verts.len()
                ),
            });
        }
        model.joint_ids[vertex_id].push(name.to_string());
        model.joint_weights[vertex_id].push(weight);
        Ok(())
    })?;

    // Skeleton: `boneName parentName m00..m33` (16 row-major floats).
    // A bone naming itself as parent is a root.
    let mut roots: Vec<Bone> = Vec::new();
    let mut numeric_id = 1u32;
    while pos < lines.len() {
        let line_no = pos + 1;
        let line = lines[pos].trim();
        if line.is_empty() {
            break;
        }
        let mut fields = line.split_whitespace();
        let name = fields.next().ok_or(PsError::MissingField {
            line: line_no,
            what: "bone name",
        })?;
        let parent = fields.next().ok_or(PsError::MissingField {
            line: line_no,
            what: "parent bone name",
        })?;
        let mut values = [0.0f32; 16];
        for value in &mut values {
            *value = parse_float_field(&mut fields, line_no, "bind transform value")?;
        }
        let local_bind_transform = Mat4::from_cols_array(&values).transpose();

        let bone = Bone::new(name.to_string(), numeric_id, local_bind_transform);
        model.joint_id_to_number.insert(bone.name.clone(), numeric_id);
        if name == parent {
            roots.push(bone);
        } else {
            let parent_bone =
                find_bone_mut(&mut roots, parent).ok_or_else(|| PsError::Structure {
                    line: line_no,
                    detail: format!("parent bone '{parent}' not declared before '{name}'"),
                })?;
            parent_bone.children.push(bone);
        }
        numeric_id += 1;
        pos += 1;
    }

    for root in &mut roots {
        root.compute_inverse_bind_transforms(Mat4::IDENTITY);
    }
    model.skeleton = roots.into();

    validate(&model)?;
    log::debug!(
        "Parsed ps model: {} verts, {} faces, {} bones",
        model.verts.len(),
        model.faces.len(),
        model.joint_id_to_number.len()
    );
    Ok(model)
}

/// Run `parse_line` for every line until `sentinel`; returns the position
/// just past the sentinel. Blank lines are skipped. Reaching EOF without
/// the sentinel is fatal, since the next section would silently be empty.
fn scan_section(
    lines: &[&str],
    mut pos: usize,
    sentinel: &'static str,
    mut parse_line: impl FnMut(&str, usize) -> Result<(), PsError>,
) -> Result<usize, PsError> {
    while pos < lines.len() {
        let line = lines[pos].trim();
        pos += 1;
        if line == sentinel {
            return Ok(pos);
        }
        if line.is_empty() {
            continue;
        }
        parse_line(line, pos)?;
    }
    Err(PsError::MissingSection { sentinel })
}

fn parse_floats<const N: usize>(line: &str, line_no: usize) -> Result<[f32; N], PsError> {
    let mut fields = line.split_whitespace();
    let mut out = [0.0f32; N];
    for value in &mut out {
        *value = parse_float_field(&mut fields, line_no, "coordinate")?;
    }
    Ok(out)
}

fn parse_ints<const N: usize>(line: &str, line_no: usize) -> Result<[u32; N], PsError> {
    let mut fields = line.split_whitespace();
    let mut out = [0u32; N];
    for value in &mut out {
        *value = parse_int_field(&mut fields, line_no, "index")?;
    }
    Ok(out)
}

fn parse_float_field<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
    what: &'static str,
) -> Result<f32, PsError> {
    let token = fields.next().ok_or(PsError::MissingField {
        line: line_no,
        what,
    })?;
    token.parse::<f32>().map_err(|_| PsError::Number {
        line: line_no,
        token: token.to_string(),
    })
}

fn parse_int_field<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
    what: &'static str,
) -> Result<u32, PsError> {
    let token = fields.next().ok_or(PsError::MissingField {
        line: line_no,
        what,
    })?;
    token.parse::<u32>().map_err(|_| PsError::Number {
        line: line_no,
        token: token.to_string(),
    })
}

fn find_bone_mut<'a>(bones: &'a mut [Bone], name: &str) -> Option<&'a mut Bone> {
    for bone in bones {
        if bone.name == name {
            return Some(bone);
        }
        if let Some(found) = find_bone_mut(&mut bone.children, name) {
            return Some(found);
        }
    }
    None
}

/// Enforce the model invariants: face indices address real vertices, the
/// normals section carries one entry per face, and every referenced joint
/// was declared in the skeleton section.
fn validate(model: &Model) -> Result<(), PsError> {
    if model.normals.len() < model.faces.len() {
        return Err(PsError::Invalid {
            detail: format!(
                "{} normals for {} faces, expected one per face",
                model.normals.len(),
                model.faces.len()
            ),
        });
    }
    for face in &model.faces {
        for &index in face {
            if index as usize >= model.verts.len() {
                return Err(PsError::Invalid {
                    detail: format!(
                        "face index {} out of range ({} vertices)",
                        index,
                        model.verts.len()
                    ),
                });
            }
        }
    }
    for names in &model.joint_ids {
        for name in names {
            if !model.joint_id_to_number.contains_key(name) {
                return Err(PsError::Invalid {
                    detail: format!("joint '{name}' is not part of the skeleton"),
                });
            }
        }
    }
    Ok(())
}
