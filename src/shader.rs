//! Material program reflection.
//!
//! Material programs are WGSL. Registration parses and validates them through
//! naga, then reflects the material bind group so the registry can check that
//! every declared uniform has a default of the right kind.
//!
//! # Bind groups
//!
//! | Group | Contents |
//! |-------|----------|
//! | [`FRAME_GROUP`] (0) | Frame globals supplied by the engine (view-projection, time) |
//! | [`MATERIAL_GROUP`] (1) | One uniform block + textures, filled from the material's evaluated uniforms |
//!
//! Samplers in the material group are engine-owned and not reflected.

use naga::{AddressSpace, Module, Scalar, ScalarKind, TypeInner, VectorSize};

use crate::error::{MaterialError, MaterialResult};
use crate::value::{UniformKind, UniformMap, UniformValue};

/// Bind group holding engine frame globals.
pub const FRAME_GROUP: u32 = 0;

/// Bind group holding a material's own uniforms and textures.
pub const MATERIAL_GROUP: u32 = 1;

/// One member of the material uniform block.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDecl {
    pub name: String,
    pub kind: UniformKind,
    /// Byte offset inside the uniform block.
    pub offset: u32,
}

/// Material-facing interface of a validated program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgramInterface {
    /// Members of the material uniform block.
    pub uniforms: Vec<UniformDecl>,
    /// Size of the uniform block in bytes (0 when the program has none).
    pub block_size: u32,
    /// Texture bindings of the material group.
    pub textures: Vec<String>,
}

impl ProgramInterface {
    /// Kind the program declares for `name`.
    pub fn kind_of(&self, name: &str) -> Option<UniformKind> {
        if self.textures.iter().any(|t| t == name) {
            return Some(UniformKind::Texture);
        }
        self.uniforms.iter().find(|u| u.name == name).map(|u| u.kind)
    }

    /// Every declared name with its kind, block members first.
    pub fn declarations(&self) -> impl Iterator<Item = (&str, UniformKind)> {
        self.uniforms
            .iter()
            .map(|u| (u.name.as_str(), u.kind))
            .chain(self.textures.iter().map(|t| (t.as_str(), UniformKind::Texture)))
    }

    pub fn len(&self) -> usize {
        self.uniforms.len() + self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty() && self.textures.is_empty()
    }

    /// Write the non-texture uniforms into `out` using the block layout.
    ///
    /// `out` is resized to the block size; members missing from `uniforms`
    /// stay zeroed. Reusing `out` across frames avoids reallocation.
    pub fn pack_uniforms(&self, uniforms: &UniformMap, out: &mut Vec<u8>) {
        out.clear();
        out.resize(self.block_size as usize, 0);

        for decl in &self.uniforms {
            let Some(value) = uniforms.get(&decl.name) else {
                continue;
            };
            let start = decl.offset as usize;
            match value {
                UniformValue::Float(v) => write_bytes(out, start, bytemuck::bytes_of(v)),
                UniformValue::Vec2(v) => write_bytes(out, start, bytemuck::bytes_of(v)),
                UniformValue::Vec3(v) => write_bytes(out, start, bytemuck::bytes_of(v)),
                UniformValue::Vec4(v) => write_bytes(out, start, bytemuck::bytes_of(v)),
                UniformValue::Color(c) => write_bytes(out, start, bytemuck::bytes_of(&c.to_array())),
                UniformValue::Texture(_) => {}
            }
        }
    }
}

fn write_bytes(out: &mut [u8], start: usize, bytes: &[u8]) {
    let end = (start + bytes.len()).min(out.len());
    if start < end {
        out[start..end].copy_from_slice(&bytes[..end - start]);
    }
}

/// Parse and validate a WGSL program, then reflect its material bind group.
pub fn reflect_program(type_name: &str, source: &str) -> MaterialResult<ProgramInterface> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| {
        MaterialError::ShaderParseFailed {
            type_name: type_name.to_string(),
            message: e.emit_to_string(source),
        }
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| MaterialError::ShaderValidationFailed {
            type_name: type_name.to_string(),
            message: format!("{e}"),
        })?;

    reflect_material_group(type_name, &module)
}

fn reflect_material_group(type_name: &str, module: &Module) -> MaterialResult<ProgramInterface> {
    let mut interface = ProgramInterface::default();
    let mut has_block = false;
    let unsupported = |what: String| MaterialError::ShaderValidationFailed {
        type_name: type_name.to_string(),
        message: what,
    };

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        if binding.group != MATERIAL_GROUP {
            continue;
        }
        let var_name = var.name.clone().unwrap_or_default();
        let inner = &module.types[var.ty].inner;

        match var.space {
            AddressSpace::Uniform => {
                if has_block {
                    return Err(unsupported(format!(
                        "material group declares a second uniform block '{var_name}'"
                    )));
                }
                has_block = true;

                match inner {
                    TypeInner::Struct { members, span } => {
                        interface.block_size = *span;
                        for member in members {
                            let name = member.name.clone().unwrap_or_default();
                            let kind = kind_of(&module.types[member.ty].inner).ok_or_else(|| {
                                unsupported(format!("uniform '{name}' has an unsupported type"))
                            })?;
                            interface.uniforms.push(UniformDecl {
                                name,
                                kind,
                                offset: member.offset,
                            });
                        }
                    }
                    other => {
                        let kind = kind_of(other).ok_or_else(|| {
                            unsupported(format!("uniform '{var_name}' has an unsupported type"))
                        })?;
                        interface.block_size = kind.byte_size().unwrap_or(0) as u32;
                        interface.uniforms.push(UniformDecl {
                            name: var_name,
                            kind,
                            offset: 0,
                        });
                    }
                }
            }
            AddressSpace::Handle => {
                if let TypeInner::Image { .. } = inner {
                    interface.textures.push(var_name);
                }
            }
            _ => {}
        }
    }

    Ok(interface)
}

fn kind_of(inner: &TypeInner) -> Option<UniformKind> {
    const F32: Scalar = Scalar {
        kind: ScalarKind::Float,
        width: 4,
    };
    match *inner {
        TypeInner::Scalar(scalar) if scalar == F32 => Some(UniformKind::Float),
        TypeInner::Vector { size, scalar } if scalar == F32 => Some(match size {
            VectorSize::Bi => UniformKind::Vec2,
            VectorSize::Tri => UniformKind::Vec3,
            VectorSize::Quad => UniformKind::Vec4,
        }),
        TypeInner::Image { .. } => Some(UniformKind::Texture),
        _ => None,
    }
}

/// Reads a packed uniform block back as floats.
#[cfg(test)]
pub(crate) fn block_floats(block: &[u8]) -> Vec<f32> {
    block
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::value::{Color, TextureId};

    const TEST_PROGRAM: &str = r#"
struct Params {
    tint: vec4<f32>,
    scale: vec2<f32>,
    speed: f32,
}

@group(0) @binding(0) var<uniform> globals: vec4<f32>;
@group(1) @binding(0) var<uniform> params: Params;
@group(1) @binding(1) var albedo: texture_2d<f32>;
@group(1) @binding(2) var albedo_sampler: sampler;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    let texel = textureSample(albedo, albedo_sampler, uv * params.scale);
    return texel * params.tint * params.speed + globals;
}
"#;

    #[test]
    fn reflects_material_group_only() {
        let interface = reflect_program("Test", TEST_PROGRAM).unwrap();

        assert_eq!(
            interface.uniforms,
            vec![
                UniformDecl {
                    name: "tint".into(),
                    kind: UniformKind::Vec4,
                    offset: 0
                },
                UniformDecl {
                    name: "scale".into(),
                    kind: UniformKind::Vec2,
                    offset: 16
                },
                UniformDecl {
                    name: "speed".into(),
                    kind: UniformKind::Float,
                    offset: 24
                },
            ]
        );
        assert_eq!(interface.block_size, 32);
        assert_eq!(interface.textures, vec!["albedo".to_string()]);
        assert_eq!(interface.kind_of("albedo"), Some(UniformKind::Texture));
        assert_eq!(interface.kind_of("globals"), None);
        assert_eq!(interface.len(), 4);
    }

    #[test]
    fn packs_uniform_block() {
        let interface = reflect_program("Test", TEST_PROGRAM).unwrap();
        let uniforms = UniformMap::new()
            .with("tint", Color::new(0.25, 0.5, 0.75, 1.0))
            .with("scale", Vec2::new(2.0, 3.0))
            .with("speed", 4.0_f32)
            .with("albedo", TextureId::Default);

        let mut block = Vec::new();
        interface.pack_uniforms(&uniforms, &mut block);

        let floats = block_floats(&block);
        assert_eq!(floats, [0.25, 0.5, 0.75, 1.0, 2.0, 3.0, 4.0, 0.0]);
    }

    #[test]
    fn rejects_invalid_source() {
        let err = reflect_program("Broken", "fn main( {").unwrap_err();
        assert!(matches!(err, MaterialError::ShaderParseFailed { .. }));
    }

    #[test]
    fn rejects_unsupported_uniform_type() {
        let source = r#"
struct Params {
    count: u32,
}
@group(1) @binding(0) var<uniform> params: Params;
"#;
        let err = reflect_program("Counts", source).unwrap_err();
        assert!(matches!(err, MaterialError::ShaderValidationFailed { .. }));
    }
}
