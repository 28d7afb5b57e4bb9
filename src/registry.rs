//! Shader variant registry.
//!
//! Maps a material type name to the GPU program and default uniforms the
//! engine uses to draw it. The table is written during start-up and read
//! for every frame afterwards.
//!
//! Registration is idempotent per type name: the first registration wins
//! and later ones are skipped without compiling their program.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::{MaterialError, MaterialResult};
use crate::shader::{self, ProgramInterface};
use crate::value::{UniformMap, UniformValue};

/// Per-instance translucency test.
pub type TranslucencyPredicate = fn(&UniformMap) -> bool;

/// How the engine decides whether an instance draws in the translucent pass.
#[derive(Clone, Copy, Default)]
pub enum Translucency {
    /// Always (or never) translucent.
    Fixed(bool),
    /// Translucent when any colour uniform has alpha below 1.
    #[default]
    EngineDefault,
    /// Decided per instance from its evaluated uniforms.
    Predicate(TranslucencyPredicate),
}

impl Translucency {
    pub fn is_translucent(&self, uniforms: &UniformMap) -> bool {
        match self {
            Translucency::Fixed(translucent) => *translucent,
            Translucency::EngineDefault => uniforms.iter().any(|(_, value)| match value {
                UniformValue::Color(color) => !color.is_opaque(),
                _ => false,
            }),
            Translucency::Predicate(predicate) => predicate(uniforms),
        }
    }
}

impl fmt::Debug for Translucency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Translucency::Fixed(translucent) => f.debug_tuple("Fixed").field(translucent).finish(),
            Translucency::EngineDefault => f.write_str("EngineDefault"),
            Translucency::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Everything the engine needs to draw one material type.
#[derive(Debug, Clone)]
pub struct MaterialDescriptor {
    type_name: Cow<'static, str>,
    program_source: Cow<'static, str>,
    default_uniforms: UniformMap,
    translucency: Translucency,
    /// Filled from the program when registered.
    interface: ProgramInterface,
}

impl MaterialDescriptor {
    pub fn new(
        type_name: impl Into<Cow<'static, str>>,
        program_source: impl Into<Cow<'static, str>>,
        default_uniforms: UniformMap,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            program_source: program_source.into(),
            default_uniforms,
            translucency: Translucency::EngineDefault,
            interface: ProgramInterface::default(),
        }
    }

    #[must_use]
    pub fn with_translucency(mut self, translucency: Translucency) -> Self {
        self.translucency = translucency;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// WGSL source of the program.
    pub fn program_source(&self) -> &str {
        &self.program_source
    }

    pub fn default_uniforms(&self) -> &UniformMap {
        &self.default_uniforms
    }

    pub fn translucency(&self) -> Translucency {
        self.translucency
    }

    /// Reflected material bind group; empty until registered.
    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    pub fn is_translucent(&self, uniforms: &UniformMap) -> bool {
        self.translucency.is_translucent(uniforms)
    }

    /// Pack evaluated uniforms into the program's uniform block layout.
    pub fn pack_uniforms(&self, uniforms: &UniformMap, out: &mut Vec<u8>) {
        self.interface.pack_uniforms(uniforms, out);
    }

    /// Compile the program and check it against the default uniforms.
    fn validate(&mut self) -> MaterialResult<()> {
        let interface = shader::reflect_program(&self.type_name, &self.program_source)?;

        for (name, expected) in interface.declarations() {
            let Some(default) = self.default_uniforms.get(name) else {
                return Err(MaterialError::MissingDefault {
                    type_name: self.type_name.to_string(),
                    uniform: name.to_string(),
                });
            };
            if default.kind() != expected {
                return Err(MaterialError::KindMismatch {
                    type_name: self.type_name.to_string(),
                    uniform: name.to_string(),
                    expected,
                    found: default.kind(),
                });
            }
        }

        if let Some(unknown) = self
            .default_uniforms
            .keys()
            .find(|name| interface.kind_of(name).is_none())
        {
            return Err(MaterialError::UnknownDefault {
                type_name: self.type_name.to_string(),
                uniform: unknown.to_string(),
            });
        }

        self.interface = interface;
        Ok(())
    }
}

/// Outcome of [`ShaderRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Inserted,
    /// The type name was taken; the new descriptor was dropped unchecked.
    AlreadyRegistered,
}

/// Type name -> material descriptor table.
#[derive(Debug, Default)]
pub struct ShaderRegistry {
    materials: BTreeMap<String, Arc<MaterialDescriptor>>,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material type. The first registration of a name wins.
    pub fn register(&mut self, mut descriptor: MaterialDescriptor) -> MaterialResult<Registration> {
        if self.materials.contains_key(descriptor.type_name()) {
            log::debug!(
                "Material '{}' already registered, skipping",
                descriptor.type_name()
            );
            return Ok(Registration::AlreadyRegistered);
        }

        descriptor.validate()?;
        log::debug!(
            "Registered material '{}' ({} uniforms, {} byte block)",
            descriptor.type_name(),
            descriptor.interface.len(),
            descriptor.interface.block_size
        );
        self.materials
            .insert(descriptor.type_name().to_string(), Arc::new(descriptor));
        Ok(Registration::Inserted)
    }

    pub fn lookup(&self, type_name: &str) -> Option<Arc<MaterialDescriptor>> {
        self.materials.get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.materials.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Registered type names in sorted order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }
}

static REGISTRY: OnceLock<RwLock<ShaderRegistry>> = OnceLock::new();

/// The process-wide registry used by [`init`].
pub fn global_registry() -> &'static RwLock<ShaderRegistry> {
    REGISTRY.get_or_init(|| RwLock::new(ShaderRegistry::new()))
}

/// Register the built-in materials in the global registry.
///
/// Runs once per process; later calls return the first outcome. Call it
/// before rendering the first frame.
pub fn init() -> MaterialResult<()> {
    static INIT: OnceLock<MaterialResult<()>> = OnceLock::new();

    INIT.get_or_init(|| {
        let mut registry = global_registry().write();
        crate::materials::register_builtin_materials(&mut registry)
            .map_err(|e| MaterialError::InitializationFailed(Box::new(e)))?;
        log::info!(
            "Material registry initialized with {} types",
            registry.len()
        );
        Ok(())
    })
    .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::block_floats;
    use crate::value::{Color, UniformKind};

    const PROGRAM: &str = r#"
struct Params {
    tint: vec4<f32>,
    speed: f32,
}
@group(1) @binding(0) var<uniform> params: Params;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return params.tint * params.speed;
}
"#;

    fn defaults() -> UniformMap {
        UniformMap::new()
            .with("tint", Color::WHITE)
            .with("speed", 1.0_f32)
    }

    #[test]
    fn first_registration_wins() {
        let mut registry = ShaderRegistry::new();
        let first = MaterialDescriptor::new("Glow", PROGRAM, defaults());
        let second = MaterialDescriptor::new("Glow", "not even wgsl", UniformMap::new())
            .with_translucency(Translucency::Fixed(true));

        assert_eq!(registry.register(first), Ok(Registration::Inserted));
        assert_eq!(registry.register(second), Ok(Registration::AlreadyRegistered));

        let glow = registry.lookup("Glow").unwrap();
        assert_eq!(glow.program_source(), PROGRAM);
        assert_eq!(glow.default_uniforms(), &defaults());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_default_is_rejected() {
        let mut registry = ShaderRegistry::new();
        let descriptor =
            MaterialDescriptor::new("Glow", PROGRAM, UniformMap::new().with("tint", Color::WHITE));
        assert_eq!(
            registry.register(descriptor),
            Err(MaterialError::MissingDefault {
                type_name: "Glow".into(),
                uniform: "speed".into()
            })
        );
        assert!(!registry.contains("Glow"));
    }

    #[test]
    fn mismatched_kind_is_rejected() {
        let mut registry = ShaderRegistry::new();
        let descriptor = MaterialDescriptor::new(
            "Glow",
            PROGRAM,
            defaults().with("speed", Color::WHITE),
        );
        assert_eq!(
            registry.register(descriptor),
            Err(MaterialError::KindMismatch {
                type_name: "Glow".into(),
                uniform: "speed".into(),
                expected: UniformKind::Float,
                found: UniformKind::Vec4,
            })
        );
    }

    #[test]
    fn undeclared_default_is_rejected() {
        let mut registry = ShaderRegistry::new();
        let descriptor = MaterialDescriptor::new("Glow", PROGRAM, defaults().with("extra", 2.0_f32));
        assert!(matches!(
            registry.register(descriptor),
            Err(MaterialError::UnknownDefault { .. })
        ));
    }

    #[test]
    fn translucency_rules() {
        let opaque = defaults();
        let faded = defaults().with("tint", Color::WHITE.with_alpha(0.5));

        assert!(!Translucency::EngineDefault.is_translucent(&opaque));
        assert!(Translucency::EngineDefault.is_translucent(&faded));
        assert!(Translucency::Fixed(true).is_translucent(&opaque));

        let fast: TranslucencyPredicate = |u| u.get_float("speed").unwrap_or(0.0) > 2.0;
        let predicate = Translucency::Predicate(fast);
        assert!(!predicate.is_translucent(&opaque));
        assert!(predicate.is_translucent(&defaults().with("speed", 3.0_f32)));
    }

    #[test]
    fn registered_descriptor_carries_interface() {
        let mut registry = ShaderRegistry::new();
        registry
            .register(MaterialDescriptor::new("Glow", PROGRAM, defaults()))
            .unwrap();
        let glow = registry.lookup("Glow").unwrap();
        assert_eq!(glow.interface().kind_of("speed"), Some(UniformKind::Float));

        let mut block = Vec::new();
        glow.pack_uniforms(&defaults().with("speed", 2.0_f32), &mut block);
        let floats = block_floats(&block);
        assert_eq!(&floats[..5], &[1.0, 1.0, 1.0, 1.0, 2.0]);
    }
}
