//! Per-frame material driver.
//!
//! A [`MaterialScene`] owns every live material instance on the renderer
//! thread. Other threads never touch a bundle directly: they queue closures
//! through a [`MaterialUpdates`] handle, and the scene applies them at the
//! start of the next frame, before any instance is evaluated.
//!
//! # Example
//!
//! ```ignore
//! let mut scene = MaterialScene::new();
//! let river = scene.insert(WaterMaterial::default());
//!
//! // UI thread
//! let updates = scene.updates();
//! updates.update::<WaterMaterial>(river, |water| {
//!     water.set_amplitude(4.0_f32);
//! });
//!
//! // Renderer thread
//! scene.render_frame(&registry.read(), clock.tick(dt), |frame| {
//!     draw(frame.descriptor, frame.uniforms, frame.translucent);
//! });
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::materials::{MaterialBridge, MaterialBundle};
use crate::registry::{MaterialDescriptor, ShaderRegistry};
use crate::time::SimTime;
use crate::value::UniformMap;

/// Handle to a material instance in a [`MaterialScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

/// A boxed mutation applied to one instance's bundle.
type Update = Box<dyn FnOnce(&mut dyn MaterialBundle) + Send>;

struct QueuedUpdate {
    instance: InstanceId,
    apply: Update,
}

/// Cloneable, thread-safe queue of pending bundle mutations.
#[derive(Clone, Default)]
pub struct MaterialUpdates {
    queue: Arc<Mutex<Vec<QueuedUpdate>>>,
}

impl MaterialUpdates {
    /// Queue a mutation of an instance's bundle.
    pub fn push(
        &self,
        instance: InstanceId,
        update: impl FnOnce(&mut dyn MaterialBundle) + Send + 'static,
    ) {
        self.queue.lock().push(QueuedUpdate {
            instance,
            apply: Box::new(update),
        });
    }

    /// Queue a mutation that expects a concrete bundle type.
    ///
    /// Dropped with a warning if the instance holds another type.
    pub fn update<B: MaterialBundle>(
        &self,
        instance: InstanceId,
        update: impl FnOnce(&mut B) + Send + 'static,
    ) {
        self.push(instance, move |bundle| {
            match bundle.as_any_mut().downcast_mut::<B>() {
                Some(bundle) => update(bundle),
                None => log::warn!(
                    "Dropping update for {instance:?}: instance is not a {}",
                    std::any::type_name::<B>()
                ),
            }
        });
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    fn drain(&self) -> Vec<QueuedUpdate> {
        std::mem::take(&mut *self.queue.lock())
    }
}

impl fmt::Debug for MaterialUpdates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialUpdates")
            .field("pending", &self.len())
            .finish()
    }
}

/// One instance as handed to the draw callback.
#[derive(Debug)]
pub struct FrameMaterial<'a> {
    pub instance: InstanceId,
    pub descriptor: &'a MaterialDescriptor,
    pub uniforms: &'a UniformMap,
    pub translucent: bool,
}

/// Counts from one [`MaterialScene::render_frame`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Queued updates applied at the start of the frame.
    pub updates_applied: usize,
    pub drawn: usize,
    /// Instances whose material type is not registered.
    pub skipped: usize,
}

struct Instance {
    bridge: MaterialBridge,
    /// Reused across frames.
    uniforms: UniformMap,
}

/// Renderer-side owner of material instances.
pub struct MaterialScene {
    instances: BTreeMap<InstanceId, Instance>,
    next_id: u64,
    updates: MaterialUpdates,
}

impl Default for MaterialScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialScene {
    pub fn new() -> Self {
        Self {
            instances: BTreeMap::new(),
            next_id: 1,
            updates: MaterialUpdates::default(),
        }
    }

    pub fn insert(&mut self, bundle: impl MaterialBundle) -> InstanceId {
        self.insert_boxed(Box::new(bundle))
    }

    pub fn insert_boxed(&mut self, bundle: Box<dyn MaterialBundle>) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.instances.insert(
            id,
            Instance {
                bridge: MaterialBridge::from_box(bundle),
                uniforms: UniformMap::new(),
            },
        );
        id
    }

    /// Remove an instance. Updates still queued for it are dropped.
    pub fn remove(&mut self, id: InstanceId) -> Option<MaterialBridge> {
        self.instances.remove(&id).map(|instance| instance.bridge)
    }

    pub fn get(&self, id: InstanceId) -> Option<&MaterialBridge> {
        self.instances.get(&id).map(|instance| &instance.bridge)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut MaterialBridge> {
        self.instances.get_mut(&id).map(|instance| &mut instance.bridge)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.instances.keys().copied()
    }

    /// A handle other threads use to queue mutations.
    pub fn updates(&self) -> MaterialUpdates {
        self.updates.clone()
    }

    /// Apply every queued update in submission order.
    pub fn apply_updates(&mut self) -> usize {
        let pending = self.updates.drain();
        let count = pending.len();
        for update in pending {
            match self.instances.get_mut(&update.instance) {
                Some(instance) => (update.apply)(instance.bridge.bundle_mut()),
                None => log::warn!(
                    "Dropping update for removed instance {:?}",
                    update.instance
                ),
            }
        }
        count
    }

    /// Evaluate every instance at `time` and hand it to `visit`.
    ///
    /// Queued updates are applied first. Each instance's type is resolved
    /// before its uniforms are evaluated, both at the same `time`.
    pub fn render_frame(
        &mut self,
        registry: &ShaderRegistry,
        time: SimTime,
        mut visit: impl FnMut(FrameMaterial<'_>),
    ) -> FrameStats {
        let mut stats = FrameStats {
            updates_applied: self.apply_updates(),
            ..FrameStats::default()
        };

        for (id, instance) in &mut self.instances {
            let type_name = instance.bridge.material_type(Some(time));
            let Some(descriptor) = registry.lookup(type_name) else {
                log::warn!("Instance {id:?} uses unregistered material '{type_name}'");
                stats.skipped += 1;
                continue;
            };

            instance
                .bridge
                .evaluate_into(Some(time), &mut instance.uniforms);
            visit(FrameMaterial {
                instance: *id,
                descriptor: &descriptor,
                uniforms: &instance.uniforms,
                translucent: descriptor.is_translucent(&instance.uniforms),
            });
            stats.drawn += 1;
        }

        stats
    }
}

impl fmt::Debug for MaterialScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialScene")
            .field("instances", &self.instances.len())
            .field("updates", &self.updates)
            .finish()
    }
}
