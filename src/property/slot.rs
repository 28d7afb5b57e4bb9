use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::{Property, PropertyValue};
use crate::time::SimTime;

/// Identifies a subscription so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Payload of a definition-changed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyChanged {
    /// Name of the slot whose definition was replaced.
    pub property: &'static str,
}

pub type Listener = Arc<dyn Fn(&PropertyChanged) + Send + Sync>;

/// Subscribers notified when a slot's definition is replaced.
#[derive(Default, Clone)]
pub struct ChangeListeners {
    listeners: Vec<(ListenerId, Listener)>,
}

impl ChangeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId::next();
        self.insert(id, listener);
        id
    }

    /// Subscribe under an existing id; a bundle uses one id for all its slots.
    pub fn insert(&mut self, id: ListenerId, listener: Listener) {
        self.listeners.push((id, listener));
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn raise(&self, event: &PropertyChanged) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for ChangeListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

/// A named material parameter.
///
/// Holds the caller's definition (if any), the hard default used when the
/// slot is unset or its source fails, and the listeners fired on
/// reassignment. Cloning a slot does not carry its listeners; equality
/// compares definitions only.
pub struct PropertySlot<T> {
    name: &'static str,
    default: T,
    definition: Option<Property<T>>,
    listeners: ChangeListeners,
    /// Set after the first failed sample so the warning is logged once per definition.
    fallback_reported: AtomicBool,
}

impl<T: PropertyValue> PropertySlot<T> {
    pub fn new(name: &'static str, default: T) -> Self {
        Self {
            name,
            default,
            definition: None,
            listeners: ChangeListeners::new(),
            fallback_reported: AtomicBool::new(false),
        }
    }

    /// Initial definition, set without notifying.
    #[must_use]
    pub fn with_definition(mut self, definition: Option<Property<T>>) -> Self {
        self.definition = definition;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn definition(&self) -> Option<&Property<T>> {
        self.definition.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.definition.is_some()
    }

    /// Replace the definition.
    ///
    /// Listeners fire synchronously, once, unless the new definition is
    /// value-equal to the current one. Returns whether it changed.
    pub fn set(&mut self, definition: impl Into<Property<T>>) -> bool {
        let definition = definition.into();
        if self.definition.as_ref() == Some(&definition) {
            return false;
        }
        self.definition = Some(definition);
        self.changed();
        true
    }

    /// Return to the unset state (evaluates to the default).
    pub fn clear(&mut self) -> bool {
        if self.definition.take().is_none() {
            return false;
        }
        self.changed();
        true
    }

    fn changed(&mut self) {
        *self.fallback_reported.get_mut() = false;
        self.listeners.raise(&PropertyChanged {
            property: self.name,
        });
    }

    /// Value in effect at `time`.
    ///
    /// Unset slots and failing sources yield the hard default.
    pub fn evaluate(&self, time: SimTime) -> T {
        let Some(definition) = &self.definition else {
            return self.default.clone();
        };
        match definition.evaluate(time) {
            Ok(value) => value,
            Err(err) => {
                if !self.fallback_reported.swap(true, Ordering::Relaxed) {
                    log::warn!(
                        "Property '{}' failed to sample ({err}), using default {:?}",
                        self.name,
                        self.default
                    );
                }
                self.default.clone()
            }
        }
    }

    pub fn is_constant(&self) -> bool {
        self.definition.as_ref().map_or(true, Property::is_constant)
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

impl<T: PropertyValue> Clone for PropertySlot<T> {
    fn clone(&self) -> Self {
        Self::new(self.name, self.default.clone()).with_definition(self.definition.clone())
    }
}

impl<T: PropertyValue> PartialEq for PropertySlot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.definition == other.definition
    }
}

impl<T: PropertyValue> fmt::Debug for PropertySlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySlot")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("definition", &self.definition)
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Type-erased view of a slot, used by bundles to manage all slots at once.
pub trait ObservableSlot {
    fn name(&self) -> &'static str;
    fn is_set(&self) -> bool;
    fn is_constant(&self) -> bool;
    fn listeners_mut(&mut self) -> &mut ChangeListeners;
}

impl<T: PropertyValue> ObservableSlot for PropertySlot<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_set(&self) -> bool {
        self.definition.is_some()
    }

    fn is_constant(&self) -> bool {
        PropertySlot::is_constant(self)
    }

    fn listeners_mut(&mut self) -> &mut ChangeListeners {
        &mut self.listeners
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::error::PropertyError;
    use crate::property::CallbackProperty;

    fn counting_listener() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let listener: Listener = Arc::new(move |_: &PropertyChanged| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (count, listener)
    }

    #[test]
    fn unset_slot_yields_default() {
        let slot = PropertySlot::new("speed", 1.0_f32);
        assert_eq!(slot.evaluate(SimTime::from_seconds(42.0)), 1.0);
        assert!(slot.is_constant());
        assert!(!slot.is_set());
    }

    #[test]
    fn explicit_zero_is_kept() {
        let mut slot = PropertySlot::new("speed", 1.0_f32);
        slot.set(0.0_f32);
        assert_eq!(slot.evaluate(SimTime::ZERO), 0.0);
    }

    #[test]
    fn set_fires_once_per_change() {
        let (count, listener) = counting_listener();
        let mut slot = PropertySlot::new("speed", 1.0_f32);
        slot.subscribe(listener);

        assert!(slot.set(2.0_f32));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(!slot.set(2.0_f32));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        slot.evaluate(SimTime::ZERO);
        slot.evaluate(SimTime::from_seconds(5.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(slot.clear());
        assert!(!slot.clear());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let (count, listener) = counting_listener();
        let mut slot = PropertySlot::new("speed", 1.0_f32);
        let id = slot.subscribe(listener);
        assert!(slot.unsubscribe(id));
        assert!(!slot.unsubscribe(id));
        slot.set(3.0_f32);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failing_source_falls_back_to_default() {
        let mut slot = PropertySlot::new("amplitude", 10.0_f32);
        slot.set(CallbackProperty::<f32>::new(
            |_| Err(PropertyError::Callback("sensor offline".into())),
            false,
        ));
        assert_eq!(slot.evaluate(SimTime::ZERO), 10.0);
        assert_eq!(slot.evaluate(SimTime::from_seconds(1.0)), 10.0);
    }

    #[test]
    fn clone_drops_listeners_and_keeps_definition() {
        let (count, listener) = counting_listener();
        let mut slot = PropertySlot::new("speed", 1.0_f32);
        slot.subscribe(listener);
        slot.set(4.0_f32);

        let mut copy = slot.clone();
        assert_eq!(copy, slot);
        copy.set(5.0_f32);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_ne!(copy, slot);
    }
}
