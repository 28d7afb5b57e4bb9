//! Time-sampled properties.
//!
//! A material parameter is either a plain value or a source sampled at a
//! simulation time:
//!
//! - [`Property`] - Tagged union of [`Property::Constant`] and [`Property::Sampled`]
//! - [`SampledSource`] - Anything that can produce a value for a [`SimTime`]
//! - [`SampledProperty`] - Keyframes with linear interpolation
//! - [`CallbackProperty`] - User closure evaluated per frame
//! - [`PropertySlot`] - Named, observable slot holding a definition and its hard default
//!
//! Evaluation is side-effect free and deterministic for a given
//! (definition, time) pair. A `Sampled` definition may wrap another
//! [`Property`]; evaluation then delegates recursively.

mod interpolate;
mod sampled;
mod slot;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::error::PropertyError;
use crate::time::SimTime;

pub use interpolate::Interpolate;
pub use sampled::{CallbackProperty, Extrapolation, SampledProperty};
pub use slot::{ChangeListeners, Listener, ListenerId, ObservableSlot, PropertyChanged, PropertySlot};

/// Bound for values a property can hold.
pub trait PropertyValue: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl<T> PropertyValue for T where T: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

/// A source that yields a value for a simulation time.
pub trait SampledSource<T>: fmt::Debug + Send + Sync {
    /// Value in effect at `time`.
    fn sample(&self, time: SimTime) -> Result<T, PropertyError>;

    /// Whether `sample` yields the same value for every time.
    fn is_constant(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;

    /// Value equality with another source. Sources that cannot compare their
    /// definitions only equal themselves (pointer identity, checked by
    /// [`Property`]).
    fn definition_eq(&self, other: &dyn SampledSource<T>) -> bool {
        let _ = other;
        false
    }
}

/// A constant value or a time-sampled source.
#[derive(Debug, Clone)]
pub enum Property<T> {
    Constant(T),
    Sampled(Arc<dyn SampledSource<T>>),
}

impl<T: PropertyValue> Property<T> {
    pub fn constant(value: T) -> Self {
        Property::Constant(value)
    }

    pub fn sampled(source: impl SampledSource<T> + 'static) -> Self {
        Property::Sampled(Arc::new(source))
    }

    pub fn evaluate(&self, time: SimTime) -> Result<T, PropertyError> {
        match self {
            Property::Constant(value) => Ok(value.clone()),
            Property::Sampled(source) => source.sample(time),
        }
    }

    pub fn is_constant(&self) -> bool {
        match self {
            Property::Constant(_) => true,
            Property::Sampled(source) => source.is_constant(),
        }
    }

    pub fn as_constant(&self) -> Option<&T> {
        match self {
            Property::Constant(value) => Some(value),
            Property::Sampled(_) => None,
        }
    }
}

impl<T: PropertyValue> PartialEq for Property<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Property::Constant(a), Property::Constant(b)) => a == b,
            (Property::Sampled(a), Property::Sampled(b)) => {
                Arc::ptr_eq(a, b) || a.definition_eq(b.as_ref())
            }
            _ => false,
        }
    }
}

impl<T: PropertyValue> From<T> for Property<T> {
    fn from(value: T) -> Self {
        Property::Constant(value)
    }
}

impl<T: Interpolate> From<SampledProperty<T>> for Property<T> {
    fn from(source: SampledProperty<T>) -> Self {
        Property::sampled(source)
    }
}

impl<T: PropertyValue> From<CallbackProperty<T>> for Property<T> {
    fn from(source: CallbackProperty<T>) -> Self {
        Property::sampled(source)
    }
}

impl<T: PropertyValue> SampledSource<T> for Property<T> {
    fn sample(&self, time: SimTime) -> Result<T, PropertyError> {
        self.evaluate(time)
    }

    fn is_constant(&self) -> bool {
        Property::is_constant(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn definition_eq(&self, other: &dyn SampledSource<T>) -> bool {
        other
            .as_any()
            .downcast_ref::<Property<T>>()
            .is_some_and(|other| other == self)
    }
}

/// Preset files accept either a plain value or a keyframe table:
///
/// ```toml
/// speed = 2.5
/// repeat = { samples = [[0.0, [1.0, 1.0]], [5.0, [4.0, 1.0]]] }
/// ```
impl<'de, T> Deserialize<'de> for Property<T>
where
    T: Interpolate + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Keyframes {
                samples: Vec<(f64, T)>,
                #[serde(default)]
                extrapolation: Extrapolation,
            },
            Constant(T),
        }

        Ok(match Repr::<T>::deserialize(deserializer)? {
            Repr::Keyframes {
                samples,
                extrapolation,
            } => {
                if let Some((seconds, _)) = samples.iter().find(|(t, _)| !t.is_finite()) {
                    return Err(D::Error::custom(format!(
                        "keyframe time must be finite, found {seconds}"
                    )));
                }
                Property::sampled(
                    SampledProperty::from_samples(
                        samples
                            .into_iter()
                            .map(|(seconds, value)| (SimTime::from_seconds(seconds), value)),
                    )
                    .with_extrapolation(extrapolation),
                )
            }
            Repr::Constant(value) => Property::Constant(value),
        })
    }
}
