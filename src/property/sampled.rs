use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use super::{Interpolate, PropertyValue, SampledSource};
use crate::error::PropertyError;
use crate::time::SimTime;

/// Behaviour when sampling outside the keyframe range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extrapolation {
    /// Clamp to the first / last keyframe.
    #[default]
    Hold,
    /// Fail with [`PropertyError::OutOfRange`]; the owning slot then falls
    /// back to its default.
    None,
}

/// Keyframed property with linear interpolation between samples.
///
/// # Example
///
/// ```ignore
/// let speed = SampledProperty::new()
///     .with_sample(SimTime::from_seconds(0.0), 1.0_f32)
///     .with_sample(SimTime::from_seconds(10.0), 4.0);
/// assert_eq!(speed.sample(SimTime::from_seconds(5.0)), Ok(2.5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SampledProperty<T> {
    times: Vec<SimTime>,
    values: Vec<T>,
    extrapolation: Extrapolation,
}

impl<T: Interpolate> Default for SampledProperty<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Interpolate> SampledProperty<T> {
    pub fn new() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
            extrapolation: Extrapolation::Hold,
        }
    }

    pub fn from_samples(samples: impl IntoIterator<Item = (SimTime, T)>) -> Self {
        let mut property = Self::new();
        for (time, value) in samples {
            property.add_sample(time, value);
        }
        property
    }

    #[must_use]
    pub fn with_sample(mut self, time: SimTime, value: T) -> Self {
        self.add_sample(time, value);
        self
    }

    #[must_use]
    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Insert a keyframe, replacing one at the same time.
    ///
    /// Keyframes at a non-finite time are ignored.
    pub fn add_sample(&mut self, time: SimTime, value: T) {
        if !time.is_finite() {
            log::warn!("Ignoring keyframe at non-finite time {}", time.seconds());
            return;
        }
        let index = self.times.partition_point(|t| *t < time);
        if self.times.get(index) == Some(&time) {
            self.values[index] = value;
        } else {
            self.times.insert(index, time);
            self.values.insert(index, value);
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// First and last keyframe times.
    pub fn interval(&self) -> Option<(SimTime, SimTime)> {
        Some((*self.times.first()?, *self.times.last()?))
    }

    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }
}

impl<T: Interpolate> SampledSource<T> for SampledProperty<T> {
    fn sample(&self, time: SimTime) -> Result<T, PropertyError> {
        if !time.is_finite() {
            return Err(PropertyError::InvalidTime(time.seconds()));
        }
        let (start, stop) = self.interval().ok_or(PropertyError::NoSamples)?;
        let last = self.values.len() - 1;

        if time < start || time > stop {
            return match self.extrapolation {
                Extrapolation::Hold if time < start => Ok(self.values[0].clone()),
                Extrapolation::Hold => Ok(self.values[last].clone()),
                Extrapolation::None => Err(PropertyError::OutOfRange {
                    time: time.seconds(),
                    start: start.seconds(),
                    stop: stop.seconds(),
                }),
            };
        }

        // Number of keyframes at or before `time`.
        let index = self.times.partition_point(|t| *t <= time);
        if index > last {
            return Ok(self.values[last].clone());
        }
        let Some(before) = index.checked_sub(1) else {
            return Ok(self.values[0].clone());
        };

        let (t0, t1) = (self.times[before], self.times[index]);
        let span = t1.seconds_since(t0);
        let fraction = if span > 0.0 {
            time.seconds_since(t0) / span
        } else {
            0.0
        };
        Ok(self.values[before].interpolate(&self.values[index], fraction))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn definition_eq(&self, other: &dyn SampledSource<T>) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| other == self)
    }
}

type Callback<T> = dyn Fn(SimTime) -> Result<T, PropertyError> + Send + Sync;

/// Property whose value comes from a closure called at evaluation time.
///
/// Two callback properties are equal only when they share the same closure.
pub struct CallbackProperty<T> {
    callback: Arc<Callback<T>>,
    constant: bool,
}

impl<T: PropertyValue> CallbackProperty<T> {
    /// `is_constant` declares whether the closure ignores its time argument.
    pub fn new<F>(callback: F, is_constant: bool) -> Self
    where
        F: Fn(SimTime) -> Result<T, PropertyError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            constant: is_constant,
        }
    }
}

impl<T> Clone for CallbackProperty<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
            constant: self.constant,
        }
    }
}

impl<T> fmt::Debug for CallbackProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackProperty")
            .field("constant", &self.constant)
            .finish_non_exhaustive()
    }
}

impl<T: PropertyValue> SampledSource<T> for CallbackProperty<T> {
    fn sample(&self, time: SimTime) -> Result<T, PropertyError> {
        (self.callback)(time)
    }

    fn is_constant(&self) -> bool {
        self.constant
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn definition_eq(&self, other: &dyn SampledSource<T>) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| Arc::ptr_eq(&self.callback, &other.callback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> SampledProperty<f32> {
        SampledProperty::new()
            .with_sample(SimTime::from_seconds(10.0), 4.0)
            .with_sample(SimTime::from_seconds(0.0), 1.0)
    }

    #[test]
    fn samples_are_kept_sorted() {
        let p = ramp();
        assert_eq!(
            p.interval(),
            Some((SimTime::from_seconds(0.0), SimTime::from_seconds(10.0)))
        );
        assert_eq!(p.sample(SimTime::from_seconds(0.0)), Ok(1.0));
    }

    #[test]
    fn interpolates_between_keyframes() {
        let p = ramp();
        assert_eq!(p.sample(SimTime::from_seconds(5.0)), Ok(2.5));
        assert_eq!(p.sample(SimTime::from_seconds(10.0)), Ok(4.0));
    }

    #[test]
    fn replaces_sample_at_same_time() {
        let mut p = ramp();
        p.add_sample(SimTime::from_seconds(10.0), 8.0);
        assert_eq!(p.len(), 2);
        assert_eq!(p.sample(SimTime::from_seconds(10.0)), Ok(8.0));
    }

    #[test]
    fn hold_extrapolation_clamps() {
        let p = ramp();
        assert_eq!(p.sample(SimTime::from_seconds(-5.0)), Ok(1.0));
        assert_eq!(p.sample(SimTime::from_seconds(50.0)), Ok(4.0));
    }

    #[test]
    fn no_extrapolation_fails_outside_range() {
        let p = ramp().with_extrapolation(Extrapolation::None);
        assert_eq!(
            p.sample(SimTime::from_seconds(11.0)),
            Err(PropertyError::OutOfRange {
                time: 11.0,
                start: 0.0,
                stop: 10.0
            })
        );
    }

    #[test]
    fn empty_property_has_no_samples() {
        let p = SampledProperty::<f32>::new();
        assert_eq!(p.sample(SimTime::ZERO), Err(PropertyError::NoSamples));
    }

    #[test]
    fn single_sample_holds() {
        let p = SampledProperty::new().with_sample(SimTime::from_seconds(3.0), 9.0_f32);
        assert_eq!(p.sample(SimTime::from_seconds(3.0)), Ok(9.0));
        assert_eq!(p.sample(SimTime::from_seconds(100.0)), Ok(9.0));
    }

    #[test]
    fn non_finite_time_is_rejected() {
        let p = ramp();
        for seconds in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                p.sample(SimTime::from_seconds(seconds)),
                Err(PropertyError::InvalidTime(_))
            ));
        }
    }

    #[test]
    fn non_finite_keyframes_are_ignored() {
        let p = ramp()
            .with_sample(SimTime::from_seconds(f64::NAN), 100.0)
            .with_sample(SimTime::from_seconds(f64::INFINITY), 100.0);
        assert_eq!(p.len(), 2);
        assert_eq!(p.sample(SimTime::from_seconds(5.0)), Ok(2.5));
        assert_eq!(p.sample(SimTime::from_seconds(50.0)), Ok(4.0));
    }

    #[test]
    fn callback_receives_time() {
        let p = CallbackProperty::new(|t: SimTime| Ok(t.seconds() as f32 * 2.0), false);
        assert_eq!(p.sample(SimTime::from_seconds(1.5)), Ok(3.0));
        assert!(!p.is_constant());

        let failing: CallbackProperty<f32> =
            CallbackProperty::new(|_| Err(PropertyError::Callback("offline".into())), true);
        assert!(failing.sample(SimTime::ZERO).is_err());
        assert!(failing.is_constant());
    }
}
