//! Automatable parameters
//!
//! An `AudioParam` is shared between the control side (preset changes) and
//! the audio thread (filter processing). Changes are scheduled as exponential
//! approaches toward a target value, evaluated against the context clock:
//!
//! `v(t) = target + (v0 - target) * exp(-(t - t0) / time_constant)`

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default time constant for gain changes, in seconds
pub const DEFAULT_TIME_CONSTANT: f64 = 0.2;

#[derive(Debug, Clone, Copy)]
struct TargetEvent {
    target: f32,
    start_time: f64,
    start_value: f32,
    time_constant: f64,
}

#[derive(Debug)]
struct ParamState {
    value: f32,
    event: Option<TargetEvent>,
}

/// A smoothly automatable parameter
#[derive(Debug)]
pub struct AudioParam {
    state: Mutex<ParamState>,
}

impl AudioParam {
    /// Create a parameter holding `value`
    pub fn new(value: f32) -> Self {
        Self {
            state: Mutex::new(ParamState { value, event: None }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ParamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last evaluated value
    pub fn value(&self) -> f32 {
        self.lock().value
    }

    /// Target of the pending automation, if any
    pub fn target(&self) -> Option<f32> {
        self.lock().event.map(|e| e.target)
    }

    /// Jump to `value` immediately, cancelling any pending automation
    pub fn set_value(&self, value: f32) {
        let mut state = self.lock();
        state.value = value;
        state.event = None;
    }

    /// Approach `target` exponentially starting at `start_time`
    ///
    /// Replaces any pending automation. The approach starts from the value
    /// last evaluated, so retargeting mid-ramp does not jump.
    pub fn set_target_at_time(&self, target: f32, start_time: f64, time_constant: f64) {
        let mut state = self.lock();
        let start_value = state.value;
        state.event = Some(TargetEvent {
            target,
            start_time,
            start_value,
            time_constant,
        });
    }

    /// Evaluate the parameter at context time `time` and remember the result
    pub fn value_at(&self, time: f64) -> f32 {
        let mut state = self.lock();
        let Some(event) = state.event else {
            return state.value;
        };
        if time < event.start_time {
            return state.value;
        }

        let value = if event.time_constant <= 0.0 {
            event.target
        } else {
            let elapsed = time - event.start_time;
            let decay = (-elapsed / event.time_constant).exp() as f32;
            event.target + (event.start_value - event.target) * decay
        };

        // Settled: drop the event so later reads are lock-and-return
        if (value - event.target).abs() < 1e-4 {
            state.value = event.target;
            state.event = None;
        } else {
            state.value = value;
        }
        state.value
    }
}

impl Default for AudioParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
