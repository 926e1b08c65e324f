use tracing::{debug, info, warn};

use crate::config::{HapticConfig, PolicyKind};
use crate::error::{Result, SinkError};

pub use self::policy::{ContinuousPolicy, DiscretePolicy, IntensityPolicy, PassthroughPolicy};

pub mod policy;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PulsePattern {
    /// No vibration; callers issue nothing to the motor.
    Idle,
    /// `on_ms` of vibration then `off_ms` of rest, repeated until cancelled.
    Repeating { on_ms: u32, off_ms: u32 },
    OneShot { duration_ms: u32 },
}

impl PulsePattern {
    pub fn is_idle(&self) -> bool {
        matches!(self, PulsePattern::Idle)
    }

    /// Fraction of time the motor is on.
    pub fn duty_cycle(&self) -> f64 {
        match *self {
            PulsePattern::Idle => 0.0,
            PulsePattern::Repeating { on_ms, off_ms } => {
                let period = on_ms as f64 + off_ms as f64;
                if period > 0.0 { on_ms as f64 / period } else { 0.0 }
            },
            PulsePattern::OneShot { .. } => 1.0,
        }
    }
}

/// Binary vibration motor.
pub trait VibrationSink {
    /// `timings` alternate on and off durations in milliseconds, starting with
    /// on. With `repeat_from` the sequence loops from that index until cancelled.
    fn vibrate_pattern(&mut self, timings: &[u64], repeat_from: Option<usize>) -> std::result::Result<(), SinkError>;

    fn vibrate_once(&mut self, duration_ms: u64) -> std::result::Result<(), SinkError>;

    /// Must succeed when nothing is vibrating.
    fn cancel(&mut self) -> std::result::Result<(), SinkError>;
}

/// Drives a [`VibrationSink`] with one intensity policy.
pub struct HapticIntensityController<S: VibrationSink> {
    sink: S,
    policy: Box<dyn IntensityPolicy + Send>,
    active: Option<PulsePattern>,
}

impl<S: VibrationSink> HapticIntensityController<S> {
    pub fn new(sink: S, config: &HapticConfig) -> Result<Self> {
        Ok(Self::with_policy(sink, policy::from_config(config)?))
    }

    pub fn with_policy(sink: S, policy: Box<dyn IntensityPolicy + Send>) -> Self {
        Self {
            sink,
            policy,
            active: None,
        }
    }

    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn active_pattern(&self) -> Option<PulsePattern> {
        self.active
    }

    pub fn intensity_to_pattern(&self, level: f64) -> PulsePattern {
        self.policy.pattern(level)
    }

    /// Replace whatever is vibrating with the pattern for `level`.
    ///
    /// The sink is always cancelled first, even when idle, so two patterns
    /// never overlap on the motor.
    pub fn set_vibration(&mut self, level: f64) -> Result<PulsePattern> {
        self.stop_vibration()?;

        let pattern = self.intensity_to_pattern(level);
        debug!(level, ?pattern, "vibration pattern");

        let result = match pattern {
            PulsePattern::Idle => return Ok(pattern),
            PulsePattern::Repeating { on_ms, off_ms } => {
                self.sink.vibrate_pattern(&[on_ms as u64, off_ms as u64], Some(0))
            },
            PulsePattern::OneShot { duration_ms } => {
                self.sink.vibrate_once(duration_ms as u64)
            },
        };

        if let Err(e) = result {
            warn!(error = %e, "vibration sink refused pattern");
            return Err(e.into());
        }

        info!(?pattern, duty_cycle = pattern.duty_cycle(), "vibration started");
        self.active = Some(pattern);

        Ok(pattern)
    }

    pub fn stop_vibration(&mut self) -> Result<()> {
        let was_active = self.active.take().is_some();
        self.sink.cancel()?;
        if was_active {
            info!("vibration stopped");
        }
        Ok(())
    }
}

impl<S: VibrationSink> Drop for HapticIntensityController<S> {
    fn drop(&mut self) {
        if self.active.is_some() {
            if let Err(e) = self.stop_vibration() {
                warn!(error = %e, "vibration cancel on drop");
            }
        }
    }
}
