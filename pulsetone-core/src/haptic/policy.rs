use tracing::debug;

use crate::config::{HapticConfig, PolicyKind};
use crate::error::{Error, Result};

use super::PulsePattern;

/// Maps a requested strength onto an on/off pulse pattern.
pub trait IntensityPolicy {
    fn kind(&self) -> PolicyKind;
    fn pattern(&self, level: f64) -> PulsePattern;
}

pub fn from_config(config: &HapticConfig) -> Result<Box<dyn IntensityPolicy + Send>> {
    let policy: Box<dyn IntensityPolicy + Send> = match config.policy {
        PolicyKind::Continuous  => Box::new(ContinuousPolicy::new(config.steps, config.period_ms)?),
        PolicyKind::Discrete    => Box::new(DiscretePolicy::new(config.period_ms)?),
        PolicyKind::Passthrough => Box::new(PassthroughPolicy::new()),
    };
    debug!(policy = ?config.policy, steps = config.steps, period_ms = config.period_ms, "intensity policy");
    Ok(policy)
}

fn validate_period(period_ms: u32) -> Result<()> {
    if period_ms == 0 {
        Err(Error::invalid("vibration period must be positive"))
    } else {
        Ok(())
    }
}

/// NaN counts as no intensity.
fn clamp(level: f64, max: f64) -> f64 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, max)
    }
}

fn repeating(on_ms: u32, off_ms: u32) -> PulsePattern {
    if on_ms == 0 {
        PulsePattern::Idle
    } else {
        PulsePattern::Repeating { on_ms, off_ms }
    }
}

///////////////////////////////////////////////////////////////////////

/// Duty cycle over a fixed period, with `steps` precomputed levels for
/// inputs in `[0, 1]`.
pub struct ContinuousPolicy {
    modes: Vec<(u32, u32)>,
    period_ms: u32,
}

impl ContinuousPolicy {
    pub fn new(steps: usize, period_ms: u32) -> Result<Self> {
        validate_period(period_ms)?;
        if steps == 0 || steps > period_ms as usize {
            return Err(Error::invalid(format!("intensity steps must be in 1..={period_ms}, got {steps}")));
        }

        let modes = (0..steps)
            .map(|mode| {
                let on_ms = ((mode as u64 + 1) * period_ms as u64 / steps as u64) as u32;
                (on_ms, period_ms - on_ms)
            })
            .collect();

        Ok(Self {
            modes,
            period_ms,
        })
    }

    pub fn steps(&self) -> usize {
        self.modes.len()
    }
}

impl IntensityPolicy for ContinuousPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Continuous
    }

    fn pattern(&self, level: f64) -> PulsePattern {
        let level = clamp(level, 1.0);
        if level <= 0.0 {
            return PulsePattern::Idle;
        }
        if level >= 1.0 {
            return PulsePattern::Repeating { on_ms: self.period_ms, off_ms: 0 };
        }

        // Truncates: level 0.5 of 1000 steps is mode 499, a 500/500 split.
        let mode = ((self.modes.len() - 1) as f64 * level) as usize;
        let (on_ms, off_ms) = self.modes[mode];
        repeating(on_ms, off_ms)
    }
}

///////////////////////////////////////////////////////////////////////

const DISCRETE_LEVELS: usize = 11;

/// Eleven duty-cycle levels for integer inputs in `[0, 10]`.
pub struct DiscretePolicy {
    modes: [(u32, u32); DISCRETE_LEVELS],
}

impl DiscretePolicy {
    pub const LEVELS: usize = DISCRETE_LEVELS;

    pub fn new(period_ms: u32) -> Result<Self> {
        validate_period(period_ms)?;

        let mut modes = [(0, period_ms); Self::LEVELS];
        for (level, mode) in modes.iter_mut().enumerate() {
            let on_ms = (level as u64 * period_ms as u64 / (Self::LEVELS as u64 - 1)) as u32;
            *mode = (on_ms, period_ms - on_ms);
        }

        Ok(Self {
            modes,
        })
    }
}

impl IntensityPolicy for DiscretePolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Discrete
    }

    fn pattern(&self, level: f64) -> PulsePattern {
        let level = clamp(level.round(), (Self::LEVELS - 1) as f64) as usize;
        let (on_ms, off_ms) = self.modes[level];
        repeating(on_ms, off_ms)
    }
}

///////////////////////////////////////////////////////////////////////

/// The level is a raw duration in milliseconds. Negative asks for an
/// unbroken train of short pulses until cancelled.
pub struct PassthroughPolicy;

impl PassthroughPolicy {
    pub const PULSE_MS: u32 = 100;

    pub fn new() -> Self {
        Self
    }
}

impl Default for PassthroughPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl IntensityPolicy for PassthroughPolicy {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Passthrough
    }

    fn pattern(&self, level: f64) -> PulsePattern {
        if level.is_nan() {
            return PulsePattern::Idle;
        }
        if level < 0.0 {
            return PulsePattern::Repeating { on_ms: Self::PULSE_MS, off_ms: 0 };
        }

        match level.round().min(u32::MAX as f64) as u32 {
            0 => PulsePattern::Idle,
            duration_ms => PulsePattern::OneShot { duration_ms },
        }
    }
}
