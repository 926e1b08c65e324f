use pulsetone_core::haptic::VibrationSink;
use pulsetone_core::SinkError;
use tracing::info;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MotorState {
    Off,
    Pattern { timings: Vec<u64>, repeat_from: Option<usize> },
    Once { duration_ms: u64 },
}

/// Stand-in for a vibration motor on hosts without one: every command is
/// logged and the last one is remembered.
#[derive(Debug)]
pub struct LogVibrator {
    state: MotorState,
    commands: usize,
}

impl LogVibrator {
    pub fn new() -> Self {
        Self {
            state: MotorState::Off,
            commands: 0,
        }
    }

    pub fn state(&self) -> &MotorState {
        &self.state
    }

    pub fn commands(&self) -> usize {
        self.commands
    }
}

impl Default for LogVibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl VibrationSink for LogVibrator {
    fn vibrate_pattern(&mut self, timings: &[u64], repeat_from: Option<usize>) -> Result<(), SinkError> {
        if let Some(index) = repeat_from {
            if index >= timings.len() {
                return Err(SinkError::Rejected(format!("repeat index {index} outside {} timings", timings.len())));
            }
        }

        info!(?timings, ?repeat_from, "motor: pattern");
        self.state = MotorState::Pattern { timings: timings.to_vec(), repeat_from };
        self.commands += 1;
        Ok(())
    }

    fn vibrate_once(&mut self, duration_ms: u64) -> Result<(), SinkError> {
        info!(duration_ms, "motor: once");
        self.state = MotorState::Once { duration_ms };
        self.commands += 1;
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), SinkError> {
        if self.state != MotorState::Off {
            info!("motor: cancel");
            self.state = MotorState::Off;
        }
        self.commands += 1;
        Ok(())
    }
}
