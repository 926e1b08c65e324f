use std::f64::consts::TAU;
use std::time::Duration;

use tracing::debug;

use super::ToneGenerator;

const FULL_SCALE: f64 = 32767.0;

/// Full-scale sine, evaluated from the sample index.
pub struct SineGenerator {
    index: u64,
    period_samples: f64,
    output: i16,
}

impl SineGenerator {
    pub fn new(frequency_hz: f64, sample_rate: u32) -> Self {
        debug_assert!(frequency_hz > 0.0, "frequency_hz > 0");
        debug_assert!(sample_rate > 0, "sample_rate > 0");

        // Period never drops under one sample.
        let period_samples = (sample_rate as f64 / frequency_hz).max(1.0);

        Self {
            index: 0,
            period_samples,
            output: 0,
        }
    }

    pub fn period_samples(&self) -> f64 {
        self.period_samples
    }
}

impl ToneGenerator for SineGenerator {
    fn output(&self) -> i16 {
        self.output
    }

    fn advance(&mut self) {
        let phase = TAU * self.index as f64 / self.period_samples;
        self.output = (phase.sin() * FULL_SCALE).round() as i16;
        self.index += 1;
    }
}

/// Mono signed 16-bit PCM, little-endian.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SampleBuffer {
    bytes: Vec<u8>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn from_samples<I: IntoIterator<Item = i16>>(samples: I, sample_rate: u32) -> Self {
        let samples = samples.into_iter();
        let mut bytes = Vec::with_capacity(samples.size_hint().0 * 2);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }

        Self {
            bytes,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples, not bytes.
    pub fn len(&self) -> usize {
        self.bytes.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn sample(&self, index: usize) -> Option<i16> {
        let start = index.checked_mul(2)?;
        let pair = self.bytes.get(start..start.checked_add(2)?)?;
        Some(i16::from_le_bytes([pair[0], pair[1]]))
    }

    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.bytes.chunks_exact(2).map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.len() as f64 / self.sample_rate as f64)
    }
}

/// Render `sample_count` samples of a full-scale sine at `frequency_hz`.
pub fn generate_samples(frequency_hz: f64, sample_rate: u32, sample_count: usize) -> SampleBuffer {
    let mut generator = SineGenerator::new(frequency_hz, sample_rate);
    debug!(frequency_hz, sample_rate, sample_count, period = generator.period_samples(), "generate samples");

    let samples = (0..sample_count).map(|_| {
        generator.advance();
        generator.output()
    });

    SampleBuffer::from_samples(samples, sample_rate)
}
