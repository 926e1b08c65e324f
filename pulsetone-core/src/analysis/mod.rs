use crate::synth::SampleBuffer;

use self::goertzel::GoertzelBin;

pub mod goertzel;

/// Level of `frequency_hz` in `buffer`, in dB relative to a full-scale sine.
///
/// The whole buffer is one Goertzel block, so the resolution is
/// `sample_rate / len` Hz. An empty buffer has no level.
pub fn tone_level_db(buffer: &SampleBuffer, frequency_hz: f64) -> f64 {
    if buffer.sample_rate() == 0 {
        return f64::NEG_INFINITY;
    }

    GoertzelBin::new(frequency_hz, buffer.sample_rate())
        .level_db(buffer.samples().map(|sample| sample as f64 / i16::MAX as f64))
}
