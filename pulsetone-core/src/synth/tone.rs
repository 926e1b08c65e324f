use tracing::{debug, info, warn};

use crate::config::ToneConfig;
use crate::error::{Error, Result, SinkError};

use super::sine::{generate_samples, SampleBuffer};
use super::{AudioSink, AudioTrack, LoopPoints, PcmFormat};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ToneLength {
    Bounded { duration_ms: u32 },
    /// Loop a half-second unit until stopped.
    Indefinite,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ToneRequest {
    frequency_hz: f64,
    length: ToneLength,
}

impl ToneRequest {
    pub fn new(frequency_hz: f64, duration_ms: Option<u32>) -> Result<Self> {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(Error::invalid(format!("frequency must be positive, got {frequency_hz}")));
        }

        let length = match duration_ms {
            Some(0) => return Err(Error::invalid("duration must be positive, got 0 ms")),
            Some(duration_ms) => ToneLength::Bounded { duration_ms },
            None => ToneLength::Indefinite,
        };

        Ok(Self {
            frequency_hz,
            length,
        })
    }

    pub fn bounded(frequency_hz: f64, duration_ms: u32) -> Result<Self> {
        Self::new(frequency_hz, Some(duration_ms))
    }

    pub fn indefinite(frequency_hz: f64) -> Result<Self> {
        Self::new(frequency_hz, None)
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn length(&self) -> ToneLength {
        self.length
    }

    pub fn sample_count(&self, sample_rate: u32) -> usize {
        match self.length {
            ToneLength::Bounded { duration_ms } => (duration_ms as u64 * sample_rate as u64 / 1000) as usize,
            ToneLength::Indefinite => (sample_rate / 2) as usize,
        }
    }
}

struct ActiveTone<T> {
    track: T,
    request: ToneRequest,
}

/// Plays at most one tone at a time on an [`AudioSink`].
///
/// Every new tone releases the previous track before the sink is asked for
/// another one, so the sink never holds two tracks for one synthesizer.
pub struct ToneSynthesizer<S: AudioSink> {
    sink: S,
    sample_rate: u32,
    max_duration_ms: u32,
    active: Option<ActiveTone<S::Track>>,
}

impl<S: AudioSink> ToneSynthesizer<S> {
    pub fn new(sink: S, config: &ToneConfig) -> Result<Self> {
        if config.sample_rate == 0 || config.sample_rate > ToneConfig::MAX_SAMPLE_RATE {
            return Err(Error::invalid(format!(
                "sample rate must be in 1..={} Hz, got {}",
                ToneConfig::MAX_SAMPLE_RATE,
                config.sample_rate
            )));
        }
        if config.max_duration_ms == 0 {
            return Err(Error::invalid("maximum tone duration must be positive"));
        }

        Ok(Self {
            sink,
            sample_rate: config.sample_rate,
            max_duration_ms: config.max_duration_ms,
            active: None,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_request(&self) -> Option<&ToneRequest> {
        self.active.as_ref().map(|active| &active.request)
    }

    pub fn play_tone(&mut self, frequency_hz: f64, duration_ms: Option<u32>) -> Result<()> {
        let request = ToneRequest::new(frequency_hz, duration_ms)?;
        self.play(request)
    }

    pub fn max_duration_ms(&self) -> u32 {
        self.max_duration_ms
    }

    /// Rejected requests leave the active tone untouched.
    pub fn play(&mut self, request: ToneRequest) -> Result<()> {
        if let ToneLength::Bounded { duration_ms } = request.length() {
            if duration_ms > self.max_duration_ms {
                return Err(Error::invalid(format!(
                    "duration {duration_ms} ms exceeds the {} ms limit",
                    self.max_duration_ms
                )));
            }
        }

        self.stop_tone()?;

        let sample_count = request.sample_count(self.sample_rate);
        let buffer = generate_samples(request.frequency_hz(), self.sample_rate, sample_count);

        let format = PcmFormat::mono_16(self.sample_rate);
        let mut track = self.sink.configure(format, buffer.byte_len()).map_err(|e| {
            warn!(error = %e, "audio sink refused configuration");
            e
        })?;

        if let Err(e) = start(&mut track, &buffer, request.length()) {
            warn!(error = %e, "audio track failed to start");
            if let Err(release_error) = track.release() {
                warn!(error = %release_error, "audio track release after failed start");
            }
            return Err(e.into());
        }

        info!(frequency_hz = request.frequency_hz(), length = ?request.length(), samples = sample_count, "tone started");
        self.active = Some(ActiveTone { track, request });

        Ok(())
    }

    pub fn stop_tone(&mut self) -> Result<()> {
        if let Some(active) = self.active.take() {
            debug!(frequency_hz = active.request.frequency_hz(), "releasing tone");
            active.track.release()?;
            info!("tone stopped");
        }
        Ok(())
    }
}

impl<S: AudioSink> Drop for ToneSynthesizer<S> {
    fn drop(&mut self) {
        if let Err(e) = self.stop_tone() {
            warn!(error = %e, "tone release on drop");
        }
    }
}

fn start<T: AudioTrack>(track: &mut T, buffer: &SampleBuffer, length: ToneLength) -> std::result::Result<(), SinkError> {
    track.write(buffer.as_bytes())?;

    let loop_points = match length {
        ToneLength::Bounded { .. } => None,
        ToneLength::Indefinite => Some(LoopPoints::whole(buffer.len())),
    };
    track.play(loop_points)
}
