use crate::error::SinkError;

pub use self::sine::{generate_samples, SampleBuffer, SineGenerator};
pub use self::tone::{ToneLength, ToneRequest, ToneSynthesizer};

pub mod sine;
pub mod tone;

pub trait ToneGenerator {
    fn output(&self) -> i16;
    fn advance(&mut self);
}

/// Sample format handed to an audio sink when a track is acquired.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl PcmFormat {
    pub fn mono_16(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
            bits_per_sample: 16,
        }
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }
}

/// Frame range a track replays forever once it reaches `end`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct LoopPoints {
    pub start: usize,
    pub end: usize,
}

impl LoopPoints {
    pub fn whole(frames: usize) -> Self {
        Self {
            start: 0,
            end: frames,
        }
    }
}

/// Output device that hands out one playback track per configuration.
pub trait AudioSink {
    type Track: AudioTrack;

    /// Acquire a track able to hold `buffer_bytes` of PCM data in `format`.
    fn configure(&mut self, format: PcmFormat, buffer_bytes: usize) -> Result<Self::Track, SinkError>;
}

pub trait AudioTrack {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError>;

    /// Start playback. With loop points the track repeats that range indefinitely,
    /// otherwise it plays the written data once.
    fn play(&mut self, loop_points: Option<LoopPoints>) -> Result<(), SinkError>;

    fn release(self) -> Result<(), SinkError>;
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, PartialEq, Eq, Debug)]
    pub(crate) enum AudioEvent {
        Configure { track: usize, format: PcmFormat, buffer_bytes: usize },
        Write { track: usize, bytes: usize },
        Play { track: usize, loop_points: Option<LoopPoints> },
        Release { track: usize },
    }

    #[derive(Default)]
    pub(crate) struct Log {
        pub events: Vec<AudioEvent>,
        pub outstanding: usize,
        pub max_outstanding: usize,
        pub written: Vec<u8>,
    }

    /// Records every call. `fail_on` names the first event kind to reject.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingAudioSink {
        pub log: Rc<RefCell<Log>>,
        pub fail_on: Option<&'static str>,
        next_track: usize,
    }

    pub(crate) struct RecordingTrack {
        id: usize,
        log: Rc<RefCell<Log>>,
        fail_on: Option<&'static str>,
    }

    fn check(fail_on: Option<&'static str>, kind: &'static str) -> Result<(), SinkError> {
        if fail_on == Some(kind) {
            Err(SinkError::Rejected(format!("{kind} refused")))
        } else {
            Ok(())
        }
    }

    impl RecordingAudioSink {
        pub(crate) fn failing(kind: &'static str) -> Self {
            Self {
                fail_on: Some(kind),
                ..Self::default()
            }
        }

        pub(crate) fn events(&self) -> Vec<AudioEvent> {
            self.log.borrow().events.clone()
        }
    }

    impl AudioSink for RecordingAudioSink {
        type Track = RecordingTrack;

        fn configure(&mut self, format: PcmFormat, buffer_bytes: usize) -> Result<Self::Track, SinkError> {
            check(self.fail_on, "configure")?;

            let id = self.next_track;
            self.next_track += 1;

            let mut log = self.log.borrow_mut();
            log.events.push(AudioEvent::Configure { track: id, format, buffer_bytes });
            log.outstanding += 1;
            log.max_outstanding = log.max_outstanding.max(log.outstanding);

            Ok(RecordingTrack {
                id,
                log: self.log.clone(),
                fail_on: self.fail_on,
            })
        }
    }

    impl AudioTrack for RecordingTrack {
        fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
            check(self.fail_on, "write")?;
            let mut log = self.log.borrow_mut();
            log.events.push(AudioEvent::Write { track: self.id, bytes: bytes.len() });
            log.written = bytes.to_vec();
            Ok(())
        }

        fn play(&mut self, loop_points: Option<LoopPoints>) -> Result<(), SinkError> {
            check(self.fail_on, "play")?;
            self.log.borrow_mut().events.push(AudioEvent::Play { track: self.id, loop_points });
            Ok(())
        }

        fn release(self) -> Result<(), SinkError> {
            let mut log = self.log.borrow_mut();
            log.events.push(AudioEvent::Release { track: self.id });
            log.outstanding -= 1;
            check(self.fail_on, "release")
        }
    }
}
