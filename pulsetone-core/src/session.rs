use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::haptic::{HapticIntensityController, PulsePattern, VibrationSink};
use crate::synth::{AudioSink, ToneSynthesizer};

/// A call arriving from the transport, tagged by method name.
///
/// `{"method":"playFrequency","frequency":440,"duration":1000}`
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum MethodCall {
    PlayFrequency {
        frequency: f64,
        #[serde(default)]
        duration: Option<i64>,
    },
    StopSound,
    Vibrate {
        level: f64,
    },
    StopVibrate,
}

impl MethodCall {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// What a dispatched call did, for callers that want more than success.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Outcome {
    Done,
    Vibrating(PulsePattern),
}

/// Everything one client session drives: a synthesizer and, when the device
/// has a motor, a haptic controller. Both are built once, up front.
pub struct Session<A: AudioSink, V: VibrationSink> {
    tone: ToneSynthesizer<A>,
    haptic: Option<HapticIntensityController<V>>,
}

impl<A: AudioSink, V: VibrationSink> Session<A, V> {
    pub fn new(audio: A, vibrator: Option<V>, config: &Config) -> Result<Self> {
        let tone = ToneSynthesizer::new(audio, &config.tone)?;
        let haptic = vibrator
            .map(|sink| HapticIntensityController::new(sink, &config.haptic))
            .transpose()?;

        Ok(Self {
            tone,
            haptic,
        })
    }

    pub fn tone(&self) -> &ToneSynthesizer<A> {
        &self.tone
    }

    pub fn haptic(&self) -> Option<&HapticIntensityController<V>> {
        self.haptic.as_ref()
    }

    pub fn play_frequency(&mut self, frequency_hz: f64, duration_ms: Option<i64>) -> Result<()> {
        let duration_ms = match duration_ms {
            None => None,
            Some(ms) if ms > 0 => Some(u32::try_from(ms).map_err(|_| Error::invalid(format!("duration too long, got {ms} ms")))?),
            Some(ms) => return Err(Error::invalid(format!("duration must be positive, got {ms} ms"))),
        };
        self.tone.play_tone(frequency_hz, duration_ms)
    }

    pub fn stop_sound(&mut self) -> Result<()> {
        self.tone.stop_tone()
    }

    pub fn vibrate(&mut self, level: f64) -> Result<PulsePattern> {
        match self.haptic.as_mut() {
            Some(haptic) => haptic.set_vibration(level),
            None => Err(Error::NotInitialized("session has no vibration sink")),
        }
    }

    /// No-op when nothing has vibrated, or when there is no motor at all.
    pub fn stop_vibrate(&mut self) -> Result<()> {
        match self.haptic.as_mut() {
            Some(haptic) => haptic.stop_vibration(),
            None => Ok(()),
        }
    }

    pub fn dispatch(&mut self, call: MethodCall) -> Result<Outcome> {
        debug!(?call, "dispatch");

        match call {
            MethodCall::PlayFrequency { frequency, duration } => {
                self.play_frequency(frequency, duration)?;
            },
            MethodCall::StopSound => {
                self.stop_sound()?;
            },
            MethodCall::Vibrate { level } => {
                return Ok(Outcome::Vibrating(self.vibrate(level)?));
            },
            MethodCall::StopVibrate => {
                self.stop_vibrate()?;
            },
        }

        Ok(Outcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyKind;
    use crate::haptic::fake::{RecordingVibrationSink, VibrationEvent};
    use crate::synth::fake::{AudioEvent, RecordingAudioSink};
    use crate::synth::LoopPoints;

    type TestSession = Session<RecordingAudioSink, RecordingVibrationSink>;

    fn session() -> (TestSession, RecordingAudioSink, RecordingVibrationSink) {
        let audio = RecordingAudioSink::default();
        let vibrator = RecordingVibrationSink::default();
        let session = Session::new(audio.clone(), Some(vibrator.clone()), &Config::default()).unwrap();
        (session, audio, vibrator)
    }

    #[test]
    fn parse_method_calls() {
        let expected = [
            (r#"{"method":"playFrequency","frequency":440,"duration":1000}"#, MethodCall::PlayFrequency { frequency: 440.0, duration: Some(1000) }),
            (r#"{"method":"playFrequency","frequency":440}"#,                 MethodCall::PlayFrequency { frequency: 440.0, duration: None }),
            (r#"{"method":"playFrequency","frequency":440,"duration":null}"#, MethodCall::PlayFrequency { frequency: 440.0, duration: None }),
            (r#"{"method":"stopSound"}"#,                                     MethodCall::StopSound),
            (r#"{"method":"vibrate","level":0.25}"#,                          MethodCall::Vibrate { level: 0.25 }),
            (r#"{"method":"stopVibrate"}"#,                                   MethodCall::StopVibrate),
        ];

        for (text, call) in expected {
            assert_eq!(MethodCall::from_json(text).unwrap(), call, "parsing {text}");
        }
    }

    #[test]
    fn reject_unknown_methods() {
        assert!(MethodCall::from_json(r#"{"method":"launchRocket"}"#).is_err());
        assert!(MethodCall::from_json(r#"{"method":"vibrate"}"#).is_err());
        assert!(MethodCall::from_json("not json").is_err());
    }

    #[test]
    fn stop_vibrate_before_vibrate_is_no_op() {
        let (mut dut, _, vibrator) = session();
        dut.dispatch(MethodCall::StopVibrate).unwrap();
        assert_eq!(vibrator.events(), vec![VibrationEvent::Cancel]);
    }

    #[test]
    fn stop_sound_when_silent_is_no_op() {
        let (mut dut, audio, _) = session();
        assert_eq!(dut.dispatch(MethodCall::StopSound).unwrap(), Outcome::Done);
        assert!(audio.events().is_empty());
    }

    #[test]
    fn play_frequency_routes_to_synthesizer() {
        let (mut dut, audio, _) = session();

        dut.dispatch(MethodCall::PlayFrequency { frequency: 440.0, duration: None }).unwrap();

        assert!(dut.tone().is_playing());
        assert_eq!(audio.events().last(), Some(&AudioEvent::Play { track: 0, loop_points: Some(LoopPoints::whole(12_500)) }));
    }

    #[test]
    fn non_positive_durations_are_invalid() {
        let (mut dut, audio, _) = session();
        for duration in [0, -1, -1000, i64::from(u32::MAX) + 1] {
            let result = dut.dispatch(MethodCall::PlayFrequency { frequency: 440.0, duration: Some(duration) });
            assert!(matches!(result, Err(Error::InvalidArgument(_))), "duration {duration}");
        }
        assert!(audio.events().is_empty());
    }

    #[test]
    fn overlong_duration_is_invalid_not_fatal() {
        let (mut dut, audio, _) = session();
        let call = MethodCall::from_json(r#"{"method":"playFrequency","frequency":440,"duration":4294967295}"#).unwrap();

        assert!(matches!(dut.dispatch(call), Err(Error::InvalidArgument(_))));
        assert!(audio.events().is_empty());
        assert!(!dut.tone().is_playing());
    }

    #[test]
    fn vibrate_reports_pattern() {
        let (mut dut, _, _) = session();
        let outcome = dut.dispatch(MethodCall::Vibrate { level: 0.5 }).unwrap();
        assert_eq!(outcome, Outcome::Vibrating(PulsePattern::Repeating { on_ms: 500, off_ms: 500 }));
        assert_eq!(dut.haptic().map(|h| h.policy_kind()), Some(PolicyKind::Continuous));
    }

    #[test]
    fn no_motor() {
        let audio = RecordingAudioSink::default();
        let mut dut: TestSession = Session::new(audio, None, &Config::default()).unwrap();

        assert!(matches!(dut.dispatch(MethodCall::Vibrate { level: 0.5 }), Err(Error::NotInitialized(_))));
        dut.dispatch(MethodCall::StopVibrate).unwrap();
    }

    #[test]
    fn bad_config_fails_construction() {
        let mut config = Config::default();
        config.haptic.period_ms = 0;
        let result: Result<TestSession> = Session::new(RecordingAudioSink::default(), Some(RecordingVibrationSink::default()), &config);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        // Without a motor the haptic config is never consulted.
        let result: Result<TestSession> = Session::new(RecordingAudioSink::default(), None, &config);
        assert!(result.is_ok());
    }
}
