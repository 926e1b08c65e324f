use std::io;
use std::path::PathBuf;

use clap::{ArgEnum, Args, Parser, Subcommand};
use console::{style, Color};
use pulsetone_core::analysis::tone_level_db;
use pulsetone_core::config::{Config, PolicyKind};
use pulsetone_core::haptic::{HapticIntensityController, PulsePattern};
use pulsetone_core::session::Session;
use pulsetone_core::synth::{generate_samples, ToneRequest, ToneSynthesizer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::sink::log::LogVibrator;
use crate::sink::wav::WavFileSink;

mod dispatch;
mod error;
mod sink;

const BAR_WIDTH: usize = 40;

#[derive(Parser)]
#[clap(author, version, about, long_about=None)]
pub(crate) struct Cli {
    /// TOML configuration; defaults apply when the file is absent.
    #[clap(long, default_value="pulsetone.toml")]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(ArgEnum, Clone, Copy)]
pub(crate) enum Policy {
    Continuous,
    Discrete,
    Passthrough,
}

impl From<Policy> for PolicyKind {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Continuous  => PolicyKind::Continuous,
            Policy::Discrete    => PolicyKind::Discrete,
            Policy::Passthrough => PolicyKind::Passthrough,
        }
    }
}

#[derive(Args)]
pub(crate) struct ToneArgs {
    /// Frequency in Hz.
    frequency: f64,

    /// Duration in milliseconds; omit for a looping tone.
    #[clap(long)]
    duration: Option<u32>,

    /// Loop repetitions written for a looping tone.
    #[clap(long, default_value_t=4)]
    loops: usize,

    /// Measure the level of the generated waveform at the requested frequency.
    #[clap(long)]
    check: bool,

    #[clap(long)]
    out: PathBuf,
}

#[derive(Args)]
pub(crate) struct PatternArgs {
    #[clap(allow_hyphen_values=true)]
    level: f64,

    #[clap(long, arg_enum)]
    policy: Option<Policy>,
}

#[derive(Args)]
pub(crate) struct SessionArgs {
    #[clap(long, default_value="session.wav")]
    out: PathBuf,

    #[clap(long, default_value_t=4)]
    loops: usize,

    /// Run without a vibration sink.
    #[clap(long)]
    no_motor: bool,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    #[clap(name="tone")]
    Tone(ToneArgs),

    #[clap(name="pattern")]
    Pattern(PatternArgs),

    #[clap(name="session")]
    Session(SessionArgs),
}

fn duty_bar(pattern: &PulsePattern) -> String {
    let on = (pattern.duty_cycle() * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(on), ".".repeat(BAR_WIDTH - on))
}

fn describe(pattern: &PulsePattern) -> String {
    match *pattern {
        PulsePattern::Idle                        => "idle".to_string(),
        PulsePattern::Repeating { on_ms, off_ms } => format!("on {on_ms} ms, off {off_ms} ms, repeating"),
        PulsePattern::OneShot { duration_ms }     => format!("once for {duration_ms} ms"),
    }
}

fn tone(config: &Config, a: ToneArgs) -> Result<()> {
    let request = ToneRequest::new(a.frequency, a.duration)?;

    let mut synth = ToneSynthesizer::new(WavFileSink::new(&a.out, a.loops), &config.tone)?;
    synth.play(request)?;
    synth.stop_tone()?;

    if a.check {
        let sample_rate = synth.sample_rate();
        let buffer = generate_samples(request.frequency_hz(), sample_rate, request.sample_count(sample_rate));
        let level = tone_level_db(&buffer, request.frequency_hz());
        let color = if level > -1.0 { Color::Green } else { Color::Red };
        println!("{:>10.3} Hz {} dBFS", request.frequency_hz(), style(format!("{level:6.2}")).fg(color));
    }

    println!("wrote {}", a.out.display());
    Ok(())
}

fn pattern(config: &Config, a: PatternArgs) -> Result<()> {
    let mut haptic = config.haptic.clone();
    if let Some(policy) = a.policy {
        haptic.policy = policy.into();
    }

    let controller = HapticIntensityController::new(LogVibrator::new(), &haptic)?;
    let pattern = controller.intensity_to_pattern(a.level);

    let color = if pattern.is_idle() { Color::White } else { Color::Cyan };
    println!(
        "{:>6.3} [{}] {:>5.1}% {}",
        a.level,
        style(duty_bar(&pattern)).fg(color),
        pattern.duty_cycle() * 100.0,
        describe(&pattern),
    );
    Ok(())
}

fn session(config: &Config, a: SessionArgs) -> Result<()> {
    let vibrator = if a.no_motor { None } else { Some(LogVibrator::new()) };
    let session = Session::new(WavFileSink::new(&a.out, a.loops), vibrator, config)?;

    info!(out = %session.tone().sink().path().display(), motor = !a.no_motor, "session ready");
    let session = dispatch::run(session, io::BufReader::new(io::stdin()), io::stdout().lock())?;

    if let Some(haptic) = session.haptic() {
        info!(commands = haptic.sink().commands(), state = ?haptic.sink().state(), "motor at end of input");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Cli::parse();
    let config = Config::load_or_default(&args.config)?;

    match args.command {
        Commands::Tone(a)    => tone(&config, a),
        Commands::Pattern(a) => pattern(&config, a),
        Commands::Session(a) => session(&config, a),
    }
}
