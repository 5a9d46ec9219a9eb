use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use haptic_beat::analysis::{AnalysisPipeline, CallbackSink, HapticEvent, HapticSink};
use haptic_beat::audio::{read_wav_mono, SignalPattern, SyntheticBackend};
use haptic_beat::haptics::{Actuator, PatternPlanner, PatternSink, VibrationPattern};
use haptic_beat::{AnalysisMode, AppConfig, InputSource, SessionBuilder, StatsSnapshot, StopReason};
use serde::Serialize;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "haptic_cli",
    about = "Drive the haptic beat analysis pipeline from the command line"
)]
struct Cli {
    /// JSON configuration file (defaults are used for missing fields)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze live audio from the default capture device
    Listen {
        #[arg(long, value_enum)]
        mode: Option<AnalysisMode>,
        #[arg(long, value_enum)]
        input: Option<InputSource>,
        #[arg(long, default_value_t = 10)]
        seconds: u64,
        /// Print planned vibration patterns instead of raw events
        #[arg(long)]
        patterns: bool,
    },
    /// Analyze a WAV file offline and print the events it produces
    Analyze {
        #[arg(long)]
        wav: PathBuf,
        #[arg(long, value_enum)]
        mode: Option<AnalysisMode>,
        #[arg(long)]
        patterns: bool,
    },
    /// Run a session over a synthetic signal in real time
    Synth {
        #[arg(long, value_enum, default_value_t = PatternArg::Bursts)]
        pattern: PatternArg,
        #[arg(long, default_value_t = 100.0)]
        frequency: f32,
        #[arg(long, default_value_t = 3)]
        seconds: u64,
        #[arg(long, value_enum)]
        mode: Option<AnalysisMode>,
        #[arg(long)]
        patterns: bool,
    },
    /// Print the effective configuration as JSON
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PatternArg {
    Sine,
    Bursts,
    Noise,
    Silence,
}

impl PatternArg {
    fn signal(self, frequency_hz: f32) -> SignalPattern {
        match self {
            PatternArg::Sine => SignalPattern::Sine { frequency_hz },
            PatternArg::Bursts => SignalPattern::Bursts {
                frequency_hz,
                interval_ms: 500,
                burst_ms: 60,
            },
            PatternArg::Noise => SignalPattern::Noise { seed: 7 },
            PatternArg::Silence => SignalPattern::Silence,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    haptic_beat::init_logging(match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    });

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Listen {
            mode,
            input,
            seconds,
            patterns,
        } => {
            let mut config = apply_mode(config, mode);
            if let Some(input) = input {
                config.session.input_source = input;
            }
            run_session(config, SessionBuilder::new, seconds, patterns)
        }
        Commands::Analyze {
            wav,
            mode,
            patterns,
        } => run_analyze(apply_mode(config, mode), wav, patterns),
        Commands::Synth {
            pattern,
            frequency,
            seconds,
            mode,
            patterns,
        } => {
            let config = apply_mode(config, mode);
            let backend = SyntheticBackend::new(pattern.signal(frequency))
                .realtime(true)
                .with_duration_samples(seconds * u64::from(config.session.sample_rate_hz));
            let builder = move |config: AppConfig| SessionBuilder::new(config).backend(Box::new(backend));
            run_session(config, builder, seconds, patterns)
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::from(0))
        }
    }
}

fn apply_mode(config: AppConfig, mode: Option<AnalysisMode>) -> AppConfig {
    match mode {
        Some(mode) => config.with_mode(mode),
        None => config,
    }
}

fn run_session(
    config: AppConfig,
    builder: impl FnOnce(AppConfig) -> SessionBuilder,
    seconds: u64,
    patterns: bool,
) -> Result<ExitCode> {
    let sink = output_sink(&config, patterns);
    let mut session = builder(config)
        .sink(sink)
        .start()
        .context("starting analysis session")?;

    let mut remaining = Duration::from_secs(seconds);
    let tick = Duration::from_millis(50);
    while session.is_running() && !remaining.is_zero() {
        let step = tick.min(remaining);
        thread::sleep(step);
        remaining -= step;
    }

    let reason = session.stop().context("stopping analysis session")?;
    emit_summary(&SessionSummary {
        stop_reason: reason,
        stats: session.stats(),
    })?;
    Ok(ExitCode::from(0))
}

fn run_analyze(mut config: AppConfig, wav: PathBuf, patterns: bool) -> Result<ExitCode> {
    let clip = read_wav_mono(&wav).with_context(|| format!("reading {}", wav.display()))?;
    config.session.sample_rate_hz = clip.sample_rate_hz;

    let mut pipeline = AnalysisPipeline::new(&config).context("building analysis pipeline")?;
    let mut sink = output_sink(&config, patterns);
    let chunk_len = config.session.buffer_size_samples;
    let rate = u64::from(clip.sample_rate_hz.max(1));

    let mut beats = 0u64;
    for (index, chunk) in clip.samples.chunks(chunk_len).enumerate() {
        let position = (index * chunk_len) as u64;
        let analysis = pipeline.process(chunk, position * 1000 / rate, sink.as_mut());
        beats += u64::from(analysis.beat.is_some());
    }

    tracing::info!(
        frames = pipeline.frames_processed(),
        beats,
        duration_ms = clip.duration_ms(),
        "analysis complete"
    );
    Ok(ExitCode::from(0))
}

fn output_sink(config: &AppConfig, patterns: bool) -> Box<dyn HapticSink> {
    if patterns {
        let planner = PatternPlanner::new(&config.haptics);
        Box::new(PatternSink::new(planner, StdoutActuator))
    } else {
        Box::new(CallbackSink::new(|event: HapticEvent| print_json(&event)))
    }
}

/// Prints every planned pattern as a JSON line.
struct StdoutActuator;

impl Actuator for StdoutActuator {
    fn play(&mut self, pattern: &VibrationPattern) {
        print_json(pattern);
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(err) => tracing::warn!(error = %err, "failed to encode output line"),
    }
}

#[derive(Serialize)]
struct SessionSummary {
    stop_reason: StopReason,
    stats: StatsSnapshot,
}

fn emit_summary(summary: &SessionSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    eprintln!("{json}");
    Ok(())
}
