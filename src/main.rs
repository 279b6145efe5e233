use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::Parser;

use pulsemon::config::{MonitorConfig, SampleRate};
use pulsemon::output::{OutputFormat, create_formatter};
use pulsemon::source::{PacedSource, SampleSource, TextFileSource, WavFileSource};
use pulsemon::PulseProcessor;

#[derive(Parser, Debug)]
#[command(name = "pulsemon")]
#[command(about = "Detect heartbeats in a recorded PPG signal", long_about = None)]
struct Args {
    /// Recording to process (.wav, or text with one sample per line); stdin if omitted
    input: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Baseline detection threshold in ADC counts
    #[arg(short, long)]
    threshold: Option<u16>,

    /// Sampling rate of text input (e.g., "200hz", "5ms")
    #[arg(short, long)]
    rate: Option<SampleRate>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// WAV channel holding the PPG signal
    #[arg(long, default_value_t = 0)]
    channel: u16,

    /// Minimum samples between reported beats
    #[arg(long)]
    refractory: Option<u32>,

    /// Reporting session length in seconds
    #[arg(long)]
    window: Option<u32>,

    /// Replay the input at its real sampling rate
    #[arg(long)]
    realtime: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const CHUNK_SIZE: usize = 256;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => MonitorConfig::from_toml_file(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.detector.thresh_setting = threshold;
    }
    if let Some(rate) = args.rate {
        config.detector.sample_interval_ms = rate.interval_ms();
    }
    if let Some(format) = args.format {
        config.report.format = format;
    }
    if let Some(refractory) = args.refractory {
        config.report.refractory_samples = refractory;
    }
    if let Some(window) = args.window {
        config.report.window_secs = window;
    }

    let mut source = open_source(args.input.as_deref(), args.channel, &config)?;
    // A WAV file carries its own rate
    config.detector.sample_interval_ms = source.sample_interval_ms();
    config.validate()?;

    if args.realtime {
        source = Box::new(PacedSource::new(source, CHUNK_SIZE)?);
    }

    log::info!(
        "Threshold {} at {} ({:.0} Hz)",
        config.detector.thresh_setting,
        config.detector.sample_rate(),
        config.detector.sample_rate().as_hz()
    );

    let formatter = create_formatter(config.report.format, args.verbose > 0);
    let line_ending = formatter.line_ending();
    let mut processor = PulseProcessor::new(&config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(header) = formatter.header() {
        write!(out, "{}{}", header, line_ending)?;
    }

    let mut write_result = Ok(());
    processor.run(&mut source, |event| {
        if write_result.is_err() {
            return;
        }
        if let Some(line) = formatter.format(event) {
            write_result = write!(out, "{}{}", line, line_ending).and_then(|_| out.flush());
        }
    })?;
    write_result?;

    if let Some(line) = formatter.format(&processor.finish()) {
        write!(out, "{}{}", line, line_ending)?;
    }

    let stats = processor.stats();
    log::info!(
        "{} samples, {} beats detected, {} reported, {} suppressed, {} silence timeouts",
        stats.samples,
        stats.beats_detected,
        stats.beats_reported,
        stats.beats_suppressed,
        stats.silence_timeouts
    );

    Ok(())
}

fn open_source(
    input: Option<&Path>,
    channel: u16,
    config: &MonitorConfig,
) -> anyhow::Result<Box<dyn SampleSource>> {
    let full_scale = config.detector.full_scale();
    let interval_ms = config.detector.sample_interval_ms;

    let source: Box<dyn SampleSource> = match input {
        Some(path)
            if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav")) =>
        {
            Box::new(WavFileSource::new(path, channel, CHUNK_SIZE, full_scale)?)
        }
        Some(path) => Box::new(TextFileSource::new(path, interval_ms, CHUNK_SIZE, full_scale)?),
        None => Box::new(TextFileSource::from_reader(
            BufReader::new(io::stdin()),
            interval_ms,
            CHUNK_SIZE,
            full_scale,
        )?),
    };
    Ok(source)
}
