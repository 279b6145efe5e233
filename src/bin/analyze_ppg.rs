use clap::Parser;
use rolling_stats::Stats;
use serde::Serialize;
use std::path::{Path, PathBuf};

use pulsemon::config::{MonitorConfig, SampleRate};
use pulsemon::output::ReportEvent;
use pulsemon::source::{SampleSource, TextFileSource, WavFileSource};
use pulsemon::PulseProcessor;

#[derive(Parser, Debug)]
#[command(name = "analyze_ppg")]
#[command(about = "Summarize heart rate statistics of PPG recordings", long_about = None)]
struct Args {
    /// Recordings to analyze (.wav or text)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: text, csv, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Baseline detection threshold in ADC counts
    #[arg(short, long)]
    threshold: Option<u16>,

    /// Sampling rate of text input (e.g., "200hz", "5ms")
    #[arg(short, long)]
    rate: Option<SampleRate>,

    /// WAV channel holding the PPG signal
    #[arg(long, default_value_t = 0)]
    channel: u16,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct StatsSummary {
    count: usize,
    mean: f32,
    std_dev: f32,
    min: f32,
    max: f32,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f32>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
struct FileAnalysis {
    filename: String,
    sample_count: u64,
    duration_secs: f32,
    beats: u64,
    silence_timeouts: u64,
    bpm: Option<StatsSummary>,
    ibi_ms: Option<StatsSummary>,
    amplitude: Option<StatsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

const CHUNK_SIZE: usize = 1024;

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
    // Every detected beat counts towards the statistics
    config.report.refractory_samples = 0;
    config.validate()?;

    let results: Vec<FileAnalysis> = args
        .files
        .iter()
        .map(|path| analyze_file(path, &config, args.channel))
        .collect();

    match args.format {
        OutputFormat::Text => print_text(&results),
        OutputFormat::Csv => print_csv(&results),
        OutputFormat::Json => print_json(&results)?,
    }

    Ok(())
}

fn analyze_file(path: &Path, config: &MonitorConfig, channel: u16) -> FileAnalysis {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    match analyze_file_impl(path, config, channel) {
        Ok(mut analysis) => {
            analysis.filename = filename;
            analysis
        }
        Err(e) => FileAnalysis {
            filename,
            error: Some(e.to_string()),
            ..FileAnalysis::default()
        },
    }
}

fn analyze_file_impl(
    path: &Path,
    config: &MonitorConfig,
    channel: u16,
) -> anyhow::Result<FileAnalysis> {
    let full_scale = config.detector.full_scale();
    let mut source: Box<dyn SampleSource> = if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
    {
        Box::new(WavFileSource::new(path, channel, CHUNK_SIZE, full_scale)?)
    } else {
        Box::new(TextFileSource::new(
            path,
            config.detector.sample_interval_ms,
            CHUNK_SIZE,
            full_scale,
        )?)
    };

    let mut config = config.clone();
    config.detector.sample_interval_ms = source.sample_interval_ms();
    let mut processor = PulseProcessor::new(&config)?;

    let mut bpm_stats: Stats<f32> = Stats::new();
    let mut ibi_stats: Stats<f32> = Stats::new();
    let mut amplitude_stats: Stats<f32> = Stats::new();

    processor.run(&mut source, |event| {
        if let ReportEvent::Beat(beat) = event {
            bpm_stats.update(f32::from(beat.bpm));
            ibi_stats.update(f32::from(beat.ibi_ms));
            amplitude_stats.update(f32::from(beat.amplitude));
        }
    })?;

    let stats = processor.stats();
    Ok(FileAnalysis {
        filename: String::new(),
        sample_count: stats.samples,
        duration_secs: processor.elapsed_ms() as f32 / 1000.0,
        beats: stats.beats_detected,
        silence_timeouts: stats.silence_timeouts,
        bpm: StatsSummary::from_stats(&bpm_stats),
        ibi_ms: StatsSummary::from_stats(&ibi_stats),
        amplitude: StatsSummary::from_stats(&amplitude_stats),
        error: None,
    })
}

fn print_text(results: &[FileAnalysis]) {
    println!(
        "{:<40} {:>9} {:>7} {:>8} {:>7} {:>9} {:>8}",
        "File", "Duration", "Beats", "BPM", "Std", "IBI (ms)", "Timeouts"
    );
    println!("{}", "-".repeat(94));

    for result in results {
        if let Some(ref err) = result.error {
            println!("{:<40} ERROR: {}", result.filename, err);
            continue;
        }

        let bpm_mean = result
            .bpm
            .as_ref()
            .map(|s| format!("{:.1}", s.mean))
            .unwrap_or_else(|| "-".to_string());
        let bpm_std = result
            .bpm
            .as_ref()
            .map(|s| format!("{:.1}", s.std_dev))
            .unwrap_or_else(|| "-".to_string());
        let ibi_mean = result
            .ibi_ms
            .as_ref()
            .map(|s| format!("{:.0}", s.mean))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<40} {:>8.1}s {:>7} {:>8} {:>7} {:>9} {:>8}",
            result.filename,
            result.duration_secs,
            result.beats,
            bpm_mean,
            bpm_std,
            ibi_mean,
            result.silence_timeouts
        );
    }

    for result in results {
        if let Some(ref ibi) = result.ibi_ms {
            eprintln!();
            eprintln!("IBI statistics for {}:", result.filename);
            eprintln!("  Mean: {:.1} ms", ibi.mean);
            eprintln!("  Std dev: {:.1} ms", ibi.std_dev);
            eprintln!("  Min: {:.0} ms", ibi.min);
            eprintln!("  Max: {:.0} ms", ibi.max);
        }
    }
}

fn print_csv(results: &[FileAnalysis]) {
    println!(
        "filename,sample_count,duration_secs,beats,silence_timeouts,bpm_mean,bpm_std,bpm_min,bpm_max,ibi_mean,ibi_std,amplitude_mean,error"
    );
    for result in results {
        let error = result.error.as_deref().unwrap_or("");

        println!(
            "{},{},{:.3},{},{},{},{},{},{},{},{},{},{}",
            result.filename,
            result.sample_count,
            result.duration_secs,
            result.beats,
            result.silence_timeouts,
            stat_field(&result.bpm, |s| s.mean),
            stat_field(&result.bpm, |s| s.std_dev),
            stat_field(&result.bpm, |s| s.min),
            stat_field(&result.bpm, |s| s.max),
            stat_field(&result.ibi_ms, |s| s.mean),
            stat_field(&result.ibi_ms, |s| s.std_dev),
            stat_field(&result.amplitude, |s| s.mean),
            error
        );
    }
}

fn stat_field(summary: &Option<StatsSummary>, f: impl Fn(&StatsSummary) -> f32) -> String {
    summary
        .as_ref()
        .map(|s| format!("{:.2}", f(s)))
        .unwrap_or_default()
}

fn print_json(results: &[FileAnalysis]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{}", json);
    Ok(())
}
