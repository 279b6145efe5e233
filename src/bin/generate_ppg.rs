use anyhow::{Context, Result};
use clap::Parser;
use pulsemon::config::SampleRate;
use pulsemon::save_wav;
use pulsemon::simulation::{PpgConfig, generate_ppg_signal};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "generate_ppg")]
#[command(about = "Generate synthetic PPG recordings for heartbeat detector testing")]
struct Args {
    /// TOML waveform configuration file (fields of the simulated PPG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "data/synthetic")]
    output_dir: PathBuf,

    /// Heart rates in BPM: comma-separated (e.g., "60,72,90") or range (e.g., "50-120:10")
    #[arg(short = 'b', long, default_value = "50-150:10")]
    rates: String,

    /// Number of trials per heart rate
    #[arg(short, long, default_value_t = 1)]
    trials: u32,

    /// Base seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Recording duration in seconds
    #[arg(short, long)]
    duration: Option<f32>,

    /// Sampling rate (e.g., "200hz", "5ms")
    #[arg(long)]
    rate: Option<SampleRate>,

    /// Standard deviation of additive noise in ADC counts (CLI override)
    #[arg(long)]
    noise: Option<f32>,

    /// Write text files (one sample per line) instead of WAV
    #[arg(long)]
    text: bool,

    /// Output filename prefix
    #[arg(long, default_value = "ppg")]
    prefix: String,

    /// Generate manifest.json
    #[arg(long)]
    manifest: bool,
}

#[derive(Debug, serde::Serialize)]
struct ManifestEntry {
    file: String,
    bpm: f32,
    trial: u32,
    seed: u64,
}

#[derive(Debug, serde::Serialize)]
struct Manifest {
    sample_interval_ms: u32,
    duration: f32,
    noise_std: f32,
    files: Vec<ManifestEntry>,
}

fn parse_rates(s: &str) -> Result<Vec<f32>> {
    if s.contains(':') {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid range format. Use 'start-end:step'");
        }
        let step: f32 = parts[1].parse().context("Invalid step value")?;
        if step <= 0.0 {
            anyhow::bail!("Step must be positive");
        }
        let range_parts: Vec<&str> = parts[0].split('-').collect();
        if range_parts.len() != 2 {
            anyhow::bail!("Invalid range format. Use 'start-end:step'");
        }
        let start: f32 = range_parts[0].parse().context("Invalid start value")?;
        let end: f32 = range_parts[1].parse().context("Invalid end value")?;

        let mut rates = Vec::new();
        let mut r = start;
        while r <= end {
            rates.push(r);
            r += step;
        }
        Ok(rates)
    } else {
        s.split(',')
            .map(|p| p.trim().parse::<f32>().context("Invalid heart rate value"))
            .collect()
    }
}

fn load_toml_config(path: &Path) -> Result<PpgConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

fn write_text(path: &Path, samples: &[u16]) -> Result<()> {
    let mut file = std::io::BufWriter::new(fs::File::create(path)?);
    for sample in samples {
        writeln!(file, "{}", sample)?;
    }
    file.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::init();

    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let mut base_config = match args.config {
        Some(ref path) => load_toml_config(path)?,
        None => PpgConfig::default(),
    };
    if let Some(duration) = args.duration {
        base_config.duration_secs = duration;
    }
    if let Some(rate) = args.rate {
        base_config.sample_interval_ms = rate.interval_ms();
    }
    if let Some(noise) = args.noise {
        base_config.noise_std = noise;
    }

    let rates = parse_rates(&args.rates)?;
    let base_seed = args.seed.unwrap_or(0);
    let sample_rate_hz = 1000 / base_config.sample_interval_ms.max(1);

    let mut manifest_entries = Vec::new();
    let total_files = rates.len() * args.trials as usize;
    let mut file_count = 0;

    for &bpm in &rates {
        for trial in 0..args.trials {
            let seed = base_seed + trial as u64 * 1000 + bpm as u64;
            let mut config = base_config.clone().with_bpm(bpm);
            config.seed = Some(seed);

            let signal = generate_ppg_signal(&config);

            let extension = if args.text { "txt" } else { "wav" };
            let filename = format!(
                "{}_bpm{:03}_t{:02}.{}",
                args.prefix, bpm as i32, trial, extension
            );
            let filepath = args.output_dir.join(&filename);

            if args.text {
                write_text(&filepath, &signal).context("Failed to write text file")?;
            } else {
                save_wav(&filepath, &signal, sample_rate_hz, config.full_scale)
                    .context("Failed to write WAV file")?;
            }

            manifest_entries.push(ManifestEntry {
                file: filename,
                bpm,
                trial,
                seed,
            });

            file_count += 1;
            eprint!("\rGenerating: {}/{}", file_count, total_files);
        }
    }
    eprintln!();

    if args.manifest {
        let manifest = Manifest {
            sample_interval_ms: base_config.sample_interval_ms,
            duration: base_config.duration_secs,
            noise_std: base_config.noise_std,
            files: manifest_entries,
        };
        let manifest_path = args.output_dir.join("manifest.json");
        let manifest_json =
            serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        fs::write(&manifest_path, manifest_json).context("Failed to write manifest")?;
        eprintln!("Manifest written to: {}", manifest_path.display());
    }

    eprintln!(
        "Generated {} files in {}",
        total_files,
        args.output_dir.display()
    );
    Ok(())
}
