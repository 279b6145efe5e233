use std::f32::consts::PI;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;

/// Synthetic photoplethysmogram parameters
///
/// Each cardiac cycle is a systolic Gaussian pulse followed by a smaller
/// dicrotic wave, on top of a DC baseline with optional respiratory wander
/// and white noise. Values are in ADC counts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PpgConfig {
    pub duration_secs: f32,
    pub sample_interval_ms: u32,
    pub bpm: f32,
    pub baseline: f32,
    pub amplitude: f32,
    /// Dicrotic wave height relative to the systolic peak
    pub dicrotic_ratio: f32,
    /// Peak-to-peak amplitude of the respiratory baseline wander
    pub wander: f32,
    pub wander_hz: f32,
    /// Standard deviation of additive white noise
    pub noise_std: f32,
    pub seed: Option<u64>,
    pub full_scale: u16,
}

impl Default for PpgConfig {
    fn default() -> Self {
        Self {
            duration_secs: 10.0,
            sample_interval_ms: 5,
            bpm: 72.0,
            baseline: 1500.0,
            amplitude: 600.0,
            dicrotic_ratio: 0.25,
            wander: 0.0,
            wander_hz: 0.25,
            noise_std: 0.0,
            seed: None,
            full_scale: 4095,
        }
    }
}

impl PpgConfig {
    pub fn with_bpm(mut self, bpm: f32) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn with_duration(mut self, duration_secs: f32) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    pub fn with_noise(mut self, noise_std: f32, seed: u64) -> Self {
        self.noise_std = noise_std;
        self.seed = Some(seed);
        self
    }

    pub fn with_wander(mut self, wander: f32, wander_hz: f32) -> Self {
        self.wander = wander;
        self.wander_hz = wander_hz;
        self
    }
}

fn gaussian(x: f32, center: f32, width: f32) -> f32 {
    let d = (x - center) / width;
    (-0.5 * d * d).exp()
}

/// Pulse shape over one cycle, `phase` in [0, 1), peak value 1.0
fn pulse_shape(phase: f32, dicrotic_ratio: f32) -> f32 {
    gaussian(phase, 0.15, 0.06) + dicrotic_ratio * gaussian(phase, 0.45, 0.05)
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// Generate a PPG recording as ADC counts
pub fn generate_ppg_signal(config: &PpgConfig) -> Vec<u16> {
    let dt = config.sample_interval_ms as f32 / 1000.0;
    let num_samples = (config.duration_secs / dt) as usize;
    let beat_hz = config.bpm / 60.0;

    let mut rng = create_rng(config.seed);
    let noise = if config.noise_std > 0.0 {
        Normal::new(0.0, config.noise_std).ok()
    } else {
        None
    };

    (0..num_samples)
        .map(|i| {
            let t = i as f32 * dt;
            let phase = (t * beat_hz).fract();
            let mut value = config.baseline
                + config.amplitude * pulse_shape(phase, config.dicrotic_ratio)
                + 0.5 * config.wander * (2.0 * PI * config.wander_hz * t).sin();
            if let Some(n) = &noise {
                value += n.sample(&mut rng);
            }
            value.round().clamp(0.0, config.full_scale as f32) as u16
        })
        .collect()
}

/// Two-level test waveform: `high` for `high_samples`, then `low` for `low_samples`
pub fn square_wave(
    cycles: usize,
    high: u16,
    high_samples: usize,
    low: u16,
    low_samples: usize,
) -> Vec<u16> {
    let mut samples = Vec::with_capacity(cycles * (high_samples + low_samples));
    for _ in 0..cycles {
        samples.extend(std::iter::repeat_n(high, high_samples));
        samples.extend(std::iter::repeat_n(low, low_samples));
    }
    samples
}
