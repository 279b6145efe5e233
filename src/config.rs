//! Configuration for the pulse monitor.
//!
//! All tuning constants of the beat detector live in [`DetectorConfig`]. The
//! seed values and timing gates are sensor and ADC dependent; the defaults
//! match a 12-bit ADC sampled at 200 Hz with the threshold at Vcc/2.
//!
//! Any subset of fields can be overridden from a TOML file:
//!
//! ```toml
//! [detector]
//! thresh_setting = 2000
//! sample_interval_ms = 2
//!
//! [report]
//! refractory_samples = 40
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{MonitorError, Result};
use crate::output::OutputFormat;

/// Sampling rate specification
///
/// Can be given either as a frequency in Hz or as a period in milliseconds.
/// The detector works on whole milliseconds, so the rate is stored as the
/// sample interval.
///
/// # Parsing formats
/// - `200` - frequency in Hz (no suffix)
/// - `200hz` or `200Hz` - frequency in Hz (explicit)
/// - `5ms` - period in milliseconds
///
/// # Example
/// ```
/// use pulsemon::config::SampleRate;
///
/// let rate: SampleRate = "200hz".parse().unwrap();
/// assert_eq!(rate.interval_ms(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRate(u32);

impl SampleRate {
    /// Create from a period in milliseconds
    pub fn from_interval_ms(ms: u32) -> Self {
        Self(ms)
    }

    /// Create from a frequency in Hz, rounded to the nearest whole millisecond
    pub fn from_hz(hz: f32) -> Self {
        Self((1000.0 / hz).round().max(1.0) as u32)
    }

    /// Sample interval in milliseconds
    pub fn interval_ms(&self) -> u32 {
        self.0
    }

    /// Effective sampling frequency in Hz
    pub fn as_hz(&self) -> f32 {
        1000.0 / self.0 as f32
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::from_interval_ms(5)
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl FromStr for SampleRate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(num) = s.strip_suffix("ms") {
            let ms: u32 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid interval: {}", s))?;
            if ms == 0 {
                return Err("interval must be positive".to_string());
            }
            return Ok(Self::from_interval_ms(ms));
        }

        let num = s
            .strip_suffix("hz")
            .or_else(|| s.strip_suffix("Hz"))
            .or_else(|| s.strip_suffix("HZ"))
            .unwrap_or(s);

        let hz: f32 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid frequency: {}", s))?;
        if hz <= 0.0 || hz > 1000.0 {
            return Err("frequency must be in (0, 1000] Hz".to_string());
        }
        Ok(Self::from_hz(hz))
    }
}

/// Full monitor configuration
///
/// Use `MonitorConfig::default()` for the reference sensor setup.
///
/// # Example
/// ```
/// use pulsemon::config::MonitorConfig;
///
/// let mut config = MonitorConfig::default();
/// config.detector.thresh_setting = 2048;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Beat detector tuning
    pub detector: DetectorConfig,
    /// Beat reporting configuration
    pub report: ReportConfig,
}

/// Beat detector tuning constants
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Baseline detection threshold, restored after a silence timeout
    pub thresh_setting: u16,
    /// Time between successive samples in milliseconds
    pub sample_interval_ms: u32,
    /// Peak/trough seed applied by `reset`
    pub mid_range: u16,
    /// Peak/trough seed applied after a silence timeout
    pub timeout_mid_range: u16,
    /// Minimum time between beats in milliseconds (caps the rate near 240 BPM)
    pub min_beat_interval_ms: u32,
    /// Time without a beat before the detector falls back to its defaults
    pub silence_timeout_ms: u32,
    /// IBI assumed after `reset`
    pub initial_ibi_ms: u16,
    /// IBI assumed after a silence timeout
    pub timeout_ibi_ms: u16,
    /// Pulse amplitude assumed until the first completed cycle
    pub initial_amplitude: u16,
    /// ADC resolution in bits
    pub adc_bits: u8,
}

impl DetectorConfig {
    /// Largest sample value the ADC can produce
    pub fn full_scale(&self) -> u16 {
        if self.adc_bits >= 16 {
            u16::MAX
        } else {
            (1u16 << self.adc_bits) - 1
        }
    }

    pub fn sample_rate(&self) -> SampleRate {
        SampleRate::from_interval_ms(self.sample_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_interval_ms == 0 {
            return Err(MonitorError::InvalidSampleInterval(self.sample_interval_ms));
        }
        if self.adc_bits == 0 || self.adc_bits > 16 {
            return Err(MonitorError::Config(format!(
                "adc_bits must be in 1..=16, got {}",
                self.adc_bits
            )));
        }

        let full_scale = self.full_scale();
        for (name, value) in [
            ("thresh_setting", self.thresh_setting),
            ("mid_range", self.mid_range),
            ("timeout_mid_range", self.timeout_mid_range),
        ] {
            if value > full_scale {
                return Err(MonitorError::Config(format!(
                    "{} {} exceeds ADC full scale {}",
                    name, value, full_scale
                )));
            }
        }

        if self.silence_timeout_ms == 0 {
            return Err(MonitorError::Config(
                "silence_timeout_ms must be positive".to_string(),
            ));
        }
        if self.silence_timeout_ms <= self.min_beat_interval_ms {
            return Err(MonitorError::Config(format!(
                "silence_timeout_ms {} must exceed min_beat_interval_ms {}",
                self.silence_timeout_ms, self.min_beat_interval_ms
            )));
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            thresh_setting: 1650,
            sample_interval_ms: 5,
            mid_range: 1600,
            timeout_mid_range: 1600,
            min_beat_interval_ms: 250,
            silence_timeout_ms: 1200,
            initial_ibi_ms: 750, // 80 BPM
            timeout_ibi_ms: 600, // 100 BPM
            initial_amplitude: 100,
            adc_bits: 12,
        }
    }
}

/// Beat reporting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Samples that must elapse after a reported beat before the next one is reported
    pub refractory_samples: u32,
    /// Length of a reporting session in seconds
    pub window_secs: u32,
    /// Output format for reported events
    pub format: OutputFormat,
}

impl ReportConfig {
    /// Number of samples in one reporting session
    pub fn window_samples(&self, sample_interval_ms: u32) -> u64 {
        u64::from(self.window_secs) * 1000 / u64::from(sample_interval_ms.max(1))
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            refractory_samples: 80,
            window_secs: 60,
            format: OutputFormat::Text,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        if self.report.window_secs == 0 {
            return Err(MonitorError::Config(
                "window_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| MonitorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::info!("Loaded configuration from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }
}
