use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hound::WavReader;

use super::{MemorySource, SampleSource};
use crate::config::SampleRate;
use crate::error::{MonitorError, Result};

/// PPG recording stored as a WAV file
///
/// Audio samples are signed around zero; they are rescaled onto the unsigned
/// ADC range `0..=full_scale` the detector expects. The sample interval is
/// taken from the WAV sample rate.
pub struct WavFileSource {
    inner: MemorySource,
    sample_rate: u32,
}

impl WavFileSource {
    pub fn new<P: AsRef<Path>>(
        path: P,
        channel: u16,
        chunk_size: usize,
        full_scale: u16,
    ) -> Result<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if channel >= spec.channels {
            return Err(MonitorError::Source(format!(
                "channel {} requested from a {}-channel WAV file",
                channel, spec.channels
            )));
        }
        if spec.sample_rate == 0 || spec.sample_rate > 1000 {
            return Err(MonitorError::Source(format!(
                "sample rate {} Hz is outside 1..=1000 Hz; resample the recording first",
                spec.sample_rate
            )));
        }
        if 1000 % spec.sample_rate != 0 {
            log::warn!(
                "Sample rate {} Hz is not a whole number of milliseconds, timing will drift",
                spec.sample_rate
            );
        }

        let interval_ms = SampleRate::from_hz(spec.sample_rate as f32).interval_ms();
        let normalized = Self::read_samples(reader, &spec)?;
        let samples: Vec<u16> = normalized
            .chunks_exact(spec.channels as usize)
            .map(|frame| to_adc_counts(frame[channel as usize], full_scale))
            .collect();

        log::info!(
            "Opened {}: {} samples at {} Hz",
            path.as_ref().display(),
            samples.len(),
            spec.sample_rate
        );

        Ok(Self {
            inner: MemorySource::new(samples, interval_ms, chunk_size),
            sample_rate: spec.sample_rate,
        })
    }

    fn read_samples(
        mut reader: WavReader<BufReader<File>>,
        spec: &hound::WavSpec,
    ) -> Result<Vec<f32>> {
        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                // Full scale of a signed sample, 2^31 for 32-bit data
                let max_val = (1_i64 << spec.bits_per_sample.saturating_sub(1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Map a normalized sample in [-1, 1] onto ADC counts
pub fn to_adc_counts(normalized: f32, full_scale: u16) -> u16 {
    let scaled = (normalized.clamp(-1.0, 1.0) + 1.0) * 0.5 * full_scale as f32;
    scaled.round() as u16
}

/// Map ADC counts onto a normalized sample in [-1, 1]
pub fn from_adc_counts(counts: u16, full_scale: u16) -> f32 {
    counts.min(full_scale) as f32 / full_scale as f32 * 2.0 - 1.0
}

impl SampleSource for WavFileSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<u16>>> {
        self.inner.next_chunk()
    }

    fn sample_interval_ms(&self) -> u32 {
        self.inner.sample_interval_ms()
    }
}
