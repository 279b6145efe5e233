use crate::config::MonitorConfig;
use crate::pulse::HeartRateMonitor;

#[derive(Debug, Clone, Default)]
pub struct HeartRateMeasurement {
    /// Beats that raised the beat flag
    pub beats: usize,
    /// BPM after the last sample
    pub final_bpm: u16,
    /// IBIs of the counted beats, in order
    pub intervals_ms: Vec<u16>,
    pub silence_timeouts: u64,
}

impl HeartRateMeasurement {
    pub fn mean_ibi_ms(&self) -> Option<f32> {
        if self.intervals_ms.is_empty() {
            return None;
        }
        let total: u32 = self.intervals_ms.iter().map(|&v| u32::from(v)).sum();
        Some(total as f32 / self.intervals_ms.len() as f32)
    }
}

/// Run a fresh detector over `signal` and collect what it reports
pub fn measure_heart_rate(signal: &[u16], config: &MonitorConfig) -> HeartRateMeasurement {
    let mut monitor = match HeartRateMonitor::new(&config.detector) {
        Ok(m) => m,
        Err(_) => return HeartRateMeasurement::default(),
    };

    let mut measurement = HeartRateMeasurement::default();
    for &sample in signal {
        if let Some(beat) = monitor.ingest_sample(sample) {
            measurement.beats += 1;
            measurement.intervals_ms.push(beat.ibi_ms);
        }
    }

    measurement.final_bpm = monitor.beats_per_minute();
    measurement.silence_timeouts = monitor.silence_timeouts();
    measurement
}
