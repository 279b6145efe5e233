use crate::config::DetectorConfig;
use crate::error::Result;

use super::rate_history::RateHistory;
use super::startup::StartupPhase;

/// A counted beat, produced when the beat flag is raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beat {
    /// Interval since the previous beat in milliseconds
    pub ibi_ms: u16,
    /// Rolling beats-per-minute estimate including this beat
    pub bpm: u16,
    /// Sample-clock time of the beat in milliseconds
    pub sample_time_ms: u32,
    /// Peak-to-trough amplitude of the last completed cycle
    pub amplitude: u16,
}

/// Point-in-time copy of the monitor outputs
///
/// Taken in one call so a consumer on another thread never sees a BPM from
/// one beat paired with the flags of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSnapshot {
    pub signal: u16,
    pub bpm: u16,
    pub ibi_ms: u16,
    pub inside_beat: bool,
    pub beat_pending: bool,
    pub threshold: u16,
    pub amplitude: u16,
    pub last_beat_time_ms: u32,
    pub sample_counter_ms: u32,
}

/// Peak/trough tracking heartbeat detector for PPG signals
///
/// Feed one raw sample per sampling period to [`ingest_sample`]. The detector
/// follows the peak and trough of each pulse wave, fires a beat when the signal
/// rises through the threshold, and re-centres the threshold at half the
/// amplitude of every completed cycle. With no beat for
/// `silence_timeout_ms` it falls back to its configured defaults.
///
/// The sample clock is a wrapping 32-bit millisecond counter; all elapsed time
/// is computed with wrapping subtraction, so it stays correct across overflow.
///
/// # Example
/// ```
/// use pulsemon::config::DetectorConfig;
/// use pulsemon::pulse::HeartRateMonitor;
///
/// let mut monitor = HeartRateMonitor::new(&DetectorConfig::default()).unwrap();
/// for _ in 0..12 {
///     for _ in 0..60 {
///         monitor.ingest_sample(1900);
///     }
///     for _ in 0..100 {
///         monitor.ingest_sample(1400);
///     }
/// }
/// assert_eq!(monitor.beats_per_minute(), 75);
/// ```
///
/// [`ingest_sample`]: HeartRateMonitor::ingest_sample
#[derive(Debug, Clone)]
pub struct HeartRateMonitor {
    config: DetectorConfig,
    signal: u16,
    bpm: u16,
    ibi: u16,
    pulse: bool,
    beat_flag: bool,
    thresh_setting: u16,
    thresh: u16,
    peak: u16,
    trough: u16,
    amp: u16,
    last_beat_time: u32,
    sample_counter: u32,
    time_since_last_beat: u32,
    rate_history: RateHistory,
    phase: StartupPhase,
    silence_timeouts: u64,
}

impl HeartRateMonitor {
    /// Create a monitor and seed it with `reset`
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        config.validate()?;

        let mut monitor = Self {
            config: config.clone(),
            signal: 0,
            bpm: 0,
            ibi: 0,
            pulse: false,
            beat_flag: false,
            thresh_setting: config.thresh_setting,
            thresh: config.thresh_setting,
            peak: 0,
            trough: 0,
            amp: 0,
            last_beat_time: 0,
            sample_counter: 0,
            time_since_last_beat: 0,
            rate_history: RateHistory::new(),
            phase: StartupPhase::default(),
            silence_timeouts: 0,
        };
        monitor.reset();
        Ok(monitor)
    }

    /// Re-seed every derived field to its startup default
    ///
    /// Keeps the current threshold setting and sample interval.
    pub fn reset(&mut self) {
        self.rate_history.clear();
        self.beat_flag = false;
        self.bpm = 0;
        self.ibi = self.config.initial_ibi_ms;
        self.pulse = false;
        self.sample_counter = 0;
        self.last_beat_time = 0;
        self.time_since_last_beat = 0;
        self.peak = self.config.mid_range;
        self.trough = self.config.mid_range;
        self.thresh = self.thresh_setting;
        self.amp = self.config.initial_amplitude;
        self.phase = StartupPhase::AwaitingFirstBeat;
    }

    /// Reset with a new threshold setting and sample interval
    ///
    /// The monitor is left untouched when the new values do not validate.
    pub fn reset_with(&mut self, thresh_setting: u16, sample_interval_ms: u32) -> Result<()> {
        let config = DetectorConfig {
            thresh_setting,
            sample_interval_ms,
            ..self.config.clone()
        };
        config.validate()?;

        self.config = config;
        self.thresh_setting = thresh_setting;
        self.reset();
        Ok(())
    }

    /// Replace both the baseline and the live threshold
    ///
    /// Peak and trough tracking in progress is left untouched.
    pub fn set_threshold(&mut self, threshold: u16) {
        self.thresh_setting = threshold;
        self.thresh = threshold;
    }

    /// Process one raw sample; call exactly once per sampling period
    ///
    /// Returns the beat when this sample completed a counted beat (the same
    /// event that raises the beat flag).
    pub fn ingest_sample(&mut self, raw: u16) -> Option<Beat> {
        self.signal = raw;
        self.sample_counter = self
            .sample_counter
            .wrapping_add(self.config.sample_interval_ms);
        self.time_since_last_beat = self.sample_counter.wrapping_sub(self.last_beat_time);
        let n = self.time_since_last_beat;

        // Wait 3/5 of the last IBI so the dicrotic notch is not taken as a trough
        let notch_window = u32::from(self.ibi) / 5 * 3;

        if self.signal < self.thresh && n > notch_window && self.signal < self.trough {
            self.trough = self.signal;
        }

        if self.signal > self.thresh && self.signal > self.peak {
            self.peak = self.signal;
        }

        let mut beat = None;

        if n > self.config.min_beat_interval_ms
            && self.signal > self.thresh
            && !self.pulse
            && n > notch_window
        {
            self.pulse = true;
            self.ibi = u16::try_from(n).unwrap_or(u16::MAX);
            self.last_beat_time = self.sample_counter;

            match self.phase {
                StartupPhase::AwaitingFirstBeat => {
                    self.phase = StartupPhase::AwaitingSecondBeat;
                    log::debug!(
                        "First beat at {}ms, discarding IBI {}ms",
                        self.sample_counter,
                        self.ibi
                    );
                    return None;
                }
                StartupPhase::AwaitingSecondBeat => {
                    self.phase = StartupPhase::Steady;
                    self.rate_history.seed(self.ibi);
                }
                StartupPhase::Steady => {}
            }

            self.rate_history.push(self.ibi);
            self.bpm = self.rate_history.beats_per_minute();
            self.beat_flag = true;

            log::debug!(
                "Beat at {}ms: IBI {}ms, {} BPM",
                self.sample_counter,
                self.ibi,
                self.bpm
            );

            beat = Some(Beat {
                ibi_ms: self.ibi,
                bpm: self.bpm,
                sample_time_ms: self.sample_counter,
                amplitude: self.amp,
            });
        }

        if self.signal < self.thresh && self.pulse {
            self.pulse = false;
            self.amp = self.peak.saturating_sub(self.trough);
            self.thresh = self.trough + self.amp / 2;
            self.peak = self.thresh;
            self.trough = self.thresh;
        }

        if n > self.config.silence_timeout_ms {
            if self.bpm != 0 {
                log::info!(
                    "No beat for {}ms, restoring threshold {}",
                    n,
                    self.thresh_setting
                );
            }
            self.recover_from_silence();
            beat = None;
        }

        beat
    }

    fn recover_from_silence(&mut self) {
        self.thresh = self.thresh_setting;
        self.peak = self.config.timeout_mid_range;
        self.trough = self.config.timeout_mid_range;
        self.last_beat_time = self.sample_counter;
        self.phase = StartupPhase::AwaitingFirstBeat;
        self.beat_flag = false;
        self.bpm = 0;
        self.ibi = self.config.timeout_ibi_ms;
        self.pulse = false;
        self.amp = self.config.initial_amplitude;
        self.silence_timeouts += 1;
    }

    pub fn latest_sample(&self) -> u16 {
        self.signal
    }

    /// Latest BPM estimate, 0 while no beat has been counted
    pub fn beats_per_minute(&self) -> u16 {
        self.bpm
    }

    pub fn inter_beat_interval_ms(&self) -> u16 {
        self.ibi
    }

    pub fn pulse_amplitude(&self) -> u16 {
        self.amp
    }

    /// Sample-clock time of the most recent beat (or timeout) in milliseconds
    pub fn last_beat_sample_time(&self) -> u32 {
        self.last_beat_time
    }

    /// Read and clear the "start of beat" flag
    pub fn poll_and_clear_beat_flag(&mut self) -> bool {
        std::mem::take(&mut self.beat_flag)
    }

    /// True while the signal is inside a beat (between rising and falling edge)
    pub fn is_inside_beat(&self) -> bool {
        self.pulse
    }

    pub fn threshold(&self) -> u16 {
        self.thresh
    }

    pub fn threshold_setting(&self) -> u16 {
        self.thresh_setting
    }

    pub fn peak(&self) -> u16 {
        self.peak
    }

    pub fn trough(&self) -> u16 {
        self.trough
    }

    pub fn sample_counter(&self) -> u32 {
        self.sample_counter
    }

    pub fn time_since_last_beat(&self) -> u32 {
        self.time_since_last_beat
    }

    pub fn sample_interval_ms(&self) -> u32 {
        self.config.sample_interval_ms
    }

    pub fn rate_history(&self) -> &RateHistory {
        &self.rate_history
    }

    pub fn startup_phase(&self) -> StartupPhase {
        self.phase
    }

    pub fn is_first_beat(&self) -> bool {
        self.phase.is_first_beat()
    }

    pub fn is_second_beat(&self) -> bool {
        self.phase.is_second_beat()
    }

    /// Number of silence timeouts since construction
    pub fn silence_timeouts(&self) -> u64 {
        self.silence_timeouts
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            signal: self.signal,
            bpm: self.bpm,
            ibi_ms: self.ibi,
            inside_beat: self.pulse,
            beat_pending: self.beat_flag,
            threshold: self.thresh,
            amplitude: self.amp,
            last_beat_time_ms: self.last_beat_time,
            sample_counter_ms: self.sample_counter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;

    fn monitor() -> HeartRateMonitor {
        HeartRateMonitor::new(&DetectorConfig::default()).unwrap()
    }

    /// One cycle of `high` for `high_samples`, then `low` for `low_samples`
    fn feed_cycle(
        m: &mut HeartRateMonitor,
        high: u16,
        high_samples: usize,
        low: u16,
        low_samples: usize,
    ) -> Vec<Beat> {
        let mut beats = Vec::new();
        for _ in 0..high_samples {
            beats.extend(m.ingest_sample(high));
        }
        for _ in 0..low_samples {
            beats.extend(m.ingest_sample(low));
        }
        beats
    }

    #[test]
    fn test_reset_defaults() {
        let m = monitor();
        assert_eq!(m.beats_per_minute(), 0);
        assert_eq!(m.inter_beat_interval_ms(), 750);
        assert_eq!(m.pulse_amplitude(), 100);
        assert_eq!(m.peak(), 1600);
        assert_eq!(m.trough(), 1600);
        assert_eq!(m.threshold(), 1650);
        assert_eq!(m.sample_counter(), 0);
        assert!(m.is_first_beat());
        assert!(!m.is_second_beat());
        assert!(!m.is_inside_beat());
        assert!(m.rate_history().as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_reset_with_rejects_zero_interval() {
        let mut m = monitor();
        assert!(m.reset_with(1700, 0).is_err());
        m.reset_with(1700, 2).unwrap();
        assert_eq!(m.threshold(), 1700);
        assert_eq!(m.threshold_setting(), 1700);
        m.ingest_sample(0);
        assert_eq!(m.sample_counter(), 2);
    }

    #[test]
    fn test_reset_with_rejects_threshold_above_full_scale() {
        let mut m = monitor();
        feed_cycle(&mut m, 1600, 10, 1600, 0);

        assert!(matches!(
            m.reset_with(5000, 5),
            Err(MonitorError::Config(_))
        ));
        assert_eq!(m.threshold_setting(), 1650);
        assert_eq!(m.sample_interval_ms(), 5);
        assert_eq!(m.sample_counter(), 50, "state kept on rejection");

        m.reset_with(4095, 5).unwrap();
        assert_eq!(m.threshold(), 4095);
    }

    #[test]
    fn test_sample_counter_advances_by_interval() {
        let mut m = monitor();
        for _ in 0..10 {
            m.ingest_sample(1000);
        }
        assert_eq!(m.sample_counter(), 50);
        assert_eq!(m.time_since_last_beat(), 50);
        assert_eq!(m.latest_sample(), 1000);
    }

    #[test]
    fn test_set_threshold_updates_live_and_baseline() {
        let mut m = monitor();
        m.set_threshold(2000);
        assert_eq!(m.threshold(), 2000);
        assert_eq!(m.threshold_setting(), 2000);
        assert_eq!(m.peak(), 1600, "peak tracking is unaffected");
    }

    #[test]
    fn test_first_beat_is_discarded() {
        let mut m = monitor();
        // 100 samples low (500ms), then rise
        let beats = feed_cycle(&mut m, 1600, 100, 1600, 0);
        assert!(beats.is_empty());

        let beats = feed_cycle(&mut m, 1800, 1, 1800, 0);
        assert!(beats.is_empty());
        assert!(m.is_inside_beat());
        assert!(m.is_second_beat());
        assert_eq!(m.inter_beat_interval_ms(), 505);
        assert_eq!(m.beats_per_minute(), 0);
        assert!(!m.poll_and_clear_beat_flag());
    }

    #[test]
    fn test_second_beat_seeds_history() {
        let mut m = monitor();
        // The first cycle is inside the minimum interval, the second is discarded
        feed_cycle(&mut m, 1800, 40, 1500, 80);
        feed_cycle(&mut m, 1800, 40, 1500, 80);
        assert!(m.is_second_beat());
        let beats = feed_cycle(&mut m, 1800, 40, 1500, 80);

        assert_eq!(beats.len(), 1);
        assert_eq!(beats[0].ibi_ms, 600);
        assert_eq!(beats[0].bpm, 100);
        assert!(m.rate_history().as_slice().iter().all(|&v| v == 600));
        assert_eq!(m.startup_phase(), StartupPhase::Steady);
    }

    #[test]
    fn test_falling_edge_recentres_threshold() {
        let mut m = monitor();
        feed_cycle(&mut m, 1600, 100, 1600, 0);
        for &s in &[1700, 1900, 2100, 2000] {
            m.ingest_sample(s);
        }
        assert!(m.is_inside_beat());
        assert_eq!(m.peak(), 2100);

        m.ingest_sample(1200);
        assert!(!m.is_inside_beat());
        // trough never moved below the 1600 seed while the notch window was closed
        assert_eq!(m.pulse_amplitude(), 2100 - 1600);
        assert_eq!(m.threshold(), 1600 + 250);
        assert_eq!(m.peak(), m.threshold());
        assert_eq!(m.trough(), m.threshold());
    }

    #[test]
    fn test_trough_waits_for_notch_window() {
        let mut m = monitor();
        // IBI 750 at reset: trough tracking opens after 450ms
        for _ in 0..90 {
            m.ingest_sample(1000);
        }
        assert_eq!(m.trough(), 1600);
        m.ingest_sample(1000);
        assert_eq!(m.trough(), 1000);
    }

    #[test]
    fn test_min_beat_interval_blocks_fast_retrigger() {
        let mut config = DetectorConfig::default();
        config.initial_ibi_ms = 100;
        let mut m = HeartRateMonitor::new(&config).unwrap();

        for _ in 0..50 {
            m.ingest_sample(1800);
        }
        // 250ms elapsed, gate requires strictly more
        assert!(!m.is_inside_beat());
        m.ingest_sample(1800);
        assert!(m.is_inside_beat());
    }

    #[test]
    fn test_silence_timeout_restores_defaults() {
        let mut m = monitor();
        for _ in 0..3 {
            feed_cycle(&mut m, 1800, 40, 1500, 80);
        }
        assert!(m.beats_per_minute() > 0);
        m.set_threshold(1700);
        m.poll_and_clear_beat_flag();

        for _ in 0..250 {
            m.ingest_sample(1000);
        }

        assert_eq!(m.beats_per_minute(), 0);
        assert_eq!(m.threshold(), 1700);
        assert_eq!(m.inter_beat_interval_ms(), 600);
        assert_eq!(m.pulse_amplitude(), 100);
        assert!(m.is_first_beat());
        assert!(!m.is_inside_beat());
        assert!(!m.poll_and_clear_beat_flag());
        assert_eq!(m.silence_timeouts(), 1);
    }

    #[test]
    fn test_timeout_uses_timeout_seed() {
        let mut config = DetectorConfig::default();
        config.timeout_mid_range = 512;
        let mut m = HeartRateMonitor::new(&config).unwrap();

        for _ in 0..241 {
            m.ingest_sample(1600);
        }
        assert_eq!(m.silence_timeouts(), 1);
        assert_eq!(m.last_beat_sample_time(), 1205);
        assert_eq!(m.peak(), 512);
        assert_eq!(m.trough(), 512);
    }

    #[test]
    fn test_elapsed_time_survives_counter_wrap() {
        let mut m = monitor();
        feed_cycle(&mut m, 1800, 40, 1500, 80);
        feed_cycle(&mut m, 1800, 40, 1500, 80);

        // Shift the clock so the next beat lands after the u32 wrap
        let offset = u32::MAX - 2 - m.sample_counter();
        m.sample_counter = m.sample_counter.wrapping_add(offset);
        m.last_beat_time = m.last_beat_time.wrapping_add(offset);

        let beats = feed_cycle(&mut m, 1800, 40, 1500, 80);
        assert!(m.sample_counter() < 1000, "counter wrapped");
        assert_eq!(beats.len(), 1);
        assert_eq!(beats[0].ibi_ms, 600);
        assert_eq!(beats[0].sample_time_ms, 2);
        assert_eq!(m.beats_per_minute(), 100);
        assert_eq!(m.silence_timeouts(), 0);
    }

    #[test]
    fn test_snapshot_matches_accessors() {
        let mut m = monitor();
        feed_cycle(&mut m, 1800, 40, 1500, 80);
        feed_cycle(&mut m, 1800, 40, 1500, 80);
        m.ingest_sample(1800);

        let snap = m.snapshot();
        assert_eq!(snap.bpm, m.beats_per_minute());
        assert_eq!(snap.ibi_ms, m.inter_beat_interval_ms());
        assert_eq!(snap.inside_beat, m.is_inside_beat());
        assert_eq!(snap.threshold, m.threshold());
        assert_eq!(snap.sample_counter_ms, m.sample_counter());
        assert!(snap.beat_pending);
    }
}
