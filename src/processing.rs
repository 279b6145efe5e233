use crate::config::MonitorConfig;
use crate::error::Result;
use crate::output::{BeatReport, ReportEvent};
use crate::pulse::{HeartRateMonitor, MonitorSnapshot, RefractoryGate};
use crate::source::SampleSource;

/// Running totals for one processing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub samples: u64,
    pub beats_detected: u64,
    pub beats_reported: u64,
    pub beats_suppressed: u64,
    pub silence_timeouts: u64,
    pub sessions: u64,
}

/// Drives a [`HeartRateMonitor`] and turns its beat flag into report events
///
/// Reporting is split into fixed-length sessions framed by start and end
/// events. Within a session, a detected beat is reported only when the
/// refractory gate is open.
pub struct PulseProcessor {
    monitor: HeartRateMonitor,
    gate: RefractoryGate,
    window_samples: u64,
    window_position: u64,
    session: u64,
    elapsed_ms: u64,
    sample_interval_ms: u32,
    stats: ProcessingStats,
}

impl PulseProcessor {
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        config.validate()?;
        let sample_interval_ms = config.detector.sample_interval_ms;

        Ok(Self {
            monitor: HeartRateMonitor::new(&config.detector)?,
            gate: RefractoryGate::new(config.report.refractory_samples),
            window_samples: config.report.window_samples(sample_interval_ms).max(1),
            window_position: 0,
            session: 0,
            elapsed_ms: 0,
            sample_interval_ms,
            stats: ProcessingStats::default(),
        })
    }

    /// Process one sample, appending any resulting events to `events`
    pub fn process_sample(&mut self, sample: u16, events: &mut Vec<ReportEvent>) {
        if self.window_position == 0 {
            self.session += 1;
            self.stats.sessions += 1;
            log::debug!("Session {} started at {}ms", self.session, self.elapsed_ms);
            events.push(ReportEvent::SessionStart {
                session: self.session,
                elapsed_ms: self.elapsed_ms,
            });
        }

        let timeouts_before = self.monitor.silence_timeouts();
        self.monitor.ingest_sample(sample);
        self.elapsed_ms += u64::from(self.sample_interval_ms);
        self.stats.samples += 1;
        self.stats.silence_timeouts += self.monitor.silence_timeouts() - timeouts_before;

        if self.monitor.poll_and_clear_beat_flag() {
            self.stats.beats_detected += 1;
            if self.gate.try_pass() {
                self.stats.beats_reported += 1;
                events.push(ReportEvent::Beat(BeatReport {
                    session: self.session,
                    elapsed_ms: self.elapsed_ms,
                    ibi_ms: self.monitor.inter_beat_interval_ms(),
                    bpm: self.monitor.beats_per_minute(),
                    amplitude: self.monitor.pulse_amplitude(),
                }));
            } else {
                self.stats.beats_suppressed += 1;
                log::trace!("Beat at {}ms inside refractory period", self.elapsed_ms);
            }
        }
        self.gate.tick();

        self.window_position += 1;
        if self.window_position == self.window_samples {
            log::debug!("Session {} ended at {}ms", self.session, self.elapsed_ms);
            events.push(ReportEvent::SessionEnd {
                session: self.session,
                elapsed_ms: self.elapsed_ms,
            });
            self.window_position = 0;
        }
    }

    pub fn process_samples(&mut self, samples: &[u16]) -> Vec<ReportEvent> {
        let mut events = Vec::new();
        for &sample in samples {
            self.process_sample(sample, &mut events);
        }
        events
    }

    /// Pull every chunk from `source` and forward the events to `sink`
    pub fn run<S, F>(&mut self, source: &mut S, mut sink: F) -> Result<()>
    where
        S: SampleSource + ?Sized,
        F: FnMut(&ReportEvent),
    {
        if source.sample_interval_ms() != self.sample_interval_ms {
            log::warn!(
                "Source delivers samples every {}ms but the detector expects {}ms",
                source.sample_interval_ms(),
                self.sample_interval_ms
            );
        }

        let mut events = Vec::new();
        while let Some(chunk) = source.next_chunk()? {
            for sample in chunk {
                self.process_sample(sample, &mut events);
                for event in events.drain(..) {
                    sink(&event);
                }
            }
        }
        Ok(())
    }

    /// Stop acquisition, returning the final marker event
    pub fn finish(&mut self) -> ReportEvent {
        self.window_position = 0;
        self.gate.reset();
        ReportEvent::Stopped {
            elapsed_ms: self.elapsed_ms,
        }
    }

    pub fn monitor(&self) -> &HeartRateMonitor {
        &self.monitor
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.monitor.snapshot()
    }

    pub fn stats(&self) -> ProcessingStats {
        self.stats
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_framing() {
        let mut config = MonitorConfig::default();
        config.report.window_secs = 1;
        let mut processor = PulseProcessor::new(&config).unwrap();

        let events = processor.process_samples(&[1600; 450]);
        assert_eq!(
            events,
            vec![
                ReportEvent::SessionStart {
                    session: 1,
                    elapsed_ms: 0
                },
                ReportEvent::SessionEnd {
                    session: 1,
                    elapsed_ms: 1000
                },
                ReportEvent::SessionStart {
                    session: 2,
                    elapsed_ms: 1000
                },
                ReportEvent::SessionEnd {
                    session: 2,
                    elapsed_ms: 2000
                },
                ReportEvent::SessionStart {
                    session: 3,
                    elapsed_ms: 2000
                },
            ]
        );
        assert_eq!(processor.stats().sessions, 3);
        assert_eq!(processor.stats().silence_timeouts, 1);
        assert_eq!(
            processor.finish(),
            ReportEvent::Stopped { elapsed_ms: 2250 }
        );
    }
}
