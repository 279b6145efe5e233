use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, bounded, tick};

use super::SampleSource;
use crate::error::{MonitorError, Result};

/// Replays another source in real time
///
/// A producer thread releases one sample per sampling period, paced by a
/// ticker, and hands it over a bounded channel. `next_chunk` blocks until at
/// least one sample is available and then returns whatever has accumulated,
/// up to `chunk_size` samples.
pub struct PacedSource {
    rx: Receiver<u16>,
    chunk_size: usize,
    sample_interval_ms: u32,
    _producer: JoinHandle<()>,
}

impl PacedSource {
    pub fn new<S: SampleSource + 'static>(mut inner: S, chunk_size: usize) -> Result<Self> {
        let sample_interval_ms = inner.sample_interval_ms();
        if sample_interval_ms == 0 {
            return Err(MonitorError::InvalidSampleInterval(sample_interval_ms));
        }

        let (tx, rx) = bounded(chunk_size.max(1) * 4);
        let period = Duration::from_millis(u64::from(sample_interval_ms));

        let producer = thread::Builder::new()
            .name("sampler".to_string())
            .spawn(move || {
                let ticker = tick(period);
                loop {
                    let chunk = match inner.next_chunk() {
                        Ok(Some(chunk)) => chunk,
                        Ok(None) => break,
                        Err(e) => {
                            log::error!("Sample source failed: {}", e);
                            break;
                        }
                    };
                    for sample in chunk {
                        if ticker.recv().is_err() || tx.send(sample).is_err() {
                            log::debug!("Sample receiver dropped");
                            return;
                        }
                    }
                }
                log::debug!("Sample source exhausted");
            })?;

        Ok(Self {
            rx,
            chunk_size: chunk_size.max(1),
            sample_interval_ms,
            _producer: producer,
        })
    }
}

impl SampleSource for PacedSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<u16>>> {
        let Ok(first) = self.rx.recv() else {
            return Ok(None);
        };

        let mut chunk = Vec::with_capacity(self.chunk_size);
        chunk.push(first);
        while chunk.len() < self.chunk_size {
            match self.rx.try_recv() {
                Ok(sample) => chunk.push(sample),
                Err(_) => break,
            }
        }
        Ok(Some(chunk))
    }

    fn sample_interval_ms(&self) -> u32 {
        self.sample_interval_ms
    }
}
