pub mod file;
pub mod paced;
pub mod wav;

pub use file::{MemorySource, TextFileSource};
pub use paced::PacedSource;
pub use wav::WavFileSource;

use crate::error::Result;

/// A producer of raw ADC samples at a fixed sampling period
pub trait SampleSource: Send {
    /// Next block of samples, or `None` once the source is exhausted
    fn next_chunk(&mut self) -> Result<Option<Vec<u16>>>;

    /// Period between consecutive samples in milliseconds
    fn sample_interval_ms(&self) -> u32;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_chunk(&mut self) -> Result<Option<Vec<u16>>> {
        (**self).next_chunk()
    }

    fn sample_interval_ms(&self) -> u32 {
        (**self).sample_interval_ms()
    }
}

/// Drain a source into a single vector
pub fn read_all<S: SampleSource + ?Sized>(source: &mut S) -> Result<Vec<u16>> {
    let mut samples = Vec::new();
    while let Some(chunk) = source.next_chunk()? {
        samples.extend(chunk);
    }
    Ok(samples)
}
