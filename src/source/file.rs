use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::SampleSource;
use crate::error::{MonitorError, Result};

/// In-memory samples handed out in fixed-size chunks
pub struct MemorySource {
    samples: Vec<u16>,
    position: usize,
    chunk_size: usize,
    sample_interval_ms: u32,
}

impl MemorySource {
    pub fn new(samples: Vec<u16>, sample_interval_ms: u32, chunk_size: usize) -> Self {
        Self {
            samples,
            position: 0,
            chunk_size: chunk_size.max(1),
            sample_interval_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleSource for MemorySource {
    fn next_chunk(&mut self) -> Result<Option<Vec<u16>>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }

        let end = (self.position + self.chunk_size).min(self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(Some(chunk))
    }

    fn sample_interval_ms(&self) -> u32 {
        self.sample_interval_ms
    }
}

/// Samples stored as text, one value per line
///
/// Only the first comma-separated column is used, so CSV captures with extra
/// columns load directly. Blank lines and lines starting with `#` are skipped.
/// Values are clamped to `0..=full_scale`.
pub struct TextFileSource {
    inner: MemorySource,
}

impl TextFileSource {
    pub fn new<P: AsRef<Path>>(
        path: P,
        sample_interval_ms: u32,
        chunk_size: usize,
        full_scale: u16,
    ) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let source =
            Self::from_reader(BufReader::new(file), sample_interval_ms, chunk_size, full_scale)?;
        log::info!(
            "Loaded {} samples from {}",
            source.inner.len(),
            path.as_ref().display()
        );
        Ok(source)
    }

    pub fn from_reader<R: BufRead>(
        reader: R,
        sample_interval_ms: u32,
        chunk_size: usize,
        full_scale: u16,
    ) -> Result<Self> {
        let mut samples = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let field = line.split(',').next().unwrap_or("").trim();
            if field.is_empty() || field.starts_with('#') {
                continue;
            }

            let value: i64 = field.parse().map_err(|_| MonitorError::Parse {
                line: index + 1,
                message: format!("invalid sample value '{}'", field),
            })?;
            samples.push(value.clamp(0, i64::from(full_scale)) as u16);
        }

        Ok(Self {
            inner: MemorySource::new(samples, sample_interval_ms, chunk_size),
        })
    }
}

impl SampleSource for TextFileSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<u16>>> {
        self.inner.next_chunk()
    }

    fn sample_interval_ms(&self) -> u32 {
        self.inner.sample_interval_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::read_all;
    use std::io::Cursor;

    #[test]
    fn test_memory_source_chunks() {
        let mut source = MemorySource::new((0..10).collect(), 5, 4);
        assert_eq!(source.next_chunk().unwrap(), Some(vec![0, 1, 2, 3]));
        assert_eq!(source.next_chunk().unwrap(), Some(vec![4, 5, 6, 7]));
        assert_eq!(source.next_chunk().unwrap(), Some(vec![8, 9]));
        assert_eq!(source.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_text_source_parses_columns_and_comments() {
        let text = "# capture\n1600\n\n1700, 12.5\n  1800  \n";
        let mut source = TextFileSource::from_reader(Cursor::new(text), 5, 16, 4095).unwrap();
        assert_eq!(read_all(&mut source).unwrap(), vec![1600, 1700, 1800]);
        assert_eq!(source.sample_interval_ms(), 5);
    }

    #[test]
    fn test_text_source_clamps_to_adc_range() {
        let text = "-20\n5000\n";
        let mut source = TextFileSource::from_reader(Cursor::new(text), 5, 16, 4095).unwrap();
        assert_eq!(read_all(&mut source).unwrap(), vec![0, 4095]);
    }

    #[test]
    fn test_text_source_reports_line_number() {
        let text = "1600\n1700\nabc\n";
        let result = TextFileSource::from_reader(Cursor::new(text), 5, 16, 4095);
        match result {
            Err(MonitorError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }
}
