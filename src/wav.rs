use std::path::Path;

use hound::{WavSpec, WavWriter};

use crate::source::wav::from_adc_counts;

/// Write ADC samples as a mono 32-bit float WAV file
///
/// Counts are normalized so that `0` maps to -1.0 and `full_scale` to 1.0.
pub fn save_wav<P: AsRef<Path>>(
    path: P,
    samples: &[u16],
    sample_rate: u32,
    full_scale: u16,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;

    for &sample in samples {
        writer.write_sample(from_adc_counts(sample, full_scale))?;
    }

    writer.finalize()?;
    Ok(())
}
