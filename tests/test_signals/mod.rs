#![allow(dead_code)]

/// One pulse rising from `trough` through `peak` and back, then flat at `trough`
pub fn triangle_pulse(trough: u16, peak: u16, rise_samples: usize, rest_samples: usize) -> Vec<u16> {
    let step = (peak - trough) as f32 / rise_samples as f32;
    let mut samples: Vec<u16> = (0..=rise_samples)
        .map(|i| trough + (step * i as f32).round() as u16)
        .collect();
    samples.extend((0..rise_samples).rev().map(|i| trough + (step * i as f32).round() as u16));
    samples.extend(std::iter::repeat_n(trough, rest_samples));
    samples
}
