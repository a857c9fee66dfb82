// THEORY:
// Background subtraction is the comparative step of the pipeline: a pixel means
// nothing on its own, only its distance from the calibrated floor matters. The
// absolute difference removes the floor plane; a small integer gain stretches
// the remaining elevations so that the noise suppressor's thresholds sit in a
// useful part of the 8-bit range.

use crate::core_modules::calibrator::Baseline;
use crate::core_modules::frame::{Intensity, IntensityFrame};

pub const DEFAULT_CONTRAST_GAIN: u8 = 2;

/// Per-pixel `min(|current - baseline| * gain, 255)`.
///
/// # Panics
/// If `current` and the baseline differ in size.
pub fn subtract(current: &IntensityFrame, baseline: &Baseline, contrast_gain: u8) -> IntensityFrame {
    let reference = baseline.frame();
    assert_eq!(
        current.dimensions(),
        reference.dimensions(),
        "frame and baseline dimensions must match"
    );

    let mut delta = IntensityFrame::new(current.width(), current.height());
    for ((dst, cur), base) in delta.pixels_mut().zip(current.pixels()).zip(reference.pixels()) {
        dst[0] = amplified_delta(cur[0], base[0], contrast_gain);
    }
    delta
}

fn amplified_delta(current: Intensity, baseline: Intensity, gain: u8) -> Intensity {
    current.abs_diff(baseline).saturating_mul(gain)
}
