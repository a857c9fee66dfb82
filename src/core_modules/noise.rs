// THEORY:
// The noise suppressor is a band-pass on elevation. After subtraction, small
// values are sensor jitter around the floor plane and large values are things
// that are clearly not touching it (a leg mid-stride, glare, a passing object).
// Only the band in between is kept.
//
// Two cuts decide whether a pixel survives:
// 1.  **Upper cut**: pixels strictly above `upper` are zeroed, not clamped.
// 2.  **Lower cut**: pixels at or below `lower` are zeroed.
// The surviving band is `(lower, upper]`. Both cuts only ever write zero, so
// one pass with `NoiseBounds::passes` is the same as running them in turn.
// With inverted bounds nothing survives.

use crate::core_modules::frame::{Intensity, IntensityFrame};
use serde::{Deserialize, Serialize};

/// Thresholds of the band-pass, on the 8-bit intensity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseBounds {
    pub lower: Intensity,
    pub upper: Intensity,
}

impl NoiseBounds {
    pub const fn new(lower: Intensity, upper: Intensity) -> Self {
        Self { lower, upper }
    }

    /// True when a pixel of this value survives both cuts.
    pub fn passes(&self, value: Intensity) -> bool {
        value <= self.upper && value > self.lower
    }
}

impl Default for NoiseBounds {
    fn default() -> Self {
        Self::new(10, 50)
    }
}

/// Returns a copy of `frame` with everything outside the band zeroed.
pub fn threshold(frame: &IntensityFrame, bounds: NoiseBounds) -> IntensityFrame {
    let mut out = frame.clone();
    threshold_in_place(&mut out, bounds);
    out
}

/// Band-pass applied directly to `frame`.
pub fn threshold_in_place(frame: &mut IntensityFrame, bounds: NoiseBounds) {
    for value in frame.iter_mut() {
        if !bounds.passes(*value) {
            *value = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn ramp() -> IntensityFrame {
        IntensityFrame::from_fn(256, 1, |x, _| Luma([x as u8]))
    }

    #[test]
    fn default_band_keeps_eleven_through_fifty() {
        let out = threshold(&ramp(), NoiseBounds::default());
        for (x, pixel) in out.enumerate_pixels().map(|(x, _, p)| (x, p)) {
            let expected = if (11..=50).contains(&x) { x as u8 } else { 0 };
            assert_eq!(pixel[0], expected, "value {}", x);
        }
    }

    #[test]
    fn is_idempotent() {
        let bounds = NoiseBounds::new(30, 200);
        let once = threshold(&ramp(), bounds);
        let twice = threshold(&once, bounds);
        assert_eq!(once, twice);
    }

    #[test]
    fn large_elevations_are_clipped_to_zero_not_clamped() {
        let frame = IntensityFrame::from_pixel(3, 3, Luma([80]));
        let out = threshold(&frame, NoiseBounds::default());
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn inverted_bounds_suppress_everything() {
        let out = threshold(&ramp(), NoiseBounds::new(50, 10));
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn passes_agrees_with_threshold() {
        let bounds = NoiseBounds::new(10, 50);
        let frame = ramp();
        let out = threshold(&frame, bounds);
        for (before, after) in frame.pixels().zip(out.pixels()) {
            let expected = if bounds.passes(before[0]) { before[0] } else { 0 };
            assert_eq!(after[0], expected);
        }
        assert!(!bounds.passes(10));
        assert!(bounds.passes(11));
        assert!(bounds.passes(50));
        assert!(!bounds.passes(51));
    }
}
