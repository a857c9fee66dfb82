// THEORY:
// The `frame` module holds the two raster types every other stage speaks and the
// single conversion between them. A depth sensor delivers one unsigned 16-bit
// distance sample per pixel; everything downstream (subtraction, thresholding,
// contour following, visualization) works on bounded 8-bit intensities.
//
// Key principles:
// 1.  **Plain buffers**: Both frames are `image::ImageBuffer`s so they interoperate
//     directly with `imageproc` and can be saved by any caller that wants to.
// 2.  **Two-step rescale**: The raw depth is first amplified with a saturating
//     integer gain and then linearly compressed into 0..=255. The two constants
//     are chosen so that the expected height of a foot above the floor lands in
//     the visible band; both are configurable.
// 3.  **Saturation, never wraparound**: Overflowing samples pin to the maximum of
//     their type at each step.

use image::{GrayImage, ImageBuffer, Luma};

pub type DepthSample = u16;
pub type Intensity = u8;

/// A fixed-size grid of raw depth samples, one per pixel.
pub type DepthFrame = ImageBuffer<Luma<DepthSample>, Vec<DepthSample>>;

/// A grid of 8-bit intensities derived from a `DepthFrame`.
pub type IntensityFrame = GrayImage;

/// Converts raw depth into the bounded intensity range.
///
/// Each sample is multiplied by `depth_gain` (saturating at `u16::MAX`), then
/// scaled by `intensity_scale`, rounded and clamped to `0..=255`.
pub fn to_intensity(depth: &DepthFrame, depth_gain: u16, intensity_scale: f32) -> IntensityFrame {
    let mut intensity = IntensityFrame::new(depth.width(), depth.height());
    for (dst, src) in intensity.pixels_mut().zip(depth.pixels()) {
        let amplified = src[0].saturating_mul(depth_gain);
        dst[0] = scale_to_intensity(amplified, intensity_scale);
    }
    intensity
}

fn scale_to_intensity(sample: DepthSample, scale: f32) -> Intensity {
    let scaled = (sample as f32 * scale).round();
    scaled.clamp(0.0, Intensity::MAX as f32) as Intensity
}

/// Creates a depth frame where every pixel holds the same sample.
pub fn uniform_depth(width: u32, height: u32, sample: DepthSample) -> DepthFrame {
    DepthFrame::from_pixel(width, height, Luma([sample]))
}

/// True when no pixel carries any intensity.
pub fn is_blank(frame: &IntensityFrame) -> bool {
    frame.as_raw().iter().all(|&v| v == 0)
}
