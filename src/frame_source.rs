//! Frame acquisition seam.
//!
//! Real sensors live outside this crate. Anything that can hand over a depth
//! frame and its matching color frame implements `FrameSource`; the pipelines
//! only ever pull from it.

use crate::core_modules::frame::{DepthFrame, DepthSample};
use crate::error::SourceError;
use image::{Luma, Rgb, RgbImage};

/// One synchronized capture from the sensor.
#[derive(Debug, Clone)]
pub struct SensorFrame {
    pub depth: DepthFrame,
    pub color: RgbImage,
}

/// A producer of sensor frames.
///
/// `Ok(None)` means no frame is ready yet, which is a normal outcome. Errors
/// mean the stream is over or the device is gone.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<SensorFrame>, SourceError>;

    /// Width and height of every frame this source produces.
    fn resolution(&self) -> (u32, u32);
}

/// A generated scene: a flat floor, and after the first frame a disc-shaped
/// "foot" hovering slightly above it while sliding from left to right.
///
/// The first frame is always the empty floor so that lazy calibration picks it
/// up. After `frame_count` frames the source reports `SourceError::Exhausted`.
#[derive(Debug, Clone)]
pub struct SyntheticFloorSource {
    width: u32,
    height: u32,
    floor_depth: DepthSample,
    foot_elevation: DepthSample,
    foot_radius: u32,
    frame_count: u64,
    emitted: u64,
}

impl SyntheticFloorSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            floor_depth: 1000,
            foot_elevation: 60,
            foot_radius: 50,
            frame_count: 30,
            emitted: 0,
        }
    }

    /// Raw depth of the empty floor in sensor units.
    pub fn with_floor_depth(mut self, depth: DepthSample) -> Self {
        self.floor_depth = depth;
        self
    }

    /// Height of the foot above the floor in sensor units, and its radius in pixels.
    pub fn with_foot(mut self, elevation: DepthSample, radius: u32) -> Self {
        self.foot_elevation = elevation;
        self.foot_radius = radius;
        self
    }

    pub fn with_frame_count(mut self, frame_count: u64) -> Self {
        self.frame_count = frame_count;
        self
    }

    /// Where the foot is drawn in frame `index`, if it is drawn at all.
    pub fn foot_center(&self, index: u64) -> Option<(f64, f64)> {
        if index == 0 || index >= self.frame_count {
            return None;
        }
        let start = self.width as f64 / 4.0;
        let travel = self.width as f64 / 2.0;
        let progress = (index - 1) as f64 / (self.frame_count - 1).max(1) as f64;
        Some(((start + travel * progress).round(), (self.height as f64 / 2.0).round()))
    }

    fn render(&self, index: u64) -> SensorFrame {
        let foot = self.foot_center(index);
        let radius_sq = (self.foot_radius as f64).powi(2);
        let foot_depth = self.floor_depth.saturating_sub(self.foot_elevation);
        let inside = |x: u32, y: u32| match foot {
            Some((cx, cy)) => (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2) <= radius_sq,
            None => false,
        };

        let depth = DepthFrame::from_fn(self.width, self.height, |x, y| {
            Luma([if inside(x, y) { foot_depth } else { self.floor_depth }])
        });
        let color = RgbImage::from_fn(self.width, self.height, |x, y| {
            if inside(x, y) { Rgb([180, 120, 90]) } else { Rgb([90, 90, 90]) }
        });
        SensorFrame { depth, color }
    }
}

impl FrameSource for SyntheticFloorSource {
    fn next_frame(&mut self) -> Result<Option<SensorFrame>, SourceError> {
        if self.emitted >= self.frame_count {
            return Err(SourceError::Exhausted);
        }
        let frame = self.render(self.emitted);
        self.emitted += 1;
        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_is_empty_floor() {
        let mut source = SyntheticFloorSource::new(64, 48);
        let frame = source.next_frame().unwrap().unwrap();
        assert!(frame.depth.pixels().all(|p| p[0] == 1000));
        assert_eq!(frame.color.dimensions(), (64, 48));
    }

    #[test]
    fn foot_is_raised_above_floor() {
        let mut source = SyntheticFloorSource::new(200, 100).with_foot(60, 10);
        source.next_frame().unwrap();
        let frame = source.next_frame().unwrap().unwrap();
        let (cx, cy) = source.foot_center(1).unwrap();
        assert_eq!(frame.depth.get_pixel(cx as u32, cy as u32)[0], 940);
        assert_eq!(frame.depth.get_pixel(0, 0)[0], 1000);
    }

    #[test]
    fn foot_depth_follows_floor_depth() {
        let mut source = SyntheticFloorSource::new(200, 100)
            .with_floor_depth(1500)
            .with_foot(100, 10);
        source.next_frame().unwrap();
        let frame = source.next_frame().unwrap().unwrap();
        let (cx, cy) = source.foot_center(1).unwrap();
        assert_eq!(frame.depth.get_pixel(cx as u32, cy as u32)[0], 1400);
        assert_eq!(frame.depth.get_pixel(0, 0)[0], 1500);
        assert_eq!(source.resolution(), (200, 100));
    }

    #[test]
    fn ends_with_exhausted() {
        let mut source = SyntheticFloorSource::new(8, 8).with_frame_count(2);
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert_eq!(source.next_frame().unwrap_err(), SourceError::Exhausted);
    }
}
