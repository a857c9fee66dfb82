// THEORY:
// The `pipeline` module is the top-level API of the touch engine. It owns the
// only cross-frame state (the floor baseline and the current noise band) and
// runs the stages in a fixed order once per depth frame:
//
//   depth -> intensity -> calibrate-if-needed -> subtract -> band-pass
//         -> regions -> dominant region -> touch point -> visualization
//
// `TouchPipeline` is strictly frame-synchronous: `process` takes `&mut self`,
// performs no I/O and finishes before the next frame can be handed in. The
// stateless middle of the pipeline lives in `detect_touch` so that the parallel
// pipeline can run exactly the same stages on its workers.

use crate::core_modules::background::{self, DEFAULT_CONTRAST_GAIN};
use crate::core_modules::calibrator::{Baseline, CalibrationState, FloorCalibrator};
use crate::core_modules::frame;
use crate::core_modules::noise::{self, NoiseBounds};
use crate::core_modules::overlay::{self, MarkerStyle};
use crate::core_modules::region_extractor::region_extractor;
use crate::core_modules::touch_estimator::{self, DEFAULT_MIN_BOUNDARY_POINTS};
use crate::error::{ConfigError, SourceError, TouchResult};
use crate::frame_source::FrameSource;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, trace};

// Re-export key data structures for the public API.
pub use crate::core_modules::frame::{DepthFrame, IntensityFrame};
pub use crate::core_modules::touch_estimator::{Ellipse, TouchPoint};

/// Configuration for the touch pipeline. Every numeric constant of the
/// detection chain is tunable here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub image_width: u32,
    pub image_height: u32,
    /// Saturating integer gain applied to raw depth samples.
    pub depth_gain: u16,
    /// Linear factor from amplified depth to the 0..=255 intensity range.
    pub intensity_scale: f32,
    /// Gain applied to the absolute difference against the baseline.
    pub contrast_gain: u8,
    pub noise_bounds: NoiseBounds,
    /// A region must have strictly more boundary pixels than this to count.
    pub min_boundary_points: usize,
    pub marker_radius: u32,
    pub marker_intensity: u8,
    pub marker_thickness: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let marker = MarkerStyle::default();
        Self {
            image_width: 640,
            image_height: 480,
            depth_gain: 32,
            intensity_scale: 0.006,
            contrast_gain: DEFAULT_CONTRAST_GAIN,
            noise_bounds: NoiseBounds::default(),
            min_boundary_points: DEFAULT_MIN_BOUNDARY_POINTS,
            marker_radius: marker.radius,
            marker_intensity: marker.intensity,
            marker_thickness: marker.thickness,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(ConfigError::ZeroResolution {
                width: self.image_width,
                height: self.image_height,
            });
        }
        if self.depth_gain == 0 {
            return Err(ConfigError::ZeroDepthGain);
        }
        if !self.intensity_scale.is_finite() || self.intensity_scale <= 0.0 {
            return Err(ConfigError::InvalidIntensityScale(self.intensity_scale));
        }
        if self.marker_radius == 0 {
            return Err(ConfigError::ZeroMarkerRadius);
        }
        Ok(())
    }

    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn marker_style(&self) -> MarkerStyle {
        MarkerStyle {
            radius: self.marker_radius,
            intensity: self.marker_intensity,
            thickness: self.marker_thickness,
        }
    }
}

/// Everything the pipeline produced for one frame.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    /// Zero-based position of the frame in this pipeline's stream.
    pub frame_index: u64,
    /// The band-passed difference image with the touch marker drawn on it.
    pub visualization: IntensityFrame,
    pub touch: Option<TouchPoint>,
    /// True when this frame was captured as the floor baseline.
    pub calibrated: bool,
}

impl FrameAnalysis {
    pub fn into_parts(self) -> (IntensityFrame, Option<TouchPoint>) {
        (self.visualization, self.touch)
    }
}

/// A processed frame together with the color image captured alongside it.
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    pub color: RgbImage,
    pub analysis: FrameAnalysis,
}

/// Runs subtraction through visualization for one intensity frame.
pub fn detect_touch(
    intensity: &IntensityFrame,
    baseline: &Baseline,
    bounds: NoiseBounds,
    config: &PipelineConfig,
) -> (IntensityFrame, Option<TouchPoint>) {
    let mut working = background::subtract(intensity, baseline, config.contrast_gain);
    noise::threshold_in_place(&mut working, bounds);

    let dominant = region_extractor::select_dominant(region_extractor::extract_regions(&working));
    let touch = match dominant {
        Some(region) => {
            let touch = touch_estimator::estimate(&region, config.min_boundary_points);
            if touch.is_none() {
                trace!(points = region.point_count(), "Dominant region rejected as noise");
            }
            touch
        }
        None => {
            trace!("No foreground regions");
            None
        }
    };

    if let Some(touch) = &touch {
        overlay::draw_touch_marker(&mut working, touch, config.marker_style());
    }
    (working, touch)
}

/// The main, frame-synchronous touch detection engine.
pub struct TouchPipeline {
    config: PipelineConfig,
    calibrator: FloorCalibrator,
    noise_bounds: NoiseBounds,
    frames_processed: u64,
}

impl TouchPipeline {
    pub fn new(config: PipelineConfig) -> TouchResult<Self> {
        config.validate()?;
        Ok(Self {
            noise_bounds: config.noise_bounds,
            config,
            calibrator: FloorCalibrator::new(),
            frames_processed: 0,
        })
    }

    /// Runs every stage on one depth frame. Always yields a visualization.
    ///
    /// # Panics
    /// If `depth` does not have the configured resolution.
    pub fn process(&mut self, depth: &DepthFrame) -> FrameAnalysis {
        assert_eq!(
            depth.dimensions(),
            (self.config.image_width, self.config.image_height),
            "depth frame dimensions must match the configured resolution"
        );

        let intensity = frame::to_intensity(depth, self.config.depth_gain, self.config.intensity_scale);
        let (baseline, calibrated) = self.calibrator.ensure_calibrated(&intensity);
        let (visualization, touch) = detect_touch(&intensity, baseline, self.noise_bounds, &self.config);

        let frame_index = self.frames_processed;
        self.frames_processed += 1;

        if let Some(touch) = &touch {
            debug!(
                frame_index,
                x = touch.x,
                y = touch.y,
                boundary_points = touch.boundary_points,
                "Touch detected"
            );
        }

        FrameAnalysis {
            frame_index,
            visualization,
            touch,
            calibrated,
        }
    }

    /// Pulls one frame from `source` and processes it.
    /// `Ok(None)` when the source has nothing ready yet.
    pub fn process_next<S>(&mut self, source: &mut S) -> TouchResult<Option<ProcessedFrame>>
    where
        S: FrameSource + ?Sized,
    {
        self.check_source(source)?;
        let Some(frame) = source.next_frame()? else {
            trace!("Frame source has no frame ready");
            return Ok(None);
        };
        let analysis = self.process(&frame.depth);
        Ok(Some(ProcessedFrame {
            color: frame.color,
            analysis,
        }))
    }

    /// Rejects a source whose frames would not fit the configured resolution.
    pub fn check_source<S>(&self, source: &S) -> Result<(), SourceError>
    where
        S: FrameSource + ?Sized,
    {
        let expected = (self.config.image_width, self.config.image_height);
        let actual = source.resolution();
        if actual != expected {
            return Err(SourceError::ResolutionMismatch { expected, actual });
        }
        Ok(())
    }

    /// Forgets the baseline; the next processed frame becomes the new one.
    pub fn recalibrate(&mut self) {
        self.calibrator.clear();
    }

    /// Replaces the band-pass thresholds used from the next frame on.
    pub fn reset(&mut self, bounds: NoiseBounds) {
        info!(lower = bounds.lower, upper = bounds.upper, "Noise bounds reset");
        self.noise_bounds = bounds;
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.calibrator.state()
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.calibrator.baseline()
    }

    pub fn noise_bounds(&self) -> NoiseBounds {
        self.noise_bounds
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::frame::{is_blank, uniform_depth};
    use crate::error::TouchError;
    use crate::frame_source::{FrameSource, SyntheticFloorSource};

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            image_width: 160,
            image_height: 120,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(PipelineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let zero = PipelineConfig { image_width: 0, ..PipelineConfig::default() };
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroResolution { .. })));

        let nan = PipelineConfig { intensity_scale: f32::NAN, ..PipelineConfig::default() };
        assert!(matches!(
            TouchPipeline::new(nan),
            Err(TouchError::Config(ConfigError::InvalidIntensityScale(_)))
        ));
    }

    #[test]
    fn json_config_fills_missing_fields_with_defaults() {
        let config = PipelineConfig::from_json_str(
            r#"{ "image_width": 320, "image_height": 240, "noise_bounds": { "lower": 5, "upper": 60 } }"#,
        )
        .unwrap();
        assert_eq!(config.image_width, 320);
        assert_eq!(config.noise_bounds, NoiseBounds::new(5, 60));
        assert_eq!(config.depth_gain, 32);
        assert_eq!(config.min_boundary_points, 100);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            PipelineConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn first_frame_calibrates_lazily() {
        let mut pipeline = TouchPipeline::new(small_config()).unwrap();
        assert_eq!(pipeline.calibration_state(), CalibrationState::Uninitialized);

        let analysis = pipeline.process(&uniform_depth(160, 120, 1000));
        assert!(analysis.calibrated);
        assert_eq!(analysis.frame_index, 0);
        assert!(is_blank(&analysis.visualization));
        assert_eq!(analysis.touch, None);
        assert_eq!(pipeline.calibration_state(), CalibrationState::Calibrated);

        let second = pipeline.process(&uniform_depth(160, 120, 1000));
        assert!(!second.calibrated);
        assert_eq!(second.frame_index, 1);
    }

    #[test]
    fn reset_changes_bounds_for_following_frames() {
        let mut pipeline = TouchPipeline::new(small_config()).unwrap();
        pipeline.reset(NoiseBounds::new(0, 255));
        assert_eq!(pipeline.noise_bounds(), NoiseBounds::new(0, 255));
    }

    #[test]
    #[should_panic(expected = "configured resolution")]
    fn wrong_resolution_panics() {
        let mut pipeline = TouchPipeline::new(small_config()).unwrap();
        pipeline.process(&uniform_depth(640, 480, 1000));
    }

    #[test]
    fn synthetic_source_drives_the_pipeline_until_exhausted() {
        let mut source = SyntheticFloorSource::new(160, 120)
            .with_foot(60, 30)
            .with_frame_count(4);
        let mut pipeline = TouchPipeline::new(small_config()).unwrap();

        let first = pipeline.process_next(&mut source).unwrap().unwrap();
        assert!(first.analysis.calibrated);
        assert_eq!(first.analysis.touch, None);
        assert_eq!(first.color.dimensions(), (160, 120));

        for index in 1..4 {
            let frame = pipeline.process_next(&mut source).unwrap().unwrap();
            let touch = frame.analysis.touch.expect("foot should be detected");
            let (cx, cy) = source.foot_center(index).unwrap();
            assert!((touch.x - cx).abs() < 1.0, "x {} vs {}", touch.x, cx);
            assert!((touch.y - cy).abs() < 1.0, "y {} vs {}", touch.y, cy);
        }

        assert_eq!(
            pipeline.process_next(&mut source).unwrap_err(),
            TouchError::Source(SourceError::Exhausted)
        );
    }

    #[test]
    fn source_with_other_resolution_is_rejected_before_pulling() {
        let mut source = SyntheticFloorSource::new(320, 240).with_frame_count(1);
        let mut pipeline = TouchPipeline::new(small_config()).unwrap();

        assert_eq!(
            pipeline.process_next(&mut source).unwrap_err(),
            TouchError::Source(SourceError::ResolutionMismatch {
                expected: (160, 120),
                actual: (320, 240),
            })
        );
        assert_eq!(pipeline.frames_processed(), 0);
        // The frame was left in the source.
        assert!(source.next_frame().unwrap().is_some());
    }
}
