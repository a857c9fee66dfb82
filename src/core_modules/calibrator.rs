// THEORY:
// The `FloorCalibrator` owns the reference image of the empty floor. Every later
// frame is judged only by how far it deviates from this snapshot, so the
// calibrator is the one piece of state that survives from frame to frame.
//
// Key architectural principles:
// 1.  **Explicit ownership**: The baseline is a field of whichever pipeline owns
//     the calibrator. Independent pipelines calibrate independently.
// 2.  **Two states**: `Uninitialized` until a frame is captured, `Calibrated`
//     afterwards. There is no terminal state.
// 3.  **Lazy capture**: When asked to calibrate "if needed", the first frame seen
//     becomes the baseline. An explicit `clear` sends the calibrator back to
//     `Uninitialized` so that the next frame is captured again.

use crate::core_modules::frame::IntensityFrame;
use tracing::info;

/// Snapshot of the empty floor, in the same intensity space as processed frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    frame: IntensityFrame,
}

impl Baseline {
    pub fn capture(frame: IntensityFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &IntensityFrame {
        &self.frame
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }
}

/// Whether a baseline is currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Uninitialized,
    Calibrated,
}

/// Holds the session baseline and decides when to (re)capture it.
#[derive(Debug, Default)]
pub struct FloorCalibrator {
    baseline: Option<Baseline>,
}

impl FloorCalibrator {
    pub fn new() -> Self {
        Self { baseline: None }
    }

    pub fn state(&self) -> CalibrationState {
        match self.baseline {
            Some(_) => CalibrationState::Calibrated,
            None => CalibrationState::Uninitialized,
        }
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    /// Unconditionally stores `frame` as the new baseline.
    pub fn calibrate(&mut self, frame: &IntensityFrame) -> &Baseline {
        self.baseline = None;
        self.ensure_calibrated(frame).0
    }

    /// Captures `frame` only when no baseline is held yet.
    /// Returns true when this call performed the capture.
    pub fn calibrate_if_needed(&mut self, frame: &IntensityFrame) -> bool {
        self.ensure_calibrated(frame).1
    }

    /// Returns the baseline, capturing `frame` first if there is none.
    /// The flag reports whether the capture happened in this call.
    pub fn ensure_calibrated(&mut self, frame: &IntensityFrame) -> (&Baseline, bool) {
        let captured = self.baseline.is_none();
        let baseline = self.baseline.get_or_insert_with(|| {
            let (width, height) = frame.dimensions();
            info!(width, height, "Captured floor baseline");
            Baseline::capture(frame.clone())
        });
        (baseline, captured)
    }

    /// Drops the baseline; the next `calibrate_if_needed` captures a fresh one.
    pub fn clear(&mut self) {
        if self.baseline.take().is_some() {
            info!("Floor baseline cleared, recalibrating on next frame");
        }
    }
}
