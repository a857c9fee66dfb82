// THEORY:
// This file is the entry point for the `floor_touch` library crate. It exposes
// the `TouchPipeline` (and its concurrent sibling `ParallelPipeline`) as the
// high-level interface: hand in depth frames, get back a visualization frame and
// at most one touch point per frame.
//
// The individual stages live in `core_modules` and are public so that callers
// can assemble their own variations, but a typical consumer only needs
// `pipeline`, `frame_source` and `error`.

pub mod core_modules;
pub mod error;
pub mod frame_source;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::noise::NoiseBounds;
pub use error::{ConfigError, SourceError, TouchError, TouchResult};
pub use frame_source::{FrameSource, SensorFrame, SyntheticFloorSource};
pub use parallel_pipeline::ParallelPipeline;
pub use pipeline::{FrameAnalysis, PipelineConfig, TouchPipeline, TouchPoint};
