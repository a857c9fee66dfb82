//! Error types for the touch pipeline.
//!
//! Only recoverable conditions live here. Mismatched frame dimensions are
//! programming errors and panic at the call site instead.

use std::fmt;

/// Result type alias using TouchError
pub type TouchResult<T> = Result<T, TouchError>;

/// Top-level error surfaced to callers of the pipelines.
#[derive(Debug, Clone, PartialEq)]
pub enum TouchError {
    /// The frame source could not deliver a frame
    Source(SourceError),
    /// The pipeline configuration was rejected
    Config(ConfigError),
    /// A worker of the parallel pipeline went away
    WorkerPool(String),
}

/// Upstream sensor failures reported by a `FrameSource`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// End of stream; no further frames will arrive
    Exhausted,
    /// The sensor is disconnected or otherwise unreachable
    Unavailable(String),
    /// The source delivers frames of a different size than the pipeline expects
    ResolutionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Reasons a `PipelineConfig` can be invalid.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Width or height is zero
    ZeroResolution { width: u32, height: u32 },
    /// The depth gain would erase every sample
    ZeroDepthGain,
    /// The 16-bit to 8-bit rescale factor is not a positive finite number
    InvalidIntensityScale(f32),
    /// The touch marker would not be visible
    ZeroMarkerRadius,
    /// The configuration file could not be read or parsed
    Parse(String),
}

impl fmt::Display for TouchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TouchError::Source(e) => write!(f, "Frame source error: {}", e),
            TouchError::Config(e) => write!(f, "Configuration error: {}", e),
            TouchError::WorkerPool(msg) => write!(f, "Worker pool error: {}", msg),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Exhausted => write!(f, "Frame source exhausted"),
            SourceError::Unavailable(msg) => write!(f, "Frame source unavailable: {}", msg),
            SourceError::ResolutionMismatch { expected, actual } => write!(
                f,
                "Frame source resolution {}x{} does not match configured {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroResolution { width, height } => {
                write!(f, "Resolution must be non-zero, got {}x{}", width, height)
            }
            ConfigError::ZeroDepthGain => write!(f, "Depth gain must be non-zero"),
            ConfigError::InvalidIntensityScale(scale) => {
                write!(f, "Intensity scale must be positive and finite, got {}", scale)
            }
            ConfigError::ZeroMarkerRadius => write!(f, "Marker radius must be non-zero"),
            ConfigError::Parse(msg) => write!(f, "Failed to parse configuration: {}", msg),
        }
    }
}

impl std::error::Error for TouchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TouchError::Source(e) => Some(e),
            TouchError::Config(e) => Some(e),
            TouchError::WorkerPool(_) => None,
        }
    }
}

impl std::error::Error for SourceError {}
impl std::error::Error for ConfigError {}

impl From<SourceError> for TouchError {
    fn from(err: SourceError) -> Self {
        TouchError::Source(err)
    }
}

impl From<ConfigError> for TouchError {
    fn from(err: ConfigError) -> Self {
        TouchError::Config(err)
    }
}
