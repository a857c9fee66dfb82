//! Integration tests for pipeline configuration

use floor_touch::{ConfigError, NoiseBounds, PipelineConfig};
use std::io::Write;

#[test]
fn test_config_default() {
    let config = PipelineConfig::default();

    assert_eq!((config.image_width, config.image_height), (640, 480));
    assert_eq!(config.noise_bounds, NoiseBounds::new(10, 50));
    assert_eq!(config.min_boundary_points, 100);
    assert_eq!(config.marker_radius, 20);
}

#[test]
fn test_config_round_trips_through_json_file() {
    let config = PipelineConfig {
        intensity_scale: 0.01,
        noise_bounds: NoiseBounds::new(12, 40),
        ..PipelineConfig::default()
    };

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{}", serde_json::to_string(&config).unwrap()).unwrap();

    let loaded = PipelineConfig::from_json_file(file.path()).expect("config should load");
    assert_eq!(loaded, config);
}

#[test]
fn test_config_missing_file_is_parse_error() {
    let result = PipelineConfig::from_json_file(std::path::Path::new("/nonexistent/floor_touch.json"));
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_config_validation_runs_on_load() {
    let result = PipelineConfig::from_json_str(r#"{ "marker_radius": 0 }"#);
    assert_eq!(result, Err(ConfigError::ZeroMarkerRadius));
}
