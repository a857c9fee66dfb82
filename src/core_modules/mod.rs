pub mod background;
pub mod calibrator;
pub mod frame;
pub mod noise;
pub mod overlay;
pub mod region;
pub mod region_extractor;
pub mod touch_estimator;
