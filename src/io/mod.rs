//! Input conversion: marked image points and capture timestamps

pub mod measurement;
pub mod timestamp;

pub use measurement::{extract_measurement, ImageFrame, ImagePoint, ShadowMarkers};
pub use timestamp::{parse_capture_time, resolve_capture_fields};
