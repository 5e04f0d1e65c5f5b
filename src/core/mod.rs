//! Shadow geolocation scoring engine

pub mod solar_position;
pub mod grid_scanner;
pub mod band_classifier;
pub mod location_estimator;
pub mod intersection;
pub mod session;

// Re-export main types
pub use solar_position::{SolarPositionProvider, NoaaSolarPosition, SolarEphemeris};
pub use grid_scanner::{GridScanner, ScanParams, AnalysisRequest, shadow_likelihood};
pub use band_classifier::{BandClassifier, BandThresholds, LikelihoodBand};
pub use location_estimator::{LocationEstimator, EstimatorParams};
pub use intersection::{IntersectionCombiner, IntersectionResult};
pub use session::{AnalysisSession, PhotoSlot, PhotoState};
