//! shadowgeo: Photo Geolocation from Shadow Geometry
//!
//! Given the ratio of a vertical object's height to its shadow length and the
//! capture time, this library scores a fixed global 0.5° grid by how well the
//! local sun elevation explains the shadow, summarises the scores into match
//! bands, estimates a best location, and intersects two photos.

pub mod types;
pub mod io;
pub mod core;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use types::{
    AnalysisResult, BandStatistics, BestLocationEstimate, CoordinateRange, GridPoint, IntersectionPoint,
    Scored, ShadowError, ShadowMeasurement, ShadowResult, TightBandRange, NIGHT_SENTINEL,
};

pub use io::{extract_measurement, parse_capture_time, ImageFrame, ImagePoint, ShadowMarkers};

pub use crate::core::{
    AnalysisRequest, AnalysisSession, BandClassifier, BandThresholds, GridScanner, IntersectionCombiner,
    IntersectionResult, LikelihoodBand, LocationEstimator, NoaaSolarPosition, PhotoSlot, SolarPositionProvider,
};
