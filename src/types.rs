use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Likelihood value marking a grid point where the sun is at or below the horizon
pub const NIGHT_SENTINEL: f64 = -1.0;

/// Southernmost sampled latitude (degrees)
pub const GRID_LAT_MIN: f64 = -60.0;
/// Northernmost sampled latitude (degrees, inclusive)
pub const GRID_LAT_MAX: f64 = 84.5;
/// Westernmost sampled longitude (degrees)
pub const GRID_LNG_MIN: f64 = -180.0;
/// Easternmost sampled longitude (degrees, inclusive)
pub const GRID_LNG_MAX: f64 = 179.5;
/// Grid spacing in both axes (degrees)
pub const GRID_STEP_DEG: f64 = 0.5;
/// Number of latitude rows
pub const GRID_LAT_SAMPLES: usize = 290;
/// Number of longitude columns
pub const GRID_LNG_SAMPLES: usize = 720;
/// Total number of points in one scan
pub const GRID_POINT_COUNT: usize = GRID_LAT_SAMPLES * GRID_LNG_SAMPLES;

/// Latitude of grid row `row`
pub fn grid_lat(row: usize) -> f64 {
    GRID_LAT_MIN + row as f64 * GRID_STEP_DEG
}

/// Longitude of grid column `col`
pub fn grid_lng(col: usize) -> f64 {
    GRID_LNG_MIN + col as f64 * GRID_STEP_DEG
}

/// Index of `value` along a grid axis, `None` off the axis or between nodes
fn grid_index(value: f64, min: f64, max: f64) -> Option<usize> {
    if !value.is_finite() || value < min || value > max {
        return None;
    }
    let steps = (value - min) / GRID_STEP_DEG;
    let index = steps.round();
    if (steps - index).abs() > 1e-9 {
        return None;
    }
    Some(index as usize)
}

/// Anything carrying a coordinate and a likelihood score.
///
/// Implemented by scan points and intersection points so the estimator and
/// band logic can run over either.
pub trait Scored {
    fn lat(&self) -> f64;
    fn lng(&self) -> f64;
    fn likelihood(&self) -> f64;

    /// True when the point is a night point rather than a scored candidate
    fn is_night(&self) -> bool {
        self.likelihood() == NIGHT_SENTINEL
    }
}

/// One sample of the global grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub lat: f64,
    pub lng: f64,
    /// Absolute relative shadow-length error, or `NIGHT_SENTINEL`
    pub likelihood: f64,
}

impl Scored for GridPoint {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lng(&self) -> f64 {
        self.lng
    }
    fn likelihood(&self) -> f64 {
        self.likelihood
    }
}

/// Object height and shadow length in a shared linear unit (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowMeasurement {
    pub object_height: f64,
    pub shadow_length: f64,
}

impl ShadowMeasurement {
    pub fn new(object_height: f64, shadow_length: f64) -> Self {
        Self {
            object_height,
            shadow_length,
        }
    }

    /// Reject measurements that cannot describe a real shadow
    pub fn validate(&self) -> ShadowResult<()> {
        // `> 0.0` is false for NaN, so NaN inputs are rejected too
        if self.object_height > 0.0
            && self.shadow_length > 0.0
            && self.object_height.is_finite()
            && self.shadow_length.is_finite()
        {
            Ok(())
        } else {
            Err(ShadowError::InvalidMeasurement(format!(
                "object height {} and shadow length {} must both be positive",
                self.object_height, self.shadow_length
            )))
        }
    }

    /// Sun elevation implied by the measurement, in degrees
    pub fn implied_sun_elevation(&self) -> f64 {
        self.object_height.atan2(self.shadow_length).to_degrees()
    }
}

/// Per-band point counts for a completed scan.
///
/// Band counts overlap: a point counts toward every band whose threshold it meets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandStatistics {
    pub total_points: usize,
    pub valid_points: usize,
    pub night_points: usize,
    pub ultra_tight: usize,
    pub tight: usize,
    pub visible: usize,
    pub main_band: usize,
}

/// Closed coordinate interval `[min, max]` in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRange {
    pub min: f64,
    pub max: f64,
}

impl CoordinateRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Bounding box of the main-band points; `[0, 0]` in both axes when empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TightBandRange {
    pub lat_range: CoordinateRange,
    pub lng_range: CoordinateRange,
}

/// Result of scanning the global grid for one photo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub points: Vec<GridPoint>,
    pub band_stats: BandStatistics,
    pub tight_band_range: TightBandRange,
    pub measurement: ShadowMeasurement,
    pub captured_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// True when `points` holds the whole fixed grid
    pub fn is_complete(&self) -> bool {
        self.points.len() == GRID_POINT_COUNT
    }

    /// Grid point at the given coordinate, if it is a grid node
    pub fn point_at(&self, lat: f64, lng: f64) -> Option<&GridPoint> {
        let row = grid_index(lat, GRID_LAT_MIN, GRID_LAT_MAX)?;
        let col = grid_index(lng, GRID_LNG_MIN, GRID_LNG_MAX)?;
        self.points.get(row * GRID_LNG_SAMPLES + col)
    }

    /// Likelihoods as a (latitude, longitude) raster, row 0 = southernmost
    pub fn likelihood_grid(&self) -> Array2<f64> {
        let mut grid = Array2::from_elem((GRID_LAT_SAMPLES, GRID_LNG_SAMPLES), NIGHT_SENTINEL);
        for (idx, point) in self.points.iter().enumerate().take(GRID_POINT_COUNT) {
            grid[[idx / GRID_LNG_SAMPLES, idx % GRID_LNG_SAMPLES]] = point.likelihood;
        }
        grid
    }
}

/// Single best-guess location with a coarse uncertainty radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestLocationEstimate {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_km: f64,
    /// Number of main-band points the centroid was taken over
    pub match_count: usize,
}

/// Grid cell rated visible in both of two scans
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionPoint {
    pub lat: f64,
    pub lng: f64,
    pub combined_likelihood: f64,
}

impl Scored for IntersectionPoint {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lng(&self) -> f64 {
        self.lng
    }
    fn likelihood(&self) -> f64 {
        self.combined_likelihood
    }
}

/// Error types for shadow geolocation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShadowError {
    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("No match found: {0}")]
    NoMatchFound(String),

    #[error("Intersection unavailable: {0}")]
    IntersectionUnavailable(String),
}

/// Result type for shadow geolocation operations
pub type ShadowResult<T> = Result<T, ShadowError>;
