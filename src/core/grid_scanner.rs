use crate::core::band_classifier::BandClassifier;
use crate::core::solar_position::{NoaaSolarPosition, SolarPositionProvider};
use crate::io::timestamp::parse_capture_time;
use crate::types::{
    grid_lat, grid_lng, AnalysisResult, GridPoint, ShadowMeasurement, ShadowResult, GRID_LAT_SAMPLES,
    GRID_LNG_SAMPLES, GRID_POINT_COUNT, NIGHT_SENTINEL,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Grid scan parameters
#[derive(Debug, Clone)]
pub struct ScanParams {
    /// Split the sweep across threads by latitude row
    pub parallel: bool,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            parallel: cfg!(feature = "parallel"),
        }
    }
}

/// Analysis request as it arrives from the photo UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub object_height: f64,
    pub shadow_length: f64,
    /// Capture time, see `parse_capture_time` for accepted layouts
    pub known_time_utc: String,
}

impl AnalysisRequest {
    pub fn new(object_height: f64, shadow_length: f64, known_time_utc: impl Into<String>) -> Self {
        Self {
            object_height,
            shadow_length,
            known_time_utc: known_time_utc.into(),
        }
    }

    pub fn measurement(&self) -> ShadowMeasurement {
        ShadowMeasurement::new(self.object_height, self.shadow_length)
    }
}

/// Likelihood of one location given the local sun altitude (radians).
///
/// Absolute relative error between the predicted and observed shadow length,
/// or `NIGHT_SENTINEL` when the sun is not above the horizon.
pub fn shadow_likelihood(measurement: &ShadowMeasurement, altitude: f64) -> f64 {
    if !(altitude > 0.0) {
        return NIGHT_SENTINEL;
    }
    let predicted_shadow = measurement.object_height / altitude.tan();
    ((predicted_shadow - measurement.shadow_length) / measurement.shadow_length).abs()
}

/// Scores every point of the fixed global grid against one shadow measurement
pub struct GridScanner<P: SolarPositionProvider = NoaaSolarPosition> {
    provider: P,
    params: ScanParams,
    classifier: BandClassifier,
}

impl GridScanner<NoaaSolarPosition> {
    /// Scanner backed by the NOAA solar position equations
    pub fn new() -> Self {
        Self::with_provider(NoaaSolarPosition::new())
    }
}

impl Default for GridScanner<NoaaSolarPosition> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SolarPositionProvider> GridScanner<P> {
    pub fn with_provider(provider: P) -> Self {
        Self {
            provider,
            params: ScanParams::default(),
            classifier: BandClassifier::new(),
        }
    }

    pub fn with_params(mut self, params: ScanParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_classifier(mut self, classifier: BandClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn classifier(&self) -> &BandClassifier {
        &self.classifier
    }

    /// Resolve the request's timestamp and scan
    pub fn analyze(&self, request: &AnalysisRequest) -> ShadowResult<AnalysisResult> {
        let measurement = request.measurement();
        measurement.validate()?;
        let captured_at = parse_capture_time(&request.known_time_utc)?;
        self.scan(&measurement, captured_at)
    }

    /// Score the whole grid for a measurement taken at `captured_at`
    pub fn scan(&self, measurement: &ShadowMeasurement, captured_at: DateTime<Utc>) -> ShadowResult<AnalysisResult> {
        measurement.validate()?;

        log::info!("🌞 Starting shadow grid scan for {}", captured_at.to_rfc3339());
        log::debug!(
            "Measurement: object {:.2}px, shadow {:.2}px (implied elevation {:.2}°)",
            measurement.object_height,
            measurement.shadow_length,
            measurement.implied_sun_elevation()
        );
        let start_time = std::time::Instant::now();

        let longitudes: Vec<f64> = (0..GRID_LNG_SAMPLES).map(grid_lng).collect();
        let points = if self.params.parallel {
            self.score_rows_parallel(measurement, &captured_at, &longitudes)
        } else {
            self.score_rows_sequential(measurement, &captured_at, &longitudes)
        };
        debug_assert_eq!(points.len(), GRID_POINT_COUNT);

        let band_stats = self.classifier.statistics(&points);
        let tight_band_range = self.classifier.tight_band_range(&points);

        log::info!(
            "✅ Scan complete: {} points, {} in daylight, {} at night ({:?})",
            band_stats.total_points,
            band_stats.valid_points,
            band_stats.night_points,
            start_time.elapsed()
        );

        Ok(AnalysisResult {
            points,
            band_stats,
            tight_band_range,
            measurement: *measurement,
            captured_at,
        })
    }

    /// Score one latitude row, west to east
    fn score_row(
        &self,
        row: usize,
        measurement: &ShadowMeasurement,
        time: &DateTime<Utc>,
        longitudes: &[f64],
    ) -> Vec<GridPoint> {
        let lat = grid_lat(row);
        let altitudes = self.provider.row_altitudes(time, lat, longitudes);
        debug_assert_eq!(altitudes.len(), longitudes.len());
        longitudes
            .iter()
            .zip(altitudes)
            .map(|(&lng, altitude)| GridPoint {
                lat,
                lng,
                likelihood: shadow_likelihood(measurement, altitude),
            })
            .collect()
    }

    fn score_rows_sequential(
        &self,
        measurement: &ShadowMeasurement,
        time: &DateTime<Utc>,
        longitudes: &[f64],
    ) -> Vec<GridPoint> {
        let mut points = Vec::with_capacity(GRID_POINT_COUNT);
        for row in 0..GRID_LAT_SAMPLES {
            points.extend(self.score_row(row, measurement, time, longitudes));
        }
        points
    }

    #[cfg(feature = "parallel")]
    fn score_rows_parallel(
        &self,
        measurement: &ShadowMeasurement,
        time: &DateTime<Utc>,
        longitudes: &[f64],
    ) -> Vec<GridPoint> {
        use rayon::prelude::*;

        log::debug!("Scanning {} rows on {} threads", GRID_LAT_SAMPLES, rayon::current_num_threads());

        // Rows are collected in index order, so the output stays row-major
        let rows: Vec<Vec<GridPoint>> = (0..GRID_LAT_SAMPLES)
            .into_par_iter()
            .map(|row| self.score_row(row, measurement, time, longitudes))
            .collect();
        rows.concat()
    }

    #[cfg(not(feature = "parallel"))]
    fn score_rows_parallel(
        &self,
        measurement: &ShadowMeasurement,
        time: &DateTime<Utc>,
        longitudes: &[f64],
    ) -> Vec<GridPoint> {
        self.score_rows_sequential(measurement, time, longitudes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ShadowError, GRID_LAT_MAX, GRID_LAT_MIN, GRID_LNG_MAX, GRID_LNG_MIN};
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use std::f64::consts::FRAC_PI_4;

    /// Sun at the same altitude everywhere
    struct ConstantSun(f64);

    impl SolarPositionProvider for ConstantSun {
        fn solar_altitude(&self, _time: &DateTime<Utc>, _lat: f64, _lng: f64) -> f64 {
            self.0
        }
    }

    /// Only answers whole rows; single-point lookups are a bug
    struct RowOnlySun(f64);

    impl SolarPositionProvider for RowOnlySun {
        fn solar_altitude(&self, _time: &DateTime<Utc>, _lat: f64, _lng: f64) -> f64 {
            unreachable!("scanner must go through row_altitudes")
        }

        fn row_altitudes(&self, _time: &DateTime<Utc>, _lat: f64, longitudes: &[f64]) -> Vec<f64> {
            vec![self.0; longitudes.len()]
        }
    }

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_shadow_likelihood() {
        let m = ShadowMeasurement::new(100.0, 100.0);
        assert_relative_eq!(shadow_likelihood(&m, FRAC_PI_4), 0.0, epsilon = 1e-12);
        assert_eq!(shadow_likelihood(&m, 0.0), NIGHT_SENTINEL);
        assert_eq!(shadow_likelihood(&m, -0.3), NIGHT_SENTINEL);
        assert_eq!(shadow_likelihood(&m, f64::NAN), NIGHT_SENTINEL);

        // 30° sun: shadow should be sqrt(3) times the height
        let expected = 3f64.sqrt() - 1.0;
        assert_relative_eq!(shadow_likelihood(&m, 30f64.to_radians()), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_over_and_under_estimates_score_equally() {
        let long = ShadowMeasurement::new(100.0, 100.0 / 1.1);
        let short = ShadowMeasurement::new(100.0, 100.0 / 0.9);
        let a = shadow_likelihood(&long, FRAC_PI_4);
        let b = shadow_likelihood(&short, FRAC_PI_4);
        assert_relative_eq!(a, 0.1, epsilon = 1e-12);
        assert_relative_eq!(b, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_geometry_and_order() {
        let scanner = GridScanner::with_provider(ConstantSun(FRAC_PI_4));
        let result = scanner.scan(&ShadowMeasurement::new(1.0, 1.0), test_time()).unwrap();

        assert_eq!(result.points.len(), GRID_POINT_COUNT);
        assert_eq!(result.points[0].lat, GRID_LAT_MIN);
        assert_eq!(result.points[0].lng, GRID_LNG_MIN);
        assert_eq!(result.points[1].lng, GRID_LNG_MIN + 0.5);
        assert_eq!(result.points[GRID_LNG_SAMPLES].lat, GRID_LAT_MIN + 0.5);
        let last = result.points.last().unwrap();
        assert_eq!(last.lat, GRID_LAT_MAX);
        assert_eq!(last.lng, GRID_LNG_MAX);
        assert!(result.is_complete());
    }

    #[test]
    fn test_constant_sun_matches_everywhere() {
        let scanner = GridScanner::with_provider(ConstantSun(FRAC_PI_4));
        let result = scanner.scan(&ShadowMeasurement::new(50.0, 50.0), test_time()).unwrap();

        assert_eq!(result.band_stats.valid_points, GRID_POINT_COUNT);
        assert_eq!(result.band_stats.ultra_tight, GRID_POINT_COUNT);
        assert_eq!(result.tight_band_range.lat_range.min, GRID_LAT_MIN);
        assert_eq!(result.tight_band_range.lng_range.max, GRID_LNG_MAX);
    }

    #[test]
    fn test_scan_uses_row_altitudes() {
        for parallel in [false, true] {
            let scanner = GridScanner::with_provider(RowOnlySun(FRAC_PI_4)).with_params(ScanParams { parallel });
            let result = scanner.scan(&ShadowMeasurement::new(10.0, 10.0), test_time()).unwrap();

            assert!(result.is_complete());
            assert_eq!(result.band_stats.ultra_tight, GRID_POINT_COUNT);
            assert_eq!(result.points[GRID_LNG_SAMPLES + 3].lng, GRID_LNG_MIN + 1.5);
        }
    }

    #[test]
    fn test_all_night() {
        let scanner = GridScanner::with_provider(ConstantSun(-0.1));
        let result = scanner.scan(&ShadowMeasurement::new(50.0, 50.0), test_time()).unwrap();

        assert_eq!(result.band_stats.valid_points, 0);
        assert_eq!(result.band_stats.night_points, GRID_POINT_COUNT);
        assert_eq!(result.band_stats.visible, 0);
        assert!(result.points.iter().all(|p| p.likelihood == NIGHT_SENTINEL));
    }

    #[test]
    fn test_invalid_measurement_rejected() {
        let scanner = GridScanner::with_provider(ConstantSun(FRAC_PI_4));
        let err = scanner.scan(&ShadowMeasurement::new(0.0, 100.0), test_time()).unwrap_err();
        assert!(matches!(err, ShadowError::InvalidMeasurement(_)));
    }

    #[test]
    fn test_invalid_timestamp_rejected() {
        let scanner = GridScanner::with_provider(ConstantSun(FRAC_PI_4));
        let err = scanner.analyze(&AnalysisRequest::new(10.0, 10.0, "not a date")).unwrap_err();
        assert!(matches!(err, ShadowError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_measurement_checked_before_timestamp() {
        let scanner = GridScanner::with_provider(ConstantSun(FRAC_PI_4));
        let err = scanner.analyze(&AnalysisRequest::new(0.0, 10.0, "not a date")).unwrap_err();
        assert!(matches!(err, ShadowError::InvalidMeasurement(_)));
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let time = test_time();
        let m = ShadowMeasurement::new(120.0, 80.0);
        let sequential = GridScanner::new()
            .with_params(ScanParams { parallel: false })
            .scan(&m, time)
            .unwrap();
        let parallel = GridScanner::new()
            .with_params(ScanParams { parallel: true })
            .scan(&m, time)
            .unwrap();

        assert_eq!(sequential.points, parallel.points);
        assert_eq!(sequential.band_stats, parallel.band_stats);
    }
}
