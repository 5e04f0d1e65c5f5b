use crate::core::band_classifier::BandThresholds;
use crate::types::{BestLocationEstimate, Scored, ShadowError, ShadowResult};

/// Best-location estimation parameters
#[derive(Debug, Clone)]
pub struct EstimatorParams {
    /// Kilometres per degree of latitude (and of longitude at the equator)
    pub km_per_degree: f64,
    /// Lower bound on the reported accuracy radius
    pub min_accuracy_km: f64,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            km_per_degree: 111.0,
            min_accuracy_km: 1.0,
        }
    }
}

/// Reduces a scored point set to a centroid and an accuracy radius
#[derive(Debug, Clone, Default)]
pub struct LocationEstimator {
    thresholds: BandThresholds,
    params: EstimatorParams,
}

impl LocationEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(thresholds: BandThresholds, params: EstimatorParams) -> Self {
        Self { thresholds, params }
    }

    /// Main-band points ordered best first
    pub fn ranked_matches<T: Scored + Clone>(&self, points: &[T]) -> Vec<T> {
        let mut matches: Vec<T> = points
            .iter()
            .filter(|p| self.thresholds.in_main(p.likelihood()))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.likelihood().total_cmp(&b.likelihood()));
        matches
    }

    /// Centroid of the main-band points with half the larger span as radius
    pub fn estimate<T: Scored>(&self, points: &[T]) -> ShadowResult<BestLocationEstimate> {
        let mut count = 0usize;
        let (mut lat_sum, mut lng_sum) = (0.0, 0.0);
        let (mut lat_min, mut lat_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut lng_min, mut lng_max) = (f64::INFINITY, f64::NEG_INFINITY);

        for point in points.iter().filter(|p| self.thresholds.in_main(p.likelihood())) {
            let (lat, lng) = (point.lat(), point.lng());
            count += 1;
            lat_sum += lat;
            lng_sum += lng;
            lat_min = lat_min.min(lat);
            lat_max = lat_max.max(lat);
            lng_min = lng_min.min(lng);
            lng_max = lng_max.max(lng);
        }

        if count == 0 {
            log::warn!(
                "No points within likelihood {:.2} of the observed shadow",
                self.thresholds.main
            );
            return Err(ShadowError::NoMatchFound(format!(
                "none of {} points has likelihood within {:.2}",
                points.len(),
                self.thresholds.main
            )));
        }

        let latitude = lat_sum / count as f64;
        let longitude = lng_sum / count as f64;

        let lat_span_km = (lat_max - lat_min) * self.params.km_per_degree;
        let lng_span_km = (lng_max - lng_min) * self.params.km_per_degree * latitude.to_radians().cos();
        let accuracy_km = (lat_span_km.max(lng_span_km) / 2.0).max(self.params.min_accuracy_km);

        log::info!(
            "📍 Best location ({:.3}, {:.3}) ±{:.0} km from {} points",
            latitude,
            longitude,
            accuracy_km,
            count
        );

        Ok(BestLocationEstimate {
            latitude,
            longitude,
            accuracy_km,
            match_count: count,
        })
    }
}
