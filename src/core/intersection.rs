use crate::core::band_classifier::BandThresholds;
use crate::core::location_estimator::LocationEstimator;
use crate::types::{
    AnalysisResult, BestLocationEstimate, GridPoint, IntersectionPoint, ShadowError, ShadowResult,
    GRID_POINT_COUNT,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Grid cells implicated by both photos, plus the joint estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionResult {
    pub points: Vec<IntersectionPoint>,
    /// Visible-band point counts of the first and second scan
    pub visible_counts: (usize, usize),
    /// `None` when no intersection point falls in the main band
    pub best_location: Option<BestLocationEstimate>,
}

/// Coordinate key at 0.1° resolution; exact for cells of a shared 0.5° grid
fn cell_key(lat: f64, lng: f64) -> (i64, i64) {
    ((lat * 10.0).round() as i64, (lng * 10.0).round() as i64)
}

/// Combines two independent scans of the same grid
#[derive(Debug, Clone, Default)]
pub struct IntersectionCombiner {
    thresholds: BandThresholds,
    estimator: LocationEstimator,
}

impl IntersectionCombiner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_estimator(thresholds: BandThresholds, estimator: LocationEstimator) -> Self {
        Self { thresholds, estimator }
    }

    fn visible<'a>(&self, scan: &'a AnalysisResult) -> impl Iterator<Item = &'a GridPoint> + 'a {
        let thresholds = self.thresholds;
        scan.points.iter().filter(move |p| thresholds.in_visible(p.likelihood))
    }

    /// Intersect two completed scans.
    ///
    /// Each cell visible in both keeps the worse of its two likelihoods.
    pub fn combine(&self, first: &AnalysisResult, second: &AnalysisResult) -> ShadowResult<IntersectionResult> {
        for (name, scan) in [("first", first), ("second", second)] {
            if !scan.is_complete() {
                return Err(ShadowError::IntersectionUnavailable(format!(
                    "{} scan has {} of {} grid points",
                    name,
                    scan.points.len(),
                    GRID_POINT_COUNT
                )));
            }
        }

        log::info!("🔀 Intersecting scans from {} and {}", first.captured_at, second.captured_at);

        let first_lookup: HashMap<(i64, i64), f64> = self
            .visible(first)
            .map(|p| (cell_key(p.lat, p.lng), p.likelihood))
            .collect();

        let mut second_visible = 0usize;
        let mut points = Vec::new();
        for p in self.visible(second) {
            second_visible += 1;
            if let Some(&first_likelihood) = first_lookup.get(&cell_key(p.lat, p.lng)) {
                points.push(IntersectionPoint {
                    lat: p.lat,
                    lng: p.lng,
                    combined_likelihood: first_likelihood.max(p.likelihood),
                });
            }
        }

        log::info!(
            "Intersection: {} cells ({} visible in first, {} in second)",
            points.len(),
            first_lookup.len(),
            second_visible
        );

        let best_location = match self.estimator.estimate(&points) {
            Ok(best) => Some(best),
            Err(ShadowError::NoMatchFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(IntersectionResult {
            points,
            visible_counts: (first_lookup.len(), second_visible),
            best_location,
        })
    }
}
