use crate::types::{BandStatistics, CoordinateRange, Scored, TightBandRange};
use serde::{Deserialize, Serialize};

/// Inclusive likelihood thresholds for the match bands.
///
/// The bands are nested rather than a partition. `main` sits between `tight`
/// and `visible` and is only used for the coordinate envelope and the best
/// location estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub ultra_tight: f64,
    pub tight: f64,
    pub visible: f64,
    pub main: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            ultra_tight: 0.05,
            tight: 0.08,
            visible: 0.15,
            main: 0.10,
        }
    }
}

impl BandThresholds {
    pub fn in_ultra_tight(&self, likelihood: f64) -> bool {
        likelihood >= 0.0 && likelihood <= self.ultra_tight
    }

    pub fn in_tight(&self, likelihood: f64) -> bool {
        likelihood >= 0.0 && likelihood <= self.tight
    }

    pub fn in_visible(&self, likelihood: f64) -> bool {
        likelihood >= 0.0 && likelihood <= self.visible
    }

    pub fn in_main(&self, likelihood: f64) -> bool {
        likelihood >= 0.0 && likelihood <= self.main
    }

    /// Tightest display band a likelihood falls into
    pub fn classify(&self, likelihood: f64) -> LikelihoodBand {
        if likelihood < 0.0 {
            LikelihoodBand::Night
        } else if self.in_ultra_tight(likelihood) {
            LikelihoodBand::UltraTight
        } else if self.in_tight(likelihood) {
            LikelihoodBand::Tight
        } else if self.in_visible(likelihood) {
            LikelihoodBand::Visible
        } else {
            LikelihoodBand::Outside
        }
    }
}

/// Display band of a single point, keyed for color/opacity mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LikelihoodBand {
    /// Sun at or below the horizon
    Night,
    UltraTight,
    Tight,
    Visible,
    /// Daylight point too far from the observed shadow to draw
    Outside,
}

/// Derives band statistics and the main-band envelope from a scan
#[derive(Debug, Clone, Default)]
pub struct BandClassifier {
    thresholds: BandThresholds,
}

impl BandClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: BandThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &BandThresholds {
        &self.thresholds
    }

    /// Count points per band; overlapping bands are each counted
    pub fn statistics<T: Scored>(&self, points: &[T]) -> BandStatistics {
        let mut stats = BandStatistics {
            total_points: points.len(),
            ..Default::default()
        };

        for point in points {
            let likelihood = point.likelihood();
            if point.is_night() {
                stats.night_points += 1;
                continue;
            }
            stats.valid_points += 1;

            if self.thresholds.in_ultra_tight(likelihood) {
                stats.ultra_tight += 1;
            }
            if self.thresholds.in_tight(likelihood) {
                stats.tight += 1;
            }
            if self.thresholds.in_visible(likelihood) {
                stats.visible += 1;
            }
            if self.thresholds.in_main(likelihood) {
                stats.main_band += 1;
            }
        }

        log::debug!(
            "Band statistics: {} valid / {} night, ultra-tight {}, tight {}, main {}, visible {}",
            stats.valid_points,
            stats.night_points,
            stats.ultra_tight,
            stats.tight,
            stats.main_band,
            stats.visible
        );

        stats
    }

    /// Bounding box of the main-band points, `[0, 0]` ranges when there are none
    pub fn tight_band_range<T: Scored>(&self, points: &[T]) -> TightBandRange {
        let mut range: Option<TightBandRange> = None;

        for point in points.iter().filter(|p| self.thresholds.in_main(p.likelihood())) {
            let (lat, lng) = (point.lat(), point.lng());
            match range.as_mut() {
                Some(r) => {
                    r.lat_range.min = r.lat_range.min.min(lat);
                    r.lat_range.max = r.lat_range.max.max(lat);
                    r.lng_range.min = r.lng_range.min.min(lng);
                    r.lng_range.max = r.lng_range.max.max(lng);
                }
                None => {
                    range = Some(TightBandRange {
                        lat_range: CoordinateRange { min: lat, max: lat },
                        lng_range: CoordinateRange { min: lng, max: lng },
                    });
                }
            }
        }

        range.unwrap_or_default()
    }
}
