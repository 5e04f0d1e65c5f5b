//! Two-photo analysis workflow.
//!
//! A session holds up to two photos, each with its own markers, measurement,
//! capture time and scan result. Either photo can be analysed on its own; the
//! intersection needs both.

use crate::core::grid_scanner::GridScanner;
use crate::core::intersection::{IntersectionCombiner, IntersectionResult};
use crate::core::location_estimator::LocationEstimator;
use crate::core::solar_position::{NoaaSolarPosition, SolarPositionProvider};
use crate::io::measurement::ShadowMarkers;
use crate::io::timestamp::parse_capture_time;
use crate::types::{AnalysisResult, BestLocationEstimate, ShadowError, ShadowMeasurement, ShadowResult};
use chrono::{DateTime, Utc};

/// Which of the two photos an operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoSlot {
    First,
    Second,
}

impl PhotoSlot {
    fn index(self) -> usize {
        match self {
            PhotoSlot::First => 0,
            PhotoSlot::Second => 1,
        }
    }
}

impl std::fmt::Display for PhotoSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhotoSlot::First => write!(f, "first photo"),
            PhotoSlot::Second => write!(f, "second photo"),
        }
    }
}

/// Inputs and latest result for one photo
#[derive(Debug, Clone, Default)]
pub struct PhotoState {
    pub markers: Option<ShadowMarkers>,
    pub measurement: Option<ShadowMeasurement>,
    pub captured_at: Option<DateTime<Utc>>,
    pub result: Option<AnalysisResult>,
}

impl PhotoState {
    /// Measurement and capture time, or the error describing what is missing
    fn scan_inputs(&self, slot: PhotoSlot) -> ShadowResult<(ShadowMeasurement, DateTime<Utc>)> {
        let measurement = self.measurement.ok_or_else(|| {
            ShadowError::InvalidMeasurement(format!("no shadow measurement for the {}", slot))
        })?;
        let captured_at = self
            .captured_at
            .ok_or_else(|| ShadowError::InvalidTimestamp(format!("no capture time for the {}", slot)))?;
        Ok((measurement, captured_at))
    }
}

/// Ordered pair of optional per-photo states sharing one scanner
pub struct AnalysisSession<P: SolarPositionProvider = NoaaSolarPosition> {
    scanner: GridScanner<P>,
    estimator: LocationEstimator,
    combiner: IntersectionCombiner,
    slots: [PhotoState; 2],
}

impl AnalysisSession<NoaaSolarPosition> {
    pub fn new() -> Self {
        Self::with_scanner(GridScanner::new())
    }
}

impl Default for AnalysisSession<NoaaSolarPosition> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SolarPositionProvider> AnalysisSession<P> {
    pub fn with_scanner(scanner: GridScanner<P>) -> Self {
        Self {
            scanner,
            estimator: LocationEstimator::new(),
            combiner: IntersectionCombiner::new(),
            slots: [PhotoState::default(), PhotoState::default()],
        }
    }

    pub fn photo(&self, slot: PhotoSlot) -> &PhotoState {
        &self.slots[slot.index()]
    }

    /// Latest scan of a photo, if it has been analysed since its inputs last changed
    pub fn result(&self, slot: PhotoSlot) -> Option<&AnalysisResult> {
        self.photo(slot).result.as_ref()
    }

    fn photo_mut(&mut self, slot: PhotoSlot) -> &mut PhotoState {
        let state = &mut self.slots[slot.index()];
        // Any input change makes the previous scan stale
        state.result = None;
        state
    }

    /// Record the marked points and the measurement they imply
    pub fn set_markers(&mut self, slot: PhotoSlot, markers: ShadowMarkers) {
        let state = self.photo_mut(slot);
        state.measurement = Some(markers.measurement());
        state.markers = Some(markers);
    }

    /// Record a measurement directly, dropping any markers
    pub fn set_measurement(&mut self, slot: PhotoSlot, measurement: ShadowMeasurement) {
        let state = self.photo_mut(slot);
        state.markers = None;
        state.measurement = Some(measurement);
    }

    /// Record the capture time from a timestamp string
    pub fn set_capture_time(&mut self, slot: PhotoSlot, time_str: &str) -> ShadowResult<()> {
        let captured_at = parse_capture_time(time_str)?;
        self.set_capture_instant(slot, captured_at);
        Ok(())
    }

    pub fn set_capture_instant(&mut self, slot: PhotoSlot, captured_at: DateTime<Utc>) {
        self.photo_mut(slot).captured_at = Some(captured_at);
    }

    /// Scan one photo and keep the result in its slot
    pub fn analyze(&mut self, slot: PhotoSlot) -> ShadowResult<&AnalysisResult> {
        let (measurement, captured_at) = self.photo(slot).scan_inputs(slot)?;
        log::info!("Analysing {}", slot);
        let result = self.scanner.scan(&measurement, captured_at)?;
        Ok(&*self.slots[slot.index()].result.insert(result))
    }

    /// Scan both photos concurrently
    pub fn analyze_both(&mut self) -> ShadowResult<()> {
        let (m1, t1) = self.photo(PhotoSlot::First).scan_inputs(PhotoSlot::First)?;
        let (m2, t2) = self.photo(PhotoSlot::Second).scan_inputs(PhotoSlot::Second)?;
        // Reject bad input before spending a scan on the other photo
        m1.validate()?;
        m2.validate()?;

        let scanner = &self.scanner;
        let (first, second) = rayon::join(|| scanner.scan(&m1, t1), || scanner.scan(&m2, t2));

        self.slots[0].result = Some(first?);
        self.slots[1].result = Some(second?);
        Ok(())
    }

    /// Best single location for one analysed photo
    pub fn best_location(&self, slot: PhotoSlot) -> ShadowResult<BestLocationEstimate> {
        match self.result(slot) {
            Some(result) => self.estimator.estimate(&result.points),
            None => Err(ShadowError::NoMatchFound(format!("the {} has not been analysed", slot))),
        }
    }

    /// Combine the two analysed photos
    pub fn intersection(&self) -> ShadowResult<IntersectionResult> {
        match (self.result(PhotoSlot::First), self.result(PhotoSlot::Second)) {
            (Some(first), Some(second)) => self.combiner.combine(first, second),
            (first, _) => {
                let missing = if first.is_none() { PhotoSlot::First } else { PhotoSlot::Second };
                log::warn!("Intersection requested without a scan of the {}", missing);
                Err(ShadowError::IntersectionUnavailable(format!(
                    "the {} has not been analysed",
                    missing
                )))
            }
        }
    }

    /// Forget everything about one photo
    pub fn clear(&mut self, slot: PhotoSlot) {
        self.slots[slot.index()] = PhotoState::default();
    }

    pub fn reset(&mut self) {
        self.clear(PhotoSlot::First);
        self.clear(PhotoSlot::Second);
    }
}
