use chrono::{TimeZone, Utc};
use shadowgeo::core::{AnalysisSession, GridScanner, IntersectionCombiner, NoaaSolarPosition, PhotoSlot, SolarPositionProvider};
use shadowgeo::io::{ImageFrame, ImagePoint, ShadowMarkers};
use shadowgeo::types::{ShadowError, ShadowMeasurement, NIGHT_SENTINEL};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_identical_scans_intersect_with_themselves() -> anyhow::Result<()> {
    init_logging();

    let time = Utc.with_ymd_and_hms(2024, 6, 21, 10, 0, 0).unwrap();
    let measurement = ShadowMeasurement::new(150.0, 110.0);
    let scanner = GridScanner::new();
    let first = scanner.scan(&measurement, time)?;
    let second = scanner.scan(&measurement, time)?;

    let combined = IntersectionCombiner::new().combine(&first, &second)?;

    let visible: Vec<_> = first
        .points
        .iter()
        .filter(|p| p.likelihood != NIGHT_SENTINEL && p.likelihood <= 0.15)
        .collect();
    assert_eq!(visible.len(), first.band_stats.visible);
    assert_eq!(combined.points.len(), visible.len());
    assert_eq!(combined.visible_counts, (visible.len(), visible.len()));

    for (point, original) in combined.points.iter().zip(visible) {
        assert_eq!((point.lat, point.lng), (original.lat, original.lng));
        assert_eq!(point.combined_likelihood, original.likelihood);
    }
    Ok(())
}

#[test]
fn test_two_times_of_day() -> anyhow::Result<()> {
    init_logging();

    let morning = Utc.with_ymd_and_hms(2024, 6, 21, 8, 0, 0).unwrap();
    let afternoon = Utc.with_ymd_and_hms(2024, 6, 21, 14, 0, 0).unwrap();

    let mut session = AnalysisSession::new();
    session.set_measurement(PhotoSlot::First, ShadowMeasurement::new(100.0, 120.0));
    session.set_capture_instant(PhotoSlot::First, morning);
    session.set_measurement(PhotoSlot::Second, ShadowMeasurement::new(100.0, 80.0));
    session.set_capture_instant(PhotoSlot::Second, afternoon);
    session.analyze_both()?;

    let first = session.result(PhotoSlot::First).unwrap();
    let second = session.result(PhotoSlot::Second).unwrap();
    let combined = session.intersection()?;

    for point in &combined.points {
        let a = first.point_at(point.lat, point.lng).unwrap().likelihood;
        let b = second.point_at(point.lat, point.lng).unwrap().likelihood;
        assert!(a >= 0.0 && a <= 0.15);
        assert!(b >= 0.0 && b <= 0.15);
        assert_eq!(point.combined_likelihood, a.max(b));
    }

    // The joint set can only shrink relative to either photo
    assert!(combined.points.len() <= first.band_stats.visible);
    assert!(combined.points.len() <= second.band_stats.visible);

    Ok(())
}

#[test]
fn test_joint_estimate_from_exact_shadows() -> anyhow::Result<()> {
    init_logging();

    // Shadows measured at one grid cell in the morning and the afternoon
    let (lat, lng) = (40.0, 10.0);
    let morning = Utc.with_ymd_and_hms(2024, 6, 21, 7, 30, 0).unwrap();
    let afternoon = Utc.with_ymd_and_hms(2024, 6, 21, 13, 30, 0).unwrap();
    let sun = NoaaSolarPosition::new();
    let exact = |time: chrono::DateTime<Utc>| {
        let altitude = sun.solar_altitude(&time, lat, lng);
        assert!(altitude > 0.1, "sun too low at {}", time);
        ShadowMeasurement::new(100.0 * altitude.tan(), 100.0)
    };

    let mut session = AnalysisSession::new();
    session.set_measurement(PhotoSlot::First, exact(morning));
    session.set_capture_instant(PhotoSlot::First, morning);
    session.set_measurement(PhotoSlot::Second, exact(afternoon));
    session.set_capture_instant(PhotoSlot::Second, afternoon);
    session.analyze_both()?;

    let combined = session.intersection()?;
    let cell = combined
        .points
        .iter()
        .find(|p| p.lat == lat && p.lng == lng)
        .expect("measured cell missing from the intersection");
    assert!(cell.combined_likelihood < 1e-6);

    let best = combined.best_location.expect("a perfect joint match must yield an estimate");
    assert!(best.accuracy_km >= 1.0);
    assert!(best.match_count >= 1);
    Ok(())
}

#[test]
fn test_session_from_marked_photo() -> anyhow::Result<()> {
    let frame = ImageFrame::new(640.0, 480.0, 3200.0, 2400.0);
    let markers = ShadowMarkers::from_display(
        ImagePoint::new(300.0, 400.0),
        ImagePoint::new(300.0, 300.0),
        ImagePoint::new(400.0, 400.0),
        &frame,
    )?;

    let mut session = AnalysisSession::new();
    session.set_markers(PhotoSlot::First, markers);
    session.set_capture_time(PhotoSlot::First, "2024:03:20 12:00:00")?;

    let result = session.analyze(PhotoSlot::First)?;
    assert_eq!(result.measurement.object_height, 500.0);
    assert_eq!(result.measurement.shadow_length, 500.0);

    let best = session.best_location(PhotoSlot::First)?;
    assert!(best.latitude.abs() < 5.0);

    let err = session.intersection().unwrap_err();
    assert!(matches!(err, ShadowError::IntersectionUnavailable(_)));
    Ok(())
}
