use chrono::{TimeZone, Utc};
use shadowgeo::core::{GridScanner, ScanParams};
use shadowgeo::types::{ShadowMeasurement, GRID_POINT_COUNT};
use std::time::Instant;

#[test]
fn test_parallel_vs_sequential_scan() {
    // Initialize logging to see scan timings
    let _ = env_logger::builder().is_test(true).try_init();

    let time = Utc.with_ymd_and_hms(2024, 9, 1, 16, 45, 0).unwrap();
    let measurement = ShadowMeasurement::new(180.0, 260.0);

    println!("\n=== Scan Performance: Sequential vs Parallel ===");

    let sequential_start = Instant::now();
    let sequential = GridScanner::new()
        .with_params(ScanParams { parallel: false })
        .scan(&measurement, time)
        .expect("sequential scan failed");
    let sequential_time = sequential_start.elapsed();

    let parallel_start = Instant::now();
    let parallel = GridScanner::new()
        .with_params(ScanParams { parallel: true })
        .scan(&measurement, time)
        .expect("parallel scan failed");
    let parallel_time = parallel_start.elapsed();

    let rate = |secs: f64| GRID_POINT_COUNT as f64 / secs;
    println!("  - Sequential: {:.3} s ({:.0} points/s)", sequential_time.as_secs_f64(), rate(sequential_time.as_secs_f64()));
    println!("  - Parallel:   {:.3} s ({:.0} points/s)", parallel_time.as_secs_f64(), rate(parallel_time.as_secs_f64()));
    println!("  - Speedup: {:.2}x", sequential_time.as_secs_f64() / parallel_time.as_secs_f64());

    // Row-parallel scanning must not change a single score or the point order
    assert_eq!(sequential.points, parallel.points);
    assert_eq!(sequential.band_stats, parallel.band_stats);
    assert_eq!(sequential.tight_band_range, parallel.tight_band_range);
}
