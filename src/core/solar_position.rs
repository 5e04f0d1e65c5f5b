//! Solar position for grid scanning.
//!
//! The scanner only needs the sun's altitude at an instant and a place, so
//! the provider is a trait; `NoaaSolarPosition` is the default implementation
//! and tests substitute deterministic doubles.

use chrono::{DateTime, Timelike, Utc};
use std::f64::consts::PI;

/// Source of solar altitude (and optionally azimuth) for a time and place
pub trait SolarPositionProvider: Sync {
    /// Solar altitude above the horizon in radians
    fn solar_altitude(&self, time: &DateTime<Utc>, latitude_deg: f64, longitude_deg: f64) -> f64;

    /// Solar azimuth in radians, clockwise from north, if the provider computes it
    fn solar_azimuth(&self, _time: &DateTime<Utc>, _latitude_deg: f64, _longitude_deg: f64) -> Option<f64> {
        None
    }

    /// Altitudes along one latitude row, one per entry of `longitudes_deg`.
    ///
    /// Providers with per-instant setup cost should override this to do that
    /// work once per row.
    fn row_altitudes(&self, time: &DateTime<Utc>, latitude_deg: f64, longitudes_deg: &[f64]) -> Vec<f64> {
        longitudes_deg
            .iter()
            .map(|&lng| self.solar_altitude(time, latitude_deg, lng))
            .collect()
    }
}

/// Time-dependent solar quantities shared by every location at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarEphemeris {
    /// Declination in radians
    pub declination: f64,
    /// Equation of time in minutes
    pub equation_of_time: f64,
    /// Minutes elapsed since 00:00 UTC
    pub utc_minutes: f64,
}

impl SolarEphemeris {
    /// NOAA solar calculator equations (after Meeus)
    pub fn at(time: &DateTime<Utc>) -> Self {
        let seconds = time.timestamp() as f64 + time.timestamp_subsec_nanos() as f64 * 1e-9;
        let julian_day = seconds / 86_400.0 + 2_440_587.5;
        let t = (julian_day - 2_451_545.0) / 36_525.0;

        let mean_longitude = (280.46646 + t * (36_000.769_83 + t * 0.000_303_2)).rem_euclid(360.0);
        let mean_anomaly = 357.529_11 + t * (35_999.050_29 - 0.000_153_7 * t);
        let eccentricity = 0.016_708_634 - t * (0.000_042_037 + 0.000_000_126_7 * t);

        let m = mean_anomaly.to_radians();
        let center = m.sin() * (1.914_602 - t * (0.004_817 + 0.000_014 * t))
            + (2.0 * m).sin() * (0.019_993 - 0.000_101 * t)
            + (3.0 * m).sin() * 0.000_289;

        let true_longitude = mean_longitude + center;
        let omega = (125.04 - 1_934.136 * t).to_radians();
        let apparent_longitude = (true_longitude - 0.005_69 - 0.004_78 * omega.sin()).to_radians();

        let mean_obliquity =
            23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.000_59 - t * 0.001_813))) / 60.0) / 60.0;
        let obliquity = (mean_obliquity + 0.002_56 * omega.cos()).to_radians();

        let declination = (obliquity.sin() * apparent_longitude.sin()).asin();

        let y = (obliquity / 2.0).tan().powi(2);
        let l0 = mean_longitude.to_radians();
        let equation_of_time = 4.0
            * (y * (2.0 * l0).sin() - 2.0 * eccentricity * m.sin()
                + 4.0 * eccentricity * y * m.sin() * (2.0 * l0).cos()
                - 0.5 * y * y * (4.0 * l0).sin()
                - 1.25 * eccentricity * eccentricity * (2.0 * m).sin())
            .to_degrees();

        let utc_minutes = time.num_seconds_from_midnight() as f64 / 60.0
            + time.nanosecond() as f64 * 1e-9 / 60.0;

        Self {
            declination,
            equation_of_time,
            utc_minutes,
        }
    }

    /// Hour angle in radians at the given longitude (0 at local solar noon)
    pub fn hour_angle(&self, longitude_deg: f64) -> f64 {
        let true_solar_time = (self.utc_minutes + self.equation_of_time + 4.0 * longitude_deg).rem_euclid(1_440.0);
        (true_solar_time / 4.0 - 180.0).to_radians()
    }

    /// Geometric altitude in radians (no refraction)
    pub fn altitude(&self, latitude_deg: f64, longitude_deg: f64) -> f64 {
        let lat = latitude_deg.to_radians();
        let ha = self.hour_angle(longitude_deg);
        let cos_zenith = lat.sin() * self.declination.sin() + lat.cos() * self.declination.cos() * ha.cos();
        cos_zenith.clamp(-1.0, 1.0).asin()
    }

    /// Azimuth in radians, clockwise from north
    pub fn azimuth(&self, latitude_deg: f64, longitude_deg: f64) -> f64 {
        let lat = latitude_deg.to_radians();
        let ha = self.hour_angle(longitude_deg);
        let from_south = ha.sin().atan2(ha.cos() * lat.sin() - self.declination.tan() * lat.cos());
        (from_south + PI).rem_euclid(2.0 * PI)
    }

    /// Latitude and longitude (degrees) where the sun is at the zenith
    pub fn subsolar_point(&self) -> (f64, f64) {
        let lng = (720.0 - self.utc_minutes - self.equation_of_time) / 4.0;
        let lng = (lng + 180.0).rem_euclid(360.0) - 180.0;
        (self.declination.to_degrees(), lng)
    }
}

/// Default solar position provider based on the NOAA solar calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct NoaaSolarPosition;

impl NoaaSolarPosition {
    pub fn new() -> Self {
        Self
    }

    /// Point on Earth directly beneath the sun at `time`
    pub fn subsolar_point(&self, time: &DateTime<Utc>) -> (f64, f64) {
        SolarEphemeris::at(time).subsolar_point()
    }
}

impl SolarPositionProvider for NoaaSolarPosition {
    fn solar_altitude(&self, time: &DateTime<Utc>, latitude_deg: f64, longitude_deg: f64) -> f64 {
        SolarEphemeris::at(time).altitude(latitude_deg, longitude_deg)
    }

    fn solar_azimuth(&self, time: &DateTime<Utc>, latitude_deg: f64, longitude_deg: f64) -> Option<f64> {
        Some(SolarEphemeris::at(time).azimuth(latitude_deg, longitude_deg))
    }

    fn row_altitudes(&self, time: &DateTime<Utc>, latitude_deg: f64, longitudes_deg: &[f64]) -> Vec<f64> {
        let ephemeris = SolarEphemeris::at(time);
        longitudes_deg
            .iter()
            .map(|&lng| ephemeris.altitude(latitude_deg, lng))
            .collect()
    }
}
