use crate::core::{AnalysisRequest, GridScanner, IntersectionCombiner, LocationEstimator};
use crate::io::{extract_measurement, ImagePoint};
use crate::types::{AnalysisResult, ShadowError};
use numpy::{IntoPyArray, PyArray2};
use pyo3::prelude::*;

fn to_py_err(err: ShadowError) -> PyErr {
    match err {
        ShadowError::InvalidMeasurement(_) | ShadowError::InvalidTimestamp(_) => {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", err))
        }
        _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}", err)),
    }
}

/// Python module definition
#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyAnalysisResult>()?;
    m.add_function(wrap_pyfunction!(analyze, m)?)?;
    m.add_function(wrap_pyfunction!(measure, m)?)?;
    m.add_function(wrap_pyfunction!(intersect, m)?)?;
    Ok(())
}

/// Scan the global grid for one photo
#[pyfunction]
fn analyze(object_height: f64, shadow_length: f64, known_time: String) -> PyResult<PyAnalysisResult> {
    let request = AnalysisRequest::new(object_height, shadow_length, known_time);
    let result = GridScanner::new().analyze(&request).map_err(to_py_err)?;
    Ok(PyAnalysisResult { inner: result })
}

/// Object height and shadow length from three (x, y) image points
#[pyfunction]
fn measure(object_base: (f64, f64), object_top: (f64, f64), shadow_tip: (f64, f64)) -> (f64, f64) {
    let m = extract_measurement(
        ImagePoint::new(object_base.0, object_base.1),
        ImagePoint::new(object_top.0, object_top.1),
        ImagePoint::new(shadow_tip.0, shadow_tip.1),
    );
    (m.object_height, m.shadow_length)
}

/// Intersect two scans; returns (points, best location or None)
#[pyfunction]
#[allow(clippy::type_complexity)]
fn intersect(
    first: PyRef<'_, PyAnalysisResult>,
    second: PyRef<'_, PyAnalysisResult>,
) -> PyResult<(Vec<(f64, f64, f64)>, Option<(f64, f64, f64)>)> {
    let combined = IntersectionCombiner::new()
        .combine(&first.inner, &second.inner)
        .map_err(to_py_err)?;

    let points = combined
        .points
        .iter()
        .map(|p| (p.lat, p.lng, p.combined_likelihood))
        .collect();
    let best = combined
        .best_location
        .map(|b| (b.latitude, b.longitude, b.accuracy_km));
    Ok((points, best))
}

/// Python wrapper for AnalysisResult
#[pyclass(name = "AnalysisResult")]
struct PyAnalysisResult {
    inner: AnalysisResult,
}

#[pymethods]
impl PyAnalysisResult {
    #[getter]
    fn captured_at(&self) -> String {
        self.inner.captured_at.to_rfc3339()
    }

    #[getter]
    fn valid_points(&self) -> usize {
        self.inner.band_stats.valid_points
    }

    #[getter]
    fn night_points(&self) -> usize {
        self.inner.band_stats.night_points
    }

    #[getter]
    fn band_counts(&self) -> (usize, usize, usize, usize) {
        let stats = &self.inner.band_stats;
        (stats.ultra_tight, stats.tight, stats.main_band, stats.visible)
    }

    #[getter]
    fn tight_band_range(&self) -> ((f64, f64), (f64, f64)) {
        let range = &self.inner.tight_band_range;
        (
            (range.lat_range.min, range.lat_range.max),
            (range.lng_range.min, range.lng_range.max),
        )
    }

    /// (latitude, longitude, accuracy_km)
    fn best_location(&self) -> PyResult<(f64, f64, f64)> {
        let best = LocationEstimator::new()
            .estimate(&self.inner.points)
            .map_err(to_py_err)?;
        Ok((best.latitude, best.longitude, best.accuracy_km))
    }

    /// Likelihood raster (290 x 720, row 0 = 60°S), night cells = -1
    fn likelihood_grid<'py>(&self, py: Python<'py>) -> &'py PyArray2<f64> {
        self.inner.likelihood_grid().into_pyarray(py)
    }

    fn __str__(&self) -> String {
        format!(
            "AnalysisResult(captured_at='{}', valid={}, ultra_tight={}, visible={})",
            self.inner.captured_at.to_rfc3339(),
            self.inner.band_stats.valid_points,
            self.inner.band_stats.ultra_tight,
            self.inner.band_stats.visible
        )
    }
}
