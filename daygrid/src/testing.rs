use chrono::NaiveDate;
use ndarray::{Array1, Array3, ArrayD};
use rand::Rng;

use crate::{dataarray::DataArray, time::TimeAxis};

/// Daily axis from Jan 1 of `start` up to (not including) Jan 1 of `end`.
///
pub(crate) fn daily_axis(start: i32, end: i32) -> TimeAxis {
    TimeAxis::daily(
        NaiveDate::from_ymd_opt(start, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(end, 1, 1).unwrap(),
    )
}

/// A random daily series named "daily" spanning whole years.
///
pub(crate) fn random_daily(start: i32, end: i32) -> DataArray {
    let time = daily_axis(start, end);
    let mut rng = rand::thread_rng();
    let values = Array1::from_iter((0..time.len()).map(|_| rng.gen::<f64>()));

    DataArray::time_series("daily", time, values)
}

/// An all-zero daily series, for tests that only look at graph shape.
///
pub(crate) fn zeros_daily(start: i32, end: i32) -> DataArray {
    let time = daily_axis(start, end);
    let values = Array1::zeros(time.len());

    DataArray::time_series("daily", time, values)
}

/// A random daily grid with dimensions (time, y, x).
///
pub(crate) fn random_daily_grid(start: i32, end: i32, rows: usize, cols: usize) -> DataArray {
    let time = daily_axis(start, end);
    let mut rng = rand::thread_rng();
    let values = Array3::from_shape_fn((time.len(), rows, cols), |_| rng.gen::<f64>());

    DataArray::new("daily", &["time", "y", "x"], values.into_dyn())
        .unwrap()
        .with_time_coord("time", time)
        .unwrap()
}

/// Elementwise equality where NaN equals NaN, with a useful failure
/// message.
///
pub(crate) fn assert_values_eq(left: &ArrayD<f64>, right: &ArrayD<f64>) {
    assert_eq!(left.shape(), right.shape(), "shapes differ");
    for (at, (a, b)) in left.iter().zip(right.iter()).enumerate() {
        let same = (a.is_nan() && b.is_nan()) || a == b;
        assert!(same, "values differ at flat index {at}: {a} vs {b}");
    }
}
