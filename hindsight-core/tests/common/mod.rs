//! Common fixtures and assertion helpers for integration tests
//!
//! This module provides:
//! - Reference systems with known first-step results
//! - A deterministic measurement generator
//! - Covariance shape checks (symmetry, positive semi-definiteness, trace)

#![allow(dead_code)]

use hindsight_core::{
    CountingAlgebra, DenseAlgebra, FilterConfig, InitialConditions, KalmanFilter, LinearModel,
    Matrix, Vector,
};

/// Assert two floats agree within an absolute tolerance
#[macro_export]
macro_rules! assert_within_tolerance {
    ($actual:expr, $expected:expr, $tolerance:expr) => {
        let diff = ($actual - $expected).abs();
        if diff > $tolerance {
            panic!(
                "Value {} not within tolerance {} of expected {} (diff: {})",
                $actual, $tolerance, $expected, diff
            );
        }
    };
}

/// 2-state system whose first correction is x⁺(0) = [-0.5, 0]
pub fn two_state_system() -> (LinearModel, InitialConditions) {
    let model = LinearModel::new(
        Matrix::from_row_slice(2, 2, &[-1.0, 1.0, 0.0, -3.0]),
        Matrix::from_row_slice(2, 1, &[0.0, 1.0]),
        Matrix::from_row_slice(1, 2, &[1.0, 0.0]),
        Matrix::from_row_slice(1, 1, &[4.0]),
        Matrix::from_row_slice(1, 2, &[-1.0, 1.0]),
        Matrix::from_row_slice(2, 1, &[1.0, 0.0]),
        Matrix::identity(2, 2),
        Matrix::from_row_slice(1, 1, &[2.0]),
        Vector::from_vec(vec![1.0]),
    );
    let initial = InitialConditions::new(
        Matrix::from_diagonal(&Vector::from_vec(vec![2.0, 1.0])),
        Vector::zeros(2),
        Some(Vector::from_vec(vec![3.0])),
    );
    (model, initial)
}

/// Planar tracker: state [x, y, vy, vx], positions observed, constant
/// acceleration input on y
pub fn tracking_system() -> (LinearModel, InitialConditions) {
    #[rustfmt::skip]
    let a = Matrix::from_row_slice(4, 4, &[
        1.0, 0.0, 0.0, 0.1,
        0.0, 1.0, 0.1, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ]);
    let model = LinearModel::new(
        a,
        Matrix::from_row_slice(4, 1, &[0.0, 0.005, 0.1, 0.0]),
        Matrix::from_row_slice(2, 4, &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
        Matrix::zeros(2, 1),
        Matrix::from_row_slice(2, 2, &[0.1, 0.1, 0.2, 0.2]),
        Matrix::from_diagonal(&Vector::from_vec(vec![0.2, 0.2, 0.1, 0.1])),
        Matrix::from_diagonal(&Vector::from_vec(vec![0.2, 0.2])),
        Matrix::from_diagonal(&Vector::from_vec(vec![0.2, 0.2, 0.1, 0.1])),
        Vector::from_vec(vec![-0.5]),
    );
    #[rustfmt::skip]
    let covariance = Matrix::from_row_slice(4, 4, &[
        2.0, 0.0, 1.0, 0.0,
        0.0, 2.0, 0.0, 1.0,
        1.0, 0.0, 2.0, 0.0,
        0.0, 1.0, 0.0, 2.0,
    ]);
    let initial = InitialConditions::new(
        covariance,
        Vector::from_vec(vec![300.0, 200.0, 20.0, 20.0]),
        Some(Vector::from_vec(vec![300.0, 200.0])),
    );
    (model, initial)
}

/// Tracking filter with a given capacity
pub fn tracking_filter(capacity: usize) -> KalmanFilter {
    let (model, initial) = tracking_system();
    KalmanFilter::with_config(
        model,
        initial,
        FilterConfig::default().with_history_capacity(capacity),
    )
    .expect("tracking system is conformant")
}

/// Tracking filter on the call-counting backend
pub fn counted_tracking_filter(capacity: usize) -> KalmanFilter<CountingAlgebra> {
    let (model, initial) = tracking_system();
    KalmanFilter::with_backend(
        model,
        initial,
        FilterConfig::default().with_history_capacity(capacity),
        CountingAlgebra::new(DenseAlgebra),
    )
    .expect("tracking system is conformant")
}

/// Deterministic position readings along a slowly curving path
pub fn tracking_measurement(k: usize) -> Vector {
    let t = k as f64 * 0.1;
    let wobble = ((k * 7919) % 13) as f64 * 0.05 - 0.3;
    Vector::from_vec(vec![300.0 + 2.0 * t + wobble, 200.0 + 2.0 * t - 0.25 * t * t - wobble])
}

/// Ingest readings for indices `from..to`
pub fn ingest_range<L: hindsight_core::LinearAlgebra>(
    filter: &mut KalmanFilter<L>,
    from: usize,
    to: usize,
) {
    for k in from..to {
        filter
            .ingest(Some(tracking_measurement(k)))
            .expect("tracking measurement is conformant");
    }
}

pub fn trace(m: &Matrix) -> f64 {
    m.diagonal().sum()
}

/// Largest absolute entry, floored at 1, for relative tolerances
pub fn scale(m: &Matrix) -> f64 {
    m.iter().fold(1.0f64, |acc, value| acc.max(value.abs()))
}

pub fn is_symmetric(m: &Matrix, tolerance: f64) -> bool {
    m.is_square() && (m - m.transpose()).iter().all(|value| value.abs() <= tolerance)
}

pub fn min_eigenvalue(m: &Matrix) -> f64 {
    let symmetric = (m + m.transpose()) * 0.5;
    symmetric
        .symmetric_eigenvalues()
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min)
}

pub fn is_positive_semidefinite(m: &Matrix, tolerance: f64) -> bool {
    min_eigenvalue(m) >= -tolerance
}
