//! Model Configuration
//!
//! ## Overview
//!
//! A filter is defined by a discrete linear state-space model with shaped
//! process and measurement noise:
//!
//! ```text
//! x(k+1) = A·x(k) + B·u + G·w(k),     w ~ N(0, Q)
//! y(k)   = C·x(k) + D·u + H·v(k),     v ~ N(0, R)
//! ```
//!
//! The control input `u` is constant for the filter's lifetime and lives on
//! the model rather than being passed per step.
//!
//! ## Shapes
//!
//! ```text
//! A  n×n    B  n×m    C  p×n    D  p×m
//! G  n×q    Q  q×q    H  p×r    R  r×r
//! u  m      P⁻(0)  n×n    x⁻(0)  n    y(0)  p
//! ```
//!
//! `n`, `m`, `p`, `q` and `r` are taken from A, B, C, G and H; everything else
//! is checked against them by [`LinearModel::dimensions`] and the filter
//! refuses to build when anything disagrees.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    errors::{FilterError, FilterResult},
    linalg::{Matrix, Vector},
};

/// Default number of time-step records kept before FIFO eviction
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// System and tuning matrices plus the constant control input
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearModel {
    /// State transition matrix (A)
    pub transition: Matrix,
    /// Input matrix (B)
    pub input_matrix: Matrix,
    /// Output matrix (C) - maps state to measurements
    pub output_matrix: Matrix,
    /// Feedthrough matrix (D)
    pub feedthrough: Matrix,
    /// Measurement-noise shaping matrix (H)
    pub measurement_shaping: Matrix,
    /// Process-noise shaping matrix (G)
    pub process_shaping: Matrix,
    /// Measurement-noise covariance (R)
    pub measurement_covariance: Matrix,
    /// Process-noise covariance (Q)
    pub process_covariance: Matrix,
    /// Constant control input (u)
    pub input: Vector,
}

impl LinearModel {
    /// Assemble a model; arguments follow the conventional `A, B, C, D, H, G,
    /// R, Q, u` order
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        a: Matrix,
        b: Matrix,
        c: Matrix,
        d: Matrix,
        h: Matrix,
        g: Matrix,
        r: Matrix,
        q: Matrix,
        input: Vector,
    ) -> Self {
        Self {
            transition: a,
            input_matrix: b,
            output_matrix: c,
            feedthrough: d,
            measurement_shaping: h,
            process_shaping: g,
            measurement_covariance: r,
            process_covariance: q,
            input,
        }
    }

    /// Check every matrix against the others and return the model dimensions
    pub fn dimensions(&self) -> FilterResult<Dimensions> {
        let dims = Dimensions {
            states: self.transition.nrows(),
            inputs: self.input_matrix.ncols(),
            outputs: self.output_matrix.nrows(),
            process_noise: self.process_shaping.ncols(),
            measurement_noise: self.measurement_shaping.ncols(),
        };
        let n = dims.states;

        expect_shape("A (state transition)", self.transition.shape(), (n, n))?;
        expect_shape("B (input matrix)", self.input_matrix.shape(), (n, dims.inputs))?;
        expect_shape("C (output matrix)", self.output_matrix.shape(), (dims.outputs, n))?;
        expect_shape(
            "D (feedthrough)",
            self.feedthrough.shape(),
            (dims.outputs, dims.inputs),
        )?;
        expect_shape(
            "G (process shaping)",
            self.process_shaping.shape(),
            (n, dims.process_noise),
        )?;
        expect_shape(
            "H (measurement shaping)",
            self.measurement_shaping.shape(),
            (dims.outputs, dims.measurement_noise),
        )?;
        expect_shape(
            "Q (process covariance)",
            self.process_covariance.shape(),
            (dims.process_noise, dims.process_noise),
        )?;
        expect_shape(
            "R (measurement covariance)",
            self.measurement_covariance.shape(),
            (dims.measurement_noise, dims.measurement_noise),
        )?;
        expect_shape("u (input)", self.input.shape(), (dims.inputs, 1))?;

        Ok(dims)
    }
}

/// Sizes implied by a validated [`LinearModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// State dimension (n)
    pub states: usize,
    /// Control input dimension (m)
    pub inputs: usize,
    /// Measurement dimension (p)
    pub outputs: usize,
    /// Process-noise dimension (q)
    pub process_noise: usize,
    /// Measurement-noise dimension (r)
    pub measurement_noise: usize,
}

impl Dimensions {
    /// Reject a measurement that is not `p` long
    pub fn check_measurement(&self, measurement: &Vector) -> FilterResult<()> {
        expect_shape("y (measurement)", measurement.shape(), (self.outputs, 1))
    }
}

/// Seed record for time index 0
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InitialConditions {
    /// A priori error covariance P⁻(0)
    pub a_priori_covariance: Matrix,
    /// A priori state estimate x⁻(0)
    pub a_priori_state: Vector,
    /// Measurement y(0); `None` when nothing was observed at index 0
    pub measurement: Option<Vector>,
}

impl InitialConditions {
    /// Bundle the index-0 seed
    pub fn new(
        a_priori_covariance: Matrix,
        a_priori_state: Vector,
        measurement: Option<Vector>,
    ) -> Self {
        Self {
            a_priori_covariance,
            a_priori_state,
            measurement,
        }
    }

    pub(crate) fn check(&self, dims: &Dimensions) -> FilterResult<()> {
        let n = dims.states;
        expect_shape("P⁻(0) (initial covariance)", self.a_priori_covariance.shape(), (n, n))?;
        expect_shape("x⁻(0) (initial state)", self.a_priori_state.shape(), (n, 1))?;
        if let Some(measurement) = &self.measurement {
            dims.check_measurement(measurement)?;
        }
        Ok(())
    }
}

/// Runtime options that are not part of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterConfig {
    /// Maximum retained time-step records before the oldest is evicted
    pub history_capacity: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl FilterConfig {
    /// Set the history capacity
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub(crate) fn check(&self) -> FilterResult<()> {
        if self.history_capacity == 0 {
            return Err(FilterError::InvalidCapacity);
        }
        Ok(())
    }
}

fn expect_shape(
    what: &'static str,
    found: (usize, usize),
    expected: (usize, usize),
) -> FilterResult<()> {
    if found == expected {
        Ok(())
    } else {
        Err(FilterError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}
