//! Filter Aggregate, Ingestion and Window Management
//!
//! ## Overview
//!
//! [`KalmanFilter`] owns the model, the precomputed noise terms and the
//! bounded history. This module covers construction, measurement ingestion and
//! the sliding window; the recurrences that fill the history live in
//! [`estimator`](crate::estimator).
//!
//! ## Ingestion
//!
//! Each call to [`KalmanFilter::ingest`] appends one record and advances the
//! current index by one:
//!
//! ```text
//! ingest(y)  →  records: [k0 … k(n-1)] + [kn]
//!                                 │
//!                  len > capacity? └─→ resolve P⁺, x⁺ of oldest
//!                                      keep what resolved as anchor
//!                                      drop oldest
//! ```
//!
//! Eviction never fails. If the oldest record cannot be fully resolved (a
//! singular innovation covariance), it is dropped anyway with whatever did
//! resolve, and queries that would need the rest report `IndexOutOfRange`.
//! The only way `ingest` fails is a measurement of the wrong length.

use crate::{
    errors::FilterResult,
    history::{History, Record},
    linalg::{DenseAlgebra, LinearAlgebra, Matrix, Vector},
    model::{Dimensions, FilterConfig, InitialConditions, LinearModel},
};

/// Linear Kalman filter with a memoized, bounded estimate history
///
/// ## Type Parameters
/// - `L`: linear algebra backend, [`DenseAlgebra`] unless instrumenting
///
/// Queries take `&mut self` because a miss fills the history; the `&self`
/// [`record`](Self::record) accessor reads whatever is already cached.
#[derive(Debug)]
pub struct KalmanFilter<L = DenseAlgebra> {
    pub(crate) model: LinearModel,
    pub(crate) dims: Dimensions,
    /// G·Q·Gᵗ
    pub(crate) process_noise: Matrix,
    /// H·R·Hᵗ
    pub(crate) measurement_noise: Matrix,
    pub(crate) history: History,
    pub(crate) algebra: L,
}

impl KalmanFilter<DenseAlgebra> {
    /// Build a filter with the default history capacity
    pub fn new(model: LinearModel, initial: InitialConditions) -> FilterResult<Self> {
        Self::with_config(model, initial, FilterConfig::default())
    }

    /// Build a filter with explicit runtime options
    pub fn with_config(
        model: LinearModel,
        initial: InitialConditions,
        config: FilterConfig,
    ) -> FilterResult<Self> {
        Self::with_backend(model, initial, config, DenseAlgebra)
    }
}

impl<L: LinearAlgebra> KalmanFilter<L> {
    /// Build a filter on a custom linear algebra backend
    ///
    /// Fails with `DimensionMismatch` when the model or initial conditions are
    /// not conformant and with `InvalidCapacity` for a zero capacity.
    pub fn with_backend(
        model: LinearModel,
        initial: InitialConditions,
        config: FilterConfig,
        algebra: L,
    ) -> FilterResult<Self> {
        config.check()?;
        let dims = model.dimensions()?;
        initial.check(&dims)?;

        let process_noise = algebra.congruence(&model.process_shaping, &model.process_covariance);
        let measurement_noise =
            algebra.congruence(&model.measurement_shaping, &model.measurement_covariance);

        let seed = Record {
            a_priori_covariance: Some(initial.a_priori_covariance),
            a_priori_state: Some(initial.a_priori_state),
            ..Record::ingested(initial.measurement)
        };

        log_debug!(
            "kalman filter: n={} m={} p={} q={} r={} capacity={}",
            dims.states,
            dims.inputs,
            dims.outputs,
            dims.process_noise,
            dims.measurement_noise,
            config.history_capacity
        );

        Ok(Self {
            model,
            dims,
            process_noise,
            measurement_noise,
            history: History::new(config.history_capacity, seed),
            algebra,
        })
    }

    /// Append the measurement for the next time index
    ///
    /// `None` records an explicitly missing measurement, for which the
    /// a posteriori state is the unchanged prediction.
    ///
    /// Fails only with `DimensionMismatch`, before anything is changed.
    pub fn ingest(&mut self, measurement: Option<Vector>) -> FilterResult<()> {
        if let Some(measurement) = &measurement {
            self.dims.check_measurement(measurement)?;
        }

        if self.history.is_full() {
            self.resolve_oldest();
        }

        let missing = measurement.is_none();
        self.history.push(Record::ingested(measurement));
        log_trace!("ingested index {} (missing: {})", self.current_index(), missing);

        if self.history.len() > self.history.capacity() {
            if let Some(evicted) = self.history.evict_oldest() {
                log_trace!("evicted index {}", evicted);
            }
        }

        Ok(())
    }

    /// Fill P⁺ and x⁺ of the oldest record ahead of its eviction
    ///
    /// Each half is attempted on its own; a failure only means that half is
    /// not carried into the anchor.
    fn resolve_oldest(&mut self) {
        let oldest = self.history.oldest_index();
        if self.a_posteriori_error_covariance(oldest).is_err() {
            log_warn!("evicting index {} without a posteriori covariance", oldest);
        }
        if self.a_posteriori_state_estimate(oldest).is_err() {
            log_warn!("evicting index {} without a posteriori state", oldest);
        }
    }

    /// Index of the most recently ingested measurement
    pub fn current_index(&self) -> usize {
        self.history.horizon() - 1
    }

    /// Number of measurements ingested so far, including the initial one
    pub fn horizon(&self) -> usize {
        self.history.horizon()
    }

    /// Oldest absolute index still answerable
    pub fn oldest_index(&self) -> usize {
        self.history.oldest_index()
    }

    /// Number of records currently held
    pub fn retained(&self) -> usize {
        self.history.len()
    }

    /// Configured history capacity
    pub fn capacity(&self) -> usize {
        self.history.capacity()
    }

    /// Cached record at `index`, if it is still retained
    pub fn record(&self, index: usize) -> Option<&Record> {
        self.history.get(index)
    }

    /// Stored measurement at `index`
    ///
    /// Outer `None`: no record (evicted or not yet ingested). Inner `None`:
    /// the measurement was recorded as missing.
    pub fn measurement(&self, index: usize) -> Option<Option<&Vector>> {
        self.history.get(index).map(Record::measurement)
    }

    /// Model the filter was built from
    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// Validated model dimensions
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Linear algebra backend
    pub fn backend(&self) -> &L {
        &self.algebra
    }
}
