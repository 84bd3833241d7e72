//! Shared Filter for Concurrent Callers
//!
//! ## Access Discipline
//!
//! A query that misses the history fills it, so at most one mutating
//! operation may run at a time. Records are never modified once written
//! (only evicted), so reading an already cached value only needs shared
//! access.
//!
//! [`SharedFilter`] maps that onto a single `RwLock`:
//!
//! ```text
//! query(k) ──read lock──→ cached? ──yes──→ clone, release
//!                            │
//!                            no
//!                            ↓
//!             ──write lock──→ lookup-or-compute-and-store
//!
//! ingest(y) ──write lock──→ append, resolve + evict oldest
//! ```
//!
//! The record read under the shared lock cannot be evicted while the lock is
//! held, because eviction needs the exclusive lock.
//!
//! A poisoned lock is recovered rather than propagated: a panic can only
//! happen between complete record writes, so the filter is still consistent.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    errors::FilterResult,
    filter::KalmanFilter,
    history::Record,
    linalg::{DenseAlgebra, LinearAlgebra, Matrix, Vector},
};

/// [`KalmanFilter`] behind one reader-writer lock
#[derive(Debug)]
pub struct SharedFilter<L = DenseAlgebra> {
    inner: RwLock<KalmanFilter<L>>,
}

impl<L: LinearAlgebra> SharedFilter<L> {
    /// Take ownership of a filter
    pub fn new(filter: KalmanFilter<L>) -> Self {
        Self {
            inner: RwLock::new(filter),
        }
    }

    /// Give the filter back
    pub fn into_inner(self) -> KalmanFilter<L> {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, KalmanFilter<L>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, KalmanFilter<L>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached value under the read lock, else fill under the write lock
    fn lookup<T, C, F>(&self, k: usize, cached: C, fill: F) -> FilterResult<T>
    where
        T: Clone,
        C: Fn(&Record) -> Option<&T>,
        F: FnOnce(&mut KalmanFilter<L>, usize) -> FilterResult<T>,
    {
        let hit = {
            let filter = self.read();
            filter.record(k).and_then(&cached).cloned()
        };
        match hit {
            Some(value) => Ok(value),
            None => {
                let mut filter = self.write();
                fill(&mut *filter, k)
            }
        }
    }

    /// See [`KalmanFilter::ingest`]
    pub fn ingest(&self, measurement: Option<Vector>) -> FilterResult<()> {
        self.write().ingest(measurement)
    }

    /// See [`KalmanFilter::current_index`]
    pub fn current_index(&self) -> usize {
        self.read().current_index()
    }

    /// See [`KalmanFilter::oldest_index`]
    pub fn oldest_index(&self) -> usize {
        self.read().oldest_index()
    }

    /// See [`KalmanFilter::horizon`]
    pub fn horizon(&self) -> usize {
        self.read().horizon()
    }

    /// See [`KalmanFilter::retained`]
    pub fn retained(&self) -> usize {
        self.read().retained()
    }

    /// See [`KalmanFilter::capacity`]
    pub fn capacity(&self) -> usize {
        self.read().capacity()
    }

    /// Copy of the stored measurement, see [`KalmanFilter::measurement`]
    pub fn measurement(&self, k: usize) -> Option<Option<Vector>> {
        self.read()
            .measurement(k)
            .map(|measurement| measurement.cloned())
    }

    /// See [`KalmanFilter::innovation`]
    ///
    /// Always takes the write lock: ŷ(k) may still need filling.
    pub fn innovation(&self, k: usize) -> FilterResult<Option<Vector>> {
        self.write().innovation(k)
    }

    /// See [`KalmanFilter::a_priori_error_covariance`]
    pub fn a_priori_error_covariance(&self, k: usize) -> FilterResult<Matrix> {
        self.lookup(k, Record::a_priori_error_covariance, |filter, k| {
            filter.a_priori_error_covariance(k)
        })
    }

    /// See [`KalmanFilter::a_posteriori_error_covariance`]
    pub fn a_posteriori_error_covariance(&self, k: usize) -> FilterResult<Matrix> {
        self.lookup(k, Record::a_posteriori_error_covariance, |filter, k| {
            filter.a_posteriori_error_covariance(k)
        })
    }

    /// See [`KalmanFilter::kalman_gain`]
    pub fn kalman_gain(&self, k: usize) -> FilterResult<Matrix> {
        self.lookup(k, Record::kalman_gain, |filter, k| filter.kalman_gain(k))
    }

    /// See [`KalmanFilter::a_priori_state_estimate`]
    pub fn a_priori_state_estimate(&self, k: usize) -> FilterResult<Vector> {
        self.lookup(k, Record::a_priori_state_estimate, |filter, k| {
            filter.a_priori_state_estimate(k)
        })
    }

    /// See [`KalmanFilter::a_posteriori_state_estimate`]
    pub fn a_posteriori_state_estimate(&self, k: usize) -> FilterResult<Vector> {
        self.lookup(k, Record::a_posteriori_state_estimate, |filter, k| {
            filter.a_posteriori_state_estimate(k)
        })
    }

    /// See [`KalmanFilter::a_priori_output_estimate`]
    pub fn a_priori_output_estimate(&self, k: usize) -> FilterResult<Vector> {
        self.lookup(k, Record::a_priori_output_estimate, |filter, k| {
            filter.a_priori_output_estimate(k)
        })
    }
}
