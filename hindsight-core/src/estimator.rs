//! Recursive Estimator
//!
//! ## Recurrences
//!
//! Every quantity at time index `k` is defined in terms of the a posteriori
//! record at `k−1`:
//!
//! ```text
//! P⁻(k) = A·P⁺(k−1)·Aᵗ + G·Q·Gᵗ
//! K(k)  = P⁻(k)·Cᵗ·[C·P⁻(k)·Cᵗ + H·R·Hᵗ]⁻¹
//! P⁺(k) = (I − K(k)·C)·P⁻(k)·(I − K(k)·C)ᵗ + K(k)·H·R·Hᵗ·K(k)ᵗ
//! x⁻(k) = A·x⁺(k−1) + B·u
//! ŷ(k)  = C·x⁻(k) + D·u
//! x⁺(k) = x⁻(k) + K(k)·(y(k) − ŷ(k))      y(k) observed
//!       = x⁻(k)                           y(k) missing, or k beyond horizon
//! ```
//!
//! The covariance update is the Joseph form, which keeps P⁺ symmetric and
//! positive semi-definite for any gain.
//!
//! ## Lookup, Compute, Store
//!
//! Each query first looks in the history. On a miss it walks backward to the
//! nearest resolved record (or the eviction anchor), then fills forward one
//! step at a time:
//!
//! ```text
//! query x⁺(9)        cached: x⁺(5)
//!
//!   walk back   9 → 8 → 7 → 6 → 5 ✓
//!   fill fwd    x⁻(6) x⁺(6) … x⁻(9) x⁺(9)
//! ```
//!
//! A step is written to the history only if its index has a record, i.e. a
//! measurement (possibly missing) has been ingested for it. Steps past the
//! horizon are recomputed on every query. Walking iteratively keeps stack
//! depth constant no matter how far ahead a query reaches.
//!
//! A singular innovation covariance aborts the query with an error before
//! anything is stored for that index.

use crate::{
    errors::{FilterError, FilterResult},
    filter::KalmanFilter,
    linalg::{LinearAlgebra, Matrix, Vector},
};

impl<L: LinearAlgebra> KalmanFilter<L> {
    /// A priori error covariance P⁻(k)
    pub fn a_priori_error_covariance(&mut self, k: usize) -> FilterResult<Matrix> {
        self.check_retained(k)?;
        self.prior_covariance(k)
    }

    /// A posteriori error covariance P⁺(k)
    pub fn a_posteriori_error_covariance(&mut self, k: usize) -> FilterResult<Matrix> {
        self.check_retained(k)?;
        self.posterior_covariance(k)
    }

    /// Kalman gain K(k)
    ///
    /// Fails with `SingularInnovationCovariance` when the innovation
    /// covariance at `k` cannot be inverted.
    pub fn kalman_gain(&mut self, k: usize) -> FilterResult<Matrix> {
        self.check_retained(k)?;
        self.gain(k)
    }

    /// A priori state estimate x⁻(k)
    pub fn a_priori_state_estimate(&mut self, k: usize) -> FilterResult<Vector> {
        self.check_retained(k)?;
        self.prior_state(k)
    }

    /// A posteriori state estimate x⁺(k)
    ///
    /// Beyond the ingested horizon this is the pure prediction x⁻(k) and is
    /// not cached.
    pub fn a_posteriori_state_estimate(&mut self, k: usize) -> FilterResult<Vector> {
        self.check_retained(k)?;
        self.posterior_state(k)
    }

    /// A priori output estimate ŷ(k)
    pub fn a_priori_output_estimate(&mut self, k: usize) -> FilterResult<Vector> {
        self.check_retained(k)?;
        self.prior_output(k)
    }

    /// Innovation y(k) − ŷ(k)
    ///
    /// `None` when the measurement at `k` is missing or `k` is beyond the
    /// horizon.
    pub fn innovation(&mut self, k: usize) -> FilterResult<Option<Vector>> {
        self.check_retained(k)?;

        let measurement = match self.history.get(k).and_then(|r| r.measurement.clone()) {
            Some(measurement) => measurement,
            None => return Ok(None),
        };
        let output = self.prior_output(k)?;

        Ok(Some(self.algebra.subtract_vector(&measurement, &output)))
    }

    fn check_retained(&self, k: usize) -> FilterResult<()> {
        let oldest = self.history.oldest_index();
        if k < oldest {
            log_debug!("rejected query for evicted index {} (oldest {})", k, oldest);
            return Err(FilterError::IndexOutOfRange { index: k, oldest });
        }
        Ok(())
    }

    /// Predecessor of `index` for a backward walk started at `requested`
    fn step_back(&self, index: usize, requested: usize) -> FilterResult<usize> {
        let oldest = self.history.oldest_index();
        match index.checked_sub(1) {
            Some(previous) if index >= oldest => Ok(previous),
            _ => Err(FilterError::IndexOutOfRange {
                index: requested,
                oldest,
            }),
        }
    }

    // ===== COVARIANCE CHAIN =====

    fn prior_covariance(&mut self, k: usize) -> FilterResult<Matrix> {
        if let Some(cached) = self.history.get(k).and_then(|r| r.a_priori_covariance.as_ref()) {
            return Ok(cached.clone());
        }

        let previous = self.posterior_covariance(self.step_back(k, k)?)?;
        Ok(self.propagate_covariance(k, &previous))
    }

    fn gain(&mut self, k: usize) -> FilterResult<Matrix> {
        if let Some(cached) = self.history.get(k).and_then(|r| r.gain.as_ref()) {
            return Ok(cached.clone());
        }

        let prior = self.prior_covariance(k)?;
        self.gain_from(k, &prior)
    }

    fn posterior_covariance(&mut self, k: usize) -> FilterResult<Matrix> {
        let mut index = k;
        let mut prior = loop {
            if let Some(posterior) = self.history.a_posteriori_covariance(index) {
                if index == k {
                    return Ok(posterior.clone());
                }
                let posterior = posterior.clone();
                index += 1;
                break self.propagate_covariance(index, &posterior);
            }
            if let Some(prior) = self.history.get(index).and_then(|r| r.a_priori_covariance.as_ref()) {
                break prior.clone();
            }
            index = self.step_back(index, k)?;
        };

        loop {
            let gain = self.gain_from(index, &prior)?;
            let posterior = self.correct_covariance(index, &prior, &gain);
            if index == k {
                return Ok(posterior);
            }
            index += 1;
            prior = self.propagate_covariance(index, &posterior);
        }
    }

    /// P⁻(index) from P⁺(index−1)
    fn propagate_covariance(&mut self, index: usize, previous_posterior: &Matrix) -> Matrix {
        if let Some(cached) = self.history.get(index).and_then(|r| r.a_priori_covariance.as_ref()) {
            return cached.clone();
        }

        let propagated = self.algebra.congruence(&self.model.transition, previous_posterior);
        let prior = self.algebra.add(&propagated, &self.process_noise);

        if let Some(record) = self.history.get_mut(index) {
            record.a_priori_covariance = Some(prior.clone());
        }
        prior
    }

    /// K(index) from P⁻(index)
    fn gain_from(&mut self, index: usize, prior: &Matrix) -> FilterResult<Matrix> {
        if let Some(cached) = self.history.get(index).and_then(|r| r.gain.as_ref()) {
            return Ok(cached.clone());
        }

        let output = &self.model.output_matrix;
        let output_t = self.algebra.transpose(output);
        let cross = self.algebra.multiply(prior, &output_t);
        let projected = self.algebra.multiply(output, &cross);
        let innovation_covariance = self.algebra.add(&projected, &self.measurement_noise);

        let gain = self
            .algebra
            .invert(&innovation_covariance)
            .map(|inverse| self.algebra.multiply(&cross, &inverse))
            .filter(|gain| gain.iter().all(|value| value.is_finite()))
            .ok_or_else(|| {
                log_warn!("innovation covariance at index {} is singular", index);
                FilterError::SingularInnovationCovariance { index }
            })?;

        if let Some(record) = self.history.get_mut(index) {
            record.gain = Some(gain.clone());
        }
        Ok(gain)
    }

    /// P⁺(index) from P⁻(index) and K(index), Joseph form
    fn correct_covariance(&mut self, index: usize, prior: &Matrix, gain: &Matrix) -> Matrix {
        if let Some(cached) = self.history.get(index).and_then(|r| r.a_posteriori_covariance.as_ref()) {
            return cached.clone();
        }

        let identity = self.algebra.identity(self.dims.states);
        let gain_output = self.algebra.multiply(gain, &self.model.output_matrix);
        let factor = self.algebra.subtract(&identity, &gain_output);
        let retained = self.algebra.congruence(&factor, prior);
        let injected = self.algebra.congruence(gain, &self.measurement_noise);
        let posterior = self.algebra.add(&retained, &injected);

        if let Some(record) = self.history.get_mut(index) {
            record.a_posteriori_covariance = Some(posterior.clone());
        }
        posterior
    }

    // ===== STATE CHAIN =====

    fn prior_state(&mut self, k: usize) -> FilterResult<Vector> {
        if let Some(cached) = self.history.get(k).and_then(|r| r.a_priori_state.as_ref()) {
            return Ok(cached.clone());
        }

        let previous = self.posterior_state(self.step_back(k, k)?)?;
        Ok(self.predict_state(k, &previous))
    }

    fn prior_output(&mut self, k: usize) -> FilterResult<Vector> {
        if let Some(cached) = self.history.get(k).and_then(|r| r.a_priori_output.as_ref()) {
            return Ok(cached.clone());
        }

        let prior = self.prior_state(k)?;
        Ok(self.predict_output(k, &prior))
    }

    fn posterior_state(&mut self, k: usize) -> FilterResult<Vector> {
        let mut index = k;
        let mut prior = loop {
            if let Some(posterior) = self.history.a_posteriori_state(index) {
                if index == k {
                    return Ok(posterior.clone());
                }
                let posterior = posterior.clone();
                index += 1;
                break self.predict_state(index, &posterior);
            }
            if let Some(prior) = self.history.get(index).and_then(|r| r.a_priori_state.as_ref()) {
                break prior.clone();
            }
            index = self.step_back(index, k)?;
        };

        loop {
            let posterior = self.correct_state(index, &prior)?;
            if index == k {
                return Ok(posterior);
            }
            index += 1;
            prior = self.predict_state(index, &posterior);
        }
    }

    /// x⁻(index) from x⁺(index−1)
    fn predict_state(&mut self, index: usize, previous_posterior: &Vector) -> Vector {
        if let Some(cached) = self.history.get(index).and_then(|r| r.a_priori_state.as_ref()) {
            return cached.clone();
        }

        let propagated = self.algebra.multiply_vector(&self.model.transition, previous_posterior);
        let driven = self.algebra.multiply_vector(&self.model.input_matrix, &self.model.input);
        let prior = self.algebra.add_vector(&propagated, &driven);

        if let Some(record) = self.history.get_mut(index) {
            record.a_priori_state = Some(prior.clone());
        }
        prior
    }

    /// ŷ(index) from x⁻(index)
    fn predict_output(&mut self, index: usize, prior_state: &Vector) -> Vector {
        if let Some(cached) = self.history.get(index).and_then(|r| r.a_priori_output.as_ref()) {
            return cached.clone();
        }

        let observed = self.algebra.multiply_vector(&self.model.output_matrix, prior_state);
        let passed = self.algebra.multiply_vector(&self.model.feedthrough, &self.model.input);
        let output = self.algebra.add_vector(&observed, &passed);

        if let Some(record) = self.history.get_mut(index) {
            record.a_priori_output = Some(output.clone());
        }
        output
    }

    /// x⁺(index) from x⁻(index)
    fn correct_state(&mut self, index: usize, prior: &Vector) -> FilterResult<Vector> {
        if !self.history.contains(index) {
            // Beyond the horizon: pure prediction, never cached
            return Ok(prior.clone());
        }
        if let Some(cached) = self.history.get(index).and_then(|r| r.a_posteriori_state.as_ref()) {
            return Ok(cached.clone());
        }

        let measurement = self.history.get(index).and_then(|r| r.measurement.clone());
        let posterior = match measurement {
            None => prior.clone(),
            Some(measurement) => {
                let output = self.predict_output(index, prior);
                let gain = self.gain(index)?;
                let innovation = self.algebra.subtract_vector(&measurement, &output);
                let correction = self.algebra.multiply_vector(&gain, &innovation);
                self.algebra.add_vector(prior, &correction)
            }
        };

        if let Some(record) = self.history.get_mut(index) {
            log_trace!("resolved a posteriori state at index {}", index);
            record.a_posteriori_state = Some(posterior.clone());
        }
        Ok(posterior)
    }
}
