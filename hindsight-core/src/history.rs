//! Bounded History of Time-Step Records
//!
//! ## Overview
//!
//! The history holds one [`Record`] per ingested time index. A record bundles
//! the measurement with the six quantities the estimator derives for that
//! index, each of which starts empty and is filled at most once:
//!
//! ```text
//! Record k
//! ├── measurement      y(k)   (Option: may be explicitly missing)
//! ├── P⁻(k)  P⁺(k)  K(k)
//! └── x⁻(k)  x⁺(k)  ŷ(k)
//! ```
//!
//! Keeping the quantities in one struct means the "parallel sequences" can
//! never drift apart: there is exactly one length, and eviction drops every
//! field of the oldest record at once.
//!
//! ## Absolute Indices
//!
//! Callers always speak in absolute time indices. The store keeps the
//! absolute index of its oldest slot and translates on every access:
//!
//! ```text
//! Absolute:   47  48  49  50  51          oldest = 47, horizon = 52
//!             ┌───┬───┬───┬───┬───┐
//! Slot:       │ 0 │ 1 │ 2 │ 3 │ 4 │
//!             └───┴───┴───┴───┴───┘
//!        ↑
//!        anchor = P⁺(46), x⁺(46)
//!
//! slot(k) = k - oldest     for oldest <= k < horizon
//! ```
//!
//! Indices below `oldest` are gone. Indices at or beyond the horizon have no
//! slot, which is exactly the "compute transiently, never cache" region.
//!
//! ## Anchor
//!
//! When the oldest record is evicted its a posteriori covariance and state
//! are kept as the anchor. Deriving the oldest retained record needs nothing
//! else, so the window can slide forever without losing the ability to
//! answer queries inside it. A half that was never resolved is simply not
//! kept; the chain that needed it ends at the window.

use std::collections::VecDeque;

use crate::linalg::{Matrix, Vector};

/// Everything known about one time index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub(crate) measurement: Option<Vector>,
    pub(crate) a_priori_covariance: Option<Matrix>,
    pub(crate) a_posteriori_covariance: Option<Matrix>,
    pub(crate) gain: Option<Matrix>,
    pub(crate) a_priori_state: Option<Vector>,
    pub(crate) a_posteriori_state: Option<Vector>,
    pub(crate) a_priori_output: Option<Vector>,
}

impl Record {
    /// Fresh record for an ingested measurement, nothing derived yet
    pub(crate) fn ingested(measurement: Option<Vector>) -> Self {
        Self {
            measurement,
            ..Self::default()
        }
    }

    /// Observed measurement, `None` if it was recorded as missing
    pub fn measurement(&self) -> Option<&Vector> {
        self.measurement.as_ref()
    }

    /// Cached P⁻(k)
    pub fn a_priori_error_covariance(&self) -> Option<&Matrix> {
        self.a_priori_covariance.as_ref()
    }

    /// Cached P⁺(k)
    pub fn a_posteriori_error_covariance(&self) -> Option<&Matrix> {
        self.a_posteriori_covariance.as_ref()
    }

    /// Cached K(k)
    pub fn kalman_gain(&self) -> Option<&Matrix> {
        self.gain.as_ref()
    }

    /// Cached x⁻(k)
    pub fn a_priori_state_estimate(&self) -> Option<&Vector> {
        self.a_priori_state.as_ref()
    }

    /// Cached x⁺(k)
    pub fn a_posteriori_state_estimate(&self) -> Option<&Vector> {
        self.a_posteriori_state.as_ref()
    }

    /// Cached ŷ(k)
    pub fn a_priori_output_estimate(&self) -> Option<&Vector> {
        self.a_priori_output.as_ref()
    }

    fn into_anchor(self, index: usize) -> Option<Anchor> {
        if self.a_posteriori_covariance.is_none() && self.a_posteriori_state.is_none() {
            return None;
        }
        Some(Anchor {
            index,
            a_posteriori_covariance: self.a_posteriori_covariance,
            a_posteriori_state: self.a_posteriori_state,
        })
    }
}

/// A posteriori values of the most recently evicted index
///
/// Either half may be absent: x⁺ of a missing measurement needs no gain, so
/// it can survive an index whose P⁺ could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Anchor {
    index: usize,
    a_posteriori_covariance: Option<Matrix>,
    a_posteriori_state: Option<Vector>,
}

/// FIFO-bounded store of records addressed by absolute time index
#[derive(Debug, Clone)]
pub(crate) struct History {
    records: VecDeque<Record>,
    /// Absolute index of `records[0]`
    oldest: usize,
    capacity: usize,
    anchor: Option<Anchor>,
}

impl History {
    /// Create a history whose first record is time index 0
    pub fn new(capacity: usize, seed: Record) -> Self {
        let mut records = VecDeque::with_capacity(capacity.saturating_add(1).min(1024));
        records.push_back(seed);

        Self {
            records,
            oldest: 0,
            capacity,
            anchor: None,
        }
    }

    /// Translate an absolute index to a storage slot
    fn slot(&self, index: usize) -> Option<usize> {
        index
            .checked_sub(self.oldest)
            .filter(|slot| *slot < self.records.len())
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.slot(index).map(|slot| &self.records[slot])
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Record> {
        let slot = self.slot(index)?;
        self.records.get_mut(slot)
    }

    /// Absolute index of the oldest retained record
    pub fn oldest_index(&self) -> usize {
        self.oldest
    }

    /// One past the newest ingested index
    pub fn horizon(&self) -> usize {
        self.oldest + self.records.len()
    }

    /// Whether `index` has a slot (and is therefore cacheable)
    pub fn contains(&self, index: usize) -> bool {
        self.slot(index).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the next push will push the oldest record out
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn push(&mut self, record: Record) {
        self.records.push_back(record);
    }

    /// Drop the oldest record, keeping its a posteriori values as the anchor
    ///
    /// Returns the evicted absolute index. Whatever the record had not
    /// resolved is lost, and queries that would need it report out of range.
    pub fn evict_oldest(&mut self) -> Option<usize> {
        let record = self.records.pop_front()?;
        let index = self.oldest;
        self.oldest += 1;
        self.anchor = record.into_anchor(index);
        Some(index)
    }

    /// P⁺ at `index`, from the records or the anchor
    pub fn a_posteriori_covariance(&self, index: usize) -> Option<&Matrix> {
        match &self.anchor {
            Some(anchor) if anchor.index == index => anchor.a_posteriori_covariance.as_ref(),
            _ => self.get(index)?.a_posteriori_covariance.as_ref(),
        }
    }

    /// x⁺ at `index`, from the records or the anchor
    pub fn a_posteriori_state(&self, index: usize) -> Option<&Vector> {
        match &self.anchor {
            Some(anchor) if anchor.index == index => anchor.a_posteriori_state.as_ref(),
            _ => self.get(index)?.a_posteriori_state.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measured(value: f64) -> Record {
        Record::ingested(Some(Vector::from_vec(vec![value])))
    }

    fn resolved(value: f64) -> Record {
        Record {
            a_posteriori_covariance: Some(Matrix::from_element(1, 1, value)),
            a_posteriori_state: Some(Vector::from_vec(vec![value])),
            ..measured(value)
        }
    }

    #[test]
    fn seeded_history() {
        let history = History::new(5, measured(0.0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.oldest_index(), 0);
        assert_eq!(history.horizon(), 1);
        assert!(history.contains(0));
        assert!(!history.contains(1));
        assert!(history.get(1).is_none());
    }

    #[test]
    fn slots_follow_absolute_indices() {
        let mut history = History::new(3, resolved(0.0));
        for i in 1..5 {
            history.push(resolved(i as f64));
            if history.len() > history.capacity() {
                history.evict_oldest();
            }
        }

        // Should have indices 2, 3, 4 (0 and 1 were evicted)
        assert_eq!(history.len(), 3);
        assert_eq!(history.oldest_index(), 2);
        assert_eq!(history.horizon(), 5);
        assert!(history.get(1).is_none());

        let values: Vec<f64> = (2..5)
            .map(|k| history.get(k).unwrap().measurement().unwrap()[0])
            .collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn eviction_keeps_resolved_anchor() {
        let mut history = History::new(1, resolved(7.0));
        history.push(measured(8.0));

        assert_eq!(history.evict_oldest(), Some(0));
        assert!(history.get(0).is_none());
        assert_eq!(history.a_posteriori_state(0), Some(&Vector::from_vec(vec![7.0])));
        assert_eq!(
            history.a_posteriori_covariance(0),
            Some(&Matrix::from_element(1, 1, 7.0))
        );
        assert!(history.a_posteriori_state(1).is_none());
    }

    #[test]
    fn unresolved_eviction_clears_anchor() {
        let mut history = History::new(1, resolved(1.0));
        history.push(measured(2.0));
        history.evict_oldest();
        history.push(measured(3.0));
        history.evict_oldest();

        assert!(history.a_posteriori_state(0).is_none());
        assert!(history.a_posteriori_state(1).is_none());
        assert_eq!(history.oldest_index(), 2);
    }

    #[test]
    fn partially_resolved_eviction_keeps_state() {
        let mut history = History::new(1, Record {
            a_posteriori_state: Some(Vector::from_vec(vec![4.0])),
            ..Record::ingested(None)
        });
        history.push(measured(5.0));
        history.evict_oldest();

        assert_eq!(history.a_posteriori_state(0), Some(&Vector::from_vec(vec![4.0])));
        assert!(history.a_posteriori_covariance(0).is_none());
    }

    #[test]
    fn full_at_capacity() {
        let mut history = History::new(2, measured(0.0));
        assert!(!history.is_full());
        history.push(measured(1.0));
        assert!(history.is_full());
    }
}
