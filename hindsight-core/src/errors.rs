//! Error Types for Filter Construction and Estimation
//!
//! ## Design Philosophy
//!
//! Every failure the filter can report is a local computation failure that is
//! surfaced synchronously to the caller of the operation that triggered it.
//! Nothing is swallowed into NaN or infinite values, and nothing that failed
//! is ever written into the history.
//!
//! Errors carry only inline data (`&'static str` labels, shapes and indices),
//! so they are `Copy` and cheap to return from deep inside a recursion.
//!
//! ## Error Categories
//!
//! ### Configuration
//! - `DimensionMismatch`: a model matrix, initial condition or measurement does
//!   not have the shape required by the products the filter evaluates
//! - `InvalidCapacity`: a history that could not hold a single record
//!
//! ### Numerical
//! - `SingularInnovationCovariance`: `C·P⁻·Cᵗ + H·R·Hᵗ` could not be inverted
//!
//! ### Indexing
//! - `IndexOutOfRange`: the requested time index has already been evicted from
//!   the bounded history
//!
//! A missing measurement is *not* an error: it selects the "no correction"
//! branch of the a posteriori state update.
//!
//! ```rust
//! use hindsight_core::FilterError;
//!
//! fn describe(err: FilterError) -> &'static str {
//!     match err {
//!         FilterError::DimensionMismatch { .. } => "fix the model matrices",
//!         FilterError::SingularInnovationCovariance { .. } => "retune R or C",
//!         FilterError::IndexOutOfRange { .. } => "index already evicted",
//!         FilterError::InvalidCapacity => "capacity must be positive",
//!     }
//! }
//! # assert_eq!(describe(FilterError::InvalidCapacity), "capacity must be positive");
//! ```

use thiserror_no_std::Error;

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Filter errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    /// A matrix or vector does not conform to the model dimensions
    #[error("{what} has shape {found:?}, expected {expected:?}")]
    DimensionMismatch {
        /// Which input was rejected (e.g. `"B (input matrix)"`)
        what: &'static str,
        /// Shape implied by the rest of the model, as `(rows, cols)`
        expected: (usize, usize),
        /// Shape that was supplied
        found: (usize, usize),
    },

    /// The innovation covariance could not be inverted at this time index
    #[error("innovation covariance at index {index} is singular")]
    SingularInnovationCovariance {
        /// Absolute time index whose Kalman gain was requested
        index: usize,
    },

    /// The time index lies before the oldest retained record
    #[error("index {index} has been evicted, oldest retained index is {oldest}")]
    IndexOutOfRange {
        /// Requested absolute time index
        index: usize,
        /// Oldest absolute index still held by the history
        oldest: usize,
    },

    /// History capacity of zero
    #[error("history capacity must hold at least one record")]
    InvalidCapacity,
}
