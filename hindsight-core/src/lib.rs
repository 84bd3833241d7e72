//! Core estimation engine for Hindsight
//!
//! A discrete-time linear Kalman filter that keeps every estimate it has
//! produced. Measurements are ingested one time index at a time; covariances,
//! gains and state/output estimates are computed lazily when first asked for,
//! stored in a bounded history, and served from there afterwards.
//!
//! Key properties:
//! - Any retained time index can be queried, in any order
//! - Repeated queries inside the ingested horizon cost nothing
//! - Memory is bounded by a FIFO window (200 records by default)
//! - Failures surface as errors, never as NaN in the history
//!
//! ```rust
//! use hindsight_core::{InitialConditions, KalmanFilter, LinearModel, Matrix, Vector};
//!
//! let model = LinearModel::new(
//!     Matrix::from_row_slice(2, 2, &[-1.0, 1.0, 0.0, -3.0]), // A
//!     Matrix::from_row_slice(2, 1, &[0.0, 1.0]),             // B
//!     Matrix::from_row_slice(1, 2, &[1.0, 0.0]),             // C
//!     Matrix::from_row_slice(1, 1, &[4.0]),                  // D
//!     Matrix::from_row_slice(1, 2, &[-1.0, 1.0]),            // H
//!     Matrix::from_row_slice(2, 1, &[1.0, 0.0]),             // G
//!     Matrix::identity(2, 2),                                // R
//!     Matrix::from_row_slice(1, 1, &[2.0]),                  // Q
//!     Vector::from_vec(vec![1.0]),                           // u
//! );
//! let initial = InitialConditions::new(
//!     Matrix::from_diagonal(&Vector::from_vec(vec![2.0, 1.0])),
//!     Vector::zeros(2),
//!     Some(Vector::from_vec(vec![3.0])),
//! );
//!
//! let mut kf = KalmanFilter::new(model, initial)?;
//! let corrected = kf.a_posteriori_state_estimate(0)?;
//! assert!((corrected[0] + 0.5).abs() < 1e-9);
//!
//! kf.ingest(Some(Vector::from_vec(vec![2.5])))?;
//! kf.ingest(None)?; // nothing observed at index 2
//! assert_eq!(kf.current_index(), 2);
//! # Ok::<(), hindsight_core::FilterError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod errors;
pub mod estimator;
pub mod filter;
pub mod history;
pub mod linalg;
pub mod model;
pub mod shared;

// Public API
pub use errors::{FilterError, FilterResult};
pub use filter::KalmanFilter;
pub use history::Record;
pub use linalg::{CountingAlgebra, DenseAlgebra, LinearAlgebra, Matrix, Vector};
pub use model::{
    Dimensions, FilterConfig, InitialConditions, LinearModel, DEFAULT_HISTORY_CAPACITY,
};
pub use shared::SharedFilter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
