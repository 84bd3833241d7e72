//! Linear Algebra Backend
//!
//! ## Overview
//!
//! The estimator never touches matrix storage directly. Every product,
//! transpose, sum, difference and inverse it needs goes through the
//! [`LinearAlgebra`] trait, so the arithmetic can be swapped or instrumented
//! without touching the recurrences.
//!
//! Two backends ship with the crate:
//!
//! - [`DenseAlgebra`]: plain dense `nalgebra` arithmetic
//! - [`CountingAlgebra`]: wraps another backend and counts every call, which
//!   is how memoization is observed in tests and benchmarks
//!
//! ## Operations
//!
//! ```text
//! multiply         A·B
//! multiply_vector  A·x
//! transpose        Aᵗ
//! add / subtract   A ± B,  x ± y
//! invert           A⁻¹  (None when singular or not finite)
//! identity         Iₙ
//! ```

use core::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::{DMatrix, DVector};

/// Dense matrix used throughout the filter
pub type Matrix = DMatrix<f64>;

/// Dense column vector used throughout the filter
pub type Vector = DVector<f64>;

/// Arithmetic consumed by the recursive estimator
///
/// Implementations may assume operands are conformant: the filter validates
/// every shape once at construction and on ingestion.
pub trait LinearAlgebra {
    /// Matrix product `a·b`
    fn multiply(&self, a: &Matrix, b: &Matrix) -> Matrix;

    /// Matrix-vector product `a·x`
    fn multiply_vector(&self, a: &Matrix, x: &Vector) -> Vector;

    /// Transpose `aᵗ`
    fn transpose(&self, a: &Matrix) -> Matrix;

    /// Sum `a + b`
    fn add(&self, a: &Matrix, b: &Matrix) -> Matrix;

    /// Difference `a − b`
    fn subtract(&self, a: &Matrix, b: &Matrix) -> Matrix;

    /// Vector sum `x + y`
    fn add_vector(&self, x: &Vector, y: &Vector) -> Vector;

    /// Vector difference `x − y`
    fn subtract_vector(&self, x: &Vector, y: &Vector) -> Vector;

    /// Inverse of a square matrix
    ///
    /// Returns `None` when the matrix is singular or when the computed
    /// inverse contains non-finite entries.
    fn invert(&self, a: &Matrix) -> Option<Matrix>;

    /// `n×n` identity
    fn identity(&self, n: usize) -> Matrix;

    /// Chained product `first·rest[0]·rest[1]·…`, evaluated left to right
    fn product(&self, first: &Matrix, rest: &[&Matrix]) -> Matrix {
        rest.iter()
            .fold(first.clone(), |acc, next| self.multiply(&acc, next))
    }

    /// Congruence `m·x·mᵗ`, the shape of every covariance propagation
    fn congruence(&self, m: &Matrix, x: &Matrix) -> Matrix {
        let m_t = self.transpose(m);
        self.product(m, &[x, &m_t])
    }
}

/// Dense `nalgebra` arithmetic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DenseAlgebra;

impl LinearAlgebra for DenseAlgebra {
    fn multiply(&self, a: &Matrix, b: &Matrix) -> Matrix {
        a * b
    }

    fn multiply_vector(&self, a: &Matrix, x: &Vector) -> Vector {
        a * x
    }

    fn transpose(&self, a: &Matrix) -> Matrix {
        a.transpose()
    }

    fn add(&self, a: &Matrix, b: &Matrix) -> Matrix {
        a + b
    }

    fn subtract(&self, a: &Matrix, b: &Matrix) -> Matrix {
        a - b
    }

    fn add_vector(&self, x: &Vector, y: &Vector) -> Vector {
        x + y
    }

    fn subtract_vector(&self, x: &Vector, y: &Vector) -> Vector {
        x - y
    }

    fn invert(&self, a: &Matrix) -> Option<Matrix> {
        if !a.is_square() {
            return None;
        }

        a.clone()
            .try_inverse()
            .filter(|inverse| inverse.iter().all(|value| value.is_finite()))
    }

    fn identity(&self, n: usize) -> Matrix {
        Matrix::identity(n, n)
    }
}

/// Call-counting wrapper around another backend
///
/// Every trait method bumps a single counter before delegating, so the
/// number of arithmetic operations a query performs can be asserted on.
/// Counting uses relaxed atomics and the wrapper stays `Sync` for use behind
/// a [`SharedFilter`](crate::SharedFilter).
#[derive(Debug, Default)]
pub struct CountingAlgebra<L = DenseAlgebra> {
    inner: L,
    calls: AtomicUsize,
}

impl<L> CountingAlgebra<L> {
    /// Wrap `inner`, starting from zero calls
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    /// Operations performed since creation or the last [`reset`](Self::reset)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Zero the counter
    pub fn reset(&self) {
        self.calls.store(0, Ordering::Relaxed);
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

impl<L: LinearAlgebra> LinearAlgebra for CountingAlgebra<L> {
    fn multiply(&self, a: &Matrix, b: &Matrix) -> Matrix {
        self.tick();
        self.inner.multiply(a, b)
    }

    fn multiply_vector(&self, a: &Matrix, x: &Vector) -> Vector {
        self.tick();
        self.inner.multiply_vector(a, x)
    }

    fn transpose(&self, a: &Matrix) -> Matrix {
        self.tick();
        self.inner.transpose(a)
    }

    fn add(&self, a: &Matrix, b: &Matrix) -> Matrix {
        self.tick();
        self.inner.add(a, b)
    }

    fn subtract(&self, a: &Matrix, b: &Matrix) -> Matrix {
        self.tick();
        self.inner.subtract(a, b)
    }

    fn add_vector(&self, x: &Vector, y: &Vector) -> Vector {
        self.tick();
        self.inner.add_vector(x, y)
    }

    fn subtract_vector(&self, x: &Vector, y: &Vector) -> Vector {
        self.tick();
        self.inner.subtract_vector(x, y)
    }

    fn invert(&self, a: &Matrix) -> Option<Matrix> {
        self.tick();
        self.inner.invert(a)
    }

    fn identity(&self, n: usize) -> Matrix {
        self.tick();
        self.inner.identity(n)
    }
}
