//! Symmetric eigen-decomposition of dense `ndarray` matrices by shifted inverse iteration.
//!
//! Each eigenpair is located with Rayleigh-quotient shifted inverse iteration, polished with a
//! few power iterations and then deflated out of every later search. Three stopping policies are
//! available: oscillation detection, a precision threshold and a wall-clock budget.
//!
//! ```rust
//! use ndarray::array;
//! use linfa_inverse_iteration::inverse_iteration::solve_bounded;
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//!
//! let a = array![[2., 1.], [1., 2.]];
//! let res = solve_bounded(&a, 1000, Xoshiro256Plus::seed_from_u64(42)).unwrap();
//! assert_eq!(res.eigvals.len(), 2);
//! ```

pub mod inverse_iteration;
pub mod lu;
pub mod norm;
pub mod summation;

use ndarray::{ArrayBase, Ix2, RawData};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LinalgError {
    #[error("Matrix with {rows} rows and {cols} cols is not square")]
    NotSquare { rows: usize, cols: usize },
    #[error("Expected {expected} rows, got {actual} rows")]
    WrongRows { expected: usize, actual: usize },
    #[error("maximum steps exceeded")]
    MaxStepsExceeded,
}

pub type Result<T> = std::result::Result<T, LinalgError>;

/// Returns the dimension of `arr` if it is square
pub(crate) fn check_square<S: RawData>(arr: &ArrayBase<S, Ix2>) -> Result<usize> {
    let (rows, cols) = arr.dim();
    if rows != cols {
        Err(LinalgError::NotSquare { rows, cols })
    } else {
        Ok(rows)
    }
}
