//!
//! Shifted inverse iteration computes the full eigen-decomposition of a dense symmetric matrix
//! ```text
//! A x = lambda x
//! ```
//! one eigenpair at a time. Each search picks a random start vector, refines it with inverse
//! iteration on `A - sigma I` where the shift `sigma` is the current Rayleigh quotient, polishes
//! the result with power iteration and deflates it from every later search. It has the following
//! properties:
//! * works for any symmetric matrix, including indefinite and singular ones
//! * cubic local convergence of the shifted iteration, at the cost of one LU factorization per
//!   distinct shift
//! * randomized: the start vectors come from a caller-supplied random number generator, so a
//!   fixed seed reproduces the same decomposition
//!
//! The symmetry of `A` is assumed and not checked.
//!
//! See also the wikipedia article at
//! [Rayleigh quotient iteration](https://en.wikipedia.org/wiki/Rayleigh_quotient_iteration)
//!
mod algorithm;
mod cache;
pub mod criteria;
mod solver;

use ndarray::prelude::*;

pub use crate::LinalgError;
pub use criteria::{
    ConvergenceCriteria, Criteria, OscillationCriteria, PrecisionCriteria, TimeCriteria,
};
pub use solver::{
    solve_bounded, solve_time_boxed, solve_to_precision, EigenpairIter, InverseIteration,
};

/// The result of the eigensolver
///
/// If every eigenpair was found, `Ok` holds all of them. If the step budget ran out first, the
/// error is returned in `Err` together with the eigenpairs found before the failing search.
pub type EigResult<A> = std::result::Result<Eigenpairs<A>, (LinalgError, Eigenpairs<A>)>;

/// Eigenpairs in the order they were found
///
/// Column `i` of `eigvecs` is the unit eigenvector of `eigvals[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenpairs<A> {
    pub eigvals: Array1<A>,
    pub eigvecs: Array2<A>,
}

impl<A> Eigenpairs<A> {
    /// Number of eigenpairs
    pub fn len(&self) -> usize {
        self.eigvals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigvals.is_empty()
    }

    pub fn into_parts(self) -> (Array1<A>, Array2<A>) {
        (self.eigvals, self.eigvecs)
    }
}
