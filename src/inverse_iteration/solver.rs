//! Entry points of the eigensolver
//!
use std::time::Duration;

use ndarray::{prelude::*, Data, OwnedRepr};
use rand::{distributions::Standard, prelude::*};

use super::{
    algorithm::{Mode, Search},
    EigResult, Eigenpairs,
};

/// Decomposes `matrix` with at most `max_iterations` steps in total
///
/// Each eigenpair search stops once its residual stops improving. If the steps run out, the
/// eigenpairs found so far are returned along with
/// [`MaxStepsExceeded`](crate::LinalgError::MaxStepsExceeded).
///
/// When a search lands exactly on an eigenvector, power iteration keeps shrinking the residual
/// geometrically until the off-axis components underflow, which can take a few hundred steps for
/// a single eigenpair even on a 2x2 matrix. Budgets should allow for that.
///
/// Panics if `matrix` is not square.
pub fn solve_bounded<A, S, R>(
    matrix: &ArrayBase<S, Ix2>,
    max_iterations: usize,
    rng: R,
) -> EigResult<A>
where
    A: NdFloat,
    S: Data<Elem = A>,
    R: Rng,
    Standard: Distribution<A>,
{
    solve_to_precision(matrix, max_iterations, A::zero(), rng)
}

/// Like [`solve_bounded`], but each search only stops once the backward error `|A v - x v|` of
/// its unit eigenvector falls to `precision`
///
/// A zero `precision` falls back to stopping when the residual stops improving.
///
/// Panics if `matrix` is not square.
pub fn solve_to_precision<A, S, R>(
    matrix: &ArrayBase<S, Ix2>,
    max_iterations: usize,
    precision: A,
    rng: R,
) -> EigResult<A>
where
    A: NdFloat,
    S: Data<Elem = A>,
    R: Rng,
    Standard: Distribution<A>,
{
    let mode = Mode::Bounded {
        maxiter: max_iterations,
        precision,
    };
    Search::new(matrix.view(), rng, mode).decompose()
}

/// Decomposes `matrix` within roughly `duration` of wall-clock time
///
/// Every search gets an even share of the time for each of its two phases. The more time is
/// given, the more accurate the eigenpairs are likely to be. Searches that would start after the
/// time is up are skipped, so fewer than `rows` eigenpairs may be returned.
///
/// Within its slice, power iteration keeps the latest estimate rather than the best one. When the
/// remaining subspace has dominant eigenvalues of nearly equal magnitude and opposite sign, the
/// vector drifts between them and the returned pair can have a large residual. Use
/// [`solve_bounded`] when accuracy matters more than wall-clock time.
///
/// Panics if `matrix` is not square.
pub fn solve_time_boxed<A, S, R>(
    matrix: &ArrayBase<S, Ix2>,
    duration: Duration,
    rng: R,
) -> Eigenpairs<A>
where
    A: NdFloat,
    S: Data<Elem = A>,
    R: Rng,
    Standard: Distribution<A>,
{
    match Search::new(matrix.view(), rng, Mode::TimeBoxed { duration }).decompose() {
        Ok(res) | Err((_, res)) => res,
    }
}

#[derive(Debug, Clone)]
/// Symmetric eigenproblem solver
///
/// This struct wraps shifted inverse iteration and provides builder-pattern access to the step
/// budget and precision. It can also be turned into an iterator where each step yields a new
/// eigenvalue/vector pair.
///
/// # Example
///
/// ```rust
/// use ndarray::{arr1, Array2};
/// use linfa_inverse_iteration::inverse_iteration::InverseIteration;
/// use rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
///
/// let diag = arr1(&[1., 2., 3., 4., 5.]);
/// let a = Array2::from_diag(&diag);
///
/// let eig = InverseIteration::new_with_rng(a, Xoshiro256Plus::seed_from_u64(42))
///     .precision(1e-8)
///     .maxiter(1000);
///
/// let res = eig.decompose().unwrap();
/// assert_eq!(res.len(), 5);
/// ```
pub struct InverseIteration<A, R> {
    problem: Array2<A>,
    maxiter: usize,
    precision: A,
    rng: R,
}

impl<A: NdFloat, R: Rng> InverseIteration<A, R>
where
    Standard: Distribution<A>,
{
    /// Create a new eigenproblem solver
    ///
    /// # Properties
    /// * `problem`: symmetric problem matrix
    /// * `rng`: random number generator for the start vectors
    ///
    /// The step budget defaults to `100` steps per row and each search stops once its residual
    /// stops improving.
    pub fn new_with_rng(problem: Array2<A>, rng: R) -> InverseIteration<A, R> {
        InverseIteration {
            maxiter: problem.nrows() * 100,
            precision: A::zero(),
            problem,
            rng,
        }
    }

    /// Set desired precision
    ///
    /// Each search then stops once the backward error of its eigenpair falls to `precision`,
    /// instead of when the residual stops improving. Zero restores the default.
    ///
    /// If the precision can't be reached before the budget runs out, an error is returned in
    /// [EigResult](crate::inverse_iteration::EigResult).
    pub fn precision(mut self, precision: A) -> Self {
        self.precision = precision;

        self
    }

    /// Set the maximal number of steps
    ///
    /// The budget is shared by all searches, not granted to each of them. Polishing an exact
    /// eigenvector can use a few hundred steps on its own, so the default of `100` steps per row
    /// is too small for very small matrices.
    pub fn maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;

        self
    }

    /// Calculate all eigenpairs within the step budget
    pub fn decompose(self) -> EigResult<A> {
        self.into_search().decompose()
    }

    /// Calculate the eigenpairs within `duration`, ignoring the step budget and precision
    pub fn decompose_timed(self, duration: Duration) -> Eigenpairs<A> {
        match Search::new(self.problem, self.rng, Mode::TimeBoxed { duration }).decompose() {
            Ok(res) | Err((_, res)) => res,
        }
    }

    fn into_search(self) -> Search<A, OwnedRepr<A>, R> {
        let mode = Mode::Bounded {
            maxiter: self.maxiter,
            precision: self.precision,
        };
        Search::new(self.problem, self.rng, mode)
    }
}

impl<A: NdFloat, R: Rng> IntoIterator for InverseIteration<A, R>
where
    Standard: Distribution<A>,
{
    type Item = (A, Array1<A>);
    type IntoIter = EigenpairIter<A, R>;

    fn into_iter(self) -> EigenpairIter<A, R> {
        let search = self.into_search();
        EigenpairIter {
            remaining: search.dim(),
            search,
        }
    }
}

/// Eigenpair iterator
///
/// Each step runs one search and yields its eigenvalue and unit eigenvector. All steps draw from
/// the same step budget; the iterator ends after `rows` pairs or at the first search that runs
/// out of steps.
///
/// # Example
///
/// ```rust
/// use ndarray::{arr1, Array2};
/// use linfa_inverse_iteration::inverse_iteration::InverseIteration;
/// use rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
///
/// let diag = arr1(&[1., 2., 3., 4., 5.]);
/// let a = Array2::from_diag(&diag);
///
/// let eig = InverseIteration::new_with_rng(a, Xoshiro256Plus::seed_from_u64(42));
///
/// // collect eigenvalues until one smaller than 2.5 turns up
/// let res = eig
///     .into_iter()
///     .map(|(val, _)| val)
///     .take_while(|val| *val > 2.5)
///     .collect::<Vec<_>>();
/// assert!(res.len() <= 5);
/// ```
pub struct EigenpairIter<A, R> {
    remaining: usize,
    search: Search<A, OwnedRepr<A>, R>,
}

impl<A: NdFloat, R: Rng> EigenpairIter<A, R>
where
    Standard: Distribution<A>,
{
    /// Steps left in the shared budget
    pub fn remaining_steps(&self) -> usize {
        self.search.remaining_steps().unwrap_or(usize::MAX)
    }
}

impl<A: NdFloat, R: Rng> Iterator for EigenpairIter<A, R>
where
    Standard: Distribution<A>,
{
    type Item = (A, Array1<A>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        match self.search.find_next_eigenpair() {
            Ok(()) => {
                self.remaining -= 1;
                self.search.last_eigenpair()
            }
            Err(_) => {
                self.remaining = 0;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, Array2};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    use super::*;
    use crate::LinalgError;

    #[test]
    fn builder_defaults() {
        let a = Array2::<f64>::eye(4);
        let eig = InverseIteration::new_with_rng(a, Xoshiro256Plus::seed_from_u64(0));
        assert_eq!(eig.maxiter, 400);
        assert_eq!(eig.precision, 0.0);

        let eig = eig.maxiter(7).precision(1e-3);
        assert_eq!(eig.maxiter, 7);
        assert_eq!(eig.precision, 1e-3);
    }

    #[test]
    fn test_iterator() {
        let diag = arr1(&[1., 2., 3., 4., 5., 6., 7., 8., 9., 10.]);
        let a = Array2::from_diag(&diag);

        let eig = InverseIteration::new_with_rng(a.clone(), Xoshiro256Plus::seed_from_u64(42))
            .maxiter(10_000);

        let mut found = Vec::new();
        for (val, vec) in eig.into_iter().take(4) {
            assert_abs_diff_eq!(a.dot(&vec), &vec * val, epsilon = 1e-6);
            found.push(val);
        }
        assert_eq!(found.len(), 4);
        // all distinct eigenvalues
        found.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert!(found.windows(2).all(|w| w[1] - w[0] > 0.5));
    }

    #[test]
    fn iterator_stops_on_exhaustion() {
        let a = Array2::from_diag(&arr1(&[1., 2., 3.]));
        let mut iter = InverseIteration::new_with_rng(a, Xoshiro256Plus::seed_from_u64(0))
            .maxiter(0)
            .into_iter();
        assert_eq!(iter.remaining_steps(), 0);
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn bounded_zero_budget() {
        let a = array![[2., 1.], [1., 2.]];
        let rng = Xoshiro256Plus::seed_from_u64(0);
        let (err, partial) = solve_bounded(&a, 0, rng).unwrap_err();
        assert!(matches!(err, LinalgError::MaxStepsExceeded));
        assert!(partial.is_empty());
        assert_eq!(partial.eigvecs.dim(), (2, 0));
    }

    #[test]
    fn time_boxed_zero_duration() {
        let a = array![[2., 1.], [1., 2.]];
        let res = solve_time_boxed(&a, Duration::ZERO, Xoshiro256Plus::seed_from_u64(0));
        assert!(res.is_empty());

        let res = InverseIteration::new_with_rng(a, Xoshiro256Plus::seed_from_u64(0))
            .decompose_timed(Duration::ZERO);
        assert!(res.is_empty());
    }

    #[test]
    fn empty_matrix() {
        let a = Array2::<f64>::zeros((0, 0));
        let res = solve_bounded(&a, 10, Xoshiro256Plus::seed_from_u64(0)).unwrap();
        assert!(res.is_empty());
        let rng = Xoshiro256Plus::seed_from_u64(0);
        let res = solve_time_boxed(&a, Duration::from_millis(10), rng);
        assert!(res.is_empty());
    }

    #[test]
    #[should_panic(expected = "not square")]
    fn non_square() {
        let a = Array2::<f64>::zeros((3, 2));
        let _ = solve_bounded(&a, 10, Xoshiro256Plus::seed_from_u64(0));
    }
}
