//! Shifted inverse iteration with deflation
//!
//! Eigenpairs are found one at a time. Every search starts from a random vector, converges on an
//! eigenpair with Rayleigh-quotient shifted inverse iteration, polishes it with power iteration
//! and finally deflates the eigenvector out of all later searches. The step budget is shared by
//! the whole decomposition, so a search that struggles leaves less for the ones after it.
use std::{
    convert::TryFrom,
    time::{Duration, Instant},
};

use log::{debug, trace, warn};
use ndarray::{prelude::*, Data};
use rand::{distributions::Standard, prelude::*};

use super::{
    cache::LUCache,
    criteria::{ConvergenceCriteria, Criteria},
    EigResult, Eigenpairs,
};
use crate::{check_square, lu::LUInto, norm::*, summation::KahanSum, LinalgError, Result};

/// Iterations left to the decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Budget {
    /// A step counter shared by every phase of every search
    Steps(usize),
    /// Phases end on their own, through the time criteria
    Unbounded,
}

impl Budget {
    /// Consumes one step, returning `false` once the budget is exhausted
    fn take_step(&mut self) -> bool {
        match self {
            Budget::Steps(0) => false,
            Budget::Steps(remaining) => {
                *remaining -= 1;
                true
            }
            Budget::Unbounded => true,
        }
    }
}

/// How a decomposition is bounded
#[derive(Debug, Clone, Copy)]
pub(crate) enum Mode<A> {
    /// At most `maxiter` steps in total; a nonzero `precision` switches to the precision criteria
    Bounded { maxiter: usize, precision: A },
    /// Each of the `2 * rows` phases gets an even share of `duration`
    TimeBoxed { duration: Duration },
}

/// Solver state of one decomposition
pub(crate) struct Search<A, S: Data<Elem = A>, R> {
    matrix: ArrayBase<S, Ix2>,
    rng: R,
    budget: Budget,
    precision: A,
    time_slice: Option<Duration>,
    deadline: Option<Instant>,
    eigvals: Vec<A>,
    eigvecs: Vec<Array1<A>>,
}

impl<A, S, R> Search<A, S, R>
where
    A: NdFloat,
    S: Data<Elem = A>,
    R: Rng,
    Standard: Distribution<A>,
{
    /// Panics if `matrix` is not square.
    pub fn new(matrix: ArrayBase<S, Ix2>, rng: R, mode: Mode<A>) -> Self {
        let dim = match check_square(&matrix) {
            Ok(dim) => dim,
            Err(err) => panic!("{}", err),
        };

        let (budget, precision, time_slice, deadline) = match mode {
            Mode::Bounded { maxiter, precision } => {
                (Budget::Steps(maxiter), precision, None, None)
            }
            Mode::TimeBoxed { duration } => {
                let phases = u32::try_from(2 * dim).unwrap_or(u32::MAX).max(1);
                (
                    Budget::Unbounded,
                    A::zero(),
                    Some(duration / phases),
                    Some(Instant::now() + duration),
                )
            }
        };

        Search {
            matrix,
            rng,
            budget,
            precision,
            time_slice,
            deadline,
            eigvals: Vec::with_capacity(dim),
            eigvecs: Vec::with_capacity(dim),
        }
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn remaining_steps(&self) -> Option<usize> {
        match self.budget {
            Budget::Steps(remaining) => Some(remaining),
            Budget::Unbounded => None,
        }
    }

    /// Most recently found eigenpair
    pub fn last_eigenpair(&self) -> Option<(A, Array1<A>)> {
        let val = *self.eigvals.last()?;
        let vec = self.eigvecs.last()?.clone();
        Some((val, vec))
    }

    /// Runs one search per row, stopping at the first failure or once the deadline has passed.
    pub fn decompose(mut self) -> EigResult<A> {
        for _ in 0..self.dim() {
            if self.deadline.map_or(false, |d| Instant::now() >= d) {
                debug!(
                    "time budget spent after {} of {} eigenpairs",
                    self.eigvals.len(),
                    self.dim()
                );
                break;
            }
            if let Err(err) = self.find_next_eigenpair() {
                return Err((err, self.into_eigenpairs()));
            }
        }
        Ok(self.into_eigenpairs())
    }

    /// Locates, polishes and records the next eigenpair.
    pub fn find_next_eigenpair(&mut self) -> Result<()> {
        let (val, vec) = match self.inverse_iterate()? {
            Some(candidate) => candidate,
            None => {
                warn!(
                    "inverse iteration ran out of steps after {} eigenpairs",
                    self.eigvals.len()
                );
                return Err(LinalgError::MaxStepsExceeded);
            }
        };
        let (val, mut vec) = match self.power_iterate(val, vec) {
            Some(refined) => refined,
            None => {
                warn!(
                    "power iteration ran out of steps after {} eigenpairs",
                    self.eigvals.len()
                );
                return Err(LinalgError::MaxStepsExceeded);
            }
        };

        vec.normalize_l2_inplace();
        debug!(
            "eigenpair {} found with eigenvalue {}",
            self.eigvals.len(),
            val
        );
        self.eigvals.push(val);
        self.eigvecs.push(vec);
        Ok(())
    }

    pub fn into_eigenpairs(self) -> Eigenpairs<A> {
        let mut eigvecs = Array2::zeros((self.dim(), self.eigvecs.len()));
        for (mut col, vec) in eigvecs.columns_mut().into_iter().zip(&self.eigvecs) {
            col.assign(vec);
        }

        Eigenpairs {
            eigvals: Array1::from(self.eigvals),
            eigvecs,
        }
    }

    /// Shift-and-invert refinement of a random start vector
    ///
    /// Returns `None` when the budget runs out first.
    fn inverse_iterate(&mut self) -> Result<Option<(A, Array1<A>)>> {
        let mut vec = random_start(self.dim(), &mut self.rng);
        self.deflate(&mut vec);
        vec.normalize_max_inplace();
        let mut val = self.rayleigh_quotient(&vec);

        let mut criteria = self.criteria();
        criteria.step(self.residual(val, &vec), val, &vec);

        let mut cache = LUCache::new();

        while self.budget.take_step() {
            let (lu, fresh) =
                cache.get_or_try_insert_with(val, || self.shifted_matrix(val).lu_into())?;
            if fresh && lu.pivot_scale() < A::epsilon() {
                // the shift sits on an eigenvalue
                debug!("singular shift {} after {} factorizations", val, cache.len());
                return Ok(Some((val, vec)));
            }
            if !fresh {
                trace!("reusing factorization for shift {}", val);
            }

            vec = lu.solve_into(vec)?;
            self.refine_direction(&mut vec);
            val = self.rayleigh_quotient(&vec);

            criteria.step(self.residual(val, &vec), val, &vec);
            if criteria.is_converged() {
                return Ok(criteria.best());
            }
        }

        Ok(None)
    }

    /// Polishes a candidate by applying the matrix directly
    ///
    /// Returns `None` when the budget runs out first.
    fn power_iterate(&mut self, mut val: A, mut vec: Array1<A>) -> Option<(A, Array1<A>)> {
        let mut criteria = self.criteria();
        criteria.step(self.residual(val, &vec), val, &vec);

        while self.budget.take_step() {
            vec = self.matrix.dot(&vec);
            self.refine_direction(&mut vec);
            val = self.rayleigh_quotient(&vec);

            criteria.step(self.residual(val, &vec), val, &vec);
            if criteria.is_converged() {
                return criteria.best();
            }
        }

        None
    }

    fn criteria(&self) -> Criteria<A> {
        Criteria::select(self.precision, self.time_slice)
    }

    /// Normalize, deflate and normalize again, since round-off in the first normalization can
    /// bring back some of the removed components.
    fn refine_direction(&self, vec: &mut Array1<A>) {
        vec.normalize_max_inplace();
        self.deflate(vec);
        vec.normalize_max_inplace();
    }

    /// Removes the components along every eigenvector found so far
    fn deflate(&self, vec: &mut Array1<A>) {
        for eigvec in &self.eigvecs {
            let proj = eigvec.dot(&*vec);
            vec.scaled_add(-proj, eigvec);
        }
    }

    fn rayleigh_quotient(&self, vec: &Array1<A>) -> A {
        vec.dot(&self.matrix.dot(vec)) / vec.dot(vec)
    }

    /// Backward error `|A v - x v| / |v|`, with a compensated sum of squares
    fn residual(&self, val: A, vec: &Array1<A>) -> A {
        let av = self.matrix.dot(vec);
        let sum: KahanSum<A> = av
            .iter()
            .zip(vec)
            .map(|(&p, &x)| {
                let d = p - val * x;
                d * d
            })
            .collect();
        sum.sum().sqrt() / vec.norm_l2()
    }

    fn shifted_matrix(&self, shift: A) -> Array2<A> {
        let mut mat = self.matrix.to_owned();
        mat.diag_mut().mapv_inplace(|x| x - shift);
        mat
    }
}

/// Random vector with components uniform in `[-1, 1)`
pub(crate) fn random_start<A, R>(dim: usize, rng: &mut R) -> Array1<A>
where
    A: NdFloat,
    R: Rng,
    Standard: Distribution<A>,
{
    Array1::from_shape_fn(dim, |_| {
        let x: A = rng.gen();
        x + x - A::one()
    })
}
