//! Stopping rules for a single refinement phase
//!
//! Every phase feeds one `(residual, eigenvalue, eigenvector)` estimate per iteration into a fresh
//! criteria and stops as soon as it reports convergence, returning the criteria's best estimate.
use std::time::{Duration, Instant};

use ndarray::{Array1, NdFloat};

/// Decides when an iterative eigenpair refinement should stop
pub trait ConvergenceCriteria<A> {
    /// Record the estimate produced by one iteration
    fn step(&mut self, residual: A, eigval: A, eigvec: &Array1<A>);

    /// Whether the phase should stop now
    fn is_converged(&self) -> bool;

    /// Best estimate seen so far, which is not necessarily the latest one
    fn best(self) -> Option<(A, Array1<A>)>;
}

#[derive(Debug, Clone)]
struct Estimate<A> {
    residual: A,
    eigval: A,
    eigvec: Array1<A>,
}

/// Stops once the residual fails to strictly decrease
///
/// The estimate of the last decreasing step is kept as the best one. A zero residual can't be
/// improved upon and converges immediately.
#[derive(Debug, Clone, Default)]
pub struct OscillationCriteria<A> {
    best: Option<Estimate<A>>,
    converged: bool,
}

impl<A> OscillationCriteria<A> {
    pub fn new() -> Self {
        Self {
            best: None,
            converged: false,
        }
    }
}

impl<A: NdFloat> ConvergenceCriteria<A> for OscillationCriteria<A> {
    fn step(&mut self, residual: A, eigval: A, eigvec: &Array1<A>) {
        match &self.best {
            Some(best) if residual.is_nan() || residual >= best.residual => self.converged = true,
            _ => {
                self.converged = residual.is_zero();
                self.best = Some(Estimate {
                    residual,
                    eigval,
                    eigvec: eigvec.clone(),
                });
            }
        }
    }

    fn is_converged(&self) -> bool {
        self.converged
    }

    fn best(self) -> Option<(A, Array1<A>)> {
        self.best.map(|e| (e.eigval, e.eigvec))
    }
}

/// Stops once the residual falls to the given threshold
#[derive(Debug, Clone)]
pub struct PrecisionCriteria<A> {
    threshold: A,
    latest: Option<Estimate<A>>,
}

impl<A> PrecisionCriteria<A> {
    pub fn new(threshold: A) -> Self {
        Self {
            threshold,
            latest: None,
        }
    }
}

impl<A: NdFloat> ConvergenceCriteria<A> for PrecisionCriteria<A> {
    fn step(&mut self, residual: A, eigval: A, eigvec: &Array1<A>) {
        self.latest = Some(Estimate {
            residual,
            eigval,
            eigvec: eigvec.clone(),
        });
    }

    fn is_converged(&self) -> bool {
        self.latest
            .as_ref()
            .map_or(false, |e| e.residual <= self.threshold)
    }

    fn best(self) -> Option<(A, Array1<A>)> {
        self.latest.map(|e| (e.eigval, e.eigvec))
    }
}

/// Stops once the allotted wall-clock time since creation has passed
#[derive(Debug, Clone)]
pub struct TimeCriteria<A> {
    start: Instant,
    allotted: Duration,
    latest: Option<(A, Array1<A>)>,
}

impl<A> TimeCriteria<A> {
    pub fn new(allotted: Duration) -> Self {
        Self {
            start: Instant::now(),
            allotted,
            latest: None,
        }
    }
}

impl<A: NdFloat> ConvergenceCriteria<A> for TimeCriteria<A> {
    fn step(&mut self, _residual: A, eigval: A, eigvec: &Array1<A>) {
        self.latest = Some((eigval, eigvec.clone()));
    }

    fn is_converged(&self) -> bool {
        self.start.elapsed() > self.allotted
    }

    fn best(self) -> Option<(A, Array1<A>)> {
        self.latest
    }
}

/// One of the three stopping rules, picked once per phase
#[derive(Debug, Clone)]
pub enum Criteria<A> {
    Oscillation(OscillationCriteria<A>),
    Precision(PrecisionCriteria<A>),
    Time(TimeCriteria<A>),
}

impl<A: NdFloat> Criteria<A> {
    /// A nonzero `precision` wins over a time slice, and oscillation detection is the fallback.
    pub fn select(precision: A, time_slice: Option<Duration>) -> Self {
        if !precision.is_zero() {
            Criteria::Precision(PrecisionCriteria::new(precision))
        } else if let Some(slice) = time_slice {
            Criteria::Time(TimeCriteria::new(slice))
        } else {
            Criteria::Oscillation(OscillationCriteria::new())
        }
    }
}

impl<A: NdFloat> ConvergenceCriteria<A> for Criteria<A> {
    fn step(&mut self, residual: A, eigval: A, eigvec: &Array1<A>) {
        match self {
            Criteria::Oscillation(c) => c.step(residual, eigval, eigvec),
            Criteria::Precision(c) => c.step(residual, eigval, eigvec),
            Criteria::Time(c) => c.step(residual, eigval, eigvec),
        }
    }

    fn is_converged(&self) -> bool {
        match self {
            Criteria::Oscillation(c) => c.is_converged(),
            Criteria::Precision(c) => c.is_converged(),
            Criteria::Time(c) => c.is_converged(),
        }
    }

    fn best(self) -> Option<(A, Array1<A>)> {
        match self {
            Criteria::Oscillation(c) => c.best(),
            Criteria::Precision(c) => c.best(),
            Criteria::Time(c) => c.best(),
        }
    }
}
