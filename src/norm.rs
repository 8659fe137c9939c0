//! Norm of vectors

use ndarray::{prelude::*, Data, DataMut};

/// Define norm as a metric linear space, treating the whole matrix as one big vector.
pub trait Norm {
    type Output;

    /// L-1 norm
    fn norm_l1(&self) -> Self::Output;
    /// L-2 norm
    fn norm_l2(&self) -> Self::Output;
    /// Maximum norm (L-infinite)
    fn norm_max(&self) -> Self::Output;
}

impl<A, S, D> Norm for ArrayBase<S, D>
where
    A: NdFloat,
    S: Data<Elem = A>,
    D: Dimension,
{
    type Output = A;

    fn norm_l1(&self) -> Self::Output {
        self.iter().fold(A::zero(), |acc, x| acc + x.abs())
    }

    fn norm_l2(&self) -> Self::Output {
        self.iter().fold(A::zero(), |acc, &x| acc + x * x).sqrt()
    }

    fn norm_max(&self) -> Self::Output {
        self.iter().fold(A::zero(), |f, &val| val.abs().max(f))
    }
}

/// Rescale arrays in place to unit norm
pub trait Normalize {
    /// Divides by the maximum norm. An all-zero array is filled with ones instead, so the
    /// result always has unit maximum norm.
    fn normalize_max_inplace(&mut self) -> &mut Self;

    /// Divides by the L-2 norm. An all-zero array is left untouched.
    fn normalize_l2_inplace(&mut self) -> &mut Self;
}

impl<A, S, D> Normalize for ArrayBase<S, D>
where
    A: NdFloat,
    S: DataMut<Elem = A>,
    D: Dimension,
{
    fn normalize_max_inplace(&mut self) -> &mut Self {
        let mag = self.norm_max();
        if mag.is_zero() {
            self.fill(A::one());
        } else {
            self.mapv_inplace(|x| x / mag);
        }
        self
    }

    fn normalize_l2_inplace(&mut self) -> &mut Self {
        let mag = self.norm_l2();
        if !mag.is_zero() {
            self.mapv_inplace(|x| x / mag);
        }
        self
    }
}
