//! LU decomposition of square matrices with partial pivoting

use crate::{check_square, LinalgError, Result};

use ndarray::{prelude::*, Data, DataMut, OwnedRepr, RawDataClone};

pub trait LUInto {
    type Decomp;

    /// Computes `P * A = L * U` in place, consuming the matrix.
    fn lu_into(self) -> Result<Self::Decomp>;
}

impl<A: NdFloat, S: DataMut<Elem = A>> LUInto for ArrayBase<S, Ix2> {
    type Decomp = LUDecomp<A, S>;

    fn lu_into(mut self) -> Result<Self::Decomp> {
        let n = check_square(&self)?;
        let mut perm: Vec<usize> = (0..n).collect();

        for k in 0..n {
            let (p, _) = self
                .slice(s![k.., k])
                .iter()
                .enumerate()
                .fold((0, A::zero()), |(bi, bv), (i, v)| {
                    if v.abs() > bv {
                        (i, v.abs())
                    } else {
                        (bi, bv)
                    }
                });
            let p = p + k;
            if p != k {
                for j in 0..n {
                    self.swap((k, j), (p, j));
                }
                perm.swap(k, p);
            }

            let pivot = self[(k, k)];
            if pivot.is_zero() {
                // the whole column below the diagonal is zero already
                continue;
            }

            let (top, mut bottom) = self.view_mut().split_at(Axis(0), k + 1);
            let pivot_row = top.slice(s![k, k + 1..]);
            for mut row in bottom.rows_mut() {
                let factor = row[k] / pivot;
                row[k] = factor;
                row.slice_mut(s![k + 1..]).scaled_add(-factor, &pivot_row);
            }
        }

        Ok(LUDecomp { lu: self, perm })
    }
}

pub trait LU {
    type Decomp;

    /// Computes `P * A = L * U` without modifying the original.
    fn lu(&self) -> Result<Self::Decomp>;
}

impl<A: NdFloat, S: Data<Elem = A>> LU for ArrayBase<S, Ix2> {
    type Decomp = LUDecomp<A, OwnedRepr<A>>;

    fn lu(&self) -> Result<Self::Decomp> {
        self.to_owned().lu_into()
    }
}

/// Packed LU factors
///
/// The strictly lower triangle holds `L` (its unit diagonal is implicit) and the upper triangle
/// holds `U`. Row `i` of the factored matrix is row `perm[i]` of the original.
#[derive(Debug)]
pub struct LUDecomp<A, S: DataMut<Elem = A> = OwnedRepr<A>> {
    lu: ArrayBase<S, Ix2>,
    perm: Vec<usize>,
}

impl<A: Clone, S: DataMut<Elem = A> + RawDataClone> Clone for LUDecomp<A, S> {
    fn clone(&self) -> Self {
        Self {
            lu: self.lu.clone(),
            perm: self.perm.clone(),
        }
    }
}

impl<A: NdFloat, S: DataMut<Elem = A>> LUDecomp<A, S> {
    /// Ratio between the smallest and the largest absolute pivot.
    ///
    /// It lies in `[0, 1]`, and values near zero indicate a (numerically) singular matrix. It is
    /// `0` when every pivot is zero and `1` for the empty matrix.
    pub fn pivot_scale(&self) -> A {
        let diag = self.lu.diag();
        if diag.is_empty() {
            return A::one();
        }
        let (min, max) = diag.iter().fold((A::infinity(), A::zero()), |(lo, hi), x| {
            (lo.min(x.abs()), hi.max(x.abs()))
        });
        if max.is_zero() {
            A::zero()
        } else {
            min / max
        }
    }

    pub fn l(&self) -> Array2<A> {
        let mut l = self.lu.to_owned();
        let n = l.nrows();
        for i in 0..n {
            l[(i, i)] = A::one();
            for j in i + 1..n {
                l[(i, j)] = A::zero();
            }
        }
        l
    }

    pub fn u(&self) -> Array2<A> {
        let mut u = self.lu.to_owned();
        let n = u.nrows();
        for i in 0..n {
            for j in 0..i {
                u[(i, j)] = A::zero();
            }
        }
        u
    }

    /// Row permutation applied to the original matrix
    pub fn permutation(&self) -> &[usize] {
        &self.perm
    }

    /// Solves `self * x = b`, overwriting `b` with `x`.
    ///
    /// A singular decomposition yields non-finite components.
    pub fn solve_inplace<'a, Si: DataMut<Elem = A>>(
        &self,
        b: &'a mut ArrayBase<Si, Ix1>,
    ) -> Result<&'a mut ArrayBase<Si, Ix1>> {
        let n = self.lu.nrows();
        if b.len() != n {
            return Err(LinalgError::WrongRows {
                expected: n,
                actual: b.len(),
            });
        }

        let permuted: Array1<A> = self.perm.iter().map(|&p| b[p]).collect();
        b.assign(&permuted);

        // L * y = P * b
        for i in 0..n {
            let s = self.lu.slice(s![i, ..i]).dot(&b.slice(s![..i]));
            b[i] -= s;
        }
        // U * x = y
        for i in (0..n).rev() {
            let s = self.lu.slice(s![i, i + 1..]).dot(&b.slice(s![i + 1..]));
            b[i] = (b[i] - s) / self.lu[(i, i)];
        }

        Ok(b)
    }

    pub fn solve_into<Si: DataMut<Elem = A>>(
        &self,
        mut b: ArrayBase<Si, Ix1>,
    ) -> Result<ArrayBase<Si, Ix1>> {
        self.solve_inplace(&mut b)?;
        Ok(b)
    }

    pub fn solve<Si: Data<Elem = A>>(&self, b: &ArrayBase<Si, Ix1>) -> Result<Array1<A>> {
        self.solve_into(b.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn decompose() {
        let a = array![[1.0f64, 9.80, 2.], [-7., 3.3, 0.5], [4., 4., 4.]];
        let lu = a.lu().unwrap();
        let (l, u) = (lu.l(), lu.u());

        let pa = a.select(Axis(0), lu.permutation());
        assert_abs_diff_eq!(l.dot(&u), pa, epsilon = 1e-10);
        // partial pivoting keeps every multiplier at most one in magnitude
        assert!(l.iter().all(|x| x.abs() <= 1.0));
        assert_eq!(lu.permutation()[0], 1);
    }

    #[test]
    fn solve() {
        let a = array![[1., 9.80], [-7., 3.3]];
        let x = array![3.2, 5.2];
        let b = a.dot(&x);
        let lu = a.lu_into().unwrap();
        assert_abs_diff_eq!(lu.solve(&b).unwrap(), x, epsilon = 1e-10);
        assert_abs_diff_eq!(lu.solve_into(b.clone()).unwrap(), x, epsilon = 1e-10);

        assert!(matches!(
            lu.solve(&array![1., 2., 3.]),
            Err(LinalgError::WrongRows {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn pivot_scale() {
        let eye = Array2::<f64>::eye(3);
        assert_abs_diff_eq!(eye.lu().unwrap().pivot_scale(), 1.0);

        let diag = Array2::from_diag(&array![4., -2., 1.]);
        assert_abs_diff_eq!(diag.lu().unwrap().pivot_scale(), 0.25);

        let singular = array![[1., 2.], [2., 4.]];
        assert_abs_diff_eq!(singular.lu().unwrap().pivot_scale(), 0.0);

        let zeros = Array2::<f64>::zeros((2, 2));
        assert_eq!(zeros.lu().unwrap().pivot_scale(), 0.0);
    }

    #[test]
    fn corner_cases() {
        let empty = Array2::<f64>::zeros((0, 0));
        let lu = empty.lu().unwrap();
        assert_eq!(lu.pivot_scale(), 1.0);
        assert_eq!(lu.solve(&Array1::zeros(0)).unwrap(), Array1::<f64>::zeros(0));

        let one = array![[2.]];
        assert_abs_diff_eq!(one.lu().unwrap().solve(&array![3.]).unwrap(), array![1.5]);

        assert!(matches!(
            array![[1., 2., 3.], [3., 4., 5.]].lu(),
            Err(LinalgError::NotSquare { rows: 2, cols: 3 })
        ));
    }
}
