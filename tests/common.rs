#![allow(unused)]

use std::ops::RangeInclusive;

use ndarray::prelude::*;
use proptest::prelude::*;
use proptest_derive::Arbitrary;

const FLOAT_RANGE: RangeInclusive<f64> = -10.0..=10.0;
const DIM_RANGE: RangeInclusive<usize> = 1..=6;

/// Memory layouts that keep a symmetric matrix symmetric
#[derive(Debug, Arbitrary)]
struct Layout {
    invert: bool,
    transpose: bool,
}

impl Layout {
    fn apply(&self, mut arr: Array2<f64>) -> Array2<f64> {
        if self.invert {
            arr.invert_axis(Axis(0));
            arr.invert_axis(Axis(1));
        }
        if self.transpose {
            arr.reversed_axes()
        } else {
            arr
        }
    }
}

fn to_symm(arr: &mut Array2<f64>) {
    let n = arr.nrows();
    for i in 0..n {
        for j in 0..i {
            arr[(i, j)] = arr[(j, i)];
        }
    }
}

prop_compose! {
    pub fn symm_arr()(dim in DIM_RANGE)
        (data in prop::collection::vec(FLOAT_RANGE, dim*dim), dim in Just(dim), layout in any::<Layout>()) -> Array2<f64> {
        let mut arr = Array2::from_shape_vec((dim, dim), data).unwrap();
        to_symm(&mut arr);
        layout.apply(arr)
    }
}

/// Scale of the entries of `arr`, at least one
pub fn scale(arr: &Array2<f64>) -> f64 {
    arr.iter().fold(1.0f64, |m, x| m.max(x.abs())) * arr.nrows() as f64
}

/// Largest `|A v - x v|` over all eigenpairs
pub fn max_residual(arr: &Array2<f64>, vals: &Array1<f64>, vecs: &Array2<f64>) -> f64 {
    vecs.axis_iter(Axis(1))
        .zip(vals)
        .map(|(v, &x)| {
            let r = arr.dot(&v) - &v * x;
            r.dot(&r).sqrt()
        })
        .fold(0.0, f64::max)
}
