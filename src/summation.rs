//! Compensated (Kahan) summation

use std::iter::FromIterator;

use num_traits::Float;

/// Running sum that carries the low-order bits lost by each addition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KahanSum<A> {
    sum: A,
    compensation: A,
}

impl<A: Float> Default for KahanSum<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Float> KahanSum<A> {
    pub fn new() -> Self {
        Self {
            sum: A::zero(),
            compensation: A::zero(),
        }
    }

    pub fn add(&mut self, value: A) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    pub fn sum(&self) -> A {
        self.sum
    }
}

impl<A: Float> Extend<A> for KahanSum<A> {
    fn extend<I: IntoIterator<Item = A>>(&mut self, iter: I) {
        for x in iter {
            self.add(x);
        }
    }
}

impl<A: Float> FromIterator<A> for KahanSum<A> {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}
