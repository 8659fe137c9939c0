use std::collections::{hash_map::Entry, HashMap};

use ndarray::NdFloat;

use crate::{lu::LUDecomp, Result};

/// Exact bit pattern of a shift, as given by `integer_decode`
type ShiftKey = (u64, i16, i8);

fn shift_key<A: NdFloat>(shift: A) -> ShiftKey {
    // -0.0 and 0.0 shift by the same amount
    if shift.is_zero() {
        A::zero().integer_decode()
    } else {
        shift.integer_decode()
    }
}

/// Factorizations of `matrix - shift * I` for the shifts tried during one inverse-iteration phase
#[derive(Debug)]
pub(crate) struct LUCache<A> {
    entries: HashMap<ShiftKey, LUDecomp<A>>,
}

impl<A: NdFloat> LUCache<A> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the factorization for `shift`, computing it with `factorize` on a miss.
    ///
    /// The flag is `true` when the factorization was computed by this call.
    pub fn get_or_try_insert_with<F>(
        &mut self,
        shift: A,
        factorize: F,
    ) -> Result<(&LUDecomp<A>, bool)>
    where
        F: FnOnce() -> Result<LUDecomp<A>>,
    {
        match self.entries.entry(shift_key(shift)) {
            Entry::Occupied(entry) => Ok((&*entry.into_mut(), false)),
            Entry::Vacant(entry) => Ok((&*entry.insert(factorize()?), true)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array2};

    use super::*;
    use crate::lu::LU;

    #[test]
    fn reuses_exact_shifts() {
        let a = array![[2.0f64, 1.], [1., 3.]];
        let mut cache = LUCache::new();
        let mut calls = 0;

        for &shift in &[0.5, 0.5, 1.5, 0.5, 0.0, -0.0] {
            let (lu, _) = cache
                .get_or_try_insert_with(shift, || {
                    calls += 1;
                    (&a - &(Array2::<f64>::eye(2) * shift)).lu()
                })
                .unwrap();
            assert!(lu.pivot_scale() > 0.0);
        }

        assert_eq!(calls, 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn fresh_flag() {
        let a = array![[2., 0.], [0., 3.]];
        let mut cache = LUCache::new();
        let (_, fresh) = cache.get_or_try_insert_with(2.0, || a.lu()).unwrap();
        assert!(fresh);
        let (_, fresh) = cache.get_or_try_insert_with(2.0, || a.lu()).unwrap();
        assert!(!fresh);
        let (_, fresh) = cache
            .get_or_try_insert_with(2.0 + f64::EPSILON * 2.0, || a.lu())
            .unwrap();
        assert!(fresh);
    }
}
