// MIT License
//
// Copyright (c) 2025 Jai Veilleux
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use rand::{Rng, SeedableRng};

use std::collections::HashMap;
use std::hash::Hash;

use crate::distribution::{
    check_weight, inverse_cdf_scan, DistError, DistResult, ProbabilityDistribution, RNGType,
    RESUM_FRACTION,
};

type SlotIndex = usize;

/// Flat-array backing: parallel element/weight vectors plus a position index.
///
/// # Complexity
/// - **add:** $\mathcal{O}(1)$ amortized (append).
/// - **remove:** $\mathcal{O}(1)$, the last slot is swapped into the hole.
///   Removing an element that carries at least half of the total re-sums the
///   remaining weights in $\mathcal{O}(n)$, so cancellation cannot drain it.
/// - **sample:** $\mathcal{O}(n)$ inverse-CDF scan in storage order.
///
/// Useful as a baseline and for cross-checking the tree backing.
///
/// # Examples
/// ```
/// use probdist_rs::{ArrayDistribution, ProbabilityDistribution};
///
/// let mut d = ArrayDistribution::<&str>::with_seed(42);
/// d.add("heads", 1.0).unwrap();
/// d.add("tails", 1.0).unwrap();
///
/// let flip = d.sample().unwrap();
/// assert!(flip == "heads" || flip == "tails");
/// ```
#[derive(Debug, Clone)]
pub struct ArrayDistribution<T>
where
    T: Clone + Eq + Hash,
{
    total_weight_: f64,

    // Cloning keeps the generator state, so a clone replays the same draws
    rng_: RNGType,

    element_vec_: Vec<T>,
    weight_vec_: Vec<f64>,
    pos_map_: HashMap<T, SlotIndex>,
}

impl<T> ArrayDistribution<T>
where
    T: Clone + Eq + Hash,
{
    /// Creates a new, empty distribution seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(RNGType::from_os_rng())
    }

    /// Creates a new, empty distribution with a reproducible sample stream.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(RNGType::seed_from_u64(seed))
    }

    fn with_rng(rng: RNGType) -> Self {
        ArrayDistribution {
            total_weight_: 0.0,
            rng_: rng,
            element_vec_: Vec::new(),
            weight_vec_: Vec::new(),
            pos_map_: HashMap::new(),
        }
    }

    /// Deterministic iteration over the stored `(element, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.element_vec_.iter().zip(self.weight_vec_.iter().copied())
    }

    fn select(&self, value: f64) -> DistResult<T> {
        inverse_cdf_scan(value, self.iter())
    }
}

impl<T> Default for ArrayDistribution<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ProbabilityDistribution<T> for ArrayDistribution<T>
where
    T: Clone + Eq + Hash,
{
    fn size(&self) -> usize {
        self.element_vec_.len()
    }

    fn total_weight(&self) -> f64 {
        self.total_weight_
    }

    fn add(&mut self, element: T, weight: f64) -> DistResult<bool> {
        if self.pos_map_.contains_key(&element) {
            return Ok(false);
        }
        check_weight(weight)?;

        self.pos_map_.insert(element.clone(), self.element_vec_.len());
        self.element_vec_.push(element);
        self.weight_vec_.push(weight);
        self.total_weight_ += weight;

        Ok(true)
    }

    #[inline]
    fn contains(&self, element: &T) -> bool {
        self.pos_map_.contains_key(element)
    }

    fn weight(&self, element: &T) -> Option<f64> {
        self.pos_map_.get(element).map(|&i| self.weight_vec_[i])
    }

    fn remove(&mut self, element: &T) -> bool {
        let idx = match self.pos_map_.remove(element) {
            Some(idx) => idx,
            None => return false,
        };

        self.element_vec_.swap_remove(idx);
        let w_old = self.weight_vec_.swap_remove(idx);

        // Whatever was last now lives at `idx`
        if let Some(moved) = self.element_vec_.get(idx) {
            self.pos_map_.insert(moved.clone(), idx);
        }

        if self.element_vec_.is_empty() {
            self.total_weight_ = 0.0;
        } else if w_old >= RESUM_FRACTION * self.total_weight_ {
            // The difference would be mostly rounding error
            self.total_weight_ = self.weight_vec_.iter().sum();
        } else {
            self.total_weight_ -= w_old;
        }

        true
    }

    fn sample(&mut self) -> DistResult<T> {
        if self.is_empty() {
            return Err(DistError::EmptyDistribution);
        }
        let r: f64 = self.rng_.random_range(0.0..1.0);
        self.select(r * self.total_weight_)
    }

    fn sample_ext_rng<R>(&self, generator: &mut R) -> DistResult<T>
    where
        R: Rng + ?Sized,
    {
        if self.is_empty() {
            return Err(DistError::EmptyDistribution);
        }
        let r: f64 = generator.random_range(0.0..1.0);
        self.select(r * self.total_weight_)
    }

    fn clear(&mut self) {
        self.total_weight_ = 0.0;
        self.element_vec_.clear();
        self.weight_vec_.clear();
        self.pos_map_.clear();
    }

    fn seed(&mut self, seed: u64) {
        log::debug!("re-seeding array distribution");
        self.rng_ = RNGType::seed_from_u64(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn add_remove_and_totals() {
        let mut d = ArrayDistribution::<i32>::with_seed(42);
        d.add(1, 1.0).unwrap();
        d.add(2, 2.0).unwrap();
        d.add(3, 5.0).unwrap();

        assert_eq!(d.size(), 3);
        assert!(d.contains(&2));
        assert!(approx_eq(d.total_weight(), 8.0, 1e-12));

        assert!(d.remove(&2));
        assert_eq!(d.size(), 2);
        assert!(!d.contains(&2));
        assert!(approx_eq(d.total_weight(), 6.0, 1e-12));
    }

    #[test]
    fn swap_remove_keeps_positions_in_sync() {
        let mut d = ArrayDistribution::<u64>::with_seed(7);
        for k in 0..10 {
            d.add(k, (k + 1) as f64).unwrap();
        }

        assert!(d.remove(&0));
        assert!(d.remove(&5));
        assert!(!d.remove(&5));

        for (i, e) in d.element_vec_.iter().enumerate() {
            assert_eq!(d.pos_map_[e], i);
            assert_eq!(d.weight_vec_[i], (*e + 1) as f64);
        }
        assert_eq!(d.weight(&9), Some(10.0));
        assert_eq!(d.weight(&5), None);
    }

    #[test]
    fn removing_dominant_weight_resums() {
        let mut d = ArrayDistribution::<u64>::with_seed(3);
        d.add(0, 1e16).unwrap();
        d.add(1, 1.0).unwrap();
        d.add(2, 1.0).unwrap();

        assert!(d.remove(&0));
        assert_eq!(d.total_weight(), 2.0);

        // small removals keep subtracting
        d.add(3, 0.5).unwrap();
        assert!(d.remove(&3));
        assert_eq!(d.total_weight(), 2.0);
    }

    #[test]
    fn iterator_walks_all_pairs() {
        let mut d = ArrayDistribution::<i32>::with_seed(0);
        d.add(10, 2.0).unwrap();
        d.add(11, 3.0).unwrap();
        d.add(12, 1.0).unwrap();

        let items: Vec<(i32, f64)> = d.iter().map(|(k, w)| (*k, w)).collect();
        assert_eq!(items, vec![(10, 2.0), (11, 3.0), (12, 1.0)]);
    }

    #[test]
    fn select_follows_storage_order() {
        let mut d = ArrayDistribution::<char>::with_seed(0);
        d.add('a', 1.0).unwrap();
        d.add('b', 2.0).unwrap();
        d.add('c', 3.0).unwrap();

        assert_eq!(d.select(0.0), Ok('a'));
        assert_eq!(d.select(0.999), Ok('a'));
        assert_eq!(d.select(1.0), Ok('b'));
        assert_eq!(d.select(2.999), Ok('b'));
        assert_eq!(d.select(3.0), Ok('c'));
        assert_eq!(d.select(5.999), Ok('c'));
    }

    #[test]
    fn same_seed_same_samples() {
        let mut a = ArrayDistribution::<u64>::with_seed(123);
        let mut b = ArrayDistribution::<u64>::with_seed(123);
        for k in 0..20 {
            a.add(k, 1.0 + k as f64).unwrap();
            b.add(k, 1.0 + k as f64).unwrap();
        }
        let xs: Vec<_> = a.sample_iter(500).collect();
        let ys: Vec<_> = b.sample_iter(500).collect();
        assert_eq!(xs, ys);

        a.seed(9);
        b.seed(9);
        assert_eq!(a.sample(), b.sample());
    }

    #[test]
    fn mutate_and_sample_fuzz_is_safe() {
        let mut d = ArrayDistribution::<u64>::with_seed(999);
        for k in 0..50 {
            d.add(k, 0.5 + (k as f64) % 10.0).unwrap();
        }

        // 64-bit LCG: x_{n+1} = a*x_n + c (mod 2^64)
        let mut r: u64 = 1;
        const A: u64 = 6364136223846793005;
        const C: u64 = 1;

        for _ in 0..10_000 {
            r = r.wrapping_mul(A).wrapping_add(C);
            let key: u64 = (r >> 32) % 60;
            match r % 3 {
                0 => {
                    d.remove(&key);
                }
                1 => d.set_weight(key, 0.5 + (key as f64) % 10.0).unwrap(),
                _ => {
                    d.add(key, 0.5 + (key as f64) % 10.0).unwrap();
                }
            }

            let expected: f64 = d.iter().map(|(_, w)| w).sum();
            assert!(approx_eq(d.total_weight(), expected, 1e-9));
            assert_eq!(d.sample().is_ok(), !d.is_empty());
        }
    }
}
