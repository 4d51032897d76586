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

use std::hash::Hash;

use crate::binary_tree::WeightTree;
use crate::distribution::{
    check_weight, DistError, DistResult, ProbabilityDistribution, RNGType,
};

/// Weight-balanced binary tree backing.
///
/// Elements live in the leaves of a [WeightTree]; every relay node above them
/// stores the total weight and leaf count of its subtree. The total weight is
/// the root's aggregate, so it never carries cancellation error from earlier
/// removals.
///
/// # Sampling
/// Draw $r \sim U[0, 1)$ and set $v = r \cdot W$ with $W$ the total weight.
/// Starting at the root, go left while $v$ is below the left child's weight,
/// otherwise subtract that weight and go right. The leaf reached is returned.
///
/// # Complexity
/// With $d$ the tree depth:
/// - **add / remove / sample:** $\mathcal{O}(d)$.
///
/// Insertion steers towards the subtree with fewer leaves, so $d$ stays near
/// $\log_2 n$ for insert-heavy workloads. There is no rebalancing after
/// removals.
///
/// # Examples
/// ```
/// use probdist_rs::{ProbabilityDistribution, TreeDistribution};
///
/// let mut d = TreeDistribution::<u64>::with_seed(7);
/// d.add(1, 1.0).unwrap();
/// d.add(2, 1.0).unwrap();
/// d.add(3, 3.0).unwrap();
///
/// let draw = d.sample().unwrap();
/// assert!((1..=3).contains(&draw));
///
/// // Moving out leaves an empty distribution behind
/// let moved = std::mem::take(&mut d);
/// assert!(d.is_empty());
/// assert_eq!(moved.size(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct TreeDistribution<T>
where
    T: Clone + Eq + Hash,
{
    // Cloning keeps the generator state, so a clone replays the same draws
    rng_: RNGType,

    // Deep-copied on clone
    sampling_tree_: WeightTree<T>,
}

impl<T> TreeDistribution<T>
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
        TreeDistribution {
            rng_: rng,
            sampling_tree_: WeightTree::new(),
        }
    }

    fn select(&self, value: f64) -> DistResult<T> {
        self.sampling_tree_.find(value).ok_or_else(|| {
            log::error!("tree walk found no leaf for value {}", value);
            DistError::InconsistentState("tree walk found no leaf")
        })
    }
}

impl<T> Default for TreeDistribution<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ProbabilityDistribution<T> for TreeDistribution<T>
where
    T: Clone + Eq + Hash,
{
    fn size(&self) -> usize {
        self.sampling_tree_.len()
    }

    fn total_weight(&self) -> f64 {
        self.sampling_tree_.root_weight()
    }

    fn add(&mut self, element: T, weight: f64) -> DistResult<bool> {
        if self.sampling_tree_.contains(&element) {
            return Ok(false);
        }
        check_weight(weight)?;

        Ok(self.sampling_tree_.insert(element, weight))
    }

    #[inline]
    fn contains(&self, element: &T) -> bool {
        self.sampling_tree_.contains(element)
    }

    fn weight(&self, element: &T) -> Option<f64> {
        self.sampling_tree_.leaf_weight(element)
    }

    fn remove(&mut self, element: &T) -> bool {
        match self.sampling_tree_.remove(element) {
            Ok(removed) => removed.is_some(),
            // The tree refused before touching anything
            Err(_) => false,
        }
    }

    fn sample(&mut self) -> DistResult<T> {
        if self.is_empty() {
            return Err(DistError::EmptyDistribution);
        }
        let r: f64 = self.rng_.random_range(0.0..1.0);
        self.select(r * self.total_weight())
    }

    fn sample_ext_rng<R>(&self, generator: &mut R) -> DistResult<T>
    where
        R: Rng + ?Sized,
    {
        if self.is_empty() {
            return Err(DistError::EmptyDistribution);
        }
        let r: f64 = generator.random_range(0.0..1.0);
        self.select(r * self.total_weight())
    }

    fn clear(&mut self) {
        log::debug!("clearing tree distribution ({} leaves)", self.sampling_tree_.len());
        self.sampling_tree_.clear();
    }

    fn seed(&mut self, seed: u64) {
        log::debug!("re-seeding tree distribution");
        self.rng_ = RNGType::seed_from_u64(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArrayDistribution;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn add_remove_and_totals() {
        let mut d = TreeDistribution::<i32>::with_seed(42);
        d.add(1, 1.0).unwrap();
        d.add(2, 2.0).unwrap();
        d.add(3, 5.0).unwrap();

        assert_eq!(d.size(), 3);
        assert!(d.contains(&2));
        assert!(approx_eq(d.total_weight(), 8.0, 1e-12));
        assert!(approx_eq(d.sampling_tree_.root_weight(), 8.0, 1e-12));

        assert!(d.remove(&2));
        assert_eq!(d.size(), 2);
        assert!(!d.contains(&2));
        assert!(approx_eq(d.total_weight(), 6.0, 1e-12));
        assert_eq!(d.weight(&3), Some(5.0));
        assert_eq!(d.weight(&2), None);
    }

    #[test]
    fn total_weight_is_sum_of_stored_weights() {
        let mut d = TreeDistribution::<u64>::with_seed(5);
        for k in 0..100 {
            d.add(k, 0.5 + (k % 9) as f64).unwrap();
        }
        for k in (0..100).step_by(3) {
            assert!(d.remove(&k));
        }
        let expected: f64 = (0..100)
            .filter_map(|k| d.weight(&k))
            .sum();
        assert!(approx_eq(d.total_weight(), expected, 1e-9));
    }

    #[test]
    fn huge_weight_removal_restores_small_total() {
        let mut d = TreeDistribution::<u64>::with_seed(6);
        for k in 0..10 {
            d.add(k, 0.1).unwrap();
        }
        d.add(99, 1e18).unwrap();
        assert!(d.remove(&99));

        let expected: f64 = (0..10).filter_map(|k| d.weight(&k)).sum();
        assert!(approx_eq(d.total_weight(), expected, 1e-12));
        for _ in 0..1000 {
            assert!(d.sample().unwrap() < 10);
        }
    }

    #[test]
    fn sampling_distribution_matches_weights() {
        // weights 1:2:5 -> probabilities 1/8, 2/8, 5/8
        let mut d = TreeDistribution::<usize>::with_seed(123);
        d.add(0, 1.0).unwrap();
        d.add(1, 2.0).unwrap();
        d.add(2, 5.0).unwrap();

        let n = 100_000usize;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            counts[d.sample().expect("non-empty")] += 1;
        }

        let p = [1.0 / 8.0, 2.0 / 8.0, 5.0 / 8.0];
        for i in 0..3 {
            let freq = counts[i] as f64 / n as f64;
            let sigma = (p[i] * (1.0 - p[i]) / n as f64).sqrt();
            assert!(
                (freq - p[i]).abs() <= 5.0 * sigma,
                // \u{03C3} = sigma
                "bucket {i}: freq={freq:.6}, expected={:.6}, 5\u{03C3}={:.6}",
                p[i],
                5.0 * sigma
            );
        }
    }

    #[test]
    fn single_element_is_always_drawn() {
        let mut d = TreeDistribution::<&'static str>::with_seed(1);
        d.add("only", 1e-9).unwrap();
        for _ in 0..1000 {
            assert_eq!(d.sample(), Ok("only"));
        }
    }

    #[test]
    fn clone_replays_generator_but_not_mutations() {
        let mut a = TreeDistribution::<u32>::with_seed(31);
        for k in 0..16 {
            a.add(k, 1.0 + k as f64).unwrap();
        }
        let mut b = a.clone();

        let xs: Vec<_> = a.sample_iter(200).collect();
        let ys: Vec<_> = b.sample_iter(200).collect();
        assert_eq!(xs, ys);

        b.remove(&15);
        b.add(99, 4.0).unwrap();
        assert!(a.contains(&15));
        assert!(!a.contains(&99));
        for _ in 0..2000 {
            assert_ne!(a.sample().unwrap(), 99);
            assert_ne!(b.sample().unwrap(), 15);
        }
    }

    #[test]
    fn agrees_with_array_backing() {
        let mut tree = TreeDistribution::<u64>::with_seed(0);
        let mut array = ArrayDistribution::<u64>::with_seed(0);

        // 64-bit LCG: x_{n+1} = a*x_n + c (mod 2^64)
        let mut r: u64 = 1;
        const A: u64 = 6364136223846793005;
        const C: u64 = 1;

        for _ in 0..5_000 {
            r = r.wrapping_mul(A).wrapping_add(C);
            let key: u64 = (r >> 32) % 80;
            let w = 0.5 + (key as f64) % 10.0;
            match r % 3 {
                0 => assert_eq!(tree.remove(&key), array.remove(&key)),
                1 => {
                    tree.set_weight(key, w).unwrap();
                    array.set_weight(key, w).unwrap();
                }
                _ => assert_eq!(tree.add(key, w), array.add(key, w)),
            }
            assert_eq!(tree.size(), array.size());
            assert!(approx_eq(tree.total_weight(), array.total_weight(), 1e-9));
        }
        for (k, w) in array.iter() {
            assert_eq!(tree.weight(k), Some(w));
        }
    }

    #[test]
    fn ext_rng_leaves_internal_generator_alone() {
        let mut a = TreeDistribution::<u32>::with_seed(11);
        let mut b = TreeDistribution::<u32>::with_seed(11);
        for k in 0..8 {
            a.add(k, 1.0).unwrap();
            b.add(k, 1.0).unwrap();
        }

        let mut ext = RNGType::seed_from_u64(0);
        for _ in 0..50 {
            a.sample_ext_rng(&mut ext).unwrap();
        }
        assert_eq!(a.sample(), b.sample());
    }

    #[test]
    fn bulk_add_sample_remove() {
        let mut d = TreeDistribution::<usize>::with_seed(2024);
        let n = 40_000;
        for i in 0..n {
            assert!(d.add(i, 1.0).unwrap());
        }
        for _ in 0..n {
            assert!(d.sample().unwrap() < n);
        }
        // stride through the keys to avoid removing in insertion order
        for i in 0..n {
            let k = (i * 7919) % n;
            assert!(d.remove(&k));
        }
        assert!(d.is_empty());
        assert_eq!(d.total_weight(), 0.0);
    }
}
