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

use rand::Rng;
use rand_pcg::Pcg32;

use std::error::Error;
use std::fmt;

/// Random number generator owned by every distribution instance.
pub(crate) type RNGType = Pcg32;

pub type DistResult<T> = Result<T, DistError>;

/// A removal taking away at least this share of a running total makes the
/// backing re-sum its stored weights instead of subtracting.
pub(crate) const RESUM_FRACTION: f64 = 0.5;

/// Errors that can occur within a probability distribution.
#[derive(Debug, Clone, PartialEq)]
pub enum DistError {
    /// The distribution holds no elements, so nothing can be sampled.
    EmptyDistribution,
    /// Weight is NaN, non-positive or infinite.
    InvalidWeight(f64),
    /// Internal bookkeeping is broken. Seeing this is a bug.
    InconsistentState(&'static str),
}

impl fmt::Display for DistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistError::EmptyDistribution => write!(f, "This probability distribution is empty."),
            DistError::InvalidWeight(w) if w.is_nan() => write!(f, "The input weight is NaN."),
            DistError::InvalidWeight(w) if *w <= 0.0 => {
                write!(f, "The input weight is non-positive: {}.", w)
            }
            DistError::InvalidWeight(_) => write!(f, "The input weight is positive infinity."),
            DistError::InconsistentState(msg) => write!(f, "Inconsistent state: {}", msg),
        }
    }
}

impl Error for DistError {}

/// Checks that `weight` is a finite, strictly positive number.
///
/// Returns [DistError::InvalidWeight] otherwise.
#[inline]
pub fn check_weight(weight: f64) -> DistResult<()> {
    // `!(weight > 0.0)` also catches NaN
    if !(weight > 0.0) || weight.is_infinite() {
        Err(DistError::InvalidWeight(weight))
    } else {
        Ok(())
    }
}

/// A dynamic collection of unique elements, each with a positive weight,
/// that draws elements with probability proportional to their weight.
///
/// Every backing ([ArrayDistribution](crate::ArrayDistribution),
/// [LinkedListDistribution](crate::LinkedListDistribution),
/// [TreeDistribution](crate::TreeDistribution)) honors the same contract:
///
/// - elements are unique; adding a present element returns `Ok(false)`
///   and changes nothing,
/// - [total_weight](ProbabilityDistribution::total_weight) is the sum of the
///   stored weights,
/// - every operation is all-or-nothing.
///
/// The trait is object safe, so callers can hold a
/// `Box<dyn ProbabilityDistribution<T>>` and pick the backing at runtime.
pub trait ProbabilityDistribution<T> {
    /// Returns the number of elements.
    fn size(&self) -> usize;

    /// Returns true if there are no elements.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the sum of all stored weights.
    fn total_weight(&self) -> f64;

    /// Adds `element` with the given weight.
    ///
    /// Returns `Ok(true)` on insertion, `Ok(false)` if the element is
    /// already present (the weight is not validated in that case).
    ///
    /// Returns [DistError::InvalidWeight] if the weight is NaN,
    /// non-positive or infinite.
    fn add(&mut self, element: T, weight: f64) -> DistResult<bool>;

    /// Checks if the element exists.
    fn contains(&self, element: &T) -> bool;

    /// Returns the weight of `element`, if present.
    fn weight(&self, element: &T) -> Option<f64>;

    /// Removes `element`.
    ///
    /// Returns `true` on removal, `false` if the element was not found.
    fn remove(&mut self, element: &T) -> bool;

    /// Draws one element with probability proportional to its weight,
    /// using the instance's own generator.
    ///
    /// Returns [DistError::EmptyDistribution] if there are no elements.
    fn sample(&mut self) -> DistResult<T>;

    /// Removes all elements.
    fn clear(&mut self);

    /// Re-seeds the instance's generator.
    fn seed(&mut self, seed: u64);

    /// Sets the weight of `element`, inserting it if absent.
    ///
    /// The weight is checked before anything is touched.
    fn set_weight(&mut self, element: T, weight: f64) -> DistResult<()> {
        check_weight(weight)?;
        self.remove(&element);
        self.add(element, weight)?;
        Ok(())
    }

    /// Draws one element using a **caller-supplied RNG**.
    ///
    /// The instance's own generator is left untouched.
    fn sample_ext_rng<R>(&self, generator: &mut R) -> DistResult<T>
    where
        R: Rng + ?Sized,
        Self: Sized;

    /// Returns an iterator that lazily draws up to `n` samples
    /// with the built in generator.
    fn sample_iter(&mut self, n: usize) -> SamplingIter<'_, T, Self>
    where
        Self: Sized,
    {
        SamplingIter {
            dist: self,
            remaining: n,
            _marker: std::marker::PhantomData,
        }
    }

    /// Returns an iterator that lazily draws up to `n` samples
    /// from an external generator.
    fn sample_iter_ext<'a, R>(
        &'a self,
        generator: &'a mut R,
        n: usize,
    ) -> SamplingIterExt<'a, T, Self, R>
    where
        R: Rng + ?Sized,
        Self: Sized,
    {
        SamplingIterExt {
            dist: self,
            generator,
            remaining: n,
            _marker: std::marker::PhantomData,
        }
    }
}

/// Subtracts weights from `value` in storage order until it falls inside one
/// element's interval. Shared by the array and linked-list backings.
pub(crate) fn inverse_cdf_scan<'a, T, I>(mut value: f64, entries: I) -> DistResult<T>
where
    T: Clone + 'a,
    I: IntoIterator<Item = (&'a T, f64)>,
{
    for (element, weight) in entries {
        if value < weight {
            return Ok(element.clone());
        }
        value -= weight;
    }

    log::error!("inverse CDF scan ran past the last entry (remaining value {})", value);
    Err(DistError::InconsistentState("sampling scan exhausted all entries"))
}

/// Sampling iterator over a distribution.
///
/// Yields at most `n` samples; stops early if sampling fails.
pub struct SamplingIter<'a, T, D>
where
    D: ProbabilityDistribution<T> + ?Sized,
{
    dist: &'a mut D,
    remaining: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<'a, T, D> Iterator for SamplingIter<'a, T, D>
where
    D: ProbabilityDistribution<T> + ?Sized,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.dist.sample() {
            Ok(x) => {
                self.remaining -= 1;
                Some(x)
            }
            Err(_) => {
                self.remaining = 0;
                None
            }
        }
    }
}

/// A sampling iterator that takes an external RNG source.
pub struct SamplingIterExt<'a, T, D, R>
where
    D: ProbabilityDistribution<T>,
    R: Rng + ?Sized + 'a,
{
    dist: &'a D,
    generator: &'a mut R,
    remaining: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<'a, T, D, R> Iterator for SamplingIterExt<'a, T, D, R>
where
    D: ProbabilityDistribution<T>,
    R: Rng + ?Sized + 'a,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.dist.sample_ext_rng(self.generator) {
            Ok(x) => {
                self.remaining -= 1;
                Some(x)
            }
            Err(_) => {
                self.remaining = 0;
                None
            }
        }
    }
}
