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
use std::fmt;
use std::hash::Hash;

use crate::distribution::{
    check_weight, DistError, DistResult, ProbabilityDistribution, RNGType, RESUM_FRACTION,
};
use crate::node_ref::{NodeRef, WeakNodeRef};

type ListNodeRef<T> = NodeRef<ListNode<T>>;
type WeakListNodeRef<T> = WeakNodeRef<ListNode<T>>;

#[derive(Debug)]
pub(crate) struct ListNode<T> {
    element: T,
    weight: f64,
    prev: WeakListNodeRef<T>,
    next: Option<ListNodeRef<T>>,
}

/// Doubly-linked-list backing.
///
/// Each node owns its successor, predecessors and the tail are weak
/// back-references, and the membership map holds weak handles for
/// $\mathcal{O}(1)$ lookup and unlink.
///
/// # Complexity
/// - **add / remove:** $\mathcal{O}(1)$.
///   A removal taking at least half of the total re-walks the list to re-sum.
/// - **sample:** $\mathcal{O}(n)$ inverse-CDF walk from head to tail.
pub struct LinkedListDistribution<T>
where
    T: Clone + Eq + Hash,
{
    total_weight_: f64,
    rng_: RNGType,

    head_: Option<ListNodeRef<T>>,
    tail_: WeakListNodeRef<T>,
    node_map_: HashMap<T, WeakListNodeRef<T>>,
}

impl<T> LinkedListDistribution<T>
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
        LinkedListDistribution {
            total_weight_: 0.0,
            rng_: rng,
            head_: None,
            tail_: WeakNodeRef::new(),
            node_map_: HashMap::new(),
        }
    }

    /// Returns the stored `(element, weight)` pairs from head to tail.
    pub fn to_vec(&self) -> Vec<(T, f64)> {
        let mut out = Vec::with_capacity(self.node_map_.len());
        let mut cur = self.head_.clone();
        while let Some(node) = cur {
            let nb = node.borrow();
            out.push((nb.element.clone(), nb.weight));
            cur = nb.next.clone();
        }
        out
    }

    fn push_back(&mut self, element: T, weight: f64) -> ListNodeRef<T> {
        let node = NodeRef::new(ListNode {
            element,
            weight,
            prev: self.tail_.clone(),
            next: None,
        });

        match self.tail_.upgrade() {
            Some(tail) => {
                tail.borrow_mut().next = Some(node.clone());
            }
            None => self.head_ = Some(node.clone()),
        }
        self.tail_ = node.downgrade();

        node
    }

    /// Relinks the neighbours of `node` around it.
    fn unlink(&mut self, node: &ListNodeRef<T>) {
        let (prev, next) = {
            let mut nb = node.borrow_mut();
            let prev = nb.prev.upgrade();
            nb.prev = WeakNodeRef::new();
            let next = nb.next.take();
            (prev, next)
        };

        match &next {
            Some(n) => {
                n.borrow_mut().prev = WeakNodeRef::from_option(prev.as_ref());
            }
            None => self.tail_ = WeakNodeRef::from_option(prev.as_ref()),
        }
        match prev {
            Some(p) => {
                p.borrow_mut().next = next;
            }
            None => self.head_ = next,
        }
    }

    /// Sums the weights from head to tail.
    fn stored_weight_sum(&self) -> f64 {
        let mut sum = 0.0;
        let mut cur = self.head_.clone();
        while let Some(node) = cur {
            let nb = node.borrow();
            sum += nb.weight;
            cur = nb.next.clone();
        }
        sum
    }

    fn select(&self, mut value: f64) -> DistResult<T> {
        let mut cur = self.head_.clone();
        while let Some(node) = cur {
            let nb = node.borrow();
            if value < nb.weight {
                return Ok(nb.element.clone());
            }
            value -= nb.weight;
            cur = nb.next.clone();
        }

        log::error!("linked list scan ran past the tail (remaining value {})", value);
        Err(DistError::InconsistentState("sampling scan exhausted all entries"))
    }

    /// Drops the chain one node at a time. Letting `head_` go would recurse
    /// once per node.
    fn release_nodes(&mut self) {
        let mut cur = self.head_.take();
        while let Some(node) = cur {
            cur = node.borrow_mut().next.take();
        }
        self.tail_ = WeakNodeRef::new();
    }
}

impl<T> Default for LinkedListDistribution<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LinkedListDistribution<T>
where
    T: Clone + Eq + Hash,
{
    fn drop(&mut self) {
        self.release_nodes();
    }
}

impl<T> Clone for LinkedListDistribution<T>
where
    T: Clone + Eq + Hash,
{
    /// Deep copies the list, so the copy shares no nodes with `self`.
    fn clone(&self) -> Self {
        let mut out = LinkedListDistribution::with_rng(self.rng_.clone());
        for (element, weight) in self.to_vec() {
            let node = out.push_back(element.clone(), weight);
            out.node_map_.insert(element, node.downgrade());
        }
        out.total_weight_ = self.total_weight_;
        out
    }
}

impl<T> fmt::Debug for LinkedListDistribution<T>
where
    T: Clone + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedListDistribution")
            .field("total_weight", &self.total_weight_)
            .field("entries", &self.to_vec())
            .finish()
    }
}

impl<T> ProbabilityDistribution<T> for LinkedListDistribution<T>
where
    T: Clone + Eq + Hash,
{
    fn size(&self) -> usize {
        self.node_map_.len()
    }

    fn total_weight(&self) -> f64 {
        self.total_weight_
    }

    fn add(&mut self, element: T, weight: f64) -> DistResult<bool> {
        if self.node_map_.contains_key(&element) {
            return Ok(false);
        }
        check_weight(weight)?;

        let node = self.push_back(element.clone(), weight);
        self.node_map_.insert(element, node.downgrade());
        self.total_weight_ += weight;

        Ok(true)
    }

    #[inline]
    fn contains(&self, element: &T) -> bool {
        self.node_map_.contains_key(element)
    }

    fn weight(&self, element: &T) -> Option<f64> {
        self.node_map_
            .get(element)
            .and_then(WeakNodeRef::upgrade)
            .map(|n| n.borrow().weight)
    }

    fn remove(&mut self, element: &T) -> bool {
        let node = match self.node_map_.remove(element) {
            Some(weak) => weak.upgrade(),
            None => return false,
        };
        let node = match node {
            Some(node) => node,
            None => {
                // The stale entry is dropped; the chain is the source of truth
                log::error!("membership index held a dangling list node");
                self.total_weight_ = self.stored_weight_sum();
                return true;
            }
        };

        self.unlink(&node);
        let w_old = node.borrow().weight;

        if self.node_map_.is_empty() {
            self.total_weight_ = 0.0;
        } else if w_old >= RESUM_FRACTION * self.total_weight_ {
            // The difference would be mostly rounding error
            self.total_weight_ = self.stored_weight_sum();
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
        log::debug!("clearing linked list distribution ({} nodes)", self.node_map_.len());
        self.release_nodes();
        self.node_map_.clear();
        self.total_weight_ = 0.0;
    }

    fn seed(&mut self, seed: u64) {
        log::debug!("re-seeding linked list distribution");
        self.rng_ = RNGType::seed_from_u64(seed);
    }
}
