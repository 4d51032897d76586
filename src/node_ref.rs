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

//! Node handles shared by the linked-list and tree backings.
//!
//! A [NodeRef] owns its node: exactly one owner (a parent slot, a `next`
//! slot, or the container's root/head) keeps it alive. A [WeakNodeRef] is a
//! back-reference (parent, `prev`, tail, membership index) and never keeps a
//! node alive on its own.

use std::{
    cell::RefCell,
    ops::Deref,
    rc::{Rc, Weak},
};

#[derive(Debug)]
pub struct NodeRef<N>(Rc<RefCell<N>>);

impl<N> NodeRef<N> {
    pub fn new(node: N) -> Self {
        NodeRef(Rc::new(RefCell::new(node)))
    }

    pub fn downgrade(&self) -> WeakNodeRef<N> {
        WeakNodeRef(Rc::downgrade(&self.0))
    }

    /// Identity comparison, not value comparison.
    #[inline]
    pub fn ptr_eq(&self, other: &NodeRef<N>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// Derived Clone would require `N: Clone`
impl<N> Clone for NodeRef<N> {
    fn clone(&self) -> Self {
        NodeRef(Rc::clone(&self.0))
    }
}

impl<N> Deref for NodeRef<N> {
    type Target = Rc<RefCell<N>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub struct WeakNodeRef<N>(Weak<RefCell<N>>);

impl<N> WeakNodeRef<N> {
    pub fn new() -> Self {
        WeakNodeRef(Weak::new())
    }

    pub fn upgrade(&self) -> Option<NodeRef<N>> {
        self.0.upgrade().map(NodeRef)
    }

    /// Downgrades `node` if present, otherwise returns a dangling handle.
    pub fn from_option(node: Option<&NodeRef<N>>) -> Self {
        node.map_or_else(WeakNodeRef::new, NodeRef::downgrade)
    }
}

impl<N> Clone for WeakNodeRef<N> {
    fn clone(&self) -> Self {
        WeakNodeRef(Weak::clone(&self.0))
    }
}

impl<N> Default for WeakNodeRef<N> {
    fn default() -> Self {
        WeakNodeRef::new()
    }
}
