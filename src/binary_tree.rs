use std::{collections::HashMap, hash::Hash};

use crate::distribution::{DistError, DistResult};
use crate::node_ref::{NodeRef, WeakNodeRef};

type TreeNodeRef<T> = NodeRef<TreeNode<T>>;
type WeakTreeNodeRef<T> = WeakNodeRef<TreeNode<T>>;

/// A leaf (holds an element) or a relay (holds nothing, aggregates its subtree).
#[derive(Debug)]
pub struct TreeNode<T> {
    // `None` marks a relay node
    element: Option<T>,
    weight: f64,
    leaf_count: usize,
    parent: WeakTreeNodeRef<T>,
    left: Option<TreeNodeRef<T>>,
    right: Option<TreeNodeRef<T>>,
}

impl<T> TreeNode<T> {
    fn leaf(element: T, weight: f64) -> Self {
        TreeNode {
            element: Some(element),
            weight,
            leaf_count: 1,
            parent: WeakNodeRef::new(),
            left: None,
            right: None,
        }
    }

    /// An empty relay. Its aggregates are filled in by `update_metadata`
    /// once both children hang below it.
    fn relay() -> Self {
        TreeNode {
            element: None,
            weight: 0.0,
            leaf_count: 0,
            parent: WeakNodeRef::new(),
            left: None,
            right: None,
        }
    }

    pub fn is_relay(&self) -> bool {
        self.element.is_none()
    }

    fn replace_child(&mut self, old: &TreeNodeRef<T>, new: TreeNodeRef<T>) {
        if self.left.as_ref().is_some_and(|l| l.ptr_eq(old)) {
            self.left = Some(new);
        } else {
            self.right = Some(new);
        }
    }

    /// Returns the child that is not `child`, if `child` hangs below `self`
    /// and the other slot is filled.
    fn sibling_of(&self, child: &TreeNodeRef<T>) -> Option<TreeNodeRef<T>> {
        match (&self.left, &self.right) {
            (Some(l), Some(r)) if l.ptr_eq(child) => Some(r.clone()),
            (Some(l), Some(r)) if r.ptr_eq(child) => Some(l.clone()),
            _ => None,
        }
    }
}

/// Binary tree whose leaves carry weighted elements and whose relay nodes
/// carry the weight and leaf count of their subtree.
///
/// - Insertion walks towards the child with fewer leaves (right on ties) and
///   splits the leaf it lands on into a relay with two leaves.
/// - Removal splices the removed leaf's sibling into its parent's slot.
/// - Lookup by cumulative weight costs one root-to-leaf walk.
///
/// Relay aggregates are always recomputed from the two children, never
/// patched with deltas, so a relay's weight is the floating sum of its
/// subtree no matter how far apart the leaf weights are.
///
/// Leaf-count steering keeps the tree shallow under ordinary workloads, but
/// nothing rebalances after removals, so adversarial interleavings can
/// deepen it. Drop and clone walk the tree with an explicit stack.
///
/// Parents own their children. Parent links and the leaf index are weak.
pub struct WeightTree<T>
where
    T: Clone + Eq + Hash,
{
    root_: Option<TreeNodeRef<T>>,
    leaves_map_: HashMap<T, WeakTreeNodeRef<T>>,
}

impl<T> WeightTree<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        WeightTree {
            root_: None,
            leaves_map_: HashMap::new(),
        }
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.leaves_map_.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root_.is_none()
    }

    pub fn contains(&self, element: &T) -> bool {
        self.leaves_map_.contains_key(element)
    }

    /// Sum of all leaf weights, read off the root.
    pub fn root_weight(&self) -> f64 {
        self.root_.as_ref().map_or(0.0, |r| r.borrow().weight)
    }

    pub fn leaf_weight(&self, element: &T) -> Option<f64> {
        let leaf = self.leaves_map_.get(element)?.upgrade()?;
        let w = leaf.borrow().weight;
        Some(w)
    }

    /// Inserts a new leaf. Returns `false` if `element` is already present.
    ///
    /// The caller is responsible for validating `weight`.
    pub fn insert(&mut self, element: T, weight: f64) -> bool {
        if self.leaves_map_.contains_key(&element) {
            return false;
        }

        let leaf = NodeRef::new(TreeNode::leaf(element.clone(), weight));
        self.leaves_map_.insert(element, leaf.downgrade());

        let root = match self.root_.clone() {
            Some(root) => root,
            None => {
                self.root_ = Some(leaf);
                return true;
            }
        };

        let mut cur = root;
        loop {
            let next = {
                let node = cur.borrow();
                match (&node.left, &node.right) {
                    (Some(l), Some(r)) => {
                        if l.borrow().leaf_count < r.borrow().leaf_count {
                            l.clone()
                        } else {
                            r.clone()
                        }
                    }
                    _ => break,
                }
            };
            cur = next;
        }

        self.bypass_leaf(cur, leaf);
        true
    }

    /// Replaces `bypassed` (a leaf) with a relay holding `bypassed` and
    /// `new_leaf`, then refreshes every ancestor's aggregates.
    fn bypass_leaf(&mut self, bypassed: TreeNodeRef<T>, new_leaf: TreeNodeRef<T>) {
        let parent = bypassed.borrow().parent.upgrade();

        let relay = NodeRef::new(TreeNode::relay());
        {
            let mut rb = relay.borrow_mut();
            rb.parent = WeakNodeRef::from_option(parent.as_ref());
            rb.left = Some(bypassed.clone());
            rb.right = Some(new_leaf.clone());
        }
        bypassed.borrow_mut().parent = relay.downgrade();
        new_leaf.borrow_mut().parent = relay.downgrade();

        match &parent {
            Some(p) => {
                p.borrow_mut().replace_child(&bypassed, relay.clone());
            }
            None => self.root_ = Some(relay.clone()),
        }

        log::trace!("split leaf into relay (depth {})", Self::depth_of(&relay));
        Self::update_metadata(Some(relay));
    }

    /// Removes the leaf holding `element` and returns its weight,
    /// or `Ok(None)` if there is no such leaf.
    ///
    /// Every lookup happens before the first mutation, so an `Err` leaves
    /// the tree and its index exactly as they were.
    pub fn remove(&mut self, element: &T) -> DistResult<Option<f64>> {
        let leaf = match self.leaves_map_.get(element) {
            Some(weak) => weak.upgrade(),
            None => return Ok(None),
        };
        let leaf = leaf.ok_or_else(|| {
            log::error!("leaf index held a dangling tree node");
            DistError::InconsistentState("leaf index held a dangling node")
        })?;

        let relay = leaf.borrow().parent.upgrade();
        let relay = match relay {
            Some(relay) => relay,
            None => {
                // Removing the only leaf
                self.leaves_map_.remove(element);
                self.root_ = None;
                let weight = leaf.borrow().weight;
                return Ok(Some(weight));
            }
        };

        let (sibling, grand) = {
            let rb = relay.borrow();
            (rb.sibling_of(&leaf), rb.parent.upgrade())
        };
        let sibling = sibling.ok_or_else(|| {
            log::error!("relay node without a sibling leaf");
            DistError::InconsistentState("relay node without two children")
        })?;

        self.leaves_map_.remove(element);
        let weight = {
            let mut lb = leaf.borrow_mut();
            lb.parent = WeakNodeRef::new();
            lb.weight
        };
        {
            let mut rb = relay.borrow_mut();
            rb.left = None;
            rb.right = None;
        }

        sibling.borrow_mut().parent = WeakNodeRef::from_option(grand.as_ref());
        match &grand {
            Some(g) => {
                g.borrow_mut().replace_child(&relay, sibling);
            }
            None => self.root_ = Some(sibling),
        }

        log::trace!("spliced out relay, {} leaves left", self.leaves_map_.len());
        Self::update_metadata(grand);
        Ok(Some(weight))
    }

    /// Returns the element whose cumulative-weight interval contains `value`.
    ///
    /// `value` is expected in `[0, root_weight())`. Larger values end up on
    /// the rightmost leaf.
    pub fn find(&self, mut value: f64) -> Option<T> {
        let mut cur = self.root_.clone()?;
        loop {
            let next = {
                let node = cur.borrow();
                match (&node.left, &node.right) {
                    (Some(l), Some(r)) => {
                        let left_weight = l.borrow().weight;
                        if value < left_weight {
                            l.clone()
                        } else {
                            value -= left_weight;
                            r.clone()
                        }
                    }
                    _ => {
                        if node.is_relay() {
                            log::error!("tree walk ended on a relay node");
                        }
                        return node.element.clone();
                    }
                }
            };
            cur = next;
        }
    }

    pub fn clear(&mut self) {
        self.release_nodes();
        self.leaves_map_.clear();
    }

    /// Recomputes weight and leaf count of `node` and every ancestor above it
    /// from their two children.
    fn update_metadata(node: Option<TreeNodeRef<T>>) {
        let mut cur = node;
        while let Some(n) = cur {
            let mut nb = n.borrow_mut();
            let sums = match (&nb.left, &nb.right) {
                (Some(l), Some(r)) => {
                    let (lb, rb) = (l.borrow(), r.borrow());
                    Some((lb.weight + rb.weight, lb.leaf_count + rb.leaf_count))
                }
                _ => None,
            };
            if let Some((weight, leaf_count)) = sums {
                nb.weight = weight;
                nb.leaf_count = leaf_count;
            }
            cur = nb.parent.upgrade();
        }
    }

    fn depth_of(node: &TreeNodeRef<T>) -> usize {
        let mut depth = 0;
        let mut cur = node.borrow().parent.upgrade();
        while let Some(n) = cur {
            depth += 1;
            cur = n.borrow().parent.upgrade();
        }
        depth
    }

    /// Copies a single node without its children, registering it in
    /// `leaves` if it is a leaf.
    fn copy_node(
        node: &TreeNodeRef<T>,
        parent: WeakTreeNodeRef<T>,
        leaves: &mut HashMap<T, WeakTreeNodeRef<T>>,
    ) -> TreeNodeRef<T> {
        let src = node.borrow();
        let copy = NodeRef::new(TreeNode {
            element: src.element.clone(),
            weight: src.weight,
            leaf_count: src.leaf_count,
            parent,
            left: None,
            right: None,
        });
        if let Some(e) = &src.element {
            leaves.insert(e.clone(), copy.downgrade());
        }
        copy
    }

    /// Detaches every node from its parent before it goes, so no drop
    /// recurses down the tree.
    fn release_nodes(&mut self) {
        let mut stack: Vec<TreeNodeRef<T>> = self.root_.take().into_iter().collect();
        while let Some(node) = stack.pop() {
            let mut nb = node.borrow_mut();
            stack.extend(nb.left.take());
            stack.extend(nb.right.take());
        }
    }
}

impl<T> Default for WeightTree<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        WeightTree::new()
    }
}

impl<T> Drop for WeightTree<T>
where
    T: Clone + Eq + Hash,
{
    fn drop(&mut self) {
        self.release_nodes();
    }
}

impl<T> Clone for WeightTree<T>
where
    T: Clone + Eq + Hash,
{
    /// !!! DOES NOT BEHAVE LIKE NORMAL RUST CLONING OF POINTERS !!!
    /// Deep copies the tree node by node, in pre-order. Weights and leaf
    /// counts are copied verbatim, so the copy has exactly the same shape.
    fn clone(&self) -> Self {
        let mut leaves = HashMap::with_capacity(self.leaves_map_.len());
        let root = match &self.root_ {
            Some(root) => root,
            None => return WeightTree::new(),
        };

        let root_copy = Self::copy_node(root, WeakNodeRef::new(), &mut leaves);
        let mut stack = vec![(root.clone(), root_copy.clone())];
        while let Some((src, dst)) = stack.pop() {
            let sb = src.borrow();
            if let (Some(l), Some(r)) = (&sb.left, &sb.right) {
                let l_copy = Self::copy_node(l, dst.downgrade(), &mut leaves);
                let r_copy = Self::copy_node(r, dst.downgrade(), &mut leaves);
                {
                    let mut db = dst.borrow_mut();
                    db.left = Some(l_copy.clone());
                    db.right = Some(r_copy.clone());
                }
                stack.push((r.clone(), r_copy));
                stack.push((l.clone(), l_copy));
            }
        }

        WeightTree {
            root_: Some(root_copy),
            leaves_map_: leaves,
        }
    }
}

impl<T> std::fmt::Debug for WeightTree<T>
where
    T: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightTree")
            .field("leaves", &self.leaves_map_.len())
            .field("total_weight", &self.root_weight())
            .finish()
    }
}
