use crate::core::error::EbstError;
use crate::core::estimators::{Target, TargetMode, TargetStatistic};
use crate::splitters::ebst::node::{EbstNode, NodeId};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Extended Binary Search Tree over the values of one numeric attribute.
///
/// Nodes live in an arena and reference their children by index; slots freed
/// by pruning are recycled through `free`. Alongside the tree a running total
/// of every observation is kept, from which the "greater than" side of each
/// split candidate is derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EbstTree {
    pub(crate) nodes: Vec<EbstNode>,
    pub(crate) free: Vec<NodeId>,
    pub(crate) root: Option<NodeId>,
    pub(crate) total: Option<TargetStatistic>,
}

impl EbstTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree whose target shape is fixed up front instead of by the
    /// first observation.
    pub fn with_mode(mode: TargetMode) -> Self {
        Self {
            total: Some(TargetStatistic::empty(mode)),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> Option<TargetMode> {
        self.total.as_ref().map(TargetStatistic::mode)
    }

    /// Number of distinct keys (split candidates) held.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Statistic over every observation inserted so far.
    pub fn total(&self) -> Option<&TargetStatistic> {
        self.total.as_ref()
    }

    fn validate(key: f64, target: &Target, weight: f64) -> Result<(), EbstError> {
        if !key.is_finite() {
            return Err(EbstError::NonFiniteKey(key));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(EbstError::InvalidWeight(weight));
        }
        target.validate()
    }

    /// Records one observation of the attribute.
    ///
    /// Descends iteratively from the root. Every node whose key is greater
    /// than or equal to `key` absorbs the observation on the way down; an
    /// equal key stops the descent, otherwise a new node is attached where the
    /// walk falls off the tree.
    pub fn insert(&mut self, key: f64, target: &Target, weight: f64) -> Result<(), EbstError> {
        Self::validate(key, target, weight)?;
        if weight == 0.0 {
            return Ok(());
        }

        match self.total.as_mut() {
            Some(total) => total.update(target, weight)?,
            None => {
                trace!(mode = %target.mode(), "target mode established");
                self.total = Some(TargetStatistic::from_target(target, weight));
            }
        }

        let Some(mut current) = self.root else {
            let id = self.alloc(EbstNode::new(key, target, weight));
            self.root = Some(id);
            return Ok(());
        };

        loop {
            let node = &mut self.nodes[current];
            if key == node.key {
                node.statistic.update(target, weight)?;
                return Ok(());
            }

            let is_left = key < node.key;
            let next = if is_left {
                node.statistic.update(target, weight)?;
                node.left
            } else {
                node.right
            };

            match next {
                Some(child) => current = child,
                None => {
                    trace!(key, "new split candidate");
                    let id = self.alloc(EbstNode::new(key, target, weight));
                    let parent = &mut self.nodes[current];
                    if is_left {
                        parent.left = Some(id);
                    } else {
                        parent.right = Some(id);
                    }
                    return Ok(());
                }
            }
        }
    }

    /// Undoes an earlier [`insert`](Self::insert) with the same arguments.
    ///
    /// Nothing happens when `key` has no node. If any statistic on the path
    /// would drop below zero weight the call fails before touching the tree.
    pub fn revert(&mut self, key: f64, target: &Target, weight: f64) -> Result<(), EbstError> {
        Self::validate(key, target, weight)?;
        let Some(total) = self.total.as_ref() else {
            return Ok(());
        };
        total.check_mode(target)?;
        if weight == 0.0 {
            return Ok(());
        }

        let mut path = Vec::new();
        let mut current = self.root;
        let mut found = false;
        while let Some(id) = current {
            let node = &self.nodes[id];
            if key == node.key {
                path.push(id);
                found = true;
                break;
            }
            if key < node.key {
                path.push(id);
                current = node.left;
            } else {
                current = node.right;
            }
        }
        if !found {
            return Ok(());
        }

        total.check_revert(target, weight)?;
        for &id in &path {
            self.nodes[id].statistic.check_revert(target, weight)?;
        }
        for id in path {
            self.nodes[id].statistic.revert(target, weight)?;
        }
        if let Some(total) = self.total.as_mut() {
            total.revert(target, weight)?;
        }
        Ok(())
    }

    /// Raw statistic stored at `key`: the key's own mass plus its left subtree.
    pub fn node_statistic(&self, key: f64) -> Option<&TargetStatistic> {
        self.find(key).map(|id| &self.nodes[id].statistic)
    }

    pub(crate) fn find(&self, key: f64) -> Option<NodeId> {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            if key == node.key {
                return Some(id);
            }
            current = if key < node.key { node.left } else { node.right };
        }
        None
    }

    /// Distinct keys in ascending order.
    pub fn keys(&self) -> Keys<'_> {
        let mut keys = Keys {
            tree: self,
            stack: Vec::new(),
        };
        keys.push_left_spine(self.root);
        keys
    }

    /// Number of levels; 0 for an empty tree.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|id| (id, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self.nodes[id];
            stack.extend(node.left.map(|c| (c, depth + 1)));
            stack.extend(node.right.map(|c| (c, depth + 1)));
        }
        height
    }

    /// Drops every node and the running total. The target mode is kept.
    pub fn clear(&mut self) {
        let mode = self.mode();
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.total = mode.map(TargetStatistic::empty);
    }

    pub(crate) fn alloc(&mut self, node: EbstNode) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    pub(crate) fn release(&mut self, id: NodeId) {
        let node = &mut self.nodes[id];
        node.left = None;
        node.right = None;
        node.statistic = TargetStatistic::empty(node.statistic.mode());
        self.free.push(id);
    }
}

/// In-order iterator over the keys of an [`EbstTree`].
pub struct Keys<'a> {
    tree: &'a EbstTree,
    stack: Vec<NodeId>,
}

impl Keys<'_> {
    fn push_left_spine(&mut self, mut current: Option<NodeId>) {
        while let Some(id) = current {
            self.stack.push(id);
            current = self.tree.nodes[id].left;
        }
    }
}

impl Iterator for Keys<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let id = self.stack.pop()?;
        let tree = self.tree;
        let node = &tree.nodes[id];
        self.push_left_spine(node.right);
        Some(node.key)
    }
}
