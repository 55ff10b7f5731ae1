use crate::core::estimators::TargetStatistic;
use crate::splitters::ebst::ebst_tree::EbstTree;
use crate::splitters::ebst::node::NodeId;

/// Partition statistics for the threshold `value <= key`.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitCandidate {
    pub key: f64,
    /// Every observation with a value `<= key`.
    pub le: TargetStatistic,
    /// Every observation with a value `> key`.
    pub gt: TargetStatistic,
}

/// Lazy in-order walk yielding one [`SplitCandidate`] per distinct key.
///
/// A node's "<=" aggregate is its own statistic plus the "<=" aggregate of
/// the nearest ancestor whose right subtree contains it. Those ancestor
/// aggregates are kept on `aux`; each stack entry records how many of them
/// were live when it was pushed.
pub struct Candidates<'a> {
    tree: &'a EbstTree,
    stack: Vec<(NodeId, usize)>,
    aux: Vec<TargetStatistic>,
}

impl EbstTree {
    /// Split candidates in ascending key order, reflecting the tree as it is
    /// when the walk reaches each node.
    pub fn candidates(&self) -> Candidates<'_> {
        let mut candidates = Candidates {
            tree: self,
            stack: Vec::new(),
            aux: Vec::new(),
        };
        candidates.push_left_spine(self.root, 0);
        candidates
    }
}

impl Candidates<'_> {
    fn push_left_spine(&mut self, mut current: Option<NodeId>, depth: usize) {
        while let Some(id) = current {
            self.stack.push((id, depth));
            current = self.tree.nodes[id].left;
        }
    }
}

impl Iterator for Candidates<'_> {
    type Item = SplitCandidate;

    fn next(&mut self) -> Option<SplitCandidate> {
        let (id, depth) = self.stack.pop()?;
        let tree = self.tree;
        let node = &tree.nodes[id];

        let le = match depth {
            0 => node.statistic.clone(),
            d => self.aux[d - 1].merged(&node.statistic),
        };
        let live = self.stack.last().map_or(0, |&(_, d)| d);
        self.aux.truncate(live);

        if node.right.is_some() {
            self.aux.push(le.clone());
            let depth = self.aux.len();
            self.push_left_spine(node.right, depth);
        }

        let gt = match tree.total.as_ref() {
            Some(total) => total.difference(&le),
            None => TargetStatistic::empty(le.mode()),
        };
        Some(SplitCandidate {
            key: node.key,
            le,
            gt,
        })
    }
}
