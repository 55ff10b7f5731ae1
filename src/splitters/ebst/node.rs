use crate::core::estimators::{Target, TargetStatistic};
use serde::{Deserialize, Serialize};

/// Index of a node inside the tree's arena.
pub(crate) type NodeId = usize;

/// One E-BST node.
///
/// `statistic` holds the mass observed at `key` plus the mass of the whole
/// left subtree: every observation with a smaller key descends through this
/// node and is accumulated here on its way left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct EbstNode {
    pub(crate) key: f64,
    pub(crate) statistic: TargetStatistic,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl EbstNode {
    pub(crate) fn new(key: f64, target: &Target, w: f64) -> Self {
        Self {
            key,
            statistic: TargetStatistic::from_target(target, w),
            left: None,
            right: None,
        }
    }
}
