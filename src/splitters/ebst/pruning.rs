use crate::core::error::EbstError;
use crate::splitters::ebst::candidates::SplitCandidate;
use crate::splitters::ebst::ebst_tree::EbstTree;
use crate::splitters::ebst::node::NodeId;
use tracing::debug;

/// Where a node hangs: `None` for the root, otherwise its parent and whether
/// it is the parent's left child.
type Slot = Option<(NodeId, bool)>;

impl EbstTree {
    /// Shrinks the tree to at most `budget` split candidates.
    ///
    /// Every candidate is scored and the `budget` best are kept; NaN scores
    /// rank last and ties favour the smaller key. The weight observed at a
    /// removed key moves to the nearest kept key above it, or to the largest
    /// kept key when none is above, so the total is never altered. Returns
    /// the number of candidates removed.
    pub fn prune<F>(&mut self, budget: usize, mut score: F) -> Result<usize, EbstError>
    where
        F: FnMut(&SplitCandidate) -> f64,
    {
        if budget == 0 {
            return Err(EbstError::InvalidBudget(budget));
        }
        let before = self.len();
        if before <= budget {
            return Ok(0);
        }

        let mut ranked: Vec<(f64, f64)> = self
            .candidates()
            .map(|candidate| {
                let s = score(&candidate);
                (candidate.key, if s.is_nan() { f64::NEG_INFINITY } else { s })
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let doomed: Vec<f64> = ranked[budget..].iter().map(|&(key, _)| key).collect();
        let removed = self.remove_keys(&doomed);
        debug!(budget, before, removed, "pruned split candidates");
        Ok(removed)
    }

    /// Removes every candidate for which `keep` returns `false`, under the
    /// same mass-preserving rule as [`prune`](Self::prune). The last node is
    /// never removed, so a predicate rejecting everything leaves the largest
    /// key in place.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&SplitCandidate) -> bool,
    {
        let doomed: Vec<f64> = self
            .candidates()
            .filter(|candidate| !keep(candidate))
            .map(|candidate| candidate.key)
            .collect();
        self.remove_keys(&doomed)
    }

    pub(crate) fn remove_keys(&mut self, keys: &[f64]) -> usize {
        keys.iter().filter(|&&key| self.remove(key)).count()
    }

    /// BST deletion that hands the removed key's own mass to its in-order
    /// successor (or predecessor, for the maximum) and patches the statistics
    /// whose key ranges change.
    fn remove(&mut self, key: f64) -> bool {
        if self.len() <= 1 {
            return false;
        }

        let mut slot: Slot = None;
        let mut turned_left = false;
        let mut right_turn_ancestor = None;
        let mut current = self.root;
        let target = loop {
            let Some(id) = current else {
                return false;
            };
            let node = &self.nodes[id];
            if key == node.key {
                break id;
            }
            if key < node.key {
                slot = Some((id, true));
                turned_left = true;
                current = node.left;
            } else {
                slot = Some((id, false));
                right_turn_ancestor = Some(id);
                current = node.right;
            }
        };

        let (left, right) = (self.nodes[target].left, self.nodes[target].right);
        match (left, right) {
            (None, Some(right)) => {
                // Nodes on the right child's left spine now start their range
                // below the removed key, which includes the moved mass.
                let own = self.nodes[target].statistic.clone();
                let mut spine = Some(right);
                while let Some(id) = spine {
                    self.nodes[id].statistic.merge(&own);
                    spine = self.nodes[id].left;
                }
                self.replace_child(slot, Some(right));
                self.release(target);
            }
            (Some(_), Some(right)) => {
                let mut spine = vec![right];
                while let Some(next) = spine.last().and_then(|&id| self.nodes[id].left) {
                    spine.push(next);
                }
                let Some(successor) = spine.pop() else {
                    return false;
                };
                let own = self.nodes[successor].statistic.clone();
                for &id in &spine {
                    self.nodes[id].statistic.unmerge(&own);
                }
                let successor_right = self.nodes[successor].right;
                match spine.last() {
                    Some(&parent) => self.nodes[parent].left = successor_right,
                    None => self.nodes[target].right = successor_right,
                }
                let successor_key = self.nodes[successor].key;
                let node = &mut self.nodes[target];
                node.key = successor_key;
                node.statistic.merge(&own);
                self.release(successor);
            }
            (left, None) => {
                if !turned_left {
                    // Maximum key: its own mass goes to the predecessor.
                    let mut own = self.nodes[target].statistic.clone();
                    let predecessor = match left {
                        Some(mut id) => loop {
                            own.unmerge(&self.nodes[id].statistic);
                            match self.nodes[id].right {
                                Some(next) => id = next,
                                None => break id,
                            }
                        },
                        None => match right_turn_ancestor {
                            Some(id) => id,
                            None => return false,
                        },
                    };
                    self.nodes[predecessor].statistic.merge(&own);
                }
                self.replace_child(slot, left);
                self.release(target);
            }
        }
        true
    }

    fn replace_child(&mut self, slot: Slot, child: Option<NodeId>) {
        match slot {
            None => self.root = child,
            Some((parent, true)) => self.nodes[parent].left = child,
            Some((parent, false)) => self.nodes[parent].right = child,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::estimators::{RunningStatistic, Target, TargetMode, TargetStatistic};
    use crate::testing::dummies::ObservationLog;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    const EPS: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn tree_from(pairs: &[(f64, f64, f64)]) -> (EbstTree, ObservationLog) {
        let mut tree = EbstTree::new();
        let mut log = ObservationLog::default();
        for &(k, y, w) in pairs {
            tree.insert(k, &Target::Scalar(y), w).unwrap();
            log.push(k, Target::Scalar(y), w);
        }
        (tree, log)
    }

    fn assert_matches_log(tree: &EbstTree, log: &ObservationLog) {
        let keys: Vec<f64> = tree.keys().collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        let total = tree.total().unwrap().as_scalar().unwrap();
        for candidate in tree.candidates() {
            let expected = log.scalar_le(candidate.key);
            let le = candidate.le.as_scalar().unwrap();
            let gt = candidate.gt.as_scalar().unwrap();
            assert!(approx_eq(le.weight(), expected.weight(), 1e-6));
            assert!(approx_eq(le.mean(), expected.mean(), 1e-6));
            assert!(approx_eq(le.variance(), expected.variance(), 1e-5));
            assert!(approx_eq(le.weight() + gt.weight(), total.weight(), 1e-6));
        }
    }

    #[test]
    fn pruning_an_empty_tree_is_a_no_op() {
        let mut tree = EbstTree::new();
        assert_eq!(tree.prune(3, |_| 0.0).unwrap(), 0);
        assert!(tree.is_empty());
    }

    #[test]
    fn zero_budget_is_rejected() {
        let (mut tree, _) = tree_from(&[(1.0, 1.0, 1.0)]);
        assert!(matches!(
            tree.prune(0, |_| 0.0),
            Err(EbstError::InvalidBudget(0))
        ));
    }

    #[test]
    fn budget_above_size_is_a_no_op() {
        let (mut tree, _) = tree_from(&[(1.0, 1.0, 1.0), (2.0, 1.0, 1.0)]);
        assert_eq!(tree.prune(2, |_| 0.0).unwrap(), 0);
        assert_eq!(tree.prune(10, |_| 0.0).unwrap(), 0);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn pruning_to_one_keeps_all_mass() {
        let keys = [5.0, 2.0, 8.0, 1.0, 9.0, 3.0, 7.0, 4.0, 6.0, 0.0];
        let pairs: Vec<_> = keys
            .iter()
            .enumerate()
            .map(|(i, &k)| (k, i as f64, 0.5 + i as f64))
            .collect();
        let expected_weight: f64 = pairs.iter().map(|p| p.2).sum();
        let (mut tree, _) = tree_from(&pairs);

        let removed = tree.prune(1, |c| -(c.key - 3.0).abs()).unwrap();
        assert_eq!(removed, 9);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec![3.0]);

        let node = tree.node_statistic(3.0).unwrap();
        assert!(approx_eq(node.weight(), expected_weight, 1e-9));
        assert!(approx_eq(tree.total().unwrap().weight(), expected_weight, 1e-9));
        let only = tree.candidates().next().unwrap();
        assert!(only.gt.is_empty());
    }

    #[test]
    fn keeps_best_scored_keys_with_ties_to_the_smaller_key() {
        let pairs: Vec<_> = [4.0, 1.0, 7.0, 0.0, 2.0, 6.0, 9.0, 3.0, 5.0, 8.0]
            .iter()
            .map(|&k| (k, k, 1.0))
            .collect();
        let (mut tree, _) = tree_from(&pairs);
        tree.prune(3, |c| -(c.key - 4.5).abs()).unwrap();
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn nan_scores_are_pruned_first() {
        let (mut tree, _) = tree_from(&[(1.0, 1.0, 1.0), (2.0, 1.0, 1.0), (3.0, 1.0, 1.0)]);
        tree.prune(2, |c| if c.key == 2.0 { f64::NAN } else { 0.0 })
            .unwrap();
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec![1.0, 3.0]);
    }

    #[test]
    fn kept_aggregates_survive_except_the_largest_which_absorbs_the_tail() {
        let mut rng = StdRng::seed_from_u64(11);
        let pairs: Vec<_> = (0..400)
            .map(|_| {
                (
                    rng.random_range(0..60) as f64,
                    rng.random_range(-3.0..3.0),
                    rng.random_range(0.5..2.0),
                )
            })
            .collect();
        let (mut tree, _) = tree_from(&pairs);
        let before: Vec<_> = tree.candidates().collect();

        tree.prune(7, |c| (c.key * 7.3).sin()).unwrap();
        let after: Vec<_> = tree.candidates().collect();
        assert_eq!(after.len(), 7);

        let total = tree.total().unwrap().weight();
        for (i, candidate) in after.iter().enumerate() {
            if i + 1 == after.len() {
                assert!(approx_eq(candidate.le.weight(), total, 1e-6));
                continue;
            }
            let previous = before.iter().find(|c| c.key == candidate.key).unwrap();
            assert!(approx_eq(
                candidate.le.weight(),
                previous.le.weight(),
                1e-6
            ));
            assert!(approx_eq(
                candidate.le.as_scalar().unwrap().mean(),
                previous.le.as_scalar().unwrap().mean(),
                1e-6
            ));
        }
    }

    #[test]
    fn random_prunes_then_inserts_match_reassigned_log() {
        let mut rng = StdRng::seed_from_u64(2024);
        for round in 0..20 {
            let mut tree = EbstTree::new();
            let mut log = ObservationLog::default();
            for _ in 0..300 {
                let key = rng.random_range(0..80) as f64;
                let y = rng.random_range(-10.0..10.0);
                let w = rng.random_range(0.1..2.0);
                tree.insert(key, &Target::Scalar(y), w).unwrap();
                log.push(key, Target::Scalar(y), w);
            }

            let budget = 1 + round % 9;
            let salt = rng.random::<f64>();
            tree.prune(budget, |c| ((c.key + salt) * 12.9898).sin()).unwrap();
            assert_eq!(tree.len(), budget);

            let kept: Vec<f64> = tree.keys().collect();
            log.reassign(&kept);
            assert_matches_log(&tree, &log);

            for _ in 0..100 {
                let key = rng.random_range(0..80) as f64;
                let y = rng.random_range(-10.0..10.0);
                tree.insert(key, &Target::Scalar(y), 1.0).unwrap();
                log.push(key, Target::Scalar(y), 1.0);
            }
            assert_matches_log(&tree, &log);
        }
    }

    #[test]
    fn freed_slots_are_reused() {
        let pairs: Vec<_> = (0..10).map(|k| (k as f64, 1.0, 1.0)).collect();
        let (mut tree, _) = tree_from(&pairs);
        tree.prune(4, |c| c.key).unwrap();
        let arena = tree.nodes.len();
        tree.insert(100.0, &Target::Scalar(1.0), 1.0).unwrap();
        tree.insert(-1.0, &Target::Scalar(1.0), 1.0).unwrap();
        assert_eq!(tree.nodes.len(), arena);
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn retain_rejecting_everything_keeps_the_largest_key() {
        let (mut tree, _) = tree_from(&[(5.0, 1.0, 1.0), (3.0, 2.0, 1.0), (8.0, 4.0, 1.0)]);
        assert_eq!(tree.retain(|_| false), 2);
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec![8.0]);
        assert!(approx_eq(tree.node_statistic(8.0).unwrap().weight(), 3.0, EPS));
    }

    #[test]
    fn multivariate_mass_is_conserved() {
        let mut tree = EbstTree::new();
        for i in 0..10 {
            let target: Target = [("a", i as f64), ("b", -(i as f64))].into_iter().collect();
            tree.insert(i as f64, &target, 1.0).unwrap();
        }
        tree.prune(1, |c| c.key).unwrap();
        let node = tree.node_statistic(9.0).unwrap();
        assert!(approx_eq(node.component("a").unwrap().weight(), 10.0, 1e-9));
        assert!(approx_eq(node.component("b").unwrap().mean(), -4.5, 1e-9));
    }

    fn assert_same_outputs(actual: &TargetStatistic, expected: &TargetStatistic, key: f64) {
        let (actual, expected) = (actual.as_vector().unwrap(), expected.as_vector().unwrap());
        assert_eq!(
            actual.keys().collect::<Vec<_>>(),
            expected.keys().collect::<Vec<_>>(),
            "outputs at key {key}"
        );
        for (output, var) in actual {
            let truth = &expected[output];
            assert!(approx_eq(var.weight(), truth.weight(), 1e-6), "{output} at {key}");
            assert!(approx_eq(var.mean(), truth.mean(), 1e-6), "{output} at {key}");
        }
    }

    #[test]
    fn multivariate_prunes_match_reassigned_log() {
        let mut rng = StdRng::seed_from_u64(77);
        for round in 0..10 {
            let mut tree = EbstTree::new();
            let mut log = ObservationLog::default();
            for _ in 0..300 {
                let key = rng.random_range(0..80) as f64;
                let mut pairs = vec![("a", rng.random_range(-10.0..10.0))];
                if key >= 40.0 {
                    pairs.push(("b", rng.random_range(0.0..5.0)));
                }
                let target: Target = pairs.into_iter().collect();
                let w = rng.random_range(0.1..20.0);
                tree.insert(key, &target, w).unwrap();
                log.push(key, target, w);
            }

            let budget = 2 + round % 6;
            let salt = rng.random::<f64>();
            tree.prune(budget, |c| ((c.key + salt) * 78.233).sin()).unwrap();
            assert_eq!(tree.len(), budget);

            let kept: Vec<f64> = tree.keys().collect();
            log.reassign(&kept);
            for candidate in tree.candidates() {
                let key = candidate.key;
                let le = log.le(key, TargetMode::Multivariate);
                let gt = log.gt(key, TargetMode::Multivariate);
                assert_same_outputs(&candidate.le, &le, key);
                assert_same_outputs(&candidate.gt, &gt, key);
            }
        }
    }
}
