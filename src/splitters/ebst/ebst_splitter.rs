use crate::core::error::EbstError;
use crate::core::estimators::{Target, TargetStatistic};
use crate::splitters::attribute_target_observer::AttributeTargetObserver;
use crate::splitters::conditional_tests::{AttributeSplitSuggestion, NumericAttributeBinaryTest};
use crate::splitters::ebst::candidates::SplitCandidate;
use crate::splitters::ebst::ebst_tree::EbstTree;
use crate::splitters::ebst::params::EbstSplitterParams;
use crate::splitters::split_criteria::SplitCriterion;
use tracing::debug;

/// E-BST attribute observer for one numeric attribute of a regression leaf.
///
/// Wraps an [`EbstTree`] with split evaluation and the two memory management
/// routines: budget pruning every `memory_check_period` observations and the
/// removal of candidates whose merit falls behind the last split attempt.
pub struct EbstSplitter {
    tree: EbstTree,
    params: EbstSplitterParams,
    observations_since_check: usize,
}

impl EbstSplitter {
    pub fn new() -> Self {
        Self {
            tree: EbstTree::new(),
            params: EbstSplitterParams::default(),
            observations_since_check: 0,
        }
    }

    pub fn from_params(params: EbstSplitterParams) -> Result<Self, EbstError> {
        params.validate()?;
        Ok(Self {
            tree: EbstTree::new(),
            params,
            observations_since_check: 0,
        })
    }

    pub fn tree(&self) -> &EbstTree {
        &self.tree
    }

    pub fn params(&self) -> &EbstSplitterParams {
        &self.params
    }

    fn merit(
        criterion: &dyn SplitCriterion,
        total: &TargetStatistic,
        candidate: &SplitCandidate,
    ) -> f64 {
        criterion.get_merit_of_split(total, &[candidate.le.clone(), candidate.gt.clone()])
    }

    pub fn memory_check_due(&self) -> bool {
        self.observations_since_check >= self.params.memory_check_period
    }

    /// Prunes to `max_candidates`, ranking candidates by merit, once a full
    /// memory check period has elapsed. Returns the number of removed candidates.
    pub fn manage_memory(&mut self, criterion: &dyn SplitCriterion) -> Result<usize, EbstError> {
        if !self.memory_check_due() {
            return Ok(0);
        }
        self.observations_since_check = 0;
        let Some(total) = self.tree.total().cloned() else {
            return Ok(0);
        };
        self.tree.prune(self.params.max_candidates, |candidate| {
            Self::merit(criterion, &total, candidate)
        })
    }

    /// Drops every candidate whose merit, relative to the best merit of the
    /// last split attempt (`last_check_vr`), is below
    /// `last_check_ratio - 2 * last_check_e`. The best current candidate is
    /// always kept.
    pub fn remove_bad_splits(
        &mut self,
        criterion: &dyn SplitCriterion,
        last_check_ratio: f64,
        last_check_vr: f64,
        last_check_e: f64,
    ) -> usize {
        if last_check_vr <= 0.0 {
            return 0;
        }
        let Some(total) = self.tree.total().cloned() else {
            return 0;
        };

        let merits: Vec<(f64, f64)> = self
            .tree
            .candidates()
            .map(|candidate| (candidate.key, Self::merit(criterion, &total, &candidate)))
            .collect();
        let Some(best) = merits
            .iter()
            .copied()
            .reduce(|best, m| if m.1 > best.1 { m } else { best })
        else {
            return 0;
        };

        let threshold = last_check_ratio - 2.0 * last_check_e;
        let doomed: Vec<f64> = merits
            .iter()
            .filter(|&&(key, merit)| {
                key != best.0 && (merit.is_nan() || merit / last_check_vr < threshold)
            })
            .map(|&(key, _)| key)
            .collect();
        let removed = self.tree.remove_keys(&doomed);
        debug!(threshold, removed, kept = self.tree.len(), "removed bad split candidates");
        removed
    }
}

impl Default for EbstSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeTargetObserver for EbstSplitter {
    /// NaN attribute values are missing values and are skipped.
    fn observe_attribute_target(
        &mut self,
        att_val: f64,
        target: &Target,
        weight: f64,
    ) -> Result<(), EbstError> {
        if att_val.is_nan() {
            return Ok(());
        }
        self.tree.insert(att_val, target, weight)?;
        if weight > 0.0 {
            self.observations_since_check += 1;
        }
        Ok(())
    }

    fn revert_attribute_target(
        &mut self,
        att_val: f64,
        target: &Target,
        weight: f64,
    ) -> Result<(), EbstError> {
        if att_val.is_nan() {
            return Ok(());
        }
        self.tree.revert(att_val, target, weight)
    }

    fn get_best_evaluated_split_suggestion(
        &self,
        criterion: &dyn SplitCriterion,
        att_index: usize,
    ) -> Option<AttributeSplitSuggestion> {
        let total = self.tree.total()?;
        let mut best: Option<(f64, SplitCandidate)> = None;
        for candidate in self.tree.candidates() {
            let merit = Self::merit(criterion, total, &candidate);
            if best.as_ref().is_none_or(|(m, _)| merit > *m) {
                best = Some((merit, candidate));
            }
        }
        let (merit, candidate) = best?;
        Some(AttributeSplitSuggestion::new(
            Some(NumericAttributeBinaryTest::new(att_index, candidate.key, true)),
            vec![candidate.le, candidate.gt],
            merit,
        ))
    }
}
