use crate::core::estimators::TargetStatistic;

/// Split-quality heuristic evaluated over target statistics.
pub trait SplitCriterion {
    fn get_merit_of_split(
        &self,
        pre_split_distribution: &TargetStatistic,
        post_split_dists: &[TargetStatistic],
    ) -> f64;
}
