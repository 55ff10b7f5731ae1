use crate::core::estimators::{RunningStatistic, TargetStatistic, Variance};
use crate::splitters::split_criteria::SplitCriterion;

/// Variance reduction, averaged over outputs for multivariate statistics.
pub struct VarianceReductionSplitCriterion {}

impl VarianceReductionSplitCriterion {
    pub fn new() -> Self {
        Self {}
    }

    fn reduction(pre: &Variance, post: &[Option<&Variance>]) -> f64 {
        let total = pre.weight();
        if total <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = post
            .iter()
            .flatten()
            .map(|v| v.weight() / total * v.variance())
            .sum();
        pre.variance() - weighted
    }
}

impl SplitCriterion for VarianceReductionSplitCriterion {
    fn get_merit_of_split(
        &self,
        pre_split_distribution: &TargetStatistic,
        post_split_dists: &[TargetStatistic],
    ) -> f64 {
        match pre_split_distribution {
            TargetStatistic::Scalar(pre) => {
                let post: Vec<_> = post_split_dists.iter().map(|d| d.as_scalar()).collect();
                Self::reduction(pre, &post)
            }
            TargetStatistic::Vector(pre) => {
                if pre.is_empty() {
                    return 0.0;
                }
                let sum: f64 = pre
                    .iter()
                    .map(|(k, var)| {
                        let post: Vec<_> =
                            post_split_dists.iter().map(|d| d.component(k)).collect();
                        Self::reduction(var, &post)
                    })
                    .sum();
                sum / pre.len() as f64
            }
        }
    }
}
