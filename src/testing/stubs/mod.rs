mod variance_reduction;

pub use variance_reduction::VarianceReductionSplitCriterion;
