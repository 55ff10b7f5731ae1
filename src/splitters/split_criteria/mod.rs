mod split_criterion;

pub use split_criterion::SplitCriterion;
