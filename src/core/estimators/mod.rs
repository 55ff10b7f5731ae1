mod running_statistic;
mod target;
mod target_statistic;
mod variance;

pub use running_statistic::RunningStatistic;
pub use target::{Target, TargetMode};
pub use target_statistic::TargetStatistic;
pub use variance::Variance;
