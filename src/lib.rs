pub mod core;
pub mod splitters;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use crate::core::error::EbstError;
pub use crate::core::estimators::{Target, TargetMode, TargetStatistic, Variance};
pub use crate::splitters::{AttributeTargetObserver, EbstSplitter, EbstTree, SplitCandidate};
