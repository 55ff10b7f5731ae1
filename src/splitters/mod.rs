mod attribute_target_observer;
pub mod conditional_tests;
pub mod ebst;
pub mod split_criteria;

pub use attribute_target_observer::AttributeTargetObserver;
pub use ebst::{EbstSplitter, EbstSplitterParams, EbstTree, SplitCandidate};
