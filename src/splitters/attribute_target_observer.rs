use crate::core::error::EbstError;
use crate::core::estimators::Target;
use crate::splitters::conditional_tests::AttributeSplitSuggestion;
use crate::splitters::split_criteria::SplitCriterion;

/// Per-attribute observer of (attribute value, target) pairs for a regression leaf.
pub trait AttributeTargetObserver {
    fn observe_attribute_target(
        &mut self,
        att_val: f64,
        target: &Target,
        weight: f64,
    ) -> Result<(), EbstError>;

    fn revert_attribute_target(
        &mut self,
        att_val: f64,
        target: &Target,
        weight: f64,
    ) -> Result<(), EbstError>;

    fn get_best_evaluated_split_suggestion(
        &self,
        criterion: &dyn SplitCriterion,
        att_index: usize,
    ) -> Option<AttributeSplitSuggestion>;
}
