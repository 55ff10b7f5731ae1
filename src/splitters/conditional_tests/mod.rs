mod attribute_split_suggestion;

pub use attribute_split_suggestion::AttributeSplitSuggestion;
pub use numeric_attribute_binary_test::NumericAttributeBinaryTest;
