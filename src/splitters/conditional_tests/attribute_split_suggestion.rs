use crate::core::estimators::TargetStatistic;
use crate::splitters::conditional_tests::NumericAttributeBinaryTest;

pub struct AttributeSplitSuggestion {
    split_test: Option<NumericAttributeBinaryTest>,
    resulting_statistics: Vec<TargetStatistic>,
    merit: f64,
}

impl AttributeSplitSuggestion {
    pub fn new(
        split_test: Option<NumericAttributeBinaryTest>,
        resulting_statistics: Vec<TargetStatistic>,
        merit: f64,
    ) -> Self {
        Self {
            split_test,
            resulting_statistics,
            merit,
        }
    }

    pub fn get_split_test(&self) -> Option<&NumericAttributeBinaryTest> {
        self.split_test.as_ref()
    }

    pub fn get_merit(&self) -> f64 {
        self.merit
    }

    pub fn number_of_splits(&self) -> usize {
        self.resulting_statistics.len()
    }

    pub fn resulting_statistic_from_split(&self, split_index: usize) -> Option<&TargetStatistic> {
        self.resulting_statistics.get(split_index)
    }
}
