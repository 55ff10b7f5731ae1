use crate::core::error::EbstError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_max_candidates() -> usize {
    1_000
}
fn default_memory_check_period() -> usize {
    1_000
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EbstSplitterParams {
    #[serde(default = "default_max_candidates")]
    #[schemars(
        title = "Maximum split candidates",
        description = "Distinct attribute values kept after each memory management pass.",
        default = "default_max_candidates",
        range(min = 1)
    )]
    pub max_candidates: usize,

    #[serde(default = "default_memory_check_period")]
    #[schemars(
        title = "Memory check period",
        description = "Observations between memory management passes.",
        default = "default_memory_check_period",
        range(min = 1)
    )]
    pub memory_check_period: usize,
}

impl Default for EbstSplitterParams {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            memory_check_period: default_memory_check_period(),
        }
    }
}

impl EbstSplitterParams {
    pub fn validate(&self) -> Result<(), EbstError> {
        if self.max_candidates == 0 {
            return Err(EbstError::InvalidParameter(
                "max_candidates must be at least 1".into(),
            ));
        }
        if self.memory_check_period == 0 {
            return Err(EbstError::InvalidParameter(
                "memory_check_period must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, EbstError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }
}
