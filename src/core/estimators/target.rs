use crate::core::error::EbstError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Shape of the targets a tree accepts, fixed by the first observation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TargetMode {
    Univariate,
    Multivariate,
}

/// A regression target: one value, or one value per named output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Target {
    Scalar(f64),
    Vector(BTreeMap<String, f64>),
}

impl Target {
    pub fn mode(&self) -> TargetMode {
        match self {
            Target::Scalar(_) => TargetMode::Univariate,
            Target::Vector(_) => TargetMode::Multivariate,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), EbstError> {
        match self {
            Target::Scalar(y) if !y.is_finite() => Err(EbstError::NonFiniteTarget(*y)),
            Target::Scalar(_) => Ok(()),
            Target::Vector(ys) if ys.is_empty() => Err(EbstError::EmptyTarget),
            Target::Vector(ys) => match ys.values().find(|y| !y.is_finite()) {
                Some(y) => Err(EbstError::NonFiniteTarget(*y)),
                None => Ok(()),
            },
        }
    }
}

impl From<f64> for Target {
    fn from(value: f64) -> Self {
        Target::Scalar(value)
    }
}

impl From<BTreeMap<String, f64>> for Target {
    fn from(values: BTreeMap<String, f64>) -> Self {
        Target::Vector(values)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Target {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Target::Vector(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
