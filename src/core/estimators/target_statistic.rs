use crate::core::error::EbstError;
use crate::core::estimators::running_statistic::RunningStatistic;
use crate::core::estimators::target::{Target, TargetMode};
use crate::core::estimators::variance::{Variance, weight_tolerance};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Target statistic held by every tree node and by the tree's running total.
///
/// The variant is chosen once from the tree's [`TargetMode`]; `Vector`
/// components are created lazily the first time their output key is observed
/// and dropped again when their weight returns to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetStatistic {
    Scalar(Variance),
    Vector(BTreeMap<String, Variance>),
}

impl TargetStatistic {
    pub fn empty(mode: TargetMode) -> Self {
        match mode {
            TargetMode::Univariate => TargetStatistic::Scalar(Variance::new()),
            TargetMode::Multivariate => TargetStatistic::Vector(BTreeMap::new()),
        }
    }

    pub(crate) fn from_target(target: &Target, w: f64) -> Self {
        let mut stat = Self::empty(target.mode());
        stat.apply(target, w);
        stat
    }

    pub fn mode(&self) -> TargetMode {
        match self {
            TargetStatistic::Scalar(_) => TargetMode::Univariate,
            TargetStatistic::Vector(_) => TargetMode::Multivariate,
        }
    }

    pub(crate) fn check_mode(&self, target: &Target) -> Result<(), EbstError> {
        if self.mode() != target.mode() {
            return Err(EbstError::ModeMismatch {
                expected: self.mode(),
                found: target.mode(),
            });
        }
        Ok(())
    }

    pub fn update(&mut self, target: &Target, w: f64) -> Result<(), EbstError> {
        self.check_mode(target)?;
        self.apply(target, w);
        Ok(())
    }

    fn apply(&mut self, target: &Target, w: f64) {
        match (self, target) {
            (TargetStatistic::Scalar(var), Target::Scalar(y)) => var.update(*y, w),
            (TargetStatistic::Vector(vars), Target::Vector(ys)) => {
                for (k, y) in ys {
                    match vars.get_mut(k) {
                        Some(var) => var.update(*y, w),
                        None => {
                            let mut var = Variance::new();
                            var.update(*y, w);
                            vars.insert(k.clone(), var);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Checks that reverting `(target, w)` keeps every touched weight non-negative.
    pub(crate) fn check_revert(&self, target: &Target, w: f64) -> Result<(), EbstError> {
        self.check_mode(target)?;
        let underflow = |available: f64| {
            if w > available + weight_tolerance(available) {
                Err(EbstError::RevertUnderflow {
                    available,
                    requested: w,
                })
            } else {
                Ok(())
            }
        };
        match (self, target) {
            (TargetStatistic::Scalar(var), Target::Scalar(_)) => underflow(var.weight()),
            (TargetStatistic::Vector(vars), Target::Vector(ys)) => ys
                .keys()
                .try_for_each(|k| underflow(vars.get(k).map_or(0.0, |v| v.weight()))),
            _ => Ok(()),
        }
    }

    pub fn revert(&mut self, target: &Target, w: f64) -> Result<(), EbstError> {
        self.check_revert(target, w)?;
        match (self, target) {
            (TargetStatistic::Scalar(var), Target::Scalar(y)) => var.revert(*y, w),
            (TargetStatistic::Vector(vars), Target::Vector(ys)) => {
                for (k, y) in ys {
                    if let Some(var) = vars.get_mut(k) {
                        var.revert(*y, w)?;
                        if var.is_empty() {
                            vars.remove(k);
                        }
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn merge(&mut self, other: &TargetStatistic) {
        debug_assert_eq!(self.mode(), other.mode());
        match (self, other) {
            (TargetStatistic::Scalar(a), TargetStatistic::Scalar(b)) => a.merge(b),
            (TargetStatistic::Vector(a), TargetStatistic::Vector(b)) => {
                for (k, var) in b {
                    a.entry(k.clone()).or_default().merge(var);
                }
            }
            _ => {}
        }
    }

    pub fn unmerge(&mut self, other: &TargetStatistic) {
        debug_assert_eq!(self.mode(), other.mode());
        match (self, other) {
            (TargetStatistic::Scalar(a), TargetStatistic::Scalar(b)) => a.unmerge(b),
            (TargetStatistic::Vector(a), TargetStatistic::Vector(b)) => {
                for (k, var) in b {
                    if let Some(mine) = a.get_mut(k) {
                        mine.unmerge(var);
                        if mine.is_empty() {
                            a.remove(k);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    pub fn merged(&self, other: &TargetStatistic) -> TargetStatistic {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// `self` with the mass of `other` removed.
    pub fn difference(&self, other: &TargetStatistic) -> TargetStatistic {
        let mut out = self.clone();
        out.unmerge(other);
        out
    }

    /// Observation weight. For vectors this is the heaviest component, which
    /// equals the observed weight whenever some output is present in every target.
    pub fn weight(&self) -> f64 {
        match self {
            TargetStatistic::Scalar(var) => var.weight(),
            TargetStatistic::Vector(vars) => vars.values().map(|v| v.weight()).fold(0.0, f64::max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.weight() <= 0.0
    }

    pub fn as_scalar(&self) -> Option<&Variance> {
        match self {
            TargetStatistic::Scalar(var) => Some(var),
            TargetStatistic::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&BTreeMap<String, Variance>> {
        match self {
            TargetStatistic::Scalar(_) => None,
            TargetStatistic::Vector(vars) => Some(vars),
        }
    }

    /// Component for one output of a multivariate statistic.
    pub fn component(&self, key: &str) -> Option<&Variance> {
        self.as_vector().and_then(|vars| vars.get(key))
    }
}
