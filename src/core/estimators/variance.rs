use crate::core::error::EbstError;
use crate::core::estimators::running_statistic::RunningStatistic;
use serde::{Deserialize, Serialize};

/// Relative tolerance on accumulated weight.
const WEIGHT_EPSILON: f64 = 1e-9;

const DDOF: f64 = 1.0;

/// Largest weight difference against `weight` that counts as rounding
/// residue rather than mass.
pub(crate) fn weight_tolerance(weight: f64) -> f64 {
    WEIGHT_EPSILON * weight.abs().max(1.0)
}

/// Weighted running variance (Welford), unbiased with `ddof = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Variance {
    weight: f64,
    mean: f64,
    sum_sq_dev: f64,
}

impl Variance {
    pub fn new() -> Self {
        Self {
            weight: 0.0,
            mean: 0.0,
            sum_sq_dev: 0.0,
        }
    }

    /// Residue left by `revert` or `unmerge` is zeroed, so only a true
    /// empty accumulator reports empty.
    pub fn is_empty(&self) -> bool {
        self.weight <= 0.0
    }

    fn reset(&mut self) {
        self.weight = 0.0;
        self.mean = 0.0;
        self.sum_sq_dev = 0.0;
    }
}

impl Default for Variance {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStatistic for Variance {
    #[inline]
    fn update(&mut self, x: f64, w: f64) {
        if w <= 0.0 {
            return;
        }
        let old_mean = self.mean;
        self.weight += w;
        self.mean += (w / self.weight) * (x - old_mean);
        self.sum_sq_dev += w * (x - old_mean) * (x - self.mean);
    }

    fn revert(&mut self, x: f64, w: f64) -> Result<(), EbstError> {
        if w <= 0.0 {
            return Ok(());
        }
        if w > self.weight + weight_tolerance(self.weight) {
            return Err(EbstError::RevertUnderflow {
                available: self.weight,
                requested: w,
            });
        }
        let remaining = self.weight - w;
        if remaining <= weight_tolerance(self.weight) {
            self.reset();
            return Ok(());
        }
        let old_mean = self.mean;
        self.weight = remaining;
        self.mean -= (w / self.weight) * (x - old_mean);
        self.sum_sq_dev -= w * (x - old_mean) * (x - self.mean);
        self.sum_sq_dev = self.sum_sq_dev.max(0.0);
        Ok(())
    }

    fn merge(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            self.weight = other.weight;
            self.mean = other.mean;
            self.sum_sq_dev = other.sum_sq_dev;
            return;
        }
        let weight = self.weight + other.weight;
        let delta = other.mean - self.mean;
        self.sum_sq_dev += other.sum_sq_dev + delta * delta * self.weight * other.weight / weight;
        self.mean += delta * other.weight / weight;
        self.weight = weight;
    }

    fn unmerge(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        let weight = self.weight - other.weight;
        if weight <= weight_tolerance(self.weight) {
            self.reset();
            return;
        }
        let mean = (self.weight * self.mean - other.weight * other.mean) / weight;
        let delta = other.mean - mean;
        self.sum_sq_dev -= other.sum_sq_dev + delta * delta * weight * other.weight / self.weight;
        self.sum_sq_dev = self.sum_sq_dev.max(0.0);
        self.mean = mean;
        self.weight = weight;
    }

    #[inline]
    fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    fn mean(&self) -> f64 {
        self.mean
    }

    fn variance(&self) -> f64 {
        let denom = self.weight - DDOF;
        if denom > 0.0 {
            self.sum_sq_dev / denom
        } else {
            0.0
        }
    }
}
