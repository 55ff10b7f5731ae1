use crate::core::estimators::{RunningStatistic, Target, TargetMode, TargetStatistic, Variance};

/// Raw record of every inserted observation, used as brute-force ground truth.
#[derive(Debug, Clone, Default)]
pub struct ObservationLog {
    entries: Vec<(f64, Target, f64)>,
}

impl ObservationLog {
    pub fn push(&mut self, key: f64, target: Target, weight: f64) {
        self.entries.push((key, target, weight));
    }

    /// Statistic over every logged observation with a key `<= key`.
    pub fn le(&self, key: f64, mode: TargetMode) -> TargetStatistic {
        self.collect(mode, |k| k <= key)
    }

    /// Statistic over every logged observation with a key `> key`.
    pub fn gt(&self, key: f64, mode: TargetMode) -> TargetStatistic {
        self.collect(mode, |k| k > key)
    }

    fn collect(&self, mode: TargetMode, mut include: impl FnMut(f64) -> bool) -> TargetStatistic {
        let mut stat = TargetStatistic::empty(mode);
        for (k, target, w) in &self.entries {
            if include(*k) && *w > 0.0 {
                stat.update(target, *w)
                    .expect("logged target should match the requested mode");
            }
        }
        stat
    }

    pub fn scalar_le(&self, key: f64) -> Variance {
        let mut var = Variance::new();
        for (k, target, w) in &self.entries {
            if let Target::Scalar(y) = target {
                if *k <= key {
                    var.update(*y, *w);
                }
            }
        }
        var
    }

    /// Moves every observation to the key pruning would hand it to: itself
    /// when kept, the nearest kept key above, or the largest kept key.
    pub fn reassign(&mut self, kept: &[f64]) {
        let Some(&largest) = kept.last() else {
            return;
        };
        for (k, _, _) in &mut self.entries {
            *k = kept.iter().copied().find(|&r| r >= *k).unwrap_or(largest);
        }
    }
}
