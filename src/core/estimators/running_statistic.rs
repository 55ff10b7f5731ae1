use crate::core::error::EbstError;

/// Incrementally updatable sufficient statistic over weighted observations.
///
/// Implementations must be mergeable: two statistics built over disjoint data
/// combine via [`merge`](RunningStatistic::merge) into the statistic of the
/// union, and [`unmerge`](RunningStatistic::unmerge) removes a previously
/// merged part again.
pub trait RunningStatistic: Clone + Default {
    /// Incorporates one weighted observation.
    fn update(&mut self, x: f64, w: f64);

    /// Undoes an earlier [`update`](RunningStatistic::update) with the same arguments.
    fn revert(&mut self, x: f64, w: f64) -> Result<(), EbstError>;

    fn merge(&mut self, other: &Self);

    fn unmerge(&mut self, other: &Self);

    /// Sum of observation weights.
    fn weight(&self) -> f64;

    fn mean(&self) -> f64;

    fn variance(&self) -> f64;
}
