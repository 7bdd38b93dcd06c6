//! Optimizer traits.

use crate::error::Result;
use crate::metric::OptimizationDirection;
use super::regular_step::OptimizerState;

/// A scalar objective over a flat parameter vector.
pub trait CostFunction {
    fn num_parameters(&self) -> usize;

    /// Objective value at `parameters`.
    fn value(&self, parameters: &[f64]) -> Result<f64>;

    /// Objective value and derivative at `parameters`.
    fn value_and_derivative(&self, parameters: &[f64]) -> Result<(f64, Vec<f64>)>;

    /// Whether lower or higher values are better.
    fn direction(&self) -> OptimizationDirection;
}

/// Optimizer trait for parametric registration.
///
/// Every call starts from fresh state, so a single optimizer value can be
/// reused across pairs and threads.
pub trait Optimizer {
    /// Optimise `cost` starting from `initial`.
    ///
    /// # Returns
    /// The final state, holding the best parameters seen.
    fn optimize(&self, cost: &dyn CostFunction, initial: &[f64]) -> Result<OptimizerState>;
}
