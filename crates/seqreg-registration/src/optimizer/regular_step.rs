//! Regular-step gradient descent.
//!
//! Moves a fixed step length along the scaled gradient and shrinks the
//! step whenever the candidate position fails to improve the objective.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::trait_::{CostFunction, Optimizer};
use crate::error::{RegistrationError, Result};
use crate::validation::{
    validate_iterations, validate_relaxation, validate_scales, validate_step_lengths,
};

/// Configuration for [`RegularStepGradientDescent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOptimizerConfig {
    /// Initial step length.
    pub max_step_length: f64,
    /// The run converges once the step drops below this.
    pub min_step_length: f64,
    pub max_iterations: usize,
    /// Step multiplier applied after a non-improving move.
    pub relaxation_factor: f64,
    /// The run converges once the scaled gradient magnitude drops to this.
    pub gradient_tolerance: f64,
    /// Per-parameter gradient divisors; `None` means all ones.
    pub scales: Option<Vec<f64>>,
}

impl Default for StepOptimizerConfig {
    fn default() -> Self {
        Self {
            max_step_length: 4.0,
            min_step_length: 0.01,
            max_iterations: 200,
            relaxation_factor: 0.5,
            gradient_tolerance: 1e-6,
            scales: None,
        }
    }
}

impl StepOptimizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step_lengths(mut self, max_step_length: f64, min_step_length: f64) -> Self {
        self.max_step_length = max_step_length;
        self.min_step_length = min_step_length;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_relaxation_factor(mut self, factor: f64) -> Self {
        self.relaxation_factor = factor;
        self
    }

    pub fn with_gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_tolerance = tolerance;
        self
    }

    pub fn with_scales(mut self, scales: Vec<f64>) -> Self {
        self.scales = Some(scales);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_step_lengths(self.max_step_length, self.min_step_length)?;
        validate_iterations(self.max_iterations)?;
        validate_relaxation(self.relaxation_factor)?;
        if !(self.gradient_tolerance >= 0.0) {
            return Err(RegistrationError::invalid_configuration(format!(
                "Gradient tolerance must be non-negative, got {}",
                self.gradient_tolerance
            )));
        }
        if let Some(scales) = &self.scales {
            validate_scales(scales, scales.len())?;
        }
        Ok(())
    }
}

/// Why a run converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopCondition {
    /// The scaled gradient magnitude fell to the tolerance.
    GradientTolerance,
    /// The step length fell below the minimum.
    StepTooSmall,
}

/// Lifecycle of a single optimisation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizerStatus {
    Initialized,
    Iterating,
    Converged(StopCondition),
    MaxIterationsReached,
    /// The run returned an error; pipelines record this for units they skip.
    Failed,
}

impl OptimizerStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OptimizerStatus::Converged(_)
                | OptimizerStatus::MaxIterationsReached
                | OptimizerStatus::Failed
        )
    }
}

/// One candidate move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    /// Step length used for the move.
    pub step_length: f64,
    /// Best value after the move.
    pub value: f64,
    pub improved: bool,
}

/// State of one optimisation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerState {
    /// Best parameters seen.
    pub parameters: Vec<f64>,
    /// Objective value at `parameters`.
    pub value: f64,
    /// Current step length.
    pub step_length: f64,
    pub max_step_length: f64,
    pub min_step_length: f64,
    /// Candidate moves made.
    pub iteration: usize,
    pub status: OptimizerStatus,
    pub history: Vec<IterationRecord>,
}

/// Regular-step gradient descent (or ascent, for maximised objectives).
///
/// Each iteration proposes
///
/// `p_new = p + sign * (step / |g / s|) * (g / s)`
///
/// from the best position `p`, where `g` is the derivative there and `s`
/// the parameter scales. An improving candidate becomes the new best;
/// otherwise the step is multiplied by the relaxation factor and the
/// next candidate starts again from the best position.
///
/// A rejected move is not reversed. The classic regular-step rule flips
/// direction when the gradient sign changes between steps; here the
/// gradient at the best position is kept, so the shorter candidate
/// backtracks along it, and the objective never gets worse.
#[derive(Debug, Clone, Default)]
pub struct RegularStepGradientDescent {
    config: StepOptimizerConfig,
}

impl RegularStepGradientDescent {
    pub fn new(config: StepOptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StepOptimizerConfig {
        &self.config
    }

    fn scaled_gradient(gradient: &[f64], scales: &[f64]) -> (Vec<f64>, f64) {
        let scaled: Vec<f64> = gradient.iter().zip(scales).map(|(g, s)| g / s).collect();
        let magnitude = scaled.iter().map(|g| g * g).sum::<f64>().sqrt();
        (scaled, magnitude)
    }
}

impl Optimizer for RegularStepGradientDescent {
    fn optimize(&self, cost: &dyn CostFunction, initial: &[f64]) -> Result<OptimizerState> {
        self.config.validate()?;
        let n = cost.num_parameters();
        if initial.len() != n {
            return Err(RegistrationError::ShapeMismatch {
                expected: vec![n],
                actual: vec![initial.len()],
            });
        }
        let scales = self.config.scales.clone().unwrap_or_else(|| vec![1.0; n]);
        validate_scales(&scales, n)?;
        let sign = cost.direction().sign();

        let mut state = OptimizerState {
            parameters: initial.to_vec(),
            value: f64::NAN,
            step_length: self.config.max_step_length,
            max_step_length: self.config.max_step_length,
            min_step_length: self.config.min_step_length,
            iteration: 0,
            status: OptimizerStatus::Initialized,
            history: Vec::new(),
        };

        let (value, mut gradient) = cost.value_and_derivative(initial).map_err(|e| {
            debug!(error = %e, "optimizer failed at the initial position");
            e
        })?;
        if !value.is_finite() {
            return Err(RegistrationError::numerical_instability(format!(
                "initial metric value is {}",
                value
            )));
        }
        state.value = value;
        state.status = OptimizerStatus::Iterating;

        while state.status == OptimizerStatus::Iterating {
            if state.iteration >= self.config.max_iterations {
                state.status = OptimizerStatus::MaxIterationsReached;
                break;
            }
            let (scaled, magnitude) = Self::scaled_gradient(&gradient, &scales);
            if !magnitude.is_finite() {
                return Err(RegistrationError::numerical_instability(format!(
                    "gradient magnitude is {} at iteration {}",
                    magnitude, state.iteration
                )));
            }
            if magnitude <= self.config.gradient_tolerance {
                state.status = OptimizerStatus::Converged(StopCondition::GradientTolerance);
                break;
            }
            if state.step_length < self.config.min_step_length {
                state.status = OptimizerStatus::Converged(StopCondition::StepTooSmall);
                break;
            }

            let factor = sign * state.step_length / magnitude;
            let candidate: Vec<f64> = state
                .parameters
                .iter()
                .zip(&scaled)
                .map(|(p, g)| p + factor * g)
                .collect();

            let improved = match cost.value(&candidate) {
                Ok(v) if cost.direction().is_better(v, state.value) => {
                    match cost.value_and_derivative(&candidate) {
                        Ok((v, g)) => {
                            state.parameters = candidate;
                            state.value = v;
                            gradient = g;
                            true
                        }
                        Err(e) => {
                            trace!(error = %e, "derivative unavailable at candidate");
                            false
                        }
                    }
                }
                Ok(_) => false,
                Err(e) => {
                    trace!(error = %e, "candidate could not be evaluated");
                    false
                }
            };

            state.history.push(IterationRecord {
                iteration: state.iteration,
                step_length: state.step_length,
                value: state.value,
                improved,
            });
            trace!(
                iteration = state.iteration,
                value = state.value,
                step = state.step_length,
                improved,
                "step"
            );
            if !improved {
                state.step_length *= self.config.relaxation_factor;
            }
            state.iteration += 1;
        }

        debug!(
            iterations = state.iteration,
            value = state.value,
            step = state.step_length,
            status = ?state.status,
            "optimizer finished"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::OptimizationDirection;

    /// Quadratic bowl `sum(w_i * (p_i - c_i)^2)`.
    struct Bowl {
        center: Vec<f64>,
        weights: Vec<f64>,
        direction: OptimizationDirection,
    }

    impl Bowl {
        fn new(center: Vec<f64>) -> Self {
            let weights = vec![1.0; center.len()];
            Self {
                center,
                weights,
                direction: OptimizationDirection::Minimize,
            }
        }

        fn raw(&self, p: &[f64]) -> f64 {
            p.iter()
                .zip(&self.center)
                .zip(&self.weights)
                .map(|((p, c), w)| w * (p - c) * (p - c))
                .sum()
        }
    }

    impl CostFunction for Bowl {
        fn num_parameters(&self) -> usize {
            self.center.len()
        }

        fn value(&self, p: &[f64]) -> Result<f64> {
            let v = self.raw(p);
            Ok(match self.direction {
                OptimizationDirection::Minimize => v,
                OptimizationDirection::Maximize => -v,
            })
        }

        fn value_and_derivative(&self, p: &[f64]) -> Result<(f64, Vec<f64>)> {
            let sign = match self.direction {
                OptimizationDirection::Minimize => 1.0,
                OptimizationDirection::Maximize => -1.0,
            };
            let g = p
                .iter()
                .zip(&self.center)
                .zip(&self.weights)
                .map(|((p, c), w)| sign * 2.0 * w * (p - c))
                .collect();
            Ok((self.value(p)?, g))
        }

        fn direction(&self) -> OptimizationDirection {
            self.direction
        }
    }

    #[test]
    fn test_converges_on_bowl() {
        let cost = Bowl::new(vec![3.0, -2.0]);
        let optimizer = RegularStepGradientDescent::new(
            StepOptimizerConfig::default()
                .with_step_lengths(1.0, 1e-4)
                .with_max_iterations(500),
        );
        let state = optimizer.optimize(&cost, &[0.0, 0.0]).unwrap();
        assert!(matches!(state.status, OptimizerStatus::Converged(_)));
        assert!((state.parameters[0] - 3.0).abs() < 1e-2, "{:?}", state.parameters);
        assert!((state.parameters[1] + 2.0).abs() < 1e-2, "{:?}", state.parameters);
    }

    #[test]
    fn test_maximization() {
        let mut cost = Bowl::new(vec![-1.0]);
        cost.direction = OptimizationDirection::Maximize;
        let optimizer = RegularStepGradientDescent::new(
            StepOptimizerConfig::default().with_step_lengths(0.5, 1e-4),
        );
        let state = optimizer.optimize(&cost, &[2.0]).unwrap();
        assert!((state.parameters[0] + 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_step_shrinks_after_every_worse_move() {
        let cost = Bowl::new(vec![0.3, 0.0]);
        let optimizer = RegularStepGradientDescent::new(
            StepOptimizerConfig::default()
                .with_step_lengths(2.0, 1e-3)
                .with_relaxation_factor(0.5),
        );
        let state = optimizer.optimize(&cost, &[5.0, 1.0]).unwrap();
        assert!(state.history.iter().any(|r| !r.improved));
        for pair in state.history.windows(2) {
            if !pair[0].improved {
                assert!(pair[1].step_length < pair[0].step_length);
            } else {
                assert_eq!(pair[1].step_length, pair[0].step_length);
            }
        }
        // Best value never gets worse.
        for pair in state.history.windows(2) {
            assert!(pair[1].value <= pair[0].value);
        }
    }

    #[test]
    fn test_max_iterations() {
        let cost = Bowl::new(vec![1000.0]);
        let optimizer = RegularStepGradientDescent::new(
            StepOptimizerConfig::default()
                .with_step_lengths(1.0, 1e-3)
                .with_max_iterations(5),
        );
        let state = optimizer.optimize(&cost, &[0.0]).unwrap();
        assert_eq!(state.status, OptimizerStatus::MaxIterationsReached);
        assert_eq!(state.iteration, 5);
        assert!((state.parameters[0] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_gradient_converges_immediately() {
        let cost = Bowl::new(vec![1.0, 1.0]);
        let optimizer = RegularStepGradientDescent::default();
        let state = optimizer.optimize(&cost, &[1.0, 1.0]).unwrap();
        assert_eq!(
            state.status,
            OptimizerStatus::Converged(StopCondition::GradientTolerance)
        );
        assert_eq!(state.iteration, 0);
    }

    #[test]
    fn test_scales_slow_down_a_parameter() {
        let cost = Bowl::new(vec![1.0, 1.0]);
        let optimizer = RegularStepGradientDescent::new(
            StepOptimizerConfig::default()
                .with_step_lengths(0.1, 1e-3)
                .with_max_iterations(1)
                .with_scales(vec![1000.0, 1.0]),
        );
        let state = optimizer.optimize(&cost, &[0.0, 0.0]).unwrap();
        assert!(state.parameters[0].abs() < 1e-3);
        assert!((state.parameters[1] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic() {
        let cost = Bowl::new(vec![0.7, -0.4]);
        let optimizer = RegularStepGradientDescent::default();
        let a = optimizer.optimize(&cost, &[3.0, 2.0]).unwrap();
        let b = optimizer.optimize(&cost, &[3.0, 2.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config() {
        let cost = Bowl::new(vec![0.0]);
        let optimizer = RegularStepGradientDescent::new(
            StepOptimizerConfig::default().with_step_lengths(0.01, 1.0),
        );
        assert!(matches!(
            optimizer.optimize(&cost, &[1.0]),
            Err(RegistrationError::InvalidConfiguration(_))
        ));
    }
}
