//! Coarse-to-fine registration over a resolution schedule.
//!
//! Each level runs a fresh step optimizer. The transform parameters carry
//! over unchanged; the step bounds are handed down so that a finer level
//! starts where the coarser one stopped moving.

use burn::tensor::backend::Backend;
use seqreg_core::filter::{blur_schedule, shrink_schedule, MultiResolutionPyramid};
use seqreg_core::{Image, Transform2D};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RegistrationError, Result};
use crate::metric::Metric;
use crate::optimizer::{OptimizerStatus, StepOptimizerConfig};
use crate::registration::{ImageRegistration, DEFAULT_DERIVATIVE_STEP};
use crate::validation::validate_positive;

/// How the images are coarsened level by level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionSchedule {
    /// Smooth and shrink; factors halve from `max_shrink` to `min_shrink`.
    Pyramid {
        levels: usize,
        max_shrink: usize,
        min_shrink: usize,
    },
    /// Full resolution with sigmas (in pixels) falling from `max_sigma`
    /// to `min_sigma`.
    Blur {
        levels: usize,
        max_sigma: f64,
        min_sigma: f64,
    },
}

impl Default for ResolutionSchedule {
    fn default() -> Self {
        ResolutionSchedule::Pyramid {
            levels: 3,
            max_shrink: 4,
            min_shrink: 1,
        }
    }
}

impl ResolutionSchedule {
    /// Single full-resolution level.
    pub fn single() -> Self {
        ResolutionSchedule::Pyramid {
            levels: 1,
            max_shrink: 1,
            min_shrink: 1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            ResolutionSchedule::Pyramid {
                levels,
                max_shrink,
                min_shrink,
            } => {
                if levels == 0 {
                    return Err(RegistrationError::invalid_configuration(
                        "Resolution schedule requires at least 1 level",
                    ));
                }
                if min_shrink == 0 || max_shrink < min_shrink {
                    return Err(RegistrationError::invalid_configuration(format!(
                        "Shrink factors must satisfy 1 <= min <= max, got min {} max {}",
                        min_shrink, max_shrink
                    )));
                }
            }
            ResolutionSchedule::Blur {
                levels,
                max_sigma,
                min_sigma,
            } => {
                if levels == 0 {
                    return Err(RegistrationError::invalid_configuration(
                        "Resolution schedule requires at least 1 level",
                    ));
                }
                if !(min_sigma >= 0.0 && max_sigma >= min_sigma) {
                    return Err(RegistrationError::invalid_configuration(format!(
                        "Blur sigmas must satisfy 0 <= min <= max, got min {} max {}",
                        min_sigma, max_sigma
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build the pyramid for `image`, coarsest level first.
    pub fn build_pyramid<B: Backend>(&self, image: &Image<B>) -> MultiResolutionPyramid<B> {
        match *self {
            ResolutionSchedule::Pyramid {
                levels,
                max_shrink,
                min_shrink,
            } => MultiResolutionPyramid::from_shrink_factors(
                image,
                &shrink_schedule(levels, max_shrink, min_shrink),
            ),
            ResolutionSchedule::Blur {
                levels,
                max_sigma,
                min_sigma,
            } => MultiResolutionPyramid::from_blur_sigmas(
                image,
                &blur_schedule(levels, max_sigma, min_sigma),
            ),
        }
    }
}

/// Configuration for [`MultiResolutionRegistration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoarseToFineConfig {
    pub schedule: ResolutionSchedule,
    /// Optimizer settings; the step bounds apply to the first level.
    pub optimizer: StepOptimizerConfig,
    /// Each finer level divides the previous minimum step by this.
    pub min_step_divisor: f64,
    /// Perturbation for central-difference derivatives.
    pub derivative_step: f64,
}

impl Default for CoarseToFineConfig {
    fn default() -> Self {
        Self {
            schedule: ResolutionSchedule::default(),
            optimizer: StepOptimizerConfig::default(),
            min_step_divisor: 2.0,
            derivative_step: DEFAULT_DERIVATIVE_STEP,
        }
    }
}

impl CoarseToFineConfig {
    pub fn with_schedule(mut self, schedule: ResolutionSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_optimizer(mut self, optimizer: StepOptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_min_step_divisor(mut self, divisor: f64) -> Self {
        self.min_step_divisor = divisor;
        self
    }

    pub fn with_derivative_step(mut self, step: f64) -> Self {
        self.derivative_step = step;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.schedule.validate()?;
        self.optimizer.validate()?;
        validate_positive("Derivative step", self.derivative_step)?;
        if !(self.min_step_divisor >= 1.0) {
            return Err(RegistrationError::invalid_configuration(format!(
                "Minimum step divisor must be at least 1, got {}",
                self.min_step_divisor
            )));
        }
        Ok(())
    }
}

/// What happened at one resolution level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelReport {
    pub level: usize,
    pub shrink_factor: usize,
    pub sigma: f64,
    /// Scheduled step bounds for the level. The optimizer never starts
    /// with a minimum above the maximum.
    pub max_step_length: f64,
    pub min_step_length: f64,
    /// Step length when the level stopped.
    pub final_step_length: f64,
    pub iterations: usize,
    pub value: f64,
    pub status: OptimizerStatus,
}

/// Outcome of a coarse-to-fine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiResolutionResult {
    pub transform: Transform2D,
    /// Metric value at the finest level.
    pub value: f64,
    /// Reports ordered coarsest first.
    pub levels: Vec<LevelReport>,
}

/// Multi-resolution registration framework.
///
/// Orchestrates the registration process across resolution levels
/// (coarse-to-fine) to improve robustness and convergence range.
#[derive(Debug, Clone)]
pub struct MultiResolutionRegistration<M> {
    metric: M,
    config: CoarseToFineConfig,
}

impl<M: Clone> MultiResolutionRegistration<M> {
    pub fn new(metric: M, config: CoarseToFineConfig) -> Self {
        Self { metric, config }
    }

    pub fn config(&self) -> &CoarseToFineConfig {
        &self.config
    }

    /// Register `moving` onto `fixed` starting from `initial`.
    ///
    /// Level 0 uses the configured step bounds. Level `k > 0` starts with
    /// the previous level's final step as its maximum and the previous
    /// minimum divided by the configured divisor. A failure at any level
    /// fails the whole run.
    pub fn execute<B>(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
        initial: Transform2D,
    ) -> Result<MultiResolutionResult>
    where
        B: Backend,
        M: Metric<B>,
    {
        self.config.validate()?;
        let fixed_pyramid = self.config.schedule.build_pyramid(fixed);
        let moving_pyramid = self.config.schedule.build_pyramid(moving);

        let mut transform = initial;
        let mut value = f64::NAN;
        let mut max_step = self.config.optimizer.max_step_length;
        let mut min_step = self.config.optimizer.min_step_length;
        let mut reports: Vec<LevelReport> = Vec::with_capacity(fixed_pyramid.num_levels());

        for (level, (fixed_level, moving_level)) in fixed_pyramid
            .levels()
            .iter()
            .zip(moving_pyramid.levels())
            .enumerate()
        {
            if let Some(previous) = reports.last() {
                max_step = previous.final_step_length;
                min_step = previous.min_step_length / self.config.min_step_divisor;
            }
            debug!(
                level,
                shrink = fixed_level.shrink_factor,
                sigma = fixed_level.sigma,
                max_step,
                min_step,
                "starting level"
            );

            let optimizer = self
                .config
                .optimizer
                .clone()
                .with_step_lengths(max_step, min_step.min(max_step));
            let registration = ImageRegistration::new(self.metric.clone(), optimizer)
                .with_derivative_step(self.config.derivative_step);
            let result =
                registration.execute(&fixed_level.image, &moving_level.image, None, transform)?;

            transform = result.transform;
            value = result.value;
            reports.push(LevelReport {
                level,
                shrink_factor: fixed_level.shrink_factor,
                sigma: fixed_level.sigma,
                max_step_length: max_step,
                min_step_length: min_step,
                final_step_length: result.state.step_length,
                iterations: result.state.iteration,
                value,
                status: result.state.status,
            });
        }

        info!(
            levels = reports.len(),
            value,
            metric = Metric::<B>::name(&self.metric),
            "coarse-to-fine registration finished"
        );
        Ok(MultiResolutionResult {
            transform,
            value,
            levels: reports,
        })
    }
}
