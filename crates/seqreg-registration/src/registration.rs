//! Single-resolution registration of one image pair.

use std::marker::PhantomData;

use burn::tensor::backend::Backend;
use seqreg_core::{Image, Region, Transform2D};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::metric::{Metric, OptimizationDirection};
use crate::optimizer::{
    CostFunction, Optimizer, OptimizerState, RegularStepGradientDescent, StepOptimizerConfig,
};
use crate::validation::{validate_image, validate_positive};

/// Default perturbation for central-difference derivatives.
pub const DEFAULT_DERIVATIVE_STEP: f64 = 1e-2;

/// A metric evaluated over one image pair, seen as a function of the
/// transform parameters.
pub struct ImageCostFunction<'a, B: Backend, M: Metric<B>> {
    metric: &'a M,
    fixed: &'a Image<B>,
    moving: &'a Image<B>,
    region: Region,
    template: Transform2D,
    active: Vec<bool>,
    derivative_step: f64,
    _backend: PhantomData<B>,
}

impl<'a, B: Backend, M: Metric<B>> ImageCostFunction<'a, B, M> {
    /// # Arguments
    /// * `template` - Transform whose type and inactive parameters are kept
    pub fn new(
        metric: &'a M,
        fixed: &'a Image<B>,
        region: Region,
        moving: &'a Image<B>,
        template: Transform2D,
        derivative_step: f64,
    ) -> Self {
        Self {
            metric,
            fixed,
            moving,
            region,
            active: template.active_parameters(),
            template,
            derivative_step,
            _backend: PhantomData,
        }
    }
}

impl<B: Backend, M: Metric<B>> CostFunction for ImageCostFunction<'_, B, M> {
    fn num_parameters(&self) -> usize {
        self.template.num_parameters()
    }

    fn value(&self, parameters: &[f64]) -> Result<f64> {
        let transform = self.template.with_parameters(parameters);
        self.metric.evaluate(self.fixed, &self.region, self.moving, &transform)
    }

    fn value_and_derivative(&self, parameters: &[f64]) -> Result<(f64, Vec<f64>)> {
        let transform = self.template.with_parameters(parameters);
        self.metric.value_and_derivative(
            self.fixed,
            &self.region,
            self.moving,
            &transform,
            &self.active,
            self.derivative_step,
        )
    }

    fn direction(&self) -> OptimizationDirection {
        self.metric.direction()
    }
}

/// Outcome of registering one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationResult {
    /// Best transform found.
    pub transform: Transform2D,
    /// Metric value at `transform`.
    pub value: f64,
    pub state: OptimizerState,
}

/// Registers a moving image onto a fixed image with a step optimizer.
///
/// The optimizer's scales default to the transform's own scales when the
/// configuration leaves them unset.
#[derive(Debug, Clone)]
pub struct ImageRegistration<M> {
    metric: M,
    optimizer: StepOptimizerConfig,
    derivative_step: f64,
}

impl<M> ImageRegistration<M> {
    pub fn new(metric: M, optimizer: StepOptimizerConfig) -> Self {
        Self {
            metric,
            optimizer,
            derivative_step: DEFAULT_DERIVATIVE_STEP,
        }
    }

    pub fn with_derivative_step(mut self, step: f64) -> Self {
        self.derivative_step = step;
        self
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    pub fn optimizer_config(&self) -> &StepOptimizerConfig {
        &self.optimizer
    }

    /// Register `moving` onto `fixed`.
    ///
    /// # Arguments
    /// * `region` - Fixed region to sample; `None` uses the whole fixed image
    /// * `initial` - Starting transform, mapping fixed points into moving space
    pub fn execute<B>(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
        region: Option<Region>,
        initial: Transform2D,
    ) -> Result<RegistrationResult>
    where
        B: Backend,
        M: Metric<B>,
    {
        validate_image(fixed, "Fixed")?;
        validate_image(moving, "Moving")?;
        validate_positive("Derivative step", self.derivative_step)?;

        let region = region.unwrap_or_else(|| fixed.largest_region());
        let mut config = self.optimizer.clone();
        if config.scales.is_none() {
            config.scales = Some(initial.default_scales());
        }

        let cost = ImageCostFunction::new(
            &self.metric,
            fixed,
            region,
            moving,
            initial,
            self.derivative_step,
        );
        let state = RegularStepGradientDescent::new(config).optimize(&cost, &initial.parameters())?;
        let transform = initial.with_parameters(&state.parameters);
        debug!(
            metric = self.metric.name(),
            value = state.value,
            iterations = state.iteration,
            "pair registered"
        );

        Ok(RegistrationResult {
            transform,
            value: state.value,
            state,
        })
    }
}
