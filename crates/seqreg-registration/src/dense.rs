//! Dense local-region registration.
//!
//! Every sample location of the moving image gets its own small
//! translation-only registration. A template of radius `r` around the
//! location in the moving image is searched for inside a window of radius
//! `ceil(k * r)` around the same physical point in the fixed image. Stored
//! vectors use the same fixed-to-moving convention as the global path:
//! `fixed(p) ~ moving(p + v)`.
//!
//! Locations are independent: each one extracts its own regions and runs a
//! fresh optimizer, so a failing location only zeroes its own sample.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use burn::tensor::backend::Backend;
use rayon::prelude::*;
use seqreg_core::spatial::{Index2, Point2};
use seqreg_core::{Image, Region, Transform2D, VectorField};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{RegistrationError, Result};
use crate::metric::{Metric, NormalizedCorrelation};
use crate::optimizer::StepOptimizerConfig;
use crate::progress::{ProgressAction, ProgressTracker};
use crate::registration::{ImageRegistration, DEFAULT_DERIVATIVE_STEP};
use crate::validation::{validate_image, validate_positive};

const STAGE: &str = "dense";

/// Configuration for [`DenseRegistration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseRegistrationConfig {
    /// Template radius `r` in pixels.
    pub radius: usize,
    /// Search window radius as a multiple of `radius` (`k >= 1`).
    pub roi_ratio: f64,
    pub optimizer: StepOptimizerConfig,
    pub derivative_step: f64,
    /// Report progress every this many locations.
    pub progress_interval: usize,
    pub parallel: bool,
}

impl Default for DenseRegistrationConfig {
    fn default() -> Self {
        Self {
            radius: 5,
            roi_ratio: 2.0,
            optimizer: StepOptimizerConfig::default()
                .with_step_lengths(1.0, 0.01)
                .with_max_iterations(50),
            derivative_step: DEFAULT_DERIVATIVE_STEP,
            progress_interval: 100,
            parallel: false,
        }
    }
}

impl DenseRegistrationConfig {
    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_roi_ratio(mut self, ratio: f64) -> Self {
        self.roi_ratio = ratio;
        self
    }

    pub fn with_optimizer(mut self, optimizer: StepOptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_derivative_step(mut self, step: f64) -> Self {
        self.derivative_step = step;
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Radius of the fixed search window, `ceil(k * r)`.
    pub fn search_radius(&self) -> usize {
        (self.radius as f64 * self.roi_ratio).ceil() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.radius == 0 {
            return Err(RegistrationError::invalid_configuration(
                "Template radius must be at least 1",
            ));
        }
        if !(self.roi_ratio >= 1.0) || !self.roi_ratio.is_finite() {
            return Err(RegistrationError::invalid_configuration(format!(
                "ROI ratio must be a finite value >= 1, got {}",
                self.roi_ratio
            )));
        }
        if self.progress_interval == 0 {
            return Err(RegistrationError::invalid_configuration(
                "Progress interval must be at least 1",
            ));
        }
        validate_positive("Derivative step", self.derivative_step)?;
        self.optimizer.validate()
    }
}

/// Which moving-image locations to register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SampleLocations {
    /// Every pixel of the moving image, row-major.
    Dense,
    /// Explicit pixel indices in the moving image.
    Features(Vec<Index2>),
}

impl SampleLocations {
    fn resolve<B: Backend>(&self, moving: &Image<B>) -> Vec<Index2> {
        match self {
            SampleLocations::Dense => {
                let size = moving.size();
                (0..size.height as i64)
                    .flat_map(|y| (0..size.width as i64).map(move |x| Index2::new(x, y)))
                    .collect()
            }
            SampleLocations::Features(points) => points.clone(),
        }
    }
}

/// A location whose registration failed; its field sample is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFailure {
    pub index: Index2,
    pub reason: String,
}

/// Outcome of a dense run.
#[derive(Debug, Clone)]
pub struct DenseRegistrationResult<B: Backend> {
    /// Displacements on the moving image grid, zero where nothing was estimated.
    pub field: VectorField<B>,
    /// Locations registered successfully.
    pub registered: usize,
    pub failures: Vec<LocationFailure>,
    /// Locations never started because the run was aborted.
    pub skipped: usize,
    pub aborted: bool,
}

type LocationOutcome = (Index2, Result<[f64; 2]>);

/// Per-location translation registration producing a [`VectorField`].
#[derive(Debug, Clone)]
pub struct DenseRegistration<M = NormalizedCorrelation> {
    metric: M,
    config: DenseRegistrationConfig,
    progress: Option<ProgressTracker>,
}

impl DenseRegistration<NormalizedCorrelation> {
    /// Dense registration with normalized correlation.
    pub fn new(config: DenseRegistrationConfig) -> Self {
        Self::with_metric(NormalizedCorrelation::new(), config)
    }
}

impl<M: Clone> DenseRegistration<M> {
    pub fn with_metric(metric: M, config: DenseRegistrationConfig) -> Self {
        Self {
            metric,
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.progress = Some(tracker);
        self
    }

    pub fn config(&self) -> &DenseRegistrationConfig {
        &self.config
    }

    /// Estimate displacements at `locations` of `moving` against `fixed`.
    ///
    /// # Errors
    /// Fails only for an invalid configuration or an unusable input image.
    /// Per-location failures are collected in the result.
    pub fn execute<B>(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
        locations: &SampleLocations,
    ) -> Result<DenseRegistrationResult<B>>
    where
        B: Backend,
        M: Metric<B>,
    {
        let checked = self
            .config
            .validate()
            .and_then(|_| validate_image(fixed, "Fixed"))
            .and_then(|_| validate_image(moving, "Moving"));
        if let Err(e) = checked {
            error!(error = %e, "dense registration rejected");
            if let Some(tracker) = &self.progress {
                tracker.error(&e.to_string());
            }
            return Err(e);
        }

        let indices = locations.resolve(moving);
        let total = indices.len();
        info!(
            locations = total,
            radius = self.config.radius,
            search_radius = self.config.search_radius(),
            parallel = self.config.parallel,
            "dense registration started"
        );
        if let Some(tracker) = &self.progress {
            tracker.start(STAGE);
        }

        let abort = AtomicBool::new(false);
        let completed = AtomicUsize::new(0);
        let run = |index: &Index2| -> Option<LocationOutcome> {
            if abort.load(Ordering::SeqCst) {
                return None;
            }
            let outcome = self.register_location(fixed, moving, *index);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if (done % self.config.progress_interval == 0 || done == total)
                && self.report(done, total) == ProgressAction::Abort
                && done < total
            {
                abort.store(true, Ordering::SeqCst);
            }
            Some((*index, outcome))
        };

        let outcomes: Vec<LocationOutcome> = if self.config.parallel {
            indices.par_iter().filter_map(run).collect()
        } else {
            indices.iter().map_while(run).collect()
        };

        let result = self.assemble(moving, outcomes, total);
        if let Some(tracker) = &self.progress {
            tracker.complete(result.registered + result.failures.len(), total);
        }
        info!(
            registered = result.registered,
            failed = result.failures.len(),
            skipped = result.skipped,
            "dense registration finished"
        );
        Ok(result)
    }

    fn report(&self, completed: usize, total: usize) -> ProgressAction {
        match &self.progress {
            Some(tracker) => tracker.update(completed, total, None),
            None => ProgressAction::Continue,
        }
    }

    /// Register the template around `index` inside its fixed search window.
    fn register_location<B>(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
        index: Index2,
    ) -> Result<[f64; 2]>
    where
        B: Backend,
        M: Metric<B>,
    {
        if !moving.size().contains(index) {
            return Err(RegistrationError::empty_region(format!(
                "location ({}, {}) is outside the moving image",
                index.x, index.y
            )));
        }
        let template = moving
            .extract_region(&Region::centered(index, self.config.radius))
            .ok_or_else(|| RegistrationError::empty_region("template region is empty"))?;

        let location = Point2::new(index.x as f64, index.y as f64);
        let point = moving.transform_continuous_index_to_physical_point(&location);
        let continuous = fixed.transform_physical_point_to_continuous_index(&point);
        let center = Index2::new(continuous.x.round() as i64, continuous.y.round() as i64);
        let window = fixed
            .extract_region(&Region::centered(center, self.config.search_radius()))
            .ok_or_else(|| {
                RegistrationError::empty_region(format!(
                    "search window around ({}, {}) lies outside the fixed image",
                    center.x, center.y
                ))
            })?;

        let registration =
            ImageRegistration::new(self.metric.clone(), self.config.optimizer.clone())
                .with_derivative_step(self.config.derivative_step);
        let initial = Transform2D::identity_translation();
        let result = registration.execute(&template, &window, None, initial)?;
        // The search runs moving-into-fixed; a translation inverts by negation.
        let parameters = result.transform.parameters();
        Ok([-parameters[0], -parameters[1]])
    }

    fn assemble<B: Backend>(
        &self,
        moving: &Image<B>,
        outcomes: Vec<LocationOutcome>,
        total: usize,
    ) -> DenseRegistrationResult<B> {
        let size = moving.size();
        let mut vectors = vec![[0.0f32; 2]; size.num_pixels()];
        let mut failures = Vec::new();
        let mut registered = 0;
        let processed = outcomes.len();

        for (index, outcome) in outcomes {
            match outcome {
                Ok([x, y]) => {
                    let offset = index.y as usize * size.width + index.x as usize;
                    vectors[offset] = [x as f32, y as f32];
                    registered += 1;
                    debug!(x = index.x, y = index.y, dx = x, dy = y, "location registered");
                }
                Err(e) => {
                    warn!(
                        x = index.x,
                        y = index.y,
                        error = %e,
                        "location registration failed, recording zero"
                    );
                    failures.push(LocationFailure {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let field = VectorField::from_vectors(
            &vectors,
            size,
            *moving.origin(),
            *moving.spacing(),
            &moving.device(),
        );
        DenseRegistrationResult {
            field,
            registered,
            failures,
            skipped: total - processed,
            aborted: processed < total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use seqreg_core::spatial::{Size2, Spacing2};

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_search_radius_rounds_up() {
        let config = DenseRegistrationConfig::default().with_radius(2).with_roi_ratio(1.5);
        assert_eq!(config.search_radius(), 3);
        assert_eq!(DenseRegistrationConfig::default().search_radius(), 10);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(DenseRegistrationConfig::default().with_radius(0).validate().is_err());
        assert!(DenseRegistrationConfig::default().with_roi_ratio(0.5).validate().is_err());
        assert!(DenseRegistrationConfig::default()
            .with_progress_interval(0)
            .validate()
            .is_err());
        assert!(DenseRegistrationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_dense_locations_are_row_major() {
        let image = Image::<TestBackend>::from_vec(
            vec![0.0; 6],
            Size2::new(3, 2),
            Point2::origin(),
            Spacing2::new(1.0, 1.0),
            &Default::default(),
        );
        let indices = SampleLocations::Dense.resolve(&image);
        assert_eq!(indices.len(), 6);
        assert_eq!(indices[0], Index2::new(0, 0));
        assert_eq!(indices[1], Index2::new(1, 0));
        assert_eq!(indices[3], Index2::new(0, 1));
    }

    #[test]
    fn test_location_outside_moving_image_fails() {
        let image = Image::<TestBackend>::from_vec(
            (0..64).map(|v| v as f32).collect(),
            Size2::new(8, 8),
            Point2::origin(),
            Spacing2::new(1.0, 1.0),
            &Default::default(),
        );
        let dense = DenseRegistration::new(DenseRegistrationConfig::default().with_radius(1));
        let result = dense
            .execute(
                &image,
                &image,
                &SampleLocations::Features(vec![Index2::new(20, 3)]),
            )
            .unwrap();
        assert_eq!(result.registered, 0);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].index, Index2::new(20, 3));
        assert!(!result.aborted);
    }
}
