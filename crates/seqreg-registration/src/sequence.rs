//! Sequential registration of an image series.
//!
//! Every frame is registered onto its predecessor. A pair that fails is
//! logged and recorded as an all-zero transform so the series keeps one
//! transform per consecutive pair.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use burn::tensor::backend::Backend;
use rayon::prelude::*;
use seqreg_core::filter::ResampleImageFilter;
use seqreg_core::interpolation::LinearInterpolator;
use seqreg_core::{Image, ImageSource, Transform2D, TransformGroup};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{RegistrationError, Result};
use crate::metric::MeanSquaredError;
use crate::multires::{CoarseToFineConfig, MultiResolutionRegistration};
use crate::optimizer::OptimizerStatus;
use crate::preprocess::PreprocessConfig;
use crate::progress::{ProgressAction, ProgressTracker};

const STAGE: &str = "sequence";

/// Configuration for [`SequenceRegistration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRegistrationConfig {
    pub preprocess: PreprocessConfig,
    pub coarse_to_fine: CoarseToFineConfig,
    /// Load every frame up front and register pairs on the rayon pool.
    pub parallel: bool,
    /// Start each pair from the centre-aligned rigid transform; otherwise
    /// start from zero translation about the fixed centre.
    pub center_initialization: bool,
}

impl Default for SequenceRegistrationConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            coarse_to_fine: CoarseToFineConfig::default(),
            parallel: false,
            center_initialization: true,
        }
    }
}

impl SequenceRegistrationConfig {
    pub fn with_preprocess(mut self, preprocess: PreprocessConfig) -> Self {
        self.preprocess = preprocess;
        self
    }

    pub fn with_coarse_to_fine(mut self, coarse_to_fine: CoarseToFineConfig) -> Self {
        self.coarse_to_fine = coarse_to_fine;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_center_initialization(mut self, enabled: bool) -> Self {
        self.center_initialization = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.preprocess.validate()?;
        self.coarse_to_fine.validate()
    }
}

/// Outcome of one consecutive pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    pub fixed_index: usize,
    pub moving_index: usize,
    /// Optimizer status at the finest level, or `Failed`.
    pub status: OptimizerStatus,
    /// Final metric value; `None` for failed pairs.
    pub value: Option<f64>,
    /// Iterations summed over all levels.
    pub iterations: usize,
    pub error: Option<String>,
}

impl PairReport {
    pub fn is_failed(&self) -> bool {
        self.status == OptimizerStatus::Failed
    }
}

/// Outcome of a sequence run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceResult {
    /// One transform per registered pair, in frame order.
    pub transforms: TransformGroup,
    pub pairs: Vec<PairReport>,
    /// The run stopped on request before every pair was registered.
    pub aborted: bool,
}

impl SequenceResult {
    pub fn failed_pairs(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_failed()).count()
    }
}

/// Registers every frame of an [`ImageSource`] onto its predecessor.
///
/// Pairs use the mean squared error metric with the coarse-to-fine
/// schedule from the configuration.
#[derive(Debug, Clone, Default)]
pub struct SequenceRegistration {
    config: SequenceRegistrationConfig,
    progress: Option<ProgressTracker>,
}

impl SequenceRegistration {
    pub fn new(config: SequenceRegistrationConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Report each finished pair to `tracker`.
    pub fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.progress = Some(tracker);
        self
    }

    pub fn config(&self) -> &SequenceRegistrationConfig {
        &self.config
    }

    /// Register the whole sequence.
    ///
    /// # Errors
    /// Fails only for an invalid configuration or a source with fewer than
    /// two frames. Individual pair failures are recorded in the result.
    pub fn execute<B, S>(&self, source: &mut S) -> Result<SequenceResult>
    where
        B: Backend,
        S: ImageSource<B>,
    {
        let count = source.count();
        if let Err(e) = self.check(count) {
            error!(error = %e, "sequence registration rejected");
            if let Some(tracker) = &self.progress {
                tracker.error(&e.to_string());
            }
            return Err(e);
        }
        let total = count - 1;
        info!(frames = count, parallel = self.config.parallel, "registering sequence");
        if let Some(tracker) = &self.progress {
            tracker.start(STAGE);
        }

        let outcomes = if self.config.parallel {
            self.execute_parallel(&*source, total)
        } else {
            self.execute_sequential(source, total)
        };

        let aborted = outcomes.len() < total;
        let mut transforms = TransformGroup::new();
        let mut pairs = Vec::with_capacity(outcomes.len());
        for (transform, report) in outcomes {
            transforms.push(transform);
            pairs.push(report);
        }
        let result = SequenceResult {
            transforms,
            pairs,
            aborted,
        };

        if let Some(tracker) = &self.progress {
            tracker.complete(result.pairs.len(), total);
        }
        if aborted {
            warn!(registered = result.pairs.len(), total, "sequence registration aborted");
        }
        info!(
            registered = result.pairs.len(),
            failed = result.failed_pairs(),
            "sequence registration finished"
        );
        Ok(result)
    }

    fn check(&self, count: usize) -> Result<()> {
        self.config.validate()?;
        if count < 2 {
            return Err(RegistrationError::invalid_configuration(format!(
                "Sequence registration needs at least 2 images, got {}",
                count
            )));
        }
        Ok(())
    }

    fn execute_sequential<B, S>(
        &self,
        source: &mut S,
        total: usize,
    ) -> Vec<(Transform2D, PairReport)>
    where
        B: Backend,
        S: ImageSource<B>,
    {
        let mut outcomes = Vec::with_capacity(total);
        source.set_current_index(0);
        let mut previous = self.load(&*source, 0);
        for i in 0..total {
            source.set_current_index(i + 1);
            let current = self.load(&*source, i + 1);
            let outcome = self.register_pair(i, previous.as_ref(), current.as_ref());
            let value = outcome.1.value;
            outcomes.push(outcome);
            previous = current;

            if self.report(i + 1, total, value) == ProgressAction::Abort && i + 1 < total {
                break;
            }
        }
        outcomes
    }

    fn execute_parallel<B, S>(&self, source: &S, total: usize) -> Vec<(Transform2D, PairReport)>
    where
        B: Backend,
        S: ImageSource<B>,
    {
        let frames: Vec<Option<Image<B>>> = (0..=total).map(|i| self.load(source, i)).collect();
        let abort = AtomicBool::new(false);
        let completed = AtomicUsize::new(0);

        let outcomes: Vec<Option<(Transform2D, PairReport)>> = (0..total)
            .into_par_iter()
            .map(|i| {
                if abort.load(Ordering::SeqCst) {
                    return None;
                }
                let outcome = self.register_pair(i, frames[i].as_ref(), frames[i + 1].as_ref());
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if self.report(done, total, outcome.1.value) == ProgressAction::Abort {
                    abort.store(true, Ordering::SeqCst);
                }
                Some(outcome)
            })
            .collect();

        // Keep the contiguous prefix so transform `k` always describes pair `k`.
        outcomes.into_iter().map_while(|o| o).collect()
    }

    fn load<B: Backend, S: ImageSource<B>>(&self, source: &S, index: usize) -> Option<Image<B>> {
        source
            .get_image(index)
            .map(|image| self.config.preprocess.apply(&image))
    }

    fn report(&self, completed: usize, total: usize, value: Option<f64>) -> ProgressAction {
        match &self.progress {
            Some(tracker) => tracker.update(completed, total, value),
            None => ProgressAction::Continue,
        }
    }

    fn register_pair<B: Backend>(
        &self,
        index: usize,
        fixed: Option<&Image<B>>,
        moving: Option<&Image<B>>,
    ) -> (Transform2D, PairReport) {
        let result = match (fixed, moving) {
            (Some(fixed), Some(moving)) => self.register_images(fixed, moving),
            (None, _) => Err(RegistrationError::MissingImage(index)),
            (_, None) => Err(RegistrationError::MissingImage(index + 1)),
        };

        match result {
            Ok((transform, status, value, iterations)) => {
                debug!(fixed = index, moving = index + 1, value, iterations, "pair registered");
                (
                    transform,
                    PairReport {
                        fixed_index: index,
                        moving_index: index + 1,
                        status,
                        value: Some(value),
                        iterations,
                        error: None,
                    },
                )
            }
            Err(e) => {
                warn!(
                    fixed = index,
                    moving = index + 1,
                    error = %e,
                    "pair registration failed, recording a zero transform"
                );
                (
                    Transform2D::identity(),
                    PairReport {
                        fixed_index: index,
                        moving_index: index + 1,
                        status: OptimizerStatus::Failed,
                        value: None,
                        iterations: 0,
                        error: Some(e.to_string()),
                    },
                )
            }
        }
    }

    fn register_images<B: Backend>(
        &self,
        fixed: &Image<B>,
        moving: &Image<B>,
    ) -> Result<(Transform2D, OptimizerStatus, f64, usize)> {
        let fixed_center = fixed.physical_center();
        let initial = if self.config.center_initialization {
            Transform2D::default_initial(fixed_center, moving.physical_center())
        } else {
            Transform2D::default_initial(fixed_center, fixed_center)
        };
        let registration = MultiResolutionRegistration::new(
            MeanSquaredError::new(),
            self.config.coarse_to_fine.clone(),
        );
        let result = registration.execute(fixed, moving, initial)?;
        let status = result
            .levels
            .last()
            .map(|l| l.status)
            .unwrap_or(OptimizerStatus::Initialized);
        let iterations = result.levels.iter().map(|l| l.iterations).sum();
        Ok((result.transform, status, result.value, iterations))
    }
}

/// Resample every frame onto frame 0 using accumulated transforms.
///
/// Frame 0 is returned unchanged. Frame `k` is resampled on frame 0's grid
/// through the composition of the first `k` transforms. A shorter group
/// (for example from an aborted run) resamples only the frames it covers.
pub fn resample_sequence<B, S>(
    source: &S,
    transforms: &TransformGroup,
    default_pixel_value: f64,
) -> Result<Vec<Image<B>>>
where
    B: Backend,
    S: ImageSource<B>,
{
    if transforms.len() >= source.count() {
        return Err(RegistrationError::ShapeMismatch {
            expected: vec![source.count().saturating_sub(1)],
            actual: vec![transforms.len()],
        });
    }
    let reference = source.get_image(0).ok_or(RegistrationError::MissingImage(0))?;
    let accumulated = transforms.accumulated();

    let mut output = Vec::with_capacity(accumulated.len());
    output.push(reference.clone());
    for (k, transform) in accumulated.iter().enumerate().skip(1) {
        let frame = source.get_image(k).ok_or(RegistrationError::MissingImage(k))?;
        let resampled =
            ResampleImageFilter::new_from_reference(&reference, *transform, LinearInterpolator)
                .with_default_pixel_value(default_pixel_value)
            .apply(&frame);
        output.push(resampled);
    }
    debug!(frames = output.len(), "sequence resampled");
    Ok(output)
}
