//! Registration engine for 2D image sequences.
//!
//! Metrics, the regular-step optimizer, coarse-to-fine control, the
//! frame-to-frame sequence pipeline and dense local registration.

pub mod dense;
pub mod error;
pub mod metric;
pub mod multires;
pub mod optimizer;
pub mod preprocess;
pub mod progress;
pub mod registration;
pub mod sequence;
pub mod validation;

pub use dense::{
    DenseRegistration, DenseRegistrationConfig, DenseRegistrationResult, LocationFailure,
    SampleLocations,
};
pub use error::{RegistrationError, Result};
pub use metric::{MeanSquaredError, Metric, NormalizedCorrelation, OptimizationDirection};
pub use multires::{
    CoarseToFineConfig, LevelReport, MultiResolutionRegistration, MultiResolutionResult,
    ResolutionSchedule,
};
pub use optimizer::{
    OptimizerState, OptimizerStatus, RegularStepGradientDescent, StepOptimizerConfig,
    StopCondition,
};
pub use preprocess::PreprocessConfig;
pub use progress::{
    CancellationCallback, ConsoleProgressCallback, HistoryCallback, ProgressAction,
    ProgressCallback, ProgressInfo, ProgressTracker,
};
pub use registration::{ImageRegistration, RegistrationResult};
pub use sequence::{
    resample_sequence, PairReport, SequenceRegistration, SequenceRegistrationConfig,
    SequenceResult,
};
