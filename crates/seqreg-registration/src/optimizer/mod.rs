//! Derivative-based optimisation of transform parameters.

pub mod regular_step;
pub mod trait_;

pub use regular_step::{
    IterationRecord, OptimizerState, OptimizerStatus, RegularStepGradientDescent,
    StepOptimizerConfig, StopCondition,
};
pub use trait_::{CostFunction, Optimizer};
