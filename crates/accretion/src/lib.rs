pub mod aggregate;
pub mod capture;
pub mod closure;
pub mod config;
pub mod details;
pub mod error;
pub mod finalize;
pub mod friction;
pub mod growth;
pub mod pipeline;
pub mod sink;
pub mod variability;

#[cfg(test)]
mod growth_test;
#[cfg(test)]
mod pipeline_test;

pub use aggregate::{BulgeSums, CaptureTally, Environment, KernelSums};
pub use capture::{CaptureCeiling, CaptureTest};
pub use closure::{ClosureEvaluator, ClosureOutcome};
pub use config::{
    AccretionConfig, AccretionModel, BondiVariant, DragMode, FrictionMass, TorqueVariant,
};
pub use details::{DetailsFormat, DetailsRecord, DetailsSink, DetailsWriter};
pub use error::ConfigError;
pub use finalize::{Finalizer, TimeBinStats};
pub use pipeline::{AccretionPipeline, Collaborators, PipelineStage, StepContext, StepReport};
pub use sink::{ParticleKind, Sink, SinkId};
