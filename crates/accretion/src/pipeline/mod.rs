//! Per-timestep accretion pipeline.
//!
//! Stages run strictly in order:
//!
//! ```text
//! Idle → MarkersReset → BuffersAllocated → EnvironmentPass1
//!      → [EnvironmentPass2] → Normalized → PropertiesPass → FeedPass
//!      → SwallowPass → Finalize → BuffersFreed → MarkersReset → Idle
//! ```
//!
//! The second environment pass only runs for closures that need the
//! bulge/disk split and only after normalization. A step of zero length
//! is skipped entirely.

mod arena;
mod collaborators;

pub use arena::{SinkArena, SinkWorkspace};
pub use collaborators::{
    CaptureMarkers, EnvironmentPass, FeedPass, FeedRequest, MarkerField, SwallowPass,
};

use std::collections::{BTreeSet, HashSet};

use rayon::prelude::*;
use units::Cosmology;

use crate::capture::CaptureTest;
use crate::closure::ClosureEvaluator;
use crate::config::AccretionConfig;
use crate::details::{DetailsRecord, DetailsSink};
use crate::finalize::{reposition, Finalizer, TimeBinStats};
use crate::friction::supplementary_acceleration;
use crate::sink::Sink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Idle,
    MarkersReset,
    BuffersAllocated,
    EnvironmentPass1,
    EnvironmentPass2,
    Normalized,
    PropertiesPass,
    FeedPass,
    SwallowPass,
    Finalize,
    BuffersFreed,
}

/// Global state of the current step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    pub time: f64,
    /// Length of the step on the timebase; zero skips the pipeline
    pub dt: f64,
    pub cosmology: Cosmology,
    /// Physical time in code units; equals `time` unless set
    pub physical_time: f64,
}

impl StepContext {
    pub fn new(time: f64, dt: f64) -> Self {
        Self {
            time,
            dt,
            cosmology: Cosmology::static_space(),
            physical_time: time,
        }
    }

    /// Comoving runs integrate in the scale factor and must supply the
    /// cosmic age separately.
    pub fn with_physical_time(mut self, physical_time: f64) -> Self {
        self.physical_time = physical_time;
        self
    }

    pub fn with_cosmology(mut self, cosmology: Cosmology) -> Self {
        self.cosmology = cosmology;
        self
    }

    /// Physical step length of a sink.
    pub fn sink_dt(&self, sink: &Sink) -> f64 {
        sink.timestep / self.cosmology.hubble_rate
    }
}

/// The external passes of one step.
pub struct Collaborators<'c> {
    pub environment: &'c mut dyn EnvironmentPass,
    pub feed: &'c mut dyn FeedPass,
    pub swallow: &'c mut dyn SwallowPass,
    pub markers: &'c mut dyn CaptureMarkers,
    pub details: &'c mut dyn DetailsSink,
}

/// Summary of one pipeline step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub stages: Vec<PipelineStage>,
    /// Active sinks processed
    pub processed: usize,
    /// Mass-integrator invocations; equals `processed` for a completed step
    pub integrator_calls: usize,
    pub records: Vec<DetailsRecord>,
}

impl StepReport {
    pub fn skipped(&self) -> bool {
        self.stages.is_empty()
    }

    fn enter(&mut self, stage: PipelineStage) {
        log::trace!("accretion pipeline: {:?}", stage);
        self.stages.push(stage);
    }
}

pub struct AccretionPipeline<'a> {
    config: &'a AccretionConfig,
    stats: TimeBinStats,
}

impl<'a> AccretionPipeline<'a> {
    pub fn new(config: &'a AccretionConfig) -> Self {
        Self {
            config,
            stats: TimeBinStats::default(),
        }
    }

    pub fn config(&self) -> &AccretionConfig {
        self.config
    }

    pub fn stats(&self) -> &TimeBinStats {
        &self.stats
    }

    /// Runs one step over the active members of `sinks`.
    pub fn step(
        &mut self,
        ctx: &StepContext,
        sinks: &mut [Sink],
        mut passes: Collaborators<'_>,
    ) -> StepReport {
        let mut report = StepReport::default();
        if ctx.dt == 0.0 {
            return report;
        }
        let config = self.config;
        let cosmology = ctx.cosmology;

        report.enter(PipelineStage::Idle);
        passes.markers.clear();
        report.enter(PipelineStage::MarkersReset);

        let mut seen = HashSet::new();
        let mut active: Vec<&mut Sink> = sinks
            .iter_mut()
            .filter(|sink| sink.active)
            .filter(|sink| {
                let first = seen.insert(sink.id);
                if !first {
                    log::warn!("sink {} is listed twice, skipping the repeat", sink.id.0);
                }
                first
            })
            .collect();
        let mut arena = SinkArena::allocate(active.iter().map(|sink| sink.id));
        report.enter(PipelineStage::BuffersAllocated);
        if !active.is_empty() {
            log::info!("accretion step at t={}: {} active sinks", ctx.time, active.len());
        }

        {
            let views: Vec<&Sink> = active.iter().map(|sink| &**sink).collect();
            for (id, sums) in passes.environment.gather(&views, config) {
                arena.merge_sums(id, &sums);
            }
            report.enter(PipelineStage::EnvironmentPass1);

            arena.normalize_all(config.dynamical_friction, &cosmology);

            if config.model.needs_bulge_decomposition() {
                for (id, bulge) in passes.environment.gather_bulge(&views, &arena) {
                    arena.merge_bulge(id, &bulge);
                }
                report.enter(PipelineStage::EnvironmentPass2);
            }
            report.enter(PipelineStage::Normalized);
        }

        let evaluator = ClosureEvaluator::new(config, cosmology, ctx.time)
            .with_physical_time(ctx.physical_time);
        active
            .par_iter_mut()
            .zip(arena.slots_mut().par_iter_mut())
            .for_each(|(sink, slot)| {
                let sink: &mut Sink = sink;
                let dt = ctx.sink_dt(sink);
                let Some(env) = slot.environment() else {
                    return;
                };
                let outcome = evaluator.compute_accretion_rate(env, sink, dt);
                let accel =
                    supplementary_acceleration(config, env, sink, outcome.mdot, dt, &cosmology);
                sink.gravity_accel += accel;
                slot.advance(sink, outcome, dt);
            });
        report.enter(PipelineStage::PropertiesPass);

        {
            let views: Vec<&Sink> = active.iter().map(|sink| &**sink).collect();
            let requests: Vec<FeedRequest> = views
                .iter()
                .zip(arena.slots())
                .map(|(sink, slot)| FeedRequest {
                    id: sink.id,
                    mdot: slot.outcome().mdot,
                    mdot_supply: slot.outcome().supply,
                    dt: ctx.sink_dt(sink),
                })
                .collect();
            let capture = CaptureTest::new(config, cosmology);
            passes.feed.mark(&views, &requests, &capture, &mut *passes.markers);
        }
        report.enter(PipelineStage::FeedPass);

        for (id, tally) in passes.swallow.swallow(&*passes.markers) {
            arena.merge_tally(id, &tally);
        }
        report.enter(PipelineStage::SwallowPass);

        if config.reposition_on_potential_minimum {
            for sink in active.iter_mut() {
                reposition(sink);
            }
        }
        let active_bins: BTreeSet<usize> = active.iter().map(|sink| sink.time_bin).collect();
        self.stats.reset_active(active_bins);

        let finalizer = Finalizer::new(config, cosmology, ctx.time);
        for (sink, slot) in active.iter_mut().zip(arena.slots()) {
            let sink: &mut Sink = sink;
            let Some(env) = slot.environment() else {
                continue;
            };
            let dt = ctx.sink_dt(sink);
            let record = finalizer.finalize(sink, env, slot.tally(), slot.outcome().supply, dt);
            passes.details.emit(&record);
            self.stats.record(sink);
            report.records.push(record);
        }
        report.enter(PipelineStage::Finalize);

        report.processed = arena.len();
        report.integrator_calls = arena.advanced_count();
        drop(arena);
        report.enter(PipelineStage::BuffersFreed);

        passes.markers.clear();
        report.enter(PipelineStage::MarkersReset);
        report.enter(PipelineStage::Idle);

        if report.processed > 0 {
            log::info!(
                "accretion step at t={} done: {} sinks finalized",
                ctx.time,
                report.processed
            );
        }
        report
    }
}
