use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::aggregate::{BulgeSums, CaptureTally, KernelSums};
use crate::capture::CaptureTest;
use crate::config::{AccretionConfig, AccretionModel, BondiVariant, TorqueVariant};
use crate::details::DetailsRecord;
use crate::pipeline::{
    AccretionPipeline, CaptureMarkers, Collaborators, EnvironmentPass, FeedPass, FeedRequest,
    MarkerField, PipelineStage, SinkArena, StepContext, SwallowPass,
};
use crate::sink::{NeighborSample, ParticleKind, Sink, SinkId};

/// Serves fixed neighbor lists, split into two partial contributions per sink.
#[derive(Default)]
struct ScriptedEnvironment {
    neighbors: HashMap<SinkId, Vec<NeighborSample>>,
    bulge_calls: usize,
    bulge_saw_normalized: bool,
}

impl EnvironmentPass for ScriptedEnvironment {
    fn gather(&mut self, sinks: &[&Sink], config: &AccretionConfig) -> Vec<(SinkId, KernelSums)> {
        let mut out = Vec::new();
        for sink in sinks {
            let samples = self.neighbors.get(&sink.id).cloned().unwrap_or_default();
            let (first, second) = samples.split_at(samples.len() / 2);
            for part in [first, second] {
                let mut sums = KernelSums::default();
                for s in part {
                    sums.accumulate(s, config.dynamical_friction);
                }
                out.push((sink.id, sums));
            }
        }
        out
    }

    fn gather_bulge(&mut self, sinks: &[&Sink], arena: &SinkArena) -> Vec<(SinkId, BulgeSums)> {
        self.bulge_calls += 1;
        let mut out = Vec::new();
        for sink in sinks {
            let Some(env) = arena.environment(sink.id) else {
                continue;
            };
            self.bulge_saw_normalized = true;
            let mut bulge = BulgeSums::default();
            for s in self.neighbors.get(&sink.id).into_iter().flatten() {
                bulge.accumulate(s, env);
            }
            out.push((sink.id, bulge));
        }
        out
    }
}

#[derive(Default)]
struct RecordingFeed {
    requests: Vec<FeedRequest>,
    mark: Option<(usize, SinkId)>,
}

impl FeedPass for RecordingFeed {
    fn mark(
        &mut self,
        _sinks: &[&Sink],
        requests: &[FeedRequest],
        _capture: &CaptureTest<'_>,
        markers: &mut dyn CaptureMarkers,
    ) {
        self.requests = requests.to_vec();
        if let Some((particle, sink)) = self.mark {
            markers.mark(particle, sink);
        }
    }
}

#[derive(Default)]
struct FixedSwallow {
    tallies: Vec<(SinkId, CaptureTally)>,
    marked_seen: usize,
}

impl SwallowPass for FixedSwallow {
    fn swallow(&mut self, markers: &dyn CaptureMarkers) -> Vec<(SinkId, CaptureTally)> {
        self.marked_seen = markers.marked_count();
        self.tallies.clone()
    }
}

fn gas(mass: f64) -> NeighborSample {
    NeighborSample {
        kind: ParticleKind::Gas,
        mass,
        offset: Vector3::new(0.02, 0.01, 0.0),
        relative_velocity: Vector3::new(0.0, 5.0, 0.0),
        internal_energy: 100.0,
    }
}

fn make_sinks() -> Vec<Sink> {
    let mut inactive = Sink::new(SinkId(3), Point3::new(1.0, 0.0, 0.0), Vector3::zeros(), 1.0e-4)
        .with_kernel_radius(0.1)
        .with_ambient_density(1.0e-2)
        .with_timestep(2, 1.0e-4);
    inactive.active = false;
    vec![
        Sink::new(SinkId(1), Point3::origin(), Vector3::zeros(), 1.0e-4)
            .with_kernel_radius(0.1)
            .with_ambient_density(1.0e-2)
            .with_timestep(1, 1.0e-4),
        inactive,
        Sink::new(SinkId(2), Point3::new(0.0, 1.0, 0.0), Vector3::zeros(), 2.0e-4)
            .with_kernel_radius(0.1)
            .with_ambient_density(1.0e-2)
            .with_timestep(1, 1.0e-4),
    ]
}

fn make_environment() -> ScriptedEnvironment {
    let mut env = ScriptedEnvironment::default();
    for id in [1, 2, 3] {
        env.neighbors.insert(SinkId(id), vec![gas(1.0e-5), gas(2.0e-5), gas(1.0e-5)]);
    }
    env
}

fn bondi_config() -> AccretionConfig {
    AccretionConfig {
        model: AccretionModel::Bondi(BondiVariant::Classic),
        ..Default::default()
    }
}

struct Harness {
    environment: ScriptedEnvironment,
    feed: RecordingFeed,
    swallow: FixedSwallow,
    markers: MarkerField,
    details: Vec<DetailsRecord>,
}

impl Harness {
    fn new() -> Self {
        Self {
            environment: make_environment(),
            feed: RecordingFeed::default(),
            swallow: FixedSwallow::default(),
            markers: MarkerField::new(16),
            details: Vec::new(),
        }
    }

    fn passes(&mut self) -> Collaborators<'_> {
        Collaborators {
            environment: &mut self.environment,
            feed: &mut self.feed,
            swallow: &mut self.swallow,
            markers: &mut self.markers,
            details: &mut self.details,
        }
    }
}

#[test]
fn test_zero_step_is_a_no_op() {
    let config = bondi_config();
    let mut pipeline = AccretionPipeline::new(&config);
    let mut sinks = make_sinks();
    let before: Vec<(f64, f64, f64)> =
        sinks.iter().map(|s| (s.mass, s.mdot, s.gravity_accel.x)).collect();
    let mut harness = Harness::new();
    harness.markers.mark(4, SinkId(9));

    let report = pipeline.step(&StepContext::new(0.1, 0.0), &mut sinks, harness.passes());

    assert!(report.skipped());
    assert_eq!(report.processed, 0);
    let after: Vec<(f64, f64, f64)> =
        sinks.iter().map(|s| (s.mass, s.mdot, s.gravity_accel.x)).collect();
    assert_eq!(before, after);
    assert!(harness.details.is_empty());
    assert_eq!(harness.markers.marked_by(4), Some(SinkId(9)));
}

#[test]
fn test_integrator_runs_once_per_active_sink() {
    let config = bondi_config();
    let mut pipeline = AccretionPipeline::new(&config);
    let mut sinks = make_sinks();
    let mut harness = Harness::new();

    let report = pipeline.step(&StepContext::new(0.1, 1.0e-4), &mut sinks, harness.passes());

    assert_eq!(report.processed, 2);
    assert_eq!(report.integrator_calls, 2);
    assert!(sinks[0].mdot > 0.0);
    assert!(sinks[2].mdot > sinks[0].mdot);
    // the inactive sink is untouched
    assert_eq!(sinks[1].mdot, 0.0);
    assert_eq!(sinks[1].mass, 1.0e-4);
}

#[test]
fn test_stage_order_with_bulge_pass() {
    let config = AccretionConfig {
        model: AccretionModel::Torque(TorqueVariant::Kinematic),
        ..Default::default()
    };
    let mut pipeline = AccretionPipeline::new(&config);
    let mut sinks = make_sinks();
    let mut harness = Harness::new();

    let report = pipeline.step(&StepContext::new(0.1, 1.0e-4), &mut sinks, harness.passes());

    assert_eq!(
        report.stages,
        vec![
            PipelineStage::Idle,
            PipelineStage::MarkersReset,
            PipelineStage::BuffersAllocated,
            PipelineStage::EnvironmentPass1,
            PipelineStage::EnvironmentPass2,
            PipelineStage::Normalized,
            PipelineStage::PropertiesPass,
            PipelineStage::FeedPass,
            PipelineStage::SwallowPass,
            PipelineStage::Finalize,
            PipelineStage::BuffersFreed,
            PipelineStage::MarkersReset,
            PipelineStage::Idle,
        ]
    );
    assert_eq!(harness.environment.bulge_calls, 1);
    assert!(harness.environment.bulge_saw_normalized);
}

#[test]
fn test_bulge_pass_skipped_when_not_needed() {
    let config = bondi_config();
    let mut pipeline = AccretionPipeline::new(&config);
    let mut sinks = make_sinks();
    let mut harness = Harness::new();

    let report = pipeline.step(&StepContext::new(0.1, 1.0e-4), &mut sinks, harness.passes());

    assert!(!report.stages.contains(&PipelineStage::EnvironmentPass2));
    assert_eq!(harness.environment.bulge_calls, 0);
}

#[test]
fn test_markers_cleared_after_step() {
    let config = bondi_config();
    let mut pipeline = AccretionPipeline::new(&config);
    let mut sinks = make_sinks();
    let mut harness = Harness::new();
    // stale marker from an earlier operation
    harness.markers.mark(0, SinkId(99));
    harness.feed.mark = Some((5, SinkId(2)));

    pipeline.step(&StepContext::new(0.1, 1.0e-4), &mut sinks, harness.passes());

    assert_eq!(harness.swallow.marked_seen, 1);
    assert_eq!(harness.markers.marked_count(), 0);
}

#[test]
fn test_feed_receives_final_rates() {
    let config = bondi_config();
    let mut pipeline = AccretionPipeline::new(&config);
    let mut sinks = make_sinks();
    let mut harness = Harness::new();

    pipeline.step(&StepContext::new(0.1, 1.0e-4), &mut sinks, harness.passes());

    let requests = &harness.feed.requests;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].id, SinkId(1));
    assert_eq!(requests[0].mdot, sinks[0].mdot);
    assert_eq!(requests[1].id, SinkId(2));
    assert_eq!(requests[1].dt, 1.0e-4);
    assert_eq!(requests[1].mdot_supply, None);
}

#[test]
fn test_captured_mass_applied_by_identity() {
    let config = AccretionConfig {
        model: AccretionModel::GravitationalCapture,
        ..Default::default()
    };
    let mut pipeline = AccretionPipeline::new(&config);
    let mut sinks = make_sinks();
    let mut harness = Harness::new();
    let mut half = CaptureTally::default();
    half.add(1.0e-5, 0.0, Vector3::new(1.0e-4, 0.0, 0.0));
    harness.swallow.tallies = vec![(SinkId(2), half), (SinkId(2), half), (SinkId(3), half)];

    pipeline.step(&StepContext::new(0.1, 1.0e-4), &mut sinks, harness.passes());

    assert_eq!(sinks[0].dynamical_mass, 1.0e-4);
    approx::assert_relative_eq!(sinks[2].dynamical_mass, 2.2e-4, max_relative = 1e-12);
    approx::assert_relative_eq!(sinks[2].velocity.x, 1.0, max_relative = 1e-12);
    // inactive sinks never finalize
    assert_eq!(sinks[1].dynamical_mass, 1.0e-4);
}

#[test]
fn test_details_and_time_bins() {
    let config = bondi_config();
    let mut pipeline = AccretionPipeline::new(&config);
    let mut sinks = make_sinks();
    let mut harness = Harness::new();

    let report = pipeline.step(&StepContext::new(0.1, 1.0e-4), &mut sinks, harness.passes());

    assert_eq!(harness.details, report.records);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[1].id, SinkId(2));

    let bin = *pipeline.stats().bin(1).unwrap();
    approx::assert_relative_eq!(bin.mass, sinks[0].mass + sinks[2].mass, max_relative = 1e-12);
    approx::assert_relative_eq!(bin.mdot, sinks[0].mdot + sinks[2].mdot, max_relative = 1e-12);

    // a second step resets the active bin rather than accumulating
    let mut harness = Harness::new();
    pipeline.step(&StepContext::new(0.2, 1.0e-4), &mut sinks, harness.passes());
    let bin = *pipeline.stats().bin(1).unwrap();
    approx::assert_relative_eq!(bin.mass, sinks[0].mass + sinks[2].mass, max_relative = 1e-12);
}

#[test]
fn test_arena_keeps_first_slot_for_repeated_id() {
    let arena = SinkArena::allocate([SinkId(5), SinkId(6), SinkId(5)]);

    assert_eq!(arena.len(), 2);
    let ids: Vec<SinkId> = arena.slots().iter().map(|slot| slot.id()).collect();
    assert_eq!(ids, vec![SinkId(5), SinkId(6)]);
}

#[test]
fn test_repeated_sink_is_processed_once() {
    let config = bondi_config();
    let mut pipeline = AccretionPipeline::new(&config);
    let mut sinks = make_sinks();
    let repeat = sinks[0].clone();
    sinks.push(repeat);
    let mut harness = Harness::new();

    let report = pipeline.step(&StepContext::new(0.1, 1.0e-4), &mut sinks, harness.passes());

    assert_eq!(report.processed, 2);
    assert_eq!(report.integrator_calls, 2);
    assert_eq!(harness.details.len(), 2);
    assert!(sinks[0].mdot > 0.0);
    // the repeat keeps its state
    assert_eq!(sinks[3].mdot, 0.0);
    assert_eq!(sinks[3].mass, 1.0e-4);
}
