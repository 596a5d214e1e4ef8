//! Seams to the passes that own the neighbor particles.
//!
//! Neighbor search, cross-worker reduction and the actual particle
//! transfer live with the host simulation. The pipeline drives them
//! through these traits and only ever sees their reduced results.

use crate::aggregate::{BulgeSums, CaptureTally, KernelSums};
use crate::capture::CaptureTest;
use crate::config::AccretionConfig;
use crate::sink::{Sink, SinkId};

use super::arena::SinkArena;

/// Kernel aggregation over each active sink's neighbors.
///
/// Contributions may be partial (one per worker); the pipeline merges
/// them by sink identity.
pub trait EnvironmentPass {
    fn gather(&mut self, sinks: &[&Sink], config: &AccretionConfig) -> Vec<(SinkId, KernelSums)>;

    /// Second pass, run only after normalization for bulge/disk splits.
    fn gather_bulge(&mut self, sinks: &[&Sink], arena: &SinkArena) -> Vec<(SinkId, BulgeSums)>;
}

/// What the feed pass needs to know about one active sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedRequest {
    pub id: SinkId,
    pub mdot: f64,
    pub mdot_supply: Option<f64>,
    /// Physical step length
    pub dt: f64,
}

/// Decides which neighbors are swallowed and marks them.
pub trait FeedPass {
    fn mark(
        &mut self,
        sinks: &[&Sink],
        requests: &[FeedRequest],
        capture: &CaptureTest<'_>,
        markers: &mut dyn CaptureMarkers,
    );
}

/// Transfers marked neighbors and reports what each sink received.
pub trait SwallowPass {
    fn swallow(&mut self, markers: &dyn CaptureMarkers) -> Vec<(SinkId, CaptureTally)>;
}

/// Swallow markers shared with other operations on the same particles.
pub trait CaptureMarkers {
    fn clear(&mut self);

    /// Marks `particle` for `sink`. A particle claimed by several sinks
    /// goes to the highest identity. Returns whether `sink` holds the mark.
    fn mark(&mut self, particle: usize, sink: SinkId) -> bool;

    fn marked_by(&self, particle: usize) -> Option<SinkId>;

    fn marked_count(&self) -> usize;
}

/// One optional marker per particle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerField {
    markers: Vec<Option<SinkId>>,
}

impl MarkerField {
    pub fn new(particle_count: usize) -> Self {
        Self {
            markers: vec![None; particle_count],
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl CaptureMarkers for MarkerField {
    fn clear(&mut self) {
        self.markers.iter_mut().for_each(|m| *m = None);
    }

    fn mark(&mut self, particle: usize, sink: SinkId) -> bool {
        match self.markers.get_mut(particle) {
            Some(slot) => {
                if slot.map_or(true, |holder| holder < sink) {
                    *slot = Some(sink);
                }
                *slot == Some(sink)
            }
            None => false,
        }
    }

    fn marked_by(&self, particle: usize) -> Option<SinkId> {
        self.markers.get(particle).copied().flatten()
    }

    fn marked_count(&self) -> usize {
        self.markers.iter().filter(|m| m.is_some()).count()
    }
}
