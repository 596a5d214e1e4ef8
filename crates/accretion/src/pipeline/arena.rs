//! Per-step working storage for active sinks.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use units::Cosmology;

use crate::aggregate::{BulgeSums, CaptureTally, Environment, KernelSums};
use crate::closure::ClosureOutcome;
use crate::config::FrictionMass;
use crate::growth::advance_masses;
use crate::sink::{Sink, SinkId};

#[derive(Debug, Clone, PartialEq)]
enum Aggregate {
    Raw(KernelSums),
    Normalized(Environment),
}

/// Everything the pipeline tracks for one active sink during one step.
#[derive(Debug, Clone)]
pub struct SinkWorkspace {
    id: SinkId,
    aggregate: Aggregate,
    outcome: ClosureOutcome,
    tally: CaptureTally,
    masses_advanced: bool,
}

impl SinkWorkspace {
    fn new(id: SinkId) -> Self {
        Self {
            id,
            aggregate: Aggregate::Raw(KernelSums::default()),
            outcome: ClosureOutcome::default(),
            tally: CaptureTally::default(),
            masses_advanced: false,
        }
    }

    pub fn id(&self) -> SinkId {
        self.id
    }

    /// The normalized environment, once the first pass has been reduced.
    pub fn environment(&self) -> Option<&Environment> {
        match &self.aggregate {
            Aggregate::Normalized(env) => Some(env),
            Aggregate::Raw(_) => None,
        }
    }

    pub fn outcome(&self) -> &ClosureOutcome {
        &self.outcome
    }

    pub fn tally(&self) -> &CaptureTally {
        &self.tally
    }

    pub fn masses_advanced(&self) -> bool {
        self.masses_advanced
    }

    fn merge_sums(&mut self, sums: &KernelSums) -> bool {
        match &mut self.aggregate {
            Aggregate::Raw(raw) => {
                raw.merge(sums);
                true
            }
            Aggregate::Normalized(_) => false,
        }
    }

    fn merge_bulge(&mut self, bulge: &BulgeSums) -> bool {
        match &mut self.aggregate {
            Aggregate::Normalized(env) => {
                env.bulge.merge(bulge);
                true
            }
            Aggregate::Raw(_) => false,
        }
    }

    /// Normalizes the reduced sums. A second call is a no-op.
    pub fn normalize(&mut self, friction: Option<FrictionMass>, cosmology: &Cosmology) {
        if let Aggregate::Raw(raw) = &mut self.aggregate {
            let sums = std::mem::take(raw);
            self.aggregate = Aggregate::Normalized(sums.normalize(friction, cosmology));
        }
    }

    /// Records the closure outcome and integrates the sink's masses.
    ///
    /// Returns false without touching the sink if the masses were already
    /// advanced this step.
    pub fn advance(&mut self, sink: &mut Sink, outcome: ClosureOutcome, dt: f64) -> bool {
        if self.masses_advanced {
            log::warn!("sink {}: masses already advanced this step", self.id.0);
            return false;
        }
        self.outcome = outcome;
        advance_masses(sink, &outcome, dt);
        self.masses_advanced = true;
        true
    }
}

/// Workspaces of the active sinks, keyed by identity.
///
/// Slots keep the order the sinks were allocated in.
#[derive(Debug, Default)]
pub struct SinkArena {
    slots: Vec<SinkWorkspace>,
    index: HashMap<SinkId, usize>,
}

impl SinkArena {
    /// One slot per distinct identity. Repeated ids keep their first slot.
    pub fn allocate(ids: impl IntoIterator<Item = SinkId>) -> Self {
        let mut slots = Vec::new();
        let mut index = HashMap::new();
        for id in ids {
            match index.entry(id) {
                Entry::Occupied(_) => {
                    log::warn!("sink {} allocated twice, keeping the first slot", id.0);
                }
                Entry::Vacant(entry) => {
                    entry.insert(slots.len());
                    slots.push(SinkWorkspace::new(id));
                }
            }
        }
        Self { slots, index }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: SinkId) -> Option<&SinkWorkspace> {
        self.index.get(&id).map(|&i| &self.slots[i])
    }

    pub fn environment(&self, id: SinkId) -> Option<&Environment> {
        self.get(id).and_then(SinkWorkspace::environment)
    }

    pub fn slots(&self) -> &[SinkWorkspace] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [SinkWorkspace] {
        &mut self.slots
    }

    fn slot_mut(&mut self, id: SinkId) -> Option<&mut SinkWorkspace> {
        match self.index.get(&id) {
            Some(&i) => Some(&mut self.slots[i]),
            None => None,
        }
    }

    /// Adds a partial first-pass contribution. Returns false for unknown
    /// sinks or once the slot has been normalized.
    pub fn merge_sums(&mut self, id: SinkId, sums: &KernelSums) -> bool {
        let merged = self.slot_mut(id).is_some_and(|slot| slot.merge_sums(sums));
        if !merged {
            log::warn!("dropped kernel sums for sink {}", id.0);
        }
        merged
    }

    /// Adds a partial bulge contribution. Only accepted after normalization.
    pub fn merge_bulge(&mut self, id: SinkId, bulge: &BulgeSums) -> bool {
        let merged = self.slot_mut(id).is_some_and(|slot| slot.merge_bulge(bulge));
        if !merged {
            log::warn!("dropped bulge sums for sink {}", id.0);
        }
        merged
    }

    pub fn merge_tally(&mut self, id: SinkId, tally: &CaptureTally) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.tally.merge(tally);
                true
            }
            None => {
                log::warn!("dropped capture tally for inactive sink {}", id.0);
                false
            }
        }
    }

    pub fn normalize_all(&mut self, friction: Option<FrictionMass>, cosmology: &Cosmology) {
        for slot in &mut self.slots {
            slot.normalize(friction, cosmology);
        }
    }

    /// Number of slots whose masses were integrated this step.
    pub fn advanced_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.masses_advanced).count()
    }
}
