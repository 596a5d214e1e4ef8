//! Property tests for the rate and mass invariants.

use accretion::aggregate::{CaptureTally, KernelSums};
use accretion::capture::CaptureTest;
use accretion::closure::{eddington_rate, ClosureEvaluator};
use accretion::config::{
    AccretionConfig, AccretionModel, BondiVariant, ReservoirConfig, TorqueVariant,
};
use accretion::finalize::Finalizer;
use accretion::growth::advance_masses;
use accretion::sink::{CaptureCandidate, NeighborSample, ParticleKind, Sink, SinkId};
use nalgebra::{Point3, Vector3};
use proptest::prelude::*;
use units::Cosmology;

const MODELS: [AccretionModel; 7] = [
    AccretionModel::Torque(TorqueVariant::AngularMomentum),
    AccretionModel::Torque(TorqueVariant::Kinematic),
    AccretionModel::Torque(TorqueVariant::GravitoTurbulent),
    AccretionModel::Torque(TorqueVariant::FreeFall),
    AccretionModel::Bondi(BondiVariant::Classic),
    AccretionModel::Bondi(BondiVariant::RelativeVelocity),
    AccretionModel::GravitationalCapture,
];

fn kind_strategy() -> impl Strategy<Value = ParticleKind> {
    prop_oneof![
        Just(ParticleKind::Gas),
        Just(ParticleKind::DarkMatter),
        Just(ParticleKind::DiskStar),
        Just(ParticleKind::BulgeStar),
    ]
}

fn sample_strategy() -> impl Strategy<Value = NeighborSample> {
    (
        kind_strategy(),
        0.0f64..1.0e-2,
        prop::array::uniform3(-0.1f64..0.1),
        prop::array::uniform3(-500.0f64..500.0),
        0.0f64..1.0e4,
    )
        .prop_map(|(kind, mass, offset, velocity, u)| NeighborSample {
            kind,
            mass,
            offset: Vector3::from(offset),
            relative_velocity: Vector3::from(velocity),
            internal_energy: if kind == ParticleKind::Gas { u } else { 0.0 },
        })
}

fn make_sink(mass: f64, reservoir: f64, density: f64) -> Sink {
    Sink::new(SinkId(5), Point3::origin(), Vector3::zeros(), mass)
        .with_kernel_radius(0.1)
        .with_ambient_density(density)
        .with_reservoir(reservoir)
}

proptest! {
    #[test]
    fn rates_are_finite_and_non_negative(
        samples in prop::collection::vec(sample_strategy(), 0..12),
        model_index in 0usize..MODELS.len(),
        mass in 0.0f64..1.0,
        reservoir in 0.0f64..1.0,
        density in 0.0f64..10.0,
        dt in 0.0f64..1.0e-2,
        with_reservoir in any::<bool>(),
    ) {
        let config = AccretionConfig {
            model: MODELS[model_index],
            disk_reservoir: with_reservoir.then(ReservoirConfig::default),
            ..Default::default()
        };
        let mut sums = KernelSums::default();
        for s in &samples {
            sums.accumulate(s, None);
        }
        let env = sums.normalize(None, &Cosmology::static_space());
        let sink = make_sink(mass, reservoir, density);

        let outcome = ClosureEvaluator::new(&config, Cosmology::static_space(), 0.3)
            .compute_accretion_rate(&env, &sink, dt);

        prop_assert!(outcome.mdot.is_finite());
        prop_assert!(outcome.mdot >= 0.0);
        if let Some(supply) = outcome.supply {
            prop_assert!(supply.is_finite() && supply >= 0.0);
        }
    }

    #[test]
    fn eddington_cap_is_respected(
        gas_mass in 1.0e-6f64..1.0e-1,
        u in 1.0f64..1.0e4,
        mass in 1.0e-6f64..1.0,
        density in 1.0e-4f64..1.0e3,
        multiplier in 0.1f64..10.0,
    ) {
        let config = AccretionConfig {
            model: AccretionModel::Bondi(BondiVariant::Classic),
            eddington_cap: Some(multiplier),
            ..Default::default()
        };
        let mut sums = KernelSums::default();
        sums.accumulate(
            &NeighborSample {
                kind: ParticleKind::Gas,
                mass: gas_mass,
                offset: Vector3::new(0.01, 0.0, 0.0),
                relative_velocity: Vector3::zeros(),
                internal_energy: u,
            },
            None,
        );
        let env = sums.normalize(None, &Cosmology::static_space());

        let mdot = ClosureEvaluator::new(&config, Cosmology::static_space(), 0.0)
            .compute_accretion_rate(&env, &make_sink(mass, 0.0, density), 1.0e-4)
            .mdot;

        prop_assert!(mdot <= multiplier * eddington_rate(&config, mass) * (1.0 + 1e-12));
    }

    #[test]
    fn masses_stay_non_negative_after_finalization(
        mass in 0.0f64..1.0,
        dynamical_extra in 0.0f64..1.0,
        reservoir in 0.0f64..1.0,
        mdot in 0.0f64..100.0,
        supply in 0.0f64..100.0,
        dt in 0.0f64..1.0,
        captured in 0.0f64..1.0e-2,
    ) {
        let config = AccretionConfig {
            disk_reservoir: Some(ReservoirConfig::default()),
            ..Default::default()
        };
        let mut sink = make_sink(mass, reservoir, 1.0);
        sink.dynamical_mass = mass + dynamical_extra;

        let outcome = accretion::closure::ClosureOutcome {
            mdot,
            supply: Some(supply),
        };
        advance_masses(&mut sink, &outcome, dt);
        let mut tally = CaptureTally::default();
        tally.add(captured, 0.0, Vector3::new(captured, 0.0, 0.0));
        let env = KernelSums::default().normalize(None, &Cosmology::static_space());
        Finalizer::new(&config, Cosmology::static_space(), 0.0)
            .finalize(&mut sink, &env, &tally, Some(supply), dt);

        prop_assert!(sink.mass >= 0.0);
        prop_assert!(sink.dynamical_mass >= 0.0);
        prop_assert!(sink.reservoir_mass >= 0.0);
    }

    #[test]
    fn neighbor_at_sink_position_is_captured(
        sink_mass in 1.0e-8f64..1.0,
        neighbor_mass in 0.0f64..1.0e-2,
        kind in kind_strategy(),
        restricted in any::<bool>(),
    ) {
        let mut config = AccretionConfig::default();
        config.capture.restricted = restricted;
        let test = CaptureTest::new(&config, Cosmology::static_space());
        let candidate = match kind {
            ParticleKind::Gas => CaptureCandidate::gas(neighbor_mass, 1.0, 0.0, 1.0e-3),
            other => CaptureCandidate::collisionless(other, neighbor_mass),
        };

        let sink = make_sink(sink_mass, 0.0, 0.0);
        prop_assert!(test.captures(&sink, &candidate, 0.0, 0.0));
    }
}
