use criterion::{criterion_group, criterion_main, Criterion};
use simulacovid::config::SimulationConfig;
use simulacovid::rates::NullRateObserver;
use simulacovid::{BoundPair, ModelVariant, PlaceSeverityProfile, PopulationObservation, ScenarioRunner};
use std::hint::black_box;

static OBSERVATION: PopulationObservation = PopulationObservation {
    total_population: 12_000_000,
    active_infected: 25_000.0,
    deaths: 900,
    recovered: 40_000.0,
};

static PROFILE: PlaceSeverityProfile = PlaceSeverityProfile {
    asymptomatic: 0.4,
    mild: 0.4,
    severe: 0.15,
    critical: 0.05,
    fatality_ratio: 0.02,
    nosocomial_proportion: None,
};

fn project(model: ModelVariant, parallel: bool) {
    let config = SimulationConfig {
        model,
        ..SimulationConfig::default()
    };
    let results = ScenarioRunner::new(&config)
        .with_observer(&NullRateObserver)
        .parallel(parallel)
        .run_bounds(&OBSERVATION, &PROFILE, BoundPair::new(1.1, 1.5))
        .expect("projection failed");
    black_box(results);
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("projection SEAPMDR", |bencher| {
        bencher.iter(|| project(ModelVariant::Extended, false));
    });
    c.bench_function("projection SEIR", |bencher| {
        bencher.iter(|| project(ModelVariant::Core, false));
    });
    c.bench_function("projection SEAPMDR parallel", |bencher| {
        bencher.iter(|| project(ModelVariant::Extended, true));
    });
}

criterion_group!(projection_benches, criterion_benchmark);
criterion_main!(projection_benches);
