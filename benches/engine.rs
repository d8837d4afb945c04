use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use smokecheck::{
    AtmosphericStability, BurnIntensity, BurnRequest, EmbeddingGenerator, EngineConfig, FuelType,
    GeoPoint, InMemoryVectorStore, PlumeModel, SmokeEngine, TimeRange, WeatherObservation,
};

fn weather(wind: f64) -> WeatherObservation {
    WeatherObservation::builder()
        .temperature(22.0)
        .humidity(55.0)
        .wind_speed(wind)
        .wind_direction(270.0)
        .atmospheric_stability(AtmosphericStability::Neutral)
        .build()
        .unwrap()
}

fn burn(i: u32) -> BurnRequest {
    let start = Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap()
        + Duration::minutes(i64::from(i % 240));
    let fuel = FuelType::KNOWN[(i as usize) % FuelType::KNOWN.len()].clone();
    BurnRequest::builder()
        .acreage(20.0 + f64::from(i % 50) * 10.0)
        .fuel_type(fuel)
        .intensity(BurnIntensity::ALL[(i as usize) % 3])
        .window(TimeRange::starting_for(start, Duration::hours(4)).unwrap())
        .location(GeoPoint::new(38.5 + f64::from(i % 20) * 0.01, -121.7).unwrap())
        .build()
        .unwrap()
}

fn bench_plume(c: &mut Criterion) {
    let model = PlumeModel::default();
    let b = burn(0);
    let w = weather(5.0);
    c.bench_function("plume/compute", |bench| {
        bench.iter(|| model.compute(black_box(&b), black_box(&w)).unwrap());
    });
}

fn bench_embeddings(c: &mut Criterion) {
    let generator = EmbeddingGenerator::default();
    let b = burn(0);
    let w = weather(5.0);
    let plume = PlumeModel::default().compute(&b, &w).unwrap();

    let mut group = c.benchmark_group("embedding");
    group.bench_function("weather", |bench| {
        bench.iter(|| generator.weather_vector(black_box(&w)).unwrap());
    });
    group.bench_function("smoke", |bench| {
        bench.iter(|| generator.smoke_vector(black_box(&b), &w, &plume).unwrap());
    });
    group.bench_function("burn", |bench| {
        bench.iter(|| generator.burn_vector(black_box(&b)).unwrap());
    });
    group.finish();
}

fn bench_assess(c: &mut Criterion) {
    // 512 registered burns so conflict search measures realistic work.
    let engine = SmokeEngine::new(InMemoryVectorStore::new(), EngineConfig::default()).unwrap();
    let w = weather(8.0);
    for i in 0..512 {
        engine.register_burn(&burn(i), &w).unwrap();
    }

    let probe = burn(10_000);
    c.bench_function("engine/assess_burn_512", |bench| {
        bench.iter(|| engine.assess_burn(black_box(&probe), &w).unwrap());
    });

    let batch: Vec<_> = (0..64).map(|i| (burn(20_000 + i), w.clone())).collect();
    let mut group = c.benchmark_group("engine/assess_many");
    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("64", |bench| {
        bench.iter(|| engine.assess_many(black_box(&batch)));
    });
    group.finish();
}

criterion_group!(benches, bench_plume, bench_embeddings, bench_assess);
criterion_main!(benches);
