use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use paddock::analysis::{format_lap_time, lap_times, pit_stops, sort_by_position};
use paddock::api::{DriverStanding, Lap, PitStop, Timing};
use std::time::Duration;

const DRIVERS: [&str; 20] = [
    "albon", "alonso", "bottas", "gasly", "hamilton", "hulkenberg", "leclerc", "magnussen",
    "norris", "ocon", "perez", "piastri", "russell", "sainz", "sargeant", "stroll", "tsunoda",
    "max_verstappen", "zhou", "ricciardo",
];

fn create_sample_laps(laps: usize) -> Vec<Lap> {
    (1..=laps)
        .map(|lap| Lap {
            number: lap.to_string(),
            timings: DRIVERS
                .iter()
                .enumerate()
                .map(|(position, driver)| Timing {
                    driver_id: driver.to_string(),
                    position: (position + 1).to_string(),
                    time: format_lap_time(92.0 + position as f64 * 0.15 + (lap % 7) as f64 * 0.08),
                })
                .collect(),
        })
        .collect()
}

fn create_sample_stops() -> Vec<PitStop> {
    DRIVERS
        .iter()
        .enumerate()
        .flat_map(|(n, driver)| {
            (1..=3).map(move |stop| PitStop {
                driver_id: driver.to_string(),
                lap: (stop * 18 + n % 4).to_string(),
                stop: stop.to_string(),
                time: "15:20:41".to_string(),
                duration: format!("{:.3}", 21.5 + n as f64 * 0.11 + stop as f64 * 0.2),
            })
        })
        .collect()
}

fn bench_lap_time_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("lap_time_analysis");

    for laps in [10, 57, 78] {
        let sample = create_sample_laps(laps);
        group.bench_with_input(BenchmarkId::from_parameter(laps), &sample, |b, sample| {
            b.iter(|| black_box(lap_times::analyze(black_box(sample))));
        });
    }

    group.bench_function("parse_lap_time", |b| {
        b.iter(|| black_box(lap_times::parse_lap_time(black_box("1:32.456"))));
    });

    group.finish();
}

fn bench_pit_stop_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("pit_stop_analysis");
    let stops = create_sample_stops();

    group.bench_function("analyze_race", |b| {
        b.iter(|| black_box(pit_stops::analyze(black_box(&stops))));
    });

    group.finish();
}

fn bench_standings_sort(c: &mut Criterion) {
    let standings: Vec<DriverStanding> = DRIVERS
        .iter()
        .enumerate()
        .rev()
        .map(|(position, _)| DriverStanding {
            position: (position + 1).to_string(),
            points: ((20 - position) * 12).to_string(),
            ..Default::default()
        })
        .collect();

    c.bench_function("sort_driver_standings", |b| {
        b.iter(|| black_box(sort_by_position(black_box(&standings))));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = bench_lap_time_analysis, bench_pit_stop_analysis, bench_standings_sort
}
criterion_main!(benches);
