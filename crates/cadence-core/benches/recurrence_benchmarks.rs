use cadence_core::models::{CalendarEvent, RecurrenceException};
use cadence_core::recurrence::{EngineKind, ExpansionConfig, RecurrenceManager};
use cadence_core::{apply_exceptions, RuleDescriptor};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

fn manager(engine: EngineKind) -> RecurrenceManager {
    RecurrenceManager::new(ExpansionConfig {
        engine,
        ..Default::default()
    })
}

fn bench_rule_parsing(c: &mut Criterion) {
    let text = "FREQ=MONTHLY;INTERVAL=2;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1;COUNT=24";

    c.bench_function("rule_parsing", |b| {
        b.iter(|| black_box(text).parse::<RuleDescriptor>().unwrap())
    });
}

fn bench_occurrence_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("occurrence_generation");
    let rules = [
        ("daily", "FREQ=DAILY"),
        ("weekdays", "FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR"),
        ("last_weekday", "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1"),
    ];

    for engine in [EngineKind::Native, EngineKind::Rrule] {
        let manager = manager(engine);
        for (name, text) in rules {
            let rule: RuleDescriptor = text.parse().unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("{engine:?}"), name),
                &rule,
                |b, rule| {
                    b.iter(|| {
                        manager
                            .occurrences_between(
                                black_box(rule),
                                at(2024, 1, 1),
                                at(2024, 1, 1),
                                at(2025, 1, 1),
                            )
                            .unwrap()
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_far_window(c: &mut Criterion) {
    let manager = manager(EngineKind::Native);
    let open: RuleDescriptor = "FREQ=DAILY".parse().unwrap();
    let counted: RuleDescriptor = "FREQ=DAILY;COUNT=5000".parse().unwrap();

    c.bench_function("far_window_seek", |b| {
        b.iter(|| {
            manager
                .occurrences_between(
                    black_box(&open),
                    at(2000, 1, 1),
                    at(2010, 6, 1),
                    at(2010, 7, 1),
                )
                .unwrap()
        })
    });
    c.bench_function("far_window_count_walk", |b| {
        b.iter(|| {
            manager
                .occurrences_between(
                    black_box(&counted),
                    at(2000, 1, 1),
                    at(2010, 6, 1),
                    at(2010, 7, 1),
                )
                .unwrap()
        })
    });
}

fn bench_exception_overlay(c: &mut Criterion) {
    let mut group = c.benchmark_group("exception_overlay");

    for size in [10usize, 100, 1000] {
        let event =
            CalendarEvent::new("Bench", at(2024, 1, 1), at(2024, 1, 1) + Duration::hours(1));
        let occurrences: Vec<CalendarEvent> = (0..size as i64)
            .map(|i| {
                let mut occurrence = event.clone();
                occurrence.start += Duration::days(i);
                occurrence.end += Duration::days(i);
                occurrence
            })
            .collect();
        let exceptions: Vec<RecurrenceException<CalendarEvent>> = (0..size as i64)
            .step_by(3)
            .map(|i| RecurrenceException::Deleted {
                original_date: (at(2024, 1, 1) + Duration::days(i)).date(),
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| apply_exceptions(black_box(occurrences.clone()), black_box(&exceptions)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_rule_parsing,
    bench_occurrence_generation,
    bench_far_window,
    bench_exception_overlay
);
criterion_main!(benches);
