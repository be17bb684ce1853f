//! Benchmarks for the scheduler crate.

use criterion::{Criterion, criterion_group, criterion_main};
use rtperiod_scheduler::{
    ClockId, ReleaseSchedule, TaskId, TimingRecord, Timespec, clock, sort_by_completion,
};
use std::hint::black_box;

fn bench_add_micros(c: &mut Criterion) {
    let ts = Timespec::from_micros(1_700_000_000_999_000);

    c.bench_function("timespec_add_micros", |b| {
        b.iter(|| black_box(black_box(ts).add_micros(black_box(2_500_000))));
    });
}

fn bench_elapsed_micros(c: &mut Criterion) {
    let start = Timespec::from_micros(1_000_999_999);
    let end = Timespec::from_micros(1_003_000_001);

    c.bench_function("timespec_elapsed_micros", |b| {
        b.iter(|| black_box(Timespec::elapsed_micros(black_box(start), black_box(end))));
    });
}

fn bench_release_advance(c: &mut Criterion) {
    let start = Timespec::from_micros(0);
    let mut schedule = match ReleaseSchedule::new(start, 10_000) {
        Ok(schedule) => schedule,
        Err(e) => panic!("release schedule: {e}"),
    };

    c.bench_function("release_schedule_advance", |b| {
        b.iter(|| black_box(schedule.advance()));
    });
}

fn bench_clock_reads(c: &mut Criterion) {
    c.bench_function("clock_now_monotonic", |b| {
        b.iter(|| black_box(clock::now(ClockId::Monotonic)));
    });

    c.bench_function("clock_now_thread_cpu", |b| {
        b.iter(|| black_box(clock::now(ClockId::ThreadCpuTime)));
    });
}

fn bench_sort_by_completion(c: &mut Criterion) {
    let records: Vec<TimingRecord> = (0..64u32)
        .map(|id| TimingRecord {
            completion_us: i64::from((id * 7_919) % 101),
            ..TimingRecord::new(TaskId(id))
        })
        .collect();

    c.bench_function("sort_by_completion_64", |b| {
        b.iter(|| black_box(sort_by_completion(black_box(&records))));
    });
}

criterion_group!(
    benches,
    bench_add_micros,
    bench_elapsed_micros,
    bench_release_advance,
    bench_clock_reads,
    bench_sort_by_completion,
);

criterion_main!(benches);
