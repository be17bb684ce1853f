//! Property-based tests for the scheduler crate.

use quickcheck_macros::quickcheck;
use rtperiod_scheduler::{
    ReleaseSchedule, SchedPolicy, TaskId, TimingRecord, Timespec, rate_monotonic_priorities,
    sort_by_completion,
};

const MAX_PERIOD_US: u64 = 10_000_000;

fn start_from(sec: u32, nsec: u32) -> Timespec {
    Timespec::new(i64::from(sec), i64::from(nsec % 1_000_000_000)).unwrap_or(Timespec::ZERO)
}

#[quickcheck]
fn add_micros_keeps_nanoseconds_normalized(sec: u32, nsec: u32, us: u64) -> bool {
    let start = start_from(sec, nsec);
    match start.add_micros(us % (1u64 << 40)) {
        Ok(t) => (0..1_000_000_000).contains(&t.nsec()) && t >= start,
        Err(_) => false,
    }
}

#[quickcheck]
fn add_then_elapsed_round_trips(sec: u32, nsec: u32, us: u64) -> bool {
    let start = start_from(sec, nsec);
    let us = us % (1u64 << 40);
    start
        .add_micros(us)
        .and_then(|end| Timespec::elapsed_micros(start, end))
        .is_ok_and(|elapsed| elapsed == us)
}

#[quickcheck]
fn elapsed_rejects_reversed_intervals(a: u32, b: u32) -> bool {
    let (x, y) = (Timespec::from_micros(i64::from(a)), Timespec::from_micros(i64::from(b)));
    match Timespec::elapsed_micros(x, y) {
        Ok(_) => y >= x,
        Err(_) => y < x,
    }
}

#[quickcheck]
fn compare_agrees_with_micros(a: i32, b: i32) -> bool {
    let (x, y) = (
        Timespec::from_micros(i64::from(a)),
        Timespec::from_micros(i64::from(b)),
    );
    Timespec::compare(&x, &y) == a.cmp(&b) && x.as_micros() == i64::from(a)
}

#[quickcheck]
fn releases_never_drift(sec: u32, nsec: u32, period: u64, steps: u16) -> bool {
    let period_us = period % MAX_PERIOD_US + 1;
    let Ok(mut schedule) = ReleaseSchedule::new(start_from(sec, nsec), period_us) else {
        return false;
    };
    let first = schedule.first();

    (0..u64::from(steps % 2_000)).all(|i| {
        let Ok(release) = schedule.advance() else {
            return false;
        };
        let expected = i
            .checked_mul(period_us)
            .and_then(|offset| first.add_micros(offset).ok());
        expected == Some(release) && schedule.released() == i + 1
    })
}

#[quickcheck]
fn sort_is_a_total_order_permutation(completions: Vec<(i16, u8)>) -> bool {
    let records: Vec<TimingRecord> = completions
        .iter()
        .map(|&(completion, id)| TimingRecord {
            completion_us: i64::from(completion),
            ..TimingRecord::new(TaskId(u32::from(id)))
        })
        .collect();
    let sorted = sort_by_completion(&records);

    let ordered = sorted
        .windows(2)
        .all(|w| matches!(w, [a, b] if (a.completion_us, a.task_id) <= (b.completion_us, b.task_id)));

    let mut before: Vec<(i64, u32)> = records.iter().map(|r| (r.completion_us, r.task_id.0)).collect();
    let mut after: Vec<(i64, u32)> = sorted.iter().map(|r| (r.completion_us, r.task_id.0)).collect();
    before.sort_unstable();
    after.sort_unstable();

    ordered && before == after
}

#[quickcheck]
fn rate_monotonic_priorities_are_valid(periods: Vec<u16>) -> bool {
    let periods: Vec<u64> = periods.into_iter().map(|p| u64::from(p) + 1).collect();
    let priorities = rate_monotonic_priorities(&periods, SchedPolicy::Fifo);

    let in_range = priorities.iter().all(|p| (1..=99).contains(p));
    let monotone = periods.iter().zip(&priorities).all(|(pa, qa)| {
        periods
            .iter()
            .zip(&priorities)
            .all(|(pb, qb)| pa >= pb || qa >= qb)
    });
    priorities.len() == periods.len() && in_range && monotone
}
