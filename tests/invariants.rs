//! End-to-end invariants from `spec.md` §8, exercised through the public
//! `optimize`/`execute` API against a real (if scaled-down) workload rather
//! than synthetic `SampleReport`s. Complements the per-module unit tests,
//! which already cover the six concrete scenarios against the cost model in
//! isolation (`src/cost_model/test.rs`).
//!
//! These assertions are written to hold on any host: they check structural
//! invariants (bounds, serial/speedup implications, reconstruction) rather
//! than exact worker counts, which depend on the machine running the suite.

use perfopt::{execute, optimize, Data, Options};

fn testing_options() -> Options {
    std::env::set_var("PERFOPT_TESTING_MODE", "1");
    Options::builder().measure_spawn(false).build()
}

fn cpu_light(x: u32) -> u32 {
    // A handful of microseconds of real work, not a no-op: the dry-run's
    // `avg_item_time_s` must be positive for the cost model to reason about it.
    let mut acc = x;
    for _ in 0..200 {
        acc = acc.wrapping_mul(2654435761).wrapping_add(1);
    }
    acc
}

#[test]
fn universal_invariants_hold_for_a_real_batch() {
    let opts = testing_options();
    let data: Data<u32> = Data::Finite((0..5_000).collect());
    let (decision, reconstructed) = optimize(&cpu_light, data, &opts).unwrap();

    let max_workers = decision.snapshot.physical_cores.saturating_mul(2).max(1);
    assert!(decision.n_workers >= 1 && decision.n_workers <= max_workers);
    assert!(decision.chunksize >= 1);

    if let Some(m) = reconstructed.len() {
        let cap = (m as f64 / decision.n_workers as f64).ceil().max(1.0) as usize;
        assert!(decision.chunksize <= cap.max(1));
    }

    if decision.n_workers == 1 {
        assert_eq!(decision.executor_kind, perfopt::cost_model::ExecutorKind::Serial);
        assert!(decision.estimated_speedup >= 0.0 && decision.estimated_speedup <= 1.0 + 1e-9);
    }

    assert!(decision.estimated_speedup <= decision.n_workers as f64 + 1e-9);
}

#[test]
fn lazy_source_round_trips_exactly_once_in_order() {
    let opts = testing_options();
    let data: Data<u32> = Data::lazy(0..500);
    let (_decision, reconstructed) = optimize(&cpu_light, data, &opts).unwrap();

    let items: Vec<u32> = match reconstructed {
        Data::Lazy(iter) => iter.collect(),
        Data::Finite(v) => v,
    };
    assert_eq!(items, (0..500).collect::<Vec<_>>());
}

#[test]
fn fixed_snapshot_yields_deterministic_decision_shape() {
    perfopt::profiler::reset_cache();
    let opts = testing_options();
    let snap = perfopt::profiler::snapshot(&opts);

    let data1: Data<u32> = Data::Finite((0..3_000).collect());
    let (d1, _) = optimize(&cpu_light, data1, &opts).unwrap();

    let data2: Data<u32> = Data::Finite((0..3_000).collect());
    let (d2, _) = optimize(&cpu_light, data2, &opts).unwrap();

    assert_eq!(d1.snapshot.physical_cores, snap.physical_cores);
    assert_eq!(d1.n_workers, d2.n_workers);
    assert_eq!(d1.chunksize, d2.chunksize);
    assert_eq!(d1.executor_kind, d2.executor_kind);
}

#[test]
fn profiler_cache_is_idempotent_after_first_measurement() {
    perfopt::profiler::reset_cache();
    let opts = testing_options();

    let _first = perfopt::profiler::snapshot(&opts);

    let start = std::time::Instant::now();
    let _second = perfopt::profiler::snapshot(&opts);
    assert!(
        start.elapsed() < std::time::Duration::from_millis(5),
        "cached snapshot lookup should be near-instant"
    );
}

#[test]
fn empty_workload_yields_unit_speedup_serial_decision() {
    let opts = testing_options();
    let data: Data<u32> = Data::Finite(vec![]);
    let (decision, reconstructed) = optimize(&cpu_light, data, &opts).unwrap();

    assert_eq!(decision.n_workers, 1);
    assert_eq!(decision.executor_kind, perfopt::cost_model::ExecutorKind::Serial);
    assert_eq!(decision.estimated_speedup, 1.0);
    assert!(decision.reasons.iter().any(|r| r == "empty_workload"));
    assert!(reconstructed.is_empty());
}

#[test]
fn execute_actually_runs_f_over_every_item_in_order() {
    let opts = testing_options();
    let data: Data<u32> = Data::Finite((0..1_000).collect());
    let results = execute(cpu_light, data, &opts).unwrap();

    let expected: Vec<u32> = (0..1_000).map(cpu_light).collect();
    assert_eq!(results, expected);
}
