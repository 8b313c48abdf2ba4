use super::*;
use crate::dryrun::{SampleReport, WorkloadKind};
use crate::profiler::{MeasurementQuality, QualityReport, StartMethod, SystemSnapshot};

fn snapshot() -> SystemSnapshot {
    SystemSnapshot {
        physical_cores: 4,
        logical_cores: 8,
        available_memory_bytes: 8 * 1024 * 1024 * 1024,
        start_method: StartMethod::Fork,
        spawn_cost_s: 0.015,
        chunk_overhead_s: 0.0005,
        measurement_quality: QualityReport {
            spawn: MeasurementQuality::Ok,
            chunk: MeasurementQuality::Ok,
        },
    }
}

fn report(avg_item_time_s: f64, workload_kind: WorkloadKind, cpu_utilization_fraction: f64) -> SampleReport {
    SampleReport {
        sample_size: 5,
        avg_item_time_s,
        item_time_cv: 0.0,
        avg_input_serialize_s: 0.0001,
        avg_output_serialize_s: 0.0001,
        avg_input_bytes: 16.0,
        avg_output_bytes: 16.0,
        cpu_utilization_fraction,
        peak_memory_bytes: 0,
        workload_kind,
        f_is_picklable: true,
        items_picklable: true,
        sampling_failed: None,
        slow_items: Vec::new(),
    }
}

#[test]
fn cpu_heavy_large_batch_routes_to_process_with_roughly_four_workers() {
    let snap = snapshot();
    let rep = report(0.100, WorkloadKind::CpuBound, 0.95);
    let plan = choose(&snap, &rep, Some(10_000), 0.8, 1.2, true, &CostModelOptions::default());

    assert_eq!(plan.executor_kind, ExecutorKind::Process);
    assert_eq!(plan.n_workers, 4);
    assert!(plan.chunksize <= 3 && plan.chunksize >= 1, "chunksize was {}", plan.chunksize);
    assert!(
        plan.estimated_speedup >= 3.0 && plan.estimated_speedup <= 4.0,
        "speedup was {}",
        plan.estimated_speedup
    );
}

#[test]
fn trivial_work_falls_back_to_serial() {
    let snap = snapshot();
    // F(x) = x + 1 on plain integers: sub-microsecond per item.
    let rep = report(0.0000005, WorkloadKind::CpuBound, 0.9);
    let plan = choose(&snap, &rep, Some(10_000), 0.8, 1.2, true, &CostModelOptions::default());

    assert_eq!(plan.executor_kind, ExecutorKind::Serial);
    assert_eq!(plan.n_workers, 1);
    assert!(plan.estimated_speedup <= 1.0);
}

#[test]
fn io_bound_routes_to_thread_executor() {
    let snap = snapshot();
    let rep = report(0.050, WorkloadKind::IoBound, 0.05);
    let plan = choose(&snap, &rep, Some(500), 0.8, 1.2, true, &CostModelOptions::default());

    assert_eq!(plan.executor_kind, ExecutorKind::Thread);
    assert!(plan.n_workers >= 4, "n_workers was {}", plan.n_workers);
    assert!(plan.estimated_speedup >= 3.5, "speedup was {}", plan.estimated_speedup);
}

#[test]
fn unpicklable_function_never_routes_to_process() {
    let snap = snapshot();
    let mut rep = report(0.050, WorkloadKind::CpuBound, 0.95);
    rep.f_is_picklable = false;
    let plan = choose(&snap, &rep, Some(1_000), 0.8, 1.2, true, &CostModelOptions::default());

    assert_ne!(plan.executor_kind, ExecutorKind::Process);
    assert!(plan.warnings.iter().any(|w| w.contains("not picklable")));
}

#[test]
fn heterogeneous_cv_shrinks_chunksize_below_baseline() {
    let t = 0.04; // baseline = round(0.2/0.04) = 5
    let baseline = base_chunksize(t, 0.0);
    assert_eq!(baseline, 5);

    let shrunk = base_chunksize(t, 2.5);
    assert!(shrunk < baseline, "shrunk={} baseline={}", shrunk, baseline);
}

#[test]
fn empty_workload_is_serial_with_speedup_one() {
    let snap = snapshot();
    let rep = report(0.0, WorkloadKind::Mixed, 0.5);
    let plan = choose(&snap, &rep, Some(0), 0.8, 1.2, true, &CostModelOptions::default());

    assert_eq!(plan.n_workers, 1);
    assert_eq!(plan.executor_kind, ExecutorKind::Serial);
    assert_eq!(plan.estimated_speedup, 1.0);
    assert!(plan.reasons.iter().any(|r| r == "empty_workload"));
}

#[test]
fn single_item_workload_is_serial() {
    let snap = snapshot();
    let rep = report(0.1, WorkloadKind::CpuBound, 0.9);
    let plan = choose(&snap, &rep, Some(1), 0.8, 1.2, true, &CostModelOptions::default());
    assert_eq!(plan.n_workers, 1);
    assert_eq!(plan.executor_kind, ExecutorKind::Serial);
}

#[test]
fn sampling_failure_is_serial_with_zero_speedup_reason() {
    let snap = snapshot();
    let mut rep = report(0.0, WorkloadKind::Mixed, 0.0);
    rep.sampling_failed = Some("boom".to_string());
    let plan = choose(&snap, &rep, Some(100), 0.8, 1.2, true, &CostModelOptions::default());
    assert_eq!(plan.executor_kind, ExecutorKind::Serial);
    assert!(plan.reasons.iter().any(|r| r.contains("sampling failed")));
}

#[test]
fn memory_budget_caps_workers_below_core_count() {
    let mut snap = snapshot();
    snap.available_memory_bytes = 48 * 1024 * 1024; // 48 MiB: too little for 4+ workers.
    let mut rep = report(0.1, WorkloadKind::CpuBound, 0.95);
    rep.avg_output_bytes = 4.0 * 1024.0 * 1024.0; // 4 MiB per item keeps per-worker memory large.

    let plan = choose(&snap, &rep, Some(10_000), 0.8, 1.2, true, &CostModelOptions::default());
    assert!(plan.n_workers < snap.physical_cores, "n_workers was {}", plan.n_workers);
    assert!(plan.warnings.iter().any(|w| w.contains("memory budget")));
}

#[test]
fn no_super_linear_speedup() {
    let snap = snapshot();
    let rep = report(0.1, WorkloadKind::CpuBound, 1.0);
    let plan = choose(&snap, &rep, Some(10_000), 0.8, 1.2, true, &CostModelOptions::default());
    assert!(plan.estimated_speedup <= plan.n_workers as f64 + 1e-9);
}

#[test]
fn default_alpha_schedule_stays_within_bounds() {
    for n in 1..=32 {
        let a = default_alpha(n);
        assert!((0.0..=0.5).contains(&a), "alpha({}) = {}", n, a);
    }
}
