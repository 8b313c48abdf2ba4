//! Generalized Amdahl's law cost model: score candidate `(N, C)` pairs and
//! pick the best one, subject to memory, picklability and minimum-speedup
//! guards.

use serde::{Deserialize, Serialize};

use crate::dryrun::{SampleReport, WorkloadKind};
use crate::profiler::SystemSnapshot;

/// How the workload will be dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutorKind {
    Serial,
    Process,
    Thread,
}

/// An evaluated `(N, C)` pair with its overhead decomposition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CostCandidate {
    pub n_workers: usize,
    pub chunksize: usize,
    pub est_total_time_s: f64,
    pub estimated_speedup: f64,
    pub spawn_term_s: f64,
    pub compute_term_s: f64,
    pub ipc_term_s: f64,
    pub chunk_term_s: f64,
}

/// The cost model's own pick, before the orchestrator layers on overrides,
/// nested-parallelism adjustments and the final `Decision` shape.
#[derive(Clone, Debug)]
pub struct ChosenPlan {
    pub n_workers: usize,
    pub chunksize: usize,
    pub executor_kind: ExecutorKind,
    pub estimated_speedup: f64,
    pub est_total_time_s: f64,
    pub est_serial_time_s: f64,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
}

/// Tunable knobs for the cost model itself, as opposed to [`crate::config::Options`]
/// which tunes the orchestrator around it.
#[derive(Clone, Copy)]
pub struct CostModelOptions {
    /// IPC-overlap schedule `α(N) ∈ [0, 0.5]`. Default: `0.5 * (1 - 1/N)`.
    pub alpha: fn(usize) -> f64,
    /// Fixed per-worker memory overhead assumed before `avg_output_bytes * chunksize`.
    pub base_per_worker_memory_bytes: f64,
    /// Thread-executor spawn cost; thread spawns are far cheaper than
    /// process spawns and carry no IPC tax.
    pub thread_spawn_cost_s: f64,
    /// Below this absolute wall time, a workload can't win from parallelism
    /// no matter how many workers are available.
    pub tiny_workload_threshold_s: f64,
}

impl Default for CostModelOptions {
    fn default() -> Self {
        CostModelOptions {
            alpha: default_alpha,
            base_per_worker_memory_bytes: 10.0 * 1024.0 * 1024.0,
            thread_spawn_cost_s: 0.0002,
            tiny_workload_threshold_s: 0.05,
        }
    }
}

/// `α(N) = 0.5 * (1 - 1/N)`, clamped into `[0, 0.5]`.
pub fn default_alpha(n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        (0.5 * (1.0 - 1.0 / n as f64)).clamp(0.0, 0.5)
    }
}

pub(crate) struct Overheads {
    pub spawn_cost_s: f64,
    pub input_serialize_s: f64,
    pub output_serialize_s: f64,
}

/// The overhead terms that apply to a given executor kind, shared between
/// the search in [`choose`] and the orchestrator's forced-override path.
pub(crate) fn overheads_for(kind: ExecutorKind, snapshot: &SystemSnapshot, report: &SampleReport, cost_opts: &CostModelOptions) -> Overheads {
    match kind {
        ExecutorKind::Process => Overheads {
            spawn_cost_s: snapshot.spawn_cost_s,
            input_serialize_s: report.avg_input_serialize_s,
            output_serialize_s: report.avg_output_serialize_s,
        },
        ExecutorKind::Thread | ExecutorKind::Serial => Overheads {
            spawn_cost_s: cost_opts.thread_spawn_cost_s,
            input_serialize_s: 0.0,
            output_serialize_s: 0.0,
        },
    }
}

/// Routes a workload kind to an executor, honoring picklability.
pub(crate) fn route_executor_kind(workload_kind: WorkloadKind, prefer_threads_for_io: bool, process_eligible: bool) -> ExecutorKind {
    match (workload_kind, prefer_threads_for_io) {
        (WorkloadKind::IoBound, true) => ExecutorKind::Thread,
        (WorkloadKind::CpuBound, _) if process_eligible => ExecutorKind::Process,
        (WorkloadKind::CpuBound, _) => ExecutorKind::Thread,
        (WorkloadKind::Mixed, _) if process_eligible => ExecutorKind::Process,
        (WorkloadKind::Mixed, _) => ExecutorKind::Thread,
        (WorkloadKind::IoBound, false) if process_eligible => ExecutorKind::Process,
        (WorkloadKind::IoBound, false) => ExecutorKind::Thread,
    }
}

/// Chooses `(N, C, executor_kind)` for a workload of `data_size` items
/// (`None` for an unbounded lazy source).
pub fn choose(
    snapshot: &SystemSnapshot,
    report: &SampleReport,
    data_size: Option<usize>,
    memory_safety_fraction: f64,
    min_speedup_threshold: f64,
    prefer_threads_for_io: bool,
    cost_opts: &CostModelOptions,
) -> ChosenPlan {
    let mut reasons = Vec::new();
    let mut warnings = Vec::new();

    if data_size == Some(0) {
        reasons.push("empty_workload".to_string());
        return serial_decision(1.0, reasons, warnings);
    }
    if report.sampling_failed.is_some() {
        reasons.push(format!(
            "sampling failed: {}",
            report.sampling_failed.as_deref().unwrap_or("unknown cause")
        ));
        return serial_decision(0.0, reasons, warnings);
    }
    if data_size == Some(1) {
        reasons.push("single-item workload cannot be parallelized".to_string());
        return serial_decision(1.0, reasons, warnings);
    }

    let t = report.avg_item_time_s;
    let serial_time = data_size.map(|m| m as f64 * t);

    if let Some(serial_time) = serial_time {
        if serial_time < cost_opts.tiny_workload_threshold_s {
            reasons.push(format!(
                "workload dominated by spawn: serial time {:.4}s below {:.4}s threshold",
                serial_time, cost_opts.tiny_workload_threshold_s
            ));
            return serial_decision(1.0, reasons, warnings);
        }
    }

    // Deliberate deviation from spec.md §4.4's single generic `N_max = physical_cores * 2`
    // formula: SMT/hyperthread siblings share a physical core's execution units
    // and don't double throughput for genuinely CPU-bound work, so process
    // workers (which exist to use CPU, not to hide blocking I/O) are capped at
    // the physical core count. Thread workers, which mostly matter for
    // workloads that block rather than compute, keep the full `physical_cores * 2`
    // headroom. Without this split, `search_best` chases the model's
    // compute_term = (M * t) / N all the way to `physical_cores * 2` for any
    // CPU-bound workload whose serial time dwarfs spawn/IPC cost, which
    // contradicts the `n_workers ≈ physical_cores` expectation in spec.md §8's
    // "CPU-heavy, large batch" scenario. See DESIGN.md's Open Question log.
    // `apply_overrides` mirrors this split for forced worker counts.
    let n_max_cores_process = snapshot.physical_cores.max(1);
    let n_max_cores_thread = snapshot.physical_cores.saturating_mul(2).max(1);
    let n_max_data = data_size.unwrap_or(usize::MAX).max(1);
    let n_max_process = n_max_cores_process.min(n_max_data);
    let n_max_thread = n_max_cores_thread.min(n_max_data);

    let base_chunksize = base_chunksize(t, report.item_time_cv);
    let per_worker_memory = cost_opts.base_per_worker_memory_bytes
        + report.avg_output_bytes * base_chunksize as f64;
    let n_max_memory = if per_worker_memory > 0.0 {
        ((snapshot.available_memory_bytes as f64 * memory_safety_fraction) / per_worker_memory)
            .floor()
            .max(1.0) as usize
    } else {
        n_max_cores_thread
    };

    let n_max_process_effective = n_max_process.min(n_max_memory).max(1);
    let n_max_thread_effective = n_max_thread.min(n_max_memory).max(1);
    if n_max_memory < n_max_cores_thread {
        warnings.push(format!(
            "memory budget caps workers at {} (cores would allow {})",
            n_max_memory, n_max_cores_thread
        ));
    }

    let process_overheads = overheads_for(ExecutorKind::Process, snapshot, report, cost_opts);
    let thread_overheads = overheads_for(ExecutorKind::Thread, snapshot, report, cost_opts);

    let best_process = search_best(t, report.item_time_cv, data_size, n_max_process_effective, &process_overheads, snapshot, cost_opts);
    let best_thread = search_best(t, report.item_time_cv, data_size, n_max_thread_effective, &thread_overheads, snapshot, cost_opts);

    let process_eligible = report.f_is_picklable && report.items_picklable;
    if !process_eligible {
        warnings.push("F or sampled items are not picklable; process executor unavailable".to_string());
    }

    let chosen_kind_initial = route_executor_kind(report.workload_kind, prefer_threads_for_io, process_eligible);
    let (chosen, mut chosen_kind) = match chosen_kind_initial {
        ExecutorKind::Process => (best_process.clone(), ExecutorKind::Process),
        _ => (best_thread.clone(), ExecutorKind::Thread),
    };

    // `n_workers == 1` must imply `executor_kind == Serial`, regardless of
    // which pool the routing step picked.
    if chosen.n_workers <= 1 {
        chosen_kind = ExecutorKind::Serial;
    }

    reasons.push(format!(
        "{:?} workload ({:.0}% CPU utilization) routed to {:?}",
        report.workload_kind,
        report.cpu_utilization_fraction * 100.0,
        chosen_kind
    ));

    if chosen.estimated_speedup < min_speedup_threshold {
        reasons.push(format!(
            "best achievable speedup {:.2}x below minimum threshold {:.2}x",
            chosen.estimated_speedup, min_speedup_threshold
        ));
        return serial_decision(1.0, reasons, warnings);
    }

    ChosenPlan {
        n_workers: chosen.n_workers,
        chunksize: chosen.chunksize,
        executor_kind: chosen_kind,
        estimated_speedup: chosen.estimated_speedup,
        est_total_time_s: chosen.est_total_time_s,
        est_serial_time_s: serial_time.unwrap_or(chosen.est_total_time_s * chosen.estimated_speedup),
        reasons,
        warnings,
    }
}

fn serial_decision(speedup: f64, reasons: Vec<String>, warnings: Vec<String>) -> ChosenPlan {
    ChosenPlan {
        n_workers: 1,
        chunksize: 1,
        executor_kind: ExecutorKind::Serial,
        estimated_speedup: speedup,
        est_total_time_s: 0.0,
        est_serial_time_s: 0.0,
        reasons,
        warnings,
    }
}

pub(crate) fn base_chunksize(t: f64, cv: f64) -> usize {
    let target = if t > 0.0 { (0.2 / t).round().max(1.0) } else { 1.0 };
    let adjusted = if cv > 1.0 { target / (1.0 + cv) } else { target };
    adjusted.round().max(1.0) as usize
}

pub(crate) fn chunksize_for(t: f64, cv: f64, data_size: Option<usize>, n: usize) -> usize {
    let mut c = base_chunksize(t, cv);
    if let Some(m) = data_size {
        let cap = (m as f64 / n as f64).ceil().max(1.0) as usize;
        c = c.min(cap.max(1));
    }
    c.max(1)
}

#[allow(clippy::too_many_arguments)]
fn search_best(
    t: f64,
    cv: f64,
    data_size: Option<usize>,
    n_max: usize,
    overheads: &Overheads,
    snapshot: &SystemSnapshot,
    cost_opts: &CostModelOptions,
) -> CostCandidate {
    let m = data_size;
    let serial_time = m.map(|m| m as f64 * t);

    let mut best = CostCandidate {
        n_workers: 1,
        chunksize: chunksize_for(t, cv, data_size, 1),
        est_total_time_s: serial_time.unwrap_or(t),
        estimated_speedup: 1.0,
        spawn_term_s: 0.0,
        compute_term_s: serial_time.unwrap_or(t),
        ipc_term_s: 0.0,
        chunk_term_s: 0.0,
    };

    if n_max < 2 {
        return best;
    }

    // An unbounded lazy source has no known M; evaluate the overhead model
    // per-item (M = 1) so the comparison is still meaningful in relative terms.
    let m_for_model = m.unwrap_or(1) as f64;
    let serial_time_for_model = serial_time.unwrap_or(t);

    for n in 2..=n_max {
        let chunksize = chunksize_for(t, cv, data_size, n);
        let candidate = evaluate(
            m_for_model,
            serial_time_for_model,
            t,
            overheads,
            snapshot.chunk_overhead_s,
            n,
            chunksize,
            cost_opts,
        );
        if candidate.estimated_speedup > best.estimated_speedup {
            best = candidate;
        }
    }

    best
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn evaluate(
    m: f64,
    serial_time: f64,
    t: f64,
    overheads: &Overheads,
    chunk_overhead_s: f64,
    n: usize,
    chunksize: usize,
    cost_opts: &CostModelOptions,
) -> CostCandidate {
    let alpha = (cost_opts.alpha)(n).clamp(0.0, 0.5);

    let spawn_term_s = n as f64 * overheads.spawn_cost_s;
    let compute_term_s = (m * t) / n as f64;
    let ipc_term_s = m * (overheads.input_serialize_s + overheads.output_serialize_s) * (1.0 - alpha);
    let chunk_term_s = (m / chunksize as f64) * chunk_overhead_s;

    let est_total_time_s = spawn_term_s + compute_term_s + ipc_term_s + chunk_term_s;
    let estimated_speedup = if est_total_time_s > 0.0 {
        (serial_time / est_total_time_s).min(n as f64)
    } else {
        1.0
    };

    CostCandidate {
        n_workers: n,
        chunksize,
        est_total_time_s,
        estimated_speedup,
        spawn_term_s,
        compute_term_s,
        ipc_term_s,
        chunk_term_s,
    }
}

#[cfg(test)]
mod test;
