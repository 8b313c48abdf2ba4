//! The orchestrator: wires the profiler, sampler, dry-run measurer and
//! cost model together, honors user overrides, and produces the
//! [`Decision`] record.

mod nested;

use serde::Serialize;

use crate::config::{Data, Options};
use crate::cost_model::{self, CostModelOptions, ExecutorKind};
use crate::dryrun::{self, SampleReport};
use crate::error::Error;
use crate::profiler::{self, SystemSnapshot};
use crate::sampler;

/// The optimizer's recommendation for a workload, plus the measurements it
/// was derived from.
///
/// `n_workers == 1` always implies `executor_kind == Serial` and
/// `estimated_speedup <= 1.0`; `estimated_speedup` never exceeds `n_workers`.
#[derive(Clone, Debug, Serialize)]
pub struct Decision {
    pub n_workers: usize,
    pub chunksize: usize,
    pub executor_kind: ExecutorKind,
    pub estimated_speedup: f64,
    pub est_total_time_s: f64,
    pub est_serial_time_s: f64,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub snapshot: SystemSnapshot,
    pub sample_report: SampleReport,
}

/// Predicts near-optimal parallelization parameters for applying `f` to
/// every element of `data`.
///
/// Returns the recommendation alongside `data` reconstructed in full. The
/// reconstructed sequence travels outside `Decision` rather than inside it
/// because `Decision` needs to stay cheaply clonable and loggable, and a
/// lazy source's boxed iterator can't satisfy that. Never fails except for
/// the handful of programmer errors in [`Options::validate`]; every other
/// failure mode (unpicklable `F`, an `F` that panics, unreliable
/// measurements, memory shortage) is reported through
/// `Decision::reasons`/`Decision::warnings`.
pub fn optimize<T, U, F>(f: &F, data: Data<T>, options: &Options) -> Result<(Decision, Data<T>), Error>
where
    T: serde::Serialize + Clone + Send + 'static,
    U: serde::Serialize + Send + 'static,
    F: Fn(T) -> U + Send + Sync + Clone + 'static,
{
    options.validate()?;

    let snapshot = profiler::snapshot(options);
    log::debug!("optimizer: snapshot = {:?}", snapshot);

    let sampler_out = sampler::sample(data, options.sample_size);
    log::trace!(
        "optimizer: drew {} sample item(s), lazy = {}",
        sampler_out.items.len(),
        sampler_out.is_lazy
    );

    let report = dryrun::measure(
        f,
        &sampler_out.items,
        sampler_out.items_picklable.clone(),
        options.dry_run_item_timeout,
    );
    log::debug!("optimizer: sample report = {:?}", report);

    let data_size = sampler_out.reconstructed.len();

    let mut effective_snapshot = snapshot.clone();
    let mut extra_warnings = Vec::new();
    if nested::detected(snapshot.logical_cores) {
        effective_snapshot.physical_cores = (effective_snapshot.physical_cores / 2).max(1);
        extra_warnings.push(
            "nested parallelism detected in the host process; halving the worker budget".to_string(),
        );
        log::warn!("optimizer: nested parallelism detected, halving worker budget");
    }

    let cost_opts = CostModelOptions::default();

    let mut plan = cost_model::choose(
        &effective_snapshot,
        &report,
        data_size,
        options.memory_safety_fraction,
        options.min_speedup_threshold,
        options.prefer_threads_for_io,
        &cost_opts,
    );

    if options.force_n_jobs.is_some() || options.force_chunksize.is_some() {
        apply_overrides(&mut plan, &effective_snapshot, &report, data_size, options, &cost_opts);
    }

    plan.warnings.extend(extra_warnings.drain(..));

    if options.verbose {
        log::info!(
            "optimize: {:?} executor, {} worker(s), chunksize {}, estimated speedup {:.2}x",
            plan.executor_kind,
            plan.n_workers,
            plan.chunksize,
            plan.estimated_speedup
        );
    }

    let decision = Decision {
        n_workers: plan.n_workers,
        chunksize: plan.chunksize,
        executor_kind: plan.executor_kind,
        estimated_speedup: plan.estimated_speedup,
        est_total_time_s: plan.est_total_time_s,
        est_serial_time_s: plan.est_serial_time_s,
        reasons: plan.reasons,
        warnings: plan.warnings,
        snapshot,
        sample_report: report,
    };

    Ok((decision, sampler_out.reconstructed))
}

/// Applies `Options::force_n_jobs`/`force_chunksize` on top of the cost
/// model's own pick: still validated, still subject to the hard guards
/// (empty workload, sampling failure), but exempt from the soft
/// minimum-speedup guard since the caller is explicitly overriding the
/// heuristic.
fn apply_overrides(
    plan: &mut cost_model::ChosenPlan,
    snapshot: &SystemSnapshot,
    report: &SampleReport,
    data_size: Option<usize>,
    options: &Options,
    cost_opts: &CostModelOptions,
) {
    // Hard guards still apply: an empty or failed workload stays serial no
    // matter what the caller asked for.
    if data_size == Some(0) || report.sampling_failed.is_some() {
        return;
    }

    let mut n = match options.force_n_jobs {
        Some(0) => {
            plan.warnings
                .push("force_n_jobs must be >= 1; ignoring override".to_string());
            plan.n_workers
        }
        Some(n) => n,
        None => plan.n_workers,
    };

    // Routing is decided from the workload kind alone, independent of the
    // requested worker count, so the per-kind cap below can be picked before
    // `n` is clamped. Mirrors `cost_model::choose`'s process/thread split:
    // process workers are capped at the physical core count (SMT siblings
    // don't help CPU-bound compute), thread workers keep `physical_cores * 2`.
    let process_eligible = report.f_is_picklable && report.items_picklable;
    let routed = cost_model::route_executor_kind(report.workload_kind, options.prefer_threads_for_io, process_eligible);
    let executor_kind_for_cap = if routed == ExecutorKind::Process && !process_eligible {
        plan.warnings
            .push("forced worker count routed to threads: F or sampled items are not picklable".to_string());
        ExecutorKind::Thread
    } else {
        routed
    };

    let n_max = match executor_kind_for_cap {
        ExecutorKind::Process => snapshot.physical_cores.max(1),
        ExecutorKind::Thread | ExecutorKind::Serial => snapshot.physical_cores.saturating_mul(2).max(1),
    };
    if n > n_max {
        plan.warnings.push(format!(
            "force_n_jobs={} exceeds the {:?} executor's cap of {}; clamping",
            n, executor_kind_for_cap, n_max
        ));
        n = n_max;
    }
    if let Some(m) = data_size {
        n = n.min(m.max(1));
    }
    n = n.max(1);

    let executor_kind = if n <= 1 { ExecutorKind::Serial } else { executor_kind_for_cap };

    let mut c = match options.force_chunksize {
        Some(0) => {
            plan.warnings
                .push("force_chunksize must be >= 1; ignoring override".to_string());
            cost_model::chunksize_for(report.avg_item_time_s, report.item_time_cv, data_size, n)
        }
        Some(c) => c,
        None => cost_model::chunksize_for(report.avg_item_time_s, report.item_time_cv, data_size, n),
    };
    if let Some(m) = data_size {
        let cap = (m as f64 / n as f64).ceil().max(1.0) as usize;
        if c > cap {
            plan.warnings.push(format!(
                "force_chunksize={} would exceed ceil(data_size / n_workers) = {}; clamping",
                c, cap
            ));
            c = cap;
        }
    }
    c = c.max(1);

    let overheads = cost_model::overheads_for(executor_kind, snapshot, report, cost_opts);
    let m_for_model = data_size.unwrap_or(1) as f64;
    let serial_time = data_size.map(|m| m as f64 * report.avg_item_time_s);
    let candidate = cost_model::evaluate(
        m_for_model,
        serial_time.unwrap_or(report.avg_item_time_s),
        report.avg_item_time_s,
        &overheads,
        snapshot.chunk_overhead_s,
        n,
        c,
        cost_opts,
    );

    plan.reasons.push(format!(
        "user-forced n_workers={}, chunksize={}",
        candidate.n_workers, candidate.chunksize
    ));
    plan.n_workers = candidate.n_workers;
    plan.chunksize = candidate.chunksize;
    plan.executor_kind = executor_kind;
    plan.estimated_speedup = candidate.estimated_speedup;
    plan.est_total_time_s = candidate.est_total_time_s;
    plan.est_serial_time_s = serial_time.unwrap_or(candidate.est_total_time_s * candidate.estimated_speedup);
}
