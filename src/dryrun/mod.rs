//! Dry-run measurement: run `F` on the drawn sample and derive per-item
//! cost statistics.

mod rusage;
mod stats;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::sampler::pickle::check_value;
use crate::sampler::PickleStatus;

/// Coarse classification of `F` from sampled CPU utilization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkloadKind {
    CpuBound,
    IoBound,
    Mixed,
}

/// Aggregated dry-run measurements produced by [`measure`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleReport {
    pub sample_size: usize,
    pub avg_item_time_s: f64,
    pub item_time_cv: f64,
    pub avg_input_serialize_s: f64,
    pub avg_output_serialize_s: f64,
    pub avg_input_bytes: f64,
    pub avg_output_bytes: f64,
    pub cpu_utilization_fraction: f64,
    pub peak_memory_bytes: u64,
    pub workload_kind: WorkloadKind,
    pub f_is_picklable: bool,
    pub items_picklable: bool,
    /// `Some(cause)` if `F` panicked on a sample item; when set, all other
    /// numeric fields are zeroed and the optimizer must treat this as
    /// "cannot parallelize".
    pub sampling_failed: Option<String>,
    /// Indices of items whose measured wall time exceeded the configured
    /// per-item timeout (still counted, not excluded from the averages).
    pub slow_items: Vec<usize>,
}

impl SampleReport {
    fn failed(sample_size: usize, items_picklable: bool, cause: String) -> Self {
        SampleReport {
            sample_size,
            avg_item_time_s: 0.0,
            item_time_cv: 0.0,
            avg_input_serialize_s: 0.0,
            avg_output_serialize_s: 0.0,
            avg_input_bytes: 0.0,
            avg_output_bytes: 0.0,
            cpu_utilization_fraction: 0.0,
            peak_memory_bytes: 0,
            workload_kind: WorkloadKind::Mixed,
            f_is_picklable: false,
            items_picklable,
            sampling_failed: Some(cause),
            slow_items: Vec::new(),
        }
    }

    fn empty(items_picklable: bool) -> Self {
        let mut report = SampleReport::failed(0, items_picklable, String::new());
        report.sampling_failed = None;
        report
    }
}

/// Runs `f` over `items` in index order, measuring wall/CPU time and
/// serialization cost of each call. Never panics: a panic from `f` is
/// caught and surfaces as `SampleReport::sampling_failed`.
pub fn measure<T, U, F>(
    f: &F,
    items: &[T],
    items_picklable: PickleStatus,
    per_item_timeout: Option<Duration>,
) -> SampleReport
where
    T: Serialize + Clone + Send + 'static,
    U: Serialize + Send + 'static,
    F: Fn(T) -> U + Send + Sync + Clone + 'static,
{
    let items_picklable_ok = matches!(items_picklable, PickleStatus::Ok | PickleStatus::NoItems);

    if items.is_empty() {
        return SampleReport::empty(items_picklable_ok);
    }

    let mut wall = stats::Welford::new();
    let mut cpu_sum = stats::CompensatedSum::new();
    let mut wall_sum = stats::CompensatedSum::new();
    let mut input_serialize = stats::Welford::new();
    let mut output_serialize = stats::Welford::new();
    let mut input_bytes = stats::Welford::new();
    let mut output_bytes = stats::Welford::new();
    let mut slow_items = Vec::new();
    let mut f_is_picklable = true;
    let mut peak_rss_delta = 0u64;

    for (index, item) in items.iter().enumerate() {
        let t_in_start = Instant::now();
        let in_bytes = bincode::serialize(item).map(|b| b.len()).unwrap_or(0);
        input_serialize.push(t_in_start.elapsed().as_secs_f64());
        input_bytes.push(in_bytes as f64);

        let before = rusage::usage();
        let wall_start = Instant::now();

        let outcome = run_with_timeout(f, item.clone(), per_item_timeout);

        let elapsed = wall_start.elapsed();
        let after = rusage::usage();

        let output = match outcome {
            Ok(Some(output)) => output,
            Ok(None) => {
                slow_items.push(index);
                continue;
            }
            Err(cause) => {
                return SampleReport::failed(items.len(), items_picklable_ok, cause);
            }
        };

        wall.push(elapsed.as_secs_f64());
        wall_sum.push(elapsed.as_secs_f64());
        cpu_sum.push((after.cpu_time_s - before.cpu_time_s).max(0.0));
        peak_rss_delta = peak_rss_delta.max(after.max_rss_bytes.saturating_sub(before.max_rss_bytes));

        let t_out_start = Instant::now();
        let out_bytes = match check_value(&output) {
            PickleStatus::Ok => bincode::serialize(&output).map(|b| b.len()).unwrap_or(0),
            _ => {
                f_is_picklable = false;
                0
            }
        };
        output_serialize.push(t_out_start.elapsed().as_secs_f64());
        output_bytes.push(out_bytes as f64);
    }

    let cpu_utilization_fraction = if wall_sum.total() > 0.0 {
        (cpu_sum.total() / wall_sum.total()).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let workload_kind = if cpu_utilization_fraction < 0.3 {
        WorkloadKind::IoBound
    } else if cpu_utilization_fraction >= 0.7 {
        WorkloadKind::CpuBound
    } else {
        WorkloadKind::Mixed
    };

    SampleReport {
        sample_size: items.len(),
        avg_item_time_s: wall.mean(),
        item_time_cv: wall.cv(),
        avg_input_serialize_s: input_serialize.mean(),
        avg_output_serialize_s: output_serialize.mean(),
        avg_input_bytes: input_bytes.mean(),
        avg_output_bytes: output_bytes.mean(),
        cpu_utilization_fraction,
        peak_memory_bytes: peak_rss_delta,
        workload_kind,
        f_is_picklable,
        items_picklable: items_picklable_ok,
        sampling_failed: None,
        slow_items,
    }
}

/// Runs `f(item)`, returning:
/// - `Ok(Some(output))` on a normal, on-time completion.
/// - `Ok(None)` if `timeout` fired first (the item is marked slow).
/// - `Err(cause)` if `f` panicked.
fn run_with_timeout<T, U, F>(f: &F, item: T, timeout: Option<Duration>) -> Result<Option<U>, String>
where
    T: Send + 'static,
    U: Serialize + Send + 'static,
    F: Fn(T) -> U + Send + Sync + Clone + 'static,
{
    let Some(timeout) = timeout else {
        return catch_unwind(AssertUnwindSafe(|| f(item)))
            .map(Some)
            .map_err(describe_panic);
    };

    let (tx, rx) = crossbeam_channel::bounded(1);
    let f = f.clone();
    // Detached on purpose: if `f` hangs past `timeout`, the item is marked
    // slow and this function returns without waiting for the thread to
    // finish. The thread outlives this call and drops its half of the
    // channel once `f` returns (or never, if `f` never returns).
    std::thread::spawn(move || {
        let result = catch_unwind(AssertUnwindSafe(|| f(item)));
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(output)) => Ok(Some(output)),
        Ok(Err(panic)) => Err(describe_panic(panic)),
        Err(_timed_out) => Ok(None),
    }
}

fn describe_panic(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "F panicked with a non-string payload".to_string()
    }
}
