mod chunk_overhead;
mod cores;
mod memory;
mod spawn_cost;
mod start_method;

use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};

pub use start_method::StartMethod;

use crate::config::Options;

/// Whether a measured quantity came from a live benchmark or a fallback
/// default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementQuality {
    Ok,
    Fallback,
}

/// Spawn-cost/chunk-overhead measurement quality, one flag per quantity.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct QualityReport {
    pub spawn: MeasurementQuality,
    pub chunk: MeasurementQuality,
}

/// A snapshot of the host's parallelization-relevant characteristics.
///
/// Produced once per process by [`snapshot`] and cached; see module docs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub physical_cores: usize,
    pub logical_cores: usize,
    pub available_memory_bytes: u64,
    pub start_method: StartMethod,
    pub spawn_cost_s: f64,
    pub chunk_overhead_s: f64,
    pub measurement_quality: QualityReport,
}

static CACHE: OnceLock<Mutex<Option<SystemSnapshot>>> = OnceLock::new();

/// Returns the process-wide [`SystemSnapshot`], measuring it on first call
/// and serving the cached value thereafter.
///
/// Never fails: every measurement step has a fallback, and failures are
/// reflected in `measurement_quality` rather than propagated. Idempotent:
/// a second call without [`reset_cache`] returns the cached snapshot.
pub fn snapshot(options: &Options) -> SystemSnapshot {
    let lock = CACHE.get_or_init(|| Mutex::new(None));

    if let Some(cached) = lock.lock().unwrap().as_ref() {
        return cached.clone();
    }

    let mut guard = lock.lock().unwrap();
    // Re-check: another thread may have raced us to the measurement.
    if let Some(cached) = guard.as_ref() {
        return cached.clone();
    }

    let measured = measure(options);
    log::debug!("profiler: measured snapshot {:?}", measured);
    *guard = Some(measured.clone());
    measured
}

/// Clears the cached snapshot. Test-only: forces the next [`snapshot`] call
/// to re-measure.
pub fn reset_cache() {
    if let Some(lock) = CACHE.get() {
        *lock.lock().unwrap() = None;
    }
}

fn measure(options: &Options) -> SystemSnapshot {
    let physical_cores = cores::physical_cores();
    let logical_cores = cores::logical_cores().max(physical_cores);
    let available_memory_bytes = memory::available_memory_bytes();
    let start_method = start_method::detect();

    // `PERFOPT_DISABLE_MEASUREMENTS` forces start-method defaults host-wide
    // for both live benchmarks; `Options::measure_spawn` is scoped to spawn
    // cost alone (spec.md §6), so it must not also suppress the chunk-overhead
    // probe.
    let disable_all_live = std::env::var("PERFOPT_DISABLE_MEASUREMENTS").as_deref() == Ok("1");

    let (spawn_cost_s, spawn_quality) = if disable_all_live || !options.measure_spawn {
        (start_method.default_spawn_cost_s(), MeasurementQuality::Fallback)
    } else {
        spawn_cost::measure(start_method)
    };

    let (chunk_overhead_s, chunk_quality) = if disable_all_live {
        (chunk_overhead::DEFAULT_CHUNK_OVERHEAD_S, MeasurementQuality::Fallback)
    } else {
        chunk_overhead::measure()
    };

    SystemSnapshot {
        physical_cores,
        logical_cores,
        available_memory_bytes,
        start_method,
        spawn_cost_s,
        chunk_overhead_s,
        measurement_quality: QualityReport {
            spawn: spawn_quality,
            chunk: chunk_quality,
        },
    }
}

#[cfg(test)]
mod test;
