//! Per-chunk scheduling overhead measurement.
//!
//! Dispatches a no-op workload of size `n` through this crate's own
//! `crossbeam-channel` worker loop with chunksize 1 versus a large
//! chunksize; the difference in wall time, divided by the difference in
//! chunk count, isolates the fixed per-chunk scheduling cost from the
//! per-item cost (which is ~0 for a no-op).

use std::time::{Duration, Instant};

use super::MeasurementQuality;

pub const DEFAULT_CHUNK_OVERHEAD_S: f64 = 0.0005;
const PLAUSIBLE_RANGE_S: (f64, f64) = (0.00001, 0.01);
const PROBE_N: usize = 20_000;
const LARGE_CHUNKSIZE: usize = 2_000;

/// Runs `n` no-op items through `workers` threads using `chunksize`-sized
/// chunks over a `crossbeam-channel` queue, returning the wall time.
fn time_dispatch(n: usize, chunksize: usize) -> Duration {
    let workers = std::thread::available_parallelism().map(|p| p.get()).unwrap_or(1);
    let (tx, rx) = crossbeam_channel::unbounded::<usize>();
    for chunk_start in (0..n).step_by(chunksize) {
        let chunk_len = chunksize.min(n - chunk_start);
        tx.send(chunk_len).unwrap();
    }
    drop(tx);

    let start = Instant::now();
    std::thread::scope(|scope| {
        for _ in 0..workers {
            let rx = rx.clone();
            scope.spawn(move || {
                for chunk_len in rx.iter() {
                    for _ in 0..chunk_len {
                        std::hint::black_box(());
                    }
                }
            });
        }
    });
    start.elapsed()
}

pub fn measure() -> (f64, MeasurementQuality) {
    let t_fine = time_dispatch(PROBE_N, 1).as_secs_f64();
    let t_coarse = time_dispatch(PROBE_N, LARGE_CHUNKSIZE).as_secs_f64();

    let chunks_fine = PROBE_N as f64;
    let chunks_coarse = (PROBE_N as f64 / LARGE_CHUNKSIZE as f64).ceil();
    let chunk_delta = chunks_fine - chunks_coarse;

    if chunk_delta <= 0.0 {
        return (DEFAULT_CHUNK_OVERHEAD_S, MeasurementQuality::Fallback);
    }

    let per_chunk = (t_fine - t_coarse) / chunk_delta;

    if validate(per_chunk) {
        (per_chunk, MeasurementQuality::Ok)
    } else {
        log::debug!(
            "profiler: chunk-overhead measurement ({:.6}s) failed quality checks, using default",
            per_chunk
        );
        (DEFAULT_CHUNK_OVERHEAD_S, MeasurementQuality::Fallback)
    }
}

fn validate(per_chunk: f64) -> bool {
    let (lo, hi) = PLAUSIBLE_RANGE_S;
    if !(per_chunk >= lo && per_chunk <= hi) {
        return false;
    }
    let ratio = per_chunk / DEFAULT_CHUNK_OVERHEAD_S;
    (0.1..=10.0).contains(&ratio)
}
