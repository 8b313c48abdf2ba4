use thiserror::Error;

/// Errors that propagate out of this crate: the `Options::validate`
/// programmer-error variants, plus runtime failures discovered after a
/// `Decision` has already committed to an executor and has no
/// `reasons`/`warnings` left to report into.
///
/// Everything else (unreliable measurements, unpicklable functions, empty
/// workloads, resource shortages) is reported through
/// [`crate::optimizer::Decision`]'s `reasons`/`warnings`, never through this
/// type. See `Options::validate`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("sample_size must be >= 1, got {0}")]
    InvalidSampleSize(usize),

    #[error("min_speedup_threshold must be >= 1.0, got {0}")]
    InvalidThreshold(f64),

    #[error("memory_safety_fraction must be in (0, 1], got {0}")]
    InvalidMemoryFraction(f64),

    /// A process-executor worker failed outside of `F` itself: the worker
    /// process couldn't be spawned, or `current_exe()` isn't re-executable.
    /// Unlike the variants above this isn't a misconfiguration the caller
    /// made; it's surfaced here because the adapter has no
    /// `Decision::warnings` to report into once `execute_registered` has
    /// already committed to the process executor.
    #[error("process executor failed: {0}")]
    ProcessExecutorFailed(String),

    /// A single item failed during parallel execution: `F` panicked (thread
    /// executor), or the item's chunk failed to serialize, round-trip
    /// through the worker pipe, or deserialize (process executor). `index`
    /// is the item's position in the original input, not its position
    /// within its chunk.
    #[error("item {index} failed: {cause}")]
    ItemFailed { index: usize, cause: String },
}
