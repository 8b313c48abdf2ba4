//! Cost-aware parallelization advisor for batch `map`-shaped workloads.
//!
//! Given a function `F` and a data source `D`, [`optimize`] draws a small
//! sample of `D`, dry-runs `F` on it, profiles the host machine, and scores
//! candidate worker counts and chunk sizes against a generalized Amdahl's
//! law cost model that accounts for spawn cost, IPC serialization and
//! per-chunk scheduling overhead. The result is a [`Decision`] describing
//! how many workers to use, what executor (serial, threads or processes)
//! and what chunk size, along with the measurements it was derived from,
//! so a caller that disagrees with the recommendation can see why.
//!
//! [`execute`] applies a `Decision` directly, for callers who just want the
//! output without also wiring up an executor themselves.
//!
//! ## Example
//!
//! ```rust
//! use perfopt::{optimize, Data, Options};
//!
//! fn slow_square(x: u64) -> u64 {
//!     std::thread::sleep(std::time::Duration::from_millis(1));
//!     x * x
//! }
//!
//! let data: Data<u64> = Data::Finite((0..2000).collect());
//! let options = Options::default();
//!
//! let (decision, data) = optimize(&slow_square, data, &options).unwrap();
//! println!(
//!     "{:?} executor, {} worker(s), chunksize {}, ~{:.1}x speedup",
//!     decision.executor_kind, decision.n_workers, decision.chunksize, decision.estimated_speedup
//! );
//!
//! let results = perfopt::execute(slow_square, data, &options).unwrap();
//! assert_eq!(results.len(), 2000);
//! ```
//!
//! ## Modules
//!
//! - [`profiler`] measures host characteristics: core counts, available
//!   memory, process start method, and the live spawn-cost/chunk-overhead
//!   benchmarks, cached once per process.
//! - [`sampler`] draws a bounded sample from `D` without destroying it, and
//!   checks whether items can cross a process boundary.
//! - [`dryrun`] runs `F` over the sample, measuring timing, CPU utilization
//!   and serialization cost.
//! - [`cost_model`] scores `(N, C)` candidates against the overhead model
//!   and picks the best one.
//! - [`optimizer`] wires the above together, applies user overrides and
//!   nested-parallelism detection, and produces the final [`Decision`].
//! - [`execute`] is a minimal executor (threads via `crossbeam-channel`,
//!   processes via self-re-exec) for callers who want `optimize` and the
//!   actual run in one call.
//!
//! ## Non-goals
//!
//! This crate does not implement a task-stealing scheduler, cluster/remote
//! dispatch, data-locality-aware partitioning or GPU offload. See
//! `DESIGN.md` for the full list.

pub mod config;
pub mod cost_model;
pub mod dryrun;
pub mod execute;
mod error;
pub mod optimizer;
pub mod profiler;
pub mod sampler;
#[cfg(test)]
pub(crate) mod test_support;

pub use config::{Data, Options};
pub use error::Error;
pub use execute::{execute, execute_registered, register_worker_fn, run_worker_if_requested};
pub use optimizer::{optimize, Decision};
