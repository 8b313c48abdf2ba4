//! The execution adapter: a minimal, concrete dispatcher that consumes a
//! [`crate::optimizer::Decision`] and actually runs `F` over `D`. This is
//! convenience layered on top of the cost-aware core, which only needs to
//! produce the `(N, C, executor_kind)` triple; this module exists so that
//! [`execute`] has some adapter to hand its recommendation to.

mod chunk;
mod framing;
mod process_pool;
mod registry;
mod thread_pool;

pub use registry::{register_worker_fn, run_worker_if_requested};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{Data, Options};
use crate::cost_model::ExecutorKind;
use crate::error::Error;
use crate::optimizer::{self, Decision};

/// Calls [`crate::optimize`], then dispatches `f` over `data` using the
/// executor it recommends, preserving input order.
///
/// Works for any closure. If the optimizer recommends the process executor,
/// this falls back to the thread executor with a warning instead: Rust has
/// no way to pickle an arbitrary closure across a process boundary. To
/// actually get process-parallel execution, register `f` with
/// [`register_worker_fn`] ahead of time and call [`execute_registered`]
/// instead.
pub fn execute<T, U, F>(f: F, data: Data<T>, options: &Options) -> Result<Vec<U>, Error>
where
    T: Serialize + Clone + Send + 'static,
    U: Serialize + Send + 'static,
    F: Fn(T) -> U + Send + Sync + Clone + 'static,
{
    let (mut decision, data) = optimizer::optimize(&f, data, options)?;
    if decision.executor_kind == ExecutorKind::Process {
        decision.warnings.push(
            "process executor requires a name registered via `register_worker_fn` (see `execute_registered`); falling back to threads".to_string(),
        );
        decision.executor_kind = ExecutorKind::Thread;
    }
    dispatch(&f, data, &decision)
}

/// Like [`execute`], but for a bare `fn` pointer already registered under
/// `name` with [`register_worker_fn`], the compile-time analogue of a
/// picklable callable, letting the optimizer's chosen process executor
/// actually run. The host binary's `main` must call
/// [`run_worker_if_requested`] as its first statement.
pub fn execute_registered<T, U>(
    name: &str,
    f: fn(T) -> U,
    data: Data<T>,
    options: &Options,
) -> Result<Vec<U>, Error>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
    U: Serialize + DeserializeOwned + Send + 'static,
{
    let (decision, data) = optimizer::optimize(&f, data, options)?;
    if decision.executor_kind == ExecutorKind::Process {
        return process_pool::run(name, data, decision.n_workers, decision.chunksize);
    }
    dispatch(&f, data, &decision)
}

fn dispatch<T, U, F>(f: &F, data: Data<T>, decision: &Decision) -> Result<Vec<U>, Error>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + Sync,
{
    match decision.executor_kind {
        ExecutorKind::Serial => Ok(serial_run(f, data)),
        ExecutorKind::Thread => thread_pool::run(f, data, decision.n_workers, decision.chunksize),
        // `execute` downgrades Process to Thread before calling dispatch;
        // `execute_registered` intercepts Process before calling dispatch.
        ExecutorKind::Process => Ok(serial_run(f, data)),
    }
}

fn serial_run<T, U, F>(f: &F, data: Data<T>) -> Vec<U>
where
    F: Fn(T) -> U,
{
    match data {
        Data::Finite(items) => items.into_iter().map(f).collect(),
        Data::Lazy(iter) => iter.map(f).collect(),
    }
}
