//! The self-re-exec worker registry.
//!
//! Rust has no pickle-the-closure mechanism, so a closure cannot be handed
//! to a freshly spawned process the way Python's `multiprocessing` hands a
//! picklable callable to a worker. This crate's process executor instead
//! asks the caller to register a bare `fn` pointer under a stable name
//! ahead of time; the re-exec'd child looks the name up in this registry
//! and runs it in a loop, mirroring `multiprocessing.freeze_support()`'s
//! guard-at-the-top-of-`main` pattern.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use super::framing;

type WorkerFn = Box<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

static REGISTRY: OnceLock<Mutex<HashMap<String, WorkerFn>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<String, WorkerFn>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Registers `f` under `name` so a re-exec'd worker process started with
/// `PERFOPT_WORKER_FOR=name` can find and run it.
///
/// `T`/`U` cross the process boundary as `bincode`-encoded, length-prefixed
/// frames.
pub fn register_worker_fn<T, U, F>(name: &str, f: F)
where
    T: serde::de::DeserializeOwned,
    U: serde::Serialize,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let wrapped: WorkerFn = Box::new(move |bytes: &[u8]| {
        let item: T = bincode::deserialize(bytes).expect("perfopt worker: malformed input frame");
        let output = f(item);
        bincode::serialize(&output).expect("perfopt worker: output failed to serialize")
    });
    registry().lock().unwrap().insert(name.to_string(), wrapped);
}

/// Worker-process entry point. Call this as the first statement of `main`,
/// before any other setup: it is a no-op unless the hidden
/// `PERFOPT_WORKER_FOR` environment variable is set, in which case it runs
/// the worker loop and exits the process. It never returns when active.
pub fn run_worker_if_requested() {
    let Ok(name) = std::env::var("PERFOPT_WORKER_FOR") else {
        return;
    };

    let guard = registry().lock().unwrap();
    let Some(handler) = guard.get(&name) else {
        eprintln!("perfopt worker: no function registered under {:?}", name);
        std::process::exit(1);
    };

    let stdin = std::io::stdin();
    let mut stdin = stdin.lock();
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    loop {
        match framing::read_frame(&mut stdin) {
            Some(frame) => {
                let out = handler(&frame);
                if framing::write_frame(&mut stdout, &out).is_err() {
                    break;
                }
            }
            // Parent closed its end of the pipe: nothing left to do.
            None => break,
        }
    }

    std::process::exit(0);
}
