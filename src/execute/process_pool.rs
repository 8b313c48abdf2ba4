//! Process-parallel executor: re-executes the host binary as `n_workers`
//! persistent children via [`std::env::current_exe`], each running the
//! worker loop installed by [`super::run_worker_if_requested`]. Items cross
//! the pipe as length-prefixed `bincode` frames, chunked per the chosen
//! chunksize.

use std::process::{Child, Command, Stdio};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::chunk::chunk_indexed;
use super::framing;
use crate::config::Data;
use crate::error::Error;

pub(crate) fn run<T, U>(worker_name: &str, data: Data<T>, n_workers: usize, chunksize: usize) -> Result<Vec<U>, Error>
where
    T: Serialize + Send + 'static,
    U: DeserializeOwned + Send + 'static,
{
    let items: Vec<T> = match data {
        Data::Finite(v) => v,
        Data::Lazy(iter) => iter.collect(),
    };
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let chunks = chunk_indexed(items, chunksize);
    let n_workers = n_workers.max(1).min(chunks.len().max(1));

    let children: Vec<Child> = (0..n_workers)
        .map(|_| spawn_worker(worker_name))
        .collect::<Result<_, Error>>()?;

    let (work_tx, work_rx) = crossbeam_channel::unbounded::<(usize, Vec<T>)>();
    for chunk in chunks {
        work_tx.send(chunk).expect("work channel unexpectedly closed");
    }
    drop(work_tx);

    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, Result<Vec<U>, Error>)>();

    std::thread::scope(|scope| {
        for mut child in children {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                let mut stdin = child.stdin.take().expect("worker child missing stdin pipe");
                let mut stdout = child.stdout.take().expect("worker child missing stdout pipe");

                for (start, chunk) in work_rx.iter() {
                    let mut outputs = Vec::with_capacity(chunk.len());
                    let mut failure = None;
                    for (i, item) in chunk.iter().enumerate() {
                        let index = start + i;
                        let outcome = bincode::serialize(item)
                            .map_err(|e| Error::ItemFailed { index, cause: format!("item failed to serialize: {e}") })
                            .and_then(|bytes| {
                                framing::write_frame(&mut stdin, &bytes).map_err(|e| Error::ItemFailed {
                                    index,
                                    cause: format!("worker pipe closed unexpectedly: {e}"),
                                })
                            })
                            .and_then(|()| {
                                framing::read_frame(&mut stdout).ok_or_else(|| Error::ItemFailed {
                                    index,
                                    cause: "worker closed pipe without responding".to_string(),
                                })
                            })
                            .and_then(|response| {
                                bincode::deserialize(&response).map_err(|e| Error::ItemFailed {
                                    index,
                                    cause: format!("worker returned a malformed frame: {e}"),
                                })
                            });

                        match outcome {
                            Ok(value) => outputs.push(value),
                            Err(err) => {
                                failure = Some(err);
                                break;
                            }
                        }
                    }
                    let result = failure.map_or(Ok(outputs), Err);
                    let _ = result_tx.send((start, result));
                }

                // Closing stdin signals EOF to the worker loop, which then exits.
                drop(stdin);
                let _ = child.wait();
            });
        }
    });
    drop(result_tx);

    let mut indexed: Vec<(usize, Result<Vec<U>, Error>)> = result_rx.try_iter().collect();
    indexed.sort_by_key(|(start, _)| *start);

    let mut out = Vec::new();
    for (_, result) in indexed {
        out.extend(result?);
    }
    Ok(out)
}

fn spawn_worker(name: &str) -> Result<Child, Error> {
    let exe = std::env::current_exe()
        .map_err(|e| Error::ProcessExecutorFailed(format!("process executor requires a reexecutable current_exe(): {e}")))?;
    Command::new(exe)
        .env("PERFOPT_WORKER_FOR", name)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| Error::ProcessExecutorFailed(format!("failed to spawn worker process: {e}")))
}
