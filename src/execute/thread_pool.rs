//! Thread-parallel executor: a fixed-size pool built on `crossbeam-channel`,
//! the lowest-ceremony concurrency primitive already idiomatic in this
//! corpus (see the profiler's own chunk-overhead probe).

use std::panic::{catch_unwind, AssertUnwindSafe};

use super::chunk::chunk_indexed;
use crate::config::Data;
use crate::error::Error;

pub(crate) fn run<T, U, F>(f: &F, data: Data<T>, n_workers: usize, chunksize: usize) -> Result<Vec<U>, Error>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + Sync,
{
    let items: Vec<T> = match data {
        Data::Finite(v) => v,
        Data::Lazy(iter) => iter.collect(),
    };
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let n_workers = n_workers.max(1);
    let chunks = chunk_indexed(items, chunksize);

    let (work_tx, work_rx) = crossbeam_channel::unbounded::<(usize, Vec<T>)>();
    for chunk in chunks {
        work_tx.send(chunk).expect("work channel unexpectedly closed");
    }
    drop(work_tx);

    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, Result<Vec<U>, Error>)>();

    std::thread::scope(|scope| {
        for _ in 0..n_workers {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for (start, chunk) in work_rx.iter() {
                    let mut outputs = Vec::with_capacity(chunk.len());
                    let mut failure = None;
                    for (i, item) in chunk.into_iter().enumerate() {
                        match catch_unwind(AssertUnwindSafe(|| f(item))) {
                            Ok(value) => outputs.push(value),
                            Err(payload) => {
                                failure = Some(Error::ItemFailed {
                                    index: start + i,
                                    cause: describe_panic(payload),
                                });
                                break;
                            }
                        }
                    }
                    let result = failure.map_or(Ok(outputs), Err);
                    let _ = result_tx.send((start, result));
                }
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

fn describe_panic(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "F panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn preserves_order_across_multiple_chunks_and_workers() {
        let data: Data<u32> = Data::Finite((0..97).collect());
        let out = run(&|x: u32| x * 2, data, 4, 7).unwrap();
        assert_eq!(out, (0..97).map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let data: Data<u32> = Data::Finite(vec![]);
        let out = run(&|x: u32| x, data, 4, 7).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn single_worker_behaves_like_serial() {
        let data: Data<u32> = Data::Finite((0..20).collect());
        let out = run(&|x: u32| x + 1, data, 1, 3).unwrap();
        assert_eq!(out, (1..21).collect::<Vec<_>>());
    }

    #[test]
    fn panicking_item_is_wrapped_with_its_original_index() {
        let data: Data<u32> = Data::Finite((0..10).collect());
        let err = run(
            &|x: u32| {
                if x == 6 {
                    panic!("boom");
                }
                x
            },
            data,
            2,
            3,
        )
        .unwrap_err();
        assert_eq!(err, Error::ItemFailed { index: 6, cause: "boom".to_string() });
    }
}
