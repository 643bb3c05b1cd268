//! Fixed-size worker pool with round-robin shares and a per-chunk barrier.
//!
//! Each chunk is split into P shares by position modulo P, one share per
//! worker. Workers process their share sequentially; [`WorkerPool::run_chunk`]
//! returns only once every share is done, so no work crosses a chunk
//! boundary. Survivors are concatenated in share order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{OrthoError, Result};

/// A rayon pool with exactly `workers` threads, built once per run.
pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(OrthoError::InvalidConfig(
                "worker count must be at least 1".into(),
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("orthoset-worker-{i}"))
            .build()
            .map_err(|e| OrthoError::InvalidConfig(format!("failed to start worker pool: {e}")))?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `work` over every item of `chunk`, keeping the `Some` outputs.
    ///
    /// Errors returned by `work` and panics inside it abort the call with
    /// [`OrthoError::WorkerFailure`]; when several shares fail, the lowest
    /// share index is reported.
    pub fn run_chunk<T, R, F>(&self, chunk_idx: usize, chunk: &[T], work: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<Option<R>> + Sync,
    {
        let shares = round_robin(chunk, self.workers);
        let outcomes: Vec<Result<Vec<R>>> = self.pool.install(|| {
            shares
                .par_iter()
                .enumerate()
                .map(|(worker, share)| run_share(worker, chunk_idx, share, &work))
                .collect()
        });

        let mut survivors = Vec::new();
        for outcome in outcomes {
            survivors.extend(outcome?);
        }
        Ok(survivors)
    }
}

/// Share `i` holds the items at positions `i, i + p, i + 2p, ...`.
pub fn round_robin<T>(items: &[T], p: usize) -> Vec<Vec<&T>> {
    let p = p.max(1);
    let mut shares: Vec<Vec<&T>> = (0..p)
        .map(|_| Vec::with_capacity(items.len() / p + 1))
        .collect();
    for (pos, item) in items.iter().enumerate() {
        shares[pos % p].push(item);
    }
    shares
}

fn run_share<T, R, F>(worker: usize, chunk: usize, share: &[&T], work: &F) -> Result<Vec<R>>
where
    F: Fn(&T) -> Result<Option<R>>,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut kept = Vec::new();
        for item in share {
            if let Some(out) = work(*item)? {
                kept.push(out);
            }
        }
        Ok(kept)
    }))
    .unwrap_or_else(|payload| Err(OrthoError::Panic(panic_message(payload))));

    outcome.map_err(|source| OrthoError::WorkerFailure {
        worker,
        chunk,
        source: Box::new(source),
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn test_round_robin_layout() {
        let items: Vec<usize> = (0..7).collect();
        let shares = round_robin(&items, 3);
        let flat: Vec<Vec<usize>> = shares
            .iter()
            .map(|s| s.iter().map(|&&v| v).collect())
            .collect();
        assert_eq!(flat, vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]);
    }

    #[test]
    fn test_round_robin_more_workers_than_items() {
        let items = [1u8, 2];
        let shares = round_robin(&items, 4);
        assert_eq!(shares.len(), 4);
        assert!(shares[2].is_empty() && shares[3].is_empty());
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(OrthoError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_run_chunk_filters_and_orders_by_share() {
        let pool = WorkerPool::new(2).unwrap();
        let items: Vec<u32> = (0..6).collect();
        let out = pool
            .run_chunk(0, &items, |&v| Ok((v != 3).then_some(v * 10)))
            .unwrap();
        // Share 0 = [0, 2, 4], share 1 = [1, 3, 5] with 3 dropped.
        assert_eq!(out, vec![0, 20, 40, 10, 50]);
    }

    #[test]
    fn test_work_runs_on_pool_threads() {
        let pool = WorkerPool::new(3).unwrap();
        let names = Mutex::new(HashSet::new());
        let items: Vec<u32> = (0..30).collect();
        pool.run_chunk(0, &items, |_| {
            let name = std::thread::current().name().unwrap_or("").to_string();
            names.lock().unwrap().insert(name);
            Ok(None::<()>)
        })
        .unwrap();
        let names = names.into_inner().unwrap();
        assert!(names.iter().all(|n| n.starts_with("orthoset-worker-")));
    }

    #[test]
    fn test_error_becomes_worker_failure() {
        let pool = WorkerPool::new(2).unwrap();
        let items: Vec<u32> = (0..4).collect();
        let err = pool
            .run_chunk(7, &items, |&v| {
                if v == 3 {
                    Err(OrthoError::InvalidConfig("bad item".into()))
                } else {
                    Ok(Some(v))
                }
            })
            .unwrap_err();
        match err {
            OrthoError::WorkerFailure {
                worker,
                chunk,
                source,
            } => {
                assert_eq!(worker, 1);
                assert_eq!(chunk, 7);
                assert!(source.to_string().contains("bad item"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_panic_becomes_worker_failure() {
        let pool = WorkerPool::new(2).unwrap();
        let items: Vec<u32> = (0..4).collect();
        let err = pool
            .run_chunk(0, &items, |&v| {
                if v == 2 {
                    panic!("scorer exploded");
                }
                Ok(Some(v))
            })
            .unwrap_err();
        match err {
            OrthoError::WorkerFailure { worker, source, .. } => {
                assert_eq!(worker, 0);
                match *source {
                    OrthoError::Panic(msg) => assert!(msg.contains("scorer exploded")),
                    other => panic!("expected a panic, got {other}"),
                }
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
