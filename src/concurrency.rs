//! Deterministic batched parallelism for bulk passes over the documentation graph.
//!
//! Work is split into slices, sized so that each worker gets about
//! [`BatchConfig::batches_per_core`] slices but no slice is smaller than
//! [`BatchConfig::min_batch_size`]. Slices run on a rayon pool sized by
//! [`BatchConfig::worker_count`]. Every partial result is tagged with its slice index and sorted
//! on it afterwards, so the output never depends on scheduling.
//!
//! With [`Parallelism::Sequential`] (and always on `wasm32`) the same slices are processed in
//! order on the calling thread, producing identical results.

use rayon::{prelude::*, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use crate::error::TopicGraphError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Parallelism {
    Sequential,
    /// One worker per available core, capped by [`BatchConfig::max_workers`].
    #[default]
    Available,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub parallelism: Parallelism,
    pub min_batch_size: usize,
    pub batches_per_core: usize,
    pub max_workers: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            parallelism: Parallelism::Available,
            min_batch_size: 20,
            batches_per_core: 10,
            max_workers: None,
        }
    }
}

impl BatchConfig {
    pub fn sequential() -> Self {
        BatchConfig {
            parallelism: Parallelism::Sequential,
            ..Default::default()
        }
    }

    /// Number of concurrent workers, never more than the number of cores.
    pub fn worker_count(&self) -> usize {
        if cfg!(target_arch = "wasm32") || self.parallelism == Parallelism::Sequential {
            return 1;
        }
        let cores = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.max_workers
            .map(|max| max.clamp(1, cores))
            .unwrap_or(cores)
    }

    /// Slice length for `len` items spread over `workers` workers.
    pub fn batch_size(&self, len: usize, workers: usize) -> usize {
        let target_batches = workers.max(1) * self.batches_per_core.max(1);
        len.div_ceil(target_batches).max(self.min_batch_size.max(1))
    }
}

/// Cooperative cancellation for bulk passes. Checked between slices only: a slice that has
/// started always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn is_cancelled(cancel: Option<&CancellationToken>) -> bool {
    cancel.is_some_and(|token| token.is_cancelled())
}

/// Run `on_batch` over every slice. Returns the index-tagged results and whether every slice was
/// processed.
fn run_batches<T, R, F>(
    items: &[T],
    config: &BatchConfig,
    cancel: Option<&CancellationToken>,
    on_batch: F,
) -> (Vec<(usize, R)>, bool)
where
    T: Sync,
    R: Send,
    F: Fn(&[T]) -> R + Sync,
{
    if items.is_empty() {
        return (vec![], true);
    }
    let workers = config.worker_count();
    let size = config.batch_size(items.len(), workers);
    let total = items.len().div_ceil(size);
    tracing::debug!(
        "[concurrency::run_batches] {} items, {} slices of {}, {} workers",
        items.len(),
        total,
        size,
        workers.min(total)
    );

    let sequential = |items: &[T]| {
        let mut results = Vec::with_capacity(total);
        for (idx, slice) in items.chunks(size).enumerate() {
            if is_cancelled(cancel) {
                break;
            }
            results.push((idx, on_batch(slice)));
        }
        results
    };

    let results = if workers <= 1 || total == 1 {
        sequential(items)
    } else {
        match ThreadPoolBuilder::new().num_threads(workers.min(total)).build() {
            Ok(pool) => pool.install(|| {
                items
                    .par_chunks(size)
                    .enumerate()
                    .filter_map(|(idx, slice)| {
                        if is_cancelled(cancel) {
                            None
                        } else {
                            Some((idx, on_batch(slice)))
                        }
                    })
                    .collect::<Vec<(usize, R)>>()
            }),
            Err(err) => {
                tracing::warn!(
                    "[concurrency::run_batches] Could not start {workers} workers, running \
                     sequentially: {err}"
                );
                sequential(items)
            }
        }
    };
    let complete = results.len() == total;
    (results, complete)
}

/// Map every item, preserving input order in the output.
///
/// Returns [`TopicGraphError::OperationCancelled`] if the token was cancelled before every slice
/// was scheduled.
pub fn concurrent_map<T, R, F>(
    items: &[T],
    config: &BatchConfig,
    cancel: Option<&CancellationToken>,
    f: F,
) -> Result<Vec<R>, TopicGraphError>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let (mut batches, complete) = run_batches(items, config, cancel, |slice| {
        slice.iter().map(&f).collect::<Vec<R>>()
    });
    if !complete {
        return Err(TopicGraphError::OperationCancelled);
    }
    batches.sort_by_key(|(idx, _)| *idx);
    Ok(batches.into_iter().flat_map(|(_, res)| res).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn parallel(max_workers: usize) -> BatchConfig {
        BatchConfig {
            parallelism: Parallelism::Available,
            min_batch_size: 3,
            batches_per_core: 2,
            max_workers: Some(max_workers),
        }
    }

    #[test]
    fn test_batch_size() {
        let config = BatchConfig::default();
        // never below the minimum
        assert_eq!(config.batch_size(10, 4), 20);
        // ~10 slices per worker above it
        assert_eq!(config.batch_size(10_000, 4), 250);
        assert_eq!(config.batch_size(10_001, 4), 251);
        assert_eq!(config.batch_size(0, 4), 20);
    }

    #[test]
    fn test_sequential_uses_one_worker() {
        assert_eq!(BatchConfig::sequential().worker_count(), 1);
        let capped = BatchConfig {
            max_workers: Some(1),
            ..Default::default()
        };
        assert_eq!(capped.worker_count(), 1);
    }

    #[test]
    fn test_map_preserves_order_in_both_modes() {
        let items: Vec<usize> = (0..1_000).collect();
        let sequential =
            concurrent_map(&items, &BatchConfig::sequential(), None, |n| n * 2).unwrap();
        let threaded = concurrent_map(&items, &parallel(4), None, |n| n * 2).unwrap();
        assert_eq!(sequential, threaded);
        assert_eq!(sequential[999], 1998);
        assert!(concurrent_map(&Vec::<usize>::new(), &parallel(4), None, |n| *n)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parallel_map_sees_every_item_once() {
        let items: Vec<usize> = (0..257).collect();
        let seen = AtomicUsize::new(0);
        let mapped = concurrent_map(&items, &parallel(3), None, |n| {
            seen.fetch_add(1, Ordering::SeqCst);
            *n
        })
        .unwrap();
        assert_eq!(mapped, items);
        assert_eq!(seen.load(Ordering::SeqCst), 257);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let items: Vec<usize> = (0..100).collect();
        let err = concurrent_map(&items, &parallel(2), Some(&token), |n| *n).unwrap_err();
        assert_eq!(err, TopicGraphError::OperationCancelled);
    }

    #[test]
    fn test_cancellation_stops_scheduling_between_slices() {
        let token = CancellationToken::new();
        let processed = AtomicUsize::new(0);
        let items: Vec<usize> = (0..100).collect();
        let config = BatchConfig {
            min_batch_size: 10,
            ..BatchConfig::sequential()
        };
        let res = concurrent_map(&items, &config, Some(&token), |n| {
            processed.fetch_add(1, Ordering::SeqCst);
            if *n == 0 {
                token.cancel();
            }
        });
        assert_eq!(res, Err(TopicGraphError::OperationCancelled));
        // the running slice finished, nothing after it started
        assert_eq!(processed.load(Ordering::SeqCst), 10);
    }
}
