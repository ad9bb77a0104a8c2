//! Bulk parallel map entry points over the worker pool.
//!
//! Every mode dispatches one pool per call, blocks until the dispatched
//! items complete, and returns results in input order.

use std::error::Error as StdError;

use super::worker::WorkerPool;
use crate::error::Error;

/// Configuration for a bulk map call
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Items batched per dispatch, to amortize queue traffic
    pub chunk_size: usize,
    /// Recycle a worker after it has processed this many chunks
    pub max_tasks_per_worker: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            chunk_size: 1,
            max_tasks_per_worker: None,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workers(mut self, count: usize) -> Self {
        self.workers = count.max(1);
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    pub fn max_tasks_per_worker(mut self, limit: usize) -> Self {
        self.max_tasks_per_worker = Some(limit.max(1));
        self
    }

    /// Apply `f` to every item; results in input order.
    pub fn map<I, O, F>(&self, items: Vec<I>, f: F) -> Vec<O>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        run_ordered(items, self, f)
    }

    /// Fail-fast map: the first failure observed aborts the call with
    /// `ItemFailure`, discarding still-queued work. In-flight chunks
    /// finish before the pool is torn down.
    pub fn try_map<I, O, E, F>(&self, items: Vec<I>, f: F) -> Result<Vec<O>, Error>
    where
        I: Send + 'static,
        O: Send + 'static,
        E: StdError + Send + Sync + 'static,
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
    {
        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let mut pool = WorkerPool::new(self.workers, self.max_tasks_per_worker, f);
        pool.dispatch(items, self.chunk_size);
        pool.close();

        let mut slots: Vec<Option<O>> = Vec::with_capacity(total);
        slots.resize_with(total, || None);
        let mut received = 0;
        while received < total {
            match pool.collect() {
                Some((index, Ok(value))) => {
                    slots[index] = Some(value);
                    received += 1;
                }
                Some((index, Err(source))) => {
                    pool.shutdown();
                    pool.join();
                    return Err(Error::item_failure(index, source));
                }
                None => break,
            }
        }
        pool.join();
        Ok(slots.into_iter().flatten().collect())
    }

    /// Fail-soft map, legacy shape: successes only, in input order with
    /// failed indices skipped. Failures are not logged by this layer; use
    /// `map_outcomes` to see them.
    pub fn map_failsoft<I, O, E, F>(&self, items: Vec<I>, f: F) -> Vec<O>
    where
        I: Send + 'static,
        O: Send + 'static,
        E: Send + 'static,
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
    {
        self.map_outcomes(items, f)
            .into_iter()
            .filter_map(Result::ok)
            .collect()
    }

    /// Fail-soft map with per-item reporting: one outcome per input item,
    /// in input order, so callers can see which indices failed and why.
    pub fn map_outcomes<I, O, E, F>(&self, items: Vec<I>, f: F) -> Vec<Result<O, E>>
    where
        I: Send + 'static,
        O: Send + 'static,
        E: Send + 'static,
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
    {
        run_ordered(items, self, f)
    }
}

/// Apply `f` to every item with the default pool configuration.
pub fn parallel_map<I, O, F>(items: Vec<I>, f: F) -> Vec<O>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    PoolConfig::default().map(items, f)
}

/// Fail-fast map with the default pool configuration.
pub fn try_parallel_map<I, O, E, F>(items: Vec<I>, f: F) -> Result<Vec<O>, Error>
where
    I: Send + 'static,
    O: Send + 'static,
    E: StdError + Send + Sync + 'static,
    F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
{
    PoolConfig::default().try_map(items, f)
}

/// Fail-soft map (successes only) with the default pool configuration.
pub fn parallel_map_failsoft<I, O, E, F>(items: Vec<I>, f: F) -> Vec<O>
where
    I: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
    F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
{
    PoolConfig::default().map_failsoft(items, f)
}

/// Fail-soft map with per-item outcomes, default pool configuration.
pub fn parallel_map_outcomes<I, O, E, F>(items: Vec<I>, f: F) -> Vec<Result<O, E>>
where
    I: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
    F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
{
    PoolConfig::default().map_outcomes(items, f)
}

fn run_ordered<I, R, F>(items: Vec<I>, config: &PoolConfig, job: F) -> Vec<R>
where
    I: Send + 'static,
    R: Send + 'static,
    F: Fn(I) -> R + Send + Sync + 'static,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    let mut pool = WorkerPool::new(config.workers, config.max_tasks_per_worker, job);
    pool.dispatch(items, config.chunk_size);
    pool.close();

    let mut slots: Vec<Option<R>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);
    let mut received = 0;
    while received < total {
        match pool.collect() {
            Some((index, result)) => {
                slots[index] = Some(result);
                received += 1;
            }
            None => break,
        }
    }
    pool.join();
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    struct BadItem;

    impl fmt::Display for BadItem {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "bad item")
        }
    }

    impl StdError for BadItem {}

    // first field divided by last field; zero or empty fails
    fn checked_ratio(values: Vec<i32>) -> Result<i32, BadItem> {
        let last = *values.last().ok_or(BadItem)?;
        if last == 0 {
            return Err(BadItem);
        }
        Ok(values[0] / last)
    }

    #[test]
    fn test_parallel_map_identity_keeps_order() {
        let items: Vec<i32> = (0..100).collect();
        assert_eq!(parallel_map(items.clone(), |x| x), items);
    }

    #[test]
    fn test_parallel_map_sums_rows() {
        let items = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let results = parallel_map(items, |row| row.into_iter().sum::<i32>());
        assert_eq!(results, vec![6, 15]);
    }

    #[test]
    fn test_parallel_map_explicit_config() {
        let items: Vec<i32> = (0..250).collect();
        let config = PoolConfig::new()
            .workers(4)
            .chunk_size(8)
            .max_tasks_per_worker(2);
        let results = config.map(items, |x| x * 2);
        assert_eq!(results.len(), 250);
        assert!(results
            .iter()
            .enumerate()
            .all(|(i, &r)| r == (i as i32) * 2));
    }

    #[test]
    fn test_parallel_map_empty_items() {
        let results = parallel_map(Vec::new(), |x: i32| x);
        assert!(results.is_empty());
    }

    #[test]
    fn test_try_map_all_ok() {
        let items = vec![vec![1, 2, 3], vec![4, 5, 6]];
        assert_eq!(try_parallel_map(items, checked_ratio).unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_try_map_propagates_failure() {
        let items = vec![vec![1, 2, 3], vec![4, 5, 0]];
        let err = try_parallel_map(items, checked_ratio).unwrap_err();
        match err {
            Error::ItemFailure { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_try_map_failure_with_chunking() {
        let items = vec![vec![1, 2, 3], vec![4, 5, 0]];
        let config = PoolConfig::new().chunk_size(2).max_tasks_per_worker(2);
        assert!(config.try_map(items, checked_ratio).is_err());
    }

    #[test]
    fn test_failsoft_drops_the_failing_item() {
        let items = vec![vec![1, 2, 3], vec![4, 5, 0]];
        let results = parallel_map_failsoft(items, checked_ratio);
        assert_eq!(results.len(), 1);

        let items = vec![vec![1, 2, 3], vec![4, 5, 0]];
        let results = PoolConfig::new()
            .chunk_size(2)
            .map_failsoft(items, checked_ratio);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_failsoft_keeps_input_order_of_successes() {
        let items: Vec<i32> = (0..50).collect();
        let results = PoolConfig::new().workers(8).map_failsoft(items, |x| {
            if x % 7 == 0 {
                Err(BadItem)
            } else {
                Ok(x)
            }
        });
        let expected: Vec<i32> = (0..50).filter(|x| x % 7 != 0).collect();
        assert_eq!(results, expected);
    }

    #[test]
    fn test_failsoft_all_failed_is_empty() {
        let items = vec![vec![1, 0], vec![2, 0]];
        let results = parallel_map_failsoft(items, checked_ratio);
        assert!(results.is_empty());
    }

    #[test]
    fn test_outcomes_reports_failed_indices() {
        let items = vec![vec![1, 2, 3], vec![4, 5, 0], vec![6, 3, 2]];
        let outcomes = parallel_map_outcomes(items, checked_ratio);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[1], Err(BadItem));
        assert_eq!(outcomes[2], Ok(3));
    }
}
