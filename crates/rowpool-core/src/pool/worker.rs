//! Fixed-size worker pool: an explicit work queue, worker threads, and a
//! join/shutdown routine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

/// A batch of consecutive items; `base` is the input index of the first one.
pub(crate) struct Chunk<T> {
    pub base: usize,
    pub items: Vec<T>,
}

/// Pool of worker threads applying one job to index-tagged items.
///
/// Results come back over an unbounded channel as `(index, result)` pairs
/// in completion order; callers restore input order from the indices.
pub struct WorkerPool<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    chunk_tx: Option<Sender<Chunk<T>>>,
    result_rx: Receiver<(usize, R)>,
    worker_count: usize,
    shutdown: Arc<AtomicBool>,
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl<T, R> WorkerPool<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Spawn `worker_count` workers running `job`. With a task ceiling,
    /// each worker retires after processing that many chunks and hands the
    /// queue to a freshly spawned replacement.
    pub fn new<F>(worker_count: usize, max_tasks_per_worker: Option<usize>, job: F) -> Self
    where
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let worker_count = worker_count.max(1);
        let job = Arc::new(job);
        let (chunk_tx, chunk_rx) = unbounded::<Chunk<T>>();
        let (result_tx, result_rx) = unbounded::<(usize, R)>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let handles = Arc::new(Mutex::new(Vec::with_capacity(worker_count)));

        for _ in 0..worker_count {
            spawn_worker(
                &handles,
                chunk_rx.clone(),
                result_tx.clone(),
                Arc::clone(&shutdown),
                Arc::clone(&job),
                max_tasks_per_worker,
            );
        }

        Self {
            chunk_tx: Some(chunk_tx),
            result_rx,
            worker_count,
            shutdown,
            handles,
        }
    }

    /// Queue every item in index order, batched into `chunk_size` chunks.
    /// Returns the number of items queued.
    pub fn dispatch(&self, items: Vec<T>, chunk_size: usize) -> usize {
        let chunk_size = chunk_size.max(1);
        let total = items.len();
        let tx = match &self.chunk_tx {
            Some(tx) => tx,
            None => return 0,
        };
        let mut base = 0;
        let mut pending = Vec::with_capacity(chunk_size);
        for item in items {
            pending.push(item);
            if pending.len() == chunk_size {
                let items = std::mem::replace(&mut pending, Vec::with_capacity(chunk_size));
                let len = items.len();
                let _ = tx.send(Chunk { base, items });
                base += len;
            }
        }
        if !pending.is_empty() {
            let _ = tx.send(Chunk {
                base,
                items: pending,
            });
        }
        total
    }

    /// Next `(index, result)` pair, or `None` once every worker has exited
    /// and the channel is drained.
    pub fn collect(&self) -> Option<(usize, R)> {
        self.result_rx.recv().ok()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Stop accepting new work; workers exit after draining the queue.
    pub fn close(&mut self) {
        self.chunk_tx = None;
    }

    /// Ask workers to stop after their current chunk, discarding queued work.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.close();
    }

    /// Block until every worker, recycled replacements included, has exited.
    pub fn join(&mut self) {
        loop {
            let handle = self.handles.lock().unwrap().pop();
            match handle {
                Some(handle) => {
                    let _ = handle.join();
                }
                None => break,
            }
        }
    }
}

impl<T, R> Drop for WorkerPool<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    fn drop(&mut self) {
        self.shutdown();
        self.join();
    }
}

fn spawn_worker<T, R, F>(
    handles: &Arc<Mutex<Vec<JoinHandle<()>>>>,
    chunk_rx: Receiver<Chunk<T>>,
    result_tx: Sender<(usize, R)>,
    shutdown: Arc<AtomicBool>,
    job: Arc<F>,
    task_ceiling: Option<usize>,
) where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    let registry = Arc::clone(handles);
    let handle = thread::spawn(move || {
        let mut processed = 0usize;
        loop {
            let chunk = match chunk_rx.recv() {
                Ok(chunk) => chunk,
                Err(_) => break,
            };
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            let mut index = chunk.base;
            for item in chunk.items {
                let result = (job)(item);
                let _ = result_tx.send((index, result));
                index += 1;
            }
            processed += 1;
            if let Some(limit) = task_ceiling {
                if processed >= limit {
                    // retire; the replacement inherits the queue
                    spawn_worker(&registry, chunk_rx, result_tx, shutdown, job, task_ceiling);
                    break;
                }
            }
        }
    });
    handles.lock().unwrap().push(handle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_worker_pool_basic() {
        let mut pool = WorkerPool::new(4, None, |x: i32| x * 2);
        assert_eq!(pool.worker_count(), 4);
        pool.dispatch((0..10).collect(), 1);
        pool.close();

        let mut results = Vec::new();
        for _ in 0..10 {
            if let Some(pair) = pool.collect() {
                results.push(pair);
            }
        }
        pool.join();

        assert_eq!(results.len(), 10);
        results.sort();
        assert!(results.iter().all(|&(i, v)| v == (i as i32) * 2));
    }

    #[test]
    fn test_dispatch_counts_items_not_chunks() {
        let pool: WorkerPool<i32, i32> = WorkerPool::new(2, None, |x| x);
        assert_eq!(pool.dispatch((0..10).collect(), 3), 10);
    }

    #[test]
    fn test_worker_count_is_clamped() {
        let pool: WorkerPool<i32, i32> = WorkerPool::new(0, None, |x| x);
        assert_eq!(pool.worker_count(), 1);
    }

    #[test]
    fn test_recycling_still_completes_all_work() {
        let mut pool = WorkerPool::new(2, Some(1), |x: i32| x + 1);
        let queued = pool.dispatch((0..20).collect(), 3);
        assert_eq!(queued, 20);
        pool.close();

        let mut seen = 0;
        while pool.collect().is_some() {
            seen += 1;
        }
        pool.join();
        assert_eq!(seen, 20);
    }

    #[test]
    fn test_shutdown_discards_queued_work() {
        let mut pool = WorkerPool::new(1, None, |x: i32| {
            thread::sleep(Duration::from_millis(5));
            x
        });
        pool.dispatch((0..100).collect(), 1);
        assert!(pool.collect().is_some());
        pool.shutdown();

        let mut seen = 1;
        while pool.collect().is_some() {
            seen += 1;
        }
        pool.join();
        assert!(seen < 100);
    }
}
