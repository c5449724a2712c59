//! Fixed-size work queue for tile jobs.
//!
//! A pool of long-lived workers parks on a permit counter until a job is
//! started. Released workers claim item indices from the job's shared atomic
//! counter until it runs past the item count, then park again. The
//! orchestrator polls [`WorkQueue::has_completed`] or blocks in
//! [`WorkQueue::wait_until_completion`].
//!
//! Each job carries its own counters, so a worker that is still finishing
//! one job can never claim an index from the next one.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// Errors raised while building the worker pool.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Work queue needs at least one worker")]
    NoWorkers,

    #[error("Failed to spawn worker {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Work callback: `(item_index, worker_index)`.
pub type WorkCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

struct Job {
    callback: WorkCallback,
    item_count: usize,
    next: AtomicUsize,
    completed: AtomicUsize,
}

impl Job {
    fn run(&self, worker_index: usize) {
        loop {
            let item = self.next.fetch_add(1, Ordering::Relaxed);
            if item >= self.item_count {
                break;
            }
            (self.callback)(item, worker_index);
            self.completed.fetch_add(1, Ordering::Release);
        }
    }

    #[inline]
    fn is_complete(&self) -> bool {
        self.completed.load(Ordering::Acquire) >= self.item_count
    }
}

struct Dispatch {
    job: Option<Arc<Job>>,
    permits: usize,
    shutdown: bool,
}

struct Shared {
    dispatch: Mutex<Dispatch>,
    wake: Condvar,
}

/// A fixed pool of worker threads processing one job at a time.
pub struct WorkQueue {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    worker_count: usize,
    current: Option<Arc<Job>>,
}

impl WorkQueue {
    /// Spawn `worker_count` parked workers.
    pub fn new(worker_count: usize) -> Result<Self, SchedulerError> {
        if worker_count == 0 {
            return Err(SchedulerError::NoWorkers);
        }

        let shared = Arc::new(Shared {
            dispatch: Mutex::new(Dispatch {
                job: None,
                permits: 0,
                shutdown: false,
            }),
            wake: Condvar::new(),
        });

        // Built before spawning so an early return joins what was started
        let mut queue = Self {
            shared,
            workers: Vec::with_capacity(worker_count),
            worker_count,
            current: None,
        };

        for index in 0..worker_count {
            let shared = Arc::clone(&queue.shared);
            let handle = thread::Builder::new()
                .name(format!("glint-worker-{index}"))
                .spawn(move || worker_loop(&shared, index))
                .map_err(|source| SchedulerError::Spawn { index, source })?;
            queue.workers.push(handle);
        }

        log::info!("Started {} render workers", worker_count);
        Ok(queue)
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Publish a job of `item_count` items and release up to
    /// `active_workers` workers (at least one) to process it.
    ///
    /// The previous job must have completed.
    pub fn start(&mut self, callback: WorkCallback, item_count: usize, active_workers: usize) {
        debug_assert!(self.has_completed(), "work queue started over an unfinished job");

        let job = Arc::new(Job {
            callback,
            item_count,
            next: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        });
        let permits = active_workers.clamp(1, self.worker_count);

        {
            let mut dispatch = self.shared.dispatch.lock();
            dispatch.job = Some(Arc::clone(&job));
            dispatch.permits = permits;
        }
        self.shared.wake.notify_all();
        self.current = Some(job);

        log::trace!("Started job: {} items on {} workers", item_count, permits);
    }

    /// True once every item of the current job has been processed.
    /// Also true before the first job.
    #[inline]
    pub fn has_completed(&self) -> bool {
        self.current.as_ref().map_or(true, |job| job.is_complete())
    }

    /// Block until the current job has completed.
    pub fn wait_until_completion(&self) {
        while !self.has_completed() {
            thread::yield_now();
        }
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        {
            let mut dispatch = self.shared.dispatch.lock();
            dispatch.shutdown = true;
        }
        self.shared.wake.notify_all();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Render worker panicked");
            }
        }
        log::debug!("Stopped {} render workers", self.worker_count);
    }
}

fn worker_loop(shared: &Shared, worker_index: usize) {
    loop {
        let job = {
            let mut dispatch = shared.dispatch.lock();
            while dispatch.permits == 0 && !dispatch.shutdown {
                shared.wake.wait(&mut dispatch);
            }
            if dispatch.shutdown {
                return;
            }
            dispatch.permits -= 1;
            dispatch.job.clone()
        };

        if let Some(job) = job {
            job.run(worker_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn counting_job(item_count: usize) -> (WorkCallback, Arc<Vec<AtomicU32>>) {
        let counts: Arc<Vec<AtomicU32>> = Arc::new((0..item_count).map(|_| AtomicU32::new(0)).collect());
        let shared = Arc::clone(&counts);
        let callback: WorkCallback = Arc::new(move |item, _worker| {
            shared[item].fetch_add(1, Ordering::Relaxed);
        });
        (callback, counts)
    }

    #[test]
    fn test_every_item_processed_once() {
        for workers in [1, 2, 3, 8] {
            let mut queue = WorkQueue::new(workers).unwrap();
            for items in [0, 1, 5, 64, 1000] {
                for active in [1, workers / 2, workers, workers * 2] {
                    let (callback, counts) = counting_job(items);
                    queue.start(callback, items, active);
                    queue.wait_until_completion();
                    assert!(queue.has_completed());
                    assert!(
                        counts.iter().all(|count| count.load(Ordering::Relaxed) == 1),
                        "workers {workers} items {items} active {active}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_worker_indices_in_range() {
        let mut queue = WorkQueue::new(4).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        queue.start(
            Arc::new(move |_item, worker| sink.lock().push(worker)),
            256,
            4,
        );
        queue.wait_until_completion();

        let seen = seen.lock();
        assert_eq!(seen.len(), 256);
        assert!(seen.iter().all(|&worker| worker < 4));
    }

    #[test]
    fn test_single_active_worker() {
        let mut queue = WorkQueue::new(6).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        queue.start(
            Arc::new(move |_item, worker| sink.lock().push(worker)),
            100,
            1,
        );
        queue.wait_until_completion();

        let seen = seen.lock();
        assert_eq!(seen.len(), 100);
        assert!(seen.iter().all(|&worker| worker == seen[0]));
    }

    #[test]
    fn test_completed_before_first_job() {
        let queue = WorkQueue::new(2).unwrap();
        assert!(queue.has_completed());
        queue.wait_until_completion();
        assert_eq!(queue.worker_count(), 2);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(WorkQueue::new(0), Err(SchedulerError::NoWorkers)));
    }

    #[test]
    fn test_drop_joins_workers() {
        let finished = Arc::new(AtomicU32::new(0));
        {
            let mut queue = WorkQueue::new(3).unwrap();
            let counter = Arc::clone(&finished);
            queue.start(
                Arc::new(move |_item, _worker| {
                    counter.fetch_add(1, Ordering::Relaxed);
                }),
                30,
                3,
            );
            queue.wait_until_completion();
        }
        assert_eq!(finished.load(Ordering::Relaxed), 30);
    }
}
