/*!
A fixed-size worker pool.

Workers share one unbounded `crossbeam_channel`.  crossbeam's queue is lock-free on the send side, which is the
hot path here, since completion services call [Executor::execute] from arbitrary threads.
*/
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use crate::{Executor, Job, Rejected};

///The number of threads a pool uses when [PoolConfig::threads] is zero.
///
/// This is the parallelism the OS reports for this process, or 1 if it cannot tell.
pub fn threadpool_size() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[derive(Debug,Clone,PartialEq,Eq,Serialize,Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    ///Worker count.  Zero means [threadpool_size].
    pub threads: usize,
    ///Prefix for worker thread names.  Workers are named `{name}-{index}`.
    pub name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            name: "pool".to_owned(),
        }
    }
}

impl PoolConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
    fn resolved_threads(&self) -> usize {
        if self.threads == 0 { threadpool_size() } else { self.threads }
    }
}

struct Shared {
    receiver: Receiver<Job>,
    //jobs currently being run by some worker
    running: AtomicUsize,
}

/**
A fixed set of worker threads.

Jobs are run in the order they were sent, by whichever worker is free.  After [ThreadPool::shutdown], new jobs
are refused with [Rejected], and jobs already queued are still run before the workers exit.  Dropping the pool
shuts it down.
*/
pub struct ThreadPool {
    //None once shut down
    sender: RwLock<Option<Sender<Job>>>,
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    threads: usize,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let threads = self.threads;
        let queued = self.queued();
        let running = self.running();
        f.write_fmt(format_args!("<ThreadPool{{threads: {threads} queued: {queued} running: {running}, ..}}"))
    }
}

fn worker_entrypoint_fn(shared: Arc<Shared>) {
    tracing::trace!("worker started");
    //recv fails only once every sender is gone and the channel is empty
    while let Ok(job) = shared.receiver.recv() {
        shared.running.fetch_add(1, Ordering::Relaxed);
        if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
            let message = panic.downcast_ref::<&str>().map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            tracing::warn!(panic = %message, "job panicked on pool worker");
        }
        shared.running.fetch_sub(1, Ordering::Relaxed);
    }
    tracing::trace!("worker exiting");
}

impl ThreadPool {
    pub fn new(config: PoolConfig) -> std::io::Result<Self> {
        let threads = config.resolved_threads();
        let (sender, receiver) = crossbeam_channel::unbounded();
        let shared = Arc::new(Shared {
            receiver,
            running: AtomicUsize::new(0),
        });
        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let move_shared = shared.clone();
            let handle = std::thread::Builder::new()
                .name(format!("{}-{index}", config.name))
                .spawn(move || worker_entrypoint_fn(move_shared))?;
            workers.push(handle);
        }
        tracing::debug!(threads, name = %config.name, "thread pool started");
        Ok(Self {
            sender: RwLock::new(Some(sender)),
            shared,
            workers: Mutex::new(workers),
            threads,
        })
    }

    ///A pool with [PoolConfig::default].
    pub fn with_default_config() -> std::io::Result<Self> {
        Self::new(PoolConfig::default())
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    ///Jobs accepted but not yet picked up by a worker.
    pub fn queued(&self) -> usize {
        self.shared.receiver.len()
    }

    ///Jobs a worker is running right now.
    pub fn running(&self) -> usize {
        self.shared.running.load(Ordering::Relaxed)
    }

    pub fn is_shutdown(&self) -> bool {
        self.sender.read().map(|s| s.is_none()).unwrap_or(true)
    }

    /**
    Stops accepting jobs, runs what is already queued, and joins the workers.

    Calling this more than once is harmless.  If called from one of the pool's own workers, that worker is not
    joined (it would be joining itself) and exits once it returns to its loop.
    */
    pub fn shutdown(&self) {
        let sender = match self.sender.write() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if sender.is_none() {
            return;
        }
        drop(sender);
        tracing::debug!(queued = self.queued(), "thread pool shutting down");
        let workers = match self.workers.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        let current = std::thread::current().id();
        for worker in workers {
            if worker.thread().id() == current {
                continue;
            }
            //workers contain job panics, so a join error means the worker loop itself broke
            if worker.join().is_err() {
                tracing::warn!("pool worker exited abnormally");
            }
        }
    }
}

impl Executor for ThreadPool {
    fn execute(&self, job: Job) -> Result<(), Rejected> {
        let guard = match self.sender.read() {
            Ok(guard) => guard,
            Err(_) => return Err(Rejected::new(job)),
        };
        match guard.as_ref() {
            None => Err(Rejected::new(job)),
            Some(sender) => sender.send(job).map_err(|e| Rejected::new(e.into_inner())),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)] mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use crate::{Executor, PoolConfig, ThreadPool};

    #[test] fn runs_on_all_workers() {
        let pool = ThreadPool::new(PoolConfig::default().with_threads(4).with_name("runs")).unwrap();
        assert_eq!(pool.threads(), 4);
        let (sender, receiver) = crossbeam_channel::unbounded();
        let (release_sender, release_receiver) = crossbeam_channel::unbounded::<()>();
        for _ in 0..4 {
            let sender = sender.clone();
            let release_receiver = release_receiver.clone();
            pool.execute(Box::new(move || {
                sender.send(std::thread::current().name().unwrap().to_owned()).unwrap();
                //hold the worker so every job lands on a different thread
                let _ = release_receiver.recv_timeout(Duration::from_secs(5));
            })).unwrap();
        }
        let mut names = HashSet::new();
        for _ in 0..4 {
            names.insert(receiver.recv_timeout(Duration::from_secs(5)).unwrap());
        }
        drop(release_sender);
        assert_eq!(names.len(), 4);
        assert!(names.iter().all(|n| n.starts_with("runs-")));
    }

    #[test] fn shutdown_runs_queued_then_rejects() {
        let pool = ThreadPool::new(PoolConfig::default().with_threads(1)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let counter = counter.clone();
            pool.execute(Box::new(move || {
                std::thread::sleep(Duration::from_micros(100));
                counter.fetch_add(1, Ordering::Relaxed);
            })).unwrap();
        }
        pool.shutdown();
        assert!(pool.is_shutdown());
        assert_eq!(counter.load(Ordering::Relaxed), 50);

        let move_counter = counter.clone();
        let rejected = pool.execute(Box::new(move || { move_counter.fetch_add(1, Ordering::Relaxed); })).unwrap_err();
        (rejected.into_job())();
        assert_eq!(counter.load(Ordering::Relaxed), 51);
        //second shutdown is a no-op
        pool.shutdown();
    }

    #[test] fn running_counts_held_jobs() {
        let pool = ThreadPool::new(PoolConfig::default().with_threads(2)).unwrap();
        assert_eq!(pool.running(), 0);
        let (started_sender, started_receiver) = crossbeam_channel::unbounded();
        let (release_sender, release_receiver) = crossbeam_channel::unbounded::<()>();
        for _ in 0..2 {
            let started_sender = started_sender.clone();
            let release_receiver = release_receiver.clone();
            pool.execute(Box::new(move || {
                started_sender.send(()).unwrap();
                let _ = release_receiver.recv_timeout(Duration::from_secs(5));
            })).unwrap();
        }
        for _ in 0..2 {
            started_receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        assert_eq!(pool.running(), 2);
        assert!(format!("{pool:?}").contains("running: 2"));
        drop(release_sender);
        pool.shutdown();
        assert_eq!(pool.running(), 0);
    }

    #[test] fn panicking_job_keeps_worker() {
        let pool = ThreadPool::new(PoolConfig::default().with_threads(1)).unwrap();
        pool.execute(Box::new(|| panic!("job panic"))).unwrap();
        let (sender, receiver) = crossbeam_channel::bounded(1);
        pool.execute(Box::new(move || sender.send(()).unwrap())).unwrap();
        receiver.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    #[test] fn zero_threads_means_available_parallelism() {
        let pool = ThreadPool::new(PoolConfig::default()).unwrap();
        assert_eq!(pool.threads(), crate::threadpool_size());
        assert!(pool.threads() >= 1);
    }

    #[test] fn config_from_toml() {
        let config: PoolConfig = toml::from_str("threads = 3").unwrap();
        assert_eq!(config, PoolConfig::default().with_threads(3));
    }
}
