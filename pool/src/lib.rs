/*!
Executors for completion services.

A completion service never runs work itself.  It wraps each unit of work and hands the wrapped job to an
[Executor], which decides which thread runs it and when.  This crate defines that seam, plus a few executors
that cover the common cases:

* [Inline] runs the job on the calling thread before `execute` returns.  Mostly useful for tests and for
  work that is cheaper than a context switch.
* [ThreadPerJob] spawns a fresh OS thread per job.  Simple, and unbounded.
* [ThreadPool] is a fixed set of worker threads pulling from a shared channel.  This is the one you want for
  real workloads.

# Rejection

An executor may refuse work, for example a [ThreadPool] after [ThreadPool::shutdown].  A refusal hands the job
back to the caller inside [Rejected], the same way a channel returns an unsent message.  Callers that wrap
jobs with drop-time side effects can therefore decide what happens to a refused job instead of having it
dropped behind their back.
*/

mod inline;
mod threadpool;

pub use inline::{Inline, ThreadPerJob};
pub use threadpool::{threadpool_size, PoolConfig, ThreadPool};

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

///A unit of work, as seen by an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

///The executor refused a job.  The job was not run and is handed back.
#[derive(thiserror::Error)]
#[error("executor rejected the job")]
pub struct Rejected {
    pub job: Job,
}

impl Rejected {
    pub fn new(job: Job) -> Self {
        Self { job }
    }
    ///Recovers the job that was not run.
    pub fn into_job(self) -> Job {
        self.job
    }
}

impl Debug for Rejected {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Rejected{..}")
    }
}

/**
Runs jobs asynchronously, on some thread, at some future time.

Implementations make no promises about fairness, parallelism or ordering.  The only contract is that an
accepted job is eventually either run or dropped, and that a refused job is returned in [Rejected].
*/
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job) -> Result<(), Rejected>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, job: Job) -> Result<(), Rejected> {
        (**self).execute(job)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&self, job: Job) -> Result<(), Rejected> {
        (**self).execute(job)
    }
}

#[cfg(test)] mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::{Executor, Inline, Rejected};

    #[test] fn arc_forwards() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor: Arc<dyn Executor> = Arc::new(Inline);
        let move_counter = counter.clone();
        executor.execute(Box::new(move || { move_counter.fetch_add(1, Ordering::Relaxed); })).unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test] fn rejected_returns_job() {
        let counter = Arc::new(AtomicUsize::new(0));
        let move_counter = counter.clone();
        let rejected = Rejected::new(Box::new(move || { move_counter.fetch_add(1, Ordering::Relaxed); }));
        assert_eq!(format!("{rejected:?}"), "Rejected{..}");
        (rejected.into_job())();
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }
}
