/*!
The priority completion service.
*/
use std::sync::atomic::Ordering;
use std::time::Duration;
use pool::Executor;
use priority::Priority;
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::handle::ResultHandle;
use crate::interrupt::Interrupt;
use crate::queue::CompletionQueueSet;
use crate::trampoline::Trampoline;
use crate::work::Work;
use crate::BoxError;

/**
Submits work to an executor and hands back completed results, partitioned by priority.

Each submission names a [Priority].  When the work finishes, however it finishes, its [ResultHandle] is
pushed onto the completion queue for that priority.  Consumers then drain whichever priorities they care
about with [Self::take_at], [Self::poll_at] or [Self::poll_timeout_at], and never see completions from other
priorities.

Priority decides only where a result is delivered.  When and in what order work runs is entirely up to the
executor.  Within one queue, handles come out in the order their work finished.

Forms without `_at` use the service's default priority, [ServiceConfig::default_priority].

```
use priority_completion::{Inline, Priority, PriorityCompletionService};

let service = PriorityCompletionService::new(Inline);
service.submit_at(|| Ok(1), Priority::High).unwrap();
service.submit_at(|| Ok(2), Priority::Low).unwrap();

let high = service.take_at(Priority::High).unwrap();
assert_eq!(*high.get().unwrap(), 1);
assert!(service.poll_at(Priority::High).unwrap().is_none());
```
*/
pub struct PriorityCompletionService<V, E> {
    executor: E,
    queues: CompletionQueueSet<V>,
    default_priority: Priority,
}

impl<V, E: std::fmt::Debug> std::fmt::Debug for PriorityCompletionService<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityCompletionService")
            .field("executor", &self.executor)
            .field("queues", &self.queues)
            .field("default_priority", &self.default_priority)
            .finish()
    }
}

impl<V, E> PriorityCompletionService<V, E> where V: Send + Sync + 'static, E: Executor {
    ///A service declaring every priority, with `Low` as the default.
    pub fn new(executor: E) -> Self {
        let config = ServiceConfig::default();
        Self {
            executor,
            queues: CompletionQueueSet::new(&config.levels),
            default_priority: config.default_priority,
        }
    }

    ///A service declaring only `config.levels`.
    ///
    /// Fails with [Error::InvalidArgument] if no levels are declared, and with [Error::InvalidPriority] if the
    /// default priority is not among them.
    pub fn with_config(executor: E, config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            executor,
            queues: CompletionQueueSet::new(&config.levels),
            default_priority: config.default_priority,
        })
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn default_priority(&self) -> Priority {
        self.default_priority
    }

    ///The declared priorities, in index order.
    pub fn levels(&self) -> &[Priority] {
        self.queues.levels()
    }

    pub fn queues(&self) -> &CompletionQueueSet<V> {
        &self.queues
    }

    ///Completed handles waiting to be retrieved at `priority`.
    pub fn pending(&self, priority: Priority) -> Result<usize> {
        self.queues.len(priority)
    }

    /**
    Submits a unit of work at `priority`.

    `None` is an empty unit of work and fails with [Error::InvalidArgument].  An undeclared priority fails with
    [Error::InvalidPriority], and an executor that refuses the job fails with [Error::Rejected].  In each of
    these cases nothing runs and nothing is enqueued.

    Otherwise this returns as soon as the executor has accepted the job.  The handle completes when the work
    does, and is then delivered to the queue for `priority` exactly once.
    */
    pub fn submit_work(&self, work: Option<Work<V>>, priority: Priority) -> Result<ResultHandle<V>> {
        let work = work.ok_or(Error::InvalidArgument("work must not be empty"))?;
        let queue = self.queues.queue_for(priority)?;
        let (handle, promise) = ResultHandle::pending(priority);
        let (trampoline, disarmed) = Trampoline::new(work, promise, handle.clone(), queue.sender());
        tracing::debug!(id = handle.id(), %priority, "submitting work");
        match self.executor.execute(trampoline.into_job()) {
            Ok(()) => Ok(handle),
            Err(rejected) => {
                disarmed.store(true, Ordering::Release);
                drop(rejected);
                tracing::debug!(id = handle.id(), %priority, "executor rejected work");
                Err(Error::Rejected)
            }
        }
    }

    ///Submits a computation at `priority`.  Returning `Err` fails the work, not the submission.
    pub fn submit_at<F>(&self, f: F, priority: Priority) -> Result<ResultHandle<V>>
        where F: FnOnce() -> std::result::Result<V, BoxError> + Send + 'static {
        self.submit_work(Some(Work::call(f)), priority)
    }

    ///Submits a computation at the default priority.
    pub fn submit<F>(&self, f: F) -> Result<ResultHandle<V>>
        where F: FnOnce() -> std::result::Result<V, BoxError> + Send + 'static {
        self.submit_at(f, self.default_priority)
    }

    ///Submits an action at `priority`; on success the handle reports `result`.
    pub fn submit_runnable_at<F>(&self, f: F, result: V, priority: Priority) -> Result<ResultHandle<V>>
        where F: FnOnce() + Send + 'static {
        self.submit_work(Some(Work::run(f, result)), priority)
    }

    ///Submits an action at the default priority; on success the handle reports `result`.
    pub fn submit_runnable<F>(&self, f: F, result: V) -> Result<ResultHandle<V>>
        where F: FnOnce() + Send + 'static {
        self.submit_runnable_at(f, result, self.default_priority)
    }

    ///Blocks until a handle is available at `priority`, then removes the oldest.
    pub fn take_at(&self, priority: Priority) -> Result<ResultHandle<V>> {
        Ok(self.queues.queue_for(priority)?.pop())
    }

    pub fn take(&self) -> Result<ResultHandle<V>> {
        self.take_at(self.default_priority)
    }

    ///As [Self::take_at], but gives up with [Error::Interrupted] once `interrupt` fires.
    ///
    /// An interrupted wait removes nothing from the queue.
    pub fn take_interruptible(&self, priority: Priority, interrupt: &Interrupt) -> Result<ResultHandle<V>> {
        let queue = self.queues.queue_for(priority)?;
        let result = queue.pop_interruptible(interrupt);
        if result.is_err() {
            tracing::debug!(%priority, "take interrupted");
        }
        result
    }

    ///Removes the oldest handle at `priority`, or returns `None` if there is none.  Never blocks.
    pub fn poll_at(&self, priority: Priority) -> Result<Option<ResultHandle<V>>> {
        Ok(self.queues.queue_for(priority)?.try_pop())
    }

    pub fn poll(&self) -> Result<Option<ResultHandle<V>>> {
        self.poll_at(self.default_priority)
    }

    ///Waits up to `timeout` for a handle at `priority`.  Returns immediately if one is already there.
    pub fn poll_timeout_at(&self, timeout: Duration, priority: Priority) -> Result<Option<ResultHandle<V>>> {
        Ok(self.queues.queue_for(priority)?.pop_timeout(timeout))
    }

    pub fn poll_timeout(&self, timeout: Duration) -> Result<Option<ResultHandle<V>>> {
        self.poll_timeout_at(timeout, self.default_priority)
    }

    ///As [Self::poll_timeout_at], but gives up with [Error::Interrupted] once `interrupt` fires.
    pub fn poll_timeout_interruptible(&self, timeout: Duration, priority: Priority, interrupt: &Interrupt) -> Result<Option<ResultHandle<V>>> {
        let queue = self.queues.queue_for(priority)?;
        let result = queue.pop_timeout_interruptible(timeout, interrupt);
        if result.is_err() {
            tracing::debug!(%priority, "timed poll interrupted");
        }
        result
    }

    ///Removes every handle currently waiting at `priority`, oldest first.  Never blocks.
    pub fn drain(&self, priority: Priority) -> Result<Vec<ResultHandle<V>>> {
        let queue = self.queues.queue_for(priority)?;
        Ok(std::iter::from_fn(|| queue.try_pop()).collect())
    }
}
