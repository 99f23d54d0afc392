/*!
A completion service that partitions finished work by priority.

Submit units of work to a [PriorityCompletionService], each tagged with a [Priority].  The service hands the
work to an [Executor].  When a unit finishes, whether it produced a value, returned an error, or panicked, its
[ResultHandle] is delivered to the completion queue for its priority.  Consumers then harvest finished work
one priority at a time, with blocking ([PriorityCompletionService::take_at]), non-blocking
([PriorityCompletionService::poll_at]) or deadline-bounded ([PriorityCompletionService::poll_timeout_at])
retrieval.  A consumer that only wants `High` results never has to drain past `Low` ones.

# What priority does not do

Priority only picks the queue a result is delivered to.  It has no effect on when work runs, which is the
executor's business.  There is also no merged queue across priorities; pick the priority you want to drain.

# Pieces

* [Priority], re-exported from the `priority` crate.
* [Executor] and a few implementations ([Inline], [ThreadPerJob], [ThreadPool]), re-exported from the `pool`
  crate.
* [CompletionQueueSet], one FIFO of completed handles per declared priority.
* [ResultHandle], the outcome of one submission.  Failures are recorded as [TaskFailure].
* [Interrupt], for cancelling a blocked `take` or timed `poll`.
*/

mod config;
mod error;
mod handle;
mod interrupt;
mod queue;
mod service;
mod trampoline;
mod work;


pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use handle::{BoxError, Completion, ResultHandle, TaskFailure};
pub use interrupt::Interrupt;
pub use queue::{CompletionQueue, CompletionQueueSet};
pub use service::PriorityCompletionService;
pub use work::Work;

pub use pool::{Executor, Inline, Job, PoolConfig, Rejected, ThreadPerJob, ThreadPool};
pub use priority::Priority;
