/*!
Result handles.

A [ResultHandle] is the caller's view of one submission.  The writing side is a [Promise], owned by the
completion trampoline.  A promise is consumed when it completes, and a promise dropped without completing
records [TaskFailure::Abandoned], so every handle eventually completes exactly once.

Blocked readers are woken through a zero-message channel whose only sender lives in the promise.  Dropping
the promise disconnects the channel, which releases every `recv` at once, including ones with a deadline.
*/
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;
use atomic_waker::AtomicWaker;
use crossbeam_channel::{Receiver, Sender};
use once_cell::sync::OnceCell;
use priority::Priority;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

///Why a unit of work did not produce a value.
#[derive(Debug,thiserror::Error)]
pub enum TaskFailure {
    ///The work returned an error.
    #[error("work failed: {0}")]
    Failed(#[source] BoxError),
    ///The work panicked.  Holds the panic message, if it was a string.
    #[error("work panicked: {0}")]
    Panicked(String),
    ///The executor dropped the work without running it.
    #[error("work was dropped by the executor without running")]
    Abandoned,
}

type Outcome<V> = Result<V, TaskFailure>;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

struct Shared<V> {
    id: u64,
    priority: Priority,
    outcome: OnceCell<Outcome<V>>,
    //never carries a message; disconnects when the promise is dropped
    done: Receiver<()>,
    waker: AtomicWaker,
}

/**
The pending or completed outcome of one submitted unit of work.

Handles are cheap to clone; every clone observes the same outcome.  A handle is usable on its own, without
going through a completion queue: check [ResultHandle::is_done], block in [ResultHandle::get], or await
[ResultHandle::completion].
*/
pub struct ResultHandle<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for ResultHandle<V> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone() }
    }
}

impl<V> Debug for ResultHandle<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = self.shared.id;
        let priority = self.shared.priority;
        let done = self.is_done();
        f.write_fmt(format_args!("<ResultHandle{{id: {id} priority: {priority} done: {done}}}>"))
    }
}

impl<V> ResultHandle<V> {
    ///Creates a pending handle and the promise that completes it.
    pub(crate) fn pending(priority: Priority) -> (ResultHandle<V>, Promise<V>) {
        let (sender, receiver) = crossbeam_channel::bounded(0);
        let shared = Arc::new(Shared {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            priority,
            outcome: OnceCell::new(),
            done: receiver,
            waker: AtomicWaker::new(),
        });
        let promise = Promise { shared: shared.clone(), _done: sender };
        (ResultHandle { shared }, promise)
    }

    ///Process-unique id assigned at submission.  Ids increase in submission order.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    ///The priority this handle was submitted at, which is also the queue it is delivered to.
    pub fn priority(&self) -> Priority {
        self.shared.priority
    }

    pub fn is_done(&self) -> bool {
        self.shared.outcome.get().is_some()
    }

    ///The outcome, if the work has completed.  Never blocks.
    pub fn try_get(&self) -> Option<Result<&V, &TaskFailure>> {
        self.shared.outcome.get().map(|o| o.as_ref())
    }

    ///Blocks until the work completes.
    pub fn get(&self) -> Result<&V, &TaskFailure> {
        self.shared.outcome.wait().as_ref()
    }

    ///Blocks until the work completes or `timeout` elapses.  Returns `None` on timeout.
    pub fn get_timeout(&self, timeout: Duration) -> Option<Result<&V, &TaskFailure>> {
        if let Some(outcome) = self.try_get() {
            return Some(outcome);
        }
        //either outcome: disconnect means done, timeout means look one last time
        let _ = self.shared.done.recv_timeout(timeout);
        self.try_get()
    }

    ///A future resolving to the outcome.
    ///
    /// Only the most recently polled [Completion] for a handle is woken, so await one at a time.
    pub fn completion(&self) -> Completion<'_, V> {
        Completion { handle: self }
    }

    ///True if both handles came from the same submission.
    pub fn same_submission(&self, other: &ResultHandle<V>) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

///Future returned by [ResultHandle::completion].
#[derive(Debug)]
pub struct Completion<'a, V> {
    handle: &'a ResultHandle<V>,
}

impl<'a, V> Future for Completion<'a, V> {
    type Output = Result<&'a V, &'a TaskFailure>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let handle: &'a ResultHandle<V> = self.handle;
        if let Some(outcome) = handle.try_get() {
            return Poll::Ready(outcome);
        }
        handle.shared.waker.register(cx.waker());
        //try one more time, the promise may have completed before we registered
        match handle.try_get() {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

/**
The writing side of a [ResultHandle].

# Invariants
* There is exactly one promise per handle.
* The outcome is written at most once; a promise dropped without [Promise::complete] writes
  [TaskFailure::Abandoned].
*/
pub(crate) struct Promise<V> {
    shared: Arc<Shared<V>>,
    //dropped after `Drop::drop` runs, so readers are released only once the outcome is written
    _done: Sender<()>,
}

impl<V> Promise<V> {
    pub(crate) fn complete(self, outcome: Outcome<V>) {
        //the promise is the only writer, so this cannot already be set
        let _ = self.shared.outcome.set(outcome);
    }
}

impl<V> Drop for Promise<V> {
    fn drop(&mut self) {
        if self.shared.outcome.get().is_none() {
            let _ = self.shared.outcome.set(Err(TaskFailure::Abandoned));
        }
        self.shared.waker.wake();
    }
}
