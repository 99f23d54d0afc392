/*!
The completion trampoline.

A trampoline wraps one unit of work.  Running it runs the work, completes the promise, and then pushes the
handle into the completion queue for its priority.  That finishing step lives in `Drop`, so it happens exactly
once whether the work returned, failed, panicked, or was never run at all.

The one exception is a disarmed trampoline.  When the executor refuses a job, the service disarms the
trampoline before dropping it; the caller gets an error instead of a handle, so nothing is enqueued.
*/
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use crossbeam_channel::Sender;
use pool::Job;
use crate::handle::{Promise, ResultHandle, TaskFailure};
use crate::work::Work;

pub(crate) struct Trampoline<V> {
    work: Option<Work<V>>,
    promise: Option<Promise<V>>,
    handle: Option<ResultHandle<V>>,
    queue: Sender<ResultHandle<V>>,
    disarmed: Arc<AtomicBool>,
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(message) => *message,
        Err(panic) => panic.downcast_ref::<&str>().map(|s| s.to_string()).unwrap_or_default(),
    }
}

impl<V: Send + Sync + 'static> Trampoline<V> {
    ///Returns the trampoline and the flag that disarms it.
    pub(crate) fn new(work: Work<V>, promise: Promise<V>, handle: ResultHandle<V>, queue: Sender<ResultHandle<V>>) -> (Self, Arc<AtomicBool>) {
        let disarmed = Arc::new(AtomicBool::new(false));
        let trampoline = Trampoline {
            work: Some(work),
            promise: Some(promise),
            handle: Some(handle),
            queue,
            disarmed: disarmed.clone(),
        };
        (trampoline, disarmed)
    }

    pub(crate) fn into_job(self) -> Job {
        Box::new(move || self.run())
    }

    fn run(mut self) {
        let Some(work) = self.work.take() else { return };
        let outcome = match catch_unwind(AssertUnwindSafe(|| work.execute())) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(TaskFailure::Failed(error)),
            Err(panic) => Err(TaskFailure::Panicked(panic_message(panic))),
        };
        if let Some(promise) = self.promise.take() {
            promise.complete(outcome);
        }
        //self drops here and enqueues
    }
}

impl<V> Drop for Trampoline<V> {
    fn drop(&mut self) {
        if self.disarmed.load(Ordering::Acquire) {
            return;
        }
        //still holding the promise means the work never ran
        if let Some(promise) = self.promise.take() {
            if let Some(handle) = &self.handle {
                tracing::warn!(id = handle.id(), priority = %handle.priority(), "work abandoned by executor");
            }
            promise.complete(Err(TaskFailure::Abandoned));
        }
        if let Some(handle) = self.handle.take() {
            let id = handle.id();
            let priority = handle.priority();
            match self.queue.send(handle) {
                Ok(()) => tracing::trace!(id, %priority, "completion enqueued"),
                Err(_) => tracing::trace!(id, %priority, "completion service dropped, discarding completion"),
            }
        }
    }
}

#[cfg(test)] mod tests {
    use std::sync::atomic::Ordering;
    use priority::Priority;
    use crate::handle::ResultHandle;
    use crate::trampoline::Trampoline;
    use crate::{TaskFailure, Work};

    fn trampoline(work: Work<u32>) -> (Trampoline<u32>, ResultHandle<u32>, crossbeam_channel::Receiver<ResultHandle<u32>>, std::sync::Arc<std::sync::atomic::AtomicBool>) {
        let (handle, promise) = ResultHandle::pending(Priority::Medium);
        let (sender, receiver) = crossbeam_channel::unbounded();
        let (trampoline, disarmed) = Trampoline::new(work, promise, handle.clone(), sender);
        (trampoline, handle, receiver, disarmed)
    }

    #[test] fn success_enqueues_completed_handle() {
        let (trampoline, handle, receiver, _) = trampoline(Work::call(|| Ok(3)));
        assert!(receiver.is_empty());
        (trampoline.into_job())();
        let delivered = receiver.try_recv().unwrap();
        assert!(delivered.same_submission(&handle));
        assert!(delivered.is_done());
        assert_eq!(*delivered.get().unwrap(), 3);
        assert!(receiver.try_recv().is_err());
    }

    #[test] fn error_is_captured() {
        let (trampoline, handle, receiver, _) = trampoline(Work::call(|| Err("bad input".into())));
        (trampoline.into_job())();
        assert_eq!(receiver.len(), 1);
        match handle.get() {
            Err(TaskFailure::Failed(e)) => assert_eq!(e.to_string(), "bad input"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test] fn panic_is_captured() {
        let (trampoline, handle, receiver, _) = trampoline(Work::call(|| panic!("exploded {}", 42)));
        (trampoline.into_job())();
        assert_eq!(receiver.len(), 1);
        match handle.get() {
            Err(TaskFailure::Panicked(message)) => assert_eq!(message, "exploded 42"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test] fn dropped_job_is_abandoned_and_enqueued_once() {
        let (trampoline, handle, receiver, _) = trampoline(Work::call(|| Ok(1)));
        drop(trampoline.into_job());
        assert_eq!(receiver.len(), 1);
        assert!(matches!(handle.get(), Err(TaskFailure::Abandoned)));
    }

    #[test] fn disarmed_enqueues_nothing() {
        let (trampoline, _handle, receiver, disarmed) = trampoline(Work::call(|| Ok(1)));
        let job = trampoline.into_job();
        disarmed.store(true, Ordering::Release);
        drop(job);
        assert!(receiver.is_empty());
    }
}
