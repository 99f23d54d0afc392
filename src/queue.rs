/*!
Per-priority completion queues.

Each declared priority owns one unbounded `crossbeam_channel`.  The set keeps both ends of every channel, so a
queue never disconnects while the set is alive.  Trampolines hold clones of the sending end; if the set is
gone by the time they finish, their send fails and the handle is simply dropped.
*/
use std::time::Duration;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use priority::Priority;
use crate::error::{Error, Result};
use crate::handle::ResultHandle;
use crate::interrupt::Interrupt;

///The FIFO of completed handles for one priority.  Ordered by completion time.
pub struct CompletionQueue<V> {
    priority: Priority,
    sender: Sender<ResultHandle<V>>,
    receiver: Receiver<ResultHandle<V>>,
}

impl<V> std::fmt::Debug for CompletionQueue<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let priority = self.priority;
        let len = self.len();
        f.write_fmt(format_args!("<CompletionQueue{{priority: {priority} len: {len}}}>"))
    }
}

impl<V> CompletionQueue<V> {
    fn new(priority: Priority) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { priority, sender, receiver }
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    ///Completed handles waiting to be retrieved.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub(crate) fn sender(&self) -> Sender<ResultHandle<V>> {
        self.sender.clone()
    }

    pub(crate) fn try_pop(&self) -> Option<ResultHandle<V>> {
        self.receiver.try_recv().ok()
    }

    pub(crate) fn pop(&self) -> ResultHandle<V> {
        match self.receiver.recv() {
            Ok(handle) => handle,
            Err(_) => unreachable!("completion queue holds its own sender"),
        }
    }

    pub(crate) fn pop_timeout(&self, timeout: Duration) -> Option<ResultHandle<V>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(handle) => Some(handle),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => unreachable!("completion queue holds its own sender"),
        }
    }

    ///Waits for a handle or an interrupt, whichever comes first.
    ///
    /// A pending interrupt wins over an available handle, so an interrupted caller never takes an entry.
    pub(crate) fn pop_interruptible(&self, interrupt: &Interrupt) -> Result<ResultHandle<V>> {
        if interrupt.clear() {
            return Err(Error::Interrupted);
        }
        crossbeam_channel::select! {
            recv(self.receiver) -> handle => match handle {
                Ok(handle) => Ok(handle),
                Err(_) => unreachable!("completion queue holds its own sender"),
            },
            recv(interrupt.receiver()) -> _ => Err(Error::Interrupted),
        }
    }

    pub(crate) fn pop_timeout_interruptible(&self, timeout: Duration, interrupt: &Interrupt) -> Result<Option<ResultHandle<V>>> {
        if interrupt.clear() {
            return Err(Error::Interrupted);
        }
        crossbeam_channel::select! {
            recv(self.receiver) -> handle => Ok(handle.ok()),
            recv(interrupt.receiver()) -> _ => Err(Error::Interrupted),
            default(timeout) => Ok(None),
        }
    }
}

/**
A fixed table from [Priority] to [CompletionQueue].

The set of declared priorities is chosen at construction and never changes.  Lookup of a priority outside
that set fails with [Error::InvalidPriority].
*/
pub struct CompletionQueueSet<V> {
    //indexed by Priority::index
    queues: [Option<CompletionQueue<V>>; Priority::COUNT],
    levels: Vec<Priority>,
}

impl<V> std::fmt::Debug for CompletionQueueSet<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.queues.iter().flatten()).finish()
    }
}

impl<V> CompletionQueueSet<V> {
    ///Creates one queue per level.  Duplicates are ignored; `levels()` reports index order.
    pub(crate) fn new(levels: &[Priority]) -> Self {
        let queues: [Option<CompletionQueue<V>>; Priority::COUNT] = std::array::from_fn(|index| {
            Priority::from_index(index)
                .filter(|p| levels.contains(p))
                .map(CompletionQueue::new)
        });
        let levels = queues.iter().flatten().map(|q| q.priority).collect();
        Self { queues, levels }
    }

    pub fn queue_for(&self, priority: Priority) -> Result<&CompletionQueue<V>> {
        self.queues[priority.index()].as_ref().ok_or(Error::InvalidPriority(priority))
    }

    pub fn contains(&self, priority: Priority) -> bool {
        self.queues[priority.index()].is_some()
    }

    ///The declared priorities, in index order.
    pub fn levels(&self) -> &[Priority] {
        &self.levels
    }

    ///Completed handles waiting in the queue for `priority`.
    pub fn len(&self, priority: Priority) -> Result<usize> {
        self.queue_for(priority).map(CompletionQueue::len)
    }
}
