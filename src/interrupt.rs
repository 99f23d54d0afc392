use crossbeam_channel::{Receiver, Sender, TrySendError};

/**
Interrupts a consumer blocked in an interruptible wait.

Threads cannot be interrupted from outside, so blocking waits that should be cancellable take an `Interrupt`
and wait on it alongside the completion queue.  Clones share one interrupt flag.

Interrupting sets the flag.  The next interruptible wait that observes the flag clears it and fails with
[crate::Error::Interrupted], without removing anything from the queue.  Several interrupts before a wait
collapse into one, and a flag that is set when a wait begins interrupts that wait immediately.
*/
#[derive(Clone,Debug)]
pub struct Interrupt {
    sender: Sender<()>,
    receiver: Receiver<()>,
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        Self { sender, receiver }
    }

    pub fn interrupt(&self) {
        match self.sender.try_send(()) {
            Ok(()) => tracing::debug!("interrupt raised"),
            //already pending
            Err(TrySendError::Full(())) => (),
            //we hold the receiver ourselves
            Err(TrySendError::Disconnected(())) => unreachable!("interrupt holds its own receiver"),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        !self.receiver.is_empty()
    }

    ///Clears the flag.  Returns whether it was set.
    pub fn clear(&self) -> bool {
        self.receiver.try_recv().is_ok()
    }

    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}
