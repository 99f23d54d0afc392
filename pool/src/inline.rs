use crate::{Executor, Job, Rejected};

///Runs each job on the calling thread, before [Executor::execute] returns.
#[derive(Debug,Default,Clone,Copy)]
pub struct Inline;

impl Executor for Inline {
    fn execute(&self, job: Job) -> Result<(), Rejected> {
        job();
        Ok(())
    }
}

///Spawns a new OS thread for every job.
///
/// Threads are named `{name}-job`.  If the OS refuses to create a thread the job is handed back in [Rejected].
#[derive(Debug,Clone)]
pub struct ThreadPerJob {
    name: String,
}

impl ThreadPerJob {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ThreadPerJob {
    fn default() -> Self {
        Self::new("thread-per-job")
    }
}

impl Executor for ThreadPerJob {
    fn execute(&self, job: Job) -> Result<(), Rejected> {
        //the job travels through a slot so a failed spawn can give it back
        let (sender, receiver) = crossbeam_channel::bounded::<Job>(1);
        if let Err(e) = sender.send(job) {
            return Err(Rejected::new(e.into_inner()));
        }
        let thread_receiver = receiver.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("{}-job", self.name))
            .spawn(move || {
                if let Ok(job) = thread_receiver.try_recv() {
                    job()
                }
            });
        match spawned {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "could not spawn job thread");
                //a failed spawn drops the closure unrun, so the job is still in the slot
                match receiver.try_recv() {
                    Ok(job) => Err(Rejected::new(job)),
                    Err(e) => unreachable!("job slot emptied without a thread: {e}"),
                }
            }
        }
    }
}
