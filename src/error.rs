use priority::Priority;

///Errors surfaced synchronously by the completion service.
///
/// Failure of the work itself is never one of these.  It is captured by the
/// [crate::ResultHandle] as a [crate::TaskFailure].
#[derive(Debug,thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("priority {0} is not declared by this service")]
    InvalidPriority(Priority),
    #[error("interrupted while waiting for a completion")]
    Interrupted,
    #[error("executor rejected the submission")]
    Rejected,
}

pub type Result<T> = std::result::Result<T, Error>;
