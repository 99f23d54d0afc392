use std::fmt::{Debug, Formatter};
use crate::BoxError;

/**
A unit of work waiting to be submitted.

Work either computes its value ([Work::call]) or performs a side effect and reports a value fixed at
construction ([Work::run]).  Returning `Err` from a computation, or panicking in either kind, fails the work;
the failure is recorded on the [crate::ResultHandle] rather than returned from the service.
*/
pub struct Work<V> {
    inner: Box<dyn FnOnce() -> Result<V, BoxError> + Send + 'static>,
}

impl<V: Send + 'static> Work<V> {
    pub fn call<F>(f: F) -> Self where F: FnOnce() -> Result<V, BoxError> + Send + 'static {
        Self { inner: Box::new(f) }
    }
    pub fn run<F>(f: F, result: V) -> Self where F: FnOnce() + Send + 'static {
        Self {
            inner: Box::new(move || {
                f();
                Ok(result)
            }),
        }
    }
}

impl<V> Work<V> {
    pub(crate) fn execute(self) -> Result<V, BoxError> {
        (self.inner)()
    }
}

impl<V> Debug for Work<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Work{..}")
    }
}
