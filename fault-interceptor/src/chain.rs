use fault_report::{FaultSummary, ThreadIdentity};

/// User implemented hooks that observe, or override, the handling of a fault.
///
/// Only one interceptor can be registered with a [`crate::FaultInterceptor`]
/// at a time, registering another one replaces it.
///
/// A hook that panics is treated as if it returned `false`.
pub trait Interceptor: Send + Sync {
    /// Called before the fault is handled. Returning true indicates the fault
    /// was intercepted, no report is persisted, nothing is presented, the
    /// process is not terminated and the previous handler is not invoked.
    fn before(&self, _thread: &ThreadIdentity, _summary: &FaultSummary) -> bool {
        false
    }

    /// Called after the fault has been handled, but before it is delegated
    /// to the previous handler. Returning true prevents the delegation.
    fn after(&self, _thread: &ThreadIdentity, _summary: &FaultSummary) -> bool {
        false
    }
}

/// Creates an [`Interceptor`] using the supplied closures as the `before` and
/// `after` hooks
#[inline]
pub fn make_interceptor<B, A>(before: B, after: A) -> Box<dyn Interceptor>
where
    B: Send + Sync + Fn(&ThreadIdentity, &FaultSummary) -> bool + 'static,
    A: Send + Sync + Fn(&ThreadIdentity, &FaultSummary) -> bool + 'static,
{
    struct Wrapper<B, A> {
        before: B,
        after: A,
    }

    impl<B, A> Interceptor for Wrapper<B, A>
    where
        B: Send + Sync + Fn(&ThreadIdentity, &FaultSummary) -> bool,
        A: Send + Sync + Fn(&ThreadIdentity, &FaultSummary) -> bool,
    {
        fn before(&self, thread: &ThreadIdentity, summary: &FaultSummary) -> bool {
            (self.before)(thread, summary)
        }

        fn after(&self, thread: &ThreadIdentity, summary: &FaultSummary) -> bool {
            (self.after)(thread, summary)
        }
    }

    Box::new(Wrapper { before, after })
}
