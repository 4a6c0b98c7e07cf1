//! [`FaultInterceptor`] installs itself as the process-wide handler for
//! uncaught faults, which in Rust means the [panic hook](std::panic::set_hook).
//!
//! When a fault reaches it, the interceptor
//!
//! 1. Refuses to run more than once. The first fault latches the interceptor
//!    into a crashing state for the rest of the process lifetime, and every
//!    later fault, including faults raised while handling the first one, is
//!    ignored.
//! 2. Gives the registered [`Interceptor`] a chance to claim the fault before
//!    anything else happens.
//! 3. Persists a [`FaultReport`](fault_report::FaultReport) through a
//!    [`ReportStore`](report_store::ReportStore).
//! 4. Presents the fault through a [`Presenter`] and asks the [`Terminator`]
//!    to end the process.
//! 5. Gives the [`Interceptor`] a chance to claim the fault after it has been
//!    handled.
//! 6. Delegates to the handler that was installed before it, if handling
//!    didn't fully succeed or if delegation is forced.
//!
//! None of the collaborators are trusted, a panic in any of them is treated
//! as a failure of that step and never escapes the interceptor.
//!
//! ```no_run
//! let interceptor = fault_interceptor::install(fault_interceptor::app_context!("42"), false)
//!     .expect("failed to install fault interceptor");
//!
//! // Clean up reports from last week
//! interceptor.purge_default();
//! ```

#[cfg(feature = "debug-print")]
#[macro_export]
macro_rules! debug_print {
    ($s:literal) => {
        let cstr = concat!($s, "\n");
        $crate::write_stderr(cstr);
    };
}

#[cfg(not(feature = "debug-print"))]
#[macro_export]
macro_rules! debug_print {
    ($s:literal) => {};
}

/// Writes the specified string directly to stderr.
///
/// This is safe to be called from within a compromised context.
#[inline]
pub fn write_stderr(s: &'static str) {
    unsafe {
        #[cfg(target_os = "windows")]
        libc::write(2, s.as_ptr().cast(), s.len() as u32);

        #[cfg(not(target_os = "windows"))]
        libc::write(2, s.as_ptr().cast(), s.len());
    }
}

mod chain;
mod environment;
mod error;
mod interceptor;
mod present;
mod slot;
mod terminate;

pub use chain::{Interceptor, make_interceptor};
pub use environment::AppContext;
pub use error::{Error, PresentationError};
pub use fault_report::{Environment, FaultReport, FaultSummary, ThreadIdentity, keys};
pub use interceptor::{FaultInterceptor, InstallOptions};
pub use present::{Presenter, StderrPresenter};
pub use report_store::{FsReportStore, ReportStore, StoreConfig};
pub use slot::{Fault, FaultHandler, HandlerSlot, PanicHookSlot, Registration, same_handler};
pub use terminate::{DEFAULT_EXIT_CODE, ExitProcess, RUNTIME_PANIC_EXIT_CODE, Terminator};

/// Installs a [`FaultInterceptor`] with the default [`InstallOptions`].
///
/// Reports are written to [`FsReportStore::for_app`], faults are presented on
/// stderr and the process exits with [`DEFAULT_EXIT_CODE`].
pub fn install(app: AppContext, force_delegate: bool) -> Result<FaultInterceptor, Error> {
    FaultInterceptor::attach(
        app,
        InstallOptions {
            force_delegate,
            ..Default::default()
        },
    )
}
