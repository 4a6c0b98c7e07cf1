use crate::{
    AppContext, Error, ExitProcess, Fault, FaultHandler, HandlerSlot, Interceptor, PanicHookSlot,
    PresentationError, Presenter, Registration, StderrPresenter, Terminator, environment,
};
use fault_report::{Environment, FaultReport, FaultSummary, ThreadIdentity};
use parking_lot::RwLock;
use report_store::{FsReportStore, ReportStore};
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// Options used when constructing a [`FaultInterceptor`]
pub struct InstallOptions {
    /// Always delegate to the previously installed handler, even if the fault
    /// was fully handled
    pub force_delegate: bool,
    /// Where reports are persisted, defaults to [`FsReportStore::for_app`]
    pub store: Option<Arc<dyn ReportStore>>,
    /// Shows the fault to the user, defaults to [`StderrPresenter`].
    ///
    /// For panics this runs on a helper thread while the faulting thread
    /// waits, so it must not block on locks the faulting thread may hold.
    pub presenter: Arc<dyn Presenter>,
    /// Ends the process once the fault has been presented, defaults to
    /// [`ExitProcess`]. Runs on the same thread as the presenter.
    pub terminator: Arc<dyn Terminator>,
    /// The slot the interceptor registers itself in
    pub slot: Arc<dyn HandlerSlot>,
    /// Overrides the manufacturer, model and OS version that are otherwise
    /// detected from the host
    pub host_environment: Option<Environment>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            force_delegate: false,
            store: None,
            presenter: Arc::new(StderrPresenter),
            terminator: Arc::new(ExitProcess::default()),
            slot: Arc::new(PanicHookSlot::default()),
            host_environment: None,
        }
    }
}

enum Outcome {
    /// An interceptor hook claimed the fault
    Intercepted,
    /// The fault went through local handling, which may or may not have
    /// fully succeeded
    Handled { success: bool },
}

/// Runs a collaborator, converting a panic into `None`
#[inline]
fn guarded<R>(f: impl FnOnce() -> R) -> Option<R> {
    catch_unwind(AssertUnwindSafe(f)).ok()
}

/// Runs `f` on a helper thread and waits for it to finish.
///
/// A panic raised while the panic hook is running aborts the process, even
/// inside of `catch_unwind`, so local handling of a panic is moved to a
/// thread that isn't in the hook. If the thread can't be spawned we run on
/// the current one instead.
fn off_hook<R: Send>(f: &(dyn Fn() -> R + Sync)) -> Option<R> {
    std::thread::scope(|scope| {
        match std::thread::Builder::new()
            .name("fault-interceptor".to_owned())
            .spawn_scoped(scope, || f())
        {
            Ok(jh) => jh.join().ok(),
            Err(_e) => {
                debug_print!("unable to spawn helper thread");
                Some(f())
            }
        }
    })
}

pub(crate) struct Shared {
    package: String,
    environment: Environment,
    force_delegate: bool,
    crashing: AtomicBool,
    chain: RwLock<Option<Arc<dyn Interceptor>>>,
    previous: RwLock<Option<Arc<dyn FaultHandler>>>,
    store: Arc<dyn ReportStore>,
    presenter: Arc<dyn Presenter>,
    terminator: Arc<dyn Terminator>,
}

impl Shared {
    fn handle_locally(&self, thread: &ThreadIdentity, summary: &FaultSummary) -> Outcome {
        let chain = self.chain.read().clone();

        if let Some(chain) = &chain {
            if guarded(|| chain.before(thread, summary)).unwrap_or(false) {
                log::debug!("fault on thread '{thread}' intercepted before handling");
                return Outcome::Intercepted;
            }
        }

        let report =
            FaultReport::capture(thread.clone(), summary.clone(), self.environment.clone());

        let mut success = match guarded(|| self.store.persist(&report)) {
            Some(Ok(path)) => {
                log::info!("fault on thread '{thread}' written to {}", path.display());
                true
            }
            Some(Err(e)) => {
                log::error!("failed to persist fault report: {e}");
                false
            }
            None => {
                debug_print!("report store panicked");
                false
            }
        };

        let presented = guarded(|| {
            self.presenter.present(&self.package, &summary.trimmed())?;
            self.terminator.terminate();
            Ok::<_, PresentationError>(())
        });

        match presented {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                log::error!("failed to present fault: {e}");
                success = false;
            }
            None => {
                debug_print!("presenter or terminator panicked");
                success = false;
            }
        }

        if let Some(chain) = &chain {
            if guarded(|| chain.after(thread, summary)).unwrap_or(false) {
                log::debug!("fault on thread '{thread}' intercepted after handling");
                return Outcome::Intercepted;
            }
        }

        Outcome::Handled { success }
    }
}

impl FaultHandler for Shared {
    fn on_fault(&self, fault: &Fault<'_>) {
        // Don't re-enter, a fault while handling a fault would otherwise loop
        if self.crashing.swap(true, Ordering::AcqRel) {
            debug_print!("fault raised while handling a fault");
            return;
        }

        let thread = fault.thread();
        let summary = fault.summary();

        let outcome = if fault.panic_info().is_some() {
            off_hook(&|| self.handle_locally(thread, &summary))
        } else {
            Some(self.handle_locally(thread, &summary))
        };

        let success = match outcome {
            Some(Outcome::Intercepted) => return,
            Some(Outcome::Handled { success }) => success,
            None => false,
        };

        if self.force_delegate || !success {
            let previous = self.previous.read().clone();
            if let Some(previous) = previous {
                log::debug!("delegating fault to the previous handler");
                previous.on_fault(fault);
            }
        }
    }
}

/// Intercepts uncaught faults for the process.
///
/// The interceptor is uninstalled when this handle is dropped, so it must be
/// kept alive for as long as faults should be intercepted, normally the
/// lifetime of the process.
pub struct FaultInterceptor {
    shared: Arc<Shared>,
    slot: Arc<dyn HandlerSlot>,
}

impl FaultInterceptor {
    /// Creates an interceptor, but does not install it.
    ///
    /// Fails if the metadata reports are enriched with can't be determined.
    pub fn new(app: AppContext, options: InstallOptions) -> Result<Self, Error> {
        let environment = environment::collect(&app, options.host_environment)?;
        let store = options
            .store
            .unwrap_or_else(|| Arc::new(FsReportStore::for_app(&app.package)));

        Ok(Self {
            shared: Arc::new(Shared {
                package: app.package,
                environment,
                force_delegate: options.force_delegate,
                crashing: AtomicBool::new(false),
                chain: RwLock::new(None),
                previous: RwLock::new(None),
                store,
                presenter: options.presenter,
                terminator: options.terminator,
            }),
            slot: options.slot,
        })
    }

    /// Creates an interceptor and installs it
    pub fn attach(app: AppContext, options: InstallOptions) -> Result<Self, Error> {
        let interceptor = Self::new(app, options)?;
        interceptor.install();
        Ok(interceptor)
    }

    #[inline]
    fn as_handler(&self) -> Arc<dyn FaultHandler> {
        self.shared.clone()
    }

    /// Registers the interceptor as the process-wide fault handler, capturing
    /// the handler it replaces so faults can be delegated to it.
    ///
    /// This is a no-op if the interceptor is already the active handler.
    pub fn install(&self) {
        match self.slot.register(&self.as_handler()) {
            Registration::AlreadyActive => {
                log::debug!("fault interceptor is already installed");
            }
            Registration::Registered { previous } => {
                *self.shared.previous.write() = previous;
            }
        }
    }

    /// Restores the previous handler, if this interceptor is still the active
    /// one.
    ///
    /// This is done automatically when this [`FaultInterceptor`] is dropped.
    pub fn uninstall(&self) -> bool {
        let previous = self.shared.previous.read().clone();

        self.slot.unregister(&self.as_handler(), previous)
    }

    /// True if this interceptor is currently the active handler in its slot.
    ///
    /// This turns false if another handler has since replaced it.
    #[inline]
    pub fn is_installed(&self) -> bool {
        self.slot.is_active(&self.as_handler())
    }

    /// True once a fault has started being handled, for the rest of the
    /// lifetime of the process
    #[inline]
    pub fn is_crashing(&self) -> bool {
        self.shared.crashing.load(Ordering::Acquire)
    }

    /// Replaces the interceptor hooks, `None` removes them
    pub fn set_interceptor_chain(&self, chain: Option<Arc<dyn Interceptor>>) {
        *self.shared.chain.write() = chain;
    }

    /// Handles a fault that was not raised as a panic, exactly as if it had
    /// been
    pub fn simulate_fault(&self, thread: ThreadIdentity, summary: FaultSummary) {
        self.shared.on_fault(&Fault::simulated(thread, summary));
    }

    /// The metadata every report is enriched with
    #[inline]
    pub fn environment(&self) -> &Environment {
        &self.shared.environment
    }

    #[inline]
    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.shared.store
    }

    /// Removes reports older than `max_age` from the store
    #[inline]
    pub fn purge_older_than(&self, max_age: Duration) -> usize {
        self.shared.store.purge_older_than(max_age)
    }

    /// Removes reports older than [`report_store::DEFAULT_RETENTION`]
    #[inline]
    pub fn purge_default(&self) -> usize {
        self.shared.store.purge_default()
    }
}

impl Drop for FaultInterceptor {
    fn drop(&mut self) {
        // The slot can't be modified while unwinding
        if !std::thread::panicking() {
            self.uninstall();
        }
    }
}
