use fault_report::{FaultSummary, ThreadIdentity};
use std::{io::Write, panic::PanicHookInfo, sync::Arc};

/// A fault as delivered to a [`FaultHandler`]
pub struct Fault<'a> {
    thread: ThreadIdentity,
    source: Source<'a>,
}

enum Source<'a> {
    Simulated(FaultSummary),
    Panic {
        info: &'a PanicHookInfo<'a>,
        capture_backtrace: bool,
    },
}

impl<'a> Fault<'a> {
    /// A fault that did not originate from a panic
    #[inline]
    pub fn simulated(thread: ThreadIdentity, summary: FaultSummary) -> Self {
        Self {
            thread,
            source: Source::Simulated(summary),
        }
    }

    /// A panic raised on the calling thread
    #[inline]
    pub fn panic(info: &'a PanicHookInfo<'a>, capture_backtrace: bool) -> Self {
        Self {
            thread: ThreadIdentity::current(),
            source: Source::Panic {
                info,
                capture_backtrace,
            },
        }
    }

    #[inline]
    pub fn thread(&self) -> &ThreadIdentity {
        &self.thread
    }

    /// The original panic, if this fault is one
    #[inline]
    pub fn panic_info(&self) -> Option<&'a PanicHookInfo<'a>> {
        match self.source {
            Source::Panic { info, .. } => Some(info),
            Source::Simulated(_) => None,
        }
    }

    /// Builds the summary of the fault.
    ///
    /// For panics this captures and symbolizes a backtrace (if enabled) every
    /// time it is called.
    pub fn summary(&self) -> FaultSummary {
        match &self.source {
            Source::Simulated(summary) => summary.clone(),
            Source::Panic {
                info,
                capture_backtrace,
            } => {
                let payload = info.payload();
                let message = payload
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                    .unwrap_or("Box<dyn Any>");
                let location = info.location().map(|l| l.to_string());
                let frames = if *capture_backtrace {
                    panic_frames()
                } else {
                    Vec::new()
                };

                FaultSummary::from_panic(
                    &format!("thread '{}' panicked: {message}", self.thread),
                    location.as_deref(),
                    frames,
                )
            }
        }
    }
}

/// Symbolized frames of the calling thread, starting at the frame that
/// raised the panic
fn panic_frames() -> Vec<String> {
    let bt = backtrace::Backtrace::new();
    let mut frames = Vec::new();

    for frame in bt.frames() {
        for symbol in frame.symbols() {
            let Some(name) = symbol.name() else {
                continue;
            };
            let name = format!("{name:#}");

            match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(line)) => {
                    frames.push(format!("{name} ({}:{line})", file.display()));
                }
                _ => frames.push(name),
            }
        }
    }

    // Everything up to, and including, the panic machinery is the hook
    // itself and not interesting
    let is_panic_machinery = |frame: &String| {
        frame.starts_with("std::panicking")
            || frame.starts_with("core::panicking")
            || frame.starts_with("rust_begin_unwind")
    };

    match frames.iter().rposition(is_panic_machinery) {
        Some(last) => frames.split_off(last + 1),
        None => frames
            .into_iter()
            .filter(|f| !f.starts_with("backtrace::") && !f.starts_with("fault_interceptor::"))
            .collect(),
    }
}

/// Something faults can be handed to
pub trait FaultHandler: Send + Sync {
    fn on_fault(&self, fault: &Fault<'_>);
}

/// Returns true if both handles point to the same handler instance
#[inline]
pub fn same_handler(a: &Arc<dyn FaultHandler>, b: &Arc<dyn FaultHandler>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// The outcome of [`HandlerSlot::register`]
pub enum Registration {
    /// The handler was already the active one, nothing was changed
    AlreadyActive,
    /// The handler is now the active one
    Registered {
        /// The handler that was active before, if any
        previous: Option<Arc<dyn FaultHandler>>,
    },
}

/// The runtime's single, process-wide, registration point for fault handlers
pub trait HandlerSlot: Send + Sync {
    /// Atomically checks if `handler` is already active and, if it isn't,
    /// registers it and returns the handler it replaced
    fn register(&self, handler: &Arc<dyn FaultHandler>) -> Registration;

    /// If `handler` is the active handler, registers `previous` in its place
    /// and returns true
    fn unregister(
        &self,
        handler: &Arc<dyn FaultHandler>,
        previous: Option<Arc<dyn FaultHandler>>,
    ) -> bool;

    /// True if `handler` is the active handler
    fn is_active(&self, handler: &Arc<dyn FaultHandler>) -> bool;
}

type StdHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// A std panic hook that was registered before a [`PanicHookSlot`] took over
struct PreviousHook(StdHook);

impl FaultHandler for PreviousHook {
    fn on_fault(&self, fault: &Fault<'_>) {
        if let Some(info) = fault.panic_info() {
            (self.0)(info);
        } else {
            // std hooks can only be given a real panic
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(
                stderr,
                "thread '{}' faulted:\n{}",
                fault.thread(),
                fault.summary()
            );
        }
    }
}

/// The handler registered through the panic hook, std doesn't allow the hook
/// itself to be inspected so this is how we know if it is one of ours
static ACTIVE: parking_lot::Mutex<Option<Arc<dyn FaultHandler>>> = parking_lot::const_mutex(None);

/// Uses the std panic hook as the process-wide handler slot.
///
/// Registering or unregistering from a thread that is currently panicking
/// will panic, just like [`std::panic::set_hook`].
pub struct PanicHookSlot {
    /// Whether a backtrace is captured for each panic
    pub capture_backtrace: bool,
}

impl Default for PanicHookSlot {
    fn default() -> Self {
        Self {
            capture_backtrace: true,
        }
    }
}

impl HandlerSlot for PanicHookSlot {
    fn register(&self, handler: &Arc<dyn FaultHandler>) -> Registration {
        let mut active = ACTIVE.lock();

        if active.as_ref().is_some_and(|a| same_handler(a, handler)) {
            return Registration::AlreadyActive;
        }

        let previous: Arc<dyn FaultHandler> = Arc::new(PreviousHook(std::panic::take_hook()));

        let hook_handler = handler.clone();
        let capture_backtrace = self.capture_backtrace;
        std::panic::set_hook(Box::new(move |info| {
            hook_handler.on_fault(&Fault::panic(info, capture_backtrace));
        }));

        *active = Some(handler.clone());

        Registration::Registered {
            previous: Some(previous),
        }
    }

    fn unregister(
        &self,
        handler: &Arc<dyn FaultHandler>,
        previous: Option<Arc<dyn FaultHandler>>,
    ) -> bool {
        let mut active = ACTIVE.lock();

        if !active.as_ref().is_some_and(|a| same_handler(a, handler)) {
            return false;
        }

        match &previous {
            Some(previous) => {
                let previous = previous.clone();
                std::panic::set_hook(Box::new(move |info| {
                    previous.on_fault(&Fault::panic(info, false));
                }));
            }
            None => {
                // Restores the default hook
                drop(std::panic::take_hook());
            }
        }

        *active = previous;
        true
    }

    fn is_active(&self, handler: &Arc<dyn FaultHandler>) -> bool {
        ACTIVE.lock().as_ref().is_some_and(|a| same_handler(a, handler))
    }
}
