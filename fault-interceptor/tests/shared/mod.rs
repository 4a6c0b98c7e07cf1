#![allow(dead_code)]

use fault_interceptor::{
    AppContext, Environment, FaultInterceptor, FsReportStore, InstallOptions, PresentationError,
    Presenter, StderrPresenter, keys,
};
use parking_lot::Mutex;
use report_store::PersistedReport;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

pub use sadness_generator::SadnessFlavor;

pub const PACKAGE: &str = "sadness";

/// The payload messages received by a custom panic hook
pub type Received = Arc<Mutex<Vec<String>>>;

/// Replaces the panic hook with one that records the message of every panic
/// it is given
pub fn custom_hook() -> Received {
    let received = Received::default();
    let rx = received.clone();

    std::panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Box<dyn Any>".to_owned());
        rx.lock().push(message);
    }));

    received
}

pub struct Installed {
    pub interceptor: FaultInterceptor,
    pub store: Arc<FsReportStore>,
    pub presented: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    pub terminated: Arc<AtomicUsize>,
    _root: tempfile::TempDir,
}

impl Installed {
    /// Loads every artifact in the store
    pub fn artifacts(&self) -> Vec<PersistedReport> {
        self.store
            .list()
            .expect("failed to list artifacts")
            .iter()
            .map(|path| self.store.load(path).expect("failed to load artifact"))
            .collect()
    }

    #[inline]
    pub fn terminations(&self) -> usize {
        self.terminated.load(Ordering::SeqCst)
    }
}

/// How faults are presented by [`install`]
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum Presentation {
    /// Recorded in [`Installed::presented`]
    Record,
    /// The presenter panics
    Panic,
    /// The default [`StderrPresenter`]
    Stderr,
}

/// Installs an interceptor in the real panic hook that writes to a scratch
/// directory and counts terminations instead of exiting
pub fn install(force_delegate: bool, presentation: Presentation) -> Installed {
    let root = tempfile::tempdir().expect("failed to create scratch dir");
    let store = Arc::new(FsReportStore::with_root(root.path().join("CrashReports")));
    let presented = Arc::new(Mutex::new(Vec::new()));
    let terminated = Arc::new(AtomicUsize::new(0));

    let presenter: Arc<dyn Presenter> = match presentation {
        Presentation::Stderr => Arc::new(StderrPresenter),
        Presentation::Record | Presentation::Panic => {
            let presented = presented.clone();
            Arc::new(
                move |package: &str, trace: &[String]| -> Result<(), PresentationError> {
                    if presentation == Presentation::Panic {
                        sadness_generator::raise_formatted_panic(9000);
                    }

                    presented.lock().push((package.to_owned(), trace.to_vec()));
                    Ok(())
                },
            )
        }
    };

    let terminator = {
        let terminated = terminated.clone();
        move || {
            terminated.fetch_add(1, Ordering::SeqCst);
        }
    };

    let interceptor = FaultInterceptor::attach(
        AppContext::new(PACKAGE, "0.6.0", "1337").with_entry("channel", "nightly"),
        InstallOptions {
            force_delegate,
            store: Some(store.clone()),
            presenter,
            terminator: Arc::new(terminator),
            host_environment: Some(
                Environment::new()
                    .with(keys::MANUFACTURER, "Embark")
                    .with(keys::MODEL, "Devkit 3")
                    .with(keys::OS_VERSION, "Linux 6.1.0"),
            ),
            ..Default::default()
        },
    )
    .expect("failed to install interceptor");

    assert!(interceptor.is_installed());

    Installed {
        interceptor,
        store,
        presented,
        terminated,
        _root: root,
    }
}

/// Panics on a separate thread and waits for it to finish
pub fn panic_on_thread(flavor: SadnessFlavor) {
    let res = sadness_generator::panic_on_thread(flavor).join();
    assert!(res.is_err(), "the thread should have panicked");
}
