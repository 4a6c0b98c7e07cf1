use report_store::{FsReportStore, PersistedReport};
use sadness_generator::SadnessFlavor;
use std::{fmt, path::Path};

/// The build identifier the crash client installs the interceptor with
pub const BUILD: &str = "test";

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Flavor {
    Message,
    Formatted,
    ErrorChain,
    NonString,
    OutOfBounds,
}

impl From<Flavor> for SadnessFlavor {
    fn from(f: Flavor) -> Self {
        match f {
            Flavor::Message => Self::Message,
            Flavor::Formatted => Self::Formatted,
            Flavor::ErrorChain => Self::ErrorChain,
            Flavor::NonString => Self::NonString,
            Flavor::OutOfBounds => Self::OutOfBounds,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        SadnessFlavor::from(*self).fmt(f)
    }
}

#[inline]
pub fn run_test(flavor: Flavor, use_thread: bool) -> PersistedReport {
    capture_output();

    let dir = tempfile::tempdir().expect("failed to create report dir");
    let stderr = run_client(dir.path(), flavor, use_thread);

    assert!(
        stderr.contains(&format!("{} has crashed", env!("CARGO_PKG_NAME"))),
        "the fault was not presented"
    );

    let report = read_report(dir.path());
    assert_report(&report, flavor, use_thread);
    report
}

/// Runs the crash client, returning its stderr
pub fn run_client(dir: &Path, flavor: Flavor, use_thread: bool) -> String {
    use std::env;

    // Adapted from
    // https://github.com/rust-lang/cargo/blob/485670b3983b52289a2f353d589c57fae2f60f82/tests/testsuite/support/mod.rs#L507
    let mut cmd_path = env::current_exe().expect("failed to get exe path");
    cmd_path.pop();
    if cmd_path.ends_with("deps") {
        cmd_path.pop();
    }

    cmd_path.push("crash-client");
    if !env::consts::EXE_SUFFIX.is_empty() {
        cmd_path.set_extension(env::consts::EXE_SUFFIX);
    }

    let mut cmd = std::process::Command::new(&cmd_path);
    cmd.stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());
    cmd.arg("--dir")
        .arg(dir)
        .arg("--flavor")
        .arg(flavor.to_string());
    if use_thread {
        cmd.arg("--use-thread");
    }

    let child = cmd.spawn().expect("failed to run crash-client");
    let output = child.wait_with_output().expect("failed to wait for output");

    let stdout = std::str::from_utf8(&output.stdout).expect("invalid stdout");
    let stderr = std::str::from_utf8(&output.stderr).expect("invalid stderr");

    println!("{stdout}");
    eprintln!("{stderr}");

    // Ensure it was terminated by the interceptor rather than exiting on its
    // own or being killed by the runtime
    assert_eq!(
        output.status.code(),
        Some(fault_interceptor::DEFAULT_EXIT_CODE)
    );

    stderr.to_owned()
}

#[inline]
pub fn capture_output() {
    static SUB: std::sync::Once = std::sync::Once::new();

    SUB.call_once(|| {
        tracing_subscriber::fmt().with_test_writer().init();
    });
}

/// Reads the single report the crash client should have written to `dir`
pub fn read_report(dir: &Path) -> PersistedReport {
    let store = FsReportStore::with_root(dir);
    let artifacts = store.list().expect("failed to list reports");

    match artifacts.as_slice() {
        [path] => store.load(path).expect("failed to load report"),
        _ => panic!(
            "expected exactly 1 report in {}, found {}",
            dir.display(),
            artifacts.len()
        ),
    }
}

pub fn assert_report(report: &PersistedReport, flavor: Flavor, use_thread: bool) {
    let env = &report.environment;

    assert_eq!(
        env.app_version(),
        Some(format!("{}({BUILD})", env!("CARGO_PKG_VERSION")).as_str())
    );
    assert!(env.manufacturer().is_some());
    assert!(env.model().is_some());

    cfg_if::cfg_if! {
        if #[cfg(target_os = "linux")] {
            assert!(env.os_version().is_some_and(|os| os.starts_with("Linux")));
        } else if #[cfg(target_os = "macos")] {
            assert!(env.os_version().is_some_and(|os| os.starts_with("Darwin")));
        } else {
            assert!(env.os_version().is_some());
        }
    }

    let thread = if use_thread {
        sadness_generator::THREAD_NAME
    } else {
        "main"
    };

    let first = report.trace.message().expect("the trace is empty");
    let expected = SadnessFlavor::from(flavor).expected_message();
    assert!(
        first.starts_with(&format!("thread '{thread}' panicked: ")),
        "unexpected first line '{first}'"
    );
    assert!(
        first.contains(expected),
        "'{first}' does not contain '{expected}'"
    );
}

pub fn run_threaded_test(flavor: Flavor, count: u32) {
    std::thread::scope(|s| {
        for _ in 0..count {
            s.spawn(move || {
                run_test(flavor, true);
            });
        }
    });
}
