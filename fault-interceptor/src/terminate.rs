/// The terminal action taken once a fault has been reported
pub trait Terminator: Send + Sync {
    /// Requests termination of the process. Implementations are not required
    /// to actually end the process, eg. in tests.
    fn terminate(&self);
}

impl<F> Terminator for F
where
    F: Fn() + Send + Sync,
{
    fn terminate(&self) {
        self();
    }
}

/// The exit code used by [`ExitProcess::default`], `EX_SOFTWARE` from
/// `sysexits.h`
pub const DEFAULT_EXIT_CODE: i32 = 70;

/// The exit code of a process the Rust runtime ends due to a panic, which
/// a process ended by [`ExitProcess`] can be told apart from
pub const RUNTIME_PANIC_EXIT_CODE: i32 = 101;

/// Exits the process with the specified code
pub struct ExitProcess {
    /// The code the process exits with
    pub code: i32,
}

impl Default for ExitProcess {
    fn default() -> Self {
        Self {
            code: DEFAULT_EXIT_CODE,
        }
    }
}

impl Terminator for ExitProcess {
    fn terminate(&self) {
        debug_print!("exiting process");

        #[allow(clippy::exit)]
        std::process::exit(self.code);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_code_is_distinguishable() {
        assert_ne!(ExitProcess::default().code, RUNTIME_PANIC_EXIT_CODE);
        assert_ne!(ExitProcess::default().code, 0);
    }
}
