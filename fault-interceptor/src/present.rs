use crate::PresentationError;
use std::io;

/// Displays a diagnostic view of a fault to the user
pub trait Presenter: Send + Sync {
    /// Presents the trimmed trace lines of a fault raised in `package`
    fn present(&self, package: &str, trace: &[String]) -> Result<(), PresentationError>;
}

impl<F> Presenter for F
where
    F: Fn(&str, &[String]) -> Result<(), PresentationError> + Send + Sync,
{
    fn present(&self, package: &str, trace: &[String]) -> Result<(), PresentationError> {
        self(package, trace)
    }
}

/// Writes the diagnostic view to stderr.
///
/// The view is written straight to the file descriptor rather than through
/// [`std::io::Stderr`], since the faulting thread can be holding the stderr
/// lock, eg. when a `Display` impl panics inside of `eprintln!`, while it
/// waits for the fault to be handled.
pub struct StderrPresenter;

impl StderrPresenter {
    /// Renders the diagnostic view
    pub fn render(package: &str, trace: &[String]) -> String {
        let mut view = format!("{package} has crashed\n=====\n");
        for line in trace {
            view.push_str("    ");
            view.push_str(line);
            view.push('\n');
        }
        view
    }
}

impl Presenter for StderrPresenter {
    fn present(&self, package: &str, trace: &[String]) -> Result<(), PresentationError> {
        write_all_stderr(Self::render(package, trace).as_bytes())?;
        Ok(())
    }
}

#[allow(unsafe_code)]
fn write_all_stderr(mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        // SAFETY: syscall, the pointer and length come from a live slice
        #[cfg(target_os = "windows")]
        let written = unsafe {
            libc::write(2, buf.as_ptr().cast(), buf.len().min(i32::MAX as usize) as u32)
        } as isize;

        #[cfg(not(target_os = "windows"))]
        let written = unsafe { libc::write(2, buf.as_ptr().cast(), buf.len()) };

        if written < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        } else if written == 0 {
            return Err(io::ErrorKind::WriteZero.into());
        }

        buf = &buf[written as usize..];
    }

    Ok(())
}
