use std::fmt;

/// An error that can occur when constructing a [`crate::FaultInterceptor`]
#[derive(Debug)]
pub enum Error {
    /// Metadata that every report is enriched with could not be determined.
    ///
    /// The interceptor refuses to be constructed in a state where it could
    /// only write partial reports.
    Configuration {
        /// The piece of metadata that was missing
        what: &'static str,
        /// The OS error encountered while reading it, if any
        source: Option<std::io::Error>,
    },
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configuration {
                source: Some(inner),
                ..
            } => Some(inner),
            Self::Configuration { source: None, .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { what, source } => {
                write!(f, "unable to determine {what}")?;
                if let Some(source) = source {
                    write!(f, ": {source}")?;
                }
                Ok(())
            }
        }
    }
}

/// An error raised by a [`crate::Presenter`] while displaying a fault
#[derive(Debug)]
pub enum PresentationError {
    /// The diagnostic view could not be shown at all
    Unavailable(String),
    /// An I/O error occurred while writing the diagnostic view
    Io(std::io::Error),
}

impl std::error::Error for PresentationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(inner) => Some(inner),
            Self::Unavailable(_) => None,
        }
    }
}

impl fmt::Display for PresentationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(why) => write!(f, "diagnostic view is unavailable: {why}"),
            Self::Io(e) => write!(f, "{}", e),
        }
    }
}

impl From<std::io::Error> for PresentationError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
