use std::{error::Error, fmt};

/// The message and full cause chain of a fault, one entry per line.
///
/// Every stored entry is a single line; multi-line input is split on
/// construction so that the summary can be written out and read back without
/// changing shape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaultSummary {
    lines: Vec<String>,
}

impl FaultSummary {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = Self::default();
        for line in lines {
            summary.push(line.as_ref());
        }
        summary
    }

    /// Builds a summary from an error and every error in its `source` chain
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let mut summary = Self::default();
        summary.push(&error.to_string());

        let mut source = error.source();
        while let Some(cause) = source {
            summary.push(&format!("Caused by: {cause}"));
            source = cause.source();
        }

        summary
    }

    /// Builds a summary from a panic message, the location it was raised at
    /// and the (already symbolized) frames of the panicking thread
    pub fn from_panic<I>(message: &str, location: Option<&str>, frames: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut summary = Self::default();
        summary.push(message);

        if let Some(location) = location {
            summary.push(&format!("\tat {location}"));
        }

        for frame in frames {
            summary.push(&format!("\tat {frame}"));
        }

        summary
    }

    fn push(&mut self, text: &str) {
        self.lines.extend(
            text.split('\n')
                .map(|line| line.trim_end_matches('\r').to_owned()),
        );
    }

    #[inline]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The first line, normally the fault message
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }

    /// Lines with leading and trailing whitespace removed, the form handed to
    /// presentation collaborators
    pub fn trimmed(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.trim().to_owned()).collect()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for FaultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}
