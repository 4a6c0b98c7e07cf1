//! Portable types describing a single uncaught fault.
//!
//! A [`FaultReport`] is built once, at the moment a fault is intercepted, and
//! is never mutated afterwards. It is the value that flows from the
//! interceptor into whatever store persists it, so it only contains owned,
//! thread safe data.

mod environment;
mod summary;

pub use environment::{Environment, keys};
pub use summary::FaultSummary;

use chrono::{DateTime, Local};
use std::fmt;

/// Identity of the thread a fault was raised on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadIdentity {
    name: Option<String>,
    id: String,
}

impl ThreadIdentity {
    #[inline]
    pub fn new(name: Option<String>, id: impl Into<String>) -> Self {
        Self {
            name,
            id: id.into(),
        }
    }

    /// Identity of the calling thread
    pub fn current() -> Self {
        let thread = std::thread::current();
        Self {
            name: thread.name().map(str::to_owned),
            id: format!("{:?}", thread.id()),
        }
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ThreadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "<unnamed {}>", self.id),
        }
    }
}

/// An immutable record of one fault event
#[derive(Clone, Debug)]
pub struct FaultReport {
    timestamp: DateTime<Local>,
    thread: ThreadIdentity,
    summary: FaultSummary,
    environment: Environment,
}

impl FaultReport {
    pub fn new(
        timestamp: DateTime<Local>,
        thread: ThreadIdentity,
        summary: FaultSummary,
        environment: Environment,
    ) -> Self {
        Self {
            timestamp,
            thread,
            summary,
            environment,
        }
    }

    /// Creates a report stamped with the current local time
    #[inline]
    pub fn capture(
        thread: ThreadIdentity,
        summary: FaultSummary,
        environment: Environment,
    ) -> Self {
        Self::new(Local::now(), thread, summary, environment)
    }

    /// The instant the fault was captured
    #[inline]
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    #[inline]
    pub fn thread(&self) -> &ThreadIdentity {
        &self.thread
    }

    #[inline]
    pub fn summary(&self) -> &FaultSummary {
        &self.summary
    }

    #[inline]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn thread_display() {
        let named = ThreadIdentity::new(Some("render".to_owned()), "ThreadId(7)");
        assert_eq!(named.to_string(), "render");

        let unnamed = ThreadIdentity::new(None, "ThreadId(8)");
        assert_eq!(unnamed.to_string(), "<unnamed ThreadId(8)>");
    }

    #[test]
    fn current_thread() {
        let handle = std::thread::Builder::new()
            .name("faulty".to_owned())
            .spawn(ThreadIdentity::current)
            .unwrap();

        let identity = handle.join().unwrap();
        assert_eq!(identity.name(), Some("faulty"));
        assert!(identity.id().starts_with("ThreadId("));
    }
}
