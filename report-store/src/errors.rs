use std::{fmt, path::PathBuf};

/// What a [`StorageError`] was trying to do when it failed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// The artifact, or the location containing it, could not be written
    Unwritable,
    /// The artifact, or the location containing it, could not be read or parsed
    Unreadable,
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unwritable => "unable to write",
            Self::Unreadable => "unable to read",
        })
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{kind} '{}'", .path.display())]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl StorageError {
    #[inline]
    pub(crate) fn unwritable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            kind: StorageErrorKind::Unwritable,
            path: path.into(),
            source,
        }
    }

    #[inline]
    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            kind: StorageErrorKind::Unreadable,
            path: path.into(),
            source,
        }
    }
}
