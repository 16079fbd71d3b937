//! Persist/unpersist errors.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::path::Path;

/// An error raised while persisting or unpersisting an object graph.
///
/// Mirrors the source engine's policy of "no local recovery": any error
/// aborts the whole operation. `Error` carries a [`ErrorKind`] describing
/// what went wrong and, when [`crate::Config::path`] is enabled, the
/// [`Path`] through the object graph at which it happened.
#[derive(Debug)]
pub struct Error {
    inner: Box<Inner>,
}

#[derive(Debug)]
struct Inner {
    kind: ErrorKind,
    path: Path,
}

/// The distinguishable root causes behind an [`Error`], per the error
/// taxonomy of the engine: I/O failure, forbidden values, unsupported
/// constructs, bad special-persistence callbacks, permanents violations,
/// and stream corruption.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The writer sink refused bytes, or the reader source returned short.
    Io(io::Error),
    /// A value was marked non-persistable, or literal userdata lacked consent.
    Forbidden(&'static str),
    /// A running coroutine, a hook-yielded thread, an un-permanented host
    /// function, or an unrecognized type tag in the stream.
    Unsupported(String),
    /// The `__persist` metafield did not return a callable, or the
    /// reconstruction callable returned the wrong kind of value.
    InvalidSpecialCallback(String),
    /// A permanent key was absent on read, or resolved to the wrong kind.
    PermsViolation(String),
    /// The stream is malformed: a dangling reference id, an invalid header,
    /// an invalid continuation function, or similar.
    StreamCorruption(String),
    /// The dispatcher's recursion depth exceeded [`crate::Config::max_recursion`].
    RecursionLimitReached,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Error {
            inner: Box::new(Inner {
                kind,
                path: Path::new(false),
            }),
        }
    }

    pub(crate) fn io(e: io::Error) -> Self {
        Error::new(ErrorKind::Io(e))
    }

    pub(crate) fn forbidden(reason: &'static str) -> Self {
        Error::new(ErrorKind::Forbidden(reason))
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::Unsupported(msg.into()))
    }

    pub(crate) fn invalid_special_callback(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidSpecialCallback(msg.into()))
    }

    pub(crate) fn perms_violation(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::PermsViolation(msg.into()))
    }

    pub(crate) fn stream_corruption(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::StreamCorruption(msg.into()))
    }

    pub(crate) fn recursion_limit_reached() -> Self {
        Error::new(ErrorKind::RecursionLimitReached)
    }

    /// Attach (or extend) the path at which this error occurred.
    ///
    /// Called on the way back up the call stack as the error unwinds, so
    /// that by the time it reaches the caller the path reads root-first.
    pub(crate) fn with_path(mut self, path: &Path) -> Self {
        if self.inner.path.segments().is_empty() {
            self.inner.path = path.clone();
        }
        self
    }

    /// The root-cause details.
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }

    /// The path through the object graph at which the error occurred, if
    /// path tracking was enabled via [`crate::Config::path`].
    pub fn path(&self) -> &Path {
        &self.inner.path
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.kind)?;
        write!(f, "{}", self.inner.path)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Io(e) => write!(f, "i/o failure: {e}"),
            ErrorKind::Forbidden(reason) => write!(f, "forbidden: {reason}"),
            ErrorKind::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            ErrorKind::InvalidSpecialCallback(msg) => write!(f, "invalid special persistence callback: {msg}"),
            ErrorKind::PermsViolation(msg) => write!(f, "permanents violation: {msg}"),
            ErrorKind::StreamCorruption(msg) => write!(f, "stream corruption: {msg}"),
            ErrorKind::RecursionLimitReached => write!(f, "recursion limit reached"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.inner.kind {
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::io(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
