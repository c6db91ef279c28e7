//! Error types and the last-error message slot

use std::path::PathBuf;

use parking_lot::Mutex;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input path or archive file is missing
    #[error("Path not found. Path: '{}'", .0.display())]
    PathNotFound(PathBuf),

    /// Container open/read/write/finalize failure, or a blob load failure
    #[error("{context}")]
    FileIo {
        context: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Malformed attribute record
    #[error("Parse error at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),
}

impl Error {
    pub(crate) fn file_io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::FileIo {
            context: context.into(),
            source: Some(source),
        }
    }

    pub(crate) fn file_io_msg(context: impl Into<String>) -> Self {
        Error::FileIo {
            context: context.into(),
            source: None,
        }
    }

    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            offset,
            message: message.into(),
        }
    }
}

static LAST_ERROR: Mutex<Option<String>> = parking_lot::const_mutex(None);

// Held by tests that fail an operation or clear the slot, so they don't race.
#[cfg(test)]
pub(crate) static LAST_ERROR_TEST_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Overwrite the last error message
pub fn set_last_error(message: impl Into<String>) {
    *LAST_ERROR.lock() = Some(message.into());
}

/// Last error message recorded by an archive operation, if any
pub fn last_error() -> Option<String> {
    LAST_ERROR.lock().clone()
}

pub fn clear_last_error() {
    *LAST_ERROR.lock() = None;
}

/// Record the error of a failed operation in the last-error slot and pass it on.
pub(crate) fn record<T>(result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        set_last_error(err.to_string());
    }
    result
}
