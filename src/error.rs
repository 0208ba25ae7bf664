//! Error surface shared by every fallible operation in the crate.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RaidError>;

/// Errors surfaced by the RAID-5 stream and its helpers.
///
/// None of these are retried internally. After an [`Io`](RaidError::Io)
/// failure mid-write the touched stripe may hold partially written units;
/// callers must treat the stream as potentially inconsistent.
#[derive(Debug, Error)]
pub enum RaidError {
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("disk {disk} is failed; {op} refused")]
    DiskFailed { disk: usize, op: &'static str },

    #[error("array integrity lost: {0}")]
    Integrity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("seek resolved to a negative position ({0})")]
    Seek(i128),
}
