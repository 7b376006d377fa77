//! Error types for the DBF decoder.

use thiserror::Error;

/// Structural decode failures. Per-value problems (unparseable numeric
/// literals, unresolvable memo pointers) are not errors; they degrade to
/// [Value::Null](../enum.Value.html#variant.Null) instead.
#[derive(Debug, Error)]
pub enum DbfError {
    /// An error originating from I/O while loading a file from a path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The version byte matches no entry in the registry. Fatal; no
    /// partial table is returned.
    #[error("unknown file version: 0x{0:02x}")]
    UnknownFileVersion(u8),

    /// A computed read would run past the end of the supplied buffer,
    /// e.g. a truncated file or a record length inconsistent with the
    /// schema. Fatal; the decode never fabricates data.
    #[error(
        "read past end of buffer while reading {context}: \
         need {wanted} bytes at offset {offset}, but only {available} available"
    )]
    OutOfBounds {
        context: &'static str,
        offset: usize,
        wanted: usize,
        available: usize,
    },
}

/// Result type alias for decoder operations.
pub type Result<T> = std::result::Result<T, DbfError>;
