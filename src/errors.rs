//! Submodule defining the errors used across the crate.

use alloc::string::String;

use crate::schema::SchemaError;

/// Errors that can occur while compiling a changeset to SQL.
///
/// All failures are fatal for the compilation in progress: no partial output
/// is returned and nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The change stream was malformed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Column metadata could not be resolved for a table.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The resolved column list and the change record disagree on the number
    /// of columns. This is a contract breach between the schema collaborator
    /// and the decoder, not a recoverable runtime condition.
    #[error("table {table:?} has {schema} columns but the change record has {record}")]
    ColumnCountMismatch {
        /// The table whose metadata disagreed with the change record.
        table: String,
        /// Number of columns reported by the schema collaborator.
        schema: usize,
        /// Number of columns carried by the change record.
        record: usize,
    },

    /// An underlying SQLite call failed.
    #[cfg(feature = "rusqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors that can occur while decoding a binary changeset or patchset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Unexpected end of input.
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),

    /// Invalid table marker (expected 'T' or 'P').
    #[error("invalid table marker 0x{0:02x} at byte {1}")]
    InvalidTableMarker(u8, usize),

    /// Invalid operation code.
    #[error("invalid operation code 0x{0:02x} at byte {1}")]
    InvalidOpCode(u8, usize),

    /// Invalid UTF-8 in a table name.
    #[error("invalid UTF-8 in table name at byte {0}")]
    InvalidTableName(usize),

    /// A value could not be decoded.
    #[error("failed to decode value at byte {0}")]
    InvalidValue(usize),

    /// Table name not null-terminated.
    #[error("table name not null-terminated")]
    UnterminatedTableName,

    /// Changeset and patchset table headers mixed in the same stream.
    #[error("mixed format markers: found 0x{found:02x} at byte {position}")]
    MixedFormats {
        /// The marker byte that disagreed with the stream's format.
        found: u8,
        /// The position where the mismatch occurred.
        position: usize,
    },
}
