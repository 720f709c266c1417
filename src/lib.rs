#![doc = include_str!("../README.md")]
#![no_std]
#![deny(clippy::mod_module_files)]

extern crate alloc;

pub mod compiler;
pub mod cursor;
pub mod errors;
pub mod reader;
pub mod schema;
pub mod value;

// Re-export main types
#[cfg(feature = "rusqlite")]
pub use compiler::session_to_sql;
pub use compiler::{Compiler, changeset_to_sql};
pub use cursor::{ChangeCursor, OpKind};
pub use errors::{DecodeError, Error};
pub use reader::ChangesetReader;
pub use schema::{ColumnCache, ColumnSource, SchemaError, StaticColumns};
pub use value::{BlobPolicy, SqlLiteral, Value};
