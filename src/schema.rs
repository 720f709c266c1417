//! Column metadata resolution and caching.
//!
//! Change records address columns by index; turning them into SQL needs the
//! table's column names in declaration order. The [`ColumnSource`] trait is
//! that collaborator's interface, [`ColumnCache`] memoizes its answers for
//! the lifetime of a [`Compiler`](crate::Compiler), and [`StaticColumns`]
//! serves callers that know their schema without a live database. With the
//! `rusqlite` feature, a `rusqlite::Connection` is a `ColumnSource` backed
//! by `PRAGMA table_info`.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use hashbrown::HashMap;

/// Errors that can occur while resolving column metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The table is not known to the schema collaborator.
    #[error("no such table: {0}")]
    TableNotFound(String),

    /// The lookup itself failed.
    #[error("column lookup for table {table:?} failed: {reason}")]
    Lookup {
        /// The table whose metadata was requested.
        table: String,
        /// Description of the underlying failure.
        reason: String,
    },
}

/// Provider of per-table column metadata.
///
/// Implementations return the table's column names in declaration order.
/// The compiler assumes the answer is stable for the duration of one
/// compilation run; it never re-queries a table it has already resolved.
pub trait ColumnSource {
    /// The ordered column names of `table`.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the table is unknown or the lookup
    /// fails. Either aborts the compilation in progress.
    fn column_names(&self, table: &str) -> Result<Vec<String>, SchemaError>;
}

impl<S: ColumnSource + ?Sized> ColumnSource for &S {
    fn column_names(&self, table: &str) -> Result<Vec<String>, SchemaError> {
        S::column_names(self, table)
    }
}

/// An in-memory [`ColumnSource`] for callers without a live database.
///
/// # Example
///
/// ```rust
/// use sqlite_changeset_sql::{ColumnSource, StaticColumns};
///
/// let columns = StaticColumns::new()
///     .with_table("users", ["id", "name"])
///     .with_table("posts", ["id", "user_id", "body"]);
///
/// assert_eq!(columns.column_names("users").unwrap(), ["id", "name"]);
/// assert!(columns.column_names("missing").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticColumns {
    tables: HashMap<String, Vec<String>>,
}

impl StaticColumns {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `table` with its column names in declaration order.
    #[must_use]
    pub fn with_table<I, C>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.tables
            .insert(table.into(), columns.into_iter().map(Into::into).collect());
        self
    }
}

impl ColumnSource for StaticColumns {
    fn column_names(&self, table: &str) -> Result<Vec<String>, SchemaError> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| SchemaError::TableNotFound(table.to_string()))
    }
}

/// Memoizes [`ColumnSource`] answers per table.
///
/// The cache is owned by one compiler instance; independent compilations
/// must not share it, and it holds no global state.
#[derive(Debug, Clone, Default)]
pub struct ColumnCache {
    names: HashMap<String, Vec<String>>,
}

impl ColumnCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the ordered column names for `table`.
    ///
    /// The first request for a table queries `source`; later requests
    /// return the memoized list without touching it.
    ///
    /// # Errors
    ///
    /// Propagates the [`SchemaError`] from `source` on a cache miss.
    pub fn resolve(
        &mut self,
        source: &impl ColumnSource,
        table: &str,
    ) -> Result<&[String], SchemaError> {
        if !self.names.contains_key(table) {
            let resolved = source.column_names(table)?;
            self.names.insert(table.to_string(), resolved);
        }
        Ok(&self.names[table])
    }
}

#[cfg(feature = "rusqlite")]
fn lookup_error(table: &str, err: &rusqlite::Error) -> SchemaError {
    SchemaError::Lookup {
        table: table.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(feature = "rusqlite")]
impl ColumnSource for rusqlite::Connection {
    /// Query the column names via `PRAGMA table_info`, in declaration order.
    ///
    /// An empty answer is reported as [`SchemaError::TableNotFound`]: the
    /// pragma cannot otherwise distinguish a missing table from one with no
    /// columns.
    fn column_names(&self, table: &str) -> Result<Vec<String>, SchemaError> {
        let quoted = table.replace('"', "\"\"");
        let sql = alloc::format!("PRAGMA table_info(\"{quoted}\")");
        let mut stmt = self.prepare(&sql).map_err(|e| lookup_error(table, &e))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| lookup_error(table, &e))?
            .collect::<Result<Vec<String>, _>>()
            .map_err(|e| lookup_error(table, &e))?;
        if names.is_empty() {
            return Err(SchemaError::TableNotFound(table.to_string()));
        }
        Ok(names)
    }
}
