//! Compilation of change streams into SQL text.
//!
//! [`Compiler`] drives a [`ChangeCursor`] one operation at a time, builds
//! one SQL statement per operation, and groups the statements by table and
//! operation kind. Tables appear in first-seen order; within a table all
//! `INSERT`s come first, then all `UPDATE`s, then all `DELETE`s, each in
//! original stream order. Callers that need strict replay order across
//! operation kinds must not rely on this output ordering.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use indexmap::IndexMap as IndexMapRaw;

use crate::cursor::{ChangeCursor, OpKind};
use crate::errors::Error;
use crate::reader::ChangesetReader;
use crate::schema::{ColumnCache, ColumnSource};
use crate::value::BlobPolicy;

/// `IndexMap` alias using hashbrown's default hasher for `no_std` compatibility.
type IndexMap<K, V> = IndexMapRaw<K, V, hashbrown::DefaultHashBuilder>;

/// Statement lines for one table, bucketed by operation kind.
#[derive(Debug, Default)]
struct TableBucket {
    inserts: Vec<String>,
    updates: Vec<String>,
    deletes: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct Options {
    policy: BlobPolicy,
    comments: bool,
    conflicts: bool,
}

/// Compiles change streams into equivalent SQL statements.
///
/// One instance owns the schema collaborator and a per-table column-name
/// cache. The cache persists across [`compile`](Compiler::compile) calls on
/// the same instance, so the schema must not change between them;
/// independent compilations running in parallel need their own instances.
///
/// # Example
///
/// ```rust
/// use sqlite_changeset_sql::{ChangesetReader, Compiler, StaticColumns};
///
/// let columns = StaticColumns::new().with_table("t", ["id", "label"]);
/// let mut compiler = Compiler::new(columns).comments(false);
/// assert_eq!(compiler.compile(ChangesetReader::new(&[]))?, "");
/// # Ok::<(), sqlite_changeset_sql::Error>(())
/// ```
#[derive(Debug)]
pub struct Compiler<S> {
    source: S,
    columns: ColumnCache,
    policy: BlobPolicy,
    comments: bool,
    conflicts: bool,
}

impl<S: ColumnSource> Compiler<S> {
    /// Create a compiler over a schema collaborator.
    ///
    /// Defaults: [`BlobPolicy::PreferText`], diagnostic comments on,
    /// conflict emission off.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            columns: ColumnCache::new(),
            policy: BlobPolicy::default(),
            comments: true,
            conflicts: false,
        }
    }

    /// Set the text-value encoding policy for all compiled values.
    #[must_use]
    pub fn blob_policy(mut self, policy: BlobPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable the diagnostic `/* old: … */` comments recording
    /// pre-change values on `UPDATE` and `DELETE` statements.
    ///
    /// The comments never affect statement semantics.
    #[must_use]
    pub fn comments(mut self, enabled: bool) -> Self {
        self.comments = enabled;
        self
    }

    /// Enable or disable emission of apply-time conflict values into the
    /// diagnostic comments.
    ///
    /// Only meaningful with a cursor whose
    /// [`conflict_value`](ChangeCursor::conflict_value) carries data.
    #[must_use]
    pub fn conflicts(mut self, enabled: bool) -> Self {
        self.conflicts = enabled;
        self
    }

    /// Compile an entire change stream into grouped SQL text.
    ///
    /// The stream is consumed exactly once, in order. The result is a
    /// single string of newline-terminated statements with a blank line
    /// between table blocks, or an empty string for an empty stream.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error`] encountered; no partial output is
    /// produced.
    pub fn compile<C: ChangeCursor>(&mut self, mut cursor: C) -> Result<String, Error> {
        let opts = Options {
            policy: self.policy,
            comments: self.comments,
            conflicts: self.conflicts,
        };
        let mut tables: IndexMap<String, TableBucket> = IndexMap::default();

        while cursor.advance()? {
            let table = cursor.table().to_string();
            let names = self.columns.resolve(&self.source, &table)?;
            if names.len() != cursor.column_count() {
                return Err(Error::ColumnCountMismatch {
                    schema: names.len(),
                    record: cursor.column_count(),
                    table,
                });
            }

            let kind = cursor.kind();
            let line = match kind {
                OpKind::Insert => insert_statement(&cursor, &table, names, opts),
                OpKind::Update => update_statement(&cursor, &table, names, opts),
                OpKind::Delete => delete_statement(&cursor, &table, names, opts),
            };

            let bucket = tables.entry(table).or_default();
            match kind {
                OpKind::Insert => bucket.inserts.push(line),
                OpKind::Update => bucket.updates.push(line),
                OpKind::Delete => bucket.deletes.push(line),
            }
        }

        let mut out = String::new();
        for bucket in tables.values() {
            for line in bucket
                .inserts
                .iter()
                .chain(&bucket.updates)
                .chain(&bucket.deletes)
            {
                out.push_str(line);
            }
            out.push('\n');
        }

        let trimmed = out.trim_end();
        if trimmed.is_empty() {
            return Ok(String::new());
        }
        let mut result = trimmed.to_string();
        result.push('\n');
        Ok(result)
    }
}

/// Quote a SQL identifier (table or column name) with double quotes.
///
/// Escapes any embedded double quotes by doubling them.
fn quote_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for c in name.chars() {
        if c == '"' {
            out.push_str("\"\"");
        } else {
            out.push(c);
        }
    }
    out.push('"');
    out
}

/// Append ` /* part part */` to `sql`, skipping empty parts.
fn push_comment(sql: &mut String, parts: &[String]) {
    let parts: Vec<&str> = parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .collect();
    if parts.is_empty() {
        return;
    }
    sql.push_str(" /* ");
    sql.push_str(&parts.join(" "));
    sql.push_str(" */");
}

fn insert_statement(
    cursor: &impl ChangeCursor,
    table: &str,
    names: &[String],
    opts: Options,
) -> String {
    let mut cols = Vec::new();
    let mut vals = Vec::new();
    let mut conf = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let value = cursor.new_value(i);
        // A column is included iff the decoder recorded a new value for it;
        // an explicit NULL assignment is a recorded value
        if value.is_undefined() {
            continue;
        }
        cols.push(quote_identifier(name));
        vals.push(value.literal(opts.policy).to_string());
        if opts.conflicts {
            conf.push(cursor.conflict_value(i).literal(opts.policy).to_string());
        }
    }

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        cols.join(", "),
        vals.join(", ")
    );
    if opts.conflicts && !conf.is_empty() {
        push_comment(&mut sql, &[format!("conflict: ({})", conf.join(", "))]);
    }
    sql.push_str(";\n");
    sql
}

fn update_statement(
    cursor: &impl ChangeCursor,
    table: &str,
    names: &[String],
    opts: Options,
) -> String {
    let mask = cursor.primary_key_mask();
    let mut key_cols = Vec::new();
    let mut key_vals = Vec::new();
    let mut set_cols = Vec::new();
    let mut set_vals = Vec::new();
    let mut old_vals = Vec::new();
    let mut conf = Vec::new();
    for (i, name) in names.iter().enumerate() {
        if mask[i] {
            // The WHERE clause always targets the pre-change key, since an
            // update may itself rewrite key columns
            key_cols.push(quote_identifier(name));
            key_vals.push(cursor.old_value(i).literal(opts.policy).to_string());
            continue;
        }
        let new = cursor.new_value(i);
        if new.is_undefined() {
            continue;
        }
        set_cols.push(quote_identifier(name));
        set_vals.push(new.literal(opts.policy).to_string());
        old_vals.push(cursor.old_value(i).literal(opts.policy).to_string());
        if opts.conflicts {
            conf.push(cursor.conflict_value(i).literal(opts.policy).to_string());
        }
    }

    let mut sql = format!(
        "UPDATE {} SET ({}) = ({}) WHERE ({}) = ({})",
        quote_identifier(table),
        set_cols.join(", "),
        set_vals.join(", "),
        key_cols.join(", "),
        key_vals.join(", ")
    );
    let mut parts = Vec::new();
    if opts.comments && !old_vals.is_empty() {
        parts.push(format!("old: ({})", old_vals.join(", ")));
    }
    if opts.conflicts && !conf.is_empty() {
        parts.push(format!("conflict: ({})", conf.join(", ")));
    }
    push_comment(&mut sql, &parts);
    sql.push_str(";\n");
    sql
}

fn delete_statement(
    cursor: &impl ChangeCursor,
    table: &str,
    names: &[String],
    opts: Options,
) -> String {
    let mask = cursor.primary_key_mask();
    let mut key_cols = Vec::new();
    let mut key_vals = Vec::new();
    let mut data_cols = Vec::new();
    let mut data_vals = Vec::new();
    let mut conf = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let old = cursor.old_value(i);
        if mask[i] {
            key_cols.push(quote_identifier(name));
            key_vals.push(old.literal(opts.policy).to_string());
            continue;
        }
        // Patchset deletes record no non-key values
        if old.is_undefined() {
            continue;
        }
        data_cols.push(quote_identifier(name));
        data_vals.push(old.literal(opts.policy).to_string());
        if opts.conflicts {
            conf.push(cursor.conflict_value(i).literal(opts.policy).to_string());
        }
    }

    let mut sql = format!(
        "DELETE FROM {} WHERE ({}) = ({})",
        quote_identifier(table),
        key_cols.join(", "),
        key_vals.join(", ")
    );
    let mut parts = Vec::new();
    if opts.comments && !data_cols.is_empty() {
        parts.push(format!(
            "({}) = ({})",
            data_cols.join(", "),
            data_vals.join(", ")
        ));
    }
    if opts.conflicts && !conf.is_empty() {
        parts.push(format!("conflict: ({})", conf.join(", ")));
    }
    push_comment(&mut sql, &parts);
    sql.push_str(";\n");
    sql
}

/// Compile raw changeset or patchset bytes into SQL with default settings.
///
/// Column names are resolved through `source`. Equivalent to wrapping the
/// bytes in a [`ChangesetReader`] and running a fresh [`Compiler`].
///
/// # Errors
///
/// Returns an [`Error`] if the bytes are malformed or column metadata
/// cannot be resolved.
pub fn changeset_to_sql(source: impl ColumnSource, data: &[u8]) -> Result<String, Error> {
    Compiler::new(source).compile(ChangesetReader::new(data))
}

/// Compile a live session's changeset into SQL with default settings.
///
/// Extracts the changeset from `session` and compiles it against `conn`,
/// which doubles as the column-name source.
///
/// # Errors
///
/// Returns an [`Error`] if the changeset cannot be extracted or compiled.
#[cfg(feature = "rusqlite")]
pub fn session_to_sql(
    conn: &rusqlite::Connection,
    session: &mut rusqlite::session::Session<'_>,
) -> Result<String, Error> {
    let mut changeset = Vec::new();
    session.changeset_strm(&mut changeset)?;
    changeset_to_sql(conn, &changeset)
}
