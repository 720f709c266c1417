//! Cell values and their SQL literal rendering.
//!
//! Changeset records distinguish a column whose value was *not recorded*
//! (type code 0 on the wire, [`Value::Undefined`] here) from a column that
//! was explicitly set to SQL `NULL` (type code 5, [`Value::Null`]). The
//! compiler omits `Undefined` columns from generated statements and keeps
//! explicit `NULL` assignments.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::{self, Display};

/// A single cell value decoded from a change record.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// IEEE 754 floating point.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Binary blob.
    Blob(Vec<u8>),
    #[default]
    /// No value recorded for this column (unchanged column in an UPDATE,
    /// non-key column in a patchset DELETE).
    Undefined,
}

impl Value {
    /// Check if the value is `Undefined`.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if the value is `Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render this value as a SQL literal under the given policy.
    ///
    /// `Undefined` renders as `NULL`; the compiler only reaches for it in
    /// diagnostic comment positions, never in executable SQL.
    #[must_use]
    pub fn literal(&self, policy: BlobPolicy) -> SqlLiteral<'_> {
        SqlLiteral {
            value: self,
            policy,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Compilation-wide encoding policy for text values.
///
/// Some engines' change-capture layer can mis-tag a BLOB column as TEXT;
/// forcing hex encoding for all byte-bearing columns works around that.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BlobPolicy {
    /// Render text values as quoted string literals.
    #[default]
    PreferText,
    /// Render text values as hex blob literals, as a blob would be.
    AlwaysBlob,
}

/// Displays a [`Value`] as a SQL literal.
///
/// Created by [`Value::literal`].
#[derive(Debug, Clone, Copy)]
pub struct SqlLiteral<'a> {
    value: &'a Value,
    policy: BlobPolicy,
}

impl Display for SqlLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Null | Value::Undefined => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write_real(f, *v),
            Value::Text(s) => match self.policy {
                BlobPolicy::PreferText => write_quoted(f, s),
                BlobPolicy::AlwaysBlob => write_hex(f, s.as_bytes()),
            },
            Value::Blob(b) => write_hex(f, b),
        }
    }
}

fn write_real(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        write!(f, "NULL")
    } else if v.is_infinite() {
        if v.is_sign_positive() {
            write!(f, "9e999")
        } else {
            write!(f, "-9e999")
        }
    } else {
        // Ensure we always have a decimal point so the value is read back as REAL
        let s = alloc::format!("{v}");
        if s.contains('.') || s.contains('e') || s.contains('E') {
            write!(f, "{s}")
        } else {
            write!(f, "{s}.0")
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    // Escape single quotes by doubling them
    write!(f, "'")?;
    for c in s.chars() {
        if c == '\'' {
            write!(f, "''")?;
        } else {
            fmt::Write::write_char(f, c)?;
        }
    }
    write!(f, "'")
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    write!(f, "X'")?;
    for byte in bytes {
        write!(f, "{byte:02X}")?;
    }
    write!(f, "'")
}
