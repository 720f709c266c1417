//! The change-stream interface consumed by the compiler.
//!
//! A [`ChangeCursor`] walks an ordered sequence of row-level change
//! operations, one at a time. [`ChangesetReader`](crate::ChangesetReader)
//! implements it over raw changeset/patchset bytes; callers bridging other
//! decoders (or an apply-time conflict iterator) implement it themselves.

use crate::errors::DecodeError;
use crate::value::Value;

/// The kind of a row-level change operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// A row was inserted.
    Insert,
    /// A row was updated.
    Update,
    /// A row was deleted.
    Delete,
}

/// Pull-based iteration over decoded change operations.
///
/// The cursor starts positioned before the first operation; each successful
/// [`advance`](ChangeCursor::advance) that returns `true` makes one
/// operation current. Values returned by the accessors are owned by the
/// cursor and remain valid only until the next `advance`.
///
/// # Panics
///
/// The per-row accessors (`table`, `kind`, `column_count`, `old_value`,
/// `new_value`, `conflict_value`, `primary_key_mask`) may panic if no
/// operation is current, or if a column index is out of range. Calling them
/// correctly is the caller's contract, not a recoverable condition.
pub trait ChangeCursor {
    /// Advance to the next operation.
    ///
    /// Returns `false` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the underlying stream is corrupt. The
    /// cursor must not be used further after an error.
    fn advance(&mut self) -> Result<bool, DecodeError>;

    /// The table the current operation applies to.
    fn table(&self) -> &str;

    /// The kind of the current operation.
    fn kind(&self) -> OpKind;

    /// The number of columns in the current operation's table.
    fn column_count(&self) -> usize;

    /// The value of column `col` before the change.
    ///
    /// Meaningful for [`OpKind::Update`] and [`OpKind::Delete`];
    /// [`Value::Undefined`] otherwise.
    fn old_value(&self, col: usize) -> &Value;

    /// The value of column `col` after the change.
    ///
    /// Meaningful for [`OpKind::Insert`] and [`OpKind::Update`];
    /// [`Value::Undefined`] otherwise.
    fn new_value(&self, col: usize) -> &Value;

    /// The value found in the target row when the change failed to apply.
    ///
    /// Only apply-time conflict iterators carry these; the default
    /// implementation reports [`Value::Undefined`] for every column.
    fn conflict_value(&self, col: usize) -> &Value {
        let _ = col;
        &Value::Undefined
    }

    /// Per-column primary-key membership for the current operation's table.
    ///
    /// The mask length equals [`column_count`](ChangeCursor::column_count).
    fn primary_key_mask(&self) -> &[bool];
}

impl<C: ChangeCursor + ?Sized> ChangeCursor for &mut C {
    fn advance(&mut self) -> Result<bool, DecodeError> {
        C::advance(self)
    }

    fn table(&self) -> &str {
        C::table(self)
    }

    fn kind(&self) -> OpKind {
        C::kind(self)
    }

    fn column_count(&self) -> usize {
        C::column_count(self)
    }

    fn old_value(&self, col: usize) -> &Value {
        C::old_value(self, col)
    }

    fn new_value(&self, col: usize) -> &Value {
        C::new_value(self, col)
    }

    fn conflict_value(&self, col: usize) -> &Value {
        C::conflict_value(self, col)
    }

    fn primary_key_mask(&self) -> &[bool] {
        C::primary_key_mask(self)
    }
}
