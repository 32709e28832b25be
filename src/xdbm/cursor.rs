use std::fmt;

/// Failures of the cursor protocol. These are the backend's own
/// taxonomy and never map into Kerberos errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    /// The operation is not supported by this cursor implementation.
    Unsupported(&'static str),
    /// The cursor, or the resource under it, was already closed.
    Closed,
    /// `get` was called without a prior successful positioning call.
    NotAvailable,
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorError::Unsupported(message) => {
                write!(f, "unsupported cursor operation: {}", message)
            }
            CursorError::Closed => write!(f, "cursor is closed"),
            CursorError::NotAvailable => {
                write!(f, "no element available at the cursor position")
            }
        }
    }
}

/// Bidirectional cursor over elements in their natural order. A cursor
/// is owned by a single reader and holds its snapshot of the data until
/// closed; `close` must run on every path, including error paths.
pub trait Cursor<E> {
    /// Advances to the following element; `false` when exhausted.
    fn next(&mut self) -> Result<bool, CursorError>;

    /// Moves back to the preceding element; `false` when exhausted.
    fn previous(&mut self) -> Result<bool, CursorError>;

    /// Positions before the first element, making none available.
    fn before_first(&mut self) -> Result<(), CursorError>;

    /// Positions after the last element, making none available.
    fn after_last(&mut self) -> Result<(), CursorError>;

    /// Positions on the first element when one exists.
    fn first(&mut self) -> Result<bool, CursorError>;

    /// Positions on the last element when one exists.
    fn last(&mut self) -> Result<bool, CursorError>;

    /// The element a successful `next`/`previous`/`first`/`last` landed
    /// on.
    fn get(&self) -> Result<&E, CursorError>;

    /// Releases the snapshot. Idempotent.
    fn close(&mut self) -> Result<(), CursorError>;

    /// Closes after a failure, handing the cause down to the underlying
    /// resources.
    fn close_with(&mut self, _cause: &CursorError) -> Result<(), CursorError> {
        return self.close();
    }
}
