//! The backend read path: the ordered `(parent, rdn)` index of the
//! store and the cursors that stream from it.

mod children;
pub use children::ChildrenCursor;

mod cursor;
pub use cursor::{Cursor, CursorError};

mod index;
pub use index::{IndexEntry, ParentIdAndRdn, RdnIndex, RdnIndexCursor};
