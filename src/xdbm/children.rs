use super::cursor::{Cursor, CursorError};
use super::index::{IndexEntry, ParentIdAndRdn};
use log::debug;

const UNSUPPORTED_MSG: &str =
    "one-level scope cursors cannot seek the end of the index";

/// A cursor over entries satisfying one-level scope constraints: the
/// direct children of one parent, streamed in index order.
///
/// The underlying index cursor must be positioned at the greatest lower
/// bound of `(parent_id, "")` before it is handed in, so that the first
/// advance lands on the first child. The wrapper then walks forward or
/// backward over the contiguous run of keys sharing that parent; the
/// first key outside the run ends the traversal in that direction.
pub struct ChildrenCursor<ID, C> {
    cursor: C,
    parent_id: ID,
    prefetched: Option<IndexEntry<ID, ID>>,
    closed: bool,
}

impl<ID, C> ChildrenCursor<ID, C>
where
    ID: Clone + PartialEq,
    C: Cursor<IndexEntry<ParentIdAndRdn<ID>, ID>>,
{
    pub fn new(parent_id: ID, cursor: C) -> Self {
        debug!(target: "cursor", "Creating ChildrenCursor");
        return Self {
            cursor,
            parent_id,
            prefetched: None,
            closed: false,
        };
    }

    fn check_not_closed(&self) -> Result<(), CursorError> {
        if self.closed {
            return Err(CursorError::Closed);
        }
        return Ok(());
    }
}

impl<ID, C> Cursor<IndexEntry<ID, ID>> for ChildrenCursor<ID, C>
where
    ID: Clone + PartialEq,
    C: Cursor<IndexEntry<ParentIdAndRdn<ID>, ID>>,
{
    fn next(&mut self) -> Result<bool, CursorError> {
        self.check_not_closed()?;

        if self.cursor.next()? {
            let entry = self.cursor.get()?;
            if entry.key.parent_id == self.parent_id {
                self.prefetched = Some(IndexEntry::new(
                    self.parent_id.clone(),
                    entry.id.clone(),
                ));
                return Ok(true);
            }
        }

        self.prefetched = None;
        return Ok(false);
    }

    fn previous(&mut self) -> Result<bool, CursorError> {
        self.check_not_closed()?;

        if self.cursor.previous()? {
            let entry = self.cursor.get()?;
            if entry.key.parent_id == self.parent_id {
                self.prefetched = Some(IndexEntry::new(
                    self.parent_id.clone(),
                    entry.id.clone(),
                ));
                return Ok(true);
            }
        }

        self.prefetched = None;
        return Ok(false);
    }

    fn before_first(&mut self) -> Result<(), CursorError> {
        self.check_not_closed()?;
        self.prefetched = None;
        return Ok(());
    }

    fn after_last(&mut self) -> Result<(), CursorError> {
        return Err(CursorError::Unsupported(UNSUPPORTED_MSG));
    }

    fn first(&mut self) -> Result<bool, CursorError> {
        self.before_first()?;
        return self.next();
    }

    fn last(&mut self) -> Result<bool, CursorError> {
        return Err(CursorError::Unsupported(UNSUPPORTED_MSG));
    }

    fn get(&self) -> Result<&IndexEntry<ID, ID>, CursorError> {
        self.check_not_closed()?;
        return self.prefetched.as_ref().ok_or(CursorError::NotAvailable);
    }

    fn close(&mut self) -> Result<(), CursorError> {
        if self.closed {
            return Ok(());
        }
        debug!(target: "cursor", "Closing ChildrenCursor");
        self.closed = true;
        self.prefetched = None;
        return self.cursor.close();
    }

    fn close_with(&mut self, cause: &CursorError) -> Result<(), CursorError> {
        if self.closed {
            return Ok(());
        }
        debug!(target: "cursor", "Closing ChildrenCursor: {}", cause);
        self.closed = true;
        self.prefetched = None;
        return self.cursor.close_with(cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xdbm::index::RdnIndex;

    const P: u64 = 100;
    const Q: u64 = 200;

    /// The index of the scenario: three children of P interleaved with
    /// a child of another parent.
    fn index() -> RdnIndex<u64> {
        let mut index = RdnIndex::new();
        index.insert(ParentIdAndRdn::new(P, "a"), 1);
        index.insert(ParentIdAndRdn::new(P, "b"), 2);
        index.insert(ParentIdAndRdn::new(Q, "a"), 3);
        index.insert(ParentIdAndRdn::new(P, "c"), 4);
        return index;
    }

    #[test]
    fn test_streams_children_of_parent_in_order() {
        let index = index();
        let mut cursor = index.children_cursor(P);

        assert!(cursor.first().unwrap());
        assert_eq!(&IndexEntry::new(P, 1), cursor.get().unwrap());
        assert!(cursor.next().unwrap());
        assert_eq!(&IndexEntry::new(P, 2), cursor.get().unwrap());
        assert!(cursor.next().unwrap());
        assert_eq!(&IndexEntry::new(P, 4), cursor.get().unwrap());
        assert!(!cursor.next().unwrap());

        cursor.close().unwrap();
    }

    #[test]
    fn test_forward_and_backward_yield_the_same_children() {
        let index = index();
        let mut cursor = index.children_cursor(P);

        let mut forward = Vec::new();
        while cursor.next().unwrap() {
            forward.push(cursor.get().unwrap().id);
        }

        let mut backward = Vec::new();
        while cursor.previous().unwrap() {
            backward.push(cursor.get().unwrap().id);
        }

        backward.reverse();
        assert_eq!(vec![1, 2, 4], forward);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_every_emitted_key_is_the_parent() {
        let index = index();
        let mut cursor = index.children_cursor(P);

        while cursor.next().unwrap() {
            assert_eq!(P, cursor.get().unwrap().key);
        }
    }

    #[test]
    fn test_parent_without_children_yields_nothing() {
        let index = index();
        let mut cursor = index.children_cursor(999);

        assert!(!cursor.first().unwrap());
        assert_eq!(Err(CursorError::NotAvailable), cursor.get().map(|_| ()));
    }

    #[test]
    fn test_false_ends_the_direction() {
        let index = index();
        let mut cursor = index.children_cursor(P);

        while cursor.next().unwrap() {}
        assert!(!cursor.next().unwrap());
        assert_eq!(Err(CursorError::NotAvailable), cursor.get().map(|_| ()));
    }

    #[test]
    fn test_end_seeking_is_unsupported() {
        let index = index();
        let mut cursor = index.children_cursor(P);

        assert!(matches!(
            cursor.after_last(),
            Err(CursorError::Unsupported(_))
        ));
        assert!(matches!(cursor.last(), Err(CursorError::Unsupported(_))));
    }

    #[test]
    fn test_close_is_idempotent_and_final() {
        let index = index();
        let mut cursor = index.children_cursor(P);

        assert!(cursor.first().unwrap());
        cursor.close().unwrap();
        cursor.close().unwrap();

        assert_eq!(Err(CursorError::Closed), cursor.next());
        assert_eq!(Err(CursorError::Closed), cursor.get().map(|_| ()));
    }

    #[test]
    fn test_close_with_cause_reaches_the_underlying_cursor() {
        let index = index();
        let mut cursor = index.children_cursor(P);

        cursor
            .close_with(&CursorError::Unsupported("abandoned search"))
            .unwrap();
        assert_eq!(Err(CursorError::Closed), cursor.next());
    }
}
