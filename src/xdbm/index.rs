use super::children::ChildrenCursor;
use super::cursor::{Cursor, CursorError};
use std::collections::BTreeMap;

/// Composite key ordering the entries of the hierarchical index.
/// Ordering is `(parent_id, rdn)`, so the children of a parent are
/// contiguous and sorted by rdn.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParentIdAndRdn<ID> {
    pub parent_id: ID,
    pub rdn: String,
}

impl<ID> ParentIdAndRdn<ID> {
    pub fn new(parent_id: ID, rdn: &str) -> Self {
        return Self {
            parent_id,
            rdn: rdn.to_string(),
        };
    }
}

/// One index hit: the key it was found under and the entry id it leads
/// to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry<K, ID> {
    pub key: K,
    pub id: ID,
}

impl<K, ID> IndexEntry<K, ID> {
    pub fn new(key: K, id: ID) -> Self {
        return Self { key, id };
    }

    pub fn tuple(&self) -> (&K, &ID) {
        return (&self.key, &self.id);
    }
}

/// Ordered `(parent_id, rdn) -> entry id` index of the store, the
/// structure one-level searches stream children from.
#[derive(Debug, Default)]
pub struct RdnIndex<ID: Ord> {
    entries: BTreeMap<ParentIdAndRdn<ID>, ID>,
}

impl<ID: Clone + Ord> RdnIndex<ID> {
    pub fn new() -> Self {
        return Self {
            entries: BTreeMap::new(),
        };
    }

    pub fn insert(&mut self, key: ParentIdAndRdn<ID>, id: ID) {
        self.entries.insert(key, id);
    }

    pub fn remove(&mut self, key: &ParentIdAndRdn<ID>) -> Option<ID> {
        return self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    /// A cursor positioned at the greatest lower bound of
    /// `(parent_id, "")`: the next element, if any, is the first child
    /// of `parent_id`. The cursor iterates a snapshot taken here.
    pub fn cursor_before_parent(&self, parent_id: &ID) -> RdnIndexCursor<ID> {
        let entries: Vec<(ParentIdAndRdn<ID>, ID)> = self
            .entries
            .iter()
            .map(|(key, id)| (key.clone(), id.clone()))
            .collect();

        let glb = entries
            .partition_point(|(key, _)| key.parent_id < *parent_id);

        return RdnIndexCursor {
            entries,
            position: Position::Before(glb),
            current: None,
            closed: false,
        };
    }

    /// The one-level scope cursor over the children of `parent_id`.
    pub fn children_cursor(
        &self,
        parent_id: ID,
    ) -> ChildrenCursor<ID, RdnIndexCursor<ID>> {
        let cursor = self.cursor_before_parent(&parent_id);
        return ChildrenCursor::new(parent_id, cursor);
    }
}

/// A cursor either rests in the gap before element `i`, or sits on
/// element `i` after a successful advance.
#[derive(Debug, Clone, Copy)]
enum Position {
    Before(usize),
    On(usize),
}

/// Snapshot cursor over the whole index in `(parent_id, rdn)` order.
#[derive(Debug)]
pub struct RdnIndexCursor<ID> {
    entries: Vec<(ParentIdAndRdn<ID>, ID)>,
    position: Position,
    current: Option<IndexEntry<ParentIdAndRdn<ID>, ID>>,
    closed: bool,
}

impl<ID: Clone> RdnIndexCursor<ID> {
    fn check_not_closed(&self) -> Result<(), CursorError> {
        if self.closed {
            return Err(CursorError::Closed);
        }
        return Ok(());
    }

    fn settle_on(&mut self, index: usize) {
        let (key, id) = &self.entries[index];
        self.position = Position::On(index);
        self.current = Some(IndexEntry::new(key.clone(), id.clone()));
    }
}

impl<ID: Clone> Cursor<IndexEntry<ParentIdAndRdn<ID>, ID>>
    for RdnIndexCursor<ID>
{
    fn next(&mut self) -> Result<bool, CursorError> {
        self.check_not_closed()?;

        let len = self.entries.len();
        match self.position {
            Position::Before(index) if index < len => {
                self.settle_on(index);
                return Ok(true);
            }
            Position::On(index) if index + 1 < len => {
                self.settle_on(index + 1);
                return Ok(true);
            }
            Position::On(_) => {
                self.position = Position::Before(len);
                self.current = None;
                return Ok(false);
            }
            Position::Before(_) => {
                self.current = None;
                return Ok(false);
            }
        }
    }

    fn previous(&mut self) -> Result<bool, CursorError> {
        self.check_not_closed()?;

        match self.position {
            Position::Before(index) if index > 0 => {
                self.settle_on(index - 1);
                return Ok(true);
            }
            Position::On(index) if index > 0 => {
                self.settle_on(index - 1);
                return Ok(true);
            }
            Position::On(_) => {
                self.position = Position::Before(0);
                self.current = None;
                return Ok(false);
            }
            Position::Before(_) => {
                self.current = None;
                return Ok(false);
            }
        }
    }

    fn before_first(&mut self) -> Result<(), CursorError> {
        self.check_not_closed()?;
        self.position = Position::Before(0);
        self.current = None;
        return Ok(());
    }

    fn after_last(&mut self) -> Result<(), CursorError> {
        self.check_not_closed()?;
        self.position = Position::Before(self.entries.len());
        self.current = None;
        return Ok(());
    }

    fn first(&mut self) -> Result<bool, CursorError> {
        self.before_first()?;
        return self.next();
    }

    fn last(&mut self) -> Result<bool, CursorError> {
        self.after_last()?;
        return self.previous();
    }

    fn get(&self) -> Result<&IndexEntry<ParentIdAndRdn<ID>, ID>, CursorError>
    {
        self.check_not_closed()?;
        return self.current.as_ref().ok_or(CursorError::NotAvailable);
    }

    fn close(&mut self) -> Result<(), CursorError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.current = None;
        self.entries = Vec::new();
        return Ok(());
    }
}
