//! VersionedList - Shared list with a structural version stamp.
//!
//! Every structural mutation bumps a `u64` version. A consumer that
//! remembers `(list handle, version)` can tell whether the list changed since
//! it last looked without diffing items; the list-template binding relies on
//! exactly that.
//!
//! The list is a cheap-to-clone handle. Handle identity ([`ptr_eq`]) is the
//! list identity: two handles are "the same list" when they share storage.
//!
//! [`ptr_eq`]: VersionedList::ptr_eq

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};

struct ListState<T> {
    items: Vec<T>,
    version: u64,
}

/// Ordered, shared, version-stamped list.
pub struct VersionedList<T> {
    state: Rc<RefCell<ListState<T>>>,
}

impl<T> Clone for VersionedList<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Default for VersionedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for VersionedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("VersionedList")
            .field("version", &state.version)
            .field("items", &state.items)
            .finish()
    }
}

impl<T> FromIterator<T> for VersionedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T> VersionedList<T> {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Wrap existing items. The version starts at 0.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            state: Rc::new(RefCell::new(ListState { items, version: 0 })),
        }
    }

    /// True when both handles point at the same list.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn version(&self) -> u64 {
        self.state.borrow().version
    }

    pub fn count(&self) -> usize {
        self.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().items.is_empty()
    }

    /// Read-only view of the items.
    ///
    /// # Panics
    ///
    /// Mutating the list while the returned guard is alive panics.
    pub fn items(&self) -> Ref<'_, [T]> {
        Ref::map(self.state.borrow(), |state| state.items.as_slice())
    }

    /// Append `item`.
    pub fn add(&self, item: T) {
        let mut state = self.state.borrow_mut();
        state.items.push(item);
        state.version += 1;
    }

    /// Remove the item at `index`.
    pub fn delete(&self, index: usize) -> Result<T> {
        let mut state = self.state.borrow_mut();
        let len = state.items.len();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
        let item = state.items.remove(index);
        state.version += 1;
        Ok(item)
    }

    /// Remove every item. Bumps the version even when already empty.
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.items.clear();
        state.version += 1;
    }

    /// Run `action` on every item in order.
    ///
    /// # Panics
    ///
    /// `action` must not mutate this list.
    pub fn for_each(&self, mut action: impl FnMut(&T)) {
        self.state.borrow().items.iter().for_each(|item| action(item));
    }

    /// Position of the first item matching `predicate`.
    pub fn position(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.state.borrow().items.iter().position(predicate)
    }

    /// Remove and return the first item matching `predicate`. The version is
    /// untouched when nothing matches.
    pub fn remove_where(&self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.position(predicate)?;
        let mut state = self.state.borrow_mut();
        state.version += 1;
        Some(state.items.remove(index))
    }
}

impl<U: ?Sized> VersionedList<Rc<U>> {
    /// Remove the exact instance `item` (pointer identity), even when equal
    /// values sit before it.
    pub fn remove_ptr(&self, item: &Rc<U>) -> bool {
        self.remove_where(|candidate| Rc::ptr_eq(candidate, item)).is_some()
    }
}

impl<T: Clone> VersionedList<T> {
    pub fn get_item(&self, index: usize) -> Result<T> {
        let state = self.state.borrow();
        state.items.get(index).cloned().ok_or(Error::IndexOutOfRange {
            index,
            len: state.items.len(),
        })
    }

    /// Items matching `predicate`, in order.
    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        self.state
            .borrow()
            .items
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    /// Owned copy of the current items.
    pub fn snapshot(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }
}

impl<T: PartialEq> VersionedList<T> {
    /// Position of the first item equal to `item`, scanning from
    /// `from_index`. A negative `from_index` counts back from the end and is
    /// clamped to 0.
    pub fn index_of(&self, item: &T, from_index: isize) -> Option<usize> {
        let state = self.state.borrow();
        let len = state.items.len();
        let start = if from_index < 0 {
            len.saturating_sub(from_index.unsigned_abs())
        } else {
            from_index as usize
        };

        state
            .items
            .iter()
            .enumerate()
            .skip(start)
            .find_map(|(i, candidate)| (candidate == item).then_some(i))
    }

    pub fn contains(&self, item: &T) -> bool {
        self.index_of(item, 0).is_some()
    }

    /// Remove the first item equal to `item`. Returns `false`, without
    /// touching the version, when no such item exists.
    pub fn remove(&self, item: &T) -> bool {
        let Some(index) = self.index_of(item, 0) else {
            return false;
        };
        let mut state = self.state.borrow_mut();
        state.items.remove(index);
        state.version += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_bumps_once_per_mutation() {
        let list = VersionedList::new();
        assert_eq!(list.version(), 0);

        list.add("a");
        list.add("b");
        assert_eq!(list.version(), 2);

        assert!(list.remove(&"a"));
        assert_eq!(list.version(), 3);

        assert_eq!(list.delete(0), Ok("b"));
        assert_eq!(list.version(), 4);

        list.clear();
        assert_eq!(list.version(), 5);
        list.clear();
        assert_eq!(list.version(), 6);
    }

    #[test]
    fn test_reads_do_not_bump() {
        let list: VersionedList<i32> = [1, 2, 3].into_iter().collect();
        let before = list.version();

        let _ = list.count();
        let _ = list.get_item(1);
        let _ = list.filter(|n| n % 2 == 1);
        let _ = list.index_of(&2, 0);
        let _ = list.items().len();
        list.for_each(|_| {});

        assert_eq!(list.version(), before);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let list = VersionedList::from_vec(vec![1, 2]);
        assert!(!list.remove(&9));
        assert_eq!(list.version(), 0);
        assert_eq!(list.count(), 2);
    }

    #[test]
    fn test_remove_first_duplicate() {
        let list = VersionedList::from_vec(vec![1, 2, 1]);
        assert!(list.remove(&1));
        assert_eq!(&*list.items(), &[2, 1]);
    }

    #[test]
    fn test_out_of_range_access() {
        let list = VersionedList::from_vec(vec!['x']);
        assert_eq!(
            list.get_item(3),
            Err(Error::IndexOutOfRange { index: 3, len: 1 })
        );
        assert_eq!(
            list.delete(1),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(list.version(), 0, "failed delete must not bump the version");
    }

    #[test]
    fn test_index_of_from_index() {
        let list = VersionedList::from_vec(vec![5, 6, 5, 7]);
        assert_eq!(list.index_of(&5, 0), Some(0));
        assert_eq!(list.index_of(&5, 1), Some(2));
        assert_eq!(list.index_of(&5, 3), None);
        assert_eq!(list.index_of(&5, -2), Some(2));
        assert_eq!(list.index_of(&5, -100), Some(0));
        assert_eq!(list.index_of(&8, 0), None);
        assert_eq!(list.index_of(&5, 10), None);
    }

    #[test]
    fn test_remove_where_and_position() {
        let list = VersionedList::from_vec(vec![3, 8, 9]);
        assert_eq!(list.position(|n| n % 2 == 0), Some(1));

        assert_eq!(list.remove_where(|n| *n > 5), Some(8));
        assert_eq!(list.version(), 1);
        assert_eq!(list.remove_where(|n| *n > 100), None);
        assert_eq!(list.version(), 1);
        assert_eq!(list.snapshot(), vec![3, 9]);
    }

    #[test]
    fn test_remove_ptr_picks_exact_instance() {
        let first = Rc::new("same".to_owned());
        let second = Rc::new("same".to_owned());
        let list = VersionedList::from_vec(vec![first.clone(), second.clone()]);

        assert!(list.remove_ptr(&second));
        assert_eq!(list.count(), 1);
        assert!(Rc::ptr_eq(&list.items()[0], &first));

        assert!(!list.remove_ptr(&second));
        assert_eq!(list.version(), 1);
    }

    #[test]
    fn test_handles_share_identity() {
        let list = VersionedList::from_vec(vec![1]);
        let alias = list.clone();
        let other = VersionedList::from_vec(vec![1]);

        alias.add(2);
        assert_eq!(list.count(), 2);
        assert!(list.ptr_eq(&alias));
        assert!(!list.ptr_eq(&other));
    }
}
