use std::{cmp::Ordering, ops::Range};

use parking_lot::{RwLock, RwLockReadGuard};

use super::{Comparator, OrderedStore, Position};

/// An [`OrderedStore`] behind a reader/writer lock.
///
/// Mutations take the lock exclusively, lookups share it. Every method is a
/// single critical section; nothing here makes two calls atomic together.
pub struct ConcurrentOrderedStore<T> {
  inner: RwLock<OrderedStore<T>>,
}

impl<T> ConcurrentOrderedStore<T> {
  pub fn new(cmp: Comparator<T>) -> Self {
    ConcurrentOrderedStore {
      inner: RwLock::new(OrderedStore::new(cmp)),
    }
  }

  pub fn with_duplicates(cmp: Comparator<T>) -> Self {
    ConcurrentOrderedStore {
      inner: RwLock::new(OrderedStore::with_duplicates(cmp)),
    }
  }

  // -------------------------- //
  // exclusive

  pub fn add(&self, element: T) -> bool {
    self.inner.write().add(element)
  }

  /// Add `element` if `condition` holds for the current content, both in
  /// one critical section.
  pub fn add_if<C>(&self, element: T, condition: C) -> bool
  where
    C: FnOnce(&OrderedStore<T>) -> bool,
  {
    let mut store = self.inner.write();
    condition(&store) && store.add(element)
  }

  pub fn add_all<I: IntoIterator<Item = T>>(&self, elements: I) -> bool {
    self.inner.write().add_all(elements)
  }

  pub fn remove(&self, element: &T) -> Option<T> {
    self.inner.write().remove(element)
  }

  pub fn remove_all<'a, I>(&self, elements: I) -> bool
  where
    I: IntoIterator<Item = &'a T>,
    T: 'a,
  {
    self.inner.write().remove_all(elements)
  }

  pub fn clear(&self) {
    self.inner.write().clear();
  }

  /// Replace the whole content, in one critical section.
  pub fn reset<I: IntoIterator<Item = T>>(&self, elements: I) {
    let mut store = self.inner.write();
    store.clear();
    store.add_all(elements);
  }

  /// Run `update` on the element located by `f`.
  ///
  /// `update` must not change how the element orders.
  pub fn update_by<F, U, R>(&self, f: F, update: U) -> Option<R>
  where
    F: FnMut(&T) -> Ordering,
    U: FnOnce(&mut T) -> R,
  {
    self.inner.write().get_mut_by(f).map(update)
  }

  // -------------------------- //
  // shared

  pub fn index_of(&self, element: &T) -> Position {
    self.inner.read().index_of(element)
  }

  pub fn index_of_by<F>(&self, f: F) -> Position
  where
    F: FnMut(&T) -> Ordering,
  {
    self.inner.read().index_of_by(f)
  }

  pub fn get(&self, element: &T) -> Option<T>
  where
    T: Clone,
  {
    self.inner.read().get(element).cloned()
  }

  pub fn get_by<F>(&self, f: F) -> Option<T>
  where
    F: FnMut(&T) -> Ordering,
    T: Clone,
  {
    self.inner.read().get_by(f).cloned()
  }

  pub fn get_index(&self, index: usize) -> Option<T>
  where
    T: Clone,
  {
    self.inner.read().get_index(index).cloned()
  }

  pub fn sub_list(&self, range: Range<usize>) -> Option<Vec<T>>
  where
    T: Clone,
  {
    self.inner.read().sub_list(range).map(<[T]>::to_vec)
  }

  pub fn len(&self) -> usize {
    self.inner.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.read().is_empty()
  }

  /// Snapshot of every element, in order.
  pub fn to_vec(&self) -> Vec<T>
  where
    T: Clone,
  {
    self.inner.read().to_vec()
  }

  /// Hold the shared lock for several reads, e.g. to iterate.
  pub fn read(&self) -> RwLockReadGuard<'_, OrderedStore<T>> {
    self.inner.read()
  }
}
