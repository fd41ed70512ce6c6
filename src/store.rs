//! Sorted storage used by the routing table.
//!
//! An [`OrderedStore`] keeps its elements sorted by a comparator at all
//! times. The only way to put an element in is a sorted insertion, so there
//! is deliberately no `insert(index, ..)` or `set(index, ..)`.

use std::{cmp::Ordering, ops::Range, slice};

mod concurrent;

pub use self::concurrent::ConcurrentOrderedStore;

/// Ordering function of a store.
pub type Comparator<T> = fn(&T, &T) -> Ordering;

/// Result of a binary search in a store.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Position {
  /// An equal element lives at this index.
  Found(usize),
  /// No equal element, the probe would be inserted at this index.
  InsertAt(usize),
}

impl Position {
  /// The index regardless of whether the element was found.
  pub fn index(&self) -> usize {
    match *self {
      Position::Found(index) | Position::InsertAt(index) => index,
    }
  }

  pub fn is_found(&self) -> bool {
    matches!(self, Position::Found(_))
  }

  /// Index one past the last element not greater than the probe.
  ///
  /// Only meaningful for stores without duplicates.
  pub fn upper_bound(&self) -> usize {
    match *self {
      Position::Found(index) => index + 1,
      Position::InsertAt(index) => index,
    }
  }
}

/// Growable sequence kept sorted by a comparator.
#[derive(Clone)]
pub struct OrderedStore<T> {
  items: Vec<T>,
  cmp: Comparator<T>,
  allow_duplicates: bool,
}

impl<T> OrderedStore<T> {
  /// Create a store that refuses elements comparing equal to a stored one.
  pub fn new(cmp: Comparator<T>) -> Self {
    OrderedStore {
      items: Vec::new(),
      cmp,
      allow_duplicates: false,
    }
  }

  /// Create a store that keeps equal elements next to each other.
  pub fn with_duplicates(cmp: Comparator<T>) -> Self {
    OrderedStore {
      items: Vec::new(),
      cmp,
      allow_duplicates: true,
    }
  }

  pub fn allows_duplicates(&self) -> bool {
    self.allow_duplicates
  }

  /// Insert `element` at its sorted position, ahead of any equal elements.
  ///
  /// Returns false if an equal element exists and duplicates are refused.
  pub fn add(&mut self, element: T) -> bool {
    match self.index_of(&element) {
      Position::Found(_) if !self.allow_duplicates => false,
      Position::Found(_) => {
        let cmp = self.cmp;
        let index = self
          .items
          .partition_point(|e| cmp(e, &element) == Ordering::Less);
        self.items.insert(index, element);
        true
      }
      Position::InsertAt(index) => {
        self.items.insert(index, element);
        true
      }
    }
  }

  /// Add every element, returns true if the store changed.
  pub fn add_all<I: IntoIterator<Item = T>>(&mut self, elements: I) -> bool {
    elements
      .into_iter()
      .fold(false, |changed, element| self.add(element) | changed)
  }

  /// Position of `element`, or where it would be inserted.
  pub fn index_of(&self, element: &T) -> Position {
    let cmp = self.cmp;
    self.index_of_by(|probe| cmp(probe, element))
  }

  /// Binary search with a closure reporting how a stored element orders
  /// relative to the target.
  pub fn index_of_by<F>(&self, f: F) -> Position
  where
    F: FnMut(&T) -> Ordering,
  {
    match self.items.binary_search_by(f) {
      Ok(index) => Position::Found(index),
      Err(index) => Position::InsertAt(index),
    }
  }

  /// Stored element equal to `element`.
  pub fn get(&self, element: &T) -> Option<&T> {
    match self.index_of(element) {
      Position::Found(index) => self.items.get(index),
      Position::InsertAt(_) => None,
    }
  }

  pub fn get_by<F>(&self, f: F) -> Option<&T>
  where
    F: FnMut(&T) -> Ordering,
  {
    match self.index_of_by(f) {
      Position::Found(index) => self.items.get(index),
      Position::InsertAt(_) => None,
    }
  }

  /// Mutable access to a stored element.
  ///
  /// The caller must not change how the element orders.
  pub fn get_mut_by<F>(&mut self, f: F) -> Option<&mut T>
  where
    F: FnMut(&T) -> Ordering,
  {
    match self.index_of_by(f) {
      Position::Found(index) => self.items.get_mut(index),
      Position::InsertAt(_) => None,
    }
  }

  pub fn get_index(&self, index: usize) -> Option<&T> {
    self.items.get(index)
  }

  /// Elements in `range`, `None` if the range is out of bounds.
  pub fn sub_list(&self, range: Range<usize>) -> Option<&[T]> {
    self.items.get(range)
  }

  /// Remove one element equal to `element`.
  pub fn remove(&mut self, element: &T) -> Option<T> {
    match self.index_of(element) {
      Position::Found(index) => Some(self.items.remove(index)),
      Position::InsertAt(_) => None,
    }
  }

  /// Remove every element equal to one of `elements`, returns true if the
  /// store changed.
  pub fn remove_all<'a, I>(&mut self, elements: I) -> bool
  where
    I: IntoIterator<Item = &'a T>,
    T: 'a,
  {
    let mut changed = false;
    for element in elements {
      while self.remove(element).is_some() {
        changed = true;
      }
    }
    changed
  }

  pub fn clear(&mut self) {
    self.items.clear();
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> slice::Iter<'_, T> {
    self.items.iter()
  }

  pub fn as_slice(&self) -> &[T] {
    &self.items
  }

  pub fn to_vec(&self) -> Vec<T>
  where
    T: Clone,
  {
    self.items.clone()
  }
}

impl<'a, T> IntoIterator for &'a OrderedStore<T> {
  type Item = &'a T;
  type IntoIter = slice::Iter<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.items.iter()
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for OrderedStore<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OrderedStore")
      .field("items", &self.items)
      .field("allow_duplicates", &self.allow_duplicates)
      .finish()
  }
}
