use std::cmp::Ordering;
use std::time::Instant;

use crate::id::NodeId;

/// Maximum number of nodes a bucket holds.
pub const MAX_BUCKET_SIZE: usize = 8;

/// A bucket: the closed interval `[min, max]` of the key space together
/// with a count of the nodes that fall inside it.
///
/// The bucket does not hold the nodes, those live in the table's node store.
/// `count` is kept up to date incrementally and may briefly disagree with
/// the node store while other threads are inserting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRange {
  min: NodeId,
  max: NodeId,
  count: usize,
  capacity: usize,
  last_changed: Instant,
}

impl KeyRange {
  pub fn new(min: NodeId, max: NodeId) -> KeyRange {
    KeyRange::with_count(min, max, 0)
  }

  pub fn with_count(min: NodeId, max: NodeId, count: usize) -> KeyRange {
    KeyRange {
      min,
      max,
      count,
      capacity: MAX_BUCKET_SIZE,
      last_changed: Instant::now(),
    }
  }

  /// The bucket covering the whole key space.
  pub fn full_range() -> KeyRange {
    KeyRange::new(NodeId::MIN, NodeId::MAX)
  }

  pub fn min(&self) -> NodeId {
    self.min
  }

  pub fn max(&self) -> NodeId {
    self.max
  }

  pub fn set_min(&mut self, min: NodeId) {
    self.min = min;
    self.touch();
  }

  pub fn set_max(&mut self, max: NodeId) {
    self.max = max;
    self.touch();
  }

  pub fn count(&self) -> usize {
    self.count
  }

  /// Set the count, negative values clamp to zero.
  pub fn set_count(&mut self, count: i64) {
    self.count = usize::try_from(count).unwrap_or(0);
    self.touch();
  }

  pub fn increment_count(&mut self) {
    self.count = self.count.saturating_add(1);
    self.touch();
  }

  pub fn decrement_count(&mut self) {
    self.count = self.count.saturating_sub(1);
    self.touch();
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn last_changed(&self) -> Instant {
    self.last_changed
  }

  /// A racing insert can push the count past the capacity, which still
  /// counts as full.
  pub fn is_full(&self) -> bool {
    self.count >= self.capacity
  }

  /// `min <= key <= max`.
  pub fn is_in_range(&self, key: &NodeId) -> bool {
    self.min <= *key && *key <= self.max
  }

  /// Whether the range covers a single key.
  pub fn is_singleton(&self) -> bool {
    self.min == self.max
  }

  /// How this bucket orders relative to `key`: `Equal` if it contains it.
  ///
  /// Shaped for a binary search over a sorted partition.
  pub fn locate(&self, key: &NodeId) -> Ordering {
    if self.max < *key {
      Ordering::Less
    } else if self.min > *key {
      Ordering::Greater
    } else {
      Ordering::Equal
    }
  }

  /// Store ordering for buckets.
  ///
  /// A singleton range `[k, k]` equals any range containing `k`, otherwise
  /// ranges order by `min`. This turns a lookup with a singleton probe into
  /// a containment query.
  pub fn compare(a: &KeyRange, b: &KeyRange) -> Ordering {
    if b.is_singleton() && a.is_in_range(&b.min) {
      return Ordering::Equal;
    }
    if a.is_singleton() && b.is_in_range(&a.min) {
      return Ordering::Equal;
    }
    a.min.cmp(&b.min)
  }

  fn touch(&mut self) {
    self.last_changed = Instant::now();
  }
}
