//! One address family's share of the routing table.
//!
//! A [`FamilyTable`] owns two independently locked stores: the nodes, sorted
//! by id, and the buckets, a sorted partition of the key space. Operations
//! that touch both (insertion, split) enter the two critical sections one
//! after the other, so a reader may briefly see a bucket that was just shrunk
//! without its new sibling. Insertion treats a missing bucket as a split in
//! flight and looks again.

use std::cmp::Ordering;

use crate::{
  id::{NodeId, ID_BITS},
  store::ConcurrentOrderedStore,
};

use super::{
  bucket::KeyRange,
  node::{Node, NodeStatus},
  table::AddNodeOutcome,
  IpVersion,
};

/// Upper bound on bucket lookups for a single insertion. Every retry follows
/// a split, which halves the bucket, or another thread's split in progress.
const MAX_INSERT_ATTEMPTS: usize = 2 * ID_BITS;

fn by_id(a: &Node, b: &Node) -> Ordering {
  a.id().cmp(&b.id())
}

pub(crate) struct FamilyTable {
  ip_version: IpVersion,
  node_id: NodeId,
  nodes: ConcurrentOrderedStore<Node>,
  buckets: ConcurrentOrderedStore<KeyRange>,
}

impl FamilyTable {
  pub fn new(ip_version: IpVersion, node_id: NodeId) -> Self {
    let buckets = ConcurrentOrderedStore::new(KeyRange::compare);
    buckets.add(KeyRange::full_range());

    FamilyTable {
      ip_version,
      node_id,
      nodes: ConcurrentOrderedStore::new(by_id),
      buckets,
    }
  }

  /// Insert `node`, splitting buckets on the way if allowed.
  ///
  /// Full buckets split when they contain our own id, or always if
  /// `accept_all` is set. Anything else landing in a full bucket is dropped.
  pub(crate) fn insert(&self, node: Node, accept_all: bool) -> AddNodeOutcome {
    let id = node.id();

    for _ in 0..MAX_INSERT_ATTEMPTS {
      let bucket = match self.buckets.get_by(|b| b.locate(&id)) {
        Some(bucket) => bucket,
        None => {
          std::thread::yield_now();
          continue;
        }
      };

      if !bucket.is_full() {
        if !self.nodes.add(node) {
          return AddNodeOutcome::AlreadyPresent;
        }

        if self
          .buckets
          .update_by(|b| b.locate(&id), KeyRange::increment_count)
          .is_none()
        {
          log::trace!(
            "{}: bucket for {:?} moved during insert",
            self.ip_version,
            id
          );
        }

        return AddNodeOutcome::Added;
      }

      if self.nodes.index_of_by(|n| n.id().cmp(&id)).is_found() {
        return AddNodeOutcome::AlreadyPresent;
      }

      let splittable = !bucket.is_singleton()
        && (accept_all || bucket.is_in_range(&self.node_id));

      if !splittable {
        log::trace!(
          "{}: bucket [{:?}, {:?}] full, dropping {:?}",
          self.ip_version,
          bucket.min(),
          bucket.max(),
          id
        );
        return AddNodeOutcome::BucketFull;
      }

      self.split(&bucket);
    }

    log::debug!("{}: gave up inserting {:?}", self.ip_version, id);
    AddNodeOutcome::Contended
  }

  /// Split `bucket` in two halves.
  ///
  /// Returns false if another thread changed the bucket first.
  fn split(&self, bucket: &KeyRange) -> bool {
    let (min, max) = (bucket.min(), bucket.max());
    let mid = min.midpoint(&max);
    let upper_min = match mid.checked_increment() {
      Some(id) => id,
      None => return false,
    };

    let (lower_count, upper_count) = {
      let nodes = self.nodes.read();
      let lower_start = nodes.index_of_by(|n| n.id().cmp(&min)).index();
      let lower_end = nodes.index_of_by(|n| n.id().cmp(&mid)).upper_bound();
      let upper_end = nodes.index_of_by(|n| n.id().cmp(&max)).upper_bound();

      (
        lower_end.saturating_sub(lower_start),
        upper_end.saturating_sub(lower_end),
      )
    };

    let shrunk = self
      .buckets
      .update_by(
        |b| b.locate(&min),
        |b| {
          if b.min() != min || b.max() != max {
            return false;
          }
          b.set_max(mid);
          b.set_count(lower_count as i64);
          true
        },
      )
      .unwrap_or(false);

    if !shrunk {
      return false;
    }

    let sibling = KeyRange::with_count(upper_min, max, upper_count);
    if !self.add_sibling(mid, sibling) {
      log::debug!(
        "{}: buckets changed while splitting at {:?}, dropping [{:?}, {:?}]",
        self.ip_version,
        mid,
        upper_min,
        max
      );
      return false;
    }

    log::debug!(
      "{}: split bucket at {:?} ({} / {} nodes)",
      self.ip_version,
      mid,
      lower_count,
      upper_count
    );

    true
  }

  /// Add the upper half of a split, unless the buckets changed since the
  /// lower half was shrunk.
  ///
  /// The upper half's keys must be uncovered and the bucket just below them
  /// must still end where the lower half ends. A `clear` in between puts a
  /// full-range bucket over those keys and the sibling is dropped. A split of
  /// the lower half in between keeps its upper end, the sibling goes in.
  fn add_sibling(&self, lower_max: NodeId, sibling: KeyRange) -> bool {
    let upper_min = sibling.min();

    self.buckets.add_if(sibling, |buckets| {
      let uncovered = buckets.get_by(|b| b.locate(&upper_min)).is_none();
      let below_ends = buckets
        .get_by(|b| b.locate(&lower_max))
        .map_or(false, |b| b.max() == lower_max);

      uncovered && below_ends
    })
  }

  /// Node with exactly `id`.
  pub fn find_exact(&self, id: &NodeId) -> Option<Node> {
    self
      .nodes
      .get_by(|n| n.id().cmp(id))
      .filter(|n| n.id() == *id)
  }

  /// Up to `count` nodes close to `id`, ascending by id.
  ///
  /// Walks outwards from where `id` would sit in the sorted node store,
  /// always taking the neighbour with the smaller xor distance. Sorting by id
  /// keeps xor-close nodes mostly adjacent, so this avoids sorting the whole
  /// table by distance at the price of exactness.
  pub fn find_closest(&self, id: &NodeId, count: usize) -> Vec<Node> {
    let nodes = self.nodes.read();
    let len = nodes.len();
    if count == 0 || len == 0 {
      return Vec::new();
    }

    let position = nodes.index_of_by(|n| n.id().cmp(id)).index();
    let distance_at =
      |index: usize| nodes.get_index(index).map(|n| id.distance(&n.id()));

    // `low` is the next candidate below the window, `high` the next above.
    let mut low = position.checked_sub(1);
    let mut high = position;
    let mut start = position;

    while high - start < count {
      let low_distance = low.and_then(distance_at);
      let high_distance = distance_at(high);

      let take_low = match (low_distance, high_distance) {
        (None, None) => break,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (Some(l), Some(h)) => l < h,
      };

      if take_low {
        // `low` is `Some` whenever its distance is.
        if let Some(index) = low {
          start = index;
          low = index.checked_sub(1);
        }
      } else {
        high += 1;
      }
    }

    nodes
      .sub_list(start..high)
      .map(<[Node]>::to_vec)
      .unwrap_or_default()
  }

  pub fn update_status(&self, id: &NodeId, status: NodeStatus) -> bool {
    self
      .nodes
      .update_by(|n| n.id().cmp(id), |n| n.set_status(status))
      .is_some()
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Number of nodes whose effective status is `status`.
  pub fn count_with_status(&self, status: NodeStatus) -> usize {
    self
      .nodes
      .read()
      .iter()
      .filter(|n| n.effective_status() == status)
      .count()
  }

  /// Snapshot of all nodes, ascending by id.
  pub fn nodes(&self) -> Vec<Node> {
    self.nodes.to_vec()
  }

  /// Snapshot of the buckets, ascending by range.
  pub fn buckets(&self) -> Vec<KeyRange> {
    self.buckets.to_vec()
  }

  /// Drop every node and go back to a single bucket.
  pub fn clear(&self) {
    self.nodes.clear();
    self.buckets.reset([KeyRange::full_range()]);
  }
}
