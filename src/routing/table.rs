use std::net::{IpAddr, SocketAddr};

use crate::{builder::RoutingTableBuilder, id::NodeId};

use super::{
  bucket::KeyRange,
  family::FamilyTable,
  node::{Node, NodeStatus},
  IpVersion,
};

/// Default maximum number of nodes across both address families,
/// 160 buckets of 8 nodes per family.
pub const DEFAULT_MAX_NODES: usize = 2 * 160 * 8;

/// Default number of nodes returned by a closest nodes lookup.
pub const DEFAULT_CLOSEST_COUNT: usize = 16;

/// What happened to a node handed to [`RoutingTable::add_node`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddNodeOutcome {
  /// The node is now in the table.
  Added,
  /// A node with the same id is already known, nothing changed.
  AlreadyPresent,
  /// The table holds its maximum number of nodes.
  TableFull,
  /// The node's bucket is full and may not be split.
  BucketFull,
  /// Concurrent splits kept moving the node's bucket away.
  Contended,
}

impl AddNodeOutcome {
  pub fn is_added(&self) -> bool {
    *self == AddNodeOutcome::Added
  }
}

/// Routing table of a dual stack DHT node.
///
/// IPv4 and IPv6 nodes are kept apart, each family with its own nodes and
/// buckets. The maximum node count applies to both together.
///
/// All methods take `&self`; share the table between threads with an `Arc`.
pub struct RoutingTable {
  node_id: NodeId,
  max_nodes: usize,
  accept_all: bool,
  closest_count: usize,
  v4: FamilyTable,
  v6: FamilyTable,
}

impl RoutingTable {
  /// Create a routing table for `node_id` with default settings.
  pub fn new(node_id: NodeId) -> Self {
    RoutingTable::builder().set_node_id(node_id).build()
  }

  /// Create a new RoutingTableBuilder.
  pub fn builder() -> RoutingTableBuilder {
    RoutingTableBuilder::default()
  }

  pub(crate) fn with_builder(
    node_id: NodeId,
    max_nodes: usize,
    accept_all: bool,
    closest_count: usize,
  ) -> Self {
    RoutingTable {
      node_id,
      max_nodes,
      accept_all,
      closest_count,
      v4: FamilyTable::new(IpVersion::V4, node_id),
      v6: FamilyTable::new(IpVersion::V6, node_id),
    }
  }

  /// Our own node id.
  pub fn node_id(&self) -> NodeId {
    self.node_id
  }

  pub fn is_accept_all(&self) -> bool {
    self.accept_all
  }

  fn family(&self, ip_version: IpVersion) -> &FamilyTable {
    match ip_version {
      IpVersion::V4 => &self.v4,
      IpVersion::V6 => &self.v6,
    }
  }

  /// Add a node we learned about.
  ///
  /// Adding an id that is already known leaves the stored node untouched,
  /// use [`update_node_state`](Self::update_node_state) to change it.
  pub fn add_node(
    &self,
    id: NodeId,
    ip: IpAddr,
    port: u16,
    status: NodeStatus,
  ) -> AddNodeOutcome {
    self.insert(Node::new(id, SocketAddr::new(ip, port), status))
  }

  /// Same as [`add_node`](Self::add_node) for an already built node.
  pub fn insert(&self, node: Node) -> AddNodeOutcome {
    // Checked ahead of the insert, concurrent adds may overshoot slightly.
    if self.node_count() >= self.max_nodes {
      log::trace!("routing table full, dropping {:?}", node.id());
      return AddNodeOutcome::TableFull;
    }

    self.family(node.ip_version()).insert(node, self.accept_all)
  }

  pub fn find_exact_node(
    &self,
    id: &NodeId,
    ip_version: IpVersion,
  ) -> Option<Node> {
    self.family(ip_version).find_exact(id)
  }

  /// The configured number of nodes close to `id`, ascending by id.
  pub fn find_closest_nodes(
    &self,
    id: &NodeId,
    ip_version: IpVersion,
  ) -> Vec<Node> {
    self.find_closest_nodes_with_count(id, ip_version, self.closest_count)
  }

  pub fn find_closest_nodes_with_count(
    &self,
    id: &NodeId,
    ip_version: IpVersion,
    count: usize,
  ) -> Vec<Node> {
    self.family(ip_version).find_closest(id, count)
  }

  /// Set the status of a known node, false if there is no such node.
  pub fn update_node_state(
    &self,
    id: &NodeId,
    status: NodeStatus,
    ip_version: IpVersion,
  ) -> bool {
    self.family(ip_version).update_status(id, status)
  }

  pub fn total_node_count(&self, ip_version: IpVersion) -> usize {
    self.family(ip_version).len()
  }

  /// Nodes across both families.
  pub fn node_count(&self) -> usize {
    self.v4.len() + self.v6.len()
  }

  pub fn is_empty(&self) -> bool {
    self.v4.is_empty() && self.v6.is_empty()
  }

  pub fn max_node_count(&self) -> usize {
    self.max_nodes
  }

  pub fn good_node_count(&self, ip_version: IpVersion) -> usize {
    self.family(ip_version).count_with_status(NodeStatus::Good)
  }

  pub fn questionable_node_count(&self, ip_version: IpVersion) -> usize {
    self
      .family(ip_version)
      .count_with_status(NodeStatus::Questionable)
  }

  /// Snapshot of the nodes of one family, ascending by id.
  pub fn nodes(&self, ip_version: IpVersion) -> Vec<Node> {
    self.family(ip_version).nodes()
  }

  /// Snapshot of the buckets of one family, for diagnostics.
  pub fn buckets(&self, ip_version: IpVersion) -> Vec<KeyRange> {
    self.family(ip_version).buckets()
  }

  /// Forget every node of both families.
  ///
  /// The buckets go back to a single range over the whole key space, a
  /// stale partition with full counts would otherwise refuse new nodes.
  pub fn clear(&self) {
    log::info!("clearing routing table ({} nodes)", self.node_count());
    self.v4.clear();
    self.v6.clear();
  }
}

#[cfg(test)]
mod tests {
  use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

  use super::{
    AddNodeOutcome, RoutingTable, DEFAULT_CLOSEST_COUNT, DEFAULT_MAX_NODES,
  };
  use crate::{
    id::NodeId,
    routing::{node::NodeStatus, IpVersion},
    test,
  };
  use pretty_assertions::assert_eq;

  const V4: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
  const V6: IpAddr = IpAddr::V6(Ipv6Addr::LOCALHOST);

  #[test]
  fn positive_defaults() {
    let table = RoutingTable::new(test::dummy_node_id());

    assert_eq!(table.node_id(), test::dummy_node_id());
    assert_eq!(table.max_node_count(), DEFAULT_MAX_NODES);
    assert!(!table.is_accept_all());
  }

  #[test]
  fn positive_family_selected_by_address() {
    let table = RoutingTable::new(test::key(0));

    assert!(table
      .add_node(test::key(1), V4, 6881, NodeStatus::Good)
      .is_added());
    assert!(table
      .add_node(test::key(2), V6, 6881, NodeStatus::Good)
      .is_added());

    assert_eq!(table.total_node_count(IpVersion::V4), 1);
    assert_eq!(table.total_node_count(IpVersion::V6), 1);
    assert!(table.find_exact_node(&test::key(1), IpVersion::V4).is_some());
    assert!(table.find_exact_node(&test::key(1), IpVersion::V6).is_none());
    assert!(table.find_exact_node(&test::key(2), IpVersion::V6).is_some());
  }

  #[test]
  fn positive_same_id_in_both_families() {
    let table = RoutingTable::new(test::key(0));

    assert!(table.add_node(test::key(5), V4, 1, NodeStatus::Good).is_added());
    assert!(table.add_node(test::key(5), V6, 1, NodeStatus::Good).is_added());
    assert_eq!(table.node_count(), 2);
  }

  #[test]
  fn positive_node_keeps_address_and_port() {
    let table = RoutingTable::new(test::key(0));
    table.add_node(test::key(7), V4, 51413, NodeStatus::Unknown);

    let node = table.find_exact_node(&test::key(7), IpVersion::V4).unwrap();

    assert_eq!(node.ip(), V4);
    assert_eq!(node.port(), 51413);
    assert_eq!(node.status(), NodeStatus::Unknown);
  }

  #[test]
  fn positive_duplicate_does_not_change_count() {
    let table = RoutingTable::new(test::key(0));

    assert_eq!(
      table.add_node(test::key(3), V4, 1, NodeStatus::Good),
      AddNodeOutcome::Added
    );
    assert_eq!(
      table.add_node(test::key(3), V4, 2, NodeStatus::Unknown),
      AddNodeOutcome::AlreadyPresent
    );

    assert_eq!(table.total_node_count(IpVersion::V4), 1);
  }

  #[test]
  fn negative_global_cap_spans_families() {
    let table = RoutingTable::builder()
      .set_node_id(test::key(0))
      .set_max_node_count(10)
      .set_accept_all(true)
      .build();

    for n in 0..6 {
      assert!(table.add_node(test::key(n), V4, 1, NodeStatus::Good).is_added());
    }
    for n in 0..4 {
      assert!(table.add_node(test::key(n), V6, 1, NodeStatus::Good).is_added());
    }

    assert_eq!(
      table.add_node(test::key(100), V6, 1, NodeStatus::Good),
      AddNodeOutcome::TableFull
    );
    assert_eq!(table.node_count(), table.max_node_count());
  }

  #[test]
  fn positive_outcomes_are_distinguishable() {
    let table = RoutingTable::builder()
      .set_node_id(test::key(0))
      .set_max_node_count(20)
      .build();
    let far = NodeId::MAX;
    let last_bit = crate::id::ID_BITS - 1;

    // Fill the low half and push one node into the (distant) high half.
    for n in 0..8 {
      table.add_node(test::key(n), V4, 1, NodeStatus::Good);
    }
    assert_eq!(
      table.add_node(far, V4, 1, NodeStatus::Good),
      AddNodeOutcome::Added
    );
    assert_eq!(
      table.add_node(far, V4, 1, NodeStatus::Good),
      AddNodeOutcome::AlreadyPresent
    );

    // The high half does not contain our id, once full it refuses.
    for bit in 1..8 {
      let id = far.flip_bit(last_bit - bit);
      assert_eq!(
        table.add_node(id, V4, 1, NodeStatus::Good),
        AddNodeOutcome::Added
      );
    }
    assert_eq!(
      table.add_node(far.flip_bit(last_bit - 8), V4, 1, NodeStatus::Good),
      AddNodeOutcome::BucketFull
    );

    // Our own neighbourhood keeps splitting until the global cap.
    for n in 100..104 {
      assert_eq!(
        table.add_node(test::key(n), V4, 1, NodeStatus::Good),
        AddNodeOutcome::Added
      );
    }
    assert_eq!(
      table.add_node(test::key(104), V4, 1, NodeStatus::Good),
      AddNodeOutcome::TableFull
    );
  }

  #[test]
  fn positive_update_node_state() {
    let table = RoutingTable::new(test::key(0));
    table.add_node(test::key(9), V6, 1, NodeStatus::Unknown);

    let id = test::key(9);
    assert!(table.update_node_state(&id, NodeStatus::Good, IpVersion::V6));
    assert!(!table.update_node_state(&id, NodeStatus::Good, IpVersion::V4));

    assert_eq!(table.good_node_count(IpVersion::V6), 1);
    assert_eq!(table.questionable_node_count(IpVersion::V6), 0);
  }

  #[test]
  fn positive_default_closest_count() {
    let table = RoutingTable::builder()
      .set_node_id(test::key(0))
      .set_accept_all(true)
      .build();

    for n in 0..40 {
      table.add_node(test::key(n), V4, 1, NodeStatus::Good);
    }

    let closest = table.find_closest_nodes(&test::key(20), IpVersion::V4);
    assert_eq!(closest.len(), DEFAULT_CLOSEST_COUNT);
    assert!(closest.iter().any(|n| n.id() == test::key(20)));
    assert!(closest.windows(2).all(|w| w[0].id() < w[1].id()));
  }

  #[test]
  fn positive_clear_both_families() {
    let table = RoutingTable::new(test::key(0));
    table.add_node(test::key(1), V4, 1, NodeStatus::Good);
    table.add_node(test::key(1), V6, 1, NodeStatus::Good);

    table.clear();

    assert!(table.is_empty());
    assert_eq!(table.node_count(), 0);
    assert_eq!(table.buckets(IpVersion::V4).len(), 1);
    assert_eq!(table.buckets(IpVersion::V6).len(), 1);
  }
}
