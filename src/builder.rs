use crate::{
  id::NodeId,
  routing::table::{RoutingTable, DEFAULT_CLOSEST_COUNT, DEFAULT_MAX_NODES},
};

/// Stores information for initializing a routing table.
#[derive(Debug, Clone)]
pub struct RoutingTableBuilder {
  node_id: Option<NodeId>,
  max_node_count: usize,
  accept_all: bool,
  closest_count: usize,
}

impl Default for RoutingTableBuilder {
  fn default() -> Self {
    RoutingTableBuilder {
      node_id: None,
      max_node_count: DEFAULT_MAX_NODES,
      accept_all: false,
      closest_count: DEFAULT_CLOSEST_COUNT,
    }
  }
}

impl RoutingTableBuilder {
  /// Set the id of this node. If not provided, a random node id is generated.
  ///
  /// NOTE: a dual stack node should use the same id for IPv4 and IPv6,
  /// which one table does.
  pub fn set_node_id(mut self, id: NodeId) -> RoutingTableBuilder {
    self.node_id = Some(id);
    self
  }

  /// Maximum number of nodes kept, IPv4 and IPv6 together.
  pub fn set_max_node_count(mut self, count: usize) -> RoutingTableBuilder {
    self.max_node_count = count;
    self
  }

  /// Split any full bucket instead of only the one holding our own id.
  ///
  /// Useful for crawlers and bootstrap routers that want to know as many
  /// nodes as possible. Defaults to false.
  pub fn set_accept_all(mut self, accept_all: bool) -> RoutingTableBuilder {
    self.accept_all = accept_all;
    self
  }

  /// Number of nodes returned by
  /// [`RoutingTable::find_closest_nodes`].
  pub fn set_closest_count(mut self, count: usize) -> RoutingTableBuilder {
    self.closest_count = count;
    self
  }

  pub fn build(self) -> RoutingTable {
    let node_id = self.node_id.unwrap_or_else(rand::random);

    log::debug!(
      "routing table for {:?} (max {} nodes, accept all: {})",
      node_id,
      self.max_node_count,
      self.accept_all
    );

    RoutingTable::with_builder(
      node_id,
      self.max_node_count,
      self.accept_all,
      self.closest_count,
    )
  }
}
