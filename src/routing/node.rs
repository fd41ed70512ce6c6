use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use crate::id::NodeId;
use crate::routing::IpVersion;

/// Maximum wait period before a good node becomes questionable.
const MAX_LAST_SEEN_MINS: u64 = 15;

/// Status of the node.
///
/// Ordering of the enumeration is essential,
/// variants higher up are considered to be less
/// than those further down.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeStatus {
  Unknown,
  Questionable,
  Good,
}

/// Node participating in the dht.
///
/// Two nodes are equal when their ids are, the address of a node may change
/// over its lifetime (NAT rebinding).
#[derive(Clone, Eq)]
pub struct Node {
  /// Node id and its socket address.
  handle: NodeHandle,
  /// Status as last reported by the caller.
  status: NodeStatus,
  /// A timestamp recording the last status update.
  last_updated: Instant,
}

impl Node {
  pub fn new(id: NodeId, addr: SocketAddr, status: NodeStatus) -> Node {
    Node {
      handle: NodeHandle { id, addr },
      status,
      last_updated: Instant::now(),
    }
  }

  /// Create a node that has recently responded to us.
  pub fn as_good(id: NodeId, addr: SocketAddr) -> Node {
    Node::new(id, addr, NodeStatus::Good)
  }

  /// Create a node we have heard of but not heard from recently.
  pub fn as_questionable(id: NodeId, addr: SocketAddr) -> Node {
    Node::new(id, addr, NodeStatus::Questionable)
  }

  /// Create a node learned second hand, e.g. from a find_node response.
  pub fn as_unknown(id: NodeId, addr: SocketAddr) -> Node {
    Node::new(id, addr, NodeStatus::Unknown)
  }

  pub fn id(&self) -> NodeId {
    self.handle.id
  }

  pub fn addr(&self) -> SocketAddr {
    self.handle.addr
  }

  pub fn ip(&self) -> IpAddr {
    self.handle.addr.ip()
  }

  pub fn port(&self) -> u16 {
    self.handle.addr.port()
  }

  pub fn ip_version(&self) -> IpVersion {
    IpVersion::of(&self.handle.addr.ip())
  }

  pub fn handle(&self) -> &NodeHandle {
    &self.handle
  }

  /// Status as last reported.
  pub fn status(&self) -> NodeStatus {
    self.status
  }

  pub fn last_updated(&self) -> Instant {
    self.last_updated
  }

  /// Record a new status and refresh the timestamp.
  pub fn set_status(&mut self, status: NodeStatus) {
    self.status = status;
    self.last_updated = Instant::now();
  }

  /// Status taking inactivity into account.
  ///
  /// https://www.bittorrent.org/beps/bep_0005.html
  ///
  /// After 15 minutes of inactivity, a good node becomes questionable.
  pub fn effective_status(&self) -> NodeStatus {
    self.effective_status_at(Instant::now())
  }

  fn effective_status_at(&self, now: Instant) -> NodeStatus {
    let idle = now.saturating_duration_since(self.last_updated);

    match self.status {
      NodeStatus::Good
        if idle >= Duration::from_secs(MAX_LAST_SEEN_MINS * 60) =>
      {
        NodeStatus::Questionable
      }
      status => status,
    }
  }
}

impl PartialEq<Node> for Node {
  fn eq(&self, other: &Node) -> bool {
    self.handle.id == other.handle.id
  }
}

impl core::hash::Hash for Node {
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    self.handle.id.hash(state);
  }
}

impl std::fmt::Debug for Node {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Node")
      .field("id", &self.handle.id)
      .field("addr", &self.handle.addr)
      .field("status", &self.status)
      .field("last_updated", &self.last_updated)
      .finish()
  }
}

/// Node id + its socket address.
///
/// This is everything the compact node info encoding needs.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle {
  pub id: NodeId,
  pub addr: SocketAddr,
}

impl NodeHandle {
  pub fn new(id: NodeId, addr: SocketAddr) -> Self {
    Self { id, addr }
  }
}

impl fmt::Debug for NodeHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}@{:?}", self.id, self.addr)
  }
}
