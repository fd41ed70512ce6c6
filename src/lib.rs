//! Routing table of a BitTorrent Mainline DHT node (BEP-5).
//!
//! The table remembers which DHT nodes we know and answers "which nodes are
//! close to this key" for the message handlers. It keeps memory bounded by
//! partitioning the 160-bit key space into buckets of at most 8 nodes, and
//! only keeps splitting the buckets around our own id.
//!
//! The table is a passive structure shared between the threads handling
//! network traffic; every operation takes `&self`.

pub mod builder;
pub mod compact;
pub mod distance;
pub mod error;
pub mod id;
pub mod routing;
pub mod store;


pub use builder::RoutingTableBuilder;
pub use error::{DistanceError, IdError};
pub use id::{InfoHash, NodeId};
pub use routing::{
  bucket::KeyRange,
  node::{Node, NodeHandle, NodeStatus},
  table::{AddNodeOutcome, RoutingTable},
  IpVersion,
};
