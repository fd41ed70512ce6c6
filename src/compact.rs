//! Compact node info, the BEP-5 binary form of a node:
//! 20-byte id, 4 or 16 byte ip, 2-byte big-endian port.
//!
//! The message codec embeds these lists in `find_node` / `get_peers`
//! responses through the `nodes_v4` / `nodes_v6` serde helpers. A list
//! only ever carries nodes of one address family.

use std::net::{IpAddr, SocketAddr};

use crate::{
  id::{NodeId, NODE_ID_LEN},
  routing::{node::NodeHandle, IpVersion},
};

const PORT_LEN: usize = 2;

pub const NODE_V4_LEN: usize = NODE_ID_LEN + 4 + PORT_LEN;
pub const NODE_V6_LEN: usize = NODE_ID_LEN + 16 + PORT_LEN;

/// Length of one compact node of the given family.
pub fn node_len(ip_version: IpVersion) -> usize {
  match ip_version {
    IpVersion::V4 => NODE_V4_LEN,
    IpVersion::V6 => NODE_V6_LEN,
  }
}

/// Append the compact form of `node` to `buffer`.
pub fn encode_node(node: &NodeHandle, buffer: &mut Vec<u8>) {
  buffer.extend_from_slice(node.id.as_bytes());
  match node.addr.ip() {
    IpAddr::V4(ip) => buffer.extend_from_slice(&ip.octets()),
    IpAddr::V6(ip) => buffer.extend_from_slice(&ip.octets()),
  }
  buffer.extend_from_slice(&node.addr.port().to_be_bytes());
}

/// Decode one compact node, `src` must be exactly one entry long.
pub fn decode_node(src: &[u8]) -> Option<NodeHandle> {
  if src.len() < NODE_ID_LEN + PORT_LEN {
    return None;
  }
  let (id, rest) = src.split_at(NODE_ID_LEN);
  let (ip, port) = rest.split_at(rest.len() - PORT_LEN);

  let ip = match ip.len() {
    4 => IpAddr::from(<[u8; 4]>::try_from(ip).ok()?),
    16 => IpAddr::from(<[u8; 16]>::try_from(ip).ok()?),
    _ => return None,
  };
  let port = u16::from_be_bytes(port.try_into().ok()?);

  Some(NodeHandle {
    id: NodeId::try_from(id).ok()?,
    addr: SocketAddr::new(ip, port),
  })
}

/// Encode a list of nodes that must all belong to `ip_version`.
fn encode_family(
  nodes: &[NodeHandle],
  ip_version: IpVersion,
) -> Result<Vec<u8>, NodeHandle> {
  let mut buffer = Vec::with_capacity(nodes.len() * node_len(ip_version));
  for node in nodes {
    if IpVersion::of(&node.addr.ip()) != ip_version {
      return Err(*node);
    }
    encode_node(node, &mut buffer);
  }
  Ok(buffer)
}

/// Decode a concatenation of compact nodes of one family.
fn decode_family(src: &[u8], ip_version: IpVersion) -> Option<Vec<NodeHandle>> {
  let chunks = src.chunks_exact(node_len(ip_version));
  if !chunks.remainder().is_empty() {
    return None;
  }
  chunks.map(decode_node).collect()
}

mod family {
  use serde::{de, ser, Deserialize, Deserializer, Serializer};
  use serde_bytes::ByteBuf;

  use crate::routing::{node::NodeHandle, IpVersion};

  pub fn serialize<S: Serializer>(
    nodes: &[NodeHandle],
    ip_version: IpVersion,
    s: S,
  ) -> Result<S::Ok, S::Error> {
    match super::encode_family(nodes, ip_version) {
      Ok(buffer) => s.serialize_bytes(&buffer),
      Err(node) => Err(<S::Error as ser::Error>::custom(format!(
        "{} node {} in an {} node list",
        IpVersion::of(&node.addr.ip()),
        node.addr,
        ip_version
      ))),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    d: D,
    ip_version: IpVersion,
  ) -> Result<Vec<NodeHandle>, D::Error> {
    let buffer = ByteBuf::deserialize(d)?;
    super::decode_family(&buffer, ip_version).ok_or_else(|| {
      let len = super::node_len(ip_version);
      let expected = format!("a multiple of {} bytes", len);
      <D::Error as de::Error>::invalid_length(buffer.len(), &expected.as_str())
    })
  }
}

/// `#[serde(with = "nodes_v4")]` for a `Vec<NodeHandle>` of IPv4 nodes.
pub mod nodes_v4 {
  use serde::{Deserializer, Serializer};

  use crate::routing::{node::NodeHandle, IpVersion};

  pub fn serialize<S: Serializer>(
    nodes: &[NodeHandle],
    s: S,
  ) -> Result<S::Ok, S::Error> {
    super::family::serialize(nodes, IpVersion::V4, s)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<Vec<NodeHandle>, D::Error> {
    super::family::deserialize(d, IpVersion::V4)
  }
}

/// `#[serde(with = "nodes_v6")]` for a `Vec<NodeHandle>` of IPv6 nodes.
pub mod nodes_v6 {
  use serde::{Deserializer, Serializer};

  use crate::routing::{node::NodeHandle, IpVersion};

  pub fn serialize<S: Serializer>(
    nodes: &[NodeHandle],
    s: S,
  ) -> Result<S::Ok, S::Error> {
    super::family::serialize(nodes, IpVersion::V6, s)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<Vec<NodeHandle>, D::Error> {
    super::family::deserialize(d, IpVersion::V6)
  }
}
