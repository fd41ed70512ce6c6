//! The routing table and the pieces it is built from.

use std::net::IpAddr;

pub mod bucket;
pub(crate) mod family;
pub mod node;
pub mod table;

/// Address family a routing table partition serves.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub enum IpVersion {
  V4,
  V6,
}

impl IpVersion {
  pub fn of(ip: &IpAddr) -> IpVersion {
    match ip {
      IpAddr::V4(_) => IpVersion::V4,
      IpAddr::V6(_) => IpVersion::V6,
    }
  }
}

impl std::fmt::Display for IpVersion {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::V4 => write!(f, "IPv4"),
      Self::V6 => write!(f, "IPv6"),
    }
  }
}
