//! 160-bit identifiers shared by nodes and content.
//!
//! An [`Id`] is compared as an unsigned big-endian integer. No native integer
//! is wide enough, so the little arithmetic the routing table needs
//! (midpoint, increment, xor) is done directly on the bytes.

use std::{fmt, str::FromStr};

use rand::{
  distributions::{Distribution, Standard},
  Rng,
};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::IdError;

pub const ID_LEN: usize = 20;
pub const NODE_ID_LEN: usize = ID_LEN;
pub const INFO_HASH_LEN: usize = ID_LEN;

/// Number of bits in an id.
pub const ID_BITS: usize = ID_LEN * 8;

#[derive(
  Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Id(#[serde(with = "byte_array")] [u8; ID_LEN]);

pub type NodeId = Id;
pub type InfoHash = Id;

impl Id {
  /// The smallest id, `0`.
  pub const MIN: Id = Id([0u8; ID_LEN]);
  /// The largest id, `2^160 - 1`.
  pub const MAX: Id = Id([0xffu8; ID_LEN]);

  /// Hash arbitrary data into an id, the way info hashes are derived.
  pub fn sha1(data: &[u8]) -> Self {
    let digest: [u8; ID_LEN] = Sha1::digest(data).into();
    Id(digest)
  }

  pub fn as_bytes(&self) -> &[u8; ID_LEN] {
    &self.0
  }

  /// Xor distance between two ids.
  pub fn distance(&self, other: &Id) -> Id {
    let mut out = [0u8; ID_LEN];
    for (out, (a, b)) in out.iter_mut().zip(self.0.iter().zip(other.0.iter()))
    {
      *out = a ^ b;
    }
    Id(out)
  }

  /// `floor((self + other) / 2)` without overflowing the 160 bits.
  pub fn midpoint(&self, other: &Id) -> Id {
    let mut sum = [0u8; ID_LEN];
    let mut carry = 0u16;
    for i in (0..ID_LEN).rev() {
      let s = self.0[i] as u16 + other.0[i] as u16 + carry;
      sum[i] = s as u8;
      carry = s >> 8;
    }

    // Shift the 161 bit sum (carry, sum) right by one.
    let mut out = [0u8; ID_LEN];
    let mut high_bit = carry as u8;
    for (out, byte) in out.iter_mut().zip(sum.iter()) {
      *out = (high_bit << 7) | (byte >> 1);
      high_bit = byte & 1;
    }
    Id(out)
  }

  /// `self + 1`, or `None` if `self` is [`Id::MAX`].
  pub fn checked_increment(&self) -> Option<Id> {
    let mut out = self.0;
    for byte in out.iter_mut().rev() {
      let (value, overflow) = byte.overflowing_add(1);
      *byte = value;
      if !overflow {
        return Some(Id(out));
      }
    }
    None
  }

  /// Flip the bit at `index`, counting from the most significant bit.
  ///
  /// Panics if `index >= ID_BITS`.
  pub fn flip_bit(&self, index: usize) -> Id {
    assert!(index < ID_BITS, "bit index {} out of range", index);
    let mut out = self.0;
    out[index / 8] ^= 0x80 >> (index % 8);
    Id(out)
  }
}

impl Distribution<Id> for Standard {
  fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Id {
    Id(rng.gen())
  }
}

impl From<[u8; ID_LEN]> for Id {
  fn from(bytes: [u8; ID_LEN]) -> Self {
    Id(bytes)
  }
}

impl From<Id> for [u8; ID_LEN] {
  fn from(id: Id) -> Self {
    id.0
  }
}

impl TryFrom<&[u8]> for Id {
  type Error = IdError;

  fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
    let bytes = bytes.try_into().map_err(|_| IdError::InvalidLength {
      expected: ID_LEN,
      actual: bytes.len(),
    })?;
    Ok(Id(bytes))
  }
}

impl AsRef<[u8]> for Id {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

impl FromStr for Id {
  type Err = IdError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut bytes = [0u8; ID_LEN];
    hex::decode_to_slice(s, &mut bytes).map_err(IdError::InvalidHex)?;
    Ok(Id(bytes))
  }
}

impl fmt::Display for Id {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", hex::encode(self.0))
  }
}

impl fmt::Debug for Id {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", hex::encode(self.0))
  }
}

mod byte_array {
  use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
  use serde_bytes::ByteBuf;

  use super::ID_LEN;

  pub fn serialize<S: Serializer>(
    bytes: &[u8; ID_LEN],
    s: S,
  ) -> Result<S::Ok, S::Error> {
    s.serialize_bytes(bytes)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<[u8; ID_LEN], D::Error> {
    let buffer = ByteBuf::deserialize(d)?;
    let len = buffer.len();
    buffer
      .into_vec()
      .try_into()
      .map_err(|_| D::Error::invalid_length(len, &"20 bytes"))
  }
}
