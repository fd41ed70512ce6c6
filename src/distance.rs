//! Kademlia xor metric over raw byte keys.
//!
//! The routing table works with fixed width [`Id`](crate::id::Id)s and uses
//! [`Id::distance`](crate::id::Id::distance) directly. These helpers accept
//! keys of any width and reject pairs that do not match.

use std::cmp::Ordering;

use crate::error::DistanceError;

/// Bitwise xor of two keys of equal length.
pub fn xor(a: &[u8], b: &[u8]) -> Result<Vec<u8>, DistanceError> {
  if a.len() != b.len() {
    return Err(DistanceError::LengthMismatch {
      left: a.len(),
      right: b.len(),
    });
  }

  Ok(a.iter().zip(b.iter()).map(|(a, b)| a ^ b).collect())
}

/// Compare two distances, most significant byte first, bytes unsigned.
///
/// Distances of different length are a caller error.
pub fn compare_distance(a: &[u8], b: &[u8]) -> Result<Ordering, DistanceError> {
  if a.len() != b.len() {
    return Err(DistanceError::LengthMismatch {
      left: a.len(),
      right: b.len(),
    });
  }

  Ok(a.cmp(b))
}

/// Is `a` strictly closer to `target` than `b`?
pub fn is_closer(
  target: &[u8],
  a: &[u8],
  b: &[u8],
) -> Result<bool, DistanceError> {
  let da = xor(target, a)?;
  let db = xor(target, b)?;
  Ok(compare_distance(&da, &db)? == Ordering::Less)
}
