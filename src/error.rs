use thiserror::Error;

/// Failure to build an [`Id`](crate::id::Id) from foreign data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdError {
  #[error("invalid id length: expected {expected} bytes, got {actual}")]
  InvalidLength { expected: usize, actual: usize },
  #[error("invalid hex id")]
  InvalidHex(#[source] hex::FromHexError),
}

/// Contract violation when measuring distance between two keys.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceError {
  #[error("keys of different length: {left} and {right} bytes")]
  LengthMismatch { left: usize, right: usize },
}
