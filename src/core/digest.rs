//! Exact content digests

use std::fmt;

use serde::{Serialize, Serializer};

pub const DIGEST_LEN: usize = 32;

/// SHA-256 digest of a file's full content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExactDigest([u8; DIGEST_LEN]);

impl ExactDigest {
	pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
		Self(bytes)
	}

	pub fn to_hex(&self) -> String {
		self.0.iter().map(|b| format!("{:02x}", b)).collect()
	}

	/// First 8 hex characters for logging/display
	pub fn short(&self) -> String {
		self.to_hex()[..8].to_string()
	}
}

impl fmt::Display for ExactDigest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex())
	}
}

impl Serialize for ExactDigest {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_hex())
	}
}
