//! Content fingerprinting for exact matching

use std::io::{self, Read};
use std::time::Duration;

use sha2::{Digest, Sha256};

use super::content::BoundedReader;
use crate::config::HASH_CHUNK_SIZE;
use crate::core::digest::DIGEST_LEN;
use crate::core::{ContentSource, ExactDigest};

/// Streams content through SHA-256 in fixed-size chunks.
///
/// Memory use is one chunk regardless of file size.
#[derive(Debug, Clone)]
pub struct ContentFingerprinter {
	chunk_size: usize,
	read_timeout: Option<Duration>,
}

impl ContentFingerprinter {
	pub fn new(chunk_size: usize) -> Self {
		Self {
			chunk_size: chunk_size.max(1),
			read_timeout: None,
		}
	}

	pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.read_timeout = timeout;
		self
	}

	/// Digest in-memory bytes
	pub fn fingerprint(&self, bytes: &[u8]) -> ExactDigest {
		finish(Sha256::new().chain_update(bytes))
	}

	/// Digest everything a reader yields
	pub fn fingerprint_reader<R: Read + Send + 'static>(&self, reader: R) -> io::Result<ExactDigest> {
		let mut reader = BoundedReader::new(reader, self.read_timeout)?;
		let mut hasher = Sha256::new();
		let mut buffer = vec![0u8; self.chunk_size];

		loop {
			let n = match reader.read(&mut buffer) {
				Ok(0) => break,
				Ok(n) => n,
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(e),
			};
			hasher.update(&buffer[..n]);
		}

		Ok(finish(hasher))
	}

	/// Open a content handle and digest it
	pub fn fingerprint_source(&self, source: &dyn ContentSource) -> io::Result<ExactDigest> {
		self.fingerprint_reader(source.open()?)
	}
}

impl Default for ContentFingerprinter {
	fn default() -> Self {
		Self::new(HASH_CHUNK_SIZE)
	}
}

fn finish(hasher: Sha256) -> ExactDigest {
	let mut bytes = [0u8; DIGEST_LEN];
	bytes.copy_from_slice(&hasher.finalize());
	ExactDigest::from_bytes(bytes)
}
