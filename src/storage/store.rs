//! Concurrent fingerprint store keyed by file identity

use std::collections::HashMap;
use std::sync::RwLock;

use xxhash_rust::xxh3::xxh3_64;

use crate::core::{FileId, Fingerprint};
use crate::error::StoreError;

const DEFAULT_SHARDS: usize = 16;

/// Append-only map from file identity to fingerprint.
///
/// Identities are spread over independently locked shards so workers
/// inserting different files rarely contend. Entries are never updated.
pub struct FingerprintStore {
	shards: Vec<RwLock<HashMap<FileId, Fingerprint>>>,
}

impl FingerprintStore {
	pub fn new(shard_count: usize) -> Self {
		let shard_count = shard_count.max(1);
		Self {
			shards: (0..shard_count).map(|_| RwLock::new(HashMap::new())).collect(),
		}
	}

	fn shard(&self, id: &FileId) -> &RwLock<HashMap<FileId, Fingerprint>> {
		let idx = (xxh3_64(id.as_str().as_bytes()) % self.shards.len() as u64) as usize;
		&self.shards[idx]
	}

	/// Store the fingerprint for `id`; a second insert for the same id is rejected
	pub fn insert(&self, id: FileId, fingerprint: Fingerprint) -> Result<(), StoreError> {
		let mut shard = self.shard(&id).write().unwrap_or_else(|e| e.into_inner());
		if shard.contains_key(&id) {
			return Err(StoreError::AlreadyPresent(id));
		}
		shard.insert(id, fingerprint);
		Ok(())
	}

	pub fn get(&self, id: &FileId) -> Option<Fingerprint> {
		let shard = self.shard(id).read().unwrap_or_else(|e| e.into_inner());
		shard.get(id).cloned()
	}

	pub fn contains(&self, id: &FileId) -> bool {
		let shard = self.shard(id).read().unwrap_or_else(|e| e.into_inner());
		shard.contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.shards
			.iter()
			.map(|s| s.read().unwrap_or_else(|e| e.into_inner()).len())
			.sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Consume the store, handing all entries to the next phase
	pub fn into_entries(self) -> HashMap<FileId, Fingerprint> {
		let mut all = HashMap::new();
		for shard in self.shards {
			all.extend(shard.into_inner().unwrap_or_else(|e| e.into_inner()));
		}
		all
	}
}

impl Default for FingerprintStore {
	fn default() -> Self {
		Self::new(DEFAULT_SHARDS)
	}
}
