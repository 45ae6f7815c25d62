//! Per-file fingerprints

use serde::Serialize;

use super::{EmbeddingVector, ExactDigest};

/// Compact representation of a file's content, computed once per run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Fingerprint {
	Exact(ExactDigest),
	Embedding(EmbeddingVector),
}
