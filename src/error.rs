//! Error taxonomy for detection runs
//!
//! Only configuration problems and cancellation abort a run. Per-file
//! failures become [`SkipReason`](crate::core::SkipReason) entries in the
//! report instead of errors.

use thiserror::Error;

use crate::core::FileId;
use crate::processing::detect::RunState;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("similarity threshold must be within [0.0, 1.0], got {0}")]
	InvalidThreshold(f32),

	#[error("batch size must be greater than zero")]
	InvalidBatchSize,

	#[error("worker count must be greater than zero")]
	InvalidWorkerCount,

	#[error("read chunk size must be greater than zero")]
	InvalidChunkSize,

	#[error("embedding dimension mismatch for {id}: expected {expected}, got {found}")]
	DimensionMismatch { id: FileId, expected: usize, found: usize },

	#[error("failed to build worker pool: {0}")]
	WorkerPool(String),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
	#[error("no embeddable content")]
	EmptyInput,

	#[error("unsupported input: {0}")]
	Unsupported(String),

	#[error("embedding provider failed: {0}")]
	Provider(String),
}

#[derive(Debug, Error)]
pub enum DetectError {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("detection run cancelled")]
	Cancelled,

	#[error("detection run already started (state: {0})")]
	AlreadyStarted(RunState),
}

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("fingerprint already stored for {0}")]
	AlreadyPresent(FileId),
}
