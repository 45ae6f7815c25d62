//! # dupesift
//!
//! Exact and near-duplicate file detection. Binary files are matched by
//! SHA-256 digest, text files by cosine similarity of their embeddings,
//! and matches are merged into duplicate groups with union-find.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod processing;
pub mod storage;
pub mod ui;

pub use crate::config::DetectorConfig;
pub use crate::core::{DetectionReport, DuplicateGroup, FileDescriptor, FileId, FileKind};
pub use crate::error::{ConfigError, DetectError, EmbeddingError};
pub use crate::models::{Embedder, HashedEmbedder};
pub use crate::processing::{CancelToken, DetectionRun, Detector, RunState};
