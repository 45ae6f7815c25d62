//! Application configuration and constants

use std::time::Duration;

use crate::core::{FileKind, KeepStrategy};
use crate::error::ConfigError;
use crate::processing::similarity::Threshold;

// === Matching ===
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.95;
pub const DEFAULT_BATCH_SIZE: usize = 500;

// === I/O ===
pub const HASH_CHUNK_SIZE: usize = 65536; // 64KB
pub const SNIFF_BYTES: usize = 8192;
pub const DEFAULT_MAX_TEXT_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

// === Embeddings ===
pub const EMBEDDING_DIM: usize = 512;

// === Scanning ===
pub const IGNORE_FILE: &str = ".dupesiftignore";

// === File Extensions ===
pub const TEXT_EXTENSIONS: &[&str] = &[
	"txt", "md", "rst", "rtf", "csv", "tsv", "log", "json", "yaml", "yml", "toml", "xml", "ini", "cfg",
	"html", "htm", "css", "js", "ts", "py", "java", "c", "h", "cpp", "hpp", "rs", "go", "rb", "sh", "sql",
];

pub const BINARY_EXTENSIONS: &[&str] = &[
	"jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "ico", "pdf", "doc", "docx", "xls", "xlsx",
	"ppt", "pptx", "mp3", "wav", "flac", "m4a", "mp4", "avi", "mkv", "mov", "zip", "rar", "7z", "gz", "tar",
	"exe", "dll", "so", "bin",
];

/// Settings for one detector instance.
///
/// Passed in at construction so detectors with different settings can run
/// side by side.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
	/// Minimum cosine similarity for two text files to match, in [0.0, 1.0]
	pub similarity_threshold: f32,
	/// Text files compared all-pairs per batch; cross-batch pairs are never compared
	pub batch_size: usize,
	/// Threads in the fingerprinting/matching pool
	pub worker_count: usize,
	/// Kind assumed when the classifier cannot decide
	pub fallback_on_unclassifiable: FileKind,
	/// Read buffer size for digesting
	pub chunk_size: usize,
	/// Per-file read budget, sniffing included; exceeding it is an I/O
	/// error for that file. `None` lets reads block.
	pub read_timeout: Option<Duration>,
	/// Text beyond this many bytes is not embedded
	pub max_text_bytes: u64,
	pub keep_strategy: KeepStrategy,
}

impl Default for DetectorConfig {
	fn default() -> Self {
		Self {
			similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
			batch_size: DEFAULT_BATCH_SIZE,
			worker_count: default_worker_count(),
			fallback_on_unclassifiable: FileKind::Binary,
			chunk_size: HASH_CHUNK_SIZE,
			read_timeout: Some(Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS)),
			max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
			keep_strategy: KeepStrategy::default(),
		}
	}
}

impl DetectorConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		Threshold::new(self.similarity_threshold)?;
		if self.batch_size == 0 {
			return Err(ConfigError::InvalidBatchSize);
		}
		if self.worker_count == 0 {
			return Err(ConfigError::InvalidWorkerCount);
		}
		if self.chunk_size == 0 {
			return Err(ConfigError::InvalidChunkSize);
		}
		Ok(())
	}
}

/// Number of threads available to this process
pub fn default_worker_count() -> usize {
	std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
