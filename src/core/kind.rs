//! Binary/text classification

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::FileDescriptor;
use crate::config::{BINARY_EXTENSIONS, SNIFF_BYTES, TEXT_EXTENSIONS};
use crate::processing::content::read_prefix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
	/// Compared by exact content digest
	Binary,
	/// Compared by embedding similarity
	Text,
}

impl FileKind {
	/// Detect kind from file extension
	pub fn from_extension(ext: &str) -> Option<Self> {
		if TEXT_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
			Some(FileKind::Text)
		} else if BINARY_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
			Some(FileKind::Binary)
		} else {
			None
		}
	}

	/// Detect kind from a leading sample of the content
	pub fn sniff(sample: &[u8]) -> Option<Self> {
		if sample.is_empty() || sample.contains(&0) {
			return Some(FileKind::Binary);
		}
		match std::str::from_utf8(sample) {
			Ok(_) => Some(FileKind::Text),
			// Sample cut a multi-byte sequence in half
			Err(e) if e.error_len().is_none() => Some(FileKind::Text),
			Err(_) => None,
		}
	}
}

impl std::fmt::Display for FileKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			FileKind::Binary => write!(f, "binary"),
			FileKind::Text => write!(f, "text"),
		}
	}
}

/// Classification signal consumed by the detector.
///
/// `None` means the file could not be classified; the detector then
/// applies its configured fallback.
pub trait Classifier: Send + Sync {
	fn classify(&self, descriptor: &FileDescriptor) -> Option<FileKind>;
}

/// Classifies by the extension of the file identity only
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionClassifier;

impl Classifier for ExtensionClassifier {
	fn classify(&self, descriptor: &FileDescriptor) -> Option<FileKind> {
		FileKind::from_extension(descriptor.id().extension()?)
	}
}

/// Classifies by reading the first few KB of content
#[derive(Debug, Clone, Copy)]
pub struct ContentSniffer {
	sample_size: usize,
	read_timeout: Option<Duration>,
}

impl ContentSniffer {
	pub fn new(sample_size: usize) -> Self {
		Self { sample_size, read_timeout: None }
	}

	pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.read_timeout = timeout;
		self
	}
}

impl Default for ContentSniffer {
	fn default() -> Self {
		Self::new(SNIFF_BYTES)
	}
}

impl Classifier for ContentSniffer {
	fn classify(&self, descriptor: &FileDescriptor) -> Option<FileKind> {
		let sample = read_prefix(descriptor.source(), self.sample_size, self.read_timeout).ok()?;
		FileKind::sniff(&sample)
	}
}

/// Caller hint, then extension, then content sniffing
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier {
	extension: ExtensionClassifier,
	sniffer: ContentSniffer,
}

impl DefaultClassifier {
	/// Bound the sniffing read
	pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.sniffer = self.sniffer.with_read_timeout(timeout);
		self
	}
}

impl Classifier for DefaultClassifier {
	fn classify(&self, descriptor: &FileDescriptor) -> Option<FileKind> {
		descriptor
			.kind_hint()
			.or_else(|| self.extension.classify(descriptor))
			.or_else(|| self.sniffer.classify(descriptor))
	}
}
