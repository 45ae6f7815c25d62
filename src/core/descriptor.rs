//! File identities and lazily-read content handles

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::FileKind;

/// Stable identity of a file within one detection run (usually its path)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Extension of the identity when it looks like a path
	pub fn extension(&self) -> Option<&str> {
		Path::new(&self.0).extension()?.to_str()
	}
}

impl fmt::Display for FileId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for FileId {
	fn from(s: &str) -> Self {
		Self(s.to_string())
	}
}

impl From<String> for FileId {
	fn from(s: String) -> Self {
		Self(s)
	}
}

impl From<&Path> for FileId {
	fn from(p: &Path) -> Self {
		Self(p.to_string_lossy().into_owned())
	}
}

/// Handle that opens a fresh reader over a file's bytes on demand
pub trait ContentSource: Send + Sync + fmt::Debug {
	fn open(&self) -> io::Result<Box<dyn Read + Send>>;
}

/// Content backed by a file on disk
#[derive(Debug, Clone)]
pub struct PathSource(PathBuf);

impl PathSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self(path.into())
	}

	pub fn path(&self) -> &Path {
		&self.0
	}
}

impl ContentSource for PathSource {
	fn open(&self) -> io::Result<Box<dyn Read + Send>> {
		Ok(Box::new(File::open(&self.0)?))
	}
}

/// Content held in memory
#[derive(Clone)]
pub struct MemorySource(Arc<[u8]>);

impl MemorySource {
	pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
		Self(Arc::from(bytes.into()))
	}
}

impl fmt::Debug for MemorySource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "MemorySource({} bytes)", self.0.len())
	}
}

impl ContentSource for MemorySource {
	fn open(&self) -> io::Result<Box<dyn Read + Send>> {
		Ok(Box::new(Cursor::new(Arc::clone(&self.0))))
	}
}

/// A file handed to the detector by whatever walked the filesystem.
///
/// Content is never read at construction; the detector opens the
/// source when it needs bytes.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
	id: FileId,
	size: u64,
	kind: Option<FileKind>,
	modified: Option<SystemTime>,
	source: Arc<dyn ContentSource>,
}

impl FileDescriptor {
	pub fn new(id: impl Into<FileId>, size: u64, source: Arc<dyn ContentSource>) -> Self {
		Self {
			id: id.into(),
			size,
			kind: None,
			modified: None,
			source,
		}
	}

	/// Describe a file on disk from its metadata
	pub fn from_path(path: &Path) -> io::Result<Self> {
		let metadata = fs::metadata(path)?;
		Ok(Self {
			id: FileId::from(path),
			size: metadata.len(),
			kind: None,
			modified: metadata.modified().ok(),
			source: Arc::new(PathSource::new(path)),
		})
	}

	pub fn in_memory(id: impl Into<FileId>, bytes: impl Into<Vec<u8>>) -> Self {
		let bytes = bytes.into();
		let size = bytes.len() as u64;
		Self::new(id, size, Arc::new(MemorySource::new(bytes)))
	}

	/// Attach a classification hint from the caller
	pub fn with_kind(mut self, kind: FileKind) -> Self {
		self.kind = Some(kind);
		self
	}

	pub fn with_modified(mut self, modified: SystemTime) -> Self {
		self.modified = Some(modified);
		self
	}

	pub fn id(&self) -> &FileId {
		&self.id
	}

	pub fn size(&self) -> u64 {
		self.size
	}

	pub fn kind_hint(&self) -> Option<FileKind> {
		self.kind
	}

	pub fn modified(&self) -> Option<SystemTime> {
		self.modified
	}

	pub fn source(&self) -> &dyn ContentSource {
		self.source.as_ref()
	}

	pub fn open(&self) -> io::Result<Box<dyn Read + Send>> {
		self.source.open()
	}
}
