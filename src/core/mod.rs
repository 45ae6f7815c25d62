//! Core domain types

pub mod descriptor;
pub mod digest;
pub mod embedding;
pub mod fingerprint;
pub mod group;
pub mod kind;

pub use descriptor::{ContentSource, FileDescriptor, FileId, MemorySource, PathSource};
pub use digest::ExactDigest;
pub use embedding::EmbeddingVector;
pub use fingerprint::Fingerprint;
pub use group::{
	DetectionReport, DuplicateGroup, DuplicateStats, KeepStrategy, MatchMethod, MatchResult, MemberInfo, SkipReason,
	Skipped,
};
pub use kind::{Classifier, ContentSniffer, DefaultClassifier, ExtensionClassifier, FileKind};
