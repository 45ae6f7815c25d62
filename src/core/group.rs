//! Match results, duplicate groups and the detection report

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::FileId;

/// How two files were judged to be duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
	Exact,
	Cosine,
}

/// One pairwise duplicate decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
	pub a: FileId,
	pub b: FileId,
	/// Similarity in [0.0, 1.0]; 1.0 for equal digests
	pub score: f32,
	pub method: MatchMethod,
}

impl MatchResult {
	pub fn exact(a: FileId, b: FileId) -> Self {
		Self { a, b, score: 1.0, method: MatchMethod::Exact }
	}

	pub fn cosine(a: FileId, b: FileId, score: f32) -> Self {
		Self { a, b, score, method: MatchMethod::Cosine }
	}
}

/// Which member of a group to recommend keeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeepStrategy {
	/// Earliest in input order
	#[default]
	First,
	/// Most recently modified
	Newest,
	/// Least recently modified
	Oldest,
	/// Largest file size
	Largest,
	/// Smallest file size
	Smallest,
}

/// Size and modification time of a group member, used to pick a keeper
#[derive(Debug, Clone, Copy)]
pub struct MemberInfo {
	pub size: u64,
	pub modified: Option<SystemTime>,
}

/// Set of files believed to be duplicates of each other.
///
/// Members are connected by a chain of matches, not necessarily
/// pairwise above threshold.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
	pub members: Vec<FileId>,
	pub method: MatchMethod,
	/// Weakest link among the matches that formed the group
	pub min_score: f32,
	/// A pair whose match carried `min_score`
	pub witness: (FileId, FileId),
	/// Member recommended for keeping
	pub keep: FileId,
	/// Bytes freed by removing every member except `keep`
	pub reclaimable_bytes: u64,
}

impl DuplicateGroup {
	pub fn new(members: Vec<FileId>, method: MatchMethod, min_score: f32, witness: (FileId, FileId)) -> Self {
		let keep = members.first().cloned().unwrap_or_else(|| witness.0.clone());
		Self {
			members,
			method,
			min_score,
			witness,
			keep,
			reclaimable_bytes: 0,
		}
	}

	pub fn len(&self) -> usize {
		self.members.len()
	}

	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	pub fn contains(&self, id: &FileId) -> bool {
		self.members.iter().any(|m| m == id)
	}

	/// Pick the keeper and compute reclaimable bytes.
	///
	/// Members must already be in input order; ties go to the earliest.
	pub fn apply_keep<F>(&mut self, strategy: KeepStrategy, info: F)
	where
		F: Fn(&FileId) -> MemberInfo,
	{
		let infos: Vec<MemberInfo> = self.members.iter().map(&info).collect();
		let epoch = |i: &MemberInfo| i.modified.unwrap_or(SystemTime::UNIX_EPOCH);

		let mut best = 0;
		for (idx, candidate) in infos.iter().enumerate().skip(1) {
			let current = &infos[best];
			let better = match strategy {
				KeepStrategy::First => false,
				KeepStrategy::Newest => epoch(candidate) > epoch(current),
				KeepStrategy::Oldest => epoch(candidate) < epoch(current),
				KeepStrategy::Largest => candidate.size > current.size,
				KeepStrategy::Smallest => candidate.size < current.size,
			};
			if better {
				best = idx;
			}
		}

		if let Some(keep) = self.members.get(best) {
			self.keep = keep.clone();
		}
		self.reclaimable_bytes = infos
			.iter()
			.enumerate()
			.filter(|(idx, _)| *idx != best)
			.map(|(_, i)| i.size)
			.sum();
	}
}

/// Why a file could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
	Io { message: String },
	Embedding { message: String },
	DuplicateIdentity,
}

impl std::fmt::Display for SkipReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			SkipReason::Io { message } => write!(f, "I/O error: {}", message),
			SkipReason::Embedding { message } => write!(f, "embedding error: {}", message),
			SkipReason::DuplicateIdentity => write!(f, "identity already seen in this run"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
	pub id: FileId,
	pub reason: SkipReason,
}

/// Aggregate numbers for reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateStats {
	pub total_groups: usize,
	pub exact_groups: usize,
	pub similar_groups: usize,
	/// Files that could be removed, keeping one per group
	pub redundant_files: usize,
	pub reclaimable_bytes: u64,
	pub files_examined: usize,
	pub files_skipped: usize,
}

impl DuplicateStats {
	pub fn from_groups(groups: &[DuplicateGroup], files_examined: usize, files_skipped: usize) -> Self {
		let exact_groups = groups.iter().filter(|g| g.method == MatchMethod::Exact).count();
		Self {
			total_groups: groups.len(),
			exact_groups,
			similar_groups: groups.len() - exact_groups,
			redundant_files: groups.iter().map(|g| g.len().saturating_sub(1)).sum(),
			reclaimable_bytes: groups.iter().map(|g| g.reclaimable_bytes).sum(),
			files_examined,
			files_skipped,
		}
	}
}

/// Output of a completed detection run
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
	pub groups: Vec<DuplicateGroup>,
	pub skipped: Vec<Skipped>,
	pub stats: DuplicateStats,
	/// Number of text batches compared all-pairs
	pub text_batches: usize,
}

impl DetectionReport {
	/// Group containing `id`, if any
	pub fn group_of(&self, id: &FileId) -> Option<&DuplicateGroup> {
		self.groups.iter().find(|g| g.contains(id))
	}
}
