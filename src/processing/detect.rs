//! Detection orchestrator
//!
//! Drives one batch of files through classify → fingerprint → match →
//! group. Binary files are bucketed by digest; text files are compared
//! all-pairs by cosine similarity within fixed-size batches. The two kinds
//! are never compared with each other.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;

use super::content::read_text;
use super::fingerprint::ContentFingerprinter;
use super::grouping::DuplicateGrouper;
use super::similarity::{SimilarityMatcher, Threshold};
use crate::config::DetectorConfig;
use crate::core::{
	Classifier, DefaultClassifier, DetectionReport, DuplicateGroup, DuplicateStats, EmbeddingVector, ExactDigest,
	FileDescriptor, FileId, FileKind, Fingerprint, MatchResult, MemberInfo, SkipReason, Skipped,
};
use crate::error::{ConfigError, DetectError, StoreError};
use crate::models::Embedder;
use crate::storage::FingerprintStore;
use crate::ui;

/// Lifecycle of a single detection run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
	Idle,
	Classifying,
	Fingerprinting,
	Matching,
	Grouping,
	Done,
	Failed,
}

impl fmt::Display for RunState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			RunState::Idle => "idle",
			RunState::Classifying => "classifying",
			RunState::Fingerprinting => "fingerprinting",
			RunState::Matching => "matching",
			RunState::Grouping => "grouping",
			RunState::Done => "done",
			RunState::Failed => "failed",
		};
		write!(f, "{}", name)
	}
}

/// Cooperative cancellation flag, checked between files in every phase
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}

	fn check(&self) -> Result<(), DetectError> {
		if self.is_cancelled() {
			Err(DetectError::Cancelled)
		} else {
			Ok(())
		}
	}
}

/// A classified file waiting for its fingerprint
struct Entry {
	/// Position in the caller's input
	pos: usize,
	descriptor: FileDescriptor,
	kind: FileKind,
	/// Text batch index; unused for binary files
	batch: usize,
}

impl Entry {
	fn id(&self) -> &FileId {
		self.descriptor.id()
	}
}

type Positioned = (usize, Skipped);

/// Duplicate detector with its own configuration and worker pool.
///
/// Holds no per-run state, so one detector can serve several runs, and
/// detectors with different settings do not interfere.
pub struct Detector {
	config: DetectorConfig,
	matcher: SimilarityMatcher,
	fingerprinter: ContentFingerprinter,
	embedder: Arc<dyn Embedder>,
	classifier: Arc<dyn Classifier>,
	pool: ThreadPool,
}

impl Detector {
	/// Validate the configuration and build the worker pool
	pub fn new(config: DetectorConfig, embedder: impl Embedder + 'static) -> Result<Self, ConfigError> {
		config.validate()?;
		let threshold = Threshold::new(config.similarity_threshold)?;

		let pool = ThreadPoolBuilder::new()
			.num_threads(config.worker_count)
			.thread_name(|i| format!("dupesift-worker-{}", i))
			.build()
			.map_err(|e| ConfigError::WorkerPool(e.to_string()))?;

		let fingerprinter = ContentFingerprinter::new(config.chunk_size).with_read_timeout(config.read_timeout);
		let classifier = DefaultClassifier::default().with_read_timeout(config.read_timeout);

		Ok(Self {
			config,
			matcher: SimilarityMatcher::new(threshold),
			fingerprinter,
			embedder: Arc::new(embedder),
			classifier: Arc::new(classifier),
			pool,
		})
	}

	/// Replace the default hint/extension/sniffing classifier
	pub fn with_classifier(mut self, classifier: impl Classifier + 'static) -> Self {
		self.classifier = Arc::new(classifier);
		self
	}

	pub fn config(&self) -> &DetectorConfig {
		&self.config
	}

	/// Prepare a run without executing it
	pub fn start(&self, files: Vec<FileDescriptor>) -> DetectionRun<'_> {
		DetectionRun {
			detector: self,
			files,
			state: RunState::Idle,
		}
	}

	/// Run detection to completion
	pub fn detect(&self, files: Vec<FileDescriptor>, cancel: &CancelToken) -> Result<DetectionReport, DetectError> {
		self.start(files).execute(cancel)
	}

	fn fingerprint_entry(&self, entry: &Entry) -> Result<Fingerprint, SkipReason> {
		let io_error = |e: std::io::Error| SkipReason::Io { message: e.to_string() };
		let source = entry.descriptor.source();

		match entry.kind {
			FileKind::Binary => self
				.fingerprinter
				.fingerprint_source(source)
				.map(Fingerprint::Exact)
				.map_err(io_error),
			FileKind::Text => {
				let text = read_text(source, self.config.max_text_bytes, self.config.read_timeout).map_err(io_error)?;
				let values = self
					.embedder
					.embed(&text)
					.map_err(|e| SkipReason::Embedding { message: e.to_string() })?;
				Ok(Fingerprint::Embedding(EmbeddingVector::new(values)))
			}
		}
	}
}

/// One pass of a detector over a set of files
pub struct DetectionRun<'d> {
	detector: &'d Detector,
	files: Vec<FileDescriptor>,
	state: RunState,
}

impl DetectionRun<'_> {
	pub fn state(&self) -> RunState {
		self.state
	}

	/// Execute the run. On error the run ends in `Failed` and no partial
	/// groups are returned.
	pub fn execute(&mut self, cancel: &CancelToken) -> Result<DetectionReport, DetectError> {
		if self.state != RunState::Idle {
			return Err(DetectError::AlreadyStarted(self.state));
		}

		let files = std::mem::take(&mut self.files);
		match self.drive(files, cancel) {
			Ok(report) => {
				self.advance(RunState::Done);
				Ok(report)
			}
			Err(e) => {
				ui::warn(&format!("Detection failed during {}: {}", self.state, e));
				self.state = RunState::Failed;
				Err(e)
			}
		}
	}

	fn advance(&mut self, next: RunState) {
		ui::debug(&format!("Run state: {} -> {}", self.state, next));
		self.state = next;
	}

	fn drive(&mut self, files: Vec<FileDescriptor>, cancel: &CancelToken) -> Result<DetectionReport, DetectError> {
		let total = files.len();

		self.advance(RunState::Classifying);
		let (entries, mut skipped) = self.classify(files, cancel)?;

		self.advance(RunState::Fingerprinting);
		let (store, failures) = self.fingerprint(&entries, cancel)?;
		skipped.extend(failures);

		self.advance(RunState::Matching);
		let (exact, cosine) = self.match_all(&entries, store, cancel)?;

		self.advance(RunState::Grouping);
		cancel.check()?;
		let groups = self.group(&entries, &exact, &cosine);

		skipped.sort_by_key(|(pos, _)| *pos);
		let skipped: Vec<Skipped> = skipped.into_iter().map(|(_, s)| s).collect();
		let stats = DuplicateStats::from_groups(&groups, total - skipped.len(), skipped.len());
		let text_batches = entries
			.iter()
			.filter(|e| e.kind == FileKind::Text)
			.map(|e| e.batch + 1)
			.max()
			.unwrap_or(0);

		ui::debug(&format!(
			"Found {} groups ({} exact, {} similar), {} skipped",
			stats.total_groups, stats.exact_groups, stats.similar_groups, stats.files_skipped
		));

		Ok(DetectionReport {
			groups,
			skipped,
			stats,
			text_batches,
		})
	}

	fn classify(
		&self,
		files: Vec<FileDescriptor>,
		cancel: &CancelToken,
	) -> Result<(Vec<Entry>, Vec<Positioned>), DetectError> {
		let detector = self.detector;
		let mut seen = HashSet::new();
		let mut unique = Vec::with_capacity(files.len());
		let mut skipped = Vec::new();

		for (pos, descriptor) in files.into_iter().enumerate() {
			cancel.check()?;
			if !seen.insert(descriptor.id().clone()) {
				ui::debug(&format!("Skipped repeated identity: {}", descriptor.id()));
				skipped.push((pos, Skipped { id: descriptor.id().clone(), reason: SkipReason::DuplicateIdentity }));
				continue;
			}
			unique.push((pos, descriptor));
		}

		let kinds: Vec<Option<FileKind>> = detector.pool.install(|| {
			unique
				.par_iter()
				.map(|(_, descriptor)| -> Result<Option<FileKind>, DetectError> {
					cancel.check()?;
					Ok(detector.classifier.classify(descriptor))
				})
				.collect::<Result<Vec<_>, DetectError>>()
		})?;

		let fallback = detector.config.fallback_on_unclassifiable;
		let batch_size = detector.config.batch_size;
		let mut fallbacks = 0;
		let mut text_count = 0;
		let mut entries = Vec::with_capacity(unique.len());

		for ((pos, descriptor), kind) in unique.into_iter().zip(kinds) {
			let kind = match kind {
				Some(kind) => kind,
				None => {
					ui::debug(&format!("Unclassifiable, treating as {}: {}", fallback, descriptor.id()));
					fallbacks += 1;
					fallback
				}
			};
			let batch = match kind {
				FileKind::Text => {
					text_count += 1;
					(text_count - 1) / batch_size
				}
				FileKind::Binary => 0,
			};
			entries.push(Entry { pos, descriptor, kind, batch });
		}

		if fallbacks > 0 {
			ui::warn(&format!("{} files could not be classified, treated as {}", fallbacks, fallback));
		}
		ui::debug(&format!(
			"Classified {} files ({} text, {} binary)",
			entries.len(),
			text_count,
			entries.len() - text_count
		));

		Ok((entries, skipped))
	}

	fn fingerprint(
		&self,
		entries: &[Entry],
		cancel: &CancelToken,
	) -> Result<(FingerprintStore, Vec<Positioned>), DetectError> {
		let detector = self.detector;
		let store = FingerprintStore::default();

		let outcomes: Vec<Option<Positioned>> = detector.pool.install(|| {
			entries
				.par_iter()
				.map(|entry| -> Result<Option<Positioned>, DetectError> {
					cancel.check()?;
					let reason = match detector.fingerprint_entry(entry) {
						Ok(fingerprint) => match store.insert(entry.id().clone(), fingerprint) {
							Ok(()) => return Ok(None),
							Err(StoreError::AlreadyPresent(_)) => SkipReason::DuplicateIdentity,
						},
						Err(reason) => reason,
					};
					ui::debug(&format!("Skipped {}: {}", entry.id(), reason));
					Ok(Some((entry.pos, Skipped { id: entry.id().clone(), reason })))
				})
				.collect::<Result<Vec<_>, DetectError>>()
		})?;

		Ok((store, outcomes.into_iter().flatten().collect()))
	}

	fn match_all(
		&self,
		entries: &[Entry],
		store: FingerprintStore,
		cancel: &CancelToken,
	) -> Result<(Vec<MatchResult>, Vec<MatchResult>), DetectError> {
		let mut fingerprints = store.into_entries();
		let mut digests: Vec<(&Entry, ExactDigest)> = Vec::new();
		let mut vectors: Vec<(&Entry, EmbeddingVector)> = Vec::new();

		for entry in entries {
			match fingerprints.remove(entry.id()) {
				Some(Fingerprint::Exact(digest)) => digests.push((entry, digest)),
				Some(Fingerprint::Embedding(vector)) => vectors.push((entry, vector)),
				None => {}
			}
		}

		check_dimensions(&vectors)?;

		let exact = self.match_binary(&digests, cancel)?;
		let cosine = self.match_text(&vectors, cancel)?;
		ui::debug(&format!("{} exact matches, {} similarity matches", exact.len(), cosine.len()));

		Ok((exact, cosine))
	}

	/// Bucket by digest value; linear in the number of files
	fn match_binary(
		&self,
		digests: &[(&Entry, ExactDigest)],
		cancel: &CancelToken,
	) -> Result<Vec<MatchResult>, DetectError> {
		let matcher = &self.detector.matcher;
		let mut bucket_of: HashMap<&ExactDigest, usize> = HashMap::new();
		let mut buckets: Vec<Vec<(&FileId, &ExactDigest)>> = Vec::new();

		for (entry, digest) in digests {
			cancel.check()?;
			let idx = *bucket_of.entry(digest).or_insert_with(|| {
				buckets.push(Vec::new());
				buckets.len() - 1
			});
			buckets[idx].push((entry.id(), digest));
		}

		for bucket in buckets.iter().filter(|bucket| bucket.len() > 1) {
			ui::debug(&format!("Digest {}: {} identical files", bucket[0].1.short(), bucket.len()));
		}

		Ok(buckets
			.iter()
			.filter(|bucket| bucket.len() > 1)
			.flat_map(|bucket| {
				let first = bucket[0];
				bucket[1..].iter().filter_map(move |other| matcher.match_digests(first, *other))
			})
			.collect())
	}

	/// All pairs within each batch, rows compared in parallel
	fn match_text(
		&self,
		vectors: &[(&Entry, EmbeddingVector)],
		cancel: &CancelToken,
	) -> Result<Vec<MatchResult>, DetectError> {
		let detector = self.detector;
		let matcher = &detector.matcher;
		let mut matches = Vec::new();

		for batch in vectors.chunk_by(|a, b| a.0.batch == b.0.batch) {
			cancel.check()?;
			let rows: Vec<Vec<MatchResult>> = detector.pool.install(|| {
				(0..batch.len())
					.into_par_iter()
					.map(|i| -> Result<Vec<MatchResult>, DetectError> {
						cancel.check()?;
						let (entry_a, a) = &batch[i];
						Ok(batch[i + 1..]
							.iter()
							.filter_map(|(entry_b, b)| matcher.match_vectors((entry_a.id(), a), (entry_b.id(), b)))
							.collect())
					})
					.collect::<Result<Vec<_>, DetectError>>()
			})?;
			matches.extend(rows.into_iter().flatten());
		}

		Ok(matches)
	}

	fn group(&self, entries: &[Entry], exact: &[MatchResult], cosine: &[MatchResult]) -> Vec<DuplicateGroup> {
		// Kinds are exclusive, so the two group sets cannot overlap
		let mut exact_grouper = DuplicateGrouper::new();
		exact_grouper.extend(exact);
		let mut text_grouper = DuplicateGrouper::new();
		text_grouper.extend(cosine);

		let by_id: HashMap<&FileId, &Entry> = entries.iter().map(|e| (e.id(), e)).collect();
		let position = |id: &FileId| by_id.get(id).map(|e| e.pos).unwrap_or(usize::MAX);
		let info = |id: &FileId| {
			by_id
				.get(id)
				.map(|e| MemberInfo { size: e.descriptor.size(), modified: e.descriptor.modified() })
				.unwrap_or(MemberInfo { size: 0, modified: None })
		};

		let mut groups: Vec<DuplicateGroup> =
			exact_grouper.into_groups().into_iter().chain(text_grouper.into_groups()).collect();

		let strategy = self.detector.config.keep_strategy;
		for group in &mut groups {
			group.members.sort_by_key(|m| position(m));
			group.apply_keep(strategy, info);
		}
		groups.sort_by_key(|g| g.members.first().map(|m| position(m)).unwrap_or(usize::MAX));
		groups
	}
}

/// Every vector in a run must share the first vector's dimension
fn check_dimensions(vectors: &[(&Entry, EmbeddingVector)]) -> Result<(), ConfigError> {
	let Some((_, first)) = vectors.first() else {
		return Ok(());
	};
	let expected = first.dimension();
	for (entry, vector) in vectors {
		if vector.dimension() != expected {
			return Err(ConfigError::DimensionMismatch {
				id: entry.id().clone(),
				expected,
				found: vector.dimension(),
			});
		}
	}
	Ok(())
}
