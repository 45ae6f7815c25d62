// Detection behaviour end to end, through the public API

use std::fs;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dupesift::core::{ContentSource, KeepStrategy, MatchMethod, PathSource, SkipReason};
use dupesift::{
	CancelToken, ConfigError, DetectError, DetectorConfig, Detector, EmbeddingError, FileDescriptor, FileId, RunState,
};
use tempfile::TempDir;

fn config() -> DetectorConfig {
	DetectorConfig { worker_count: 4, ..Default::default() }
}

fn text(name: &str, content: &str) -> FileDescriptor {
	FileDescriptor::in_memory(name, content.as_bytes().to_vec())
}

fn id(name: &str) -> FileId {
	FileId::from(name)
}

/// Embedder that maps known contents to fixed vectors
fn table(entries: Vec<(&'static str, Vec<f32>)>) -> impl Fn(&str) -> Result<Vec<f32>, EmbeddingError> + Send + Sync {
	move |text: &str| {
		entries
			.iter()
			.find(|(key, _)| *key == text)
			.map(|(_, v)| v.clone())
			.ok_or_else(|| EmbeddingError::Unsupported(text.to_string()))
	}
}

#[test]
fn test_identical_binaries_form_exact_group() {
	let detector = Detector::new(config(), table(vec![])).unwrap();
	let report = detector
		.detect(
			vec![
				FileDescriptor::in_memory("a.png", vec![1u8, 2, 3, 4]),
				FileDescriptor::in_memory("b.png", vec![1u8, 2, 3, 4]),
			],
			&CancelToken::new(),
		)
		.unwrap();

	assert_eq!(report.groups.len(), 1);
	let group = &report.groups[0];
	assert_eq!(group.len(), 2);
	assert_eq!(group.method, MatchMethod::Exact);
	assert_eq!(group.min_score, 1.0);
	assert!(report.skipped.is_empty());
}

#[test]
fn test_chain_groups_below_threshold_pair() {
	// e2 is 0.97 from e1 and 0.96 from e3; e1 and e3 are about 0.86 apart
	let a = 0.97f64.acos();
	let b = 0.96f64.acos();
	let e1 = vec![1.0f32, 0.0];
	let e2 = vec![a.cos() as f32, a.sin() as f32];
	let e3 = vec![(a + b).cos() as f32, (a + b).sin() as f32];

	let detector = Detector::new(config(), table(vec![("one", e1), ("two", e2), ("three", e3)])).unwrap();
	let report = detector
		.detect(
			vec![text("1.txt", "one"), text("2.txt", "two"), text("3.txt", "three")],
			&CancelToken::new(),
		)
		.unwrap();

	assert_eq!(report.groups.len(), 1);
	let group = &report.groups[0];
	assert_eq!(group.members, vec![id("1.txt"), id("2.txt"), id("3.txt")]);
	assert_eq!(group.method, MatchMethod::Cosine);
	assert!((group.min_score - 0.96).abs() < 1e-4, "min score was {}", group.min_score);
	assert_eq!(group.witness, (id("2.txt"), id("3.txt")));
}

#[test]
fn test_embedding_failure_is_skipped() {
	let embedder = |text: &str| -> Result<Vec<f32>, EmbeddingError> {
		if text == "broken" {
			Err(EmbeddingError::Provider("model unavailable".to_string()))
		} else {
			Ok(vec![1.0f32, 0.0])
		}
	};
	let detector = Detector::new(config(), embedder).unwrap();
	let report = detector
		.detect(
			vec![text("a.txt", "fine"), text("b.txt", "broken"), text("c.txt", "also fine")],
			&CancelToken::new(),
		)
		.unwrap();

	assert_eq!(report.skipped.len(), 1);
	assert_eq!(report.skipped[0].id, id("b.txt"));
	assert!(matches!(report.skipped[0].reason, SkipReason::Embedding { .. }));
	assert!(report.group_of(&id("b.txt")).is_none());

	let group = report.group_of(&id("a.txt")).unwrap();
	assert!(group.contains(&id("c.txt")));
	assert_eq!(report.stats.files_examined, 2);
	assert_eq!(report.stats.files_skipped, 1);
}

#[test]
fn test_pairs_across_batches_are_not_compared() {
	let embedder = |text: &str| -> Result<Vec<f32>, EmbeddingError> {
		match text {
			"target" => Ok(vec![1.0f32, 0.0]),
			"control" => Ok(vec![0.0f32, 1.0]),
			_ => Ok(vec![0.0f32, 0.0]),
		}
	};

	let files: Vec<FileDescriptor> = (0..10_000)
		.map(|i| {
			let content = match i {
				0 | 9_999 => "target".to_string(),
				1 | 2 => "control".to_string(),
				_ => format!("filler {}", i),
			};
			text(&format!("doc_{:05}.txt", i), &content)
		})
		.collect();

	let detector = Detector::new(config(), embedder).unwrap();
	assert_eq!(detector.config().batch_size, 500);
	let report = detector.detect(files, &CancelToken::new()).unwrap();

	assert_eq!(report.text_batches, 20);
	assert!(report.groups.iter().all(|g| !(g.contains(&id("doc_00000.txt")) && g.contains(&id("doc_09999.txt")))));

	// Same pair shape inside one batch is found
	assert_eq!(report.groups.len(), 1);
	assert_eq!(report.groups[0].members, vec![id("doc_00001.txt"), id("doc_00002.txt")]);
}

#[test]
fn test_out_of_range_threshold_is_rejected() {
	let config = DetectorConfig { similarity_threshold: 1.01, ..config() };
	let result = Detector::new(config, table(vec![]));
	assert!(matches!(result, Err(ConfigError::InvalidThreshold(_))));
}

#[test]
fn test_dimension_mismatch_fails_run() {
	let detector =
		Detector::new(config(), table(vec![("short", vec![1.0, 0.0]), ("long", vec![1.0, 0.0, 0.0])])).unwrap();
	let mut run = detector.start(vec![text("a.txt", "short"), text("b.txt", "long")]);

	let result = run.execute(&CancelToken::new());
	assert!(matches!(result, Err(DetectError::Config(ConfigError::DimensionMismatch { .. }))));
	assert_eq!(run.state(), RunState::Failed);
}

#[test]
fn test_cancel_during_run_returns_no_groups() {
	let cancel = CancelToken::new();
	let trigger = cancel.clone();
	let embedder = move |_: &str| -> Result<Vec<f32>, EmbeddingError> {
		trigger.cancel();
		Ok(vec![1.0f32, 0.0])
	};

	let detector = Detector::new(config(), embedder).unwrap();
	let mut run = detector.start(vec![text("a.txt", "same"), text("b.txt", "same")]);

	assert!(matches!(run.execute(&cancel), Err(DetectError::Cancelled)));
	assert_eq!(run.state(), RunState::Failed);
}

#[test]
fn test_unreadable_file_is_skipped() {
	let dir = TempDir::new().unwrap();
	let present = dir.path().join("present.bin");
	fs::write(&present, b"bytes").unwrap();
	let missing = dir.path().join("missing.bin");

	let detector = Detector::new(config(), table(vec![])).unwrap();
	let report = detector
		.detect(
			vec![
				FileDescriptor::from_path(&present).unwrap(),
				FileDescriptor::new("missing.bin", 5, Arc::new(PathSource::new(&missing))),
			],
			&CancelToken::new(),
		)
		.unwrap();

	assert!(report.groups.is_empty());
	assert_eq!(report.skipped.len(), 1);
	assert_eq!(report.skipped[0].id, id("missing.bin"));
	assert!(matches!(report.skipped[0].reason, SkipReason::Io { .. }));
}

#[test]
fn test_unclassifiable_falls_back_to_binary() {
	// Invalid UTF-8 without NUL bytes and no known extension
	let blob = vec![0xffu8, 0xfe, 0x80, 0x81];
	let failing = |_: &str| -> Result<Vec<f32>, EmbeddingError> { Err(EmbeddingError::EmptyInput) };

	let detector = Detector::new(config(), failing).unwrap();
	let report = detector
		.detect(
			vec![FileDescriptor::in_memory("blob1", blob.clone()), FileDescriptor::in_memory("blob2", blob)],
			&CancelToken::new(),
		)
		.unwrap();

	assert!(report.skipped.is_empty());
	assert_eq!(report.groups.len(), 1);
	assert_eq!(report.groups[0].method, MatchMethod::Exact);
}

#[test]
fn test_text_and_binary_never_match() {
	let detector = Detector::new(config(), table(vec![("hello", vec![1.0, 0.0])])).unwrap();
	let report = detector
		.detect(vec![text("hello.txt", "hello"), text("hello.bin", "hello")], &CancelToken::new())
		.unwrap();

	assert!(report.groups.is_empty());
	assert!(report.skipped.is_empty());
}

#[test]
fn test_repeated_identity_is_skipped() {
	let detector = Detector::new(config(), table(vec![])).unwrap();
	let report = detector
		.detect(
			vec![
				FileDescriptor::in_memory("a.bin", b"x".to_vec()),
				FileDescriptor::in_memory("a.bin", b"x".to_vec()),
			],
			&CancelToken::new(),
		)
		.unwrap();

	assert!(report.groups.is_empty());
	assert_eq!(report.skipped.len(), 1);
	assert_eq!(report.skipped[0].reason, SkipReason::DuplicateIdentity);
	assert_eq!(report.stats.files_examined + report.stats.files_skipped, 2);
}

#[test]
fn test_keep_largest_member() {
	let config = DetectorConfig { keep_strategy: KeepStrategy::Largest, ..config() };
	let same = |_: &str| -> Result<Vec<f32>, EmbeddingError> { Ok(vec![0.5f32, 0.5]) };

	let detector = Detector::new(config, same).unwrap();
	let report = detector
		.detect(vec![text("short.txt", "x"), text("long.txt", "xxxxxxxx")], &CancelToken::new())
		.unwrap();

	assert_eq!(report.groups.len(), 1);
	assert_eq!(report.groups[0].keep, id("long.txt"));
	assert_eq!(report.groups[0].reclaimable_bytes, 1);
	assert_eq!(report.stats.reclaimable_bytes, 1);
}

#[test]
fn test_detectors_with_different_thresholds_run_side_by_side() {
	let close = || table(vec![("a", vec![1.0, 0.0]), ("b", vec![0.9, 0.19f32.sqrt()])]);
	let strict = Detector::new(DetectorConfig { similarity_threshold: 0.95, ..config() }, close()).unwrap();
	let lax = Detector::new(DetectorConfig { similarity_threshold: 0.85, ..config() }, close()).unwrap();
	let files = || vec![text("a.txt", "a"), text("b.txt", "b")];

	let (strict_report, lax_report) = std::thread::scope(|s| {
		let strict_run = s.spawn(|| strict.detect(files(), &CancelToken::new()));
		let lax_run = s.spawn(|| lax.detect(files(), &CancelToken::new()));
		(strict_run.join().unwrap().unwrap(), lax_run.join().unwrap().unwrap())
	});

	assert!(strict_report.groups.is_empty());
	assert_eq!(lax_report.groups.len(), 1);
}

#[test]
fn test_stats_account_for_every_input() {
	let dir = TempDir::new().unwrap();
	let missing = dir.path().join("gone.png");
	let detector = Detector::new(config(), table(vec![("same", vec![1.0, 1.0])])).unwrap();

	let files = vec![
		FileDescriptor::in_memory("a.png", b"img".to_vec()),
		FileDescriptor::in_memory("b.png", b"img".to_vec()),
		text("c.txt", "same"),
		text("d.txt", "same"),
		text("e.txt", "unknown"),
		FileDescriptor::new("gone.png", 3, Arc::new(PathSource::new(&missing))),
		FileDescriptor::in_memory("a.png", b"img".to_vec()),
	];
	let total = files.len();
	let report = detector.detect(files, &CancelToken::new()).unwrap();

	assert_eq!(report.stats.files_examined + report.stats.files_skipped, total);
	assert_eq!(report.stats.files_skipped, 3);
	assert_eq!(report.stats.exact_groups, 1);
	assert_eq!(report.stats.similar_groups, 1);
	assert_eq!(report.stats.redundant_files, 2);
}

#[test]
fn test_zero_embeddings_never_group_even_at_zero_threshold() {
	let config = DetectorConfig { similarity_threshold: 0.0, ..config() };
	let blank = |_: &str| -> Result<Vec<f32>, EmbeddingError> { Ok(vec![0.0f32, 0.0]) };

	let detector = Detector::new(config, blank).unwrap();
	let report = detector
		.detect(vec![text("a.txt", "one"), text("b.txt", "two")], &CancelToken::new())
		.unwrap();

	assert!(report.groups.is_empty());
	assert!(report.skipped.is_empty());
}

/// Content whose reads hang, then report end of input
#[derive(Debug)]
struct HangingSource;

struct HangingReader;

impl Read for HangingReader {
	fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
		std::thread::sleep(Duration::from_secs(3));
		Ok(0)
	}
}

impl ContentSource for HangingSource {
	fn open(&self) -> io::Result<Box<dyn Read + Send>> {
		Ok(Box::new(HangingReader))
	}
}

#[test]
fn test_hanging_read_is_skipped_after_timeout() {
	let config = DetectorConfig { read_timeout: Some(Duration::from_millis(50)), ..config() };
	let detector = Detector::new(config, table(vec![])).unwrap();

	let start = Instant::now();
	let report = detector
		.detect(
			vec![
				FileDescriptor::new("hung.bin", 0, Arc::new(HangingSource)),
				FileDescriptor::new("hung_sniffed", 0, Arc::new(HangingSource)),
				FileDescriptor::in_memory("ok.bin", b"fine".to_vec()),
			],
			&CancelToken::new(),
		)
		.unwrap();

	assert!(start.elapsed() < Duration::from_secs(2), "run took {:?}", start.elapsed());
	assert_eq!(report.skipped.len(), 2);
	assert!(report.skipped.iter().all(|s| matches!(&s.reason, SkipReason::Io { message } if message.contains("timed out"))));
	assert_eq!(report.skipped[0].id, id("hung.bin"));
	assert_eq!(report.skipped[1].id, id("hung_sniffed"));
}

#[test]
fn test_default_config_bounds_reads() {
	assert!(DetectorConfig::default().read_timeout.is_some());
}
