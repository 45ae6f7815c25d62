//! Scan command - find duplicate files in a directory

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;

use crate::config::{default_worker_count, DetectorConfig};
use crate::core::{DetectionReport, DuplicateStats, KeepStrategy, MatchMethod, SkipReason};
use crate::models::HashedEmbedder;
use crate::processing::{scan_directory, CancelToken, Detector, ScanFilters};
use crate::ui;

const PREVIEW_COUNT: usize = 10;

/// Options collected from the command line
#[derive(Debug, Clone)]
pub struct ScanOptions {
	pub directory: PathBuf,
	pub recursive: bool,
	pub threshold: f32,
	pub batch_size: usize,
	pub workers: Option<usize>,
	pub keep: KeepStrategy,
	pub dims: usize,
	pub max_size_mb: Option<u64>,
	pub exclude_patterns: Vec<String>,
	pub read_timeout_secs: u64,
	pub export: Option<PathBuf>,
}

impl ScanOptions {
	fn detector_config(&self) -> DetectorConfig {
		DetectorConfig {
			similarity_threshold: self.threshold,
			batch_size: self.batch_size,
			worker_count: self.workers.unwrap_or_else(default_worker_count),
			read_timeout: Some(Duration::from_secs(self.read_timeout_secs)),
			keep_strategy: self.keep,
			..Default::default()
		}
	}
}

#[derive(Debug, Serialize)]
struct ReportExport<'a> {
	version: &'static str,
	generated_at: String,
	directory: String,
	threshold: f32,
	#[serde(flatten)]
	report: &'a DetectionReport,
}

pub fn run(options: &ScanOptions) -> Result<()> {
	let start = Instant::now();
	let dir = &options.directory;

	if !dir.is_dir() {
		anyhow::bail!("Not a directory: {}", dir.display());
	}

	ui::debug(&format!(
		"Starting scan: dir={}, recursive={}, threshold={}, batch_size={}",
		dir.display(),
		options.recursive,
		options.threshold,
		options.batch_size
	));

	let filters = ScanFilters {
		recursive: options.recursive,
		max_size_mb: options.max_size_mb,
		exclude_patterns: options.exclude_patterns.clone(),
	};

	ui::info(&format!("Scanning {}", ui::path_link(dir, 40)));
	let scan = scan_directory(dir, &filters);

	if scan.files.is_empty() {
		ui::warn("No files found");
		return Ok(());
	}

	ui::info(&format!(
		"Checking {} files ({} ignored, {} filtered, {} unreadable)",
		scan.files.len(),
		scan.ignored,
		scan.filtered,
		scan.unreadable
	));

	let embedder = HashedEmbedder::new(options.dims);
	ui::debug(&format!("Embedding dimension: {}D", embedder.dimension()));
	let detector = Detector::new(options.detector_config(), embedder).context("Invalid detector settings")?;

	let cancel = CancelToken::new();
	let handler_token = cancel.clone();
	if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
		ui::debug(&format!("Could not install Ctrl-C handler: {}", e));
	}

	let report = detector.detect(scan.files, &cancel).context("Duplicate detection failed")?;
	let duration = start.elapsed();

	if let Some(export_path) = &options.export {
		return export_report(&report, options, export_path);
	}

	print_report(&report);
	eprintln!("\n{}", format!("Completed in {:.1}s", duration.as_secs_f32()).dimmed());

	Ok(())
}

fn print_report(report: &DetectionReport) {
	if report.groups.is_empty() {
		ui::success("No duplicates found");
	} else {
		ui::success(&format!(
			"{} duplicate groups ({} exact, {} similar)",
			report.stats.total_groups, report.stats.exact_groups, report.stats.similar_groups
		));
	}

	for (i, group) in report.groups.iter().enumerate() {
		let label = match group.method {
			MatchMethod::Exact => "exact".bright_green(),
			MatchMethod::Cosine => format!("{:.1}% similar", group.min_score * 100.0).bright_cyan(),
		};
		eprintln!(
			"\n{} {} ({} files, {})",
			"Group".bright_white(),
			(i + 1).to_string().bright_cyan(),
			group.len(),
			label
		);

		for member in group.members.iter().take(PREVIEW_COUNT) {
			let marker = if *member == group.keep { "keep".bright_green() } else { "dupe".dimmed() };
			eprintln!("  {} {}", format!("[{}]", marker).dimmed(), ui::path_link(Path::new(member.as_str()), 60));
		}
		if group.len() > PREVIEW_COUNT {
			eprintln!("  {}", format!("... and {} more", group.len() - PREVIEW_COUNT).dimmed());
		}

		if group.method == MatchMethod::Cosine && group.len() > 2 {
			ui::debug(&format!("Weakest link: {} <-> {}", group.witness.0, group.witness.1));
		}
	}

	if !report.skipped.is_empty() {
		eprintln!("\n{} ({} files)", "Skipped".bright_yellow(), report.skipped.len());
		for skipped in report.skipped.iter().take(PREVIEW_COUNT) {
			let reason = match &skipped.reason {
				SkipReason::DuplicateIdentity => "listed twice".to_string(),
				other => other.to_string(),
			};
			eprintln!("  {} {}", ui::path_link(Path::new(skipped.id.as_str()), 60), reason.dimmed());
		}
		if report.skipped.len() > PREVIEW_COUNT {
			eprintln!("  {}", format!("... and {} more", report.skipped.len() - PREVIEW_COUNT).dimmed());
		}
	}

	print_summary(&report.stats);
}

fn print_summary(stats: &DuplicateStats) {
	ui::header("Summary");
	eprintln!("  {:<18} {}", "Files examined:".dimmed(), stats.files_examined);
	eprintln!("  {:<18} {}", "Files skipped:".dimmed(), stats.files_skipped);
	eprintln!("  {:<18} {}", "Redundant files:".dimmed(), stats.redundant_files);
	eprintln!(
		"  {:<18} {}",
		"Reclaimable:".dimmed(),
		ui::format_bytes(stats.reclaimable_bytes).bright_green()
	);
}

fn export_report(report: &DetectionReport, options: &ScanOptions, export_path: &Path) -> Result<()> {
	let export = ReportExport {
		version: env!("CARGO_PKG_VERSION"),
		generated_at: chrono::Local::now().to_rfc3339(),
		directory: options.directory.to_string_lossy().into_owned(),
		threshold: options.threshold,
		report,
	};

	let json = serde_json::to_string_pretty(&export).context("Failed to serialize report")?;

	if export_path.to_str() == Some("-") || export_path.as_os_str().is_empty() {
		println!("{}", json);
	} else {
		std::fs::write(export_path, json)
			.with_context(|| format!("Failed to write report to {}", export_path.display()))?;
		ui::success(&format!("Exported to {}", export_path.display()));
	}

	Ok(())
}
