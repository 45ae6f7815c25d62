//! Directory scanning into file descriptors

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::config::IGNORE_FILE;
use crate::core::FileDescriptor;
use crate::ui;

/// Filtering criteria for scanning
#[derive(Debug, Clone, Default)]
pub struct ScanFilters {
	pub recursive: bool,
	pub max_size_mb: Option<u64>,
	pub exclude_patterns: Vec<String>,
}

pub struct ScanResult {
	pub files: Vec<FileDescriptor>,
	pub ignored: usize,
	pub filtered: usize,
	pub unreadable: usize,
}

fn load_ignore_patterns(dir: &Path) -> Vec<String> {
	let Ok(file) = File::open(dir.join(IGNORE_FILE)) else {
		return Vec::new();
	};

	BufReader::new(file)
		.lines()
		.map_while(Result::ok)
		.map(|line| line.trim().to_string())
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.collect()
}

fn is_ignored(path: &Path, patterns: &[String]) -> bool {
	let path_str = path.to_string_lossy().to_lowercase();
	patterns.iter().any(|pattern| path_str.contains(&pattern.to_lowercase()))
}

fn is_hidden(entry: &DirEntry) -> bool {
	entry.depth() > 0 && entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

/// Walk `root` and describe every regular file found, in path order
pub fn scan_directory(root: &Path, filters: &ScanFilters) -> ScanResult {
	let mut patterns = load_ignore_patterns(root);
	patterns.extend(filters.exclude_patterns.iter().filter(|p| !p.is_empty()).cloned());

	let mut files = Vec::new();
	let mut ignored = 0;
	let mut filtered = 0;
	let mut unreadable = 0;

	let max_depth = if filters.recursive { usize::MAX } else { 1 };
	let walker = WalkDir::new(root)
		.max_depth(max_depth)
		.sort_by_file_name()
		.into_iter()
		.filter_entry(|e| !is_hidden(e));

	for entry in walker {
		let entry = match entry {
			Ok(entry) => entry,
			Err(e) => {
				ui::debug(&format!("Walk error: {}", e));
				unreadable += 1;
				continue;
			}
		};
		if !entry.file_type().is_file() {
			continue;
		}

		let path = entry.path();
		if !patterns.is_empty() && is_ignored(path, &patterns) {
			ui::debug(&format!("Ignored: {}", path.display()));
			ignored += 1;
			continue;
		}

		let descriptor = match FileDescriptor::from_path(path) {
			Ok(d) => d,
			Err(e) => {
				ui::warn(&format!("Failed to stat {}: {}", path.display(), e));
				unreadable += 1;
				continue;
			}
		};

		if let Some(max_mb) = filters.max_size_mb {
			let size_mb = descriptor.size() / 1024 / 1024;
			if size_mb > max_mb {
				ui::debug(&format!("Filtered (too large): {} ({}MB)", path.display(), size_mb));
				filtered += 1;
				continue;
			}
		}

		files.push(descriptor);
	}

	ScanResult {
		files,
		ignored,
		filtered,
		unreadable,
	}
}
