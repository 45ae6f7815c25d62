use clap::{builder::Styles, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_READ_TIMEOUT_SECS, DEFAULT_SIMILARITY_THRESHOLD, EMBEDDING_DIM};
use crate::core::KeepStrategy;

fn parse_threshold(s: &str) -> Result<f32, String> {
	let val: f32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
	if !(0.0..=1.0).contains(&val) {
		Err(format!("threshold must be between 0.0 and 1.0, got {}", val))
	} else {
		Ok(val)
	}
}

fn parse_positive(s: &str) -> Result<usize, String> {
	let val: usize = s.parse().map_err(|_| format!("'{}' is not a valid count", s))?;
	if val == 0 {
		Err("must be greater than zero".to_string())
	} else {
		Ok(val)
	}
}

fn styles() -> Styles {
	Styles::styled()
		.header(anstyle::Style::new().bold().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Blue))))
		.usage(anstyle::Style::new().bold().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Blue))))
		.literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Blue))))
		.placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))))
		.valid(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Blue))))
		.invalid(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))))
}

#[derive(Parser, Debug)]
#[command(
	name = "dupesift",
	author,
	version,
	about = "Find exact and near-duplicate files",
	styles = styles(),
	disable_help_subcommand = true,
	after_help = format!(
		"{title}
  {bin} {scan}  {scan_args}              {scan_desc}
  {bin} {scan}  {strict_args}  {strict_desc}
  {bin} {scan}  {export_args}      {export_desc}
  {bin} {help}  {help_args}                     {help_desc}",
		title = "Examples:".bright_blue().bold(),
		bin = "dupesift".bright_blue(),
		scan = "scan".yellow(),
		scan_args = "-d ./docs/ -r",
		scan_desc = "Scan recursively".dimmed(),
		strict_args = "-d ./docs/ -t 0.99 --keep newest",
		strict_desc = "Stricter text matching".dimmed(),
		export_args = "-d ./docs/ --export -",
		export_desc = "JSON report to stdout".dimmed(),
		help = "help".yellow(),
		help_args = "scan",
		help_desc = "Show help for scan".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Find duplicate files in a directory
	Scan {
		/// Directory to scan
		#[arg(short = 'd', long = "dir", default_value = ".")]
		directory: PathBuf,

		/// Scan directories recursively
		#[arg(short = 'r', long = "recursive")]
		recursive: bool,

		/// Minimum cosine similarity for text files (0.0-1.0)
		#[arg(short = 't', long = "threshold", env = "DUPESIFT_THRESHOLD", default_value_t = DEFAULT_SIMILARITY_THRESHOLD, value_parser = parse_threshold)]
		threshold: f32,

		/// Text files compared all-pairs per batch
		#[arg(short = 'b', long = "batch-size", env = "DUPESIFT_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE, value_parser = parse_positive)]
		batch_size: usize,

		/// Worker threads (default: all cores)
		#[arg(short = 'j', long = "workers", env = "DUPESIFT_WORKERS", value_parser = parse_positive)]
		workers: Option<usize>,

		/// Which file of each group to recommend keeping
		#[arg(short = 'k', long = "keep", value_enum, default_value_t = KeepStrategy::First)]
		keep: KeepStrategy,

		/// Embedding dimension for text files
		#[arg(long = "dims", default_value_t = EMBEDDING_DIM, value_parser = parse_positive)]
		dims: usize,

		/// Skip files larger than this (MB)
		#[arg(long = "max-size")]
		max_size_mb: Option<u64>,

		/// Skip paths containing these patterns (comma-separated)
		#[arg(long = "exclude", value_delimiter = ',')]
		exclude_patterns: Vec<String>,

		/// Give up on a file after this many seconds of reading
		#[arg(long = "read-timeout", env = "DUPESIFT_READ_TIMEOUT", default_value_t = DEFAULT_READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
		read_timeout_secs: u64,

		/// Write a JSON report to this path ("-" for stdout)
		#[arg(short = 'e', long = "export", value_name = "PATH")]
		export: Option<PathBuf>,
	},

	/// Show help for a subcommand
	Help {
		/// Subcommand name
		subcommand: Option<String>,
	},
}
