//! dupesift - find exact and near-duplicate files
//!
//! Binary files are compared by content digest, text files by embedding
//! similarity.

use anyhow::Result;
use clap::{CommandFactory, Parser};

use dupesift::cli::{Cli, Command};
use dupesift::commands::scan::{self, ScanOptions};
use dupesift::ui::{self, Log};

fn main() -> Result<()> {
	let cli = Cli::parse();

	Log::set_verbose(cli.verbose);

	match cli.command {
		Command::Scan {
			directory,
			recursive,
			threshold,
			batch_size,
			workers,
			keep,
			dims,
			max_size_mb,
			exclude_patterns,
			read_timeout_secs,
			export,
		} => {
			if export.is_none() {
				ui::print_logo();
			}
			scan::run(&ScanOptions {
				directory,
				recursive,
				threshold,
				batch_size,
				workers,
				keep,
				dims,
				max_size_mb,
				exclude_patterns,
				read_timeout_secs,
				export,
			})
		}
		Command::Help { subcommand } => {
			let mut cmd = Cli::command();
			match subcommand {
				Some(name) => match cmd.find_subcommand_mut(&name) {
					Some(sub) => sub.print_help()?,
					None => {
						ui::error(&format!("Unknown command: {}", name));
						cmd.print_help()?;
					}
				},
				None => cmd.print_help()?,
			}
			Ok(())
		}
	}
}
