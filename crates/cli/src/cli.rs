use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lexa")]
#[command(about = "Spell checking through a thread-affine provider")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Configuration file (defaults to $LEXA_CONFIG, then the user config dir)
	#[arg(long, short = 'c', global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Dictionary directory, overriding the configured one
	#[arg(long, short = 'd', global = true, value_name = "DIR")]
	pub dict_dir: Option<PathBuf>,

	/// Verbose logging
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// List available dictionaries
	List,
	/// Report whether a dictionary exists
	Exists {
		/// Language tag, e.g. en_US
		tag: String,
	},
	/// Check words (read from stdin when none are given)
	Check {
		/// Language tag, e.g. en_US
		tag: String,
		/// Words to check
		words: Vec<String>,
		/// Caller threads checking concurrently
		#[arg(long, short = 'j', default_value = "1")]
		jobs: NonZeroUsize,
	},
	/// Suggest corrections for a word
	Suggest {
		/// Language tag, e.g. en_US
		tag: String,
		/// Misspelled word
		word: String,
	},
	/// Add a word to the personal dictionary
	Add {
		/// Language tag, e.g. en_US
		tag: String,
		/// Word to add
		word: String,
	},
	/// Accept a word for this session only
	Exclude {
		/// Language tag, e.g. en_US
		tag: String,
		/// Word to accept
		word: String,
	},
	/// Record a preferred replacement for a misspelling
	Replace {
		/// Language tag, e.g. en_US
		tag: String,
		/// Misspelled word
		misspelling: String,
		/// Replacement
		correction: String,
	},
}
