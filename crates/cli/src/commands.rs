//! Subcommand implementations.
//!
//! Output goes to the given writer so commands run the same under tests.

use std::io::{BufRead, Write};
use std::num::NonZeroUsize;
use std::thread;

use anyhow::Context;
use lexa_provider::{Dictionary, Provider, ProviderHost};

use crate::cli::Command;

/// Runs `command` against a provider from `host`. Returns false when `check`
/// found a misspelled word.
pub fn run(host: &ProviderHost, command: Command, input: impl BufRead, out: &mut impl Write) -> anyhow::Result<bool> {
	let provider = host.create_provider().context("failed to create provider")?;
	tracing::debug!(backend = provider.identify(), "provider ready");

	match command {
		Command::List => {
			for tag in provider.list_dicts()? {
				writeln!(out, "{tag}")?;
			}
		}
		Command::Exists { tag } => {
			writeln!(out, "{}", provider.dictionary_exists(&tag)?)?;
		}
		Command::Check { tag, words, jobs } => {
			let dict = open(&provider, &tag)?;
			let words = if words.is_empty() { read_words(input)? } else { words };
			return check(&dict, &words, jobs, out);
		}
		Command::Suggest { tag, word } => {
			for suggestion in open(&provider, &tag)?.suggest(&word)? {
				writeln!(out, "{suggestion}")?;
			}
		}
		Command::Add { tag, word } => open(&provider, &tag)?.add_to_personal(&word)?,
		Command::Exclude { tag, word } => open(&provider, &tag)?.add_to_exclude(&word)?,
		Command::Replace { tag, misspelling, correction } => open(&provider, &tag)?.store_replacement(&misspelling, &correction)?,
	}
	Ok(true)
}

fn open(provider: &Provider, tag: &str) -> anyhow::Result<Dictionary> {
	provider.request_dict(tag).with_context(|| format!("failed to open dictionary {tag}"))
}

fn read_words(input: impl BufRead) -> anyhow::Result<Vec<String>> {
	let mut words = Vec::new();
	for line in input.lines() {
		let line = line.context("failed to read words from stdin")?;
		words.extend(line.split_whitespace().map(str::to_string));
	}
	Ok(words)
}

/// Checks `words` from `jobs` caller threads sharing `dict`, printing results in input order.
fn check(dict: &Dictionary, words: &[String], jobs: NonZeroUsize, out: &mut impl Write) -> anyhow::Result<bool> {
	let chunk = words.len().div_ceil(jobs.get()).max(1);
	let results = thread::scope(|scope| {
		let callers: Vec<_> = words
			.chunks(chunk)
			.map(|chunk| scope.spawn(move || chunk.iter().map(|word| dict.check(word)).collect::<Result<Vec<_>, _>>()))
			.collect();
		callers
			.into_iter()
			.map(|caller| -> anyhow::Result<Vec<bool>> { Ok(caller.join().map_err(|_| anyhow::anyhow!("check thread panicked"))??) })
			.collect::<anyhow::Result<Vec<_>>>()
	})?;

	let mut all_correct = true;
	for (word, correct) in words.iter().zip(results.into_iter().flatten()) {
		if correct {
			writeln!(out, "{word}: ok")?;
		} else {
			all_correct = false;
			writeln!(out, "{word}: misspelled")?;
		}
	}
	Ok(all_correct)
}
