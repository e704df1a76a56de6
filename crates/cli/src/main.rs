//! Lexa command-line host.
//!
//! Loads configuration, installs logging, and runs one subcommand against the
//! word-list provider. All backend work happens on the provider's affinity
//! thread.

mod cli;
mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use config::Config;
use lexa_provider::ProviderHost;
use lexa_provider::wordlist::WordListBackend;

fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();
	let (config, config_path) = Config::discover(cli.config.as_deref())?;

	setup_tracing(cli.verbose, config.log.filter.as_deref());
	if let Some(path) = &config_path {
		tracing::debug!(path = %path.display(), "config.load");
	}

	let wordlist = config
		.wordlist_config(cli.dict_dir.as_deref())
		.context("no dictionary directory: pass --dict-dir or set wordlist.dir")?;
	tracing::info!(dir = %wordlist.dir.display(), policy = ?config.dispatcher.setup_policy, "starting lexa");

	let host = ProviderHost::new(config.dispatcher, Arc::new(WordListBackend::new(wordlist)));
	let stdin = std::io::stdin().lock();
	let mut stdout = std::io::stdout().lock();
	let ok = commands::run(&host, cli.command, stdin, &mut stdout)?;

	Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn setup_tracing(verbose: bool, configured: Option<&str>) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::fmt::format::FmtSpan;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| match configured {
			Some(directives) => EnvFilter::new(directives),
			None if verbose => EnvFilter::new("lexa=debug"),
			None => EnvFilter::new("lexa=info"),
		})
	};

	if let Some(log_dir) = std::env::var("LEXA_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("lexa.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_span_events(FmtSpan::CLOSE)
				.with_target(true);

			tracing_subscriber::registry().with(filter()).with(file_layer).init();

			tracing::info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt().with_env_filter(filter()).with_writer(std::io::stderr).init();
}
