//! ALPS language server binary.
//!
//! Speaks LSP over stdin/stdout. Logs go to stderr, or to a file per process when
//! `ALPS_LS_LOG_DIR` is set.

use std::path::PathBuf;

use alps_lsp::{MainLoop, ServerConfig};
use clap::Parser;
use tracing::info;

/// Language server command line arguments.
#[derive(Parser, Debug)]
#[command(name = "alps-language-server", version)]
#[command(about = "Validation and completion for ALPS profiles over LSP")]
struct Args {
	/// Quiet period in milliseconds after the last edit before validating
	#[arg(long, value_name = "MS", default_value_t = ServerConfig::default().validation_debounce_ms)]
	validation_debounce_ms: u64,

	/// Delay in milliseconds between publishing errors and publishing warnings
	#[arg(long, value_name = "MS", default_value_t = ServerConfig::default().warning_delay_ms)]
	warning_delay_ms: u64,

	/// Communicate over stdin/stdout (the only transport; accepted for client compatibility)
	#[arg(long, hide = true)]
	stdio: bool,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let config = ServerConfig {
		validation_debounce_ms: args.validation_debounce_ms,
		warning_delay_ms: args.warning_delay_ms,
		..ServerConfig::default()
	};
	info!(version = env!("CARGO_PKG_VERSION"), stdio = args.stdio, "starting alps-language-server");

	MainLoop::new(config)
		.run_buffered(tokio::io::stdin(), tokio::io::stdout())
		.await?;

	info!("alps-language-server exited");
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("alps_lsp=debug,alps_analysis=debug,info")
			} else {
				EnvFilter::new("alps_lsp=info,alps_analysis=info,warn")
			}
		})
	};

	if let Some(log_dir) = std::env::var("ALPS_LS_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("alps-language-server.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);

			tracing_subscriber::registry()
				.with(filter())
				.with(file_layer)
				.init();

			tracing::info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	// stdout carries the protocol
	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.with_ansi(false)
		.init();
}
