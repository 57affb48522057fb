//! Seeker interactive search session.
//!
//! Drives a [`SearchCoordinator`] over an in-process demo source from stdin
//! commands, printing every state change it publishes.

mod demo;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use seeker_coordinator::{
	CoordinatorConfig, FileFreshnessStore, FreshnessStore, ManualConnectivity, MemoryFreshnessStore, NetworkStatus, SearchCoordinator, SearchMode,
	SearchPorts,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::demo::DemoSource;
use crate::repl::{HELP, ReplCommand};

/// Seeker command line arguments.
#[derive(Parser, Debug)]
#[command(name = "seeker")]
#[command(about = "Interactive search session over a simulated network-bound source")]
struct Args {
	/// Query searched at startup
	#[arg(default_value = "")]
	query: String,

	/// Coordinator configuration file (TOML)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Overrides the mode from the configuration file
	#[arg(short, long, value_enum)]
	mode: Option<ModeArg>,

	/// Persist the last successful query here instead of in memory
	#[arg(long, value_name = "PATH")]
	state_file: Option<PathBuf>,

	/// Simulated fetch latency
	#[arg(long, value_name = "MS", default_value_t = 400)]
	latency_ms: u64,

	/// Start disconnected
	#[arg(long)]
	offline: bool,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
	Simple,
	Advanced,
}

impl From<ModeArg> for SearchMode {
	fn from(mode: ModeArg) -> Self {
		match mode {
			ModeArg::Simple => Self::Simple,
			ModeArg::Advanced => Self::Advanced,
		}
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let mut config = match &args.config {
		Some(path) => CoordinatorConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => CoordinatorConfig::default(),
	};
	if let Some(mode) = args.mode {
		config = config.with_mode(mode.into());
	}

	let network = if args.offline {
		ManualConnectivity::offline()
	} else {
		ManualConnectivity::online()
	};
	let freshness: Arc<dyn FreshnessStore> = match &args.state_file {
		Some(path) => Arc::new(FileFreshnessStore::new(path)),
		None => Arc::new(MemoryFreshnessStore::new()),
	};
	let ports = SearchPorts {
		source: Arc::new(DemoSource::new(Duration::from_millis(args.latency_ms))),
		connectivity: Arc::new(network.clone()),
		freshness,
	};

	info!(mode = config.mode.as_str(), query = %args.query, "starting seeker");
	let coordinator = SearchCoordinator::spawn(args.query, ports, &config);
	let printer = repl::spawn_printer(&coordinator);
	println!("{HELP}");

	let result = run_repl(&coordinator, &network).await;

	coordinator.shutdown().await;
	printer.abort();
	result
}

async fn run_repl(coordinator: &SearchCoordinator<Vec<String>>, network: &ManualConnectivity) -> anyhow::Result<()> {
	let mut lines = BufReader::new(tokio::io::stdin()).lines();

	while let Some(line) = lines.next_line().await.context("reading stdin")? {
		let cmd = match ReplCommand::parse(&line) {
			Ok(Some(cmd)) => cmd,
			Ok(None) => continue,
			Err(err) => {
				println!("{err}");
				continue;
			}
		};

		match cmd {
			ReplCommand::Type(text) => coordinator.on_query_changed(text).await?,
			ReplCommand::Search(Some(text)) => coordinator.on_query_submitted(text).await?,
			ReplCommand::Search(None) => coordinator.on_search().await?,
			ReplCommand::Retry => coordinator.retry().await?,
			ReplCommand::Refresh => coordinator.refresh().await?,
			ReplCommand::Clear => coordinator.on_clear().await?,
			ReplCommand::AckWarning => coordinator.acknowledge_empty_query_warning().await?,
			ReplCommand::AckRefresh => coordinator.acknowledge_refresh().await?,
			ReplCommand::Online => network.set(NetworkStatus::Available),
			ReplCommand::Offline => network.set(NetworkStatus::Unavailable),
			ReplCommand::Status => {
				coordinator.flush().await?;
				println!("{}", repl::status_line(coordinator));
			}
			ReplCommand::Help => println!("{HELP}"),
			ReplCommand::Quit => break,
		}
	}

	Ok(())
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::fmt::format::FmtSpan;
	use tracing_subscriber::prelude::*;

	// SEEKER_LOG_DIR redirects logs to a per-process file
	if let Some(log_dir) = std::env::var("SEEKER_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("seeker.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
				if verbose {
					EnvFilter::new("seeker_coordinator=trace,seeker=trace,debug")
				} else {
					EnvFilter::new("seeker_coordinator=debug,seeker=debug,info")
				}
			});

			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_span_events(FmtSpan::CLOSE)
				.with_target(true);

			tracing_subscriber::registry().with(filter).with(file_layer).init();

			tracing::info!(path = ?log_path, "seeker tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_max_level(if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN })
		.init();
}
