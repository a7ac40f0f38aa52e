//! dircfg - directory configuration hot-reload
//!
//! Prints the aggregated contents of a configuration directory each time
//! they change.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::borrow::Cow;
use std::io::Write;

use clap::Parser;
use dircfg::observability::init_tracing;
use dircfg::watcher::{default_diagnostics, scan_async};
use dircfg::{watch_directory_until, Config, Notification, OutputFormat, Result, Snapshot, WatchConfig};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// dircfg - directory configuration hot-reload
#[derive(Parser, Debug)]
#[command(name = "dircfg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the configuration fragments
    #[arg(short, long, env = "DIRCFG_DIR")]
    dir: std::path::PathBuf,

    /// File name suffix selecting fragments (matched exactly, e.g. ".toml")
    #[arg(short, long, env = "DIRCFG_SUFFIX")]
    suffix: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DIRCFG_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "DIRCFG_LOG_JSON")]
    log_json: bool,

    /// How each update is written to stdout
    #[arg(long, value_enum, env = "DIRCFG_FORMAT", default_value_t = OutputFormat::Raw)]
    format: OutputFormat,

    /// Print the current aggregate once and exit
    #[arg(long)]
    once: bool,
}

/// One update, as written by `--format json`.
#[derive(Serialize)]
struct UpdateRecord<'a> {
    fingerprint: String,
    files: Vec<Cow<'a, str>>,
    skipped: Vec<Cow<'a, str>>,
    bytes: usize,
    payload: Cow<'a, str>,
}

impl<'a> From<&'a Snapshot> for UpdateRecord<'a> {
    fn from(snapshot: &'a Snapshot) -> Self {
        Self {
            fingerprint: snapshot.fingerprint().to_hex(),
            files: snapshot.files().iter().map(|f| f.to_string_lossy()).collect(),
            skipped: snapshot.skipped().iter().map(|f| f.to_string_lossy()).collect(),
            bytes: snapshot.payload().len(),
            payload: String::from_utf8_lossy(snapshot.payload()),
        }
    }
}

fn print_snapshot(snapshot: &Snapshot, format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Raw => out.write_all(snapshot.payload())?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut out, &UpdateRecord::from(snapshot))
                .map_err(std::io::Error::from)?;
            out.write_all(b"\n")?;
        }
    }

    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);

    let config = Config {
        watch: WatchConfig::new(cli.dir, cli.suffix),
        log_level: cli.log_level,
        log_json: cli.log_json,
        output: cli.format,
    };

    tracing::debug!(?config, "Configuration loaded");
    config.validate()?;

    if cli.once {
        let snapshot = scan_async(
            config.watch.directory.clone(),
            config.watch.suffix.clone(),
            default_diagnostics(),
        )
        .await?;
        return print_snapshot(&snapshot, config.output);
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down");
            signal_token.cancel();
        }
    });

    tracing::info!(
        "dircfg v{} watching {} for '{}'",
        env!("CARGO_PKG_VERSION"),
        config.watch.directory.display(),
        config.watch.suffix
    );

    let mut updates = watch_directory_until(&config.watch, None, &shutdown)?;

    while let Some(notification) = updates.recv().await {
        match notification {
            Notification::Update(snapshot) => print_snapshot(&snapshot, config.output)?,
            // Already logged by the session's diagnostics.
            Notification::Error(_) => {}
        }
    }

    updates.shutdown().await
}
