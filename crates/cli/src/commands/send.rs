//! `send` command implementation.

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use contracts::{DispatcherConfig, Event};
use dispatcher::{Dispatcher, DispatcherBuilder};

use crate::cli::SendArgs;

/// Counters for the input side of a run
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct InputStats {
    pub lines: u64,
    pub queued: u64,
    pub skipped: u64,
}

/// Execute the `send` command
pub async fn run_send(args: &SendArgs) -> Result<()> {
    let config = resolve_config(args)?;

    info!(
        endpoint = %config.endpoint(),
        queue_capacity = config.queue_capacity,
        flush_threshold = config.flush_threshold,
        dry_run = args.dry_run,
        "Configuration loaded"
    );

    let dispatcher = DispatcherBuilder::new(config)
        .dry_run(args.dry_run)
        .build()
        .context("Failed to start dispatcher")?;

    let lines = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            read_file(file)
        }
        None => read_stdin()?,
    };

    // Ctrl+C stops reading; whatever is already queued is still flushed.
    let mut input_stats = InputStats::default();
    let read_result = tokio::select! {
        result = pump(lines, &dispatcher, args.category.as_deref(), &mut input_stats) => result,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, flushing queued events...");
            Ok(())
        }
    };

    let report = dispatcher
        .close()
        .await
        .context("Dispatcher did not shut down cleanly")?;

    info!(
        lines = input_stats.lines,
        queued = input_stats.queued,
        skipped = input_stats.skipped,
        sent = report.metrics.sent_count,
        lost = report.metrics.lost_count,
        "Send finished"
    );
    println!("{}", report.summary);

    read_result
}

/// Load the config file (if present) and apply command-line overrides
pub(crate) fn resolve_config(args: &SendArgs) -> Result<DispatcherConfig> {
    let mut config = if args.config.exists() {
        config_loader::ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
    } else {
        match (&args.project_id, &args.write_key) {
            (Some(project_id), Some(write_key)) => DispatcherConfig::new(project_id, write_key),
            _ => anyhow::bail!(
                "Configuration file not found: {} (or pass --project-id and --write-key)",
                args.config.display()
            ),
        }
    };

    if let Some(ref project_id) = args.project_id {
        config.project_id = project_id.clone();
    }
    if let Some(ref write_key) = args.write_key {
        config.write_key = write_key.clone();
    }
    if let Some(ref base_url) = args.base_url {
        info!(base_url = %base_url, "Overriding base URL from CLI");
        config.base_url = base_url.clone();
    }
    if let Some(capacity) = args.queue_capacity {
        config.queue_capacity = capacity;
    }
    if let Some(threshold) = args.flush_threshold {
        config.flush_threshold = threshold;
    }

    config_loader::ConfigLoader::validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Input lines in arrival order; a read error ends the stream
type Lines = mpsc::Receiver<io::Result<String>>;

/// Lines buffered between the reader and the dispatcher
const LINE_BUFFER: usize = 256;

/// Read stdin on a detached OS thread
///
/// A blocked stdin read cannot be cancelled, so it must not live on the
/// runtime's blocking pool: runtime shutdown would wait for it.
fn read_stdin() -> Result<Lines> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })
        .context("Failed to start stdin reader")?;
    Ok(rx)
}

fn read_file(file: tokio::fs::File) -> Lines {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    tokio::spawn(forward_lines(BufReader::new(file), tx));
    rx
}

async fn forward_lines<R: AsyncBufRead + Unpin>(reader: R, tx: mpsc::Sender<io::Result<String>>) {
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => Ok(line),
            Ok(None) => break,
            Err(e) => Err(e),
        };
        let failed = line.is_err();
        if tx.send(line).await.is_err() || failed {
            break;
        }
    }
}

/// Enqueue every parseable line; bad lines are logged and skipped
///
/// `stats` is updated as lines arrive, so it stays accurate when the
/// caller stops this future early.
async fn pump(
    mut lines: Lines,
    dispatcher: &Dispatcher,
    category: Option<&str>,
    stats: &mut InputStats,
) -> Result<()> {
    while let Some(line) = lines.recv().await {
        let line = line.context("Failed to read input")?;
        stats.lines += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line, category) {
            Ok(event) => {
                dispatcher.enqueue(event.category, event.payload).await;
                stats.queued += 1;
            }
            Err(e) => {
                stats.skipped += 1;
                warn!(line = stats.lines, error = %e, "Skipping malformed input line");
            }
        }
    }

    Ok(())
}

/// Parse one input line into an event
///
/// With a fixed category the whole line is the payload; otherwise the line
/// must be `{"category": "...", "payload": ...}`.
pub(crate) fn parse_line(line: &str, category: Option<&str>) -> Result<Event> {
    match category {
        Some(category) => {
            let payload: Value = serde_json::from_str(line).context("invalid JSON payload")?;
            Ok(Event::new(category, payload))
        }
        None => serde_json::from_str(line).context("expected {\"category\": ..., \"payload\": ...}"),
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
