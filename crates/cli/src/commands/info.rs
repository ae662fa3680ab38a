//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::DispatcherConfig;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize, Debug, PartialEq)]
struct ConfigInfo {
    project_id: String,
    write_key: String,
    base_url: String,
    endpoint: String,
    queue: QueueInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_timeout_ms: Option<u64>,
}

#[derive(Serialize, Debug, PartialEq)]
struct QueueInfo {
    capacity: usize,
    flush_threshold: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

fn build_config_info(config: &DispatcherConfig) -> ConfigInfo {
    ConfigInfo {
        project_id: config.project_id.clone(),
        write_key: config.masked_write_key(),
        base_url: config.base_url.clone(),
        endpoint: config.endpoint(),
        queue: QueueInfo {
            capacity: config.queue_capacity,
            flush_threshold: config.flush_threshold,
        },
        request_timeout_ms: config.request_timeout_ms,
    }
}

fn print_config_info(config: &DispatcherConfig) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Event Batcher Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📍 Destination");
    println!("   ├─ Project: {}", config.project_id);
    println!("   ├─ Write key: {}", config.masked_write_key());
    println!("   └─ Endpoint: {}", config.endpoint());

    println!("\n⚙️  Batching");
    println!("   ├─ Queue capacity: {}", config.queue_capacity);
    println!("   ├─ Flush threshold: {}", config.flush_threshold);
    match config.request_timeout_ms {
        Some(ms) => println!("   └─ Request timeout: {} ms", ms),
        None => println!("   └─ Request timeout: none"),
    }

    println!();
}
