//! CEC engine command-line host.
//!
//! Runs the dispatch engine against a line-oriented transport: frames arrive
//! on stdin as hex, transmitted frames leave on stdout.  Useful for scripting
//! scenarios and for replaying bus captures.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ Cli::parse()             -- optional config path, log level override
//!  └─ load_config()            -- TOML file, or defaults
//!  └─ CecBuilder
//!       ├─ DefaultHandler
//!       └─ HistoryLog          (if debug.history_size > 0)
//!  └─ Cec::run()               -- blocking task, ends on EOF or Ctrl-C
//!  └─ history dump             -- debug level
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cec_engine::application::dispatch::CecBuilder;
use cec_engine::application::handlers::DefaultHandler;
use cec_engine::infrastructure::device::stdio::StdioDevice;
use cec_engine::infrastructure::diagnostics::history::HistoryLog;
use cec_engine::infrastructure::storage::config::{load_config, AppConfig};

/// Command-line arguments for the CEC engine host.
#[derive(Debug, Parser)]
#[command(
    name = "cec-engine",
    about = "HDMI-CEC dispatch engine over a line-oriented hex transport",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.  Defaults apply when omitted or
    /// when the file does not exist.
    #[arg(env = "CEC_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level override (`error`, `warn`, `info`, `debug`, `trace`).
    ///
    /// `RUST_LOG` still takes precedence.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.engine.log_level = level;
    }

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    // Logs go to stderr so stdout carries only frames.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.engine.log_level)),
        )
        .init();

    info!("CEC engine starting");

    let identity = config.device.identity()?;
    let device = Arc::new(StdioDevice::new(identity));
    info!(
        "emulating {} at {} ({}), vendor 0x{:06X}",
        identity.device_type,
        identity.physical_address,
        identity.logical_address,
        identity.vendor_id
    );

    // ── Engine ────────────────────────────────────────────────────────────────
    let mut builder = CecBuilder::new(device.clone(), config.engine.osd_name.clone())?;
    builder.add_handler(DefaultHandler);

    let history =
        (config.debug.history_size > 0).then(|| HistoryLog::new(config.debug.history_size));
    if let Some(history) = &history {
        builder.set_listener(history.clone())?;
    }

    let cec = builder.arm();
    let mut engine = tokio::task::spawn_blocking(move || cec.run());

    // ── Ctrl-C / end of input ─────────────────────────────────────────────────
    tokio::select! {
        result = &mut engine => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            device.close();
            engine.await??;
        }
    }

    if let Some(history) = &history {
        debug!("message history ({} entries):", history.len());
        for entry in history.entries() {
            let at = entry
                .time
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            debug!("  {}.{:03} {}", at.as_secs(), at.subsec_millis(), entry.message);
        }
    }

    info!("CEC engine stopped");
    Ok(())
}
