use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use podlite::logging::{LogOptions, init_logging};
use podlite::runtime::constants::{defaults, tools};
use podlite::runtime::{PodliteOptions, PodliteRuntime, ToolOptions};
use podlite::server;
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "podlite")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Unix socket the CRI services listen on.
    #[arg(long, env = "PODLITE_SOCKET", default_value = defaults::SOCKET_PATH)]
    socket: PathBuf,

    /// Directory holding one OCI bundle per sandbox/container.
    #[arg(long, env = "PODLITE_RUNTIME_ROOT", default_value = defaults::RUNTIME_ROOT)]
    runtime_root: PathBuf,

    /// Directory holding pulled OCI image layouts.
    #[arg(long, env = "PODLITE_IMAGE_ROOT", default_value = defaults::IMAGE_ROOT)]
    image_root: PathBuf,

    /// Image every pod sandbox is created from.
    #[arg(long, env = "PODLITE_SANDBOX_IMAGE", default_value = defaults::SANDBOX_IMAGE)]
    sandbox_image: String,

    /// Low-level OCI runtime binary.
    #[arg(long, env = "PODLITE_RUNC", default_value = tools::RUNC)]
    runc: String,

    /// `--root` state directory passed to the low-level runtime.
    #[arg(long, env = "PODLITE_RUNC_ROOT")]
    runc_root: Option<PathBuf>,

    /// Image copy binary.
    #[arg(long, env = "PODLITE_SKOPEO", default_value = tools::SKOPEO)]
    skopeo: String,

    /// Image unpack binary.
    #[arg(long, env = "PODLITE_UMOCI", default_value = tools::UMOCI)]
    umoci: String,

    /// Kill an external tool invocation after this many seconds.
    #[arg(long, env = "PODLITE_TOOL_TIMEOUT")]
    tool_timeout_secs: Option<u64>,

    /// Check tracked instances against the low-level runtime every N seconds.
    #[arg(long, env = "PODLITE_RECONCILE_INTERVAL")]
    reconcile_interval_secs: Option<u64>,

    /// Also write daily-rotated log files to this directory.
    #[arg(long, env = "PODLITE_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn options(&self) -> PodliteOptions {
        PodliteOptions {
            runtime_root: self.runtime_root.clone(),
            image_root: self.image_root.clone(),
            sandbox_image: self.sandbox_image.clone(),
            socket_path: self.socket.clone(),
            tools: ToolOptions {
                runtime: self.runc.clone(),
                runtime_state_root: self.runc_root.clone(),
                puller: self.skopeo.clone(),
                unpacker: self.umoci.clone(),
            },
            tool_timeout: self.tool_timeout_secs.map(Duration::from_secs),
            reconcile_interval: self.reconcile_interval_secs.map(Duration::from_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&LogOptions {
        log_dir: args.log_dir.clone(),
        ..Default::default()
    })
    .context("Failed to initialize logging")?;

    run(args.options()).await
}

async fn run(options: PodliteOptions) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting podlite");

    let socket_path = options.socket_path.clone();
    let reconcile_interval = options.reconcile_interval;
    let runtime = PodliteRuntime::new(options).context("Failed to create runtime")?;

    if socket_path.exists() {
        std::fs::remove_file(&socket_path)
            .with_context(|| format!("Failed to remove stale socket {}", socket_path.display()))?;
    }
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    runtime
        .ensure_sandbox_image()
        .await
        .with_context(|| format!("Failed to pull sandbox image {}", runtime.options().sandbox_image))?;

    let reconciler = reconcile_interval.map(|interval| {
        let runtime = runtime.clone();
        tokio::spawn(reconcile_loop(runtime, interval))
    });

    let served = server::serve(runtime, &socket_path, shutdown_signal()).await;

    if let Some(handle) = reconciler {
        handle.abort();
    }
    if let Err(e) = std::fs::remove_file(&socket_path) {
        warn!(socket = %socket_path.display(), error = %e, "Failed to remove socket");
    }

    served.context("CRI server failed")?;
    info!("podlite stopped");
    Ok(())
}

async fn reconcile_loop(runtime: PodliteRuntime, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; nothing is tracked yet.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let drifted = runtime.reconcile().await;
        if !drifted.is_empty() {
            warn!(count = drifted.len(), ids = ?drifted, "Tracked instances drifted");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
