#![deny(unsafe_code)]

mod clock;
mod color;
mod constants;
mod ipc;
mod prefs;
mod settings;
mod timefmt;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "arc-clock")]
#[command(version)]
#[command(about = "Borderless desktop clock with hour and minute progress arcs", long_about = None)]
struct Cli {
    /// Run the preferences dialog instead of the clock widget
    #[arg(long)]
    prefs: bool,

    /// Name of the IPC server to report settings changes to
    #[arg(long)]
    ipc_server: Option<String>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let cli = Cli::parse();

    if cli.prefs {
        // Dialog process spawned by the clock; it reports back over IPC
        if let Some(server_name) = cli.ipc_server {
            prefs::run(server_name)
        } else {
            eprintln!("Error: --ipc-server is required for preferences mode");
            std::process::exit(1);
        }
    } else {
        // Default mode: the clock widget itself
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build Tokio runtime")?;
        rt.block_on(clock::run())
    }
}
