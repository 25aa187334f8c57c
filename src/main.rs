use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod diff;
mod discovery;
mod error;
mod informer;
mod selection;
mod watch;

use config::Args;
use diff::DiffOptions;
use error::Error;
use selection::Terminal;

/// Resolves on Ctrl-C, or on SIGTERM when running in a pod.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("unable to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("unable to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("intercepted ctrl-c, shutting down"),
        _ = terminate => info!("intercepted SIGTERM, shutting down"),
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let client = args.client().await?;

    let target = selection::select_resource(args.preset_resource(), &client, &Terminal).await?;

    let options = DiffOptions {
        managed_fields: args.managed_fields,
    };

    watch::watch(client, &target, options, shutdown_signal()).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(args).await {
        error!("{e}");
        std::process::exit(1);
    }
}
