//! trustroll - zero-downtime CA rotation for an mTLS gateway

use std::sync::Arc;

use clap::{Parser, Subcommand};
use kube::Client;

use trustroll_common::store::{KubeSecretStore, SecretStore};
use trustroll_common::telemetry::init_logging;
use trustroll_common::{Clock, SystemClock};
use trustroll_operator::events::{KubeEventPublisher, CONTROLLER_NAME};
use trustroll_operator::migrate::mark_all_clients_migrated;
use trustroll_operator::status::collect_status;
use trustroll_operator::watch::watch_rotation_secrets;
use trustroll_operator::{Driver, OperatorArgs};

/// trustroll - keeps a gateway trust chain valid across root CA rotations
#[derive(Parser, Debug)]
#[command(name = "trustroll", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: OperatorArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the Secrets and reconcile continuously (default)
    Run,
    /// Run a single pass and exit; non-zero exit on failure
    ReconcileOnce,
    /// Print the current rotation state as JSON
    Status,
    /// Signal that every client trusts the newest CA
    ///
    /// The next pass collapses the trust bundle to the newest CA only.
    MarkMigrated,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.args.log_config())?;

    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("failed to create Kubernetes client: {}", e))?;
    let store: Arc<dyn SecretStore> = Arc::new(KubeSecretStore::new(client.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let rotation = Arc::new(cli.args.rotation_config());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let driver = Driver::new(
                store,
                clock,
                Arc::new(KubeEventPublisher::new(client.clone(), CONTROLLER_NAME)),
                rotation.clone(),
                cli.args.driver_config(),
            );
            tracing::info!(
                root = %rotation.root_credential,
                bundle = %rotation.trust_bundle,
                gateway = %rotation.gateway_credential,
                "starting trust chain driver"
            );
            driver
                .run(watch_rotation_secrets(client, &rotation), shutdown_signal())
                .await;
            Ok(())
        }
        Commands::ReconcileOnce => {
            let driver = Driver::new(
                store,
                clock,
                Arc::new(KubeEventPublisher::new(client, CONTROLLER_NAME)),
                rotation,
                cli.args.driver_config(),
            );
            let outcome = driver.run_pass().await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Commands::Status => {
            let report = collect_status(store, &rotation).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::MarkMigrated => {
            let outcome = mark_all_clients_migrated(store, clock, &rotation).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
    }
}

/// Resolves on ctrl-c or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
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
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
