use clap::{Parser, Subcommand};
use pve_idle_monitor::{
    ApiError, DEFAULT_CONFIG_PATH, FileConfig, HypervisorApi, HypervisorClient, MonitorResult,
    build_monitor, init_tracing,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Shuts down an idle Proxmox VM through a webhook.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(
        long,
        short,
        env = "PVE_IDLE_MONITOR_CONFIG",
        value_hint = clap::ValueHint::FilePath,
        default_value = DEFAULT_CONFIG_PATH
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the monitor loop until interrupted (default)
    Run,
    /// Poll the VM status once and print it as JSON
    Status,
    /// Ask the hypervisor to start the VM
    Start,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let file_config = match FileConfig::load(&cli.config).await {
        Ok(file_config) => file_config,
        Err(e) => {
            init_tracing("info");
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&file_config.log_level);

    match execute(cli.command.unwrap_or(Command::Run), file_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Exiting");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command, file_config: FileConfig) -> MonitorResult<()> {
    let config = file_config.into_monitor_config()?;
    info!(
        host = %config.host(),
        node = config.node(),
        vm_id = config.vm_id(),
        "Configuration loaded"
    );

    match command {
        Command::Run => {
            let monitor = build_monitor(&config)?;
            let cancellation_token = CancellationToken::new();
            tokio::spawn(cancel_on_signal(cancellation_token.clone()));
            monitor.run(cancellation_token).await;
        }
        Command::Status => {
            let client = HypervisorClient::new(&config)?;
            let sample = client.check_status().await?;
            let json = serde_json::to_string_pretty(&sample)
                .map_err(|e| ApiError::Payload(e.to_string()))?;
            println!("{}", json);
        }
        Command::Start => {
            let client = HypervisorClient::new(&config)?;
            client.start_vm().await?;
            info!(vm_id = config.vm_id(), "VM start requested");
        }
    }
    Ok(())
}

/// Cancels `token` on Ctrl-C or, on Unix, SIGTERM.
async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown signal received, finishing current tick");
    token.cancel();
}
