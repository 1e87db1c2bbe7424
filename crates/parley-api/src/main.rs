//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, initializes tracing, the database and services,
//! then dispatches to the appropriate command handler or starts the REST
//! API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{AccountCommand, Cli, Commands, PersonaCommand};
use parley_infra::config::load_generation_api_key;
use parley_observe::tracing_setup::{init_tracing, shutdown_tracing};
use state::{ApiState, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_filter(), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Account { action } => match action {
            AccountCommand::Create { handle, name } => {
                cli::account::create_account(&state, handle, name, cli.json).await?;
            }
        },

        Commands::Persona { action } => match action {
            PersonaCommand::Seed => {
                cli::persona::seed_personas(&state, cli.json).await?;
            }
            PersonaCommand::Create {
                name,
                description,
                personality,
                style,
                background,
                owner,
            } => {
                let args = cli::persona::CreatePersonaArgs {
                    name,
                    description,
                    personality,
                    style,
                    background,
                    owner,
                };
                cli::persona::create_persona(&state, args, cli.json).await?;
            }
            PersonaCommand::List => {
                cli::persona::list_personas(&state, cli.json).await?;
            }
        },

        Commands::Serve { port, host } => {
            // The generation credential must be present before we accept traffic.
            let api_key = load_generation_api_key()?;
            let api_state = ApiState::new(state, api_key)?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!(
                %addr,
                data_dir = %api_state.app.data_dir.display(),
                backend = %api_state.app.config.generation.base_url,
                model = %api_state.app.config.generation.model,
                "Parley API listening"
            );
            if !cli.quiet {
                println!(
                    "  {} Parley API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}/api/v1")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(api_state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
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
                tracing::error!("failed to install SIGTERM handler: {e}");
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

    tracing::info!("Shutdown signal received");
}
