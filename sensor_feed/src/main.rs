use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use sensor_feed::{
    acquisition::AcquisitionMachine,
    cli::{
        commands::{Cli, Commands, FetchArgs},
        params::apply_fetch_args,
        report::render,
    },
    config::FeedConfig,
    io::sink::{DataSink, JsonFileSink},
    models::state::View,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = FeedConfig::load(cli.config.as_deref()).context("failed to load config")?;

    match cli.command {
        Commands::Config => {
            config.validate()?;
            print!("{}", config.to_toml_string()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fetch(args) => fetch(config, args).await,
    }
}

async fn fetch(mut config: FeedConfig, args: FetchArgs) -> Result<ExitCode> {
    apply_fetch_args(&mut config, &args)?;
    let machine =
        AcquisitionMachine::from_config(&config).context("invalid feed configuration")?;

    let mut updates = machine.subscribe();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    machine.start()?;
    let state = loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break machine.state();
                }
                let state = updates.borrow_and_update().clone();
                info!(%state, "Acquisition state");
                if state.is_settled() {
                    break state;
                }
            }
            _ = &mut interrupt => {
                warn!("Interrupted, cancelling fetch");
                machine.cancel();
                break machine.state();
            }
        }
    };

    let view = state.view();
    let text = render(&view, &config.metrics, args.format)?;
    match view {
        View::Chart { series } => {
            println!("{text}");
            if let Some(path) = &args.output {
                let written = JsonFileSink::new(path, config.metrics.clone())
                    .write(series)
                    .await?;
                info!(path = %written.display(), "Saved chart datasets");
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            eprintln!("{text}");
            Ok(ExitCode::FAILURE)
        }
    }
}
