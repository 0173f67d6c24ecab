//! Anomalia - Main Entry Point

use anomalia::cli::{cmd_info, cmd_screen, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anomalia=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Screen {
            data,
            out_dir,
            json,
        } => cmd_screen(&data, &out_dir, json)?,
        Commands::Info { data } => cmd_info(&data)?,
    }

    Ok(())
}
