//! pendrive: credential client binary.
//! Runs the background monitor or a one-shot command against the host.

use clap::Parser;

mod cli;
mod cmd_fill;
mod cmd_monitor;
mod cmd_save;
mod cmd_status;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("PENDRIVE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = args.runtime_config();
    match args.command.unwrap_or(cli::Command::Monitor) {
        cli::Command::Monitor => cmd_monitor::cmd_monitor(&config).await?,
        cli::Command::Status => cmd_status::cmd_status(&config).await?,
        cli::Command::List => cmd_status::cmd_list(&config).await?,
        cli::Command::Fill(opts) => cmd_fill::cmd_fill(&config, &opts.page).await?,
        cli::Command::Locate(opts) => cmd_fill::cmd_locate(&opts.page)?,
        cli::Command::Save(opts) => {
            cmd_save::cmd_save(&config, &opts.website, &opts.username, &opts.password).await?;
        }
    }
    Ok(())
}
