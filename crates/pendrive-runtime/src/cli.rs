//! CLI definition using clap derive.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use pendrive_core::DomainMatch;
use pendrive_runtime::config::RuntimeConfig;

#[derive(Parser)]
#[command(name = "pendrive", about = "Pendrive credential client", version)]
pub struct Cli {
    /// Base URL of the credential host
    #[arg(long, global = true, env = "PENDRIVE_HOST_URL", default_value = pendrive_client::DEFAULT_HOST_URL)]
    pub host_url: String,

    /// Fast poll interval in milliseconds
    #[arg(long, global = true, env = "PENDRIVE_POLL_INTERVAL_MS", default_value = "2000")]
    pub poll_interval_ms: u64,

    /// Backstop re-probe interval in seconds
    #[arg(long, global = true, env = "PENDRIVE_BACKSTOP_SECS", default_value = "60")]
    pub backstop_secs: u64,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true, env = "PENDRIVE_REQUEST_TIMEOUT_MS", default_value = "1500")]
    pub request_timeout_ms: u64,

    /// How saved website labels match a page host (suffix|substring)
    #[arg(long, global = true, env = "PENDRIVE_DOMAIN_MATCH", default_value = "suffix")]
    pub domain_match: DomainMatch,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            host_url: self.host_url.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            backstop_interval: Duration::from_secs(self.backstop_secs),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            domain_match: self.domain_match,
        }
        .normalized()
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Watch host availability until interrupted (default)
    Monitor,
    /// Probe the host once and print the report as JSON
    Status,
    /// List saved websites and usernames
    List,
    /// Fill a page snapshot with the matching credential
    Fill(PageOpts),
    /// Save a new credential
    Save(SaveOpts),
    /// Print the login forms found in a page snapshot
    Locate(PageOpts),
}

#[derive(clap::Args)]
pub struct PageOpts {
    /// Page snapshot (JSON)
    #[arg(long)]
    pub page: PathBuf,
}

#[derive(clap::Args)]
pub struct SaveOpts {
    #[arg(long)]
    pub website: String,

    #[arg(long)]
    pub username: String,

    /// Password (prefer the env var to keep it out of shell history)
    #[arg(long, env = "PENDRIVE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_default_config() {
        let cli = Cli::try_parse_from(["pendrive"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.runtime_config(), RuntimeConfig::default());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pendrive",
            "status",
            "--domain-match",
            "substring",
            "--poll-interval-ms",
            "10",
        ])
        .expect("parse");
        let config = cli.runtime_config();
        assert_eq!(config.domain_match, DomainMatch::Substring);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn unknown_domain_policy_is_rejected() {
        assert!(Cli::try_parse_from(["pendrive", "--domain-match", "fuzzy"]).is_err());
    }
}
