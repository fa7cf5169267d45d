use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use collector_engine::{
    Anonymous, AuthTokenProvider, ClientSettings, EnvToken, Language, StaticToken,
};

use crate::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(
    name = "collector",
    author,
    version,
    about = "Submit a link for extraction and follow the job until it settles",
    long_about = None
)]
pub struct Cli {
    /// Backend API root
    #[arg(
        long,
        global = true,
        env = "COLLECTOR_API_URL",
        default_value = "http://localhost:8000"
    )]
    pub api_url: String,

    /// Bearer token sent with every request
    #[arg(long, global = true, env = "COLLECTOR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Environment variable re-read for a fresh token before every request.
    /// Takes precedence over --token.
    #[arg(long, global = true, value_name = "VAR")]
    pub token_env: Option<String>,

    /// User the backend bills the extraction to
    #[arg(long, global = true, env = "COLLECTOR_USER_ID", default_value = "demo_user")]
    pub user_id: String,

    /// Wait before every status query, in milliseconds
    #[arg(
        long,
        global = true,
        env = "COLLECTOR_POLL_INTERVAL_MS",
        default_value = "2000"
    )]
    pub poll_interval_ms: u64,

    /// Give up on a job that has not settled after this many seconds
    #[arg(
        long,
        global = true,
        env = "COLLECTOR_DEADLINE_SECS",
        default_value = "300"
    )]
    pub deadline_secs: u64,

    /// Where log output goes
    #[arg(long, global = true, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit a URL and wait for the extracted result
    Process {
        url: String,

        /// Output language of the extraction
        #[arg(short, long, default_value = "Auto")]
        language: Language,
    },
    /// Check that the backend is reachable
    Health,
}

impl Cli {
    pub fn settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_url.clone(),
            user_id: self.user_id.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            deadline: Duration::from_secs(self.deadline_secs),
            ..ClientSettings::default()
        }
    }

    pub fn auth(&self) -> Arc<dyn AuthTokenProvider> {
        if let Some(var) = &self.token_env {
            return Arc::new(EnvToken::new(var.clone()));
        }
        let provider: Arc<dyn AuthTokenProvider> = match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Arc::new(StaticToken::new(token)),
            _ => Arc::new(Anonymous),
        };
        provider
    }
}
