use crate::configuration::Configuration;
use clap::Parser;
use std::path::PathBuf;

/// Command line configuration. `--database-url` falls back to the
/// `DATABASE_URL` environment variable (loaded from `.env` if present).
#[derive(Debug, Clone, Parser)]
pub struct ConfigurationHandler {
    /// Port the HTTP server listens on.
    #[arg(long, default_value = "3000")]
    port: String,

    /// PostgreSQL connection URL. Without it the ledgers are kept in memory
    /// (impersistent).
    #[arg(long)]
    database_url: Option<String>,

    /// Path to the Google service account key file. Without it calendar
    /// mirroring is disabled.
    #[arg(long)]
    calendar_credentials: Option<PathBuf>,

    /// Calendar the mirrored events are written to.
    #[arg(long, default_value = "primary")]
    calendar_id: String,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> String {
        self.port.clone()
    }

    fn database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
    }

    fn calendar_credentials(&self) -> Option<PathBuf> {
        self.calendar_credentials.clone()
    }

    fn calendar_id(&self) -> String {
        self.calendar_id.clone()
    }
}
