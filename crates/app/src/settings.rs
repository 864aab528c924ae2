//! Handles settings for the application.
//!
//! Settings are read from a TOML file (`settings.toml` unless `--config`
//! says otherwise), then from `EXPENSA_*` environment variables (nested keys
//! use `__`, e.g. `EXPENSA_SERVER__PORT`), then from command line flags.
//! Every key has a default, so the file is optional.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG: &str = "settings.toml";

#[derive(Parser, Debug)]
#[command(name = "expensa")]
#[command(about = "Personal expense tracker server")]
pub struct Cli {
    /// Settings file.
    #[arg(long, env = "EXPENSA_CONFIG", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Overrides `server.port`.
    #[arg(long)]
    pub port: Option<u16>,

    /// Overrides `app.level` (`trace`, `debug`, `info`, `warn`, `error`).
    #[arg(long)]
    pub level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Register a user able to log in with Basic auth.
    AddUser(AddUserArgs),
}

#[derive(Args, Debug)]
pub struct AddUserArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long, env = "EXPENSA_PASSWORD")]
    pub password: String,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    #[serde(default)]
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub root: PathBuf,
    /// Defaults to `http://{bind}:{port}/attachments`.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Display {
    pub page_size: usize,
    pub page_siblings: usize,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub storage: Storage,
    pub display: Display,
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self, SettingsError> {
        let explicit = cli.config.as_os_str() != DEFAULT_CONFIG;
        let settings: Settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("server.bind", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("storage.root", "./attachments")?
            .set_default("display.page_size", 10)?
            .set_default("display.page_siblings", 1)?
            .add_source(File::from(cli.config.as_path()).required(explicit))
            .add_source(Environment::with_prefix("EXPENSA").separator("__"))
            .set_override_option("server.port", cli.port.map(i64::from))?
            .set_override_option("app.level", cli.level.clone())?
            .build()?
            .try_deserialize()?;

        if settings.display.page_size == 0 {
            return Err(SettingsError::Invalid(
                "display.page_size must be > 0".to_string(),
            ));
        }
        Ok(settings)
    }

    /// Base URL receipts are served from.
    pub fn public_base_url(&self) -> String {
        self.storage.public_base_url.clone().unwrap_or_else(|| {
            format!("http://{}:{}/attachments", self.server.bind, self.server.port)
        })
    }
}
