use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/tally.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Server {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Memory,
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Database {
    pub kind: DatabaseKind,
    pub path: String,
    /// Upper bound of concurrent database round trips.
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Unset means the driver default.
    pub query_timeout_ms: Option<u64>,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            kind: DatabaseKind::Sqlite,
            path: "tally.db".to_string(),
            max_connections: 8,
            acquire_timeout_secs: 8,
            query_timeout_ms: None,
        }
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self.kind {
            DatabaseKind::Memory => "sqlite::memory:".to_string(),
            DatabaseKind::Sqlite => format!("sqlite:{}?mode=rwc", self.path),
        }
    }

    /// Every pooled connection to `sqlite::memory:` opens its own database.
    pub fn effective_max_connections(&self) -> u32 {
        match self.kind {
            DatabaseKind::Memory => 1,
            DatabaseKind::Sqlite => self.max_connections.max(1),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub database: Database,
}

#[derive(Debug, Parser)]
#[command(name = "tally", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the listening port.
    #[arg(long)]
    port: Option<u16>,
}

impl Settings {
    /// Layer the config file, `TALLY_*` environment variables (nested keys
    /// separated by `__`, e.g. `TALLY_SERVER__PORT`) and the command line.
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();

        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings: Settings = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix("TALLY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Some(port) = args.port {
            settings.server.port = port;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_sections() {
        let settings: Settings = Config::builder()
            .add_source(config::File::from_str(
                "[database]\nkind = \"memory\"\nmax_connections = 4\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.address(), "127.0.0.1:3000");
        assert_eq!(settings.database.kind, DatabaseKind::Memory);
        assert_eq!(settings.database.url(), "sqlite::memory:");
        assert_eq!(settings.database.effective_max_connections(), 1);
        assert_eq!(settings.database.acquire_timeout_secs, 8);
        assert_eq!(settings.database.query_timeout_ms, None);
    }

    #[test]
    fn sqlite_url_uses_the_configured_path() {
        let database = Database {
            path: "/var/lib/tally/tally.db".to_string(),
            ..Database::default()
        };
        assert_eq!(database.url(), "sqlite:/var/lib/tally/tally.db?mode=rwc");
        assert_eq!(database.effective_max_connections(), 8);
    }
}
