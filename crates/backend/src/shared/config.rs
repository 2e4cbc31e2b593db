use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 8000

[database]
path = "data/car_market.db"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. The working directory
/// 3. Falls back to embedded default config
///
/// The `CAR_MARKET_DB` and `CAR_MARKET_PORT` environment variables override
/// the file values afterwards.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = read_config_file()?;
    apply_env_overrides(
        &mut config,
        std::env::var("CAR_MARKET_DB").ok(),
        std::env::var("CAR_MARKET_PORT").ok(),
    )?;
    Ok(config)
}

fn read_config_file() -> anyhow::Result<Config> {
    // Try to find config.toml next to the executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            }
        }
    }

    let cwd_config = Path::new("config.toml");
    if cwd_config.exists() {
        tracing::info!("Loading config from: {}", cwd_config.display());
        let contents = std::fs::read_to_string(cwd_config)?;
        let config: Config = toml::from_str(&contents)?;
        return Ok(config);
    }

    // Fall back to default config
    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

fn apply_env_overrides(
    config: &mut Config,
    db_path: Option<String>,
    port: Option<String>,
) -> anyhow::Result<()> {
    if let Some(path) = db_path {
        if !path.trim().is_empty() {
            config.database.path = path;
        }
    }
    if let Some(port) = port {
        config.server.port = port
            .parse()
            .map_err(|_| anyhow::anyhow!("CAR_MARKET_PORT is not a valid port: {port:?}"))?;
    }
    Ok(())
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    // If absolute path, use as is
    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    // If relative path, resolve it relative to the executable directory
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let resolved_path = exe_dir.join(db_path);
            return Ok(resolved_path);
        }
    }

    // Fallback: use relative to current directory
    Ok(PathBuf::from(db_path_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.path, "data/car_market.db");
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        apply_env_overrides(
            &mut config,
            Some("/app/data/car_market.db".into()),
            Some("9100".into()),
        )
        .unwrap();
        assert_eq!(config.database.path, "/app/data/car_market.db");
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_bad_port_override_is_rejected() {
        let mut config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        let result = apply_env_overrides(&mut config, None, Some("not-a-port".into()));
        assert!(result.is_err());
    }

    #[test]
    fn test_absolute_database_path_is_kept() {
        let mut config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        config.database.path = "/var/lib/car_market/catalog.db".into();
        let path = get_database_path(&config).unwrap();
        assert_eq!(path, PathBuf::from("/var/lib/car_market/catalog.db"));
    }
}
