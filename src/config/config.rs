// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown log format: {} (expected pretty or json)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Title of the main window
    pub window_title: String,

    /// Main window size in pixels
    pub window_width: u32,
    pub window_height: u32,

    /// Page loaded by the presentation surface
    pub entry_page: String,

    /// Bridge bind address (e.g., "127.0.0.1:7878")
    pub bridge_bind: SocketAddr,

    /// Browser origins allowed to open the bridge, besides native surfaces
    pub allowed_origins: Vec<String>,

    /// Base directory for relative destination paths
    pub download_dir: PathBuf,

    /// Refuse destinations outside `download_dir`
    pub confine_downloads: bool,

    /// Refuse sources on loopback or private networks
    pub block_private_hosts: bool,

    /// User-Agent header for downloads; reqwest sends none by default
    pub user_agent: Option<String>,

    /// Terminate when the last window closes
    pub quit_on_last_window_closed: bool,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!("{} must be a boolean, got '{}'", key, value)),
    }
}

impl Config {
    /// Load configuration from TOML file with environment variable overrides
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as `load`, reading variables through `var`
    pub fn load_with(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let config_path = var("DISTRO_SHELL_CONFIG").unwrap_or_else(|| "config.toml".to_string());

        let mut config: Config = if std::path::Path::new(&config_path).exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path))?;
            toml::from_str(&contents).with_context(|| format!("Failed to parse {}", config_path))?
        } else {
            // Use default configuration
            Config::default()
        };

        // Apply environment variable overrides
        if let Some(val) = var("DISTRO_SHELL_WINDOW_TITLE") {
            config.window_title = val;
        }
        if let Some(val) = var("DISTRO_SHELL_WINDOW_WIDTH") {
            config.window_width = val.parse().context("DISTRO_SHELL_WINDOW_WIDTH")?;
        }
        if let Some(val) = var("DISTRO_SHELL_WINDOW_HEIGHT") {
            config.window_height = val.parse().context("DISTRO_SHELL_WINDOW_HEIGHT")?;
        }
        if let Some(val) = var("DISTRO_SHELL_ENTRY_PAGE") {
            config.entry_page = val;
        }
        if let Some(val) = var("DISTRO_SHELL_BRIDGE_BIND") {
            config.bridge_bind = SocketAddr::from_str(&val).context("DISTRO_SHELL_BRIDGE_BIND")?;
        }
        if let Some(val) = var("DISTRO_SHELL_ALLOWED_ORIGINS") {
            config.allowed_origins = val
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(val) = var("DISTRO_SHELL_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(val);
        }
        if let Some(val) = var("DISTRO_SHELL_CONFINE_DOWNLOADS") {
            config.confine_downloads = parse_bool("DISTRO_SHELL_CONFINE_DOWNLOADS", &val)?;
        }
        if let Some(val) = var("DISTRO_SHELL_BLOCK_PRIVATE_HOSTS") {
            config.block_private_hosts = parse_bool("DISTRO_SHELL_BLOCK_PRIVATE_HOSTS", &val)?;
        }
        if let Some(val) = var("DISTRO_SHELL_USER_AGENT") {
            config.user_agent = Some(val);
        }
        if let Some(val) = var("DISTRO_SHELL_QUIT_ON_LAST_WINDOW_CLOSED") {
            config.quit_on_last_window_closed = parse_bool("DISTRO_SHELL_QUIT_ON_LAST_WINDOW_CLOSED", &val)?;
        }
        if let Some(val) = var("DISTRO_SHELL_LOG_LEVEL") {
            config.log_level = val;
        }
        if let Some(val) = var("DISTRO_SHELL_LOG_FORMAT") {
            config.log_format = val.parse()?;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_title: String::from("Distro Shell"),
            window_width: 1920,
            window_height: 1080,
            entry_page: String::from("index.html"),
            bridge_bind: SocketAddr::from(([127, 0, 0, 1], 7878)),
            allowed_origins: Vec::new(),
            download_dir: PathBuf::from("."),
            confine_downloads: false,
            block_private_hosts: false,
            user_agent: None,
            // macOS apps stay resident without windows
            quit_on_last_window_closed: !cfg!(target_os = "macos"),
            log_level: String::from("info"),
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::NamedTempFile;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn no_config_file() -> (&'static str, &'static str) {
        ("DISTRO_SHELL_CONFIG", "/nonexistent/distro-shell.toml")
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window_title, "Distro Shell");
        assert_eq!(config.window_width, 1920);
        assert_eq!(config.window_height, 1080);
        assert_eq!(config.entry_page, "index.html");
        assert_eq!(config.bridge_bind, SocketAddr::from_str("127.0.0.1:7878").unwrap());
        assert!(config.allowed_origins.is_empty());
        assert_eq!(config.download_dir, PathBuf::from("."));
        assert!(!config.confine_downloads);
        assert!(!config.block_private_hosts);
        assert_eq!(config.user_agent, None);
        assert_eq!(config.quit_on_last_window_closed, !cfg!(target_os = "macos"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_missing_config_file() {
        let config = Config::load_with(vars(&[no_config_file()])).unwrap();
        assert_eq!(config.window_title, "Distro Shell");
        assert_eq!(config.download_dir, PathBuf::from("."));
    }

    #[test]
    fn test_load_from_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        let config_content = r#"
window_title = "ISO Fetcher"
window_width = 1280
window_height = 720
bridge_bind = "127.0.0.1:9000"
allowed_origins = ["http://localhost:5173"]
download_dir = "/srv/isos"
confine_downloads = true
user_agent = "distro-shell/0.0.1"
quit_on_last_window_closed = false
log_level = "debug"
log_format = "json"
"#;
        fs::write(temp_file.path(), config_content).unwrap();
        let path = temp_file.path().to_str().unwrap();

        let config = Config::load_with(vars(&[("DISTRO_SHELL_CONFIG", path)])).unwrap();
        assert_eq!(config.window_title, "ISO Fetcher");
        assert_eq!(config.window_width, 1280);
        assert_eq!(config.window_height, 720);
        assert_eq!(config.bridge_bind, SocketAddr::from_str("127.0.0.1:9000").unwrap());
        assert_eq!(config.allowed_origins, vec!["http://localhost:5173".to_string()]);
        assert_eq!(config.download_dir, PathBuf::from("/srv/isos"));
        assert!(config.confine_downloads);
        assert_eq!(config.user_agent.as_deref(), Some("distro-shell/0.0.1"));
        assert!(!config.quit_on_last_window_closed);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        // unspecified fields keep their defaults
        assert_eq!(config.entry_page, "index.html");
        assert!(!config.block_private_hosts);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "window_width = \"wide\"").unwrap();
        let path = temp_file.path().to_str().unwrap();

        assert!(Config::load_with(vars(&[("DISTRO_SHELL_CONFIG", path)])).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::load_with(vars(&[
            no_config_file(),
            ("DISTRO_SHELL_WINDOW_TITLE", "From Env"),
            ("DISTRO_SHELL_WINDOW_WIDTH", "1024"),
            ("DISTRO_SHELL_WINDOW_HEIGHT", "768"),
            ("DISTRO_SHELL_ENTRY_PAGE", "app.html"),
            ("DISTRO_SHELL_BRIDGE_BIND", "127.0.0.1:9090"),
            ("DISTRO_SHELL_ALLOWED_ORIGINS", "http://a.local, http://b.local,"),
            ("DISTRO_SHELL_DOWNLOAD_DIR", "/env/downloads"),
            ("DISTRO_SHELL_CONFINE_DOWNLOADS", "yes"),
            ("DISTRO_SHELL_BLOCK_PRIVATE_HOSTS", "1"),
            ("DISTRO_SHELL_USER_AGENT", "env-agent"),
            ("DISTRO_SHELL_QUIT_ON_LAST_WINDOW_CLOSED", "off"),
            ("DISTRO_SHELL_LOG_LEVEL", "trace"),
            ("DISTRO_SHELL_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.window_title, "From Env");
        assert_eq!(config.window_width, 1024);
        assert_eq!(config.window_height, 768);
        assert_eq!(config.entry_page, "app.html");
        assert_eq!(config.bridge_bind, SocketAddr::from_str("127.0.0.1:9090").unwrap());
        assert_eq!(config.allowed_origins, vec!["http://a.local".to_string(), "http://b.local".to_string()]);
        assert_eq!(config.download_dir, PathBuf::from("/env/downloads"));
        assert!(config.confine_downloads);
        assert!(config.block_private_hosts);
        assert_eq!(config.user_agent.as_deref(), Some("env-agent"));
        assert!(!config.quit_on_last_window_closed);
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_env_override_wins_over_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "log_level = \"debug\"\n").unwrap();
        let path = temp_file.path().to_str().unwrap();

        let config = Config::load_with(vars(&[
            ("DISTRO_SHELL_CONFIG", path),
            ("DISTRO_SHELL_LOG_LEVEL", "warn"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_invalid_env_values() {
        assert!(Config::load_with(vars(&[no_config_file(), ("DISTRO_SHELL_WINDOW_WIDTH", "wide")])).is_err());
        assert!(Config::load_with(vars(&[no_config_file(), ("DISTRO_SHELL_BRIDGE_BIND", "nowhere")])).is_err());
        assert!(Config::load_with(vars(&[no_config_file(), ("DISTRO_SHELL_CONFINE_DOWNLOADS", "maybe")])).is_err());
        assert!(Config::load_with(vars(&[no_config_file(), ("DISTRO_SHELL_LOG_FORMAT", "xml")])).is_err());
    }
}
