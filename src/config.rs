//! Configuration module for pong-server.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values, which take
//! precedence over the built-in fixture defaults.

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Which fixture server(s) to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtocolType {
    /// Plain TCP telnet fixture
    Telnet,
    /// Password-authenticated SSH fixture
    Ssh,
    /// Both fixtures side by side
    All,
}

impl ProtocolType {
    pub fn runs_telnet(self) -> bool {
        matches!(self, ProtocolType::Telnet | ProtocolType::All)
    }

    pub fn runs_ssh(self) -> bool {
        matches!(self, ProtocolType::Ssh | ProtocolType::All)
    }
}

/// Command-line arguments for the fixture servers
#[derive(Parser, Debug)]
#[command(name = "pong-server")]
#[command(author = "pong-server authors")]
#[command(version = "0.1.0")]
#[command(about = "Telnet and SSH test servers that answer pong", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Which server(s) to run
    #[arg(short, long, value_enum, default_value_t = ProtocolType::All)]
    pub protocol: ProtocolType,

    /// Address for the telnet server (e.g., 0.0.0.0:2323)
    #[arg(long)]
    pub telnet_listen: Option<String>,

    /// Address for the SSH server (e.g., 0.0.0.0:2222)
    #[arg(long)]
    pub ssh_listen: Option<String>,

    /// Log level (trace, debug, info, warn, error) [default: info]
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub telnet: TelnetSection,
    #[serde(default)]
    pub ssh: SshSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Telnet server configuration
#[derive(Debug, Deserialize)]
pub struct TelnetSection {
    #[serde(default = "default_telnet_listen")]
    pub listen: String,
}

impl Default for TelnetSection {
    fn default() -> Self {
        Self {
            listen: default_telnet_listen(),
        }
    }
}

/// SSH server configuration
#[derive(Debug, Deserialize)]
pub struct SshSection {
    #[serde(default = "default_ssh_listen")]
    pub listen: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    /// Seconds to wait for the client to open a session channel
    #[serde(default = "default_channel_open_timeout")]
    pub channel_open_timeout: u64,
}

impl Default for SshSection {
    fn default() -> Self {
        Self {
            listen: default_ssh_listen(),
            username: default_username(),
            password: default_password(),
            channel_open_timeout: default_channel_open_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_telnet_listen() -> String {
    "0.0.0.0:2323".to_string()
}

fn default_ssh_listen() -> String {
    "0.0.0.0:2222".to_string()
}

fn default_username() -> String {
    "testuser".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_channel_open_timeout() -> u64 {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SSH settings after merging
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub listen: SocketAddr,
    pub username: String,
    pub password: String,
    pub channel_open_timeout: Duration,
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub protocol: ProtocolType,
    pub telnet_listen: SocketAddr,
    pub ssh: SshConfig,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Self::merge(cli, toml_config)
    }

    /// Merge CLI args over TOML values (CLI takes precedence).
    fn merge(cli: CliArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let telnet_listen = cli.telnet_listen.unwrap_or(toml_config.telnet.listen);
        let ssh_listen = cli.ssh_listen.unwrap_or(toml_config.ssh.listen);

        Ok(Config {
            protocol: cli.protocol,
            telnet_listen: parse_addr(&telnet_listen)?,
            ssh: SshConfig {
                listen: parse_addr(&ssh_listen)?,
                username: toml_config.ssh.username,
                password: toml_config.ssh.password,
                channel_open_timeout: Duration::from_secs(toml_config.ssh.channel_open_timeout),
            },
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        })
    }
}

fn parse_addr(addr: &str) -> Result<SocketAddr, ConfigError> {
    addr.parse()
        .map_err(|e| ConfigError::InvalidAddress(addr.to_string(), e))
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    InvalidAddress(String, std::net::AddrParseError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidAddress(addr, e) => {
                write!(f, "Invalid listen address '{addr}': {e}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("pong-server").chain(args.iter().copied()))
    }

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.telnet.listen, "0.0.0.0:2323");
        assert_eq!(config.ssh.listen, "0.0.0.0:2222");
        assert_eq!(config.ssh.username, "testuser");
        assert_eq!(config.ssh.password, "password");
        assert_eq!(config.ssh.channel_open_timeout, 20);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [telnet]
            listen = "127.0.0.1:2424"

            [ssh]
            listen = "127.0.0.1:2223"
            username = "alice"
            password = "secret"
            channel_open_timeout = 5

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.telnet.listen, "127.0.0.1:2424");
        assert_eq!(config.ssh.listen, "127.0.0.1:2223");
        assert_eq!(config.ssh.username, "alice");
        assert_eq!(config.ssh.password, "secret");
        assert_eq!(config.ssh.channel_open_timeout, 5);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str("[ssh]\nusername = \"bob\"\n").unwrap();
        assert_eq!(config.ssh.username, "bob");
        assert_eq!(config.ssh.password, "password");
        assert_eq!(config.telnet.listen, "0.0.0.0:2323");
    }

    #[test]
    fn test_merge_defaults() {
        let config = Config::merge(cli(&[]), TomlConfig::default()).unwrap();
        assert_eq!(config.protocol, ProtocolType::All);
        assert_eq!(config.telnet_listen, "0.0.0.0:2323".parse().unwrap());
        assert_eq!(config.ssh.listen, "0.0.0.0:2222".parse().unwrap());
        assert_eq!(config.ssh.channel_open_timeout, Duration::from_secs(20));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml_config: TomlConfig = toml::from_str(
            "[telnet]\nlisten = \"127.0.0.1:1000\"\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        let args = cli(&[
            "--protocol",
            "telnet",
            "--telnet-listen",
            "127.0.0.1:2000",
            "--log-level",
            "trace",
        ]);

        let config = Config::merge(args, toml_config).unwrap();
        assert_eq!(config.protocol, ProtocolType::Telnet);
        assert_eq!(config.telnet_listen, "127.0.0.1:2000".parse().unwrap());
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_cli_info_log_level_overrides_toml() {
        let toml_config: TomlConfig = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();

        let config = Config::merge(cli(&["--log-level", "info"]), toml_config).unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_toml_log_level_without_cli_flag() {
        let toml_config: TomlConfig = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();

        let config = Config::merge(cli(&[]), toml_config).unwrap();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_address() {
        let err = Config::merge(cli(&["--ssh-listen", "not-an-addr"]), TomlConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress(ref a, _) if a == "not-an-addr"));
    }

    #[test]
    fn test_protocol_selection() {
        assert!(ProtocolType::All.runs_telnet());
        assert!(ProtocolType::All.runs_ssh());
        assert!(ProtocolType::Telnet.runs_telnet());
        assert!(!ProtocolType::Telnet.runs_ssh());
        assert!(!ProtocolType::Ssh.runs_telnet());
    }
}
