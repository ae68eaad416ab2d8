//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "drain-guard")]
#[command(about = "An HTTP server that drains its connections before exiting")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Milliseconds allowed for graceful shutdown before the process is killed
    #[arg(short = 't', long, env = "DRAIN_FORCE_TIMEOUT_MS", default_value = "60000")]
    pub force_timeout_ms: u64,

    /// Run mode; "development" exits immediately on a termination signal
    #[arg(long, env = "RUN_MODE", default_value = "production")]
    pub run_mode: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Whether signals should skip the grace period entirely
    pub fn is_development(&self) -> bool {
        self.run_mode.eq_ignore_ascii_case("development")
    }

    pub fn drain_config(&self) -> DrainConfig {
        DrainConfig::new(Duration::from_millis(self.force_timeout_ms))
    }
}

/// Settings for the shutdown coordinator and signal bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainConfig {
    /// Time allowed for graceful shutdown before a hard exit
    pub force_timeout: Duration,
}

impl DrainConfig {
    pub const DEFAULT_FORCE_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(force_timeout: Duration) -> Self {
        Self { force_timeout }
    }
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FORCE_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["drain-guard", "--run-mode", "production"]).unwrap();

        assert_eq!(config.address(), "127.0.0.1:8080");
        assert_eq!(config.log_level(), "info");
        assert!(!config.is_development());
    }

    #[test]
    fn test_force_timeout_flag() {
        let config = Config::try_parse_from(["drain-guard", "-t", "2500"]).unwrap();

        assert_eq!(config.drain_config().force_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_development_mode() {
        let config =
            Config::try_parse_from(["drain-guard", "--run-mode", "Development", "-v"]).unwrap();

        assert!(config.is_development());
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn test_default_drain_config() {
        assert_eq!(DrainConfig::default().force_timeout, Duration::from_secs(60));
    }
}
