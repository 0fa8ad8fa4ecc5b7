use std::time::Duration;

use clap::Parser;
use pantry_client::generation::{ConfigError, GeminiConfig};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Serve the recipe generator")]
pub struct Args {
    /// The address and optionally port to bind to
    #[clap(long, default_value = "0.0.0.0:3000")]
    pub address: String,

    /// Write logs as JSON lines instead of human-readable text
    #[clap(long)]
    pub json_logs: bool,

    /// Forget a visitor's kitchen after this many minutes without a visit
    #[clap(long, default_value_t = 60)]
    pub session_idle_minutes: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub address: String,
    pub json_logs: bool,
    pub session_idle: Duration,
}

impl Config {
    /// Combine the command line with the environment. Fails if `API_KEY` is missing.
    pub fn load(args: Args) -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig {
                address: args.address,
                json_logs: args.json_logs,
                session_idle: Duration::from_secs(args.session_idle_minutes * 60),
            },
            gemini: GeminiConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_address() {
        let args = Args::parse_from(["pantry-server"]);
        assert_eq!(args.address, "0.0.0.0:3000");
        assert!(!args.json_logs);
        assert_eq!(args.session_idle_minutes, 60);
    }

    #[test]
    fn flags() {
        let args = Args::parse_from(["pantry-server", "--address", "127.0.0.1:8080", "--json-logs"]);
        assert_eq!(args.address, "127.0.0.1:8080");
        assert!(args.json_logs);
    }

    // The only test in this crate that touches the process environment.
    #[test]
    fn load_needs_an_api_key() {
        let args = Args::parse_from(["pantry-server", "--session-idle-minutes", "5"]);

        std::env::remove_var("API_KEY");
        if dotenvy::var("API_KEY").is_err() {
            assert!(matches!(Config::load(args.clone()), Err(ConfigError::MissingApiKey)));
        }

        std::env::set_var("API_KEY", "   ");
        assert!(matches!(Config::load(args.clone()), Err(ConfigError::MissingApiKey)));

        std::env::set_var("API_KEY", "test-key");
        let config = Config::load(args).unwrap();
        assert_eq!(config.gemini.api_key, "test-key");
        assert_eq!(config.server.session_idle, Duration::from_secs(300));
        std::env::remove_var("API_KEY");
    }
}
