use anyhow::Result;
use clap::Parser;

use crate::error::TaigaError;

pub const DEFAULT_API_URL: &str = "https://api.taiga.io/api/v1";
pub const DEFAULT_TOKEN_EXPIRATION: u64 = 86_400;
pub const DEFAULT_HTTP_TIMEOUT: u64 = 30;

/// Ten years; longer lifetimes are rejected
pub const MAX_TOKEN_EXPIRATION: u64 = 10 * 365 * 86_400;

/// Taiga MCP Server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Taiga API base URL
    #[arg(long, env = "TAIGA_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Taiga username or email
    #[arg(short = 'u', long, env = "TAIGA_USERNAME", default_value = "")]
    pub username: String,

    /// Taiga password
    #[arg(short = 'p', long, env = "TAIGA_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Enable debug logging
    #[arg(long, env = "DEBUG")]
    pub debug: bool,

    /// Auth token lifetime in seconds
    #[arg(long, env = "TOKEN_EXPIRATION", default_value = "86400")]
    pub token_expiration: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    // Taiga API
    pub api_url: String,

    // Default credentials, overridable per authenticate call
    pub username: String,
    pub password: String,

    // Token lifetime
    pub token_expiration: u64,

    // HTTP client
    pub http_request_timeout: u64,

    // Debug
    pub debug: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            username: String::new(),
            password: String::new(),
            token_expiration: DEFAULT_TOKEN_EXPIRATION,
            http_request_timeout: DEFAULT_HTTP_TIMEOUT,
            debug: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration with priority: CLI > ENV (.env included) > defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        Ok(Self::from_args(args))
    }

    pub fn from_args(args: CliArgs) -> Self {
        let log_level = if args.debug {
            "debug".to_string()
        } else {
            args.log_level
        };

        Config {
            api_url: normalize_api_url(&args.api_url),
            username: args.username,
            password: args.password,
            token_expiration: args.token_expiration,
            http_request_timeout: args.http_timeout,
            debug: args.debug,
            log_level,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), TaigaError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(TaigaError::Config(format!(
                "TAIGA_API_URL must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }

        if self.token_expiration == 0 || self.token_expiration > MAX_TOKEN_EXPIRATION {
            return Err(TaigaError::Config(format!(
                "TOKEN_EXPIRATION must be between 1 and {} seconds, got {}",
                MAX_TOKEN_EXPIRATION, self.token_expiration
            )));
        }

        if self.http_request_timeout == 0 {
            return Err(TaigaError::Config(
                "HTTP_REQUEST_TIMEOUT must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether default credentials are present in the environment
    pub fn has_default_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Strip surrounding whitespace and trailing slashes so paths can be appended
fn normalize_api_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["taiga-mcp"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn test_normalize_api_url() {
        assert_eq!(
            normalize_api_url("https://api.taiga.io/api/v1/"),
            "https://api.taiga.io/api/v1"
        );
        assert_eq!(
            normalize_api_url("  http://localhost:9000/api/v1//  "),
            "http://localhost:9000/api/v1"
        );
        assert_eq!(normalize_api_url(DEFAULT_API_URL), DEFAULT_API_URL);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "https://api.taiga.io/api/v1");
        assert_eq!(config.token_expiration, 86400);
        assert_eq!(config.http_request_timeout, 30);
        assert!(!config.debug);
        assert!(!config.has_default_credentials());
    }

    #[test]
    fn test_from_args_with_flags() {
        let config = Config::from_args(args(&[
            "--api-url",
            "http://localhost:8000/api/v1/",
            "-u",
            "alice",
            "-p",
            "secret",
            "--token-expiration",
            "60",
        ]));
        assert_eq!(config.api_url, "http://localhost:8000/api/v1");
        assert_eq!(config.username, "alice");
        assert_eq!(config.password, "secret");
        assert_eq!(config.token_expiration, 60);
        assert!(config.has_default_credentials());
    }

    #[test]
    fn test_debug_forces_debug_log_level() {
        let config = Config::from_args(args(&["--debug", "--log-level", "warn"]));
        assert!(config.debug);
        assert_eq!(config.log_level, "debug");

        let config = Config::from_args(args(&["--log-level", "warn"]));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = Config {
            api_url: "ftp://example.com".to_string(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("TAIGA_API_URL"));
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let config = Config {
            token_expiration: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            http_request_timeout: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_token_expiration() {
        let config = Config {
            token_expiration: 10_000_000_000_000,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TaigaError::Config(_)));
        assert!(err.to_string().contains("TOKEN_EXPIRATION"));

        let config = Config {
            token_expiration: MAX_TOKEN_EXPIRATION,
            ..Config::default()
        };
        assert!(config.validate().is_ok());

        let config = Config {
            token_expiration: MAX_TOKEN_EXPIRATION + 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
