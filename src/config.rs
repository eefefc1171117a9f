//! Configuration management for the Google Workspace MCP Server
//!
//! Handles paths, environment variables, and configuration loading.

use std::path::PathBuf;

use crate::error::{ConfigError, Result, WorkspaceMcpError};

/// Configuration for the Google Workspace MCP Server
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for storing configuration files
    pub config_dir: PathBuf,

    /// Path to OAuth keys file (client credentials)
    pub oauth_path: PathBuf,

    /// Path to stored credentials (access/refresh tokens)
    pub credentials_path: PathBuf,

    /// OAuth callback URL
    pub oauth_callback_url: String,

    /// Port of the auth portal and OAuth callback
    pub oauth_callback_port: u16,

    /// Google API scopes
    pub scopes: Vec<String>,

    /// Time zone attached to created calendar events
    pub time_zone: String,

    /// Base URLs of the Google API surfaces
    pub endpoints: ApiEndpoints,
}

impl Config {
    /// Create a new configuration with default paths
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;

        let oauth_path = std::env::var("GWS_MCP_OAUTH_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir.join("gcp-oauth.keys.json"));

        let credentials_path = std::env::var("GWS_MCP_CREDENTIALS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir.join("credentials.json"));

        let oauth_callback_port = match std::env::var("GWS_MCP_PORT") {
            Ok(value) => value.parse().map_err(|_| {
                WorkspaceMcpError::Config(ConfigError::InvalidEnvVar {
                    var: "GWS_MCP_PORT".to_string(),
                    value,
                })
            })?,
            Err(_) => 3000,
        };

        let oauth_callback_url = format!("http://localhost:{}/oauth2callback", oauth_callback_port);

        let time_zone = std::env::var("GWS_MCP_TIME_ZONE")
            .unwrap_or_else(|_| google::DEFAULT_TIME_ZONE.to_string());

        Ok(Self {
            config_dir,
            oauth_path,
            credentials_path,
            oauth_callback_url,
            oauth_callback_port,
            scopes: google::SCOPES.iter().map(|s| s.to_string()).collect(),
            time_zone,
            endpoints: ApiEndpoints::from_env(),
        })
    }

    /// Get the configuration directory, creating it if necessary
    fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| {
                WorkspaceMcpError::Config(ConfigError::DirNotFound {
                    path: "~".to_string(),
                })
            })?
            .join(".gg-workspace-mcp");

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|_| {
                WorkspaceMcpError::Config(ConfigError::DirCreationFailed {
                    path: config_dir.display().to_string(),
                })
            })?;
        }

        Ok(config_dir)
    }

    /// Address of the local auth portal
    pub fn portal_url(&self) -> String {
        format!("http://localhost:{}/", self.oauth_callback_port)
    }

    /// Check if OAuth keys file exists
    pub fn oauth_keys_exist(&self) -> bool {
        self.oauth_path.exists()
    }

    /// Check if credentials (tokens) exist
    pub fn credentials_exist(&self) -> bool {
        self.credentials_path.exists()
    }

    /// Try to find OAuth keys in current directory and copy to config dir
    pub fn find_and_copy_oauth_keys(&self) -> Result<bool> {
        let local_oauth = std::env::current_dir()?.join("gcp-oauth.keys.json");

        if local_oauth.exists() && !self.oauth_keys_exist() {
            std::fs::copy(&local_oauth, &self.oauth_path)?;
            return Ok(true);
        }

        Ok(false)
    }
}

/// Base URLs for each Google API surface, without a trailing slash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub gmail: String,
    pub calendar: String,
    pub drive: String,
}

impl ApiEndpoints {
    /// Public Google endpoints, overridable per surface through the environment
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gmail: std::env::var("GWS_MCP_GMAIL_URL").unwrap_or(defaults.gmail),
            calendar: std::env::var("GWS_MCP_CALENDAR_URL").unwrap_or(defaults.calendar),
            drive: std::env::var("GWS_MCP_DRIVE_URL").unwrap_or(defaults.drive),
        }
    }

    /// Point every surface at one host, using the public path layout
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            gmail: format!("{}/gmail/v1", base),
            calendar: format!("{}/calendar/v3", base),
            drive: format!("{}/drive/v3", base),
        }
    }
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            gmail: google::GMAIL_API_BASE_URL.to_string(),
            calendar: google::CALENDAR_API_BASE_URL.to_string(),
            drive: google::DRIVE_API_BASE_URL.to_string(),
        }
    }
}

/// Google API constants
pub mod google {
    /// Base URL for Gmail API
    pub const GMAIL_API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

    /// Base URL for Calendar API
    pub const CALENDAR_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

    /// Base URL for Drive API
    pub const DRIVE_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

    /// User ID for the authenticated user
    pub const USER_ID: &str = "me";

    /// Calendar used for listing and creating events
    pub const CALENDAR_ID: &str = "primary";

    pub const DEFAULT_TIME_ZONE: &str = "Asia/Ho_Chi_Minh";

    pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

    pub const SCOPES: &[&str] = &[
        "https://www.googleapis.com/auth/gmail.modify",
        "https://www.googleapis.com/auth/calendar",
        "https://www.googleapis.com/auth/drive.readonly",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = Config::new();
        assert!(config.is_ok());
    }

    #[test]
    fn test_default_scopes() {
        let config = Config::new().unwrap();
        assert_eq!(config.scopes.len(), 3);
        assert!(config.scopes[0].contains("gmail.modify"));
        assert!(config.scopes.iter().any(|s| s.ends_with("/calendar")));
    }

    #[test]
    fn test_endpoints_with_base() {
        let endpoints = ApiEndpoints::with_base("http://127.0.0.1:8080/");
        assert_eq!(endpoints.gmail, "http://127.0.0.1:8080/gmail/v1");
        assert_eq!(endpoints.calendar, "http://127.0.0.1:8080/calendar/v3");
        assert_eq!(endpoints.drive, "http://127.0.0.1:8080/drive/v3");
    }

    #[test]
    fn test_default_endpoints_are_public_google() {
        let endpoints = ApiEndpoints::default();
        assert!(endpoints.gmail.starts_with("https://gmail.googleapis.com"));
        assert!(endpoints.drive.ends_with("/drive/v3"));
    }
}
