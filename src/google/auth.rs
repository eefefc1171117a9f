//! OAuth authentication for Google APIs
//!
//! Handles OAuth 2.0 authentication including:
//! - Loading client credentials
//! - The local auth portal (consent redirect and callback)
//! - Token storage and refresh
//!
//! Tool handlers only see the [`CredentialProvider`] trait and ask it for a
//! fresh [`AuthorizedClient`] on every invocation.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{AuthError, Result, WorkspaceMcpError};

/// Tokens expiring within this many seconds are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 300;

/// Credential handle for one tool invocation
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    access_token: String,
}

impl AuthorizedClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

/// Source of authorized credentials
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Get a credential that is valid right now. May refresh tokens.
    async fn authorized_client(&self) -> Result<AuthorizedClient>;
}

/// OAuth client credentials
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthKeys {
    /// Client ID
    pub client_id: String,

    /// Client secret
    pub client_secret: String,

    /// Auth URI
    pub auth_uri: String,

    /// Token URI
    pub token_uri: String,
}

/// OAuth keys file format (can be "installed" or "web")
#[derive(Debug, Deserialize)]
struct OAuthKeysFile {
    #[serde(alias = "web")]
    installed: Option<OAuthKeys>,
}

/// Stored credentials (tokens)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Access token
    pub access_token: String,

    /// Refresh token
    pub refresh_token: Option<String>,

    /// Token type (usually "Bearer")
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Expiry timestamp (Unix seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,

    /// Scopes
    #[serde(default)]
    pub scope: String,
}

impl StoredCredentials {
    /// Whether the access token expires within the refresh margin
    fn needs_refresh(&self, now: i64) -> bool {
        self.expiry_date
            .map(|expiry| expiry - now < REFRESH_MARGIN_SECS)
            .unwrap_or(false)
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Token response from OAuth token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: Option<i64>,
    #[serde(default)]
    scope: String,
}

impl TokenResponse {
    fn into_credentials(self, fallback_refresh: Option<String>) -> StoredCredentials {
        let now = chrono::Utc::now().timestamp();
        StoredCredentials {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(fallback_refresh),
            token_type: self.token_type,
            expiry_date: self.expires_in.map(|e| now + e),
            scope: self.scope,
        }
    }
}

/// OAuth authenticator
pub struct Authenticator {
    /// Configuration
    config: Config,

    /// HTTP client
    http_client: reqwest::Client,

    /// OAuth client credentials, absent until the keys file is installed
    keys: Option<OAuthKeys>,

    /// Current credentials (tokens)
    credentials: RwLock<Option<StoredCredentials>>,
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// A missing keys file is not an error here; tool calls report it instead.
    pub async fn new(config: Config) -> Result<Self> {
        config.find_and_copy_oauth_keys()?;

        let keys = if config.oauth_keys_exist() {
            Some(Self::load_oauth_keys(&config.oauth_path)?)
        } else {
            tracing::warn!(
                "OAuth keys not found at {}",
                config.oauth_path.display()
            );
            None
        };

        let auth = Self {
            config,
            http_client: reqwest::Client::new(),
            keys,
            credentials: RwLock::new(None),
        };

        if auth.config.credentials_exist() {
            match auth.load_credentials().await {
                Ok(creds) => *auth.credentials.write().await = Some(creds),
                Err(e) => tracing::warn!("Ignoring unreadable stored credentials: {}", e),
            }
        }

        Ok(auth)
    }

    /// Load OAuth keys from file
    fn load_oauth_keys(path: &Path) -> Result<OAuthKeys> {
        let content = std::fs::read_to_string(path)?;
        let keys_file: OAuthKeysFile = serde_json::from_str(&content)?;

        keys_file
            .installed
            .ok_or(WorkspaceMcpError::Auth(AuthError::InvalidKeysFormat))
    }

    fn keys(&self) -> Result<&OAuthKeys> {
        self.keys.as_ref().ok_or_else(|| {
            WorkspaceMcpError::Auth(AuthError::KeysFileNotFound {
                path: self.config.oauth_path.display().to_string(),
            })
        })
    }

    /// Load stored credentials from file
    async fn load_credentials(&self) -> Result<StoredCredentials> {
        let content = tokio::fs::read_to_string(&self.config.credentials_path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save credentials to file
    async fn save_credentials(&self, credentials: &StoredCredentials) -> Result<()> {
        let content = serde_json::to_string_pretty(credentials)?;
        tokio::fs::write(&self.config.credentials_path, content).await?;
        Ok(())
    }

    /// Check if we have credentials
    pub async fn is_authenticated(&self) -> bool {
        self.credentials.read().await.is_some()
    }

    /// Get a valid access token, refreshing if necessary
    pub async fn get_access_token(&self) -> Result<String> {
        let creds = self.credentials.read().await.clone();

        match creds {
            Some(creds) if creds.needs_refresh(chrono::Utc::now().timestamp()) => {
                self.refresh_token(creds).await
            }
            Some(creds) => Ok(creds.access_token),
            None => Err(WorkspaceMcpError::Auth(AuthError::NotAuthorized {
                portal_url: self.config.portal_url(),
            })),
        }
    }

    /// Refresh the access token using the refresh token
    async fn refresh_token(&self, creds: StoredCredentials) -> Result<String> {
        let keys = self.keys()?;
        let refresh_token = creds.refresh_token.ok_or_else(|| {
            WorkspaceMcpError::Auth(AuthError::TokenRefreshFailed {
                message: "No refresh token available".to_string(),
            })
        })?;

        tracing::debug!("Refreshing access token");

        let params = [
            ("client_id", keys.client_id.as_str()),
            ("client_secret", keys.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&keys.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WorkspaceMcpError::Auth(AuthError::TokenRefreshFailed {
                message: text,
            }));
        }

        let token_response: TokenResponse = response.json().await?;
        let new_credentials = token_response.into_credentials(Some(refresh_token));

        self.save_credentials(&new_credentials).await?;
        *self.credentials.write().await = Some(new_credentials.clone());

        Ok(new_credentials.access_token)
    }

    /// Generate the authorization URL
    pub fn generate_auth_url(&self) -> Result<String> {
        let keys = self.keys()?;
        let scopes = self.config.scopes.join(" ");
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            keys.auth_uri,
            urlencoding::encode(&keys.client_id),
            urlencoding::encode(&self.config.oauth_callback_url),
            urlencoding::encode(&scopes)
        ))
    }

    /// Exchange authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> Result<StoredCredentials> {
        let keys = self.keys()?;
        let params = [
            ("client_id", keys.client_id.as_str()),
            ("client_secret", keys.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.oauth_callback_url.as_str()),
        ];

        let response = self
            .http_client
            .post(&keys.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WorkspaceMcpError::Auth(AuthError::TokenExchangeFailed {
                message: text,
            }));
        }

        let token_response: TokenResponse = response.json().await?;
        let credentials = token_response.into_credentials(None);

        self.save_credentials(&credentials).await?;
        *self.credentials.write().await = Some(credentials.clone());

        tracing::info!("Stored new credentials at {}", self.config.credentials_path.display());

        Ok(credentials)
    }

    /// Serve the auth portal until the listener fails.
    ///
    /// `completed` fires after the first successful code exchange.
    async fn serve_portal(
        self: &Arc<Self>,
        completed: Option<oneshot::Sender<()>>,
    ) -> Result<()> {
        let state = Arc::new(PortalState {
            authenticator: Arc::clone(self),
            completed: Mutex::new(completed),
        });

        let app = Router::new()
            .route("/", get(portal_index))
            .route("/oauth2callback", get(oauth_callback))
            .with_state(state);

        let addr = std::net::SocketAddr::from(([127, 0, 0, 1], self.config.oauth_callback_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Auth portal listening on {}", self.config.portal_url());

        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Run the interactive flow in the foreground: open the consent page and
    /// wait for the callback.
    pub async fn authenticate_interactive(self: &Arc<Self>) -> Result<()> {
        let auth_url = self.generate_auth_url()?;
        eprintln!("\nPlease visit this URL to authenticate:");
        eprintln!("{}\n", auth_url);

        if let Err(e) = open::that(&auth_url) {
            eprintln!("Could not open browser automatically: {}", e);
            eprintln!("Please open the URL manually.");
        }

        let (tx, rx) = oneshot::channel::<()>();

        eprintln!(
            "Waiting for authentication callback on port {}...",
            self.config.oauth_callback_port
        );

        tokio::select! {
            result = self.serve_portal(Some(tx)) => {
                result?;
                Err(WorkspaceMcpError::Auth(AuthError::CallbackError {
                    message: "auth portal stopped before a code was received".to_string(),
                }))
            }
            done = rx => {
                done.map_err(|_| WorkspaceMcpError::Auth(AuthError::NoAuthCode))
            }
        }
    }
}

#[async_trait]
impl CredentialProvider for Authenticator {
    async fn authorized_client(&self) -> Result<AuthorizedClient> {
        Ok(AuthorizedClient::new(self.get_access_token().await?))
    }
}

/// Start the auth portal in the background. Failures are logged only.
pub fn start_auth_portal(authenticator: Arc<Authenticator>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = authenticator.serve_portal(None).await {
            tracing::warn!("Auth portal unavailable: {}", e);
        }
    })
}

struct PortalState {
    authenticator: Arc<Authenticator>,
    completed: Mutex<Option<oneshot::Sender<()>>>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
}

async fn portal_index(State(state): State<Arc<PortalState>>) -> Response {
    if state.authenticator.is_authenticated().await {
        return Html("<html><body><h1>Already authorized</h1><p>The MCP server can access your Google account.</p></body></html>")
            .into_response();
    }

    match state.authenticator.generate_auth_url() {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("<html><body><h1>Cannot start authorization</h1><p>{}</p></body></html>", e)),
        )
            .into_response(),
    }
}

async fn oauth_callback(
    State(state): State<Arc<PortalState>>,
    Query(params): Query<CallbackQuery>,
) -> Html<String> {
    let Some(code) = params.code else {
        let reason = params
            .error
            .unwrap_or_else(|| "No authorization code received.".to_string());
        return Html(format!(
            "<html><body><h1>Authentication failed</h1><p>{}</p></body></html>",
            reason
        ));
    };

    match state.authenticator.exchange_code(&code).await {
        Ok(_) => {
            if let Some(tx) = state.completed.lock().await.take() {
                let _ = tx.send(());
            }
            Html("<html><body><h1>Authentication successful!</h1><p>You can close this window.</p></body></html>".to_string())
        }
        Err(e) => {
            tracing::error!("Code exchange failed: {}", e);
            Html(format!(
                "<html><body><h1>Authentication failed</h1><p>{}</p></body></html>",
                e
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn test_config(name: &str) -> Config {
        let dir = std::env::temp_dir().join(format!(
            "gg-workspace-mcp-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        Config {
            oauth_path: dir.join("gcp-oauth.keys.json"),
            credentials_path: dir.join("credentials.json"),
            config_dir: dir,
            oauth_callback_url: "http://localhost:3999/oauth2callback".to_string(),
            oauth_callback_port: 3999,
            scopes: vec!["https://www.googleapis.com/auth/calendar".to_string()],
            time_zone: "UTC".to_string(),
            endpoints: Default::default(),
        }
    }

    fn write_keys(path: &Path) {
        std::fs::write(
            path,
            r#"{"web":{"client_id":"cid","client_secret":"secret","auth_uri":"https://accounts.google.com/o/oauth2/auth","token_uri":"https://oauth2.googleapis.com/token"}}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_oauth_keys_deserialize() {
        let json = r#"{
            "installed": {
                "client_id": "test-client-id",
                "client_secret": "test-secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let keys_file: OAuthKeysFile = serde_json::from_str(json).unwrap();
        assert_eq!(keys_file.installed.unwrap().client_id, "test-client-id");
    }

    #[test]
    fn test_needs_refresh() {
        let creds = StoredCredentials {
            access_token: "t".to_string(),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            expiry_date: Some(1_000),
            scope: String::new(),
        };
        assert!(creds.needs_refresh(800));
        assert!(!creds.needs_refresh(600));

        let no_expiry = StoredCredentials {
            expiry_date: None,
            ..creds
        };
        assert!(!no_expiry.needs_refresh(i64::MAX));
    }

    #[tokio::test]
    async fn test_missing_credentials_point_to_portal() {
        let config = test_config("unauthorized");
        let _ = std::fs::remove_file(&config.credentials_path);
        let auth = Authenticator::new(config).await.unwrap();

        let err = auth.authorized_client().await.unwrap_err();
        assert!(err.to_string().contains("http://localhost:3999/"));
    }

    #[tokio::test]
    async fn test_stored_credentials_are_used() {
        let config = test_config("stored");
        let creds = StoredCredentials {
            access_token: "stored-token".to_string(),
            refresh_token: Some("refresh".to_string()),
            token_type: "Bearer".to_string(),
            expiry_date: None,
            scope: String::new(),
        };
        std::fs::write(
            &config.credentials_path,
            serde_json::to_string(&creds).unwrap(),
        )
        .unwrap();

        let auth = Authenticator::new(config).await.unwrap();
        let client = auth.authorized_client().await.unwrap();
        assert_eq!(client.access_token(), "stored-token");
    }

    #[tokio::test]
    async fn test_generate_auth_url() {
        let config = test_config("auth-url");
        write_keys(&config.oauth_path);
        let auth = Authenticator::new(config).await.unwrap();

        let url = auth.generate_auth_url().unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?client_id=cid"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3999%2Foauth2callback"));
        assert!(url.contains("access_type=offline"));
    }

    #[tokio::test]
    async fn test_auth_url_requires_keys() {
        let config = test_config("no-keys");
        let _ = std::fs::remove_file(&config.oauth_path);
        let auth = Authenticator::new(config).await.unwrap();
        assert!(matches!(
            auth.generate_auth_url(),
            Err(WorkspaceMcpError::Auth(AuthError::KeysFileNotFound { .. }))
        ));
    }
}
