//! Service client factory
//!
//! Builds a typed client for one Google API surface from an authorized
//! credential. Clients are constructed fresh for every tool invocation and
//! never cached.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiEndpoints;
use crate::error::{ApiError, Result};
use crate::google::auth::AuthorizedClient;
use crate::google::calendar::CalendarService;
use crate::google::drive::DriveService;
use crate::google::gmail::GmailService;
use crate::google::types::GoogleErrorBody;

/// A Google API surface with its fixed version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Mail,
    Calendar,
    Storage,
}

impl Surface {
    /// API name as used in Google's URL layout
    pub fn api_name(&self) -> &'static str {
        match self {
            Surface::Mail => "gmail",
            Surface::Calendar => "calendar",
            Surface::Storage => "drive",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            Surface::Mail => "v1",
            Surface::Calendar => "v3",
            Surface::Storage => "v3",
        }
    }

    fn base_url<'a>(&self, endpoints: &'a ApiEndpoints) -> &'a str {
        match self {
            Surface::Mail => &endpoints.gmail,
            Surface::Calendar => &endpoints.calendar,
            Surface::Storage => &endpoints.drive,
        }
    }
}

/// Constructs per-invocation service clients
#[derive(Debug, Clone)]
pub struct ServiceClientFactory {
    endpoints: ApiEndpoints,
}

impl ServiceClientFactory {
    pub fn new(endpoints: ApiEndpoints) -> Self {
        Self { endpoints }
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// Build a client for `surface` bound to `credential`. No network call.
    pub fn for_surface(&self, surface: Surface, credential: &AuthorizedClient) -> Result<ServiceClient> {
        tracing::debug!(
            "Building {} {} client",
            surface.api_name(),
            surface.version()
        );

        let http_client = reqwest::Client::builder().build()?;

        Ok(ServiceClient {
            http_client,
            surface,
            base_url: surface
                .base_url(&self.endpoints)
                .trim_end_matches('/')
                .to_string(),
            access_token: credential.access_token().to_string(),
        })
    }

    pub fn gmail(&self, credential: &AuthorizedClient) -> Result<GmailService> {
        Ok(GmailService::new(self.for_surface(Surface::Mail, credential)?))
    }

    pub fn calendar(&self, credential: &AuthorizedClient) -> Result<CalendarService> {
        Ok(CalendarService::new(
            self.for_surface(Surface::Calendar, credential)?,
        ))
    }

    pub fn drive(&self, credential: &AuthorizedClient) -> Result<DriveService> {
        Ok(DriveService::new(self.for_surface(Surface::Storage, credential)?))
    }
}

impl Default for ServiceClientFactory {
    fn default() -> Self {
        Self::new(ApiEndpoints::default())
    }
}

/// Authorized JSON client for a single API surface
pub struct ServiceClient {
    /// HTTP client
    http_client: reqwest::Client,

    surface: Surface,

    base_url: String,

    access_token: String,
}

impl ServiceClient {
    pub fn surface(&self) -> Surface {
        self.surface
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` with query parameters and decode the JSON response
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .http_client
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        Self::read_response(operation, response).await
    }

    /// POST a JSON body to `path` and decode the JSON response
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http_client
            .post(self.url(path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;

        Self::read_response(operation, response).await
    }

    async fn read_response<T: DeserializeOwned>(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            return Ok(response.json().await?);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<GoogleErrorBody>(&text) {
            Ok(body) => body.error.message,
            Err(_) => text,
        };

        tracing::warn!("{} failed with status {}", operation, status);

        Err(ApiError::RequestFailed {
            operation: operation.to_string(),
            status: status.as_u16(),
            message,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_versions() {
        assert_eq!(Surface::Mail.version(), "v1");
        assert_eq!(Surface::Calendar.version(), "v3");
        assert_eq!(Surface::Storage.version(), "v3");
    }

    #[test]
    fn test_default_endpoints_match_surface_versions() {
        let endpoints = ApiEndpoints::default();
        for surface in [Surface::Mail, Surface::Calendar, Surface::Storage] {
            let suffix = format!("/{}/{}", surface.api_name(), surface.version());
            assert!(surface.base_url(&endpoints).ends_with(&suffix));
        }
    }

    #[test]
    fn test_for_surface_binds_base_url() {
        let factory = ServiceClientFactory::new(ApiEndpoints::with_base("http://localhost:9"));
        let credential = AuthorizedClient::new("token");
        let client = factory.for_surface(Surface::Storage, &credential).unwrap();
        assert_eq!(client.surface(), Surface::Storage);
        assert_eq!(client.url("/files"), "http://localhost:9/drive/v3/files");
    }
}
