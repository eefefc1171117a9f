//! MCP tool dispatch
//!
//! Turns a `(name, arguments)` pair into a typed [`ToolCall`], runs it against
//! the Google APIs and wraps the outcome in a [`CallToolResult`].

use std::sync::Arc;
use std::time::Instant;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{json, Number, Value};

use crate::error::{McpError, Result, ValidationError, WorkspaceMcpError};
use crate::google::auth::{AuthorizedClient, CredentialProvider};
use crate::google::calendar::{time_min, wall_clock_time};
use crate::google::services::ServiceClientFactory;
use crate::google::types::NewEvent;
use crate::mcp::format;
use crate::mcp::registry::*;
use crate::mcp::types::{CallToolResult, Tool};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SendEmailArgs {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListCalendarEventsArgs {
    #[serde(default = "default_max_results", deserialize_with = "whole_number")]
    pub max_results: u32,
    #[serde(default = "default_days_back")]
    pub days_back: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateCalendarEventArgs {
    pub summary: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListDriveFoldersArgs {
    #[serde(default = "default_parent_id")]
    pub parent_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchDriveArgs {
    pub query: String,
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

fn default_days_back() -> f64 {
    DEFAULT_DAYS_BACK
}

fn default_parent_id() -> String {
    DEFAULT_PARENT_ID.to_string()
}

/// Accept any JSON number with an integral value, so `5` and `5.0` both decode
fn whole_number<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    let value = match number.as_u64() {
        Some(value) => Some(value),
        None => number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
            .map(|f| f as u64),
    };

    value
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| {
            de::Error::custom(format!(
                "expected a whole number between 0 and {}, got {}",
                u32::MAX,
                number
            ))
        })
}

/// A decoded tool invocation, one variant per registered tool
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    GetAccountInfo,
    SendEmail(SendEmailArgs),
    ListCalendarEvents(ListCalendarEventsArgs),
    CreateCalendarEvent(CreateCalendarEventArgs),
    ListDriveFolders(ListDriveFoldersArgs),
    SearchDrive(SearchDriveArgs),
}

impl ToolCall {
    /// Decode a tool name and its arguments, applying schema defaults
    pub fn parse(name: &str, arguments: Value) -> Result<Self> {
        let arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments
        };

        match name {
            GET_ACCOUNT_INFO => Ok(ToolCall::GetAccountInfo),
            SEND_EMAIL => decode_args(name, arguments).map(ToolCall::SendEmail),
            LIST_CALENDAR_EVENTS => decode_args(name, arguments).map(ToolCall::ListCalendarEvents),
            CREATE_CALENDAR_EVENT => decode_args(name, arguments).map(ToolCall::CreateCalendarEvent),
            LIST_DRIVE_FOLDERS => decode_args(name, arguments).map(ToolCall::ListDriveFolders),
            SEARCH_DRIVE => decode_args(name, arguments).map(ToolCall::SearchDrive),
            _ => Err(McpError::UnknownTool {
                name: name.to_string(),
            }
            .into()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetAccountInfo => GET_ACCOUNT_INFO,
            ToolCall::SendEmail(_) => SEND_EMAIL,
            ToolCall::ListCalendarEvents(_) => LIST_CALENDAR_EVENTS,
            ToolCall::CreateCalendarEvent(_) => CREATE_CALENDAR_EVENT,
            ToolCall::ListDriveFolders(_) => LIST_DRIVE_FOLDERS,
            ToolCall::SearchDrive(_) => SEARCH_DRIVE,
        }
    }
}

fn decode_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| {
        WorkspaceMcpError::from(ValidationError::InvalidArguments {
            tool: tool.to_string(),
            message: e.to_string(),
        })
    })
}

/// Tool handler
pub struct ToolHandler {
    registry: Arc<ToolRegistry>,
    credentials: Arc<dyn CredentialProvider>,
    services: ServiceClientFactory,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(
        registry: Arc<ToolRegistry>,
        credentials: Arc<dyn CredentialProvider>,
        services: ServiceClientFactory,
    ) -> Self {
        Self {
            registry,
            credentials,
            services,
        }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        self.registry.list_tools()
    }

    /// Call a tool by name. Every failure comes back as an error result.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> CallToolResult {
        let started = Instant::now();

        let outcome = match ToolCall::parse(name, arguments) {
            Ok(call) => self.execute(call).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(text) => {
                tracing::info!("Tool {} completed in {:?}", name, started.elapsed());
                CallToolResult::text(text)
            }
            Err(e) => {
                tracing::warn!("Tool {} failed after {:?}: {}", name, started.elapsed(), e);
                CallToolResult::error(format::failure(&e))
            }
        }
    }

    /// Run a decoded tool call and format its result
    pub async fn execute(&self, call: ToolCall) -> Result<String> {
        tracing::debug!("Executing {}", call.name());

        match call {
            ToolCall::GetAccountInfo => {
                let gmail = self.services.gmail(&self.credential().await?)?;
                let profile = gmail.get_profile().await?;
                Ok(format::account_info(&profile))
            }
            ToolCall::SendEmail(args) => {
                let gmail = self.services.gmail(&self.credential().await?)?;
                let message = gmail.send_email(&args.to, &args.subject, &args.body).await?;
                Ok(format::email_sent(&message))
            }
            ToolCall::ListCalendarEvents(args) => {
                let since = time_min(chrono::Utc::now(), args.days_back).ok_or_else(|| {
                    WorkspaceMcpError::from(ValidationError::InvalidArguments {
                        tool: LIST_CALENDAR_EVENTS.to_string(),
                        message: format!("days_back {} is out of range", args.days_back),
                    })
                })?;
                let calendar = self.services.calendar(&self.credential().await?)?;
                let events = calendar.list_events(&since, args.max_results).await?;
                Ok(format::calendar_events(&events.items))
            }
            ToolCall::CreateCalendarEvent(args) => {
                let calendar = self.services.calendar(&self.credential().await?)?;
                let time_zone = self.registry.time_zone();
                let event = NewEvent {
                    summary: args.summary,
                    description: args.description,
                    start: wall_clock_time(&args.start_time, time_zone),
                    end: wall_clock_time(&args.end_time, time_zone),
                };
                let created = calendar.insert_event(&event).await?;
                Ok(format::event_created(&created))
            }
            ToolCall::ListDriveFolders(args) => {
                let drive = self.services.drive(&self.credential().await?)?;
                let folders = drive.list_folders(&args.parent_id).await?;
                Ok(format::drive_folders(&folders.files))
            }
            ToolCall::SearchDrive(args) => {
                let drive = self.services.drive(&self.credential().await?)?;
                let files = drive.search(&args.query).await?;
                Ok(format::drive_files(&files.files))
            }
        }
    }

    async fn credential(&self) -> Result<AuthorizedClient> {
        self.credentials.authorized_client().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthError, WorkspaceMcpError};
    use async_trait::async_trait;

    struct Unauthorized;

    #[async_trait]
    impl CredentialProvider for Unauthorized {
        async fn authorized_client(&self) -> Result<AuthorizedClient> {
            Err(WorkspaceMcpError::Auth(AuthError::NotAuthorized {
                portal_url: "http://localhost:3000/".to_string(),
            }))
        }
    }

    fn handler() -> ToolHandler {
        ToolHandler::new(
            Arc::new(ToolRegistry::new("UTC")),
            Arc::new(Unauthorized),
            ServiceClientFactory::default(),
        )
    }

    #[test]
    fn test_every_registered_name_parses() {
        let args = json!({
            "to": "a@b.com", "subject": "s", "body": "b",
            "summary": "S", "start_time": "2024-01-01T09:00", "end_time": "2024-01-01T10:00",
            "query": "name contains 'x'"
        });
        for name in TOOL_NAMES {
            let call = ToolCall::parse(name, args.clone()).unwrap();
            assert_eq!(call.name(), name);
        }
    }

    #[test]
    fn test_unknown_tool() {
        let err = ToolCall::parse("delete_everything", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Tool not found: delete_everything");
    }

    #[test]
    fn test_defaults_applied() {
        assert_eq!(
            ToolCall::parse(LIST_CALENDAR_EVENTS, Value::Null).unwrap(),
            ToolCall::ListCalendarEvents(ListCalendarEventsArgs {
                max_results: 10,
                days_back: 0.0,
            })
        );
        assert_eq!(
            ToolCall::parse(LIST_DRIVE_FOLDERS, json!({})).unwrap(),
            ToolCall::ListDriveFolders(ListDriveFoldersArgs {
                parent_id: "root".to_string(),
            })
        );

        let create = ToolCall::parse(
            CREATE_CALENDAR_EVENT,
            json!({"summary": "S", "start_time": "2024-01-01T09:00", "end_time": "2024-01-01T10:00"}),
        )
        .unwrap();
        match create {
            ToolCall::CreateCalendarEvent(args) => assert_eq!(args.description, ""),
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[test]
    fn test_max_results_accepts_integral_floats() {
        match ToolCall::parse(LIST_CALENDAR_EVENTS, json!({"max_results": 5.0})).unwrap() {
            ToolCall::ListCalendarEvents(args) => assert_eq!(args.max_results, 5),
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[test]
    fn test_max_results_rejects_fractions_and_negatives() {
        for value in [json!(2.5), json!(-1), json!(1e12), json!("5")] {
            let err = ToolCall::parse(LIST_CALENDAR_EVENTS, json!({"max_results": value}))
                .unwrap_err();
            assert!(err.to_string().contains("list_calendar_events"), "{}", err);
        }
    }

    #[tokio::test]
    async fn test_days_back_out_of_range_is_a_failure_result() {
        for days_back in [1e9, -1e9, 1e300] {
            let result = handler()
                .call_tool(LIST_CALENDAR_EVENTS, json!({"days_back": days_back}))
                .await;
            assert!(result.is_error);
            assert_eq!(result.content.len(), 1);
            assert!(result.text_content().contains("days_back"));
        }
    }

    #[test]
    fn test_missing_required_argument() {
        let err = ToolCall::parse(SEND_EMAIL, json!({"to": "a@b.com", "subject": "Hi"})).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("send_email"));
        assert!(message.contains("body"));
    }

    #[tokio::test]
    async fn test_unknown_tool_result() {
        let result = handler().call_tool("anything-not-registered", json!({})).await;
        assert!(result.is_error);
        assert_eq!(result.content.len(), 1);
        assert!(result.text_content().contains("not found"));
    }

    #[tokio::test]
    async fn test_credential_failure_is_wrapped() {
        let handler = handler();
        for name in TOOL_NAMES {
            let args = json!({
                "to": "a@b.com", "subject": "s", "body": "b",
                "summary": "S", "start_time": "2024-01-01T09:00", "end_time": "2024-01-01T10:00",
                "query": "q"
            });
            let result = handler.call_tool(name, args).await;
            assert!(result.is_error, "{} should fail without credentials", name);
            assert!(result.text_content().starts_with("Error: "));
            assert!(result.text_content().contains("Not authorized"));
        }
    }

    #[tokio::test]
    async fn test_list_tools_matches_registry() {
        let handler = handler();
        let names: Vec<String> = handler.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, TOOL_NAMES);
    }
}
