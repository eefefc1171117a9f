//! Tool registry
//!
//! The immutable, ordered catalog of tool descriptors advertised by
//! `tools/list`. Built once at startup and shared with the dispatcher.

use serde_json::{json, Value};

use crate::mcp::types::Tool;

pub const GET_ACCOUNT_INFO: &str = "get_account_info";
pub const SEND_EMAIL: &str = "send_email";
pub const LIST_CALENDAR_EVENTS: &str = "list_calendar_events";
pub const CREATE_CALENDAR_EVENT: &str = "create_calendar_event";
pub const LIST_DRIVE_FOLDERS: &str = "list_drive_folders";
pub const SEARCH_DRIVE: &str = "search_drive";

/// Names of every registered tool, in catalog order
pub const TOOL_NAMES: [&str; 6] = [
    GET_ACCOUNT_INFO,
    SEND_EMAIL,
    LIST_CALENDAR_EVENTS,
    CREATE_CALENDAR_EVENT,
    LIST_DRIVE_FOLDERS,
    SEARCH_DRIVE,
];

pub const DEFAULT_MAX_RESULTS: u32 = 10;
pub const DEFAULT_DAYS_BACK: f64 = 0.0;
pub const DEFAULT_PARENT_ID: &str = "root";

/// Ordered catalog of tool descriptors
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    time_zone: String,
}

impl ToolRegistry {
    /// Build the catalog. `time_zone` is the zone calendar tools work in.
    pub fn new(time_zone: &str) -> Self {
        let tools = vec![
            tool_def(
                GET_ACCOUNT_INFO,
                "Get the email address of the currently authenticated Google account.",
                json!({"type": "object", "properties": {}}),
            ),
            tool_def(SEND_EMAIL, "Send a simple email via Gmail.", send_email_schema()),
            tool_def(
                LIST_CALENDAR_EVENTS,
                &format!("List events from Google Calendar. Timezone: {}.", time_zone),
                list_calendar_events_schema(),
            ),
            tool_def(
                CREATE_CALENDAR_EVENT,
                &format!(
                    "Create a calendar event. Format: YYYY-MM-DDTHH:MM ({} time).",
                    time_zone
                ),
                create_calendar_event_schema(),
            ),
            tool_def(
                LIST_DRIVE_FOLDERS,
                "List all folders in Google Drive.",
                list_drive_folders_schema(),
            ),
            tool_def(
                SEARCH_DRIVE,
                "Search for files in Google Drive.",
                search_drive_schema(),
            ),
        ];

        Self {
            tools,
            time_zone: time_zone.to_string(),
        }
    }

    /// Zone advertised in the calendar tool descriptions and used for new events
    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }

    /// All descriptors in catalog order
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.clone()
    }

    #[cfg(test)]
    fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.name == name)
    }
}

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

// ==================== Schemas ====================

fn send_email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "to": {
                "type": "string",
                "description": "Recipient email address"
            },
            "subject": {
                "type": "string",
                "description": "Email subject"
            },
            "body": {
                "type": "string",
                "description": "Plain-text email body"
            }
        },
        "required": ["to", "subject", "body"]
    })
}

fn list_calendar_events_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "max_results": {
                "type": "number",
                "default": DEFAULT_MAX_RESULTS
            },
            "days_back": {
                "type": "number",
                "default": 0
            }
        }
    })
}

fn create_calendar_event_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": {"type": "string"},
            "start_time": {
                "type": "string",
                "description": "Start as YYYY-MM-DDTHH:MM"
            },
            "end_time": {
                "type": "string",
                "description": "End as YYYY-MM-DDTHH:MM"
            },
            "description": {
                "type": "string",
                "default": ""
            }
        },
        "required": ["summary", "start_time", "end_time"]
    })
}

fn list_drive_folders_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "parent_id": {
                "type": "string",
                "default": DEFAULT_PARENT_ID
            }
        }
    })
}

fn search_drive_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Drive search query, e.g. name contains 'report'"
            }
        },
        "required": ["query"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(tool: &Tool) -> Vec<&str> {
        tool.input_schema["required"]
            .as_array()
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_catalog_order() {
        let registry = ToolRegistry::new("Asia/Ho_Chi_Minh");
        let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, TOOL_NAMES);
    }

    #[test]
    fn test_list_tools_is_stable() {
        let registry = ToolRegistry::new("UTC");
        assert_eq!(registry.list_tools(), registry.list_tools());
        assert_eq!(registry.list_tools().len(), 6);
    }

    #[test]
    fn test_required_fields() {
        let registry = ToolRegistry::new("UTC");
        assert!(required(registry.get(GET_ACCOUNT_INFO).unwrap()).is_empty());
        assert_eq!(required(registry.get(SEND_EMAIL).unwrap()), ["to", "subject", "body"]);
        assert_eq!(
            required(registry.get(CREATE_CALENDAR_EVENT).unwrap()),
            ["summary", "start_time", "end_time"]
        );
        assert_eq!(required(registry.get(SEARCH_DRIVE).unwrap()), ["query"]);
    }

    #[test]
    fn test_defaults() {
        let registry = ToolRegistry::new("UTC");
        let events = &registry.get(LIST_CALENDAR_EVENTS).unwrap().input_schema;
        assert_eq!(events["properties"]["max_results"]["default"], 10);
        assert_eq!(events["properties"]["days_back"]["default"], 0);

        let create = &registry.get(CREATE_CALENDAR_EVENT).unwrap().input_schema;
        assert_eq!(create["properties"]["description"]["default"], "");

        let folders = &registry.get(LIST_DRIVE_FOLDERS).unwrap().input_schema;
        assert_eq!(folders["properties"]["parent_id"]["default"], "root");
    }

    #[test]
    fn test_descriptions_mention_time_zone() {
        let registry = ToolRegistry::new("Europe/Berlin");
        assert!(registry
            .get(LIST_CALENDAR_EVENTS)
            .unwrap()
            .description
            .contains("Europe/Berlin"));
        assert_eq!(registry.time_zone(), "Europe/Berlin");
    }
}
