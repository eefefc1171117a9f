//! Google API type definitions
//!
//! These types mirror the Gmail, Calendar and Drive request and response
//! bodies used by the server. Only the fields the tools read or write are
//! modelled; everything else is ignored on deserialization.

use serde::{Deserialize, Serialize};

// ==================== Gmail ====================

/// Gmail profile of the authenticated user (`users.getProfile`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Primary email address
    pub email_address: String,

    /// Total number of messages in the mailbox
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_total: Option<u64>,
}

/// Request body for `messages.send`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// RFC 2822 message, base64url-encoded without padding
    pub raw: String,
}

/// A Gmail message reference returned by `messages.send`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message ID
    pub id: String,

    /// Thread ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

// ==================== Calendar ====================

/// Start or end of a calendar event
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// Timed events: RFC 3339 date-time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,

    /// All-day events: `yyyy-mm-dd`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// IANA time zone name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// The date-time when present, otherwise the all-day date
    pub fn display_value(&self) -> Option<&str> {
        self.date_time.as_deref().or(self.date.as_deref())
    }
}

/// A calendar event as returned by `events.list` and `events.insert`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,

    /// Link to the event in the Calendar web UI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}

/// Response of `events.list`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    /// Events in this page
    #[serde(default)]
    pub items: Vec<Event>,

    /// Next page token (not followed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Request body for `events.insert`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEvent {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

// ==================== Drive ====================

/// A Drive file or folder
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
}

/// Response of `files.list`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Next page token (not followed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

// ==================== Errors ====================

/// Error document returned by Google APIs on failure
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorBody {
    pub error: GoogleErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorDetail {
    #[serde(default)]
    pub code: u16,

    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_prefers_date_time() {
        let start = EventDateTime {
            date_time: Some("2024-01-01T09:00:00+07:00".to_string()),
            date: Some("2024-01-01".to_string()),
            time_zone: None,
        };
        assert_eq!(start.display_value(), Some("2024-01-01T09:00:00+07:00"));

        let all_day = EventDateTime {
            date: Some("2024-01-02".to_string()),
            ..Default::default()
        };
        assert_eq!(all_day.display_value(), Some("2024-01-02"));
    }

    #[test]
    fn test_event_list_without_items() {
        let list: EventList = serde_json::from_str(r#"{"kind":"calendar#events"}"#).unwrap();
        assert!(list.items.is_empty());
    }

    #[test]
    fn test_new_event_serialization() {
        let event = NewEvent {
            summary: "Standup".to_string(),
            description: String::new(),
            start: EventDateTime {
                date_time: Some("2024-01-01T09:00:00".to_string()),
                time_zone: Some("Asia/Ho_Chi_Minh".to_string()),
                ..Default::default()
            },
            end: EventDateTime::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["start"]["dateTime"], "2024-01-01T09:00:00");
        assert_eq!(json["start"]["timeZone"], "Asia/Ho_Chi_Minh");
        assert!(json["start"].get("date").is_none());
    }

    #[test]
    fn test_file_list_deserialization() {
        let json = r#"{"files":[{"id":"1","name":"Docs","webViewLink":"https://drive/1"},{"id":"2","name":"Misc"}]}"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.files.len(), 2);
        assert_eq!(list.files[0].web_view_link.as_deref(), Some("https://drive/1"));
        assert!(list.files[1].web_view_link.is_none());
    }

    #[test]
    fn test_google_error_body() {
        let json = r#"{"error":{"code":403,"message":"Insufficient Permission","status":"PERMISSION_DENIED"}}"#;
        let body: GoogleErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.error.code, 403);
        assert_eq!(body.error.message, "Insufficient Permission");
    }
}
