//! Response formatting
//!
//! Pure functions turning Google API results into the single text block
//! returned by each tool.

use std::fmt::Display;

use crate::google::types::{DriveFile, Event, Message, Profile};

pub const NO_EVENTS: &str = "No events found.";
pub const NO_FOLDERS: &str = "No folders found.";
pub const NO_FILES: &str = "No files found.";

/// Text of a failed invocation
pub fn failure(error: impl Display) -> String {
    format!("Error: {}", error)
}

pub fn account_info(profile: &Profile) -> String {
    format!("Authenticated as: {}", profile.email_address)
}

pub fn email_sent(message: &Message) -> String {
    format!("Email sent! ID: {}", message.id)
}

/// One `- start: summary (ID: id)` line per event
pub fn calendar_events(events: &[Event]) -> String {
    if events.is_empty() {
        return NO_EVENTS.to_string();
    }

    events
        .iter()
        .map(|event| {
            format!(
                "- {}: {} (ID: {})",
                event
                    .start
                    .as_ref()
                    .and_then(|s| s.display_value())
                    .unwrap_or("unknown start"),
                event.summary.as_deref().unwrap_or("(no title)"),
                event.id.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn event_created(event: &Event) -> String {
    format!(
        "Event created: {}",
        event.html_link.as_deref().unwrap_or("N/A")
    )
}

pub fn drive_folders(folders: &[DriveFile]) -> String {
    if folders.is_empty() {
        return NO_FOLDERS.to_string();
    }

    folders
        .iter()
        .map(|folder| {
            format!(
                "📁 {}\n   ID: {}\n   Link: {}\n",
                folder.name,
                folder.id,
                folder.web_view_link.as_deref().unwrap_or("N/A")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn drive_files(files: &[DriveFile]) -> String {
    if files.is_empty() {
        return NO_FILES.to_string();
    }

    files
        .iter()
        .map(|file| format!("- {} ({})", file.name, file.id))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::types::EventDateTime;

    fn file(id: &str, name: &str, link: Option<&str>) -> DriveFile {
        DriveFile {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: None,
            web_view_link: link.map(str::to_string),
        }
    }

    #[test]
    fn test_failure() {
        assert_eq!(failure("boom"), "Error: boom");
    }

    #[test]
    fn test_account_info() {
        let profile = Profile {
            email_address: "me@example.com".to_string(),
            messages_total: None,
        };
        assert_eq!(account_info(&profile), "Authenticated as: me@example.com");
    }

    #[test]
    fn test_empty_events() {
        assert_eq!(calendar_events(&[]), NO_EVENTS);
    }

    #[test]
    fn test_calendar_events() {
        let events = vec![
            Event {
                id: Some("e1".to_string()),
                summary: Some("Standup".to_string()),
                start: Some(EventDateTime {
                    date_time: Some("2024-01-01T09:00:00+07:00".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            Event {
                id: Some("e2".to_string()),
                summary: Some("Holiday".to_string()),
                start: Some(EventDateTime {
                    date: Some("2024-01-02".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ];

        assert_eq!(
            calendar_events(&events),
            "- 2024-01-01T09:00:00+07:00: Standup (ID: e1)\n- 2024-01-02: Holiday (ID: e2)"
        );
    }

    #[test]
    fn test_drive_folders() {
        let folders = vec![
            file("f1", "Projects", Some("https://drive.google.com/f1")),
            file("f2", "Archive", None),
        ];
        assert_eq!(
            drive_folders(&folders),
            "📁 Projects\n   ID: f1\n   Link: https://drive.google.com/f1\n\n📁 Archive\n   ID: f2\n   Link: N/A\n"
        );
        assert_eq!(drive_folders(&[]), NO_FOLDERS);
    }

    #[test]
    fn test_drive_files_keep_order() {
        let files = vec![file("b", "Beta", None), file("a", "Alpha", None)];
        assert_eq!(drive_files(&files), "- Beta (b)\n- Alpha (a)");
        assert_eq!(drive_files(&[]), NO_FILES);
    }
}
