//! Gmail API client
//!
//! Profile lookup and plain-text message sending.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::config::google::USER_ID;
use crate::error::Result;
use crate::google::services::ServiceClient;
use crate::google::types::{Message, Profile, SendMessageRequest};

/// Gmail v1 client
pub struct GmailService {
    client: ServiceClient,
}

impl GmailService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// Get the profile of the authenticated user
    pub async fn get_profile(&self) -> Result<Profile> {
        self.client
            .get_json("users.getProfile", &format!("users/{}/profile", USER_ID), &[])
            .await
    }

    /// Send an already encoded raw message
    pub async fn send_raw(&self, raw: String) -> Result<Message> {
        self.client
            .post_json(
                "messages.send",
                &format!("users/{}/messages/send", USER_ID),
                &SendMessageRequest { raw },
            )
            .await
    }

    /// Send a plain-text email
    pub async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<Message> {
        let message = create_plain_message(to, subject, body);
        self.send_raw(encode_raw_message(&message)).await
    }
}

/// Build a minimal RFC 2822 message with a plain-text body.
///
/// Lines are joined with a bare `\n`; Gmail normalizes line endings on
/// ingest.
pub fn create_plain_message(to: &str, subject: &str, body: &str) -> String {
    [
        format!("To: {}", to),
        format!("Subject: {}", subject),
        "Content-Type: text/plain; charset=\"utf-8\"".to_string(),
        String::new(),
        body.to_string(),
    ]
    .join("\n")
}

/// Encode a raw email message for Gmail API (base64url, no padding)
pub fn encode_raw_message(message: &str) -> String {
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_plain_message() {
        let message = create_plain_message("a@b.com", "Hi", "Hello");
        assert_eq!(
            message,
            "To: a@b.com\nSubject: Hi\nContent-Type: text/plain; charset=\"utf-8\"\n\nHello"
        );
    }

    #[test]
    fn test_encode_raw_message_is_url_safe() {
        // Standard alphabet gives "Pz8/Pj4+"
        let encoded = encode_raw_message("???>>>");
        assert_eq!(encoded, "Pz8_Pj4-");

        let decoded = URL_SAFE_NO_PAD.decode(encoded).unwrap();
        assert_eq!(decoded, b"???>>>");
    }

    #[test]
    fn test_encode_raw_message_strips_padding() {
        // 4 bytes would need "==" padding
        assert_eq!(encode_raw_message("abcd"), "YWJjZA");
    }
}
