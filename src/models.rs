use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChatError;

/// Time-of-day format used for every message timestamp, e.g. "10:30 AM".
pub const TIME_FORMAT: &str = "%I:%M %p";

/// Format a local time the way message bubbles show it.
pub fn format_time(at: DateTime<Local>) -> String {
    at.format(TIME_FORMAT).to_string()
}

/// Current time formatted for a new message.
pub fn current_time() -> String {
    format_time(Local::now())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,    // The local user
    Contact, // The remote counterpart of the active conversation
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Document,
}

/// A file carried by a sent message. The message owns `url` from here on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub name: String,
    pub url: String,
    pub size_label: String,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent = 0,      // Accepted by the local timeline
    Delivered = 1, // Delivered to the counterpart
    Read = 2,      // Read by the counterpart
}

/// A timeline entry. Everything but `status` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: String,
    sender: Sender,
    text: Option<String>,
    attachment: Option<Attachment>,
    timestamp: String,
    status: DeliveryStatus,
}

impl Message {
    /// Build a message. Fails when both `text` and `attachment` are absent.
    pub fn new(
        sender: Sender,
        text: Option<String>,
        attachment: Option<Attachment>,
        timestamp: String,
        status: DeliveryStatus,
    ) -> Result<Self, ChatError> {
        if text.is_none() && attachment.is_none() {
            return Err(ChatError::EmptyMessage);
        }

        Ok(Message {
            id: Uuid::new_v4().to_string(),
            sender,
            text,
            attachment,
            timestamp,
            status,
        })
    }

    /// Text message from the counterpart, as the delivery simulator produces.
    pub fn reply(text: impl Into<String>, timestamp: String) -> Self {
        Message {
            id: Uuid::new_v4().to_string(),
            sender: Sender::Contact,
            text: Some(text.into()),
            attachment: None,
            timestamp,
            status: DeliveryStatus::Read,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn is_outgoing(&self) -> bool {
        self.sender == Sender::User
    }

    /// Move the status forward. Returns false (and changes nothing) on a downgrade.
    pub fn advance_status(&mut self, status: DeliveryStatus) -> bool {
        if status < self.status {
            return false;
        }
        self.status = status;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Online,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: u32,
    pub name: String,
    pub presence: Presence,
    pub last_message: String,
    pub unread_count: u32,
}

impl Contact {
    pub fn new(id: u32, name: &str, presence: Presence, last_message: &str, unread_count: u32) -> Self {
        Contact {
            id,
            name: name.to_string(),
            presence,
            last_message: last_message.to_string(),
            unread_count,
        }
    }

    /// Initials shown in the avatar, e.g. "Mary Jane" -> "MJ".
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_requires_text_or_attachment() {
        let result = Message::new(Sender::User, None, None, "10:30 AM".to_string(), DeliveryStatus::Sent);
        assert!(matches!(result, Err(ChatError::EmptyMessage)));

        let text_only = Message::new(
            Sender::User,
            Some("Hi".to_string()),
            None,
            "10:30 AM".to_string(),
            DeliveryStatus::Sent,
        )
        .unwrap();
        assert_eq!(text_only.text(), Some("Hi"));
        assert!(text_only.attachment().is_none());
        assert!(text_only.is_outgoing());
    }

    #[test]
    fn test_status_never_moves_backwards() {
        let mut msg = Message::new(
            Sender::User,
            Some("status".to_string()),
            None,
            "10:30 AM".to_string(),
            DeliveryStatus::Sent,
        )
        .unwrap();

        assert!(msg.advance_status(DeliveryStatus::Delivered));
        assert!(msg.advance_status(DeliveryStatus::Read));
        assert!(!msg.advance_status(DeliveryStatus::Sent));
        assert_eq!(msg.status(), DeliveryStatus::Read);
    }

    #[test]
    fn test_reply_is_read_and_from_contact() {
        let reply = Message::reply("Great point", "10:31 AM".to_string());
        assert_eq!(reply.sender(), Sender::Contact);
        assert_eq!(reply.status(), DeliveryStatus::Read);
        assert_eq!(reply.text(), Some("Great point"));
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::reply("a", "1:00 PM".to_string());
        let b = Message::reply("a", "1:00 PM".to_string());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_time_format() {
        use chrono::TimeZone;
        let at = Local.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        assert_eq!(format_time(at), "10:30 AM");
        let at = Local.with_ymd_and_hms(2024, 5, 1, 15, 5, 0).unwrap();
        assert_eq!(format_time(at), "03:05 PM");
    }

    #[test]
    fn test_contact_initials() {
        let contact = Contact::new(9, "mary jane", Presence::Online, "", 0);
        assert_eq!(contact.initials(), "MJ");
    }
}
