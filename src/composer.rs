use log::debug;

use crate::attachments::{AttachmentManager, PreviewBroker, SelectedFile, StagedAttachment};
use crate::models::{current_time, AttachmentKind, DeliveryStatus, Message, Sender};

/// Text buffer plus the staged attachment of the input area.
pub struct Composer<B: PreviewBroker> {
    text: String,
    attachments: AttachmentManager<B>,
}

impl<B: PreviewBroker> Composer<B> {
    pub fn new(broker: B) -> Self {
        Composer {
            text: String::new(),
            attachments: AttachmentManager::new(broker),
        }
    }

    pub fn set_text(&mut self, value: impl Into<String>) {
        self.text = value.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn insert_emoji(&mut self, emoji: &str) {
        self.text.push_str(emoji);
    }

    pub fn stage_attachment(&mut self, file: SelectedFile, kind: AttachmentKind) -> &StagedAttachment {
        self.attachments.stage(file, kind)
    }

    pub fn clear_staged_attachment(&mut self) {
        self.attachments.discard();
    }

    pub fn staged_attachment(&self) -> Option<&StagedAttachment> {
        self.attachments.staged()
    }

    pub fn attachments(&self) -> &AttachmentManager<B> {
        &self.attachments
    }

    /// Whether a send would produce a message.
    pub fn can_send(&self) -> bool {
        self.attachments.has_staged() || !self.text.trim().is_empty()
    }

    pub fn placeholder(&self) -> &'static str {
        if self.attachments.has_staged() {
            "Add a message..."
        } else {
            "Type a message..."
        }
    }

    /// Build the outgoing message and clear the input. `None` when there is
    /// nothing to send; no state changes in that case.
    pub fn send(&mut self) -> Option<Message> {
        if !self.can_send() {
            debug!("Ignoring send with empty input");
            return None;
        }

        let text = Some(self.text.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let attachment = self.attachments.finalize();

        // can_send() guarantees text or attachment
        let message = Message::new(
            Sender::User,
            text,
            attachment,
            current_time(),
            DeliveryStatus::Sent,
        )
        .ok()?;

        self.text.clear();
        Some(message)
    }
}
