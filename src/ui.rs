use std::path::PathBuf;

use parley::attachments::StagedAttachment;
use parley::contacts::ContactSelector;
use parley::models::{AttachmentKind, Contact, DeliveryStatus, Message, Presence, Sender};
use parley::SessionEvent;

/// One line of user input, parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(String),
    Attach { kind: AttachmentKind, path: PathBuf },
    Discard,
    Contacts(Option<String>),
    Open(u32),
    Emoji(String),
    History,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    if !line.starts_with('/') {
        return Command::Send(line.to_string());
    }

    let (name, rest) = match line.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    match (name, rest) {
        ("/photo", path) | ("/camera", path) if !path.is_empty() => Command::Attach {
            kind: AttachmentKind::Image,
            path: PathBuf::from(path),
        },
        ("/file", path) if !path.is_empty() => Command::Attach {
            kind: AttachmentKind::Document,
            path: PathBuf::from(path),
        },
        ("/discard", _) => Command::Discard,
        ("/contacts", "") => Command::Contacts(None),
        ("/contacts", query) => Command::Contacts(Some(query.to_string())),
        ("/open", id) => match id.parse() {
            Ok(id) => Command::Open(id),
            Err(_) => Command::Invalid(format!("Not a contact id: {}", id)),
        },
        ("/emoji", emoji) if !emoji.is_empty() => Command::Emoji(emoji.to_string()),
        ("/history", _) => Command::History,
        ("/help", _) => Command::Help,
        ("/quit", _) | ("/exit", _) => Command::Quit,
        _ => Command::Invalid(format!("Unknown command: {}", line)),
    }
}

/// Line-oriented renderer for the session's state and events.
pub struct ConsoleUI {
    contact_name: String,
}

impl ConsoleUI {
    pub fn new(contact_name: &str) -> Self {
        ConsoleUI {
            contact_name: contact_name.to_string(),
        }
    }

    pub fn print_event(&self, event: &SessionEvent) {
        if let Some(line) = self.render_event(event) {
            println!("{}", line);
        }
    }

    pub fn render_event(&self, event: &SessionEvent) -> Option<String> {
        match event {
            SessionEvent::MessageAppended { message, .. } => Some(self.render_message(message)),
            SessionEvent::TypingChanged(true) => Some(format!("  {} is typing...", self.contact_name)),
            SessionEvent::TypingChanged(false) => None,
            SessionEvent::LoadingChanged(true) => Some("  Loading messages...".to_string()),
            SessionEvent::LoadingChanged(false) => None,
        }
    }

    pub fn render_message(&self, message: &Message) -> String {
        let who = match message.sender() {
            Sender::User => "You",
            Sender::Contact => self.contact_name.as_str(),
        };

        let mut body = Vec::new();
        if let Some(attachment) = message.attachment() {
            let icon = match attachment.kind {
                AttachmentKind::Image => "[image]",
                AttachmentKind::Document => "[file]",
            };
            body.push(format!("{} {} ({})", icon, attachment.name, attachment.size_label));
        }
        if let Some(text) = message.text() {
            body.push(text.to_string());
        }

        let mut line = format!("[{}] {}: {}", message.timestamp(), who, body.join(" "));
        if message.sender() == Sender::User {
            line.push(' ');
            line.push_str(status_marker(message.status()));
        }
        line
    }

    pub fn print_history(&self, messages: &[Message]) {
        for message in messages {
            println!("{}", self.render_message(message));
        }
    }

    pub fn print_staged(&self, staged: &StagedAttachment) {
        let preview = staged.preview_url().unwrap_or("no preview");
        println!(
            "  Attached {} ({}, {}). Type a caption or press Enter to send, /discard to drop.",
            staged.name(),
            staged.size_label(),
            preview
        );
    }

    pub fn print_contacts(&self, selector: &ContactSelector, query: Option<&str>) {
        let contacts: Vec<&Contact> = match query {
            Some(q) => selector.filter(q),
            None => selector.contacts().iter().collect(),
        };

        if contacts.is_empty() {
            println!("  No contacts match");
        }
        for contact in contacts {
            let marker = if contact.id == selector.selected_id() { '*' } else { ' ' };
            println!("{}", render_contact(contact, marker));
        }
    }

    pub fn print_header(&self, selector: &ContactSelector) {
        if let Some(contact) = selector.selected() {
            println!("== Chat with {} ({}) ==", contact.name, presence_label(contact.presence));
        }
        println!("Type a message and press Enter. /help lists commands.");
    }

    pub fn print_help(&self) {
        println!("  /photo <path>      stage an image");
        println!("  /file <path>       stage a document");
        println!("  /discard           drop the staged attachment");
        println!("  /contacts [query]  list contacts");
        println!("  /open <id>         switch conversation");
        println!("  /emoji <text>      append to the message being typed");
        println!("  /history           reprint this conversation");
        println!("  /quit              leave");
    }

    pub fn print_error(&self, error: &str) {
        eprintln!("  ! {}", error);
    }
}

fn render_contact(contact: &Contact, marker: char) -> String {
    let unread = if contact.unread_count > 0 {
        format!(" ({})", contact.unread_count)
    } else {
        String::new()
    };
    format!(
        "{} {:>2} [{}] {:<10} {}{}",
        marker,
        contact.id,
        contact.initials(),
        contact.name,
        contact.last_message,
        unread
    )
}

fn presence_label(presence: Presence) -> &'static str {
    match presence {
        Presence::Online => "online",
        Presence::Offline => "offline",
    }
}

fn status_marker(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Sent => "✓",
        DeliveryStatus::Delivered => "✓✓",
        DeliveryStatus::Read => "✓✓ read",
    }
}
