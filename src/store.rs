use std::collections::HashMap;

use log::debug;

use crate::models::{DeliveryStatus, Message, Sender};

/// Ordered message histories, one per contact, with an active pointer.
pub struct ConversationStore {
    conversations: HashMap<u32, Vec<Message>>,
    active: u32,
    seed_history: bool,
}

impl ConversationStore {
    pub fn new(active: u32, seed_history: bool) -> Self {
        let mut store = ConversationStore {
            conversations: HashMap::new(),
            active,
            seed_history,
        };
        store.ensure_conversation(active);
        store
    }

    pub fn active_contact(&self) -> u32 {
        self.active
    }

    /// Point the store at another contact. Earlier histories are kept.
    pub fn switch_conversation(&mut self, contact_id: u32) {
        debug!("Switching active conversation {} -> {}", self.active, contact_id);
        self.active = contact_id;
        self.ensure_conversation(contact_id);
    }

    /// Append to the active conversation.
    pub fn append(&mut self, message: Message) -> &Message {
        self.append_to(self.active, message)
    }

    pub fn append_to(&mut self, contact_id: u32, message: Message) -> &Message {
        let history = self.ensure_conversation(contact_id);
        let index = history.len();
        history.push(message);
        &history[index]
    }

    /// Messages of the active conversation, oldest first.
    pub fn messages(&self) -> &[Message] {
        self.conversation(self.active)
    }

    pub fn conversation(&self, contact_id: u32) -> &[Message] {
        self.conversations
            .get(&contact_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.messages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }

    fn ensure_conversation(&mut self, contact_id: u32) -> &mut Vec<Message> {
        let seed = self.seed_history;
        self.conversations.entry(contact_id).or_insert_with(|| {
            if seed {
                seed_messages()
            } else {
                Vec::new()
            }
        })
    }
}

/// Opening history every conversation starts with.
pub fn seed_messages() -> Vec<Message> {
    let seed = [
        (Sender::Contact, "Hey! How's it going?", "10:30 AM"),
        (Sender::User, "All good! What about you?", "10:32 AM"),
        (
            Sender::Contact,
            "I'm doing great! Just finishing up that project we discussed last week.",
            "10:33 AM",
        ),
    ];

    seed.iter()
        .filter_map(|(sender, text, time)| {
            Message::new(
                *sender,
                Some(text.to_string()),
                None,
                time.to_string(),
                DeliveryStatus::Read,
            )
            .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(body: &str) -> Message {
        Message::new(
            Sender::User,
            Some(body.to_string()),
            None,
            "09:00 AM".to_string(),
            DeliveryStatus::Sent,
        )
        .unwrap()
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut store = ConversationStore::new(1, false);
        store.append(text("one"));
        store.append(text("two"));
        store.append(text("three"));

        let bodies: Vec<_> = store.messages().iter().filter_map(|m| m.text()).collect();
        assert_eq!(bodies, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_switch_keeps_prior_history() {
        let mut store = ConversationStore::new(1, false);
        store.append(text("for john"));
        store.switch_conversation(2);
        assert!(store.is_empty());
        store.append(text("for emma"));

        store.switch_conversation(1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].text(), Some("for john"));
        assert_eq!(store.conversation(2)[0].text(), Some("for emma"));
    }

    #[test]
    fn test_new_conversations_start_with_seed_history() {
        let mut store = ConversationStore::new(1, true);
        assert_eq!(store.len(), 3);
        store.switch_conversation(4);
        assert_eq!(store.len(), 3);
        assert_eq!(store.messages()[0].text(), Some("Hey! How's it going?"));
        assert_eq!(store.messages()[0].sender(), Sender::Contact);
    }

    #[test]
    fn test_append_to_other_conversation_leaves_active_untouched() {
        let mut store = ConversationStore::new(1, false);
        store.append_to(3, text("elsewhere"));
        assert!(store.is_empty());
        assert_eq!(store.conversation(3).len(), 1);
        assert_eq!(store.active_contact(), 1);
    }
}
