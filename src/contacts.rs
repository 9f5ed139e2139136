use log::debug;
use tokio::time::Duration;

use crate::error::{ChatError, Result};
use crate::models::{Contact, Presence};
use crate::store::ConversationStore;
use crate::timer::{TimerId, TimerQueue};

/// Timer payload for the end of the loading spinner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingElapsed;

/// The contact directory the sidebar lists.
pub fn default_contacts() -> Vec<Contact> {
    vec![
        Contact::new(1, "John", Presence::Online, "See you tomorrow!", 2),
        Contact::new(2, "Emma", Presence::Offline, "Thanks for the help!", 0),
        Contact::new(3, "Michael", Presence::Online, "Let's meet up soon", 0),
        Contact::new(4, "Sarah", Presence::Online, "I'll send the documents", 5),
        Contact::new(5, "David", Presence::Offline, "How's the project going?", 0),
        Contact::new(6, "Lisa", Presence::Online, "Just checking in", 0),
        Contact::new(7, "Mark", Presence::Offline, "Available for a call?", 0),
        Contact::new(8, "Jennifer", Presence::Online, "Take care!", 0),
    ]
}

/// Picks the active conversation and owns the transient loading flag.
pub struct ContactSelector {
    contacts: Vec<Contact>,
    selected: u32,
    loading: bool,
    loading_delay: Duration,
    loading_timer: Option<TimerId>,
}

impl ContactSelector {
    /// `selected` falls back to the first contact when it is not in the list.
    pub fn new(contacts: Vec<Contact>, selected: u32, loading_delay: Duration) -> Self {
        let selected = if contacts.iter().any(|c| c.id == selected) {
            selected
        } else {
            contacts.first().map(|c| c.id).unwrap_or(selected)
        };

        ContactSelector {
            contacts,
            selected,
            loading: false,
            loading_delay,
            loading_timer: None,
        }
    }

    /// Switch to `contact_id`: point the store at it, raise the loading flag
    /// and (re)arm the timer that lowers it. A pending timer from an earlier
    /// selection is cancelled first.
    pub fn select<E: From<LoadingElapsed>>(
        &mut self,
        contact_id: u32,
        store: &mut ConversationStore,
        timers: &mut TimerQueue<E>,
    ) -> Result<()> {
        if self.contact(contact_id).is_none() {
            return Err(ChatError::UnknownContact(contact_id.to_string()));
        }

        store.switch_conversation(contact_id);
        self.selected = contact_id;
        self.loading = true;

        if let Some(stale) = self.loading_timer.take() {
            timers.cancel(stale);
            debug!("Cancelled pending loading timer {:?}", stale);
        }
        self.loading_timer = Some(timers.schedule(self.loading_delay, LoadingElapsed.into()));
        Ok(())
    }

    /// Lower the loading flag if `id` is the current loading timer.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.loading_timer != Some(id) {
            debug!("Ignoring stale loading timer {:?}", id);
            return false;
        }
        self.loading_timer = None;
        self.loading = false;
        true
    }

    /// Disarm the loading timer. Returns true if the flag was raised.
    pub fn cancel<E>(&mut self, timers: &mut TimerQueue<E>) -> bool {
        if let Some(id) = self.loading_timer.take() {
            timers.cancel(id);
        }
        std::mem::replace(&mut self.loading, false)
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn contact(&self, id: u32) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn selected(&self) -> Option<&Contact> {
        self.contact(self.selected)
    }

    pub fn selected_id(&self) -> u32 {
        self.selected
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Case-insensitive name search.
    pub fn filter(&self, query: &str) -> Vec<&Contact> {
        let query = query.to_lowercase();
        self.contacts
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&query))
            .collect()
    }
}
