//! The in-process API the presentation layer drives.
//!
//! `ChatSession` owns every piece of core state and the single timer queue.
//! Operations are synchronous; time only moves when the caller fires due
//! timers (`fire_due_timers`) or awaits them (`wait_for_timers`).

use log::{debug, info};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

use crate::attachments::{BlobUrlBroker, PreviewBroker, SelectedFile, StagedAttachment};
use crate::composer::Composer;
use crate::config::SessionConfig;
use crate::contacts::{default_contacts, ContactSelector, LoadingElapsed};
use crate::delivery::{DeliveryOutcome, DeliverySimulator, DeliveryTimer, Phase, RandomReplies, ReplySource};
use crate::error::Result;
use crate::events::{EventBus, SessionEvent};
use crate::models::{AttachmentKind, Contact, Message};
use crate::store::ConversationStore;
use crate::timer::TimerQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTimer {
    Delivery(DeliveryTimer),
    Loading,
}

impl From<DeliveryTimer> for SessionTimer {
    fn from(timer: DeliveryTimer) -> Self {
        SessionTimer::Delivery(timer)
    }
}

impl From<LoadingElapsed> for SessionTimer {
    fn from(_: LoadingElapsed) -> Self {
        SessionTimer::Loading
    }
}

pub struct ChatSession<B: PreviewBroker = BlobUrlBroker, R: ReplySource = RandomReplies> {
    store: ConversationStore,
    composer: Composer<B>,
    simulator: DeliverySimulator<R>,
    contacts: ContactSelector,
    timers: TimerQueue<SessionTimer>,
    events: EventBus,
    contact_name: String,
    closed: bool,
}

impl ChatSession<BlobUrlBroker, RandomReplies> {
    /// Session with the in-process blob broker and random replies.
    pub fn from_config(config: &SessionConfig) -> Self {
        ChatSession::new(
            config,
            default_contacts(),
            BlobUrlBroker::new(),
            RandomReplies::new(config.replies.clone()),
        )
    }
}

impl<B: PreviewBroker, R: ReplySource> ChatSession<B, R> {
    pub fn new(config: &SessionConfig, contacts: Vec<Contact>, broker: B, replies: R) -> Self {
        let contacts = ContactSelector::new(contacts, config.initial_contact, config.loading_delay());
        let store = ConversationStore::new(contacts.selected_id(), config.seed_history);
        info!("Chat session opened on contact {}", contacts.selected_id());

        ChatSession {
            store,
            composer: Composer::new(broker),
            simulator: DeliverySimulator::new(replies, config.typing_delay(), config.reply_delay()),
            contacts,
            timers: TimerQueue::new(),
            events: EventBus::new(),
            contact_name: config.contact_name.clone(),
            closed: false,
        }
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<SessionEvent> {
        self.events.subscribe()
    }

    // Composer

    pub fn set_text(&mut self, value: impl Into<String>) {
        self.composer.set_text(value);
    }

    pub fn insert_emoji(&mut self, emoji: &str) {
        self.composer.insert_emoji(emoji);
    }

    pub fn stage_attachment(&mut self, file: SelectedFile, kind: AttachmentKind) -> &StagedAttachment {
        self.composer.stage_attachment(file, kind)
    }

    pub fn clear_staged_attachment(&mut self) {
        self.composer.clear_staged_attachment();
    }

    pub fn composer(&self) -> &Composer<B> {
        &self.composer
    }

    /// Send whatever is staged. Appends the message to the active
    /// conversation and starts one delivery cycle for it. `None` (and no
    /// side effects) when there is nothing to send.
    pub fn send(&mut self) -> Option<Message> {
        let message = self.composer.send()?;
        let contact_id = self.store.active_contact();
        let appended = self.store.append(message).clone();
        debug!("Sent message {} to contact {}", appended.id(), contact_id);

        self.events.emit(SessionEvent::MessageAppended {
            contact_id,
            message: appended.clone(),
        });
        self.simulator.on_outgoing(contact_id, &mut self.timers);
        Some(appended)
    }

    // Contacts

    pub fn select_contact(&mut self, contact_id: u32) -> Result<()> {
        self.contacts.select(contact_id, &mut self.store, &mut self.timers)?;
        self.events.emit(SessionEvent::LoadingChanged(true));
        Ok(())
    }

    pub fn contacts(&self) -> &ContactSelector {
        &self.contacts
    }

    pub fn is_loading(&self) -> bool {
        self.contacts.is_loading()
    }

    // Timeline

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn is_typing(&self) -> bool {
        self.simulator.is_typing()
    }

    pub fn typing_label(&self) -> Option<String> {
        self.is_typing()
            .then(|| format!("{} is typing...", self.contact_name))
    }

    pub fn delivery_phase(&self) -> Phase {
        self.simulator.phase()
    }

    pub fn pending_replies(&self) -> usize {
        self.simulator.pending_cycles()
    }

    // Timers

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Run every timer that is due now. Returns how many fired.
    pub fn fire_due_timers(&mut self) -> usize {
        let now = Instant::now();
        let mut fired = 0;

        while let Some((id, timer)) = self.timers.pop_due(now) {
            fired += 1;
            match timer {
                SessionTimer::Delivery(timer) => {
                    match self.simulator.on_timer(id, timer, &mut self.timers) {
                        Some(DeliveryOutcome::TypingStarted) => {
                            self.events.emit(SessionEvent::TypingChanged(true));
                        }
                        Some(DeliveryOutcome::Replied { contact_id, message }) => {
                            self.events.emit(SessionEvent::TypingChanged(false));
                            let message = self.store.append_to(contact_id, message).clone();
                            self.events.emit(SessionEvent::MessageAppended { contact_id, message });
                        }
                        None => {}
                    }
                }
                SessionTimer::Loading => {
                    if self.contacts.on_timer(id) {
                        self.events.emit(SessionEvent::LoadingChanged(false));
                    }
                }
            }
        }

        fired
    }

    /// Sleep until the next timer is due, then fire. Never returns while no
    /// timer is armed.
    pub async fn wait_for_timers(&mut self) -> usize {
        match self.timers.next_deadline() {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
        self.fire_due_timers()
    }

    /// Tear the session down: cancel every timer, hide the indicators and
    /// release any unsent preview.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if self.simulator.cancel(&mut self.timers) {
            self.events.emit(SessionEvent::TypingChanged(false));
        }
        if self.contacts.cancel(&mut self.timers) {
            self.events.emit(SessionEvent::LoadingChanged(false));
        }
        self.composer.clear_staged_attachment();

        let leftover = self.timers.cancel_all();
        info!("Chat session closed ({} stray timers cleared)", leftover);
    }
}

impl<B: PreviewBroker, R: ReplySource> Drop for ChatSession<B, R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
