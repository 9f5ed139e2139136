use log::debug;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::models::Message;

/// Everything the presentation layer needs to redraw.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MessageAppended { contact_id: u32, message: Message },
    TypingChanged(bool),
    LoadingChanged(bool),
}

/// Synchronous fan-out to every live subscriber.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<UnboundedSender<SessionEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<SessionEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to each subscriber once. Dropped receivers are pruned.
    pub fn emit(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| match tx.send(event.clone()) {
            Ok(_) => true,
            Err(_) => {
                debug!("Dropping closed event subscriber");
                false
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
