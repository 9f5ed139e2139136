//! Scripted counterpart: typing indicator followed by an auto-reply.
//!
//! Each outgoing message gets one cycle:
//! idle -> pending typing delay -> typing -> done.
//! Cycles are serialised. A send that arrives while a cycle is running waits
//! in a FIFO queue, so replies come one per send and in send order.

use std::collections::VecDeque;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Duration;

use crate::models::{current_time, Message};
use crate::timer::{TimerId, TimerQueue};

pub const DEFAULT_REPLIES: [&str; 5] = [
    "I see what you mean",
    "That's interesting!",
    "Let me check on that",
    "Thanks for sharing",
    "Great point",
];

/// Where reply texts come from.
pub trait ReplySource {
    fn next_reply(&mut self) -> String;
}

/// Uniform random pick from a fixed pool.
pub struct RandomReplies<R: Rng = StdRng> {
    pool: Vec<String>,
    rng: R,
}

impl RandomReplies<StdRng> {
    pub fn new(pool: Vec<String>) -> Self {
        Self::with_rng(pool, StdRng::from_entropy())
    }
}

impl Default for RandomReplies<StdRng> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<R: Rng> RandomReplies<R> {
    /// An empty pool falls back to `DEFAULT_REPLIES`.
    pub fn with_rng(pool: Vec<String>, rng: R) -> Self {
        let pool = if pool.is_empty() {
            DEFAULT_REPLIES.iter().map(|r| r.to_string()).collect()
        } else {
            pool
        };
        RandomReplies { pool, rng }
    }

    pub fn pool(&self) -> &[String] {
        &self.pool
    }
}

impl<R: Rng> ReplySource for RandomReplies<R> {
    fn next_reply(&mut self) -> String {
        let index = self.rng.gen_range(0..self.pool.len());
        self.pool[index].clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PendingTypingDelay,
    Typing,
    Done,
}

/// Timer payloads the simulator arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryTimer {
    TypingDelay,
    Reply,
}

/// What a timer fire means for the presentation layer.
#[derive(Debug)]
pub enum DeliveryOutcome {
    TypingStarted,
    Replied { contact_id: u32, message: Message },
}

struct Cycle {
    contact_id: u32,
    phase: Phase,
    timer: TimerId,
}

pub struct DeliverySimulator<R: ReplySource> {
    replies: R,
    typing_delay: Duration,
    reply_delay: Duration,
    active: Option<Cycle>,
    queued: VecDeque<u32>,
    typing: bool,
}

impl<R: ReplySource> DeliverySimulator<R> {
    pub fn new(replies: R, typing_delay: Duration, reply_delay: Duration) -> Self {
        DeliverySimulator {
            replies,
            typing_delay,
            reply_delay,
            active: None,
            queued: VecDeque::new(),
            typing: false,
        }
    }

    /// Start a cycle for an outgoing message sent to `contact_id`, or queue it
    /// behind the running one.
    pub fn on_outgoing<E: From<DeliveryTimer>>(&mut self, contact_id: u32, timers: &mut TimerQueue<E>) {
        self.queued.push_back(contact_id);
        if self.active.is_none() {
            self.start_next(timers);
        } else {
            debug!("Delivery cycle busy, {} queued", self.queued.len());
        }
    }

    /// Advance the active cycle. Fires that do not belong to it are ignored.
    pub fn on_timer<E: From<DeliveryTimer>>(
        &mut self,
        id: TimerId,
        timer: DeliveryTimer,
        timers: &mut TimerQueue<E>,
    ) -> Option<DeliveryOutcome> {
        let cycle = match self.active.as_mut() {
            Some(cycle) if cycle.timer == id => cycle,
            _ => {
                debug!("Ignoring stray delivery timer {:?}", id);
                return None;
            }
        };

        match (cycle.phase, timer) {
            (Phase::PendingTypingDelay, DeliveryTimer::TypingDelay) => {
                cycle.phase = Phase::Typing;
                cycle.timer = timers.schedule(self.reply_delay, DeliveryTimer::Reply.into());
                self.typing = true;
                debug!("Contact {} is typing", cycle.contact_id);
                Some(DeliveryOutcome::TypingStarted)
            }
            (Phase::Typing, DeliveryTimer::Reply) => {
                cycle.phase = Phase::Done;
                let contact_id = cycle.contact_id;
                self.typing = false;
                self.active = None;

                let message = Message::reply(self.replies.next_reply(), current_time());
                debug!("Contact {} replied: {:?}", contact_id, message.text());

                self.start_next(timers);
                Some(DeliveryOutcome::Replied { contact_id, message })
            }
            (phase, timer) => {
                debug!("Timer {:?} does not match phase {:?}", timer, phase);
                None
            }
        }
    }

    /// Abandon the running cycle and everything queued. Returns true if the
    /// typing indicator was visible and must now be hidden.
    pub fn cancel<E>(&mut self, timers: &mut TimerQueue<E>) -> bool {
        if let Some(cycle) = self.active.take() {
            timers.cancel(cycle.timer);
            info!(
                "Cancelled delivery cycle for contact {} ({} queued dropped)",
                cycle.contact_id,
                self.queued.len()
            );
        }
        self.queued.clear();
        std::mem::replace(&mut self.typing, false)
    }

    pub fn phase(&self) -> Phase {
        self.active.as_ref().map(|c| c.phase).unwrap_or(Phase::Idle)
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Cycles not yet finished, the running one included.
    pub fn pending_cycles(&self) -> usize {
        self.queued.len() + usize::from(self.active.is_some())
    }

    fn start_next<E: From<DeliveryTimer>>(&mut self, timers: &mut TimerQueue<E>) {
        if let Some(contact_id) = self.queued.pop_front() {
            let timer = timers.schedule(self.typing_delay, DeliveryTimer::TypingDelay.into());
            self.active = Some(Cycle {
                contact_id,
                phase: Phase::PendingTypingDelay,
                timer,
            });
            debug!("Delivery cycle armed for contact {}", contact_id);
        }
    }
}
