//! Cancellable one-shot timers on the tokio clock.
//!
//! The queue never runs callbacks itself. The owner asks for due entries and
//! routes them, so a cancelled entry is simply gone and can never fire.

use std::collections::BTreeMap;
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

pub struct TimerQueue<E> {
    // (deadline, id) keeps FIFO order for timers armed with the same deadline
    entries: BTreeMap<(Instant, TimerId), E>,
    deadlines: BTreeMap<TimerId, Instant>,
    next_id: u64,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        TimerQueue {
            entries: BTreeMap::new(),
            deadlines: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Arm a timer that becomes due `delay` from now.
    pub fn schedule(&mut self, delay: Duration, event: E) -> TimerId {
        self.schedule_at(Instant::now() + delay, event)
    }

    pub fn schedule_at(&mut self, deadline: Instant, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert((deadline, id), event);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Disarm a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.entries.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.deadlines.clear();
        count
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return the earliest timer whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerId, E)> {
        let key = *self.entries.keys().next()?;
        if key.0 > now {
            return None;
        }
        let event = self.entries.remove(&key)?;
        self.deadlines.remove(&key.1);
        Some((key.1, event))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_due_timers_pop_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(Duration::from_millis(300), "late");
        queue.schedule(Duration::from_millis(100), "early");

        assert!(queue.pop_due(Instant::now()).is_none());

        tokio::time::advance(Duration::from_millis(300)).await;
        let now = Instant::now();
        assert_eq!(queue.pop_due(now).map(|(_, e)| e), Some("early"));
        assert_eq!(queue.pop_due(now).map(|(_, e)| e), Some("late"));
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule(Duration::from_millis(50), ());
        assert!(queue.is_armed(id));
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(queue.pop_due(Instant::now()).is_none());
        assert_eq!(queue.next_deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_deadline_keeps_schedule_order() {
        let mut queue = TimerQueue::new();
        let deadline = Instant::now() + Duration::from_millis(10);
        queue.schedule_at(deadline, 1);
        queue.schedule_at(deadline, 2);
        queue.schedule_at(deadline, 3);

        let mut fired = Vec::new();
        while let Some((_, e)) = queue.pop_due(deadline) {
            fired.push(e);
        }
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel_all() {
        let mut queue = TimerQueue::new();
        queue.schedule(Duration::from_secs(1), 'a');
        queue.schedule(Duration::from_secs(2), 'b');
        assert_eq!(queue.cancel_all(), 2);
        assert_eq!(queue.len(), 0);
    }
}
