// Common test utilities for integration tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use log::{debug, LevelFilter};
use tokio::sync::mpsc::UnboundedReceiver;

use parley::attachments::{FileHandle, PreviewBroker, PreviewUrl, SelectedFile};
use parley::config::SessionConfig;
use parley::contacts::default_contacts;
use parley::delivery::ReplySource;
use parley::{ChatSession, Message, SessionEvent};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

/// Everything a `RecordingBroker` was asked to do.
#[derive(Default, Debug)]
pub struct BrokerLog {
    pub created: Vec<String>,
    pub released: Vec<String>,
}

impl BrokerLog {
    pub fn release_count(&self, url: &str) -> usize {
        self.released.iter().filter(|u| *u == url).count()
    }
}

/// Preview broker that hands out predictable URLs and records releases.
pub struct RecordingBroker {
    log: Rc<RefCell<BrokerLog>>,
}

impl RecordingBroker {
    pub fn new() -> (Self, Rc<RefCell<BrokerLog>>) {
        let log = Rc::new(RefCell::new(BrokerLog::default()));
        (RecordingBroker { log: log.clone() }, log)
    }
}

impl PreviewBroker for RecordingBroker {
    fn create(&mut self, handle: &FileHandle) -> PreviewUrl {
        let mut log = self.log.borrow_mut();
        let url = format!("blob:test/{}/{}", log.created.len(), handle.path().display());
        debug!("Test broker created {}", url);
        log.created.push(url.clone());
        PreviewUrl::new(url)
    }

    fn release(&mut self, url: PreviewUrl) {
        debug!("Test broker released {}", url.as_str());
        self.log.borrow_mut().released.push(url.as_str().to_string());
    }
}

/// Replies "reply 1", "reply 2", ... so ordering is visible.
#[derive(Default)]
pub struct NumberedReplies {
    count: usize,
}

impl ReplySource for NumberedReplies {
    fn next_reply(&mut self) -> String {
        self.count += 1;
        format!("reply {}", self.count)
    }
}

pub type TestSession = ChatSession<RecordingBroker, NumberedReplies>;

/// Session on contact 1, no seed history, default timings.
pub fn setup_test_session() -> (TestSession, Rc<RefCell<BrokerLog>>) {
    setup_session_with(SessionConfig {
        seed_history: false,
        ..SessionConfig::default()
    })
}

pub fn setup_session_with(config: SessionConfig) -> (TestSession, Rc<RefCell<BrokerLog>>) {
    setup_logging();
    let (broker, log) = RecordingBroker::new();
    let session = ChatSession::new(&config, default_contacts(), broker, NumberedReplies::default());
    (session, log)
}

pub fn image_file(name: &str, size_bytes: u64) -> SelectedFile {
    SelectedFile::new(name, size_bytes, "image/png", FileHandle::new(name))
}

pub fn document_file(name: &str, size_bytes: u64) -> SelectedFile {
    SelectedFile::new(name, size_bytes, "application/pdf", FileHandle::new(name))
}

/// Collect every event published so far.
pub fn drain(events: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// Appended messages among `events`, in order.
pub fn appended(events: &[SessionEvent]) -> Vec<Message> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::MessageAppended { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Fire timers until none are armed. Needs a paused clock.
pub async fn run_until_idle(session: &mut TestSession) {
    while session.next_deadline().is_some() {
        session.wait_for_timers().await;
    }
}
