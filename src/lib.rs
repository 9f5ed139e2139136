// Re-export needed modules for the binary and integration tests
pub mod attachments;
pub mod composer;
pub mod config;
pub mod contacts;
pub mod delivery;
pub mod error;
pub mod events;
pub mod models;
pub mod session;
pub mod store;
pub mod timer;

// Re-export main types for convenience
pub use error::ChatError;
pub use events::SessionEvent;
pub use models::*;
pub use session::ChatSession;
