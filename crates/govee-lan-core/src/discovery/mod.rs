//! LAN discovery: receive loop, timed listening window and query orchestration.

pub mod listener;
pub mod orchestrator;
pub mod window;

pub use listener::{DiscoveryListener, ListenerConfig, MessageHandler};
pub use orchestrator::{handle_message, DiscoveryOrchestrator, PollKind};
pub use window::{Expiry, ListeningWindow, WindowConfig};
