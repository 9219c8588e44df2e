pub mod app;
pub mod client;
pub mod config;
pub mod conversation;
pub mod handler;
pub mod logging;
pub mod state;
pub mod theme;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use client::{InsightClient, SubmitError};
pub use config::{Config, Settings};
pub use conversation::Conversation;
pub use state::{Message, Sender, FALLBACK_TEXT};
pub use theme::Theme;
