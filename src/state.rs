//! UI-agnostic conversation types
//!
//! These are shared by the terminal front end and the one-shot `ask` command
//! and don't depend on any UI framework.

/// Shown in place of an assistant reply whenever a submission fails.
pub const FALLBACK_TEXT: &str = "Sorry, there was an error.";

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn display_name(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "AI Assistant",
        }
    }
}

/// One entry in the conversation log. Fields are private so a message can't
/// change after it has been appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: Sender,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
