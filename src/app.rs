use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::client::{InsightClient, SubmitError};
use crate::config::Settings;
use crate::conversation::Conversation;
use crate::theme::Theme;

/// Ticks the success check stays visible after a reply.
const SUCCESS_FLASH_TICKS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub theme: Theme,

    pub conversation: Conversation,
    pub client: InsightClient,
    pub submit_task: Option<JoinHandle<Result<String, SubmitError>>>,

    // Input state; the text itself lives in the conversation
    pub input_cursor: usize,

    // Chat view state
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_lines: u16,
    pub follow_chat: bool,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8,
    pub success_flash: u8,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            theme: settings.theme,

            conversation: Conversation::new(),
            client: InsightClient::new(&settings.api_url),
            submit_task: None,

            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_lines: 0,
            follow_chat: true,
            chat_area: None,

            animation_frame: 0,
            success_flash: 0,
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        debug!(theme = self.theme.as_str(), "theme toggled");
    }

    // Input editing. Every edit goes through the controller, which refuses
    // changes while a request is in flight.
    fn edit_input(&mut self, edit: impl FnOnce(&mut String, &mut usize)) {
        if self.conversation.is_submitting() {
            return;
        }
        let mut text = self.conversation.pending_input().to_string();
        let mut cursor = self.input_cursor;
        edit(&mut text, &mut cursor);
        if self.conversation.on_input_change(text) {
            self.input_cursor = cursor;
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.edit_input(|text, cursor| {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        });
    }

    pub fn delete_back(&mut self) {
        self.edit_input(|text, cursor| {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        });
    }

    pub fn delete_forward(&mut self) {
        self.edit_input(|text, cursor| {
            if *cursor < text.chars().count() {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        });
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.conversation.pending_input().chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.conversation.pending_input().chars().count();
    }

    /// Submit the pending question on a background task. Does nothing for
    /// blank input or while another request is in flight.
    pub fn submit(&mut self) {
        let Some(prompt) = self.conversation.begin_submit() else {
            return;
        };

        self.input_cursor = 0;
        self.success_flash = 0;
        self.animation_frame = 0;
        self.scroll_chat_to_bottom();

        let client = self.client.clone();
        self.submit_task = Some(tokio::spawn(async move { client.ask(&prompt).await }));
    }

    /// Settle the controller once the background request has finished.
    pub async fn poll_submission(&mut self) {
        let finished = self
            .submit_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        let Some(task) = self.submit_task.take() else {
            return;
        };
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "request task failed");
                Err(SubmitError::Interrupted(e.to_string()))
            }
        };

        self.conversation.settle(outcome);
        if self.conversation.last_submit_succeeded() {
            self.success_flash = SUCCESS_FLASH_TICKS;
        }
        self.scroll_chat_to_bottom();
    }

    /// Called on each Tick event
    pub async fn on_tick(&mut self) {
        if self.conversation.is_submitting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.success_flash = self.success_flash.saturating_sub(1);
        self.poll_submission().await;
    }

    // Chat scrolling. `chat_lines` is the wrapped height measured by
    // `ui::render_chat`; while `follow_chat` is set the renderer pins the
    // view to the newest line.
    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
        self.follow_chat = self.chat_scroll >= max_scroll;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_chat = false;
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_chat = false;
    }

    /// Scroll so the newest message (or the thinking row) is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.follow_chat = true;
        self.chat_scroll = self.max_chat_scroll();
    }

    pub fn max_chat_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.chat_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Message, FALLBACK_TEXT};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(api_url: &str) -> Settings {
        Settings {
            api_url: api_url.to_string(),
            theme: Theme::Dark,
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.insert_char(c);
        }
    }

    async fn wait_until_settled(app: &mut App) {
        for _ in 0..500 {
            app.poll_submission().await;
            if !app.conversation.is_submitting() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("submission never settled");
    }

    #[test]
    fn editing_respects_cursor_and_utf8() {
        let mut app = App::new(&settings(crate::config::DEFAULT_API_URL));
        type_text(&mut app, "héllo");
        app.cursor_home();
        app.cursor_right();
        app.delete_forward();
        assert_eq!(app.conversation.pending_input(), "hllo");

        app.cursor_end();
        app.delete_back();
        assert_eq!(app.conversation.pending_input(), "hll");
        assert_eq!(app.input_cursor, 3);

        app.cursor_left();
        app.insert_char('é');
        assert_eq!(app.conversation.pending_input(), "hlél");
    }

    #[test]
    fn blank_submit_spawns_nothing() {
        let mut app = App::new(&settings(crate::config::DEFAULT_API_URL));
        type_text(&mut app, "   ");
        app.submit();
        assert!(app.submit_task.is_none());
        assert!(app.conversation.log().is_empty());
    }

    #[test]
    fn theme_toggles() {
        let mut app = App::new(&settings(crate::config::DEFAULT_API_URL));
        app.toggle_theme();
        assert_eq!(app.theme, Theme::Light);
    }

    #[tokio::test]
    async fn unreachable_endpoint_settles_with_fallback() {
        // Grab a free port, then close it so nothing is listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/api/chat", listener.local_addr().unwrap());
        drop(listener);

        let mut app = App::new(&settings(&endpoint));
        type_text(&mut app, "Explain diversification");
        app.submit();

        assert!(app.conversation.is_submitting());
        assert_eq!(app.input_cursor, 0);

        // Input is disabled while in flight
        app.insert_char('x');
        assert_eq!(app.conversation.pending_input(), "");

        wait_until_settled(&mut app).await;
        assert!(app.submit_task.is_none());
        assert!(!app.conversation.last_submit_succeeded());
        assert_eq!(app.success_flash, 0);
        assert_eq!(
            app.conversation.log(),
            &[
                Message::user("Explain diversification"),
                Message::assistant(FALLBACK_TEXT),
            ]
        );
    }

    #[test]
    fn scrolling_clamps_to_rendered_height() {
        let mut app = App::new(&settings(crate::config::DEFAULT_API_URL));
        app.chat_lines = 30;
        app.chat_height = 10;

        app.scroll_up(3);
        assert!(!app.follow_chat);
        app.scroll_down(5);
        assert_eq!(app.chat_scroll, 5);
        assert!(!app.follow_chat);

        app.scroll_down(1000);
        assert_eq!(app.chat_scroll, 20);
        assert!(app.follow_chat);

        app.scroll_to_top();
        assert_eq!(app.chat_scroll, 0);
        assert!(!app.follow_chat);
    }

    #[tokio::test]
    async fn successful_reply_flashes_and_follows_the_log() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "prompt": "What is a P/E ratio?" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "reply": "Price-to-earnings ratio..." })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut app = App::new(&settings(&format!("{}/api/chat", server.uri())));
        // Scrolled away from the bottom of a long log
        app.chat_lines = 30;
        app.chat_height = 10;
        app.scroll_to_top();

        type_text(&mut app, "What is a P/E ratio?");
        app.submit();
        // Stop following again so the reply has to bring the view back
        app.scroll_to_top();
        wait_until_settled(&mut app).await;

        assert!(app.conversation.last_submit_succeeded());
        assert_eq!(app.success_flash, SUCCESS_FLASH_TICKS);
        assert!(app.follow_chat);
        assert_eq!(app.chat_scroll, 20);
        assert_eq!(
            app.conversation.log(),
            &[
                Message::user("What is a P/E ratio?"),
                Message::assistant("Price-to-earnings ratio..."),
            ]
        );

        app.on_tick().await;
        assert_eq!(app.success_flash, SUCCESS_FLASH_TICKS - 1);
        app.on_tick().await;
        app.on_tick().await;
        assert_eq!(app.success_flash, 0);
    }
}
