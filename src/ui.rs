use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, InputMode};
use crate::state::Sender;
use crate::theme::Palette;

const INPUT_TITLE: &str = " Your Investment Question ";
const CHAT_TITLE: &str = " Investment Insights ";

/// Render `**bold**` runs in a reply line. An unclosed `**` stays literal.
fn styled_reply_line(text: &str, base: Style) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    // With an even number of parts the last `**` never closes
    let closed = if parts.len() % 2 == 0 { parts.len() - 1 } else { parts.len() };

    let mut spans: Vec<Span<'static>> = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if i >= closed {
            spans.push(Span::styled(format!("**{}", part), base));
        } else if i % 2 == 1 {
            if part.is_empty() {
                spans.push(Span::styled("****", base));
            } else {
                spans.push(Span::styled(part.to_string(), base.add_modifier(Modifier::BOLD)));
            }
        } else if !part.is_empty() {
            spans.push(Span::styled(part.to_string(), base));
        }
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = app.theme.palette();

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background).fg(palette.text)),
        area,
    );

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [input_area, chat_area] = Layout::horizontal([
        Constraint::Percentage(35),
        Constraint::Percentage(65),
    ])
    .areas(body_area);

    render_header(app, frame, header_area, &palette);
    render_input_pane(app, frame, input_area, &palette);
    render_chat(app, frame, chat_area, &palette);
    render_footer(app, frame, footer_area, &palette);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let [title_area, toggle_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(12),
    ])
    .areas(area);

    let title = Line::from(vec![
        Span::styled(" Insight ", Style::default().fg(palette.focus).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), title_area);

    let toggle = Paragraph::new(format!("{} t theme ", app.theme.icon()))
        .style(Style::default().fg(palette.muted))
        .alignment(Alignment::Right);
    frame.render_widget(toggle, toggle_area);
}

fn render_input_pane(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let [input_area, button_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let submitting = app.conversation.is_submitting();
    let editing = app.input_mode == InputMode::Editing;

    let border_color = if submitting {
        palette.disabled
    } else if editing {
        palette.focus
    } else {
        palette.border
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(INPUT_TITLE);

    // Horizontal scrolling keeps the cursor inside the box
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width > 0 && cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .conversation
        .pending_input()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_color = if submitting { palette.disabled } else { palette.text };
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(input_block);
    frame.render_widget(input, input_area);

    if editing && !submitting {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }

    // Submit affordance
    let (label, style) = if submitting {
        ("Processing...", Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC))
    } else if app.conversation.can_submit() {
        ("Submit", Style::default().bg(palette.button).fg(palette.button_text).bold())
    } else {
        ("Submit", Style::default().fg(palette.disabled))
    };
    let button = Paragraph::new(label)
        .style(style)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        );
    frame.render_widget(button, button_area);

    if app.success_flash > 0 {
        let check = Paragraph::new("✓")
            .style(Style::default().fg(palette.success).bold())
            .alignment(Alignment::Center);
        frame.render_widget(check, status_area);
    }
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    app.chat_area = Some(area);
    // Inner size minus borders, for scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(CHAT_TITLE);

    let submitting = app.conversation.is_submitting();
    let chat_text = if app.conversation.log().is_empty() && !submitting {
        Text::from(Span::styled(
            "Ask a question about stocks, funds or investment strategy...",
            Style::default().fg(palette.muted),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        let text_style = Style::default().fg(palette.text);

        for msg in app.conversation.log() {
            match msg.sender() {
                Sender::User => {
                    lines.push(
                        Line::from(Span::styled(
                            format!("{} ●", msg.sender().display_name()),
                            Style::default().fg(palette.user).add_modifier(Modifier::BOLD),
                        ))
                        .alignment(Alignment::Right),
                    );
                    for line in msg.text().lines() {
                        lines.push(Line::styled(line.to_string(), text_style).alignment(Alignment::Right));
                    }
                }
                Sender::Assistant => {
                    lines.push(Line::from(Span::styled(
                        format!("● {}", msg.sender().display_name()),
                        Style::default().fg(palette.assistant).add_modifier(Modifier::BOLD),
                    )));
                    for line in msg.text().lines() {
                        lines.push(styled_reply_line(line, text_style));
                    }
                }
            }
            lines.push(Line::default());
        }

        if submitting {
            // Animated ellipsis: ".", "..", "..."
            let dots = ".".repeat(app.animation_frame as usize + 1);
            lines.push(Line::from(Span::styled(
                format!("AI is thinking{}", dots),
                Style::default().fg(palette.assistant).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text).wrap(Wrap { trim: false });

    // Measure with the same wrapping that draws it
    app.chat_lines = chat.line_count(inner_width).min(u16::MAX as usize) as u16;
    app.chat_scroll = if app.follow_chat {
        app.max_chat_scroll()
    } else {
        app.chat_scroll.min(app.max_chat_scroll())
    };

    let chat = chat.block(block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(palette.button).fg(palette.button_text)),
        InputMode::Editing => (" INSERT ", Style::default().bg(palette.success).fg(palette.background)),
    };

    let key_style = Style::default().fg(palette.focus).bold();
    let label_style = Style::default().fg(palette.muted);

    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Normal => &[
            ("i", "ask"),
            ("j/k", "scroll"),
            ("g/G", "top/bottom"),
            ("t", "theme"),
            ("q", "quit"),
        ],
        InputMode::Editing => &[
            ("Enter", "submit"),
            ("Esc", "done"),
            ("^T", "theme"),
            ("^C", "quit"),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!("{} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Settings, DEFAULT_API_URL};
    use crate::theme::Theme;
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> App {
        App::new(&Settings {
            api_url: DEFAULT_API_URL.to_string(),
            theme: Theme::Dark,
        })
    }

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn bold_runs_are_styled() {
        let line = styled_reply_line("a **P/E** ratio", Style::default());
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "P/E");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(plain(&line), "a P/E ratio");
    }

    #[test]
    fn unclosed_bold_stays_literal() {
        let line = styled_reply_line("growth **stocks", Style::default());
        assert_eq!(plain(&line), "growth **stocks");
        assert!(line.spans.iter().all(|s| !s.style.add_modifier.contains(Modifier::BOLD)));
    }

    #[test]
    fn empty_screen_shows_titles_and_placeholder() {
        let mut app = app();
        let text = screen(&mut app);
        assert!(text.contains("Insight"));
        assert!(text.contains("Your Investment Question"));
        assert!(text.contains("Investment Insights"));
        assert!(text.contains("Ask a question"));
        assert!(text.contains("Submit"));
    }

    #[test]
    fn in_flight_screen_shows_processing_and_thinking() {
        let mut app = app();
        app.conversation.on_input_change("What is a P/E ratio?");
        app.conversation.begin_submit();

        let text = screen(&mut app);
        assert!(text.contains("You"));
        assert!(text.contains("What is a P/E ratio?"));
        assert!(text.contains("Processing..."));
        assert!(text.contains("AI is thinking."));
        // sender, question, separator, thinking row
        assert_eq!(app.chat_lines, 4);
    }

    fn long_reply() -> String {
        let word = "x".repeat(40);
        let mut reply = vec![word; 30].join(" ");
        reply.push_str(" ENDMARK");
        reply
    }

    #[test]
    fn long_reply_end_is_visible_after_auto_scroll() {
        let mut app = app();
        app.conversation.on_input_change("Tell me everything");
        app.conversation.begin_submit();
        screen(&mut app);

        app.conversation.settle(Ok(long_reply()));
        app.scroll_chat_to_bottom();
        let text = screen(&mut app);

        // Each 40-char word takes its own line at 63 columns
        assert!(app.chat_lines >= 30 + 4);
        assert_eq!(app.chat_scroll, app.chat_lines - app.chat_height);
        assert!(text.contains("ENDMARK"));
        assert!(!text.contains("Tell me everything"));
    }

    #[test]
    fn long_reply_end_is_reachable_by_scrolling() {
        let mut app = app();
        app.conversation.on_input_change("Tell me everything");
        app.conversation.begin_submit();
        app.conversation.settle(Ok(long_reply()));
        screen(&mut app);

        app.scroll_to_top();
        let text = screen(&mut app);
        assert!(text.contains("Tell me everything"));
        assert!(!text.contains("ENDMARK"));

        app.scroll_down(1000);
        let text = screen(&mut app);
        assert!(text.contains("ENDMARK"));
        assert_eq!(app.chat_scroll, app.max_chat_scroll());
    }

    #[test]
    fn settled_reply_is_rendered() {
        let mut app = app();
        app.conversation.on_input_change("Hi");
        app.conversation.begin_submit();
        app.conversation.settle(Ok("Hello, **investor**".to_string()));

        let text = screen(&mut app);
        assert!(text.contains("AI Assistant"));
        assert!(text.contains("Hello, investor"));
        assert!(!text.contains("thinking"));
    }
}
