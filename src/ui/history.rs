//! Conversation history display component

use crate::store::{Message, MessageStatus, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Renders a snapshot of the conversation log, anchored to the bottom.
pub struct ChatHistory<'a> {
    messages: &'a [Message],
}

impl<'a> ChatHistory<'a> {
    pub fn new(messages: &'a [Message]) -> Self {
        Self { messages }
    }

    /// Render a single message into lines
    fn render_message(&self, message: &Message, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let role_icon = match message.role {
            Role::User => "👤",
            Role::Assistant => "🤖",
        };
        let timestamp = message.created_at.format("%H:%M:%S").to_string();
        let header = format!("{} {} {}", role_icon, timestamp, "─".repeat(20));
        lines.push(Line::from(Span::styled(
            header,
            Style::default().fg(Color::DarkGray),
        )));

        let streaming = message.status == MessageStatus::Streaming;
        let content_lines = wrap_text(&message.text, width.saturating_sub(2) as usize);
        let total = content_lines.len();
        for (i, content_line) in content_lines.into_iter().enumerate() {
            let cursor = if streaming && i == total - 1 { "▋" } else { "" };
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, self.content_style(message)),
                Span::styled(cursor, Style::default().fg(Color::Yellow)),
            ]));
        }

        lines
    }

    fn content_style(&self, message: &Message) -> Style {
        let base = match message.role {
            Role::User => Style::default().fg(Color::Blue),
            Role::Assistant => Style::default().fg(Color::Green),
        };
        if message.status == MessageStatus::Pending {
            base.add_modifier(Modifier::ITALIC)
        } else {
            base
        }
    }
}

impl Widget for ChatHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("💬 chirp");
        let inner_area = block.inner(area);
        block.render(area, buf);

        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.messages {
            let mut lines = self.render_message(message, inner_area.width);
            all_lines.append(&mut lines);
            // spacing between messages
            all_lines.push(Line::from(Span::raw("")));
        }

        // Show the most recent lines that fit.
        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Wrap text to fit within the given width
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        // Widths are in characters; byte lengths overcount multibyte text.
        if current_line.chars().count() + word.chars().count() + 1 <= width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !current_line.is_empty() {
                lines.push(current_line);
                current_line = String::new();
            }
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = wrap_text("the quick brown fox jumps", 11);
        assert_eq!(lines, ["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn width_counts_characters_not_bytes() {
        // Each word is 5 characters (10 bytes); two fit per 11-wide line.
        let lines = wrap_text("ünïtë ünïtë ünïtë", 11);
        assert_eq!(lines, ["ünïtë ünïtë", "ünïtë"]);
    }

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(wrap_text("hi", 40), ["hi"]);
    }

    #[test]
    fn empty_text_yields_one_blank_line() {
        assert_eq!(wrap_text("", 40), [""]);
    }

    #[test]
    fn zero_width_passes_text_through() {
        assert_eq!(wrap_text("unbroken", 0), ["unbroken"]);
    }
}
