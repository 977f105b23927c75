use crate::ui::commands::{parse_slash_command, SlashCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerResult {
    Submitted(String),
    Command(SlashCommand),
    None,
}

/// Single-line input area for drafting messages
#[derive(Debug, Clone)]
pub struct Composer {
    content: String,
    /// Cursor position in characters, not bytes.
    cursor: usize,
    placeholder: String,
}

impl Composer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            placeholder: placeholder.into(),
        }
    }

    /// Handle key input, returning the submitted draft or command if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char('\n');
                } else if !self.content.trim().is_empty() {
                    let content = std::mem::take(&mut self.content);
                    self.cursor = 0;
                    if let Some(command) = parse_slash_command(&content) {
                        return ComposerResult::Command(command);
                    }
                    return ComposerResult::Submitted(content);
                }
            }
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.content.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.content.chars().count() {
                    let at = self.byte_index(self.cursor);
                    self.content.remove(at);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.content.chars().count());
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.content.chars().count(),
            _ => {}
        }

        ComposerResult::None
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    /// Convert the character cursor to a byte index for UTF-8 safe edits.
    fn byte_index(&self, char_idx: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }
}

impl Widget for &Composer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("Message");
        let inner = block.inner(area);
        block.render(area, buf);

        let line = if self.content.is_empty() {
            Line::from(Span::styled(
                self.placeholder.clone(),
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            // Show the tail when the draft outgrows the pane.
            let width = inner.width.saturating_sub(1) as usize;
            let chars: Vec<char> = self.content.chars().collect();
            let start = chars.len().saturating_sub(width);
            let visible: String = chars[start..].iter().collect();
            Line::from(vec![
                Span::raw(visible),
                Span::styled("▏", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ])
        };

        if inner.height > 0 {
            buf.set_line(inner.x, inner.y, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &mut Composer, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_trimmed_draft() {
        let mut composer = Composer::new("say something...");
        type_text(&mut composer, "hello there");
        assert_eq!(
            composer.handle_key(press(KeyCode::Enter)),
            ComposerResult::Submitted("hello there".to_string())
        );
        assert!(composer.is_empty());
    }

    #[test]
    fn enter_on_blank_input_does_nothing() {
        let mut composer = Composer::new("");
        type_text(&mut composer, "   ");
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerResult::None);
    }

    #[test]
    fn slash_input_becomes_a_command() {
        let mut composer = Composer::new("");
        type_text(&mut composer, "/bye");
        assert_eq!(
            composer.handle_key(press(KeyCode::Enter)),
            ComposerResult::Command(SlashCommand::Bye)
        );
    }

    #[test]
    fn editing_is_utf8_safe() {
        let mut composer = Composer::new("");
        type_text(&mut composer, "héllo");
        composer.handle_key(press(KeyCode::Left));
        composer.handle_key(press(KeyCode::Left));
        composer.handle_key(press(KeyCode::Backspace));
        assert_eq!(
            composer.handle_key(press(KeyCode::Enter)),
            ComposerResult::Submitted("hélo".to_string())
        );
    }
}
