//! # InputBox Component
//!
//! Text entry with an auto-growing height: the box follows its content
//! between [`MIN_ROWS`] and [`MAX_ROWS`] rows and snaps back to one row
//! after submit. Enter submits; Shift+Enter (or Ctrl+J) inserts a newline.
//! The box is disabled for the whole request lifetime of a submit cycle.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

pub const MIN_ROWS: u16 = 1;
pub const MAX_ROWS: u16 = 6;

/// Borders top + bottom.
const VERTICAL_OVERHEAD: u16 = 2;
/// Borders left + right.
const HORIZONTAL_OVERHEAD: u16 = 2;

const PLACEHOLDER: &str = "症状や質問を入力...";
const HINT: &str = " Enter 送信 ・ Shift+Enter 改行 ";

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// User submitted the text (Enter pressed)
    Submit(String),
    /// Text content changed
    ContentChanged,
}

pub struct InputBox {
    /// Text buffer (internal state)
    pub buffer: String,
    /// True while a submit cycle is in flight (prop from App state)
    pub disabled: bool,
    /// Cursor byte position within the buffer
    cursor: usize,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            disabled: false,
            cursor: 0,
        }
    }

    /// Required height for the current content, clamped to
    /// `[MIN_ROWS + borders, MAX_ROWS + borders]`.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let inner = width.saturating_sub(HORIZONTAL_OVERHEAD);
        let rows = wrap_line_count(&self.buffer, inner).clamp(MIN_ROWS, MAX_ROWS);
        rows + VERTICAL_OVERHEAD
    }

    fn prev_boundary(&self) -> usize {
        let mut pos = self.cursor;
        while pos > 0 {
            pos -= 1;
            if self.buffer.is_char_boundary(pos) {
                break;
            }
        }
        pos
    }

    fn next_boundary(&self) -> usize {
        let mut pos = self.cursor;
        while pos < self.buffer.len() {
            pos += 1;
            if self.buffer.is_char_boundary(pos) {
                break;
            }
        }
        pos
    }

    /// Visual cursor position inside `area` (which includes borders).
    fn screen_pos(&self, area: Rect) -> (u16, u16) {
        let inner = area.width.saturating_sub(HORIZONTAL_OVERHEAD);
        let prefix = &self.buffer[..self.cursor];
        let rows = wrap_line_count(prefix, inner).max(1);
        let last_line = prefix.rsplit('\n').next().unwrap_or("");
        let col = if inner == 0 {
            0
        } else {
            let w = last_line.width() as u16;
            w % inner.max(1)
        };
        let row = (rows - 1).min(MAX_ROWS - 1);
        (area.x + 1 + col, area.y + 1 + row)
    }
}

/// Number of visual rows `text` occupies when wrapped to `width` columns.
/// Display-width aware, so CJK input counts double-width cells.
fn wrap_line_count(text: &str, width: u16) -> u16 {
    if width == 0 {
        return MIN_ROWS;
    }
    let options = textwrap::Options::new(width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace);
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                1
            } else {
                textwrap::wrap(line, &options).len() as u16
            }
        })
        .sum::<u16>()
        .max(1)
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let border_style = if self.disabled {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::bordered()
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(border_style)
            .title_bottom(Line::from(HINT).right_aligned());

        let paragraph = if self.buffer.is_empty() {
            Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
        } else {
            Paragraph::new(self.buffer.as_str()).style(Style::default().fg(Color::White))
        }
        .block(block)
        .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, area);

        if !self.disabled {
            let (x, y) = self.screen_pos(area);
            frame.set_cursor_position((x, y));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if self.disabled {
            return None;
        }
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Newline => {
                self.buffer.insert(self.cursor, '\n');
                self.cursor += 1;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.buffer.insert_str(self.cursor, text);
                self.cursor += text.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => {
                if self.cursor > 0 {
                    let prev = self.prev_boundary();
                    self.buffer.drain(prev..self.cursor);
                    self.cursor = prev;
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::Delete => {
                if self.cursor < self.buffer.len() {
                    let next = self.next_boundary();
                    self.buffer.drain(self.cursor..next);
                    Some(InputEvent::ContentChanged)
                } else {
                    None
                }
            }
            TuiEvent::CursorLeft => {
                if self.cursor > 0 {
                    self.cursor = self.prev_boundary();
                }
                None
            }
            TuiEvent::CursorRight => {
                if self.cursor < self.buffer.len() {
                    self.cursor = self.next_boundary();
                }
                None
            }
            TuiEvent::CursorHome => {
                self.cursor = self.buffer[..self.cursor]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                None
            }
            TuiEvent::CursorEnd => {
                self.cursor = self.buffer[self.cursor..]
                    .find('\n')
                    .map(|i| self.cursor + i)
                    .unwrap_or(self.buffer.len());
                None
            }
            TuiEvent::Submit => {
                if self.buffer.trim().is_empty() {
                    return None;
                }
                let text = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}
