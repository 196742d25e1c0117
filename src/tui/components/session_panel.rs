//! # Session Panel Component
//!
//! Full-screen overlay for browsing, opening, creating, and renaming
//! sessions. Opened with Ctrl+O, dismissed with Esc.
//!
//! Rename is in-place: `r` starts editing the selected row with the current
//! name prefilled, Enter commits (the rename applies optimistically and
//! persists fire-and-forget), Esc cancels the edit first and only then
//! dismisses the panel. Sessions are never deleted client-side.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `SessionPanelState` lives in `TuiState`
//! - `SessionPanel` is created each frame with borrowed state

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph};

use crate::core::session::SessionList;
use crate::tui::event::TuiEvent;

/// In-flight rename edit.
struct NameEdit {
    id: String,
    buffer: String,
}

/// Persistent state for the session panel overlay.
pub struct SessionPanelState {
    pub selected: usize,
    pub list_state: ListState,
    edit: Option<NameEdit>,
}

impl SessionPanelState {
    pub fn new(session_count: usize) -> Self {
        let mut list_state = ListState::default();
        if session_count > 0 {
            list_state.select(Some(0));
        }
        Self {
            selected: 0,
            list_state,
            edit: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    /// Handle a key event against the current session list, returning a
    /// panel event when the overlay should act.
    pub fn handle_event(&mut self, event: &TuiEvent, sessions: &SessionList) -> Option<SessionPanelEvent> {
        if let Some(edit) = &mut self.edit {
            return match event {
                TuiEvent::InputChar(c) => {
                    edit.buffer.push(*c);
                    None
                }
                TuiEvent::Paste(text) => {
                    edit.buffer.push_str(text);
                    None
                }
                TuiEvent::Backspace => {
                    edit.buffer.pop();
                    None
                }
                TuiEvent::Submit => {
                    let edit = self.edit.take()?;
                    Some(SessionPanelEvent::Rename {
                        id: edit.id,
                        name: edit.buffer,
                    })
                }
                TuiEvent::Escape => {
                    self.edit = None;
                    None
                }
                _ => None,
            };
        }

        match event {
            TuiEvent::Escape => Some(SessionPanelEvent::Dismiss),
            TuiEvent::CursorUp | TuiEvent::ScrollUp => {
                if !sessions.is_empty() {
                    self.selected = self.selected.saturating_sub(1);
                    self.list_state.select(Some(self.selected));
                }
                None
            }
            TuiEvent::CursorDown | TuiEvent::ScrollDown => {
                if !sessions.is_empty() {
                    self.selected = (self.selected + 1).min(sessions.len() - 1);
                    self.list_state.select(Some(self.selected));
                }
                None
            }
            TuiEvent::Submit => sessions
                .get(self.selected)
                .map(|session| SessionPanelEvent::Open(session.id.clone())),
            TuiEvent::InputChar('n') => Some(SessionPanelEvent::CreateNew),
            TuiEvent::InputChar('r') => {
                if let Some(session) = sessions.get(self.selected) {
                    self.edit = Some(NameEdit {
                        id: session.id.clone(),
                        buffer: session.name.clone(),
                    });
                }
                None
            }
            _ => None,
        }
    }
}

/// Events emitted by the session panel.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionPanelEvent {
    Open(String),
    CreateNew,
    Rename { id: String, name: String },
    Dismiss,
}

/// Transient render wrapper for the session panel overlay.
pub struct SessionPanel<'a> {
    state: &'a mut SessionPanelState,
    sessions: &'a SessionList,
    active_id: &'a str,
}

impl<'a> SessionPanel<'a> {
    pub fn new(state: &'a mut SessionPanelState, sessions: &'a SessionList, active_id: &'a str) -> Self {
        Self {
            state,
            sessions,
            active_id,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(70, 70, area);
        frame.render_widget(Clear, overlay);

        let help_text = if self.state.is_editing() {
            " Enter 確定 | Esc キャンセル "
        } else {
            " n 新規  r 名前変更  Enter 開く  Esc 閉じる "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" セッション ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(help_text).centered())
            .padding(Padding::horizontal(1));

        if self.sessions.is_empty() {
            let empty = Paragraph::new("保存されたセッションはありません。")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, overlay);
            return;
        }

        let inner_width = overlay.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = self
            .sessions
            .sessions()
            .iter()
            .enumerate()
            .map(|(i, session)| {
                let is_selected = i == self.state.selected;
                let editing_this = is_selected
                    && self.state.edit.as_ref().is_some_and(|e| e.id == session.id);

                let marker = if session.id == self.active_id { "● " } else { "  " };
                let name: &str = if editing_this {
                    // The edit buffer is shown live while typing.
                    self.state.edit.as_ref().map(|e| e.buffer.as_str()).unwrap_or("")
                } else {
                    &session.name
                };
                let name = truncate_str(name, inner_width.saturating_sub(marker.len()));

                let style = if editing_this {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else if is_selected {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(Color::Gray)
                };

                ListItem::new(Line::from(vec![
                    Span::styled(marker, style),
                    Span::styled(name, style),
                ]))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, overlay, &mut self.state.list_state);
    }
}

/// Truncate a string to fit within `max_width` chars, adding "..." if needed.
fn truncate_str(s: &str, max_width: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        ".".repeat(max_width)
    } else {
        let head: String = chars[..max_width - 3].iter().collect();
        format!("{head}...")
    }
}

/// Compute a centered rect using percentage of the outer rect.
fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}
