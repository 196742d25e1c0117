//! # Message Component
//!
//! Renders a single chat turn with role-based styling. While the current
//! answer is still pending its first fragment, the empty assistant
//! placeholder shows the thinking indicator instead of an empty box.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Padding, Paragraph, Widget, Wrap};

use crate::core::message::{Message as ChatMessage, Role};
use crate::tui::component::Component;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// Pulse intensity threshold above which the border transitions from normal to BOLD.
const PULSE_BOLD_THRESHOLD: f32 = 0.6;
/// Pulse intensity threshold above which the border transitions from DIM to normal.
const PULSE_NORMAL_THRESHOLD: f32 = 0.2;

const SPINNER_FRAMES: [char; 4] = ['⠋', '⠙', '⠸', '⠴'];
const THINKING_LABEL: &str = "考え中…";

/// A stateless, per-frame view of one chat turn.
#[derive(Clone, Copy)]
pub struct MessageView<'a> {
    pub message: &'a ChatMessage,
    /// True when this is the trailing assistant turn of an active cycle and
    /// no fragment has arrived yet.
    pub thinking: bool,
    /// Current pulse intensity (0.0 to 1.0) while the answer streams in.
    pub pulse_intensity: f32,
    pub spinner_frame: usize,
}

impl<'a> MessageView<'a> {
    pub fn new(
        message: &'a ChatMessage,
        thinking: bool,
        pulse_intensity: f32,
        spinner_frame: usize,
    ) -> Self {
        Self {
            message,
            thinking,
            pulse_intensity,
            spinner_frame,
        }
    }

    /// Predict rendered height without rendering. The wrapping options must
    /// match Ratatui's `Paragraph` behavior so the scroll canvas and the
    /// drawn output agree (`textwrap` is display-width aware, which matters
    /// for CJK content).
    pub fn calculate_height(message: &ChatMessage, width: u16, thinking: bool) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Degenerate case: terminal too narrow for borders + padding.
            return 1;
        }

        let content = message.content.trim();
        if content.is_empty() {
            // The thinking indicator occupies one line inside the box.
            return if thinking {
                1 + VERTICAL_OVERHEAD
            } else {
                VERTICAL_OVERHEAD
            };
        }

        let options = textwrap::Options::new(content_width as usize)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);

        let lines = textwrap::wrap(content, options);
        (lines.len() as u16).max(1) + VERTICAL_OVERHEAD
    }
}

fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Cyan),
        Role::Assistant => Style::default().fg(Color::Green),
    }
}

impl<'a> Widget for MessageView<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = role_style(self.message.role);
        let mut border_style = style.add_modifier(Modifier::DIM);

        // Three-phase breathing while the answer streams: DIM → normal → BOLD.
        if self.pulse_intensity > PULSE_BOLD_THRESHOLD {
            border_style = border_style
                .remove_modifier(Modifier::DIM)
                .add_modifier(Modifier::BOLD);
        } else if self.pulse_intensity > PULSE_NORMAL_THRESHOLD {
            border_style = border_style.remove_modifier(Modifier::DIM);
        }

        let block = Block::bordered()
            .title(self.message.role.label())
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        let content = self.message.content.trim();
        if content.is_empty() && self.thinking {
            let spinner = SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()];
            let indicator = Paragraph::new(format!("{spinner} {THINKING_LABEL}"))
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
            indicator.render(inner_area, buf);
            return;
        }

        let paragraph = Paragraph::new(content)
            .style(style)
            .wrap(Wrap { trim: true });
        paragraph.render(inner_area, buf);
    }
}

impl<'a> Component for MessageView<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
