//! Frame composition: title bar, message list, input box, and the session
//! panel overlay. Pure layout — all state lives in `App` and `TuiState`.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{MessageList, SessionPanel};

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};

    let input_height = tui.input_box.calculate_height(frame.area().width);
    let layout = Layout::vertical([Length(1), Min(0), Length(input_height)]);
    let [title_area, main_area, input_area] = layout.areas(frame.area());

    // Title bar
    let title = Line::from(vec![
        Span::styled("カルテ", Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        Span::raw(app.current_session.name.as_str()),
        Span::raw(" | "),
        Span::styled(
            app.status_message.as_str(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(title, title_area);

    // Conversation
    let mut message_list = MessageList::new(
        &mut tui.message_list,
        &app.store,
        app.is_loading,
        app.is_thinking,
        tui.pulse_value,
        spinner_frame,
    );
    message_list.render(frame, main_area);

    // Input
    tui.input_box.render(frame, input_area);

    // Session panel overlay
    if let Some(panel_state) = &mut tui.session_panel {
        let mut panel = SessionPanel::new(panel_state, &app.sessions, &app.current_session.id);
        panel.render(frame, frame.area());
    }
}
