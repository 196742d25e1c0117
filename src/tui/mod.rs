//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! translates keyboard events into core::Action values, and executes the
//! effects `update()` returns: spawning stream tasks, starting the scroll
//! glide, and firing directory calls.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! The event loop uses conditional redraw to avoid unnecessary work:
//!
//! - **Animating** (streaming, thinking, or a scroll glide in flight):
//!   draws every ~80ms for smooth motion.
//! - **Idle**: sleeps up to 500ms, only redraws on events or resize.
//!
//! ## Concurrency
//!
//! Background tasks (stream ingest, directory calls) run on tokio and talk
//! back exclusively through an `mpsc::Sender<Action>`; every state mutation
//! happens in `update()` on this thread. Esc while a cycle is active aborts
//! the ingest task and routes the cycle down the `Aborted` failure path,
//! keeping whatever content already arrived.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};

use chrono::Local;
use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::api::chat::{ChatService, HttpChatService, PollingChatService, StreamError};
use crate::api::directory::{HttpSessionDirectory, SessionDirectory};
use crate::api::types::WireMessage;
use crate::core::action::{Action, Effect, update};
use crate::core::config::{ResolvedConfig, Transport};
use crate::core::ingest::StreamIngestor;
use crate::core::message::{MessageStore, Role};
use crate::core::state::App;
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState, SessionPanelEvent, SessionPanelState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    // Persistent component states
    pub message_list: MessageListState,
    pub input_box: InputBox,
    // Animation state
    pub pulse_value: f32,
    // Session panel overlay (None = hidden)
    pub session_panel: Option<SessionPanelState>,
}

impl TuiState {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self {
            message_list: MessageListState::new(config.scroll_duration, config.list_gap),
            input_box: InputBox::new(),
            pulse_value: 0.0,
            session_panel: None,
        }
    }

    #[cfg(test)]
    pub fn for_test() -> Self {
        use crate::core::config::KarteConfig;
        Self::new(&ResolvedConfig::resolve(&KarteConfig::default(), None, None, None))
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Enable the Kitty keyboard protocol unconditionally (allows
        // Shift+Enter detection). Terminals that don't support it ignore
        // the flags; Ctrl+J stays available as the newline fallback.
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Build the chat transport selected by config.
pub fn build_chat_service(config: &ResolvedConfig) -> Arc<dyn ChatService> {
    match config.transport {
        Transport::Stream => Arc::new(HttpChatService::new(config.base_url.clone())),
        Transport::Polling => Arc::new(PollingChatService::new(
            config.base_url.clone(),
            config.poll_interval,
        )),
    }
}

/// The wire history for a submit: every turn up to and including the new
/// user message, excluding the still-empty assistant placeholder.
fn wire_history(store: &MessageStore) -> Vec<WireMessage> {
    let messages = store.messages();
    let end = if messages
        .last()
        .is_some_and(|m| m.role == Role::Assistant && m.content.is_empty())
    {
        messages.len() - 1
    } else {
        messages.len()
    };
    messages[..end].iter().map(WireMessage::from).collect()
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let chat = build_chat_service(&config);
    let directory: Arc<dyn SessionDirectory> =
        Arc::new(HttpSessionDirectory::new(config.base_url.clone()));

    let mut app = App::new(Local::now());
    let mut tui = TuiState::new(&config);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    // Abort handles for the current stream cycle (used by Escape-to-cancel)
    let mut active_abort_handles: Vec<tokio::task::AbortHandle> = Vec::new();

    // Startup: register the initial session and fetch the list, both
    // fire-and-forget — session identity is locally authoritative.
    spawn_register_session(
        directory.clone(),
        app.current_session.id.clone(),
        app.current_session.name.clone(),
    );
    spawn_refresh_sessions(directory.clone(), tx.clone());

    let start_time = std::time::Instant::now();
    let mut needs_redraw = true; // Force first frame
    let mut should_quit = false;

    loop {
        // Sync InputBox props with App state
        tui.input_box.disabled = app.is_loading;

        let animating =
            app.is_loading || app.is_thinking || tui.message_list.animator.is_running();
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let elapsed = start_time.elapsed().as_secs_f32();
            tui.pulse_value = (elapsed * 5.0).sin() * 0.5 + 0.5;
            let spinner_frame = (elapsed * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        // Dynamic poll timeout: short when animating (~12fps), long when idle
        let timeout = if animating {
            std::time::Duration::from_millis(80)
        } else {
            std::time::Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);

        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if matches!(event, TuiEvent::Resize) {
                continue;
            }

            // Ctrl+C always quits regardless of mode
            if matches!(event, TuiEvent::ForceQuit) {
                if update(&mut app, Action::Quit) == Effect::Quit {
                    should_quit = true;
                }
                continue;
            }

            // Ctrl+O opens the session panel
            if matches!(event, TuiEvent::OpenSessionPanel) {
                tui.session_panel = Some(SessionPanelState::new(app.sessions.len()));
                continue;
            }

            // When the panel is open, route all events to it
            if let Some(panel) = &mut tui.session_panel {
                if let Some(panel_event) = panel.handle_event(&event, &app.sessions) {
                    match panel_event {
                        SessionPanelEvent::Open(id) => {
                            let effect = update(&mut app, Action::OpenSession(id));
                            execute_effect(
                                effect,
                                &mut app,
                                &mut tui,
                                &chat,
                                &directory,
                                &tx,
                                &mut active_abort_handles,
                                &mut should_quit,
                            );
                            tui.session_panel = None;
                        }
                        SessionPanelEvent::CreateNew => {
                            let effect = update(&mut app, Action::NewSession);
                            execute_effect(
                                effect,
                                &mut app,
                                &mut tui,
                                &chat,
                                &directory,
                                &tx,
                                &mut active_abort_handles,
                                &mut should_quit,
                            );
                            tui.session_panel = None;
                        }
                        SessionPanelEvent::Rename { id, name } => {
                            let effect = update(&mut app, Action::RenameSession { id, name });
                            execute_effect(
                                effect,
                                &mut app,
                                &mut tui,
                                &chat,
                                &directory,
                                &tx,
                                &mut active_abort_handles,
                                &mut should_quit,
                            );
                        }
                        SessionPanelEvent::Dismiss => {
                            tui.session_panel = None;
                        }
                    }
                }
                continue;
            }

            // Ctrl+N starts a fresh chat
            if matches!(event, TuiEvent::NewSession) {
                let effect = update(&mut app, Action::NewSession);
                execute_effect(
                    effect,
                    &mut app,
                    &mut tui,
                    &chat,
                    &directory,
                    &tx,
                    &mut active_abort_handles,
                    &mut should_quit,
                );
                continue;
            }

            // Esc while streaming → abort the cycle, keep partial content
            if matches!(event, TuiEvent::Escape) && app.is_loading {
                for handle in active_abort_handles.drain(..) {
                    handle.abort();
                }
                let effect = update(&mut app, Action::StreamFailed(StreamError::Aborted));
                execute_effect(
                    effect,
                    &mut app,
                    &mut tui,
                    &chat,
                    &directory,
                    &tx,
                    &mut active_abort_handles,
                    &mut should_quit,
                );
                continue;
            }

            // Scroll gestures go to the message list (cancelling the glide)
            if matches!(
                event,
                TuiEvent::ScrollUp
                    | TuiEvent::ScrollDown
                    | TuiEvent::ScrollPageUp
                    | TuiEvent::ScrollPageDown
            ) {
                tui.message_list.handle_event(&event);
                continue;
            }

            // Arrow keys scroll the conversation; the input box handles
            // horizontal movement itself.
            if matches!(event, TuiEvent::CursorUp) {
                tui.message_list.handle_event(&TuiEvent::ScrollUp);
                continue;
            }
            if matches!(event, TuiEvent::CursorDown) {
                tui.message_list.handle_event(&TuiEvent::ScrollDown);
                continue;
            }

            // Everything else belongs to the input box
            if let Some(input_event) = tui.input_box.handle_event(&event) {
                match input_event {
                    InputEvent::Submit(text) => {
                        if !app.is_loading {
                            let effect = update(&mut app, Action::Submit(text));
                            execute_effect(
                                effect,
                                &mut app,
                                &mut tui,
                                &chat,
                                &directory,
                                &tx,
                                &mut active_abort_handles,
                                &mut should_quit,
                            );
                        }
                    }
                    InputEvent::ContentChanged => {}
                }
            }
        }

        if should_quit {
            break;
        }

        // Handle background task actions (stream fragments, directory results)
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            let effect = update(&mut app, action);
            execute_effect(
                effect,
                &mut app,
                &mut tui,
                &chat,
                &directory,
                &tx,
                &mut active_abort_handles,
                &mut should_quit,
            );
        }

        if should_quit {
            break;
        }
    }

    ratatui::restore();
    Ok(())
}

/// Execute one effect returned by `update()`. I/O lives here, never in core.
#[allow(clippy::too_many_arguments)]
fn execute_effect(
    effect: Effect,
    app: &mut App,
    tui: &mut TuiState,
    chat: &Arc<dyn ChatService>,
    directory: &Arc<dyn SessionDirectory>,
    tx: &mpsc::Sender<Action>,
    active_abort_handles: &mut Vec<tokio::task::AbortHandle>,
    should_quit: &mut bool,
) {
    match effect {
        Effect::None => {}
        Effect::Quit => *should_quit = true,
        Effect::StartCycle => {
            // Motion starts with the submit, before the network resolves.
            tui.message_list.start_glide();
            *active_abort_handles = spawn_stream(
                chat.clone(),
                app.current_session.id.clone(),
                wire_history(&app.store),
                tx.clone(),
            );
        }
        Effect::RefreshSessions => {
            spawn_refresh_sessions(directory.clone(), tx.clone());
        }
        Effect::RegisterSession { id, name } => {
            tui.message_list.reset_view();
            spawn_register_session(directory.clone(), id, name);
        }
        Effect::PersistRename { id, name } => {
            spawn_rename_session(directory.clone(), id, name);
        }
        Effect::FetchHistory(id) => {
            tui.message_list.reset_view();
            spawn_fetch_history(directory.clone(), id, tx.clone());
        }
    }
}

fn spawn_stream(
    chat: Arc<dyn ChatService>,
    session_id: String,
    history: Vec<WireMessage>,
    tx: mpsc::Sender<Action>,
) -> Vec<tokio::task::AbortHandle> {
    info!("Spawning stream request for session {session_id}");
    let handle = tokio::spawn(async move {
        match chat.open(&session_id, history).await {
            Ok(stream) => StreamIngestor::new(stream).run(tx).await,
            Err(e) => {
                info!("Stream open failed: {e}");
                if tx.send(Action::StreamFailed(e)).is_err() {
                    warn!("Failed to send stream error action: receiver dropped");
                }
            }
        }
    });
    vec![handle.abort_handle()]
}

fn spawn_refresh_sessions(directory: Arc<dyn SessionDirectory>, tx: mpsc::Sender<Action>) {
    tokio::spawn(async move {
        match directory.list_sessions().await {
            Ok(sessions) => {
                if tx.send(Action::SessionsLoaded(sessions)).is_err() {
                    warn!("Failed to send session list: receiver dropped");
                }
            }
            // Stale list self-corrects on the next successful refresh.
            Err(e) => warn!("Session list refresh failed: {e}"),
        }
    });
}

fn spawn_register_session(directory: Arc<dyn SessionDirectory>, id: String, name: String) {
    tokio::spawn(async move {
        if let Err(e) = directory.create_session(&id, &name).await {
            warn!("Session registration failed for {id}: {e}");
        }
    });
}

fn spawn_rename_session(directory: Arc<dyn SessionDirectory>, id: String, name: String) {
    tokio::spawn(async move {
        if let Err(e) = directory.rename_session(&id, &name).await {
            // No rollback: the local name stays until the next refresh.
            warn!("Rename persistence failed for {id}: {e}");
        }
    });
}

fn spawn_fetch_history(
    directory: Arc<dyn SessionDirectory>,
    id: String,
    tx: mpsc::Sender<Action>,
) {
    tokio::spawn(async move {
        match directory.history(&id).await {
            Ok(turns) => {
                if tx
                    .send(Action::HistoryLoaded {
                        session_id: id,
                        turns,
                    })
                    .is_err()
                {
                    warn!("Failed to send history: receiver dropped");
                }
            }
            Err(e) => warn!("History fetch failed for {id}: {e}"),
        }
    });
}
