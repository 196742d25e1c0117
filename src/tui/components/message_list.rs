//! # MessageList Component
//!
//! Scrollable view of the conversation.
//!
//! ## Responsibilities
//!
//! - Height caching per message (layout measurements without rendering)
//! - Driving the scroll animator: the glide target (top edge of the newest
//!   user message) is re-measured every frame, so it tracks layout shifts
//!   while the answer below it grows
//! - Driving the filler calculator: the spacer below the anchor pair keeps
//!   the canvas height stable while content streams in
//! - Cancelling the glide on any user scroll gesture
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the store (props).
//! Since `Component::render` takes `&mut self`, the layout cache and scroll
//! state mutate during the render pass, aligning with Ratatui's
//! `StatefulWidget` pattern.

use std::time::{Duration, Instant};

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::filler::{AnchorMeasurements, FillerCalculator, LayoutEvent};
use crate::core::message::{MessageStore, Role};
use crate::core::scroll::ScrollAnimator;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::MessageView;
use crate::tui::event::TuiEvent;

/// Layout, scroll, and animation state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    /// Scroll offset and view state
    pub scroll_state: ScrollViewState,
    /// Cached layout measurements
    pub layout: LayoutCache,
    /// Submit-time glide toward the newest user message
    pub animator: ScrollAnimator,
    /// Spacer below the anchor pair
    pub filler: FillerCalculator,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
    // Change detection for filler recomputes
    seen_message_count: usize,
    seen_tail_len: Option<usize>,
    seen_assistant_height: Option<u16>,
}

impl MessageListState {
    pub fn new(scroll_duration: Duration, list_gap: u16) -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            animator: ScrollAnimator::new(scroll_duration),
            filler: FillerCalculator::new(list_gap),
            viewport_height: 0,
            seen_message_count: 0,
            seen_tail_len: None,
            seen_assistant_height: None,
        }
    }

    /// Begin the submit glide from wherever the viewport currently is.
    /// Supersedes any in-flight glide.
    pub fn start_glide(&mut self) {
        self.animator.start(self.scroll_state.offset().y);
    }

    /// Forget everything measured for the previous message set (session
    /// switch or history load).
    pub fn reset_view(&mut self) {
        self.scroll_state = ScrollViewState::default();
        self.layout = LayoutCache::new();
        self.filler.reset();
        self.seen_message_count = 0;
        self.seen_tail_len = None;
        self.seen_assistant_height = None;
    }

    /// Clamp scroll offset so it never exceeds the canvas bounds
    /// (content plus filler).
    fn clamp_scroll(&mut self, canvas_height: u16) {
        let max_y = canvas_height.saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Which layout change happened since the last frame, if any. Message
    /// set changes win over content growth; the resize case only fires
    /// while a stream is active, standing in for a size observer on the
    /// assistant anchor.
    fn detect_change(
        &self,
        message_count: usize,
        tail_len: Option<usize>,
        assistant_height: Option<u16>,
        is_loading: bool,
    ) -> Option<LayoutEvent> {
        if message_count != self.seen_message_count {
            Some(LayoutEvent::MessagesChanged)
        } else if tail_len != self.seen_tail_len {
            Some(LayoutEvent::ContentChanged)
        } else if is_loading && assistant_height != self.seen_assistant_height {
            Some(LayoutEvent::AnchorResized)
        } else {
            None
        }
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub store: &'a MessageStore,
    pub is_loading: bool,
    pub is_thinking: bool,
    pub pulse_value: f32,
    pub spinner_frame: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        store: &'a MessageStore,
        is_loading: bool,
        is_thinking: bool,
        pulse_value: f32,
        spinner_frame: usize,
    ) -> Self {
        Self {
            state,
            store,
            is_loading,
            is_thinking,
            pulse_value,
            spinner_frame,
        }
    }

    /// The trailing assistant turn of an active cycle shows the thinking
    /// indicator while empty.
    fn tail_thinking(&self, index: usize) -> bool {
        self.is_thinking
            && index == self.store.len().saturating_sub(1)
            && self.store.messages()[index].role == Role::Assistant
    }

    /// Anchor pair: the newest user message and the assistant message that
    /// follows it. `None` for either half when absent.
    fn anchor_indices(&self) -> (Option<usize>, Option<usize>) {
        let user_idx = self.store.last_index_of(Role::User);
        let assistant_idx = match (user_idx, self.store.last_index_of(Role::Assistant)) {
            (Some(u), Some(a)) if a > u => Some(a),
            _ => None,
        };
        (user_idx, assistant_idx)
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area
        let num_items = self.store.len();
        let messages = self.store.messages();

        // 1. Update layout cache. The tail is volatile whenever a cycle is
        // active or the tail is an assistant message — its cached height may
        // be stale from a streaming batch that completed between frames.
        let tail_is_volatile = self.is_loading
            || messages.last().is_some_and(|m| m.role == Role::Assistant);
        let reusable =
            self.state
                .layout
                .reusable_count(num_items, content_width, tail_is_volatile);
        self.state.layout.heights.truncate(reusable);

        for (i, message) in messages.iter().enumerate().skip(reusable) {
            let thinking = self.tail_thinking(i);
            let height = MessageView::calculate_height(message, content_width, thinking);
            self.state.layout.heights.push(height);
        }
        self.state.layout.rebuild_prefix_heights();
        self.state.layout.update_metadata(num_items, content_width);

        let total_height = self.state.layout.total_height();
        self.state.viewport_height = area.height;

        // 2. Filler: recompute on message-set change, trailing-content
        // change, or anchor growth while streaming.
        let (user_idx, assistant_idx) = self.anchor_indices();
        let tail_len = messages.last().map(|m| m.content.len());
        let assistant_height = assistant_idx.map(|i| self.state.layout.heights[i]);
        if let Some(event) = self.state.detect_change(
            num_items,
            tail_len,
            assistant_height,
            self.is_loading,
        ) {
            let measurements = AnchorMeasurements {
                viewport_height: area.height,
                user_anchor_height: user_idx.map(|i| self.state.layout.heights[i]),
                assistant_anchor_height: assistant_height,
            };
            self.state.filler.observe(event, measurements);
            self.state.seen_message_count = num_items;
            self.state.seen_tail_len = tail_len;
            self.state.seen_assistant_height = assistant_height;
        }

        // The filler pads the canvas below the answer so the anchor pair
        // can occupy a stable position while content grows.
        let canvas_height = total_height.saturating_add(self.state.filler.height());
        self.state.clamp_scroll(canvas_height);

        // 3. Advance the glide. The target is re-measured from the live
        // layout every frame; the start offset stays as captured at submit.
        match user_idx {
            Some(idx) => {
                let target = self.state.layout.anchor_top(idx);
                if let Some(offset) = self.state.animator.tick(Instant::now(), target) {
                    self.state.scroll_state.set_offset(Position { x: 0, y: offset });
                }
            }
            None => self.state.animator.cancel(),
        }

        // 4. Render visible messages into the scroll canvas.
        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self
            .state
            .layout
            .visible_range(scroll_offset, area.height);

        let mut scroll_view = ScrollView::new(Size::new(content_width, canvas_height.max(1)))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };

        for i in visible_range {
            let message = &messages[i];
            let height = self.state.layout.heights[i];
            let is_tail = i == num_items.saturating_sub(1);
            let pulse = if is_tail && self.is_loading && message.role == Role::Assistant {
                self.pulse_value
            } else {
                0.0
            };

            let view = MessageView::new(
                message,
                self.tail_thinking(i),
                pulse,
                self.spinner_frame,
            );
            scroll_view.render_widget(view, Rect::new(0, y_offset, content_width, height));
            y_offset += height;
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// Scroll gestures cancel the glide before moving the viewport, honoring
/// the user's manual position from then on.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.animator.cancel();
                self.scroll_state.scroll_up();
                None
            }
            TuiEvent::ScrollDown => {
                self.animator.cancel();
                self.scroll_state.scroll_down();
                None
            }
            TuiEvent::ScrollPageUp => {
                self.animator.cancel();
                self.scroll_state.scroll_page_up();
                None
            }
            TuiEvent::ScrollPageDown => {
                self.animator.cancel();
                self.scroll_state.scroll_page_down();
                None
            }
            _ => None,
        }
    }
}

/// Cached layout measurements
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    message_count: usize,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            message_count: 0,
            content_width: 0,
        }
    }

    /// How many cached heights are still valid.
    pub fn reusable_count(
        &self,
        message_count: usize,
        content_width: u16,
        tail_is_volatile: bool,
    ) -> usize {
        if self.content_width != content_width || self.heights.is_empty() {
            return 0;
        }

        // Fewer messages than cached means the view was replaced entirely.
        if message_count < self.message_count {
            return 0;
        }

        let stable = self.heights.len().min(message_count);
        if tail_is_volatile && stable == message_count {
            stable.saturating_sub(1)
        } else {
            stable
        }
    }

    pub fn update_metadata(&mut self, message_count: usize, content_width: u16) {
        self.message_count = message_count;
        self.content_width = content_width;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    /// Top edge of the message at `idx` within the scroll canvas — the live
    /// scroll target for the anchor message.
    pub fn anchor_top(&self, idx: usize) -> u16 {
        if idx == 0 {
            0
        } else {
            self.prefix_heights
                .get(idx - 1)
                .copied()
                .unwrap_or(0)
        }
    }

    pub fn visible_range(
        &self,
        scroll_offset: u16,
        viewport_height: u16,
    ) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filler::DEFAULT_LIST_GAP;

    fn cache_with_heights(heights: Vec<u16>, width: u16) -> LayoutCache {
        let mut cache = LayoutCache::new();
        cache.heights = heights;
        cache.rebuild_prefix_heights();
        let count = cache.heights.len();
        cache.update_metadata(count, width);
        cache
    }

    #[test]
    fn test_reusable_count_stable_tail() {
        let cache = cache_with_heights(vec![3, 4, 5], 80);
        assert_eq!(cache.reusable_count(3, 80, false), 3);
        // A new message appended: existing three stay valid.
        assert_eq!(cache.reusable_count(4, 80, false), 3);
    }

    #[test]
    fn test_reusable_count_volatile_tail_recalculates_last() {
        let cache = cache_with_heights(vec![3, 4, 5], 80);
        assert_eq!(cache.reusable_count(3, 80, true), 2);
    }

    #[test]
    fn test_reusable_count_invalidated_by_width_change() {
        let cache = cache_with_heights(vec![3, 4], 80);
        assert_eq!(cache.reusable_count(2, 40, false), 0);
    }

    #[test]
    fn test_reusable_count_invalidated_by_view_replacement() {
        let cache = cache_with_heights(vec![3, 4, 5], 80);
        // History load shrank the set: nothing is trustworthy.
        assert_eq!(cache.reusable_count(1, 80, false), 0);
    }

    #[test]
    fn test_anchor_top_is_prefix_sum() {
        let cache = cache_with_heights(vec![3, 4, 5], 80);
        assert_eq!(cache.anchor_top(0), 0);
        assert_eq!(cache.anchor_top(1), 3);
        assert_eq!(cache.anchor_top(2), 7);
        assert_eq!(cache.total_height(), 12);
    }

    #[test]
    fn test_detect_change_priorities() {
        let state = MessageListState::new(Duration::from_millis(1000), DEFAULT_LIST_GAP);

        // Fresh state sees any message as a set change.
        assert_eq!(
            state.detect_change(2, Some(0), Some(3), true),
            Some(LayoutEvent::MessagesChanged)
        );

        let mut state = state;
        state.seen_message_count = 2;
        state.seen_tail_len = Some(0);
        state.seen_assistant_height = Some(3);

        assert_eq!(
            state.detect_change(2, Some(5), Some(3), true),
            Some(LayoutEvent::ContentChanged)
        );
        assert_eq!(
            state.detect_change(2, Some(0), Some(7), true),
            Some(LayoutEvent::AnchorResized)
        );
        // Anchor growth is only observed while a stream is active.
        assert_eq!(state.detect_change(2, Some(0), Some(7), false), None);
        assert_eq!(state.detect_change(2, Some(0), Some(3), true), None);
    }

    #[test]
    fn test_scroll_gesture_cancels_glide() {
        let mut state = MessageListState::new(Duration::from_millis(1000), DEFAULT_LIST_GAP);
        state.start_glide();
        assert!(state.animator.is_running());

        state.handle_event(&TuiEvent::ScrollUp);
        assert!(!state.animator.is_running());
    }

    #[test]
    fn test_visible_range_brackets_viewport() {
        let cache = cache_with_heights(vec![10; 10], 80);
        let range = cache.visible_range(30, 20);
        assert!(range.start <= 3);
        assert!(range.end >= 5);
        assert!(range.end <= 10);
    }
}
