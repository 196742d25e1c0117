//! # Filler Calculation
//!
//! Reserves blank space below a still-growing answer so the layout does not
//! jump while content streams in: the answer appears to rise into a fixed
//! position instead of pushing the page around.
//!
//! The calculator is framework-independent. The presentation layer measures
//! the anchors (most recent user message and the assistant message after it)
//! and notifies the calculator through [`LayoutEvent`]s — content changed,
//! message set changed, or the assistant anchor's rendered height changed
//! while a stream is active. The calculator never triggers scrolling.

/// Fixed vertical gap (terminal rows) between the anchor pair, mirroring the
/// list spacing the renderer puts between messages.
pub const DEFAULT_LIST_GAP: u16 = 2;

/// Why the filler is being recomputed. The calculator treats all causes the
/// same; the variants exist so the driver can be explicit about its trigger
/// and so tests can exercise each path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEvent {
    /// A message was appended or the whole set was replaced.
    MessagesChanged,
    /// The trailing message's content length changed (a fragment arrived).
    ContentChanged,
    /// The assistant anchor's rendered height changed between frames while
    /// streaming — growth that happens without a discrete content event,
    /// e.g. re-wrapping after a terminal resize.
    AnchorResized,
}

/// Live measurements taken by the presentation layer right before asking
/// for a recompute. Anchor heights are `None` when the anchor is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnchorMeasurements {
    pub viewport_height: u16,
    pub user_anchor_height: Option<u16>,
    pub assistant_anchor_height: Option<u16>,
}

#[derive(Debug)]
pub struct FillerCalculator {
    gap: u16,
    height: u16,
}

impl FillerCalculator {
    pub fn new(gap: u16) -> Self {
        Self { gap, height: 0 }
    }

    /// The current spacer height in rows. Always ≥ 0; 0 when no anchor pair
    /// exists.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Recompute from fresh measurements. Returns the new height.
    pub fn observe(&mut self, _event: LayoutEvent, m: AnchorMeasurements) -> u16 {
        self.height = match (m.user_anchor_height, m.assistant_anchor_height) {
            (Some(user), Some(assistant)) => {
                let occupied = user
                    .saturating_add(assistant)
                    .saturating_add(self.gap);
                m.viewport_height.saturating_sub(occupied)
            }
            _ => 0,
        };
        self.height
    }

    /// Drop the spacer entirely (session switch, history load).
    pub fn reset(&mut self) {
        self.height = 0;
    }
}
