//! # Scroll Animation
//!
//! Glides the viewport offset toward the top edge of the newest user message
//! over a fixed nominal duration, easing with cubic ease-in-out.
//!
//! The animator is an explicit state machine advanced by an external tick:
//! the caller passes the current time and the *live* target offset on every
//! tick. The target therefore tracks concurrent layout shifts (the answer
//! below the anchor is still growing), while the start offset stays fixed at
//! the value captured when the animation began — re-capturing it mid-flight
//! would compound unrelated reflow into overshoot.
//!
//! Cancellation is one-way for the running animation: once a user gesture
//! cancels it, ticks return `None` and the offset stays wherever the user
//! left it. Starting a new animation supersedes whatever state was there.

use std::time::{Duration, Instant};

/// Cubic ease-in-out: `t < 0.5 → 4t³`, else `1 - ((-2t + 2)³) / 2`.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Running {
        /// Set on the first tick, so the eased timeline starts when frames
        /// actually begin arriving, not when `start` was called.
        started: Option<Instant>,
        from: f32,
    },
    Cancelled,
}

#[derive(Debug)]
pub struct ScrollAnimator {
    phase: Phase,
    duration: Duration,
}

impl ScrollAnimator {
    pub fn new(duration: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            duration,
        }
    }

    /// Begin animating from the given offset, superseding any in-flight or
    /// cancelled animation. Only one animation runs at a time.
    pub fn start(&mut self, from: u16) {
        self.phase = Phase::Running {
            started: None,
            from: f32::from(from),
        };
    }

    /// Called on any user-originated scroll gesture. Checked at the top of
    /// every tick; after this the offset never jumps to the target.
    pub fn cancel(&mut self) {
        if matches!(self.phase, Phase::Running { .. }) {
            self.phase = Phase::Cancelled;
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    /// Advance the animation. Returns the offset the viewport should take
    /// this frame, or `None` when idle or cancelled. The final tick snaps
    /// exactly to `target` and returns to `Idle`.
    pub fn tick(&mut self, now: Instant, target: u16) -> Option<u16> {
        let Phase::Running { started, from } = &mut self.phase else {
            return None;
        };

        let began = *started.get_or_insert(now);
        let elapsed = now.saturating_duration_since(began);
        let t = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        };

        if t >= 1.0 {
            self.phase = Phase::Idle;
            return Some(target);
        }

        let eased = ease_in_out_cubic(t);
        let delta = f32::from(target) - *from;
        let offset = (*from + delta * eased).round().max(0.0);
        Some(offset as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DURATION: Duration = Duration::from_millis(1000);

    fn ticks(animator: &mut ScrollAnimator, base: Instant, at_ms: u64, target: u16) -> Option<u16> {
        animator.tick(base + Duration::from_millis(at_ms), target)
    }

    #[test]
    fn test_easing_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_easing_quarter_point() {
        // 4 * 0.25^3 = 0.0625
        assert!((ease_in_out_cubic(0.25) - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn test_tick_reaches_target_and_goes_idle() {
        let mut anim = ScrollAnimator::new(DURATION);
        let base = Instant::now();
        anim.start(0);

        assert_eq!(ticks(&mut anim, base, 0, 100), Some(0));
        assert_eq!(ticks(&mut anim, base, 500, 100), Some(50));
        assert_eq!(ticks(&mut anim, base, 1000, 100), Some(100));
        assert!(!anim.is_running());
        assert_eq!(ticks(&mut anim, base, 1100, 100), None);
    }

    #[test]
    fn test_cancel_freezes_offset_without_snapping() {
        let mut anim = ScrollAnimator::new(DURATION);
        let base = Instant::now();
        anim.start(0);

        let _ = ticks(&mut anim, base, 0, 100);
        let mid = ticks(&mut anim, base, 300, 100);
        assert!(mid.is_some());

        anim.cancel();
        // No further offsets, no jump to 100 — even well past the duration.
        assert_eq!(ticks(&mut anim, base, 900, 100), None);
        assert_eq!(ticks(&mut anim, base, 2000, 100), None);
    }

    #[test]
    fn test_moving_target_is_tracked_with_fixed_start() {
        let mut anim = ScrollAnimator::new(DURATION);
        let base = Instant::now();
        anim.start(0);

        let _ = ticks(&mut anim, base, 0, 100);
        // Layout grew under the animation: the target moved to 200. The
        // midpoint offset must ease toward the *new* target from the
        // *original* start.
        assert_eq!(ticks(&mut anim, base, 500, 200), Some(100));
        assert_eq!(ticks(&mut anim, base, 1000, 200), Some(200));
    }

    #[test]
    fn test_start_supersedes_in_flight_animation() {
        let mut anim = ScrollAnimator::new(DURATION);
        let base = Instant::now();
        anim.start(0);
        let _ = ticks(&mut anim, base, 0, 100);
        let _ = ticks(&mut anim, base, 400, 100);

        // A new submit restarts from the current offset with a fresh clock.
        anim.start(37);
        let later = base + Duration::from_millis(400);
        assert_eq!(anim.tick(later, 80), Some(37));
        assert_eq!(anim.tick(later + DURATION, 80), Some(80));
    }

    #[test]
    fn test_start_after_cancel_runs_again() {
        let mut anim = ScrollAnimator::new(DURATION);
        let base = Instant::now();
        anim.start(0);
        let _ = ticks(&mut anim, base, 0, 50);
        anim.cancel();
        assert!(!anim.is_running());

        anim.start(10);
        assert!(anim.is_running());
        let later = base + Duration::from_secs(5);
        assert_eq!(anim.tick(later, 60), Some(10));
    }

    #[test]
    fn test_animation_eases_toward_shrinking_target() {
        let mut anim = ScrollAnimator::new(DURATION);
        let base = Instant::now();
        // Scrolling up: target above the current offset.
        anim.start(100);
        let _ = ticks(&mut anim, base, 0, 20);
        assert_eq!(ticks(&mut anim, base, 500, 20), Some(60));
        assert_eq!(ticks(&mut anim, base, 1000, 20), Some(20));
    }
}
