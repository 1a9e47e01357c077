//! Scroll animation math.
//!
//! Scroll-into-view eases the parent's `scroll_top` from where it is to the
//! target over a fixed duration, one step per tick:
//! - `ease_in_out_quad` - the easing curve
//! - `scroll_steps` - the sequence of positions to write, one per tick
//!
//! The binding that drives these lives in `primitives::property`.

// =============================================================================
// SCROLL CONSTANTS
// =============================================================================

/// Gap kept between the top of the scrolled node and the parent's edge.
pub const SCROLL_MARGIN: f64 = 10.0;

/// Total animation time.
pub const SCROLL_DURATION_MS: u64 = 300;

/// Time between two animation steps.
pub const SCROLL_STEP_MS: u64 = 20;

/// Tuning for [`scroll_into_view_with`](crate::scroll_into_view_with).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollOptions {
    pub margin: f64,
    pub duration_ms: u64,
    pub step_ms: u64,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            margin: SCROLL_MARGIN,
            duration_ms: SCROLL_DURATION_MS,
            step_ms: SCROLL_STEP_MS,
        }
    }
}

// =============================================================================
// EASING
// =============================================================================

/// Quadratic ease-in-out: position at time `t` of a move from `start` by
/// `change` lasting `duration`.
pub fn ease_in_out_quad(t: f64, start: f64, change: f64, duration: f64) -> f64 {
    let mut t = t / (duration / 2.0);
    if t < 1.0 {
        return change / 2.0 * t * t + start;
    }
    t -= 1.0;
    -change / 2.0 * (t * (t - 2.0) - 1.0) + start
}

/// Positions to write, one per `step_ms`, ending exactly on `to`.
pub fn scroll_steps(start: f64, to: f64, options: ScrollOptions) -> impl Iterator<Item = f64> {
    let step = options.step_ms.max(1);
    let duration = options.duration_ms;
    let count = duration.div_ceil(step).max(1);
    let change = to - start;

    (1..=count).map(move |i| {
        let t = (i * step).min(duration);
        if duration == 0 {
            to
        } else {
            ease_in_out_quad(t as f64, start, change, duration as f64)
        }
    })
}
