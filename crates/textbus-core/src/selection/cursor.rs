//! Caret placement and blinking.
//!
//! The caret is an overlay positioned from the bounding rectangle of a
//! collapsed native range and sized from the computed font metrics of the
//! text it sits in. Measuring is platform work (see
//! [`CursorPlatform`](crate::platform::CursorPlatform)); the arithmetic lives
//! here.

use std::time::Duration;

use web_time::Instant;

/// Screen rectangle of a collapsed range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CursorRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Computed font metrics at the caret.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Computed `font-size` in pixels.
    pub font_size: f64,
    /// Computed `line-height`, verbatim (`"normal"`, `"1.5"`, `"24px"`).
    pub line_height: String,
    /// Computed text colour.
    pub color: String,
}

/// Where and how to draw the caret overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct CaretStyle {
    pub left: f64,
    pub top: f64,
    pub height: f64,
    pub color: String,
}

/// Box height for a computed `line-height`.
///
/// A unitless number multiplies the font size; anything else is read as a
/// leading float (`"24px"` -> 24); failing that the font size is used.
pub fn compute_line_height(font_size: f64, line_height: &str) -> f64 {
    let line_height = line_height.trim();
    if let Ok(factor) = line_height.parse::<f64>() {
        return factor * font_size;
    }
    parse_leading_float(line_height).unwrap_or(font_size)
}

/// Parse the numeric prefix of a CSS length such as `"18.5px"`.
pub fn parse_leading_float(value: &str) -> Option<f64> {
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && matches!(c, '-' | '+'))))
        .map_or(value.len(), |(i, _)| i);
    value[..end].parse().ok()
}

/// Position the caret over `rect`, vertically centred when the rectangle is
/// taller than the text's line box.
pub fn place_caret(rect: CursorRect, metrics: &FontMetrics) -> CaretStyle {
    let height = compute_line_height(metrics.font_size, &metrics.line_height);
    let top = if rect.height > height {
        rect.y + (rect.height - height) / 2.0
    } else {
        rect.y
    };
    CaretStyle {
        left: rect.x,
        top,
        height,
        color: metrics.color.clone(),
    }
}

/// Caret blink timer.
///
/// The only cancellable unit in the editor: every visibility or focus change
/// resets it, and hiding cancels the pending toggle. A zero period gives a
/// steady caret.
#[derive(Debug, Clone)]
pub struct CaretBlink {
    period: Duration,
    visible: bool,
    next_toggle: Option<Instant>,
}

impl CaretBlink {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            visible: false,
            next_toggle: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_running(&self) -> bool {
        self.next_toggle.is_some()
    }

    /// Show the caret and restart the blink cycle.
    pub fn show(&mut self, now: Instant) {
        self.visible = true;
        self.next_toggle = (!self.period.is_zero()).then(|| now + self.period);
    }

    /// Hide the caret and cancel the pending toggle.
    pub fn hide(&mut self) {
        self.visible = false;
        self.next_toggle = None;
    }

    /// Reset on a visibility change of the host document.
    pub fn on_visibility_change(&mut self, document_visible: bool, now: Instant) {
        if document_visible {
            self.show(now);
        } else {
            self.hide();
        }
    }

    /// Advance the timer. Returns whether the caret is visible afterwards.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(at) = self.next_toggle else {
            return self.visible;
        };
        if now < at || self.period.is_zero() {
            return self.visible;
        }
        let period = self.period.as_nanos();
        let elapsed = (now - at).as_nanos();
        // One toggle at `at`, then one per whole period after it
        if (elapsed / period) % 2 == 0 {
            self.visible = !self.visible;
        }
        let remaining = period - elapsed % period;
        self.next_toggle = Some(
            now + Duration::new(
                (remaining / 1_000_000_000) as u64,
                (remaining % 1_000_000_000) as u32,
            ),
        );
        self.visible
    }
}
