//! Colours, status icons and the handful of terminal control sequences the
//! components need for in-place redraws.
//!
//! ```rust,ignore
//! let done = paint(Color::Green, icon::CHECK);
//! write!(out, "{done} deployed")?;
//! ```

use std::fmt::Write as _;
use std::time::Duration;

use owo_colors::OwoColorize;

pub use owo_colors::AnsiColors as Color;

/// Erases from the cursor to the end of the line.
pub const CLEAR_LINE: &str = "\x1b[K";

/// Wraps `text` in the foreground escape sequence for `color`.
pub fn paint(color: Color, text: impl std::fmt::Display) -> String {
    text.color(color).to_string()
}

/// Moves the cursor up `n` lines.
pub fn cursor_up(n: usize) -> String {
    format!("\x1b[{n}A")
}

/// Moves the cursor down `n` lines.
pub fn cursor_down(n: usize) -> String {
    format!("\x1b[{n}B")
}

/// Status and animation glyphs.
pub mod icon {
    pub const CHECK: &str = "✓";
    pub const CROSS: &str = "✗";

    pub const ARROW_UP: &str = "↑";
    pub const ARROW_DOWN: &str = "↓";
    pub const ARROW_LEFT: &str = "←";
    pub const ARROW_RIGHT: &str = "→";

    /// Eight-step braille cycle.
    pub const BRAILLE: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];
}

/// Renders a duration truncated to milliseconds, e.g. `0s`, `250ms`,
/// `1.5s`, `2m3.04s`, `1h0m5s`.
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms == 0 {
        return "0s".to_string();
    }
    if ms < 1000 {
        return format!("{ms}ms");
    }

    let secs = ms / 1000;
    let frac = ms % 1000;
    let (hours, minutes, seconds) = (secs / 3600, secs / 60 % 60, secs % 60);

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h{minutes}m");
    } else if minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{seconds}");
    if frac > 0 {
        let digits = format!("{frac:03}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out.push('s');
    out
}
