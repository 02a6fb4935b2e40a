//! Terminal measurement: width detection, printable width that skips escape
//! sequences, truncation and proportional column layout.

use std::borrow::Cow;
use std::io::IsTerminal;
use std::sync::LazyLock;

use regex::Regex;
use terminal_size::{Width, terminal_size};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns assumed when the terminal size can't be detected (pipes, CI).
pub const DEFAULT_WIDTH: usize = 120;

static ANSI_CODES: LazyLock<Regex> = LazyLock::new(|| {
    // the pattern is a literal, compiling it can't fail
    Regex::new(r"\x1b\[[0-9;?]*[a-zA-Z]").expect("escape sequence pattern")
});

/// Current terminal width in columns, or [`DEFAULT_WIDTH`].
pub fn width() -> usize {
    match terminal_size() {
        Some((Width(w), _)) if w > 0 => w as usize,
        _ => DEFAULT_WIDTH,
    }
}

/// Whether stdout is attached to a terminal that understands cursor control.
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Removes escape sequences, leaving only printable text.
pub fn strip_codes(s: &str) -> Cow<'_, str> {
    ANSI_CODES.replace_all(s, "")
}

/// Display width of `s`, ignoring escape sequences and counting wide
/// characters as two columns.
pub fn printable_width(s: &str) -> usize {
    strip_codes(s).width()
}

/// Cuts `s` down to `max` printable columns. Escape sequences are kept
/// intact and don't count towards the width.
pub fn truncate(s: &str, max: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    let mut in_escape = false;

    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
            out.push(c);
            continue;
        }
        if in_escape {
            out.push(c);
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }

        let w = c.width().unwrap_or(0);
        if used + w > max {
            break;
        }
        out.push(c);
        used += w;
    }

    out
}

/// Fits `text` into exactly `max` columns: long text is cut and suffixed
/// with `...`, short text is padded with spaces.
pub fn truncate_and_pad(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }

    let mut text = Cow::Borrowed(text);
    if printable_width(&text) > max {
        if max <= 3 {
            return ".".repeat(max);
        }
        text = Cow::Owned(truncate(&text, max - 3) + "...");
    }

    let padding = max.saturating_sub(printable_width(&text));
    format!("{text}{}", " ".repeat(padding))
}

/// Splits a line into columns by relative weight.
///
/// ```rust,ignore
/// let widths = SectionLayout::new(100, &[1.0, 3.0, 1.0]).widths();
/// assert_eq!(widths, vec![20, 60, 20]);
/// ```
#[derive(Debug, Clone)]
pub struct SectionLayout {
    total: usize,
    weights: Vec<f64>,
    min_widths: Vec<usize>,
}

impl SectionLayout {
    pub fn new(total: usize, weights: &[f64]) -> Self {
        Self {
            total,
            weights: weights.to_vec(),
            min_widths: Vec::new(),
        }
    }

    /// Minimum column widths, by position. Missing entries default to 1
    /// when columns have to be squeezed.
    pub fn with_min_widths(mut self, min_widths: &[usize]) -> Self {
        self.min_widths = min_widths.to_vec();
        self
    }

    fn min_width(&self, i: usize) -> Option<usize> {
        self.min_widths.get(i).copied()
    }

    /// Computes the column widths. When the minimums push the sum past the
    /// total, every column but the last is scaled down (never below its
    /// minimum) and the last takes what remains.
    pub fn widths(&self) -> Vec<usize> {
        let weight_sum: f64 = self.weights.iter().sum();
        if self.weights.is_empty() || weight_sum <= 0.0 {
            return vec![0; self.weights.len()];
        }

        let mut widths: Vec<usize> = self
            .weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let w = (self.total as f64 * (w / weight_sum)) as usize;
                self.min_width(i).map_or(w, |min| w.max(min))
            })
            .collect();

        let used: usize = widths.iter().sum();
        if used > self.total {
            let ratio = self.total as f64 / used as f64;
            let mut remaining = self.total as isize;
            let last = widths.len() - 1;
            for (i, width) in widths.iter_mut().enumerate() {
                let min = self.min_width(i).unwrap_or(1);
                if i == last {
                    *width = (remaining.max(0) as usize).max(min);
                } else {
                    *width = ((*width as f64 * ratio) as usize).max(min);
                    remaining -= *width as isize;
                }
            }
        }

        widths
    }
}
