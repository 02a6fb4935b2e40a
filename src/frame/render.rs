use std::time::Duration;

use crate::style::{Color, format_duration, paint};
use crate::term::{printable_width, truncate};

const TOP_LEFT: &str = "┌";
const TOP_RIGHT: &str = "┐";
const BOTTOM_LEFT: &str = "└";
const BOTTOM_RIGHT: &str = "┘";
const HORIZONTAL: &str = "─";
const VERTICAL: &str = "│";
const TEE: &str = "├";
const TEE_RIGHT: &str = "┤";

/// Prefix drawn for each enclosing frame.
const PARENT_PREFIX: &str = "│  ";
/// Left border of the frame owning the line.
const LEFT_BORDER: &str = "│ ";

/// How a frame draws its borders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameStyle {
    /// Full box: content is padded and every enclosing frame's right border
    /// is drawn.
    #[default]
    Box,
    /// Left markers only, no padding and no right borders.
    Bracket,
}

/// Everything needed to draw one frame's lines at its current depth.
///
/// `colors` are the effective colours of the frames from the bottom of the
/// stack up to and including this one.
pub(crate) struct Borders<'a> {
    pub style: FrameStyle,
    pub width: usize,
    pub depth: usize,
    pub color: Color,
    pub colors: &'a [Color],
}

impl Borders<'_> {
    fn color_at(&self, i: usize) -> Color {
        self.colors.get(i).copied().unwrap_or(self.color)
    }

    fn parents(&self) -> usize {
        self.depth.saturating_sub(1)
    }

    /// Room for a border line (open/close/divider) once the enclosing
    /// frames' prefixes and right borders are accounted for.
    fn border_width(&self) -> usize {
        let parents = self.parents();
        let used = parents * printable_width(PARENT_PREFIX) + parents * 2;
        self.width.saturating_sub(used).max(10)
    }

    /// Room for content inside this frame.
    fn content_width(&self) -> usize {
        let parents = self.parents();
        let prefix = parents * printable_width(PARENT_PREFIX) + printable_width(LEFT_BORDER);
        let right = printable_width(VERTICAL);
        self.width
            .saturating_sub(prefix + right + parents * 2)
            .max(1)
    }

    fn push_parent_prefixes(&self, out: &mut String) {
        for i in 0..self.parents() {
            out.push_str(&paint(self.color_at(i), PARENT_PREFIX));
        }
    }

    fn push_parent_borders(&self, out: &mut String) {
        for i in (0..self.parents()).rev() {
            out.push(' ');
            out.push_str(&paint(self.color_at(i), VERTICAL));
        }
    }

    /// Formats one line of content, without a trailing newline.
    pub fn content(&self, content: &str) -> String {
        let mut out = String::new();
        for i in 0..self.depth {
            let prefix = if i + 1 == self.depth {
                LEFT_BORDER
            } else {
                PARENT_PREFIX
            };
            out.push_str(&paint(self.color_at(i), prefix));
        }

        if self.style == FrameStyle::Bracket {
            out.push_str(content);
            return out;
        }

        let available = self.content_width();
        let mut content = content.to_string();
        if printable_width(&content) > available {
            content = truncate(&content, available.saturating_sub(3)) + "...";
        }
        let padding = available.saturating_sub(printable_width(&content));
        out.push_str(&content);
        out.push_str(&" ".repeat(padding));

        if self.depth > 0 {
            out.push_str(&paint(self.color_at(self.depth - 1), VERTICAL));
        }
        self.push_parent_borders(&mut out);
        out
    }

    fn fit_label(&self, label: &str) -> String {
        if label.is_empty() {
            return String::new();
        }
        let available = self.border_width();
        let spaced = format!(" {label} ");
        if printable_width(&spaced) + 4 <= available {
            return spaced;
        }
        match available.checked_sub(6) {
            Some(max) if max > 0 => format!(" {}... ", truncate(label, max)),
            _ => String::new(),
        }
    }

    /// Top border with the title.
    pub fn open(&self, title: &str) -> String {
        let title = self.fit_label(title);
        let mut out = String::new();
        self.push_parent_prefixes(&mut out);
        out.push_str(&paint(self.color, format!("{TOP_LEFT}{}", HORIZONTAL.repeat(2))));
        out.push_str(&title);

        if self.style == FrameStyle::Box {
            let fill = self
                .border_width()
                .saturating_sub(4 + printable_width(&title));
            out.push_str(&paint(self.color, format!("{}{TOP_RIGHT}", HORIZONTAL.repeat(fill))));
            self.push_parent_borders(&mut out);
        }
        out.push('\n');
        out
    }

    /// Bottom border, with the elapsed time once it exceeds a millisecond.
    pub fn close(&self, elapsed: Duration) -> String {
        let timing = if elapsed > Duration::from_millis(1) {
            format!(" ({}) ", format_duration(elapsed))
        } else {
            String::new()
        };

        let mut out = String::new();
        self.push_parent_prefixes(&mut out);
        match self.style {
            FrameStyle::Box => {
                let fill = self
                    .border_width()
                    .saturating_sub(4 + printable_width(&timing));
                let border = format!(
                    "{BOTTOM_LEFT}{}{}{timing}{BOTTOM_RIGHT}",
                    HORIZONTAL.repeat(2),
                    HORIZONTAL.repeat(fill)
                );
                out.push_str(&paint(self.color, border));
                self.push_parent_borders(&mut out);
            }
            FrameStyle::Bracket => {
                out.push_str(&paint(self.color, format!("{BOTTOM_LEFT}{}", HORIZONTAL.repeat(2))));
                out.push_str(&timing);
            }
        }
        out.push('\n');
        out
    }

    /// Horizontal rule with an optional heading.
    pub fn divider(&self, heading: &str) -> String {
        let heading = self.fit_label(heading);
        let mut out = String::new();
        self.push_parent_prefixes(&mut out);
        out.push_str(&paint(self.color, format!("{TEE}{}", HORIZONTAL.repeat(2))));
        out.push_str(&heading);

        if self.style == FrameStyle::Box {
            let fill = self
                .border_width()
                .saturating_sub(4 + printable_width(&heading));
            out.push_str(&paint(self.color, format!("{}{TEE_RIGHT}", HORIZONTAL.repeat(fill))));
            self.push_parent_borders(&mut out);
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::strip_codes;

    fn borders(style: FrameStyle, depth: usize, colors: &[Color]) -> Borders<'_> {
        Borders {
            style,
            width: 40,
            depth,
            color: Color::Cyan,
            colors,
        }
    }

    #[test]
    fn box_content_is_padded_to_width() {
        let colors = [Color::Cyan];
        let line = borders(FrameStyle::Box, 1, &colors).content("hello");
        let plain = strip_codes(&line);
        assert!(plain.starts_with("│ hello"));
        assert!(plain.ends_with('│'));
        assert_eq!(printable_width(&line), 40);
    }

    #[test]
    fn nested_box_content_draws_every_border() {
        let colors = [Color::Cyan, Color::Green];
        let line = borders(FrameStyle::Box, 2, &colors).content("x");
        let plain = strip_codes(&line);
        assert!(plain.starts_with("│  │ x"));
        assert!(plain.ends_with("│ │"));
        assert_eq!(printable_width(&line), 40);
        // outer prefix in the outer colour, inner border in the inner one
        assert!(line.starts_with(&paint(Color::Cyan, PARENT_PREFIX)));
        assert!(line.contains(&paint(Color::Green, LEFT_BORDER)));
    }

    #[test]
    fn long_content_is_truncated() {
        let colors = [Color::Cyan];
        let line = borders(FrameStyle::Box, 1, &colors).content(&"a".repeat(100));
        assert!(strip_codes(&line).contains("..."));
        assert_eq!(printable_width(&line), 40);
    }

    #[test]
    fn bracket_content_has_no_right_border() {
        let colors = [Color::Cyan, Color::Green];
        let line = borders(FrameStyle::Bracket, 2, &colors).content("x");
        assert_eq!(strip_codes(&line), "│  │ x");
    }

    #[test]
    fn open_and_close_lines() {
        let colors = [Color::Cyan];
        let b = borders(FrameStyle::Box, 1, &colors);

        let open = b.open("Deploy");
        let plain = strip_codes(&open);
        assert!(plain.starts_with("┌── Deploy ─"));
        assert!(plain.ends_with("┐\n"));
        assert_eq!(printable_width(open.trim_end()), 40);

        let close = strip_codes(&b.close(Duration::from_millis(250))).into_owned();
        assert!(close.starts_with("└──"));
        assert!(close.ends_with(" (250ms) ┘\n"));

        let instant = strip_codes(&b.close(Duration::ZERO)).into_owned();
        assert!(!instant.contains('('));
    }

    #[test]
    fn bracket_borders() {
        let colors = [Color::Cyan];
        let b = borders(FrameStyle::Bracket, 1, &colors);
        assert_eq!(strip_codes(&b.open("Deploy")), "┌── Deploy \n");
        assert_eq!(strip_codes(&b.divider("")), "├──\n");
        assert_eq!(strip_codes(&b.close(Duration::from_secs(2))), "└── (2s) \n");
    }

    #[test]
    fn divider_with_heading() {
        let colors = [Color::Cyan];
        let line = borders(FrameStyle::Box, 1, &colors).divider("Results");
        let plain = strip_codes(&line);
        assert!(plain.starts_with("├── Results ─"));
        assert!(plain.ends_with("┤\n"));
    }
}
