//! Bordered, nestable output regions.
//!
//! ```rust,ignore
//! let outer = Frame::open("Deployment");
//! outer.println("starting")?;
//!
//! let inner = Frame::builder("Database").color(Color::Green).open();
//! inner.println("migrating")?;
//! inner.close()?;
//!
//! outer.close()?;
//! ```
//!
//! ```text
//! ┌── Deployment ──────────────────────┐
//! │ starting                           │
//! │  ┌── Database ───────────────────┐ │
//! │  │ migrating                     │ │
//! │  └───────────────────────────────┘ │
//! └────────────────────────────────────┘
//! ```

mod render;
mod stack;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

pub use render::FrameStyle;
pub use stack::{FrameId, FrameStack};

use crate::output::{LineReplacer, Output, SharedOutput};
use crate::style::{CLEAR_LINE, Color, cursor_down, cursor_up};
use crate::term;
use render::Borders;

/// Forces every frame to draw in `color`, or restores their own colours
/// with `None`.
pub fn override_color(color: Option<Color>) {
    FrameStack::global().set_color_override(color);
}

/// Configures a frame before it is opened.
pub struct FrameBuilder {
    title: String,
    color: Color,
    style: FrameStyle,
    output: Option<SharedOutput>,
    width: Option<usize>,
    interactive: Option<bool>,
}

impl FrameBuilder {
    /// Border colour. Defaults to cyan.
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn style(mut self, style: FrameStyle) -> Self {
        self.style = style;
        self
    }

    /// Where the frame draws. Defaults to stdout.
    pub fn output(mut self, output: SharedOutput) -> Self {
        self.output = Some(output);
        self
    }

    /// Total line width. Defaults to the terminal width.
    pub fn width(mut self, width: usize) -> Self {
        if width > 0 {
            self.width = Some(width);
        }
        self
    }

    /// Whether in-place replacement may use cursor movement. When `false`,
    /// replacements are appended as new lines. Defaults to whether stdout
    /// is a terminal.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    /// Pushes the frame onto the global stack and draws its top border.
    pub fn open(self) -> Frame {
        let stack = FrameStack::global();
        let color = stack.effective(self.color);
        let frame = Frame {
            inner: Arc::new(FrameInner {
                id: FrameId::next(),
                title: self.title,
                color,
                style: self.style,
                width: self.width.unwrap_or_else(term::width),
                interactive: self.interactive.unwrap_or_else(term::is_tty),
                started_at: Instant::now(),
                output: self.output.unwrap_or_else(crate::output::stdout),
                needs_newline: Mutex::new(false),
            }),
        };

        stack.push(frame.inner.id, color);
        let header = frame.borders(|b| b.open(&frame.inner.title));
        tracing::trace!(title = %frame.inner.title, depth = frame.depth(), "frame opened");
        let _ = frame.inner.output.write_str(&header);
        frame
    }
}

struct FrameInner {
    id: FrameId,
    title: String,
    color: Color,
    style: FrameStyle,
    width: usize,
    interactive: bool,
    started_at: Instant,
    output: SharedOutput,
    needs_newline: Mutex<bool>,
}

/// An open frame. Clones are handles to the same frame.
///
/// Writing to a frame prefixes every line with the borders of all frames
/// enclosing it. Frames must be closed innermost first; closing a frame
/// that isn't on top of the stack does nothing.
#[derive(Clone)]
pub struct Frame {
    inner: Arc<FrameInner>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.inner.id)
            .field("title", &self.inner.title)
            .field("depth", &self.depth())
            .finish()
    }
}

impl Frame {
    /// Opens a frame with default settings.
    pub fn open(title: impl Into<String>) -> Self {
        Self::builder(title).open()
    }

    pub fn builder(title: impl Into<String>) -> FrameBuilder {
        FrameBuilder {
            title: title.into(),
            color: Color::Cyan,
            style: FrameStyle::default(),
            output: None,
            width: None,
            interactive: None,
        }
    }

    pub fn id(&self) -> FrameId {
        self.inner.id
    }

    pub fn title(&self) -> &str {
        &self.inner.title
    }

    /// 1-based position on the frame stack right now, 0 once closed.
    pub fn depth(&self) -> usize {
        FrameStack::global().depth_of(self.inner.id)
    }

    pub fn is_open(&self) -> bool {
        self.depth() > 0
    }

    fn borders<T>(&self, f: impl FnOnce(&Borders<'_>) -> T) -> T {
        self.borders_at(self.depth(), f)
    }

    fn borders_at<T>(&self, depth: usize, f: impl FnOnce(&Borders<'_>) -> T) -> T {
        let stack = FrameStack::global();
        let colors = stack.colors(depth);
        f(&Borders {
            style: self.inner.style,
            width: self.inner.width,
            depth,
            color: stack.effective(self.inner.color),
            colors: &colors,
        })
    }

    fn format_line(&self, content: &str) -> String {
        self.borders(|b| b.content(content))
    }

    /// Pops the frame and draws its bottom border with the elapsed time.
    /// Does nothing unless this is the innermost open frame.
    pub fn close(&self) -> std::io::Result<()> {
        let stack = FrameStack::global();
        if stack.current() != Some(self.inner.id) {
            return Ok(());
        }

        let elapsed = self.inner.started_at.elapsed();
        let footer = self.borders(|b| b.close(elapsed));
        if !stack.pop_if_top(self.inner.id) {
            return Ok(());
        }
        tracing::trace!(title = %self.inner.title, ?elapsed, "frame closed");
        self.inner.output.write_str(&footer)
    }

    /// Time since the frame was opened.
    pub fn elapsed(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    /// Writes `content` without a trailing newline; the next write continues
    /// on a new bordered line.
    pub fn print(&self, content: impl std::fmt::Display) -> std::io::Result<()> {
        self.write_str(&content.to_string())
    }

    pub fn println(&self, content: impl std::fmt::Display) -> std::io::Result<()> {
        self.write_str(&format!("{content}\n"))
    }

    /// Draws a horizontal rule, with `heading` when non-empty.
    pub fn divider(&self, heading: &str) -> std::io::Result<()> {
        let line = self.borders(|b| b.divider(heading));
        self.inner.output.write_str(&line)
    }
}

impl Output for Frame {
    fn write_str(&self, content: &str) -> std::io::Result<()> {
        if content.is_empty() {
            return Ok(());
        }

        let ends_with_newline = content.ends_with('\n');
        let body = content.strip_suffix('\n').unwrap_or(content);

        let mut needs_newline = self
            .inner
            .needs_newline
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut out = String::new();
        for (i, line) in body.split('\n').enumerate() {
            if i > 0 || *needs_newline {
                out.push('\n');
            }
            out.push_str(&self.format_line(line));
        }
        if ends_with_newline {
            out.push('\n');
        }
        *needs_newline = !ends_with_newline;
        drop(needs_newline);

        self.inner.output.write_str(&out)
    }

    fn flush(&self) -> std::io::Result<()> {
        self.inner.output.flush()
    }

    fn replacer(&self) -> Option<&dyn LineReplacer> {
        Some(self)
    }
}

impl LineReplacer for Frame {
    fn replace_line(&self, line: &str) -> std::io::Result<()> {
        let formatted = self.format_line(line);
        if self.inner.interactive {
            let up = cursor_up(1);
            self.inner
                .output
                .write_str(&format!("{up}{CLEAR_LINE}{formatted}\n"))
        } else {
            self.inner.output.write_str(&format!("{formatted}\n"))
        }
    }

    fn replace_line_n(&self, n: usize, line: &str) -> std::io::Result<()> {
        if n < 1 {
            return self.replace_line(line);
        }
        let formatted = self.format_line(line);
        if self.inner.interactive {
            let (up, down) = (cursor_up(n), cursor_down(n));
            self.inner
                .output
                .write_str(&format!("{up}{CLEAR_LINE}{formatted}{down}"))
        } else {
            self.inner.output.write_str(&format!("{formatted}\n"))
        }
    }

    fn replace_block(&self, count: usize, lines: &[String]) -> std::io::Result<()> {
        if count < 1 {
            return Ok(());
        }
        if !self.inner.interactive {
            let mut out = String::new();
            for line in lines {
                out.push_str(&self.format_line(line));
                out.push('\n');
            }
            return self.inner.output.write_str(&out);
        }

        let mut out = String::new();
        if count > 1 {
            out.push_str(&cursor_up(count - 1));
        }
        for i in 0..count {
            out.push_str(CLEAR_LINE);
            if i < count - 1 {
                out.push('\n');
            }
        }

        if !lines.is_empty() {
            if count > 1 {
                out.push_str(&cursor_up(count - 1));
            }
            let formatted: Vec<String> = lines.iter().map(|l| self.format_line(l)).collect();
            out.push_str(&formatted.join("\n"));
        }

        self.inner.output.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::output::Buffer;
    use crate::term::strip_codes;

    fn open(title: &str, buf: &Buffer) -> Frame {
        Frame::builder(title)
            .output(buf.shared())
            .width(40)
            .interactive(false)
            .open()
    }

    fn plain_lines(buf: &Buffer) -> Vec<String> {
        strip_codes(&buf.contents())
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    #[serial]
    fn open_write_close() {
        let buf = Buffer::new();
        let frame = open("Build", &buf);
        assert_eq!(frame.depth(), 1);
        frame.println("compiling").unwrap();
        frame.close().unwrap();
        assert!(!frame.is_open());

        let lines = plain_lines(&buf);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("┌── Build "));
        assert!(lines[1].starts_with("│ compiling"));
        assert!(lines[1].ends_with('│'));
        assert!(lines[2].starts_with("└──"));
    }

    #[test]
    #[serial]
    fn multi_line_writes_are_bordered_per_line() {
        let buf = Buffer::new();
        let frame = open("Log", &buf);
        frame.print("a\nb").unwrap();
        frame.print("c\n").unwrap();
        frame.close().unwrap();

        let lines = plain_lines(&buf);
        assert!(lines[1].starts_with("│ a "));
        assert!(lines[2].starts_with("│ b "));
        assert!(lines[3].starts_with("│ c "));
        assert!(lines[4].starts_with("└──"));
    }

    #[test]
    #[serial]
    fn nested_frames_track_depth() {
        let buf = Buffer::new();
        let outer = open("Outer", &buf);
        let inner = open("Inner", &buf);
        assert_eq!(inner.depth(), 2);

        outer.close().unwrap();
        assert!(outer.is_open(), "closing a non-top frame is ignored");

        inner.println("deep").unwrap();
        inner.close().unwrap();
        outer.println("shallow").unwrap();
        outer.close().unwrap();

        let lines = plain_lines(&buf);
        assert!(lines[1].starts_with("│  ┌── Inner"));
        assert!(lines[2].starts_with("│  │ deep"));
        assert!(lines[2].ends_with("│ │"));
        assert!(lines[3].starts_with("│  └──"));
        assert!(lines[4].starts_with("│ shallow"));
        assert!(lines[5].starts_with("└──"));
    }

    #[test]
    #[serial]
    fn outer_frame_redraws_at_live_depth() {
        let buf = Buffer::new();
        let first = open("First", &buf);
        let second = open("Second", &buf);
        second.close().unwrap();
        // after the inner frame closes the outer one draws at depth 1 again
        first.println("back").unwrap();
        first.close().unwrap();
        let lines = plain_lines(&buf);
        assert!(lines[3].starts_with("│ back"));
    }

    #[test]
    #[serial]
    fn replace_line_appends_when_not_interactive() {
        let buf = Buffer::new();
        let frame = open("Progress", &buf);
        frame.println("10%").unwrap();
        frame.replace_line("20%").unwrap();
        frame.replace_line_n(2, "30%").unwrap();
        frame
            .replace_block(2, &["40%".to_string(), "50%".to_string()])
            .unwrap();
        frame.close().unwrap();

        let out = buf.contents();
        assert!(!out.contains("\x1b[1A"));
        assert!(!out.contains(CLEAR_LINE));
        let lines = plain_lines(&buf);
        for (i, pct) in ["10%", "20%", "30%", "40%", "50%"].iter().enumerate() {
            assert!(lines[i + 1].starts_with(&format!("│ {pct}")));
        }
    }

    #[test]
    #[serial]
    fn replace_line_uses_cursor_control_when_interactive() {
        let buf = Buffer::new();
        let frame = Frame::builder("Live")
            .output(buf.shared())
            .width(40)
            .interactive(true)
            .open();
        frame.println("old").unwrap();
        buf.clear();

        frame.replace_line("new").unwrap();
        let out = buf.contents();
        assert!(out.starts_with(&format!("\x1b[1A{CLEAR_LINE}")));
        assert!(strip_codes(&out).starts_with("│ new"));
        buf.clear();

        frame.replace_line_n(3, "mid").unwrap();
        let out = buf.contents();
        assert!(out.starts_with("\x1b[3A"));
        assert!(out.ends_with("\x1b[3B"));
        frame.close().unwrap();
    }

    #[test]
    #[serial]
    fn color_override_applies_to_frames() {
        override_color(Some(Color::Magenta));
        let buf = Buffer::new();
        let frame = open("Forced", &buf);
        frame.println("x").unwrap();
        frame.close().unwrap();
        override_color(None);

        let out = buf.contents();
        assert!(out.contains("\x1b[35m"));
        assert!(!out.contains("\x1b[36m"));
    }

    #[test]
    #[serial]
    fn divider_inside_frame() {
        let buf = Buffer::new();
        let frame = open("Report", &buf);
        frame.divider("Summary").unwrap();
        frame.close().unwrap();
        let lines = plain_lines(&buf);
        assert!(lines[1].starts_with("├── Summary"));
    }
}
