use std::sync::Arc;

use crate::output::{LineReplacer, Output, SharedOutput};
use crate::style::CLEAR_LINE;

/// Indents everything written through it by two spaces per depth level.
///
/// Control output (anything starting with `\r` or carrying a clear-line
/// sequence) and whitespace-only writes pass through untouched, so a
/// component redrawing its line in place doesn't accumulate indentation.
/// Replacement calls are forwarded to the wrapped sink with the indent
/// applied to the new content.
pub struct IndentedWriter {
    inner: SharedOutput,
    indent: String,
}

impl IndentedWriter {
    pub fn new(inner: SharedOutput, depth: usize) -> Self {
        Self {
            inner,
            indent: "  ".repeat(depth),
        }
    }

    /// Wraps `output` for `depth`, returning it unchanged at depth 0.
    pub fn wrap(output: SharedOutput, depth: usize) -> SharedOutput {
        if depth == 0 {
            return output;
        }
        Arc::new(Self::new(output, depth))
    }

    fn indent_line(&self, line: &str) -> String {
        if line.is_empty() {
            return String::new();
        }
        format!("{}{line}", self.indent)
    }

    fn is_passthrough(content: &str) -> bool {
        content.starts_with('\r') || content.contains(CLEAR_LINE) || content.trim().is_empty()
    }
}

impl Output for IndentedWriter {
    fn write_str(&self, content: &str) -> std::io::Result<()> {
        if Self::is_passthrough(content) {
            return self.inner.write_str(content);
        }
        let indented: Vec<String> = content.split('\n').map(|l| self.indent_line(l)).collect();
        self.inner.write_str(&indented.join("\n"))
    }

    fn flush(&self) -> std::io::Result<()> {
        self.inner.flush()
    }

    fn replacer(&self) -> Option<&dyn LineReplacer> {
        self.inner.replacer().map(|_| self as &dyn LineReplacer)
    }
}

impl LineReplacer for IndentedWriter {
    fn replace_line(&self, line: &str) -> std::io::Result<()> {
        match self.inner.replacer() {
            Some(r) => r.replace_line(&self.indent_line(line)),
            None => Ok(()),
        }
    }

    fn replace_line_n(&self, n: usize, line: &str) -> std::io::Result<()> {
        match self.inner.replacer() {
            Some(r) => r.replace_line_n(n, &self.indent_line(line)),
            None => Ok(()),
        }
    }

    fn replace_block(&self, count: usize, lines: &[String]) -> std::io::Result<()> {
        match self.inner.replacer() {
            Some(r) => {
                let lines: Vec<String> = lines.iter().map(|l| self.indent_line(l)).collect();
                r.replace_block(count, &lines)
            }
            None => Ok(()),
        }
    }
}

/// Where a component draws its single status line, and how it redraws it.
///
/// Inside a frame-aware sink the first draw appends a line and later draws
/// replace it through the sink's [`LineReplacer`]. On a plain sink the line
/// is left open and redrawn with a carriage return and clear-line.
pub(crate) struct RenderTarget {
    output: SharedOutput,
    first_render: bool,
}

impl RenderTarget {
    pub fn new(output: SharedOutput) -> Self {
        Self {
            output,
            first_render: true,
        }
    }

    pub fn set_output(&mut self, output: SharedOutput) {
        self.output = output;
    }

    /// Whether the sink can replace lines in place. Re-evaluated on every
    /// call so it follows [`Self::set_output`].
    pub fn in_frame(&self) -> bool {
        self.output.replacer().is_some()
    }

    /// Starts a fresh line on the next render.
    pub fn reset(&mut self) {
        self.first_render = true;
    }

    /// Draws a running frame of the component.
    pub fn render(&mut self, content: &str) -> std::io::Result<()> {
        let first = std::mem::replace(&mut self.first_render, false);
        match self.output.replacer() {
            Some(_) if first => self.output.write_str(&format!("{content}\n")),
            Some(replacer) => replacer.replace_line(content),
            None if first => self.output.write_str(content),
            None => {
                self.output.write_str(&format!("\r{CLEAR_LINE}"))?;
                self.output.write_str(content)
            }
        }
    }

    /// Draws the terminal frame of the component and, outside a frame,
    /// finishes the line so following output starts fresh.
    pub fn render_final(&mut self, content: &str) -> std::io::Result<()> {
        self.render(content)?;
        if !self.in_frame() {
            self.output.write_str("\n")?;
        }
        Ok(())
    }
}
