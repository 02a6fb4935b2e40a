use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::TaskComponent;
use crate::output::SharedOutput;
use crate::style::{Color, icon, paint};
use crate::term::{self, SectionLayout, printable_width, truncate_and_pad};
use crate::writer::RenderTarget;

/// Columns taken by the borders of an enclosing frame.
const FRAME_ALLOWANCE: usize = 6;

/// The filled/empty cells of a bar, without decoration.
///
/// ```rust,ignore
/// let bar = ProgressBar::new(45, 100).width(30);
/// assert_eq!(bar.to_string().chars().count(), 30);
/// // => █████████████░░░░░░░░░░░░░░░░░
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProgressBar {
    done: u64,
    total: u64,
    width: usize,
    filled: char,
    empty: char,
}

impl ProgressBar {
    pub fn new(done: u64, total: u64) -> Self {
        Self {
            done,
            total,
            width: 20,
            filled: '█',
            empty: '░',
        }
    }

    pub fn width(mut self, w: usize) -> Self {
        self.width = w;
        self
    }

    pub fn chars(mut self, filled: char, empty: char) -> Self {
        self.filled = filled;
        self.empty = empty;
        self
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.done as f64 / self.total as f64).clamp(0.0, 1.0)
    }

    /// Number of filled cells.
    pub fn filled(&self) -> usize {
        (self.ratio() * self.width as f64) as usize
    }
}

impl std::fmt::Display for ProgressBar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filled = self.filled();
        let empty = self.width - filled;
        write!(
            f,
            "{}{}",
            std::iter::repeat_n(self.filled, filled).collect::<String>(),
            std::iter::repeat_n(self.empty, empty).collect::<String>(),
        )
    }
}

/// A snapshot of a [`Progress`] handed to its renderer.
#[derive(Debug, Clone)]
pub struct ProgressView {
    pub title: String,
    pub message: String,
    pub current: u64,
    pub total: u64,
    pub color: Color,
    pub failed: bool,
    /// Columns the line may use, frame borders already subtracted.
    pub width: usize,
    /// Forced bar length, if one was configured.
    pub bar_width: Option<usize>,
}

impl ProgressView {
    /// Percent complete, 0 while the total is unknown.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current as f64 / self.total as f64 * 100.0
    }

    /// The configured colour, or red once failed.
    pub fn bar_color(&self) -> Color {
        if self.failed { Color::Red } else { self.color }
    }
}

/// Draws a progress line. Closures taking a [`ProgressView`] implement this
/// trait.
pub trait ProgressRenderer: Send + Sync {
    fn render(&self, view: &ProgressView) -> String;
}

impl<F> ProgressRenderer for F
where F: Fn(&ProgressView) -> String + Send + Sync
{
    fn render(&self, view: &ProgressView) -> String {
        self(view)
    }
}

/// Three-column layout: title, `[bar] pct (n/total)`, message.
#[derive(Debug, Clone, Copy)]
pub struct Chars {
    filled: char,
    empty: char,
}

impl Chars {
    pub fn new(filled: char, empty: char) -> Self {
        Self { filled, empty }
    }

    /// `█` and `░` blocks.
    pub fn bar() -> Self {
        Self::new('█', '░')
    }

    /// `●` and `○` dots.
    pub fn dots() -> Self {
        Self::new('●', '○')
    }

    fn progress_section(&self, view: &ProgressView, section: usize) -> String {
        let percentage = format!(" {:5.1}%", view.percentage());
        let count = format!(" ({:02}/{:02}) ", view.current, view.total);
        let decoration = 2 + printable_width(&percentage) + printable_width(&count);
        let cells = view
            .bar_width
            .unwrap_or_else(|| section.saturating_sub(decoration).max(5));

        let bar = ProgressBar::new(view.current, view.total)
            .width(cells)
            .chars(self.filled, self.empty);
        let mut out = format!("[{}]{percentage}{count}", paint(view.bar_color(), bar));
        let used = printable_width(&out);
        if used < section {
            out.push_str(&" ".repeat(section - used));
        }
        out
    }
}

impl Default for Chars {
    fn default() -> Self {
        Self::bar()
    }
}

impl ProgressRenderer for Chars {
    fn render(&self, view: &ProgressView) -> String {
        let widths = SectionLayout::new(view.width, &[2.0, 7.0, 1.0])
            .with_min_widths(&[10, 20, 8])
            .widths();
        format!(
            "{}{}{}",
            truncate_and_pad(&view.title, widths[0]),
            self.progress_section(view, widths[1]),
            truncate_and_pad(&view.message, widths[2]),
        )
    }
}

/// `title: 42.0% - message`, no bar.
#[derive(Debug, Clone, Copy, Default)]
pub struct Minimal;

impl ProgressRenderer for Minimal {
    fn render(&self, view: &ProgressView) -> String {
        let pct = paint(view.bar_color(), format!("{:.1}%", view.percentage()));
        if view.message.is_empty() {
            format!("{}: {pct}", view.title)
        } else {
            format!("{}: {pct} - {}", view.title, view.message)
        }
    }
}

struct ProgressInner {
    title: String,
    total: u64,
    current: u64,
    message: String,
    color: Color,
    width: Option<usize>,
    bar_width: Option<usize>,
    renderer: Arc<dyn ProgressRenderer>,
    completed: bool,
    failed: bool,
    started_at: Instant,
    target: RenderTarget,
}

impl ProgressInner {
    fn view(&self) -> ProgressView {
        let mut width = self.width.unwrap_or_else(term::width);
        if self.target.in_frame() {
            width = width.saturating_sub(FRAME_ALLOWANCE);
        }
        ProgressView {
            title: self.title.clone(),
            message: self.message.clone(),
            current: self.current,
            total: self.total,
            color: self.color,
            failed: self.failed,
            width,
            bar_width: self.bar_width,
        }
    }

    fn render(&mut self) {
        let line = self.renderer.render(&self.view());
        let _ = self.target.render(&line);
    }

    fn render_final(&mut self) {
        let mark = if self.failed {
            paint(Color::Red, icon::CROSS)
        } else {
            paint(Color::Green, icon::CHECK)
        };
        let line = format!("{mark} {}", self.message);
        let _ = self.target.render_final(&line);
    }
}

/// A determinate progress bar, redrawn synchronously on every update.
///
/// ```rust,ignore
/// let progress = Progress::new("Downloading", 0);
/// progress.start();
/// progress.set_total(archive.len());
/// for chunk in archive.chunks() {
///     progress.increment(chunk.name());
/// }
/// progress.complete("Downloaded");
/// ```
///
/// Once completed or failed, further updates are ignored. Clones share the
/// same bar.
#[derive(Clone)]
pub struct Progress {
    inner: Arc<Mutex<ProgressInner>>,
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Progress")
            .field("title", &inner.title)
            .field("current", &inner.current)
            .field("total", &inner.total)
            .field("completed", &inner.completed)
            .field("failed", &inner.failed)
            .finish()
    }
}

impl Progress {
    /// A bar counting up to `total`. A total of 0 means "not known yet";
    /// see [`Progress::set_total`].
    pub fn new(title: impl Into<String>, total: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ProgressInner {
                title: title.into(),
                total,
                current: 0,
                message: String::new(),
                color: Color::Cyan,
                width: None,
                bar_width: None,
                renderer: Arc::new(Chars::bar()),
                completed: false,
                failed: false,
                started_at: Instant::now(),
                target: RenderTarget::new(crate::output::stdout()),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn color(self, color: Color) -> Self {
        self.lock().color = color;
        self
    }

    pub fn renderer(self, renderer: impl ProgressRenderer + 'static) -> Self {
        self.lock().renderer = Arc::new(renderer);
        self
    }

    pub fn output(self, output: SharedOutput) -> Self {
        self.lock().target.set_output(output);
        self
    }

    /// Line width used for the layout instead of the terminal width. Zero
    /// is ignored.
    pub fn width(self, width: usize) -> Self {
        if width > 0 {
            self.lock().width = Some(width);
        }
        self
    }

    /// Forces the number of bar cells. Zero is ignored.
    pub fn bar_width(self, cells: usize) -> Self {
        if cells > 0 {
            self.lock().bar_width = Some(cells);
        }
        self
    }

    /// Draws the initial state.
    pub fn start(&self) {
        let mut inner = self.lock();
        inner.target.reset();
        inner.render();
    }

    pub fn update(&self, current: u64, message: impl Into<String>) {
        let mut inner = self.lock();
        if inner.completed {
            return;
        }
        inner.current = current;
        inner.message = message.into();
        inner.render();
    }

    /// Advances by one.
    pub fn increment(&self, message: impl Into<String>) {
        let mut inner = self.lock();
        if inner.completed {
            return;
        }
        inner.current += 1;
        inner.message = message.into();
        inner.render();
    }

    /// Changes the total, e.g. once the size of the work is discovered.
    /// Takes effect on the next draw.
    pub fn set_total(&self, total: u64) {
        self.lock().total = total;
    }

    /// Fills the bar and draws a success line. `message` replaces the
    /// current message when non-empty.
    pub fn complete(&self, message: &str) {
        let mut inner = self.lock();
        if inner.completed {
            return;
        }
        inner.current = inner.total;
        if !message.is_empty() {
            inner.message = message.to_string();
        }
        inner.completed = true;
        inner.render();
        inner.render_final();
    }

    /// Draws the bar in red followed by a failure line. `message` replaces
    /// the current message when non-empty.
    pub fn fail(&self, message: &str) {
        let mut inner = self.lock();
        if inner.completed {
            return;
        }
        if !message.is_empty() {
            inner.message = message.to_string();
        }
        inner.failed = true;
        inner.completed = true;
        inner.render();
        inner.render_final();
    }

    pub fn set_output(&self, output: SharedOutput) {
        self.lock().target.set_output(output);
    }

    pub fn current(&self) -> u64 {
        self.lock().current
    }

    pub fn total(&self) -> u64 {
        self.lock().total
    }

    /// Percent complete, 0 while the total is 0.
    pub fn percentage(&self) -> f64 {
        let inner = self.lock();
        if inner.total == 0 {
            return 0.0;
        }
        inner.current as f64 / inner.total as f64 * 100.0
    }

    pub fn message(&self) -> String {
        self.lock().message.clone()
    }

    pub fn title(&self) -> String {
        self.lock().title.clone()
    }

    pub fn base_color(&self) -> Color {
        self.lock().color
    }

    pub fn is_completed(&self) -> bool {
        self.lock().completed
    }

    pub fn is_failed(&self) -> bool {
        self.lock().failed
    }

    /// Time since the bar was created.
    pub fn elapsed(&self) -> Duration {
        self.lock().started_at.elapsed()
    }
}

impl TaskComponent for Progress {
    fn start(&self) {
        Progress::start(self);
    }

    fn complete(&self, message: &str) {
        Progress::complete(self, message);
    }

    fn fail(&self, message: &str) {
        Progress::fail(self, message);
    }

    fn set_output(&self, output: SharedOutput) {
        Progress::set_output(self, output);
    }
}
