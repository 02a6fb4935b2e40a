use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::TaskComponent;
use crate::output::SharedOutput;
use crate::style::{Color, format_duration, icon, paint};
use crate::writer::RenderTarget;

const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Colours a spinner cycles through unless given a fixed one.
pub const COLOR_CYCLE: [Color; 4] = [Color::Red, Color::Blue, Color::Cyan, Color::Magenta];

/// How a spinner finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpinnerState {
    #[default]
    Completed,
    Failed,
}

/// What a [`SpinnerRenderer`] draws for one animation tick.
#[derive(Debug, Clone)]
pub struct SpinnerFrame {
    pub message: String,
    /// Colour for this tick, already resolved against the rotation.
    pub color: Color,
    /// Tick counter, starting at 0.
    pub index: usize,
}

/// Draws one animation tick as a single line.
///
/// Closures taking a [`SpinnerFrame`] implement this trait:
///
/// ```rust,ignore
/// let spinner = Spinner::new("Thinking")
///     .renderer(|f: &SpinnerFrame| format!("[{}] {}", f.index, f.message));
/// ```
pub trait SpinnerRenderer: Send + Sync {
    fn render(&self, frame: &SpinnerFrame) -> String;
}

impl<F> SpinnerRenderer for F
where F: Fn(&SpinnerFrame) -> String + Send + Sync
{
    fn render(&self, frame: &SpinnerFrame) -> String {
        self(frame)
    }
}

/// Cycles through a fixed list of icons, followed by the message.
pub struct Icons {
    frames: &'static [&'static str],
}

impl Icons {
    /// Eight-step braille spinner.
    pub fn dots() -> Self {
        Self {
            frames: &icon::BRAILLE,
        }
    }

    /// Four-step braille spinner, a slower-looking variant of [`Icons::dots`].
    pub fn clock() -> Self {
        const CLOCK: [&str; 4] = [
            icon::BRAILLE[0],
            icon::BRAILLE[2],
            icon::BRAILLE[4],
            icon::BRAILLE[6],
        ];
        Self { frames: &CLOCK }
    }

    /// Arrow rotating clockwise.
    pub fn arrow() -> Self {
        Self {
            frames: &[
                icon::ARROW_RIGHT,
                icon::ARROW_DOWN,
                icon::ARROW_LEFT,
                icon::ARROW_UP,
            ],
        }
    }

    /// Custom frames. An empty list draws the message alone.
    pub fn custom(frames: &'static [&'static str]) -> Self {
        Self { frames }
    }

    pub fn frame(&self, index: usize) -> &'static str {
        match self.frames.len() {
            0 => "",
            n => self.frames[index % n],
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self::dots()
    }
}

impl SpinnerRenderer for Icons {
    fn render(&self, frame: &SpinnerFrame) -> String {
        let icon = self.frame(frame.index);
        if icon.is_empty() {
            return frame.message.clone();
        }
        format!("{} {}", paint(frame.color, icon), frame.message)
    }
}

struct Worker {
    stop: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

struct SpinnerInner {
    message: String,
    color: Option<Color>,
    interval: Duration,
    renderer: Arc<dyn SpinnerRenderer>,
    show_elapsed: bool,
    suppress_render: bool,
    running: bool,
    state: SpinnerState,
    started_at: Option<Instant>,
    target: RenderTarget,
    worker: Option<Worker>,
}

impl SpinnerInner {
    fn current_color(&self, index: usize) -> Color {
        self.color
            .unwrap_or(COLOR_CYCLE[index % COLOR_CYCLE.len()])
    }

    fn render_tick(&mut self, index: usize) {
        if !self.running || self.suppress_render {
            return;
        }
        let line = self.renderer.render(&SpinnerFrame {
            message: self.message.clone(),
            color: self.current_color(index),
            index,
        });
        let _ = self.target.render(&line);
    }

    fn final_line(&self) -> String {
        let mark = match self.state {
            SpinnerState::Completed => paint(Color::Green, icon::CHECK),
            SpinnerState::Failed => paint(Color::Red, icon::CROSS),
        };
        let mut line = format!("{mark} {}", self.message);
        if self.show_elapsed {
            let elapsed = self.started_at.map(|t| t.elapsed()).unwrap_or_default();
            line.push(' ');
            line.push_str(&paint(Color::Cyan, format!("({})", format_duration(elapsed))));
        }
        line
    }
}

/// An animated single-line activity indicator.
///
/// The animation runs on a background thread from [`Spinner::start`] until
/// the spinner is stopped, completed or failed. Stopping waits for the
/// thread to exit before the final line is drawn, so no animation frame can
/// land after it.
///
/// ```rust,ignore
/// let spinner = Spinner::new("Fetching index").color(Color::Green);
/// spinner.start();
/// spinner.update_message("Fetching index (3/4)");
/// spinner.complete("Index fetched");
/// // ✓ Index fetched (1.2s)
/// ```
///
/// Clones share the same spinner.
#[derive(Clone)]
pub struct Spinner {
    inner: Arc<Mutex<SpinnerInner>>,
}

impl std::fmt::Debug for Spinner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Spinner")
            .field("message", &inner.message)
            .field("running", &inner.running)
            .field("state", &inner.state)
            .finish()
    }
}

impl Spinner {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SpinnerInner {
                message: message.into(),
                color: None,
                interval: DEFAULT_INTERVAL,
                renderer: Arc::new(Icons::dots()),
                show_elapsed: true,
                suppress_render: false,
                running: false,
                state: SpinnerState::default(),
                started_at: None,
                target: RenderTarget::new(crate::output::stdout()),
                worker: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SpinnerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fixes the icon colour, disabling rotation.
    pub fn color(self, color: Color) -> Self {
        self.lock().color = Some(color);
        self
    }

    /// Time between animation ticks. Zero is ignored.
    pub fn interval(self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.lock().interval = interval;
        }
        self
    }

    pub fn output(self, output: SharedOutput) -> Self {
        self.lock().target.set_output(output);
        self
    }

    pub fn renderer(self, renderer: impl SpinnerRenderer + 'static) -> Self {
        self.lock().renderer = Arc::new(renderer);
        self
    }

    /// Whether the final line shows how long the spinner ran. On by default.
    pub fn show_elapsed(self, show: bool) -> Self {
        self.lock().show_elapsed = show;
        self
    }

    /// Runs the state machine without writing anything.
    pub fn suppress_render(self, suppress: bool) -> Self {
        self.lock().suppress_render = suppress;
        self
    }

    /// Starts animating. Does nothing if already running.
    pub fn start(&self) {
        let mut inner = self.lock();
        if inner.running {
            return;
        }
        inner.running = true;
        inner.started_at = Some(Instant::now());
        inner.target.reset();

        let (stop, ticks) = mpsc::channel();
        let interval = inner.interval;
        let shared = Arc::downgrade(&self.inner);
        let handle = std::thread::spawn(move || animate(shared, ticks, interval));
        inner.worker = Some(Worker { stop, handle });
        drop(inner);

        tracing::trace!(?interval, "spinner started");
    }

    /// Stops with success. Does nothing if not running.
    pub fn stop(&self) {
        self.finish(SpinnerState::Completed, None);
    }

    /// Stops with a failure mark, replacing the message when `message` is
    /// non-empty. Does nothing if not running.
    pub fn fail(&self, message: &str) {
        self.finish(SpinnerState::Failed, Some(message));
    }

    /// Stops with success, replacing the message when `message` is non-empty.
    pub fn complete(&self, message: &str) {
        self.finish(SpinnerState::Completed, Some(message));
    }

    fn finish(&self, state: SpinnerState, message: Option<&str>) {
        let worker = {
            let mut inner = self.lock();
            if !inner.running {
                return;
            }
            if let Some(message) = message.filter(|m| !m.is_empty()) {
                inner.message = message.to_string();
            }
            inner.running = false;
            inner.state = state;
            inner.worker.take()
        };

        if let Some(worker) = worker {
            let _ = worker.stop.send(());
            let _ = worker.handle.join();
        }

        let mut inner = self.lock();
        if !inner.suppress_render {
            let line = inner.final_line();
            let _ = inner.target.render_final(&line);
        }
        drop(inner);

        tracing::trace!(?state, "spinner stopped");
    }

    /// Replaces the message; the next tick draws it.
    pub fn update_message(&self, message: impl Into<String>) {
        self.lock().message = message.into();
    }

    /// Redirects future renders.
    pub fn set_output(&self, output: SharedOutput) {
        self.lock().target.set_output(output);
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// How the last run finished. [`SpinnerState::Completed`] before the
    /// first run.
    pub fn state(&self) -> SpinnerState {
        self.lock().state
    }

    /// Time since start while running, zero otherwise.
    pub fn elapsed(&self) -> Duration {
        let inner = self.lock();
        match (inner.running, inner.started_at) {
            (true, Some(t)) => t.elapsed(),
            _ => Duration::ZERO,
        }
    }

    pub fn message(&self) -> String {
        self.lock().message.clone()
    }

    /// The fixed colour, or the first colour of the rotation.
    pub fn base_color(&self) -> Color {
        self.lock().color.unwrap_or(COLOR_CYCLE[0])
    }

    pub fn shows_elapsed(&self) -> bool {
        self.lock().show_elapsed
    }

    /// Colour used for tick `index`.
    pub fn current_color(&self, index: usize) -> Color {
        self.lock().current_color(index)
    }
}

/// Renders a tick every `interval` until told to stop or the spinner is gone.
fn animate(shared: Weak<Mutex<SpinnerInner>>, stop: mpsc::Receiver<()>, interval: Duration) {
    let mut index = 0;
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                let Some(inner) = shared.upgrade() else { return };
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .render_tick(index);
                index += 1;
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

impl TaskComponent for Spinner {
    fn start(&self) {
        Spinner::start(self);
    }

    fn complete(&self, message: &str) {
        Spinner::complete(self, message);
    }

    fn fail(&self, message: &str) {
        Spinner::fail(self, message);
    }

    fn set_output(&self, output: SharedOutput) {
        Spinner::set_output(self, output);
    }
}
