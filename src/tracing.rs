//! A `tracing` layer that writes events into an [`Output`], so log lines
//! can appear inside a frame next to the components drawing there.
//!
//! ```rust,ignore
//! use tracing_subscriber::prelude::*;
//!
//! let frame = Frame::open("Build");
//! let layer = OutputLayer::new(Arc::new(frame.clone())).with_target(false);
//! tracing_subscriber::registry().with(layer).init();
//!
//! tracing::info!(crate_count = 12, "resolving");
//! // │ INFO resolving crate_count=12            │
//! ```

use std::fmt::Write as _;

use ::tracing::field::{Field, Visit};
use ::tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::output::SharedOutput;
use crate::style::{Color, paint};

/// Writes each event as `LEVEL target: message key=value ...` on its own line.
pub struct OutputLayer {
    output: SharedOutput,
    with_target: bool,
    with_level: bool,
    colored: bool,
}

impl OutputLayer {
    pub fn new(output: SharedOutput) -> Self {
        Self {
            output,
            with_target: true,
            with_level: true,
            colored: true,
        }
    }

    /// Whether to print the event's target. On by default.
    pub fn with_target(mut self, show: bool) -> Self {
        self.with_target = show;
        self
    }

    /// Whether to print the event's level. On by default.
    pub fn with_level(mut self, show: bool) -> Self {
        self.with_level = show;
        self
    }

    /// Whether the level is coloured. On by default.
    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    fn level(&self, level: &Level) -> String {
        let color = match *level {
            Level::ERROR => Color::Red,
            Level::WARN => Color::Yellow,
            Level::INFO => Color::Green,
            Level::DEBUG => Color::Blue,
            Level::TRACE => Color::Magenta,
        };
        if self.colored {
            paint(color, level)
        } else {
            level.to_string()
        }
    }

    fn format(&self, event: &Event<'_>) -> String {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let mut line = String::new();
        if self.with_level {
            line.push_str(&self.level(meta.level()));
            line.push(' ');
        }
        if self.with_target {
            let _ = write!(line, "{}: ", meta.target());
        }
        line.push_str(&visitor.message);
        for (name, value) in &visitor.fields {
            let _ = write!(line, " {name}={value}");
        }
        line.push('\n');
        line
    }
}

impl<S: Subscriber> Layer<S> for OutputLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let _ = self.output.write_str(&self.format(event));
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<(&'static str, String)>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            name => self.fields.push((name, value.to_string())),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            name => self.fields.push((name, format!("{value:?}"))),
        }
    }
}
