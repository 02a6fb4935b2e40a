#![doc = include_str!("../README.md")]

pub mod error;
pub mod frame;
pub mod output;
pub mod style;
pub mod term;
pub mod widgets;

pub(crate) mod group;
pub(crate) mod task;
#[cfg(feature = "tracing")]
pub(crate) mod tracing;
pub(crate) mod writer;


/// Re-exports of all public types and traits.
pub mod prelude {
    pub use crate::TaskComponent;
    pub use crate::error::{Error, TaskError};
    pub use crate::frame::{Frame, FrameBuilder, FrameStyle, override_color};
    pub use crate::group::SpinGroup;
    pub use crate::output::{Buffer, LineReplacer, Output, SharedOutput};
    pub use crate::style::Color;
    pub use crate::task::{TaskId, TaskInfo, TaskStatus};
    #[cfg(feature = "tracing")]
    pub use crate::tracing::OutputLayer;
    pub use crate::widgets::{
        Chars, Icons, Minimal, Progress, ProgressRenderer, ProgressView, Spinner, SpinnerFrame,
        SpinnerRenderer, SpinnerState,
    };
    pub use crate::writer::IndentedWriter;
}

pub use crate::prelude::*;

/// A component a [`SpinGroup`] task drives: something that shows a task
/// starting and then finishing one way or the other.
///
/// [`Spinner`] and [`Progress`] implement it; any other type can, too. The
/// group calls [`set_output`](TaskComponent::set_output) and
/// [`start`](TaskComponent::start) before the task function runs, then
/// exactly one of [`complete`](TaskComponent::complete) or
/// [`fail`](TaskComponent::fail).
///
/// Components are shared with a background thread in some cases, so every
/// method takes `&self`. Finishing a component that already finished must
/// do nothing.
pub trait TaskComponent: Send + Sync {
    /// Begins showing the task as running.
    fn start(&self);

    /// Finishes successfully. A non-empty `message` replaces the displayed one.
    fn complete(&self, message: &str);

    /// Finishes with a failure. A non-empty `message` replaces the displayed one.
    fn fail(&self, message: &str);

    /// Redirects everything the component draws from now on.
    fn set_output(&self, output: SharedOutput);
}
