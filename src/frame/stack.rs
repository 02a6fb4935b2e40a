use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{LazyLock, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::style::Color;

/// Identity of an open frame on a [`FrameStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(NonZeroUsize);

impl FrameId {
    /// Produces a process-unique id without locking.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        let id = NEXT.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroUsize::new(id).unwrap_or(NonZeroUsize::MIN))
    }
}

static GLOBAL: LazyLock<FrameStack> = LazyLock::new(FrameStack::new);

/// LIFO of open frames plus the colour override applied when drawing them.
///
/// A frame's depth is its 1-based position on the stack at the moment a
/// line is formatted, so a component holding an outer frame keeps drawing
/// the right number of border prefixes after inner frames close.
///
/// Lock discipline: `frames` and `color_override` each have their own lock.
/// `frames` may be held while reading `color_override`, never the other way
/// round. Reads (every rendered line) vastly outnumber writes (open/close).
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: RwLock<IndexMap<FrameId, Color>>,
    color_override: RwLock<Option<Color>>,
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide stack every [`super::Frame`] registers on.
    pub fn global() -> &'static FrameStack {
        &GLOBAL
    }

    pub(crate) fn push(&self, id: FrameId, color: Color) {
        self.frames
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, color);
    }

    /// Pops `id` only if it is the topmost frame.
    pub(crate) fn pop_if_top(&self, id: FrameId) -> bool {
        let mut frames = self.frames.write().unwrap_or_else(PoisonError::into_inner);
        match frames.last() {
            Some((top, _)) if *top == id => {
                frames.pop();
                true
            }
            _ => false,
        }
    }

    /// The topmost frame, if any.
    pub fn current(&self) -> Option<FrameId> {
        let frames = self.frames.read().unwrap_or_else(PoisonError::into_inner);
        frames.last().map(|(id, _)| *id)
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.frames
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 1-based position of `id`, or 0 when it isn't open.
    pub fn depth_of(&self, id: FrameId) -> usize {
        let frames = self.frames.read().unwrap_or_else(PoisonError::into_inner);
        frames.get_index_of(&id).map_or(0, |i| i + 1)
    }

    /// Colours of the bottom `max_depth` frames with the override applied.
    pub fn colors(&self, max_depth: usize) -> Vec<Color> {
        let frames = self.frames.read().unwrap_or_else(PoisonError::into_inner);
        let forced = self.color_override();
        frames
            .values()
            .take(max_depth)
            .map(|color| forced.unwrap_or(*color))
            .collect()
    }

    pub fn color_override(&self) -> Option<Color> {
        *self
            .color_override
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Forces every frame on this stack to draw in `color` (or clears the
    /// override with `None`). Meant for deterministic output in tests.
    pub fn set_color_override(&self, color: Option<Color>) {
        *self
            .color_override
            .write()
            .unwrap_or_else(PoisonError::into_inner) = color;
    }

    /// `color`, unless an override is set.
    pub fn effective(&self, color: Color) -> Color {
        self.color_override().unwrap_or(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_follows_live_position() {
        let stack = FrameStack::new();
        let (a, b, c) = (FrameId::next(), FrameId::next(), FrameId::next());

        stack.push(a, Color::Cyan);
        stack.push(b, Color::Green);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.depth_of(a), 1);
        assert_eq!(stack.depth_of(b), 2);
        assert_eq!(stack.depth_of(c), 0);
        assert_eq!(stack.current(), Some(b));

        assert!(!stack.pop_if_top(a));
        assert!(stack.pop_if_top(b));
        stack.push(c, Color::Red);
        assert_eq!(stack.depth_of(c), 2);
        assert_eq!(stack.depth_of(b), 0);
    }

    #[test]
    fn override_supersedes_frame_colors() {
        let stack = FrameStack::new();
        stack.push(FrameId::next(), Color::Cyan);
        stack.push(FrameId::next(), Color::Green);
        assert_eq!(stack.colors(2), vec![Color::Cyan, Color::Green]);
        assert_eq!(stack.colors(1), vec![Color::Cyan]);

        stack.set_color_override(Some(Color::Magenta));
        assert_eq!(stack.colors(5), vec![Color::Magenta, Color::Magenta]);
        assert_eq!(stack.effective(Color::Red), Color::Magenta);

        stack.set_color_override(None);
        assert_eq!(stack.effective(Color::Red), Color::Red);
    }
}
