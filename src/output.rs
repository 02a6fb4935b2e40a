//! Output sinks shared between the caller, frames and spinner threads.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// A sink that components render into.
///
/// Sinks are shared across threads (a spinner animates from its own thread
/// while the caller keeps writing), so writing takes `&self` and
/// implementations serialise internally.
pub trait Output: Send + Sync {
    /// Writes `s` as-is.
    fn write_str(&self, s: &str) -> std::io::Result<()>;

    fn flush(&self) -> std::io::Result<()> {
        Ok(())
    }

    /// The in-place replacement capability, when this sink has one.
    ///
    /// Components query this whenever their output changes; sinks without
    /// the capability get plain line-appending output.
    fn replacer(&self) -> Option<&dyn LineReplacer> {
        None
    }
}

/// In-place rewriting of lines already written to a sink.
pub trait LineReplacer {
    /// Replaces the line directly above the cursor.
    fn replace_line(&self, line: &str) -> std::io::Result<()>;

    /// Replaces the `n`th line above the cursor, leaving the cursor where it was.
    fn replace_line_n(&self, n: usize, line: &str) -> std::io::Result<()>;

    /// Replaces the last `count` lines with `lines`.
    fn replace_block(&self, count: usize, lines: &[String]) -> std::io::Result<()>;
}

/// Reference-counted sink handle.
pub type SharedOutput = Arc<dyn Output>;

/// Adapts any [`std::io::Write`] into an [`Output`].
pub struct WriterOutput<W: Write + Send> {
    inner: Mutex<W>,
}

impl<W: Write + Send> WriterOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> Output for WriterOutput<W> {
    fn write_str(&self, s: &str) -> std::io::Result<()> {
        let mut w = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        w.write_all(s.as_bytes())?;
        w.flush()
    }

    fn flush(&self) -> std::io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

/// Wraps a writer into a [`SharedOutput`].
pub fn from_writer<W: Write + Send + 'static>(writer: W) -> SharedOutput {
    Arc::new(WriterOutput::new(writer))
}

/// The process's standard output.
pub fn stdout() -> SharedOutput {
    from_writer(std::io::stdout())
}

/// The process's standard error.
pub fn stderr() -> SharedOutput {
    from_writer(std::io::stderr())
}

/// An in-memory sink that keeps everything written to it. Clones share the
/// same buffer.
///
/// ```rust,ignore
/// let buf = Buffer::new();
/// let spinner = Spinner::new("Loading").output(buf.shared());
/// spinner.start();
/// spinner.stop();
/// assert!(buf.contents().contains("Loading"));
/// ```
#[derive(Clone, Default)]
pub struct Buffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A [`SharedOutput`] writing into this buffer.
    pub fn shared(&self) -> SharedOutput {
        Arc::new(self.clone())
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn clear(&self) {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Output for Buffer {
    fn write_str(&self, s: &str) -> std::io::Result<()> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(s.as_bytes());
        Ok(())
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Buffer").field(&self.contents()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_clones_share_contents() {
        let buf = Buffer::new();
        let shared = buf.shared();
        shared.write_str("one ").unwrap();
        buf.clone().write_str("two").unwrap();
        assert_eq!(buf.contents(), "one two");
        assert!(shared.replacer().is_none());

        buf.clear();
        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn writer_output_forwards_bytes() {
        let out = WriterOutput::new(Vec::new());
        out.write_str("abc").unwrap();
        out.write_str("def").unwrap();
        let bytes = out.inner.into_inner().unwrap();
        assert_eq!(bytes, b"abcdef");
    }
}
