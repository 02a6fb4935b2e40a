//! Task components.
//!
//! # Spinner
//!
//! [`Spinner`] animates on a background thread until it is completed or
//! failed:
//!
//! ```rust,ignore
//! let spinner = Spinner::new("Resolving dependencies");
//! spinner.start();
//! resolve()?;
//! spinner.complete("Resolved 42 crates");
//!
//! // Other icon sets:
//! let s = Spinner::new("..").renderer(Icons::clock()); // ⠋ ⠹ ⠼ ⠦
//! let s = Spinner::new("..").renderer(Icons::arrow()); // → ↓ ← ↑
//! let s = Spinner::new("..").renderer(Icons::custom(&["🌑", "🌓", "🌕", "🌗"]));
//! ```
//!
//! # Progress
//!
//! [`Progress`] redraws whenever it is updated:
//!
//! ```rust,ignore
//! let progress = Progress::new("Uploading", 10);
//! progress.start();
//! progress.update(5, "chunk 5");
//! // => Uploading   [██████████░░░░░░░░░░]  50.0% (05/10) chunk 5
//!
//! // Other styles:
//! let p = Progress::new("..", 10).renderer(Chars::dots()); // ●●●○○○
//! let p = Progress::new("..", 10).renderer(Minimal);       // ..: 50.0% - chunk 5
//! ```

mod progress;
mod spinner;

pub use progress::*;
pub use spinner::*;
