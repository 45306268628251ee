//! # ClassTrack Engine
//!
//! The admin-side workflow core: routes structured button callbacks to
//! the renewal and class-lifecycle workflows, keeps per-operator
//! conversation state, and renders the next menu.
//!
//! ## Architecture
//! ```text
//! Button press ("stu:RENEW:17")
//!   → Callback::parse → Dispatcher
//!     → re-fetch student from the RecordStore (fail closed if gone)
//!     → workflow handler (renewal / lifecycle / roster action)
//!       → pattern::weekly_pattern over audit history
//!       → project::project_from_pattern for new batches
//!       → store mutation + audit append
//!     → Render { text, keyboard } back to the channel layer
//! ```
//!
//! Everything recovers at the workflow boundary: a handler failure
//! becomes a rendered message, never a crashed event loop.

pub mod callback;
pub mod dispatch;
pub mod lifecycle;
pub mod pattern;
pub mod project;
pub mod renewal;
pub mod session;
pub mod view;

pub use callback::{Callback, ClassVerb, ConfirmAction, LogVerb, ReschedTarget, StudentVerb};
pub use dispatch::Dispatcher;
pub use pattern::{slots_to_text, weekly_pattern, Slot};
pub use project::project_from_pattern;
pub use session::{SessionState, Sessions};

#[cfg(test)]
pub(crate) mod testing;
