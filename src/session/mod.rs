// src/session/mod.rs
// =============================================================================
// The viewer side: everything between "user typed something" and "document
// on screen", minus the drawing.
//
// - input: parse owner/repo or a GitHub URL
// - errors: turn failures into a message + suggestion + severity
// - state: the browsing session with its loading flags and stale-response
//   guard
// =============================================================================

mod errors;
mod input;
mod state;

pub use errors::{ErrorDetails, Severity};
pub use input::{parse_repository_input, RepoRef, INPUT_HINT};
pub use state::{Document, Loading, Session, Slot, Ticket};
