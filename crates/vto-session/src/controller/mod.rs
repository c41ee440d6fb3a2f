//! Session controller: the single writer of session state.
//!
//! All operations run on the caller's (UI/render) thread. Tracker calls that
//! are asynchronous complete through [`SessionController::handle_tracker_event`];
//! every request carries a fresh [`crate::RequestId`] and only the completion
//! of the most recent outstanding request is applied.

mod error;
mod session;
mod state;

pub use error::{SessionError, Severity};
pub use session::{SessionController, ViewportEvent};
pub use state::{LifecyclePhase, SessionState, TrackerHandle};
