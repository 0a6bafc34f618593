//! Editor sessions.
//!
//! # Responsibility
//! - Own one document, its selection and history for a single editing surface.
//! - Route key and pointer input through the capability-scoped handler table.
//! - Expose the host-facing operations: emptiness, get/set/reset, mode toggle.
//!
//! # Invariants
//! - Every document held by a session is valid for its schema.
//! - The decoration set and handler table always match the current version
//!   and mode.
//!
//! # See also
//! - `command` for the commands bound here.
//! - `codec` for the serialized form passed across the host boundary.

pub mod capability;
pub mod dispatch;
pub mod editor;
pub mod history;
pub mod state;

pub use capability::{
    parse_editor_capability, supported_editor_capability_strings, Capabilities, CapabilityError,
    EditorCapability,
};
pub use dispatch::{HandlerTable, PointerHandler};
pub use editor::{
    Editor, EditorError, EditorOptions, FocusHook, InputOutcome, SessionId, SubmitHook,
};
pub use history::{History, HistoryEntry, DEFAULT_HISTORY_DEPTH};
pub use state::{DocVersion, EditorState};
