//! Document engine for the note editor.
//! Owns schemas, documents, transactions, history and the session API that
//! hosts drive through the FFI crate.

pub mod codec;
pub mod command;
pub mod convert;
pub mod decoration;
pub mod logging;
pub mod model;
pub mod session;
pub mod transform;

pub use codec::{
    deserialize, from_json_str, render_live, render_static, serialize, to_json_string, DocError,
    SerializedDoc,
};
pub use command::{Command, Effect, KeyEvent, Platform};
pub use convert::{to_freeform, to_task, toggle_schema};
pub use decoration::{
    compute_decorations, Decoration, DecorationSet, PointerInput, PointerKind, Widget, WidgetKind,
};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::document::{Document, ResolvedPos};
pub use model::node::{AttrValue, Mark, MarkKind, Node, NodeKind};
pub use model::schema::{Schema, SchemaId, SchemaViolation};
pub use model::selection::Selection;
pub use session::{
    Capabilities, DocVersion, Editor, EditorCapability, EditorError, EditorOptions, EditorState,
    InputOutcome, SessionId,
};
pub use transform::{InvalidEdit, Step, Transaction};

/// Health-check for host bindings.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
