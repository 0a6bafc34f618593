//! Persistence and presentation of documents.
//!
//! # Responsibility
//! - `serialize`: the `{schema, doc}` JSON envelope stored by hosts.
//! - `render`: HTML markup, static or with live widgets.

pub mod render;
pub mod serialize;

pub use render::{escape_html, render_live, render_static};
pub use serialize::{deserialize, from_json_str, serialize, to_json_string, DocError, SerializedDoc};
