//! Note body data model.
//!
//! # Responsibility
//! - Define typed nodes, the two fixed schemas and schema-bound documents.
//! - Provide position resolution and selections over one document version.
//!
//! # Invariants
//! - Every `Document` satisfies its schema's content rules.
//! - `checked` attributes are booleans; attribute records have a fixed shape.

pub mod document;
pub mod node;
pub mod schema;
pub mod selection;
