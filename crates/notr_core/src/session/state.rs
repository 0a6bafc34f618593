//! Immutable editor state values.
//!
//! # Responsibility
//! - Pair the current document with its selection and version.
//! - Produce successor states for edits, selection moves, replacements and
//!   mode toggles without mutating the current value.
//!
//! # Invariants
//! - `version` increases on every document change or replacement and never
//!   on selection-only changes.
//! - The mode is the schema of the current document; it changes only through
//!   `toggle_schema` or a wholesale replacement.

use crate::convert;
use crate::model::document::Document;
use crate::model::schema::SchemaId;
use crate::model::selection::Selection;
use crate::transform::{apply_transaction, AppliedTransaction, InvalidEdit, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Monotonic document version published by a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocVersion(pub u64);

impl DocVersion {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for DocVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    doc: Document,
    selection: Selection,
    version: DocVersion,
}

impl EditorState {
    /// Fresh placeholder state for `mode`.
    pub fn new(mode: SchemaId) -> Self {
        let doc = Document::empty(mode);
        Self {
            selection: Selection::at_start(&doc),
            doc,
            version: DocVersion::default(),
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn version(&self) -> DocVersion {
        self.version
    }

    pub fn mode(&self) -> SchemaId {
        self.doc.schema_id()
    }

    /// Applies `tr`, mapping the selection unless the transaction sets one.
    ///
    /// # Errors
    /// - `InvalidEdit` when the transaction is rejected; `self` is unchanged.
    pub fn apply(&self, tr: &Transaction) -> Result<(Self, AppliedTransaction), InvalidEdit> {
        let applied = apply_transaction(&self.doc, tr)?;
        let selection = tr
            .selection()
            .unwrap_or_else(|| self.selection.map(&applied.mapping))
            .clamp(&applied.doc);
        let version = if tr.is_empty() {
            self.version
        } else {
            self.version.next()
        };
        let next = Self {
            doc: applied.doc.clone(),
            selection,
            version,
        };
        Ok((next, applied))
    }

    /// Same document with another selection.
    pub fn with_selection(&self, selection: Selection) -> Self {
        Self {
            doc: self.doc.clone(),
            selection: selection.clamp(&self.doc),
            version: self.version,
        }
    }

    /// Wholesale replacement of the document (reset, set, undo fallback).
    pub fn replace_doc(&self, doc: Document, selection: Option<Selection>) -> Self {
        let selection = selection
            .map(|selection| selection.clamp(&doc))
            .unwrap_or_else(|| Selection::at_start(&doc));
        Self {
            doc,
            selection,
            version: self.version.next(),
        }
    }

    /// Successor state under the other schema, converted structurally.
    pub fn toggle_schema(&self) -> Self {
        self.replace_doc(convert::toggle_schema(&self.doc), None)
    }
}
