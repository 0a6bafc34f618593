//! Edit primitives and atomic transaction application.
//!
//! # Responsibility
//! - Apply `ReplaceRange` / `SetAttribute` steps to immutable documents.
//! - Produce inverse steps for history and position maps for callers.
//!
//! # Invariants
//! - Application is all-or-nothing: on failure the input is untouched and no
//!   partial document escapes.
//! - Only the spine from the edited parent to the root is rebuilt; siblings
//!   are shared with the previous version.
//! - A replace is a flat splice inside one parent node.

use crate::model::document::{Document, ResolvedPos};
use crate::model::node::{AttrValue, Fragment, Node};
use crate::model::schema::SchemaViolation;
use crate::model::selection::Selection;
use crate::transform::mapping::{Mapping, StepMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One atomic edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Splices `content` between `from` and `to` (same parent node).
    ReplaceRange {
        from: usize,
        to: usize,
        content: Fragment,
    },
    /// Rewrites one attribute of the node starting at `pos`.
    SetAttribute {
        pos: usize,
        key: String,
        value: AttrValue,
    },
}

/// Ordered batch of steps applied together or not at all.
///
/// Each step's positions refer to the document produced by the steps before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    steps: Vec<Step>,
    selection: Option<Selection>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            selection: None,
        }
    }

    pub fn replace_range(mut self, from: usize, to: usize, content: Fragment) -> Self {
        self.steps.push(Step::ReplaceRange { from, to, content });
        self
    }

    pub fn set_attribute(mut self, pos: usize, key: impl Into<String>, value: AttrValue) -> Self {
        self.steps.push(Step::SetAttribute {
            pos,
            key: key.into(),
            value,
        });
        self
    }

    /// Selection to install once the transaction is applied.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// True when the transaction carries no document edits.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Why one step could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRejection {
    OutOfRange { from: usize, to: usize, size: usize },
    CrossesNodeBoundary { from: usize, to: usize },
    NoNodeAt { pos: usize },
    Schema(SchemaViolation),
}

impl Display for EditRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { from, to, size } => {
                write!(f, "range {from}..{to} is outside document of size {size}")
            }
            Self::CrossesNodeBoundary { from, to } => {
                write!(f, "range {from}..{to} crosses a node boundary")
            }
            Self::NoNodeAt { pos } => write!(f, "no node starts at position {pos}"),
            Self::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl From<SchemaViolation> for EditRejection {
    fn from(value: SchemaViolation) -> Self {
        Self::Schema(value)
    }
}

/// A transaction was rejected; the document it targeted is unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEdit {
    /// Index of the first failing step.
    pub step: usize,
    pub reason: EditRejection,
}

impl Display for InvalidEdit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid edit at step {}: {}", self.step, self.reason)
    }
}

impl Error for InvalidEdit {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.reason {
            EditRejection::Schema(err) => Some(err),
            _ => None,
        }
    }
}

/// Result of a successful application.
#[derive(Debug, Clone)]
pub struct AppliedTransaction {
    pub doc: Document,
    /// Steps that turn `doc` back into the input document.
    pub inverse: Transaction,
    pub mapping: Mapping,
}

/// Applies `tr` to `doc`, returning the new document.
///
/// # Errors
/// - `InvalidEdit` when any step fails; nothing is applied.
pub fn apply(doc: &Document, tr: &Transaction) -> Result<Document, InvalidEdit> {
    apply_transaction(doc, tr).map(|applied| applied.doc)
}

/// Applies `tr` and also returns its inverse and position mapping.
pub fn apply_transaction(doc: &Document, tr: &Transaction) -> Result<AppliedTransaction, InvalidEdit> {
    let mut current = doc.clone();
    let mut inverse_steps = Vec::with_capacity(tr.steps.len());
    let mut mapping = Mapping::default();
    for (index, step) in tr.steps.iter().enumerate() {
        let (next, inverse, map) =
            apply_step(&current, step).map_err(|reason| InvalidEdit { step: index, reason })?;
        current = next;
        inverse_steps.push(inverse);
        mapping.push(map);
    }
    inverse_steps.reverse();
    Ok(AppliedTransaction {
        doc: current,
        inverse: Transaction::from_steps(inverse_steps),
        mapping,
    })
}

fn apply_step(doc: &Document, step: &Step) -> Result<(Document, Step, StepMap), EditRejection> {
    match step {
        Step::ReplaceRange { from, to, content } => replace_range(doc, *from, *to, content),
        Step::SetAttribute { pos, key, value } => set_attribute(doc, *pos, key, *value),
    }
}

fn replace_range(
    doc: &Document,
    from: usize,
    to: usize,
    content: &Fragment,
) -> Result<(Document, Step, StepMap), EditRejection> {
    let size = doc.content_size();
    let out_of_range = EditRejection::OutOfRange { from, to, size };
    if from > to {
        return Err(out_of_range);
    }
    let start = doc.resolve(from).ok_or(out_of_range.clone())?;
    let end = doc.resolve(to).ok_or(out_of_range)?;
    if !start.same_parent(&end) {
        return Err(EditRejection::CrossesNodeBoundary { from, to });
    }

    let parent = start.parent();
    let Some(parent_content) = parent.content() else {
        return Err(EditRejection::CrossesNodeBoundary { from, to });
    };
    let (a, b) = (start.parent_offset(), end.parent_offset());
    let removed = parent_content.cut(a, b);
    let spliced = parent_content
        .cut(0, a)
        .append(content)
        .append(&parent_content.cut(b, parent_content.size()));

    let schema = doc.schema();
    let new_parent = parent.with_content(spliced);
    schema.check_node(&new_parent)?;
    for node in content.iter() {
        schema.validate(node)?;
    }

    let root = rebuild_spine(&start, new_parent);
    let inserted = content.size();
    Ok((
        Document::from_trusted(doc.schema_id(), root),
        Step::ReplaceRange {
            from,
            to: from + inserted,
            content: removed,
        },
        StepMap::new(from, to - from, inserted),
    ))
}

fn set_attribute(
    doc: &Document,
    pos: usize,
    key: &str,
    value: AttrValue,
) -> Result<(Document, Step, StepMap), EditRejection> {
    let resolved = doc.resolve(pos).ok_or(EditRejection::NoNodeAt { pos })?;
    if resolved.text_offset() != 0 {
        return Err(EditRejection::NoNodeAt { pos });
    }
    let parent = resolved.parent();
    let index = resolved.index(resolved.depth());
    let target = parent.child(index).ok_or(EditRejection::NoNodeAt { pos })?;

    let updated = target.with_attr(key, value)?;
    let previous = target.attr(key).ok_or(EditRejection::NoNodeAt { pos })?;
    doc.schema().check_node(&updated)?;

    let siblings = parent.content().cloned().unwrap_or_default();
    let new_parent = parent.with_content(siblings.replace_child(index, updated));
    let root = rebuild_spine(&resolved, new_parent);
    Ok((
        Document::from_trusted(doc.schema_id(), root),
        Step::SetAttribute {
            pos,
            key: key.to_string(),
            value: previous,
        },
        StepMap::identity(),
    ))
}

/// Replaces the innermost parent of `resolved` and rebuilds its ancestors.
fn rebuild_spine(resolved: &ResolvedPos, new_parent: Node) -> Node {
    let mut node = new_parent;
    for depth in (0..resolved.depth()).rev() {
        let ancestor = resolved.node(depth);
        let siblings = ancestor.content().cloned().unwrap_or_default();
        node = ancestor.with_content(siblings.replace_child(resolved.index(depth), node));
    }
    node
}

#[cfg(test)]
mod tests {
    use super::{apply, apply_transaction, EditRejection, Transaction};
    use crate::model::document::Document;
    use crate::model::node::{AttrValue, Fragment, Node};
    use crate::model::schema::SchemaId;
    use std::sync::Arc;

    fn paragraphs(texts: &[&str]) -> Document {
        Document::new(
            SchemaId::Text,
            Node::Doc {
                content: texts.iter().map(|text| Node::plain_paragraph(text)).collect(),
            },
        )
        .expect("valid doc")
    }

    #[test]
    fn inserting_text_splices_into_the_run() {
        let doc = paragraphs(&["Buy milk"]);
        let tr = Transaction::new().replace_range(5, 5, Fragment::from_nodes(vec![Node::text("oat ")]));
        let next = apply(&doc, &tr).expect("insert");
        assert_eq!(next.text_content(), "Buy oat milk");
        assert_eq!(next.blocks().get(0).map(Node::child_count), Some(1));
    }

    #[test]
    fn inverse_restores_the_original_document() {
        let doc = paragraphs(&["Buy milk", "Call mom"]);
        let tr = Transaction::new()
            .replace_range(1, 5, Fragment::empty())
            .replace_range(7, 9, Fragment::from_nodes(vec![Node::text("X")]));
        let applied = apply_transaction(&doc, &tr).expect("apply");
        assert_eq!(applied.doc.text_content(), "milkXll mom");
        let restored = apply(&applied.doc, &applied.inverse).expect("inverse");
        assert_eq!(restored, doc);
    }

    #[test]
    fn failing_step_rejects_the_whole_transaction() {
        let doc = paragraphs(&["a", "b"]);
        let tr = Transaction::new()
            .replace_range(1, 1, Fragment::from_nodes(vec![Node::text("ok")]))
            .replace_range(2, 7, Fragment::empty());
        let err = apply(&doc, &tr).expect_err("second step crosses paragraphs");
        assert_eq!(err.step, 1);
        assert!(matches!(err.reason, EditRejection::CrossesNodeBoundary { .. }));
        assert_eq!(doc.text_content(), "ab");
    }

    #[test]
    fn schema_violations_become_invalid_edits() {
        let doc = paragraphs(&["a"]);
        let tr = Transaction::new().replace_range(0, 3, Fragment::empty());
        let err = apply(&doc, &tr).expect_err("doc needs a block");
        assert!(matches!(err.reason, EditRejection::Schema(_)));
    }

    #[test]
    fn set_attribute_shares_untouched_siblings() {
        let doc = Document::new(
            SchemaId::Task,
            Node::Doc {
                content: Fragment::from_nodes(vec![Node::TaskList {
                    content: Fragment::from_nodes(vec![
                        crate::model::schema::empty_task_item(),
                        crate::model::schema::empty_task_item(),
                    ]),
                }]),
            },
        )
        .expect("valid");
        let applied = apply_transaction(
            &doc,
            &Transaction::new().set_attribute(2, "checked", AttrValue::Bool(true)),
        )
        .expect("toggle");

        let old_list = doc.blocks().get(0).and_then(Node::content).expect("list");
        let new_list = applied.doc.blocks().get(0).and_then(Node::content).expect("list");
        assert!(Arc::ptr_eq(&old_list.shared()[1], &new_list.shared()[1]));
        assert!(!Arc::ptr_eq(&old_list.shared()[0], &new_list.shared()[0]));
        assert_eq!(
            applied.doc.node_at(2).and_then(|node| node.attr("checked")),
            Some(AttrValue::Bool(true))
        );
        assert_eq!(
            applied.inverse.steps().len(),
            1,
            "inverse is a single attribute reset"
        );
    }

    #[test]
    fn set_attribute_requires_a_node_boundary() {
        let doc = paragraphs(&["abc"]);
        let err = apply(
            &doc,
            &Transaction::new().set_attribute(2, "checked", AttrValue::Bool(true)),
        )
        .expect_err("inside text");
        assert!(matches!(err.reason, EditRejection::NoNodeAt { pos: 2 }));
    }
}
