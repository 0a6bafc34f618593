//! Fixed note schemas (free-form text and task list).
//!
//! # Responsibility
//! - Declare which node kinds and marks each schema admits.
//! - Enforce content rules by exhaustive matching over node kinds.
//! - Offer validated node constructors.
//!
//! # Invariants
//! - Exactly two schemas exist; they are constants, not configuration.
//! - Construction never coerces: invalid input is a `SchemaViolation`.

use crate::model::node::{AttrValue, Fragment, Mark, MarkKind, Node, NodeKind};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// External identifier of a schema, as written in serialized notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaId {
    /// Free-form rich text. `"schema"` is the tag older notes were saved with.
    #[serde(rename = "text", alias = "schema")]
    Text,
    /// Checkable task list. `"taskSchema"` is the legacy tag.
    #[serde(rename = "task", alias = "taskSchema")]
    Task,
}

impl SchemaId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Task => "task",
        }
    }

    /// Mode name reported to hosts.
    pub fn mode_name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Task => "checklist",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Text => Self::Task,
            Self::Task => Self::Text,
        }
    }

    pub fn schema(self) -> &'static Schema {
        match self {
            Self::Text => &FREEFORM,
            Self::Task => &TASK,
        }
    }
}

impl Display for SchemaId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construction or validation failure against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    NodeNotInSchema { schema: SchemaId, kind: NodeKind },
    MarkNotInSchema { schema: SchemaId, mark: MarkKind },
    MarkNotAllowed { parent: NodeKind, mark: MarkKind },
    UnknownAttribute { kind: NodeKind, key: String },
    InvalidAttribute { kind: NodeKind, key: String, value: String },
    InvalidContent { schema: SchemaId, parent: NodeKind, found: String },
    EmptyText,
}

impl Display for SchemaViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotInSchema { schema, kind } => {
                write!(f, "node `{kind}` is not defined in schema `{schema}`")
            }
            Self::MarkNotInSchema { schema, mark } => {
                write!(f, "mark `{}` is not defined in schema `{schema}`", mark.as_str())
            }
            Self::MarkNotAllowed { parent, mark } => {
                write!(f, "mark `{}` is not allowed inside `{parent}`", mark.as_str())
            }
            Self::UnknownAttribute { kind, key } => {
                write!(f, "node `{kind}` has no attribute `{key}`")
            }
            Self::InvalidAttribute { kind, key, value } => {
                write!(f, "invalid value `{value}` for `{kind}.{key}`")
            }
            Self::InvalidContent {
                schema,
                parent,
                found,
            } => write!(
                f,
                "content [{found}] is not valid for `{parent}` in schema `{schema}`"
            ),
            Self::EmptyText => write!(f, "text nodes must not be empty"),
        }
    }
}

impl Error for SchemaViolation {}

/// One of the two fixed node grammars.
#[derive(Debug)]
pub struct Schema {
    id: SchemaId,
    nodes: &'static [NodeKind],
    marks: &'static [MarkKind],
}

static FREEFORM: Schema = Schema {
    id: SchemaId::Text,
    nodes: &[
        NodeKind::Doc,
        NodeKind::Paragraph,
        NodeKind::Heading,
        NodeKind::Blockquote,
        NodeKind::CodeBlock,
        NodeKind::HorizontalRule,
        NodeKind::BulletList,
        NodeKind::OrderedList,
        NodeKind::ListItem,
        NodeKind::HardBreak,
        NodeKind::Image,
        NodeKind::Text,
    ],
    marks: &[MarkKind::Link, MarkKind::Em, MarkKind::Strong, MarkKind::Code],
};

static TASK: Schema = Schema {
    id: SchemaId::Task,
    nodes: &[
        NodeKind::Doc,
        NodeKind::TaskList,
        NodeKind::TaskItem,
        NodeKind::Checkbox,
        NodeKind::Paragraph,
        NodeKind::Text,
    ],
    marks: &[],
};

impl Schema {
    pub fn freeform() -> &'static Schema {
        &FREEFORM
    }

    pub fn task() -> &'static Schema {
        &TASK
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn has_node(&self, kind: NodeKind) -> bool {
        self.nodes.contains(&kind)
    }

    pub fn has_mark(&self, mark: MarkKind) -> bool {
        self.marks.contains(&mark)
    }

    /// Whether text directly inside `parent` may carry marks.
    pub fn allows_marks_in(&self, parent: NodeKind) -> bool {
        self.id == SchemaId::Text && matches!(parent, NodeKind::Paragraph | NodeKind::Heading)
    }

    /// Builds a validated non-text node.
    ///
    /// # Errors
    /// - Any `SchemaViolation` found in the node or its subtree.
    pub fn node(
        &self,
        kind: NodeKind,
        attrs: &[(&str, AttrValue)],
        content: Vec<Node>,
    ) -> Result<Node, SchemaViolation> {
        if !self.has_node(kind) {
            return Err(SchemaViolation::NodeNotInSchema {
                schema: self.id,
                kind,
            });
        }
        if kind == NodeKind::Text || (kind.is_leaf() && !content.is_empty()) {
            return Err(SchemaViolation::InvalidContent {
                schema: self.id,
                parent: kind,
                found: kinds_label(content.iter()),
            });
        }
        let mut node = Node::container(kind, Fragment::from_nodes(content));
        for (key, value) in attrs {
            node = node.with_attr(key, *value)?;
        }
        self.validate(&node)?;
        Ok(node)
    }

    /// Builds a validated text node.
    pub fn text(&self, text: impl Into<String>, marks: Vec<Mark>) -> Result<Node, SchemaViolation> {
        let text = text.into();
        if text.is_empty() {
            return Err(SchemaViolation::EmptyText);
        }
        for mark in &marks {
            if !self.has_mark(mark.kind()) {
                return Err(SchemaViolation::MarkNotInSchema {
                    schema: self.id,
                    mark: mark.kind(),
                });
            }
        }
        Ok(Node::Text { text, marks })
    }

    /// The placeholder document a fresh session starts from.
    pub fn empty_doc(&self) -> Node {
        let body = match self.id {
            SchemaId::Text => Node::plain_paragraph(""),
            SchemaId::Task => Node::TaskList {
                content: Fragment::from_nodes(vec![empty_task_item()]),
            },
        };
        Node::Doc {
            content: Fragment::from_nodes(vec![body]),
        }
    }

    /// Validates `node` and its whole subtree.
    pub fn validate(&self, node: &Node) -> Result<(), SchemaViolation> {
        self.check_node(node)?;
        if let Some(content) = node.content() {
            for child in content.iter() {
                self.validate(child)?;
            }
        }
        Ok(())
    }

    /// Validates `node` itself: kind, attributes, direct children and marks.
    ///
    /// Children's own subtrees are not visited.
    pub fn check_node(&self, node: &Node) -> Result<(), SchemaViolation> {
        let kind = node.kind();
        if !self.has_node(kind) {
            return Err(SchemaViolation::NodeNotInSchema {
                schema: self.id,
                kind,
            });
        }
        check_attrs(node)?;
        match node {
            Node::Text { text, marks } => {
                if text.is_empty() {
                    return Err(SchemaViolation::EmptyText);
                }
                for mark in marks {
                    if !self.has_mark(mark.kind()) {
                        return Err(SchemaViolation::MarkNotInSchema {
                            schema: self.id,
                            mark: mark.kind(),
                        });
                    }
                }
                Ok(())
            }
            other => self.check_children(other),
        }
    }

    fn check_children(&self, parent: &Node) -> Result<(), SchemaViolation> {
        let Some(content) = parent.content() else {
            return Ok(());
        };
        let kinds: Vec<NodeKind> = content.iter().map(Node::kind).collect();
        let valid = match (self.id, parent.kind()) {
            (SchemaId::Text, NodeKind::Doc | NodeKind::Blockquote) => {
                !kinds.is_empty() && kinds.iter().all(|kind| is_freeform_block(*kind))
            }
            (SchemaId::Text, NodeKind::Paragraph | NodeKind::Heading) => {
                kinds.iter().all(|kind| kind.is_inline())
            }
            (SchemaId::Text, NodeKind::CodeBlock) | (SchemaId::Task, NodeKind::Paragraph) => {
                kinds.iter().all(|kind| *kind == NodeKind::Text)
            }
            (SchemaId::Text, NodeKind::BulletList | NodeKind::OrderedList) => {
                !kinds.is_empty() && kinds.iter().all(|kind| *kind == NodeKind::ListItem)
            }
            (SchemaId::Text, NodeKind::ListItem) => match kinds.split_first() {
                Some((first, rest)) => {
                    *first == NodeKind::Paragraph && rest.iter().all(|kind| is_freeform_block(*kind))
                }
                None => false,
            },
            (SchemaId::Task, NodeKind::Doc) => kinds == [NodeKind::TaskList],
            (SchemaId::Task, NodeKind::TaskList) => {
                !kinds.is_empty() && kinds.iter().all(|kind| *kind == NodeKind::TaskItem)
            }
            (SchemaId::Task, NodeKind::TaskItem) => {
                kinds == [NodeKind::Checkbox, NodeKind::Paragraph]
            }
            _ => false,
        };
        if !valid {
            return Err(SchemaViolation::InvalidContent {
                schema: self.id,
                parent: parent.kind(),
                found: kinds_label(content.iter()),
            });
        }

        for child in content.iter() {
            if let Some(mark) = child.marks().first() {
                if !self.allows_marks_in(parent.kind()) {
                    return Err(SchemaViolation::MarkNotAllowed {
                        parent: parent.kind(),
                        mark: mark.kind(),
                    });
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn empty_task_item() -> Node {
    Node::TaskItem {
        content: Fragment::from_nodes(vec![Node::checkbox(false), Node::plain_paragraph("")]),
    }
}

fn is_freeform_block(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Paragraph
            | NodeKind::Heading
            | NodeKind::Blockquote
            | NodeKind::CodeBlock
            | NodeKind::HorizontalRule
            | NodeKind::BulletList
            | NodeKind::OrderedList
    )
}

fn check_attrs(node: &Node) -> Result<(), SchemaViolation> {
    match node {
        Node::Heading { attrs, .. } if !(1..=6).contains(&attrs.level) => {
            Err(SchemaViolation::InvalidAttribute {
                kind: NodeKind::Heading,
                key: "level".to_string(),
                value: attrs.level.to_string(),
            })
        }
        Node::OrderedList { attrs, .. } if attrs.order == 0 => {
            Err(SchemaViolation::InvalidAttribute {
                kind: NodeKind::OrderedList,
                key: "order".to_string(),
                value: attrs.order.to_string(),
            })
        }
        Node::Image { attrs } if attrs.src.is_empty() => Err(SchemaViolation::InvalidAttribute {
            kind: NodeKind::Image,
            key: "src".to_string(),
            value: String::new(),
        }),
        _ => Ok(()),
    }
}

fn kinds_label<'a>(nodes: impl Iterator<Item = &'a Node>) -> String {
    nodes
        .map(|node| node.kind().as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{Schema, SchemaId, SchemaViolation};
    use crate::model::node::{AttrValue, Mark, MarkKind, Node, NodeKind};

    #[test]
    fn schema_ids_use_external_tags_and_accept_legacy_ones() {
        assert_eq!(serde_json::to_string(&SchemaId::Task).expect("tag"), "\"task\"");
        let legacy: SchemaId = serde_json::from_str("\"taskSchema\"").expect("legacy tag");
        assert_eq!(legacy, SchemaId::Task);
        let legacy: SchemaId = serde_json::from_str("\"schema\"").expect("legacy tag");
        assert_eq!(legacy, SchemaId::Text);
    }

    #[test]
    fn task_schema_rejects_freeform_kinds() {
        let err = Schema::task()
            .node(NodeKind::Blockquote, &[], vec![])
            .expect_err("blockquote is freeform only");
        assert!(matches!(err, SchemaViolation::NodeNotInSchema { .. }));
    }

    #[test]
    fn task_item_requires_checkbox_then_paragraph() {
        let schema = Schema::task();
        let paragraph = schema
            .node(NodeKind::Paragraph, &[], vec![])
            .expect("empty paragraph");
        let checkbox = schema
            .node(NodeKind::Checkbox, &[("checked", AttrValue::Bool(true))], vec![])
            .expect("checkbox");

        let err = schema
            .node(NodeKind::TaskItem, &[], vec![paragraph.clone(), checkbox.clone()])
            .expect_err("wrong order");
        assert!(matches!(err, SchemaViolation::InvalidContent { .. }));

        let item = schema
            .node(NodeKind::TaskItem, &[], vec![checkbox, paragraph])
            .expect("valid item");
        assert_eq!(item.child_count(), 2);
    }

    #[test]
    fn marks_are_limited_to_freeform_inline_parents() {
        let strong = Schema::freeform()
            .text("bold", vec![Mark::Strong])
            .expect("strong text");
        assert!(Schema::freeform()
            .node(NodeKind::Paragraph, &[], vec![strong.clone()])
            .is_ok());
        let err = Schema::freeform()
            .node(NodeKind::CodeBlock, &[], vec![strong])
            .expect_err("code blocks carry no marks");
        assert_eq!(
            err,
            SchemaViolation::MarkNotAllowed {
                parent: NodeKind::CodeBlock,
                mark: MarkKind::Strong
            }
        );
        let err = Schema::task()
            .text("x", vec![Mark::Em])
            .expect_err("task schema has no marks");
        assert!(matches!(err, SchemaViolation::MarkNotInSchema { .. }));
    }

    #[test]
    fn empty_text_and_bad_attributes_are_rejected() {
        assert_eq!(
            Schema::freeform().text("", vec![]).expect_err("empty"),
            SchemaViolation::EmptyText
        );
        let err = Schema::freeform()
            .node(NodeKind::Heading, &[("level", AttrValue::Int(9))], vec![])
            .expect_err("level out of range");
        assert!(matches!(err, SchemaViolation::InvalidAttribute { .. }));
    }

    #[test]
    fn images_are_freeform_inline_leaves() {
        let paragraph = Schema::freeform()
            .node(NodeKind::Paragraph, &[], vec![Node::text("see "), Node::image("a.png")])
            .expect("image inside paragraph");
        assert_eq!(paragraph.node_size(), 7);
        assert_eq!(paragraph.text_content(), "see ");

        let err = Schema::task()
            .node(NodeKind::Paragraph, &[], vec![Node::image("a.png")])
            .expect_err("task paragraphs hold text only");
        assert!(matches!(err, SchemaViolation::InvalidContent { .. }));

        let err = Schema::freeform()
            .node(NodeKind::Paragraph, &[], vec![Node::image("")])
            .expect_err("image needs a source");
        assert!(matches!(
            err,
            SchemaViolation::InvalidAttribute { kind: NodeKind::Image, .. }
        ));
    }

    #[test]
    fn empty_docs_are_valid() {
        for schema in [Schema::freeform(), Schema::task()] {
            schema
                .validate(&schema.empty_doc())
                .expect("empty doc must validate");
        }
        assert_eq!(Schema::task().empty_doc().text_content(), "");
        assert!(matches!(
            Schema::freeform().empty_doc().child(0),
            Some(Node::Paragraph { .. })
        ));
    }
}
