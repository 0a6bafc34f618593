//! Typed node tree for note bodies.
//!
//! # Responsibility
//! - Define the closed set of node kinds shared by both note schemas.
//! - Provide size/position arithmetic used by documents and transactions.
//! - Keep children behind `Arc` so edits copy only the edited spine.
//!
//! # Invariants
//! - Nodes are immutable once constructed; "edits" build new nodes.
//! - Text nodes hold at least one char after normalization.
//! - Each kind carries one fixed attribute record (no open attribute bags).
//!
//! # See also
//! - `model::schema` for the content rules each schema enforces.

use crate::model::schema::SchemaViolation;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Fieldless discriminant of [`Node`], used by schema rules and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    BulletList,
    OrderedList,
    ListItem,
    HardBreak,
    Image,
    TaskList,
    TaskItem,
    Checkbox,
    Text,
}

impl NodeKind {
    /// Stable external name, identical to the JSON `type` tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::Blockquote => "blockquote",
            Self::CodeBlock => "code_block",
            Self::HorizontalRule => "horizontal_rule",
            Self::BulletList => "bullet_list",
            Self::OrderedList => "ordered_list",
            Self::ListItem => "list_item",
            Self::HardBreak => "hard_break",
            Self::Image => "image",
            Self::TaskList => "task_list",
            Self::TaskItem => "task_item",
            Self::Checkbox => "checkbox",
            Self::Text => "text",
        }
    }

    /// Leaf kinds never hold children.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            Self::HorizontalRule | Self::HardBreak | Self::Image | Self::Checkbox | Self::Text
        )
    }

    /// Blocks whose content is inline (text and hard breaks).
    pub fn is_textblock(self) -> bool {
        matches!(self, Self::Paragraph | Self::Heading | Self::CodeBlock)
    }

    pub fn is_inline(self) -> bool {
        matches!(self, Self::Text | Self::HardBreak | Self::Image)
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline formatting kinds, used by keymap toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkKind {
    Link,
    Em,
    Strong,
    Code,
}

impl MarkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Em => "em",
            Self::Strong => "strong",
            Self::Code => "code",
        }
    }
}

/// Attributes of a link mark.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkAttrs {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Inline mark attached to a text node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Link { attrs: LinkAttrs },
    Em,
    Strong,
    Code,
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        match self {
            Self::Link { .. } => MarkKind::Link,
            Self::Em => MarkKind::Em,
            Self::Strong => MarkKind::Strong,
            Self::Code => MarkKind::Code,
        }
    }

    /// Creates the attribute-free mark for `kind`; links need an href.
    pub fn simple(kind: MarkKind) -> Option<Self> {
        match kind {
            MarkKind::Em => Some(Self::Em),
            MarkKind::Strong => Some(Self::Strong),
            MarkKind::Code => Some(Self::Code),
            MarkKind::Link => None,
        }
    }
}

/// Adds `mark` to a mark set, keeping the canonical kind order.
///
/// A mark of the same kind is replaced rather than duplicated.
pub fn add_mark(marks: &[Mark], mark: Mark) -> Vec<Mark> {
    let mut out: Vec<Mark> = marks
        .iter()
        .filter(|existing| existing.kind() != mark.kind())
        .cloned()
        .collect();
    out.push(mark);
    out.sort_by_key(Mark::kind);
    out
}

/// Removes every mark of `kind` from a mark set.
pub fn remove_mark(marks: &[Mark], kind: MarkKind) -> Vec<Mark> {
    marks
        .iter()
        .filter(|existing| existing.kind() != kind)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadingAttrs {
    pub level: u8,
}

impl Default for HeadingAttrs {
    fn default() -> Self {
        Self { level: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderedListAttrs {
    pub order: u32,
}

impl Default for OrderedListAttrs {
    fn default() -> Self {
        Self { order: 1 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckboxAttrs {
    pub checked: bool,
}

/// Attributes of an inline image. `alt` and `title` are written as `null`
/// when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageAttrs {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Typed value for `SetAttribute` edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(u32),
}

impl Display for AttrValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
        }
    }
}

/// One element of a document tree.
///
/// Serialized in the ProseMirror JSON shape: `{"type": ..., "attrs": ...,
/// "content": [...]}` and `{"type": "text", "text": ..., "marks": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Doc {
        #[serde(default, skip_serializing_if = "Fragment::is_empty")]
        content: Fragment,
    },
    Paragraph {
        #[serde(default, skip_serializing_if = "Fragment::is_empty")]
        content: Fragment,
    },
    Heading {
        #[serde(default)]
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Fragment::is_empty")]
        content: Fragment,
    },
    Blockquote {
        #[serde(default, skip_serializing_if = "Fragment::is_empty")]
        content: Fragment,
    },
    CodeBlock {
        #[serde(default, skip_serializing_if = "Fragment::is_empty")]
        content: Fragment,
    },
    HorizontalRule,
    BulletList {
        #[serde(default, skip_serializing_if = "Fragment::is_empty")]
        content: Fragment,
    },
    OrderedList {
        #[serde(default)]
        attrs: OrderedListAttrs,
        #[serde(default, skip_serializing_if = "Fragment::is_empty")]
        content: Fragment,
    },
    ListItem {
        #[serde(default, skip_serializing_if = "Fragment::is_empty")]
        content: Fragment,
    },
    HardBreak,
    Image {
        attrs: ImageAttrs,
    },
    TaskList {
        #[serde(default, skip_serializing_if = "Fragment::is_empty")]
        content: Fragment,
    },
    TaskItem {
        #[serde(default, skip_serializing_if = "Fragment::is_empty")]
        content: Fragment,
    },
    Checkbox {
        #[serde(default)]
        attrs: CheckboxAttrs,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
}

impl Node {
    /// Unvalidated constructor; callers go through `Schema` or guarantee validity.
    pub(crate) fn container(kind: NodeKind, content: Fragment) -> Self {
        match kind {
            NodeKind::Doc => Self::Doc { content },
            NodeKind::Paragraph => Self::Paragraph { content },
            NodeKind::Heading => Self::Heading {
                attrs: HeadingAttrs::default(),
                content,
            },
            NodeKind::Blockquote => Self::Blockquote { content },
            NodeKind::CodeBlock => Self::CodeBlock { content },
            NodeKind::HorizontalRule => Self::HorizontalRule,
            NodeKind::BulletList => Self::BulletList { content },
            NodeKind::OrderedList => Self::OrderedList {
                attrs: OrderedListAttrs::default(),
                content,
            },
            NodeKind::ListItem => Self::ListItem { content },
            NodeKind::HardBreak => Self::HardBreak,
            NodeKind::Image => Self::Image {
                attrs: ImageAttrs::default(),
            },
            NodeKind::TaskList => Self::TaskList { content },
            NodeKind::TaskItem => Self::TaskItem { content },
            NodeKind::Checkbox => Self::Checkbox {
                attrs: CheckboxAttrs::default(),
            },
            NodeKind::Text => Self::Text {
                text: content.text_content(),
                marks: Vec::new(),
            },
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn image(src: impl Into<String>) -> Self {
        Self::Image {
            attrs: ImageAttrs {
                src: src.into(),
                alt: None,
                title: None,
            },
        }
    }

    pub fn checkbox(checked: bool) -> Self {
        Self::Checkbox {
            attrs: CheckboxAttrs { checked },
        }
    }

    /// Paragraph holding `text` as a single unmarked run (empty text → no run).
    pub fn plain_paragraph(text: &str) -> Self {
        let content = if text.is_empty() {
            Fragment::empty()
        } else {
            Fragment::from_nodes(vec![Self::text(text)])
        };
        Self::Paragraph { content }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Doc { .. } => NodeKind::Doc,
            Self::Paragraph { .. } => NodeKind::Paragraph,
            Self::Heading { .. } => NodeKind::Heading,
            Self::Blockquote { .. } => NodeKind::Blockquote,
            Self::CodeBlock { .. } => NodeKind::CodeBlock,
            Self::HorizontalRule => NodeKind::HorizontalRule,
            Self::BulletList { .. } => NodeKind::BulletList,
            Self::OrderedList { .. } => NodeKind::OrderedList,
            Self::ListItem { .. } => NodeKind::ListItem,
            Self::HardBreak => NodeKind::HardBreak,
            Self::Image { .. } => NodeKind::Image,
            Self::TaskList { .. } => NodeKind::TaskList,
            Self::TaskItem { .. } => NodeKind::TaskItem,
            Self::Checkbox { .. } => NodeKind::Checkbox,
            Self::Text { .. } => NodeKind::Text,
        }
    }

    /// Children of a container; `None` for leaves.
    pub fn content(&self) -> Option<&Fragment> {
        match self {
            Self::Doc { content }
            | Self::Paragraph { content }
            | Self::Heading { content, .. }
            | Self::Blockquote { content }
            | Self::CodeBlock { content }
            | Self::BulletList { content }
            | Self::OrderedList { content, .. }
            | Self::ListItem { content }
            | Self::TaskList { content }
            | Self::TaskItem { content } => Some(content),
            Self::HorizontalRule
            | Self::HardBreak
            | Self::Image { .. }
            | Self::Checkbox { .. }
            | Self::Text { .. } => None,
        }
    }

    /// Same kind and attributes with new children. Leaves are returned unchanged.
    pub fn with_content(&self, content: Fragment) -> Self {
        match self {
            Self::Heading { attrs, .. } => Self::Heading {
                attrs: *attrs,
                content,
            },
            Self::OrderedList { attrs, .. } => Self::OrderedList {
                attrs: *attrs,
                content,
            },
            other if other.kind().is_leaf() => other.clone(),
            other => Self::container(other.kind(), content),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    pub fn text_value(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn marks(&self) -> &[Mark] {
        match self {
            Self::Text { marks, .. } => marks.as_slice(),
            _ => &[],
        }
    }

    /// Flat-position size of this node.
    pub fn node_size(&self) -> usize {
        match self {
            Self::Text { text, .. } => text.chars().count(),
            leaf if leaf.kind().is_leaf() => 1,
            other => other.content_size() + 2,
        }
    }

    pub fn content_size(&self) -> usize {
        self.content().map(Fragment::size).unwrap_or(0)
    }

    pub fn child_count(&self) -> usize {
        self.content().map(Fragment::len).unwrap_or(0)
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content().and_then(|content| content.get(index))
    }

    /// Concatenated text of every descendant text node, without separators.
    pub fn text_content(&self) -> String {
        match self {
            Self::Text { text, .. } => text.clone(),
            other => other
                .content()
                .map(Fragment::text_content)
                .unwrap_or_default(),
        }
    }

    /// Reads one attribute by key.
    pub fn attr(&self, key: &str) -> Option<AttrValue> {
        match (self, key) {
            (Self::Heading { attrs, .. }, "level") => Some(AttrValue::Int(u32::from(attrs.level))),
            (Self::OrderedList { attrs, .. }, "order") => Some(AttrValue::Int(attrs.order)),
            (Self::Checkbox { attrs }, "checked") => Some(AttrValue::Bool(attrs.checked)),
            _ => None,
        }
    }

    /// Returns a copy with one attribute rewritten.
    ///
    /// # Errors
    /// - `UnknownAttribute` when the kind has no such key.
    /// - `InvalidAttribute` when the value has the wrong type or range.
    pub fn with_attr(&self, key: &str, value: AttrValue) -> Result<Self, SchemaViolation> {
        match (self, key, value) {
            (Self::Checkbox { .. }, "checked", AttrValue::Bool(checked)) => {
                Ok(Self::checkbox(checked))
            }
            (Self::Heading { content, .. }, "level", AttrValue::Int(level))
                if (1..=6).contains(&level) =>
            {
                Ok(Self::Heading {
                    attrs: HeadingAttrs { level: level as u8 },
                    content: content.clone(),
                })
            }
            (Self::OrderedList { content, .. }, "order", AttrValue::Int(order)) if order >= 1 => {
                Ok(Self::OrderedList {
                    attrs: OrderedListAttrs { order },
                    content: content.clone(),
                })
            }
            (node, key, value) if node.attr(key).is_some() => {
                Err(SchemaViolation::InvalidAttribute {
                    kind: node.kind(),
                    key: key.to_string(),
                    value: value.to_string(),
                })
            }
            (node, key, _) => Err(SchemaViolation::UnknownAttribute {
                kind: node.kind(),
                key: key.to_string(),
            }),
        }
    }

    /// Visits every descendant in document order with its absolute position.
    ///
    /// `offset` is the position where this node's content starts. Returning
    /// `false` from `visit` skips that node's children.
    pub fn descendants<F>(&self, offset: usize, visit: &mut F)
    where
        F: FnMut(&Node, usize) -> bool,
    {
        let Some(content) = self.content() else {
            return;
        };
        let mut pos = offset;
        for child in content.iter() {
            if visit(child, pos) {
                child.descendants(pos + 1, visit);
            }
            pos += child.node_size();
        }
    }

    /// Char-range slice of a text node, keeping marks.
    fn text_slice(&self, from: usize, to: usize) -> Self {
        match self {
            Self::Text { text, marks } => Self::Text {
                text: text.chars().skip(from).take(to.saturating_sub(from)).collect(),
                marks: marks.clone(),
            },
            other => other.clone(),
        }
    }
}

/// Ordered children of a node, shared by reference between versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment {
    nodes: Vec<Arc<Node>>,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes: nodes.into_iter().map(Arc::new).collect(),
        }
    }

    pub(crate) fn from_shared(nodes: Vec<Arc<Node>>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index).map(Arc::as_ref)
    }

    pub fn first(&self) -> Option<&Node> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&Node> {
        self.nodes.last().map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().map(Arc::as_ref)
    }

    pub(crate) fn shared(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    /// Sum of child sizes.
    pub fn size(&self) -> usize {
        self.iter().map(Node::node_size).sum()
    }

    pub fn text_content(&self) -> String {
        self.iter().map(Node::text_content).collect()
    }

    /// Finds the child at content offset `pos`.
    ///
    /// Returns `(index, start)`: the child index whose range contains `pos`
    /// and that child's start offset. A `pos` on a boundary resolves to the
    /// child after it, so `pos == size()` yields `(len(), size())`.
    pub fn find_index(&self, pos: usize) -> (usize, usize) {
        let mut cur = 0;
        for (index, child) in self.iter().enumerate() {
            let end = cur + child.node_size();
            if pos < end {
                return (index, cur);
            }
            cur = end;
        }
        (self.len(), cur)
    }

    /// Sub-fragment between two content offsets.
    ///
    /// Offsets may fall inside text nodes (the text is split) but must sit on
    /// boundaries of non-text children; such children are kept whole when
    /// they start inside the range.
    pub fn cut(&self, from: usize, to: usize) -> Self {
        let mut out = Vec::new();
        let mut pos = 0;
        for child in self.shared() {
            let size = child.node_size();
            let end = pos + size;
            if end > from && pos < to {
                if child.is_text() && (pos < from || end > to) {
                    let start = from.saturating_sub(pos);
                    let stop = to.min(end) - pos;
                    out.push(Arc::new(child.text_slice(start, stop)));
                } else {
                    out.push(Arc::clone(child));
                }
            }
            pos = end;
            if pos >= to {
                break;
            }
        }
        Self::from_shared(out).normalized()
    }

    /// Concatenation of two fragments, merging touching text runs.
    pub fn append(&self, other: &Fragment) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.extend(other.nodes.iter().cloned());
        Self::from_shared(nodes).normalized()
    }

    /// Returns a copy with the child at `index` swapped for `node`.
    pub(crate) fn replace_child(&self, index: usize, node: Node) -> Self {
        let mut nodes = self.nodes.clone();
        if let Some(slot) = nodes.get_mut(index) {
            *slot = Arc::new(node);
        }
        Self::from_shared(nodes)
    }

    /// Drops empty text runs and merges adjacent runs with identical marks.
    pub fn normalized(self) -> Self {
        let mut out: Vec<Arc<Node>> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes {
            if node.text_value() == Some("") {
                continue;
            }
            let merged = match (out.last().map(Arc::as_ref), node.as_ref()) {
                (
                    Some(Node::Text {
                        text: prev_text,
                        marks: prev_marks,
                    }),
                    Node::Text { text, marks },
                ) if prev_marks == marks => Some(Node::Text {
                    text: format!("{prev_text}{text}"),
                    marks: marks.clone(),
                }),
                _ => None,
            };
            if let Some(merged) = merged {
                if let Some(last) = out.last_mut() {
                    *last = Arc::new(merged);
                }
                continue;
            }
            out.push(node);
        }
        Self::from_shared(out)
    }
}

impl FromIterator<Node> for Fragment {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Self::from_nodes(iter.into_iter().collect())
    }
}
