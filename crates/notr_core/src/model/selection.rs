//! Editor selection values.

use crate::model::document::Document;
use crate::model::node::Node;
use crate::transform::mapping::{Assoc, Mapping};
use serde::{Deserialize, Serialize};

/// Either a text range (a cursor when `anchor == head`) or one whole node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    Text { anchor: usize, head: usize },
    Node { from: usize, to: usize },
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Self::Text {
            anchor: pos,
            head: pos,
        }
    }

    pub fn range(anchor: usize, head: usize) -> Self {
        Self::Text { anchor, head }
    }

    /// Selects the node starting at `pos`; `None` when no node starts there.
    pub fn node(doc: &Document, pos: usize) -> Option<Self> {
        let node = doc.node_at(pos)?;
        Some(Self::Node {
            from: pos,
            to: pos + node.node_size(),
        })
    }

    /// Cursor at the start of the first textblock.
    pub fn at_start(doc: &Document) -> Self {
        let mut first = None;
        doc.root().descendants(0, &mut |node: &Node, pos: usize| {
            if first.is_some() {
                return false;
            }
            if node.kind().is_textblock() {
                first = Some(pos + 1);
                return false;
            }
            true
        });
        Self::cursor(first.unwrap_or(0))
    }

    pub fn from(&self) -> usize {
        match self {
            Self::Text { anchor, head } => (*anchor).min(*head),
            Self::Node { from, .. } => *from,
        }
    }

    pub fn to(&self) -> usize {
        match self {
            Self::Text { anchor, head } => (*anchor).max(*head),
            Self::Node { to, .. } => *to,
        }
    }

    pub fn head(&self) -> usize {
        match self {
            Self::Text { head, .. } => *head,
            Self::Node { to, .. } => *to,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.from() == self.to()
    }

    /// Carries the selection across an applied transaction.
    ///
    /// A node selection whose node was replaced collapses to a cursor.
    pub fn map(&self, mapping: &Mapping) -> Self {
        match *self {
            Self::Text { anchor, head } => Self::Text {
                anchor: mapping.map(anchor, Assoc::Right),
                head: mapping.map(head, Assoc::Right),
            },
            Self::Node { from, to } => {
                let new_from = mapping.map(from, Assoc::Right);
                let new_to = mapping.map(to, Assoc::Left);
                if new_to > new_from && new_to - new_from == to - from {
                    Self::Node {
                        from: new_from,
                        to: new_to,
                    }
                } else {
                    Self::cursor(new_from)
                }
            }
        }
    }

    /// Clamps positions into `doc`'s range.
    pub fn clamp(&self, doc: &Document) -> Self {
        let size = doc.content_size();
        match *self {
            Self::Text { anchor, head } => Self::Text {
                anchor: anchor.min(size),
                head: head.min(size),
            },
            Self::Node { from, to } if to <= size => Self::Node { from, to },
            Self::Node { from, .. } => Self::cursor(from.min(size)),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::cursor(0)
    }
}
