//! Lossy conversion between the freeform and task schemas.
//!
//! # Responsibility
//! - Map each top-level freeform block to one unchecked task item.
//! - Map each task item back to one plain paragraph.
//!
//! # Invariants
//! - Conversion is total: every valid document converts to a valid one.
//! - Formatting, nesting and checked state are dropped. A block without text
//!   becomes a task item holding a single space.

use crate::model::document::Document;
use crate::model::node::{Fragment, Node, NodeKind};
use crate::model::schema::SchemaId;

/// Text a task item gets when its source block has none.
pub const EMPTY_ITEM_TEXT: &str = " ";

/// Converts to the other schema.
pub fn toggle_schema(doc: &Document) -> Document {
    match doc.schema_id() {
        SchemaId::Text => to_task(doc),
        SchemaId::Task => to_freeform(doc),
    }
}

/// Freeform → Task: one unchecked item per top-level block.
pub fn to_task(doc: &Document) -> Document {
    if doc.schema_id() == SchemaId::Task {
        return doc.clone();
    }
    let items: Fragment = doc
        .blocks()
        .iter()
        .map(|block| {
            let text = block_plain_text(block);
            let text = if text.is_empty() {
                EMPTY_ITEM_TEXT.to_string()
            } else {
                text
            };
            Node::TaskItem {
                content: Fragment::from_nodes(vec![
                    Node::checkbox(false),
                    Node::plain_paragraph(&text),
                ]),
            }
        })
        .collect();
    let items = if items.is_empty() {
        Fragment::from_nodes(vec![crate::model::schema::empty_task_item()])
    } else {
        items
    };
    Document::from_trusted(
        SchemaId::Task,
        Node::Doc {
            content: Fragment::from_nodes(vec![Node::TaskList { content: items }]),
        },
    )
}

/// Task → Freeform: one plain paragraph per item, text kept verbatim.
pub fn to_freeform(doc: &Document) -> Document {
    if doc.schema_id() == SchemaId::Text {
        return doc.clone();
    }
    let mut paragraphs = Vec::new();
    doc.root().descendants(0, &mut |node: &Node, _pos: usize| {
        if node.kind() == NodeKind::TaskItem {
            paragraphs.push(Node::plain_paragraph(&node.text_content()));
            return false;
        }
        true
    });
    if paragraphs.is_empty() {
        paragraphs.push(Node::plain_paragraph(""));
    }
    Document::from_trusted(
        SchemaId::Text,
        Node::Doc {
            content: Fragment::from_nodes(paragraphs),
        },
    )
}

/// Plain text of one block: textblocks joined by a single space, hard
/// breaks read as a space, images dropped.
pub fn block_plain_text(block: &Node) -> String {
    let mut runs: Vec<String> = Vec::new();
    collect_textblocks(block, &mut runs);
    runs.join(" ")
}

fn collect_textblocks(node: &Node, runs: &mut Vec<String>) {
    if node.kind().is_textblock() {
        let text = node
            .content()
            .map(|content| {
                content
                    .iter()
                    .map(|inline| match inline {
                        Node::HardBreak => " ".to_string(),
                        Node::Image { .. } => String::new(),
                        other => other.text_content(),
                    })
                    .collect::<String>()
            })
            .unwrap_or_default();
        runs.push(text);
        return;
    }
    if let Some(content) = node.content() {
        for child in content.iter() {
            collect_textblocks(child, runs);
        }
    }
}
