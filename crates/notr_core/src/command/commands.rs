//! Built-in editing commands.
//!
//! Every command reads an `EditorState` and describes its edit as an
//! `Effect`; structural edits (joins, splits, wraps) replace whole sibling
//! nodes in their common parent so each one stays a single flat splice.

use crate::command::{Command, Effect};
use crate::model::document::ResolvedPos;
use crate::model::node::{add_mark, remove_mark, Fragment, Mark, MarkKind, Node, NodeKind};
use crate::model::selection::Selection;
use crate::session::state::EditorState;
use crate::transform::Transaction;

pub const UNDO: Command = Command::new("undo", undo);
pub const REDO: Command = Command::new("redo", redo);
pub const SUBMIT: Command = Command::new("submit", submit);
pub const JOIN_BACKWARD: Command = Command::new("join_backward", join_backward);
pub const JOIN_FORWARD: Command = Command::new("join_forward", join_forward);
pub const DELETE_BACKWARD: Command = Command::new("delete_backward", delete_backward);
pub const JOIN_AT_START: Command = Command::new("join_at_start", join_at_start);
pub const TOGGLE_STRONG: Command = Command::new("toggle_strong", toggle_strong);
pub const TOGGLE_EM: Command = Command::new("toggle_em", toggle_em);
pub const TOGGLE_CODE: Command = Command::new("toggle_code", toggle_code);
pub const WRAP_IN_BLOCKQUOTE: Command = Command::new("wrap_in_blockquote", wrap_in_blockquote);
pub const SPLIT_LIST_ITEM: Command = Command::new("split_list_item", split_list_item);
pub const NEWLINE_IN_CODE: Command = Command::new("newline_in_code", newline_in_code);
pub const SPLIT_BLOCK: Command = Command::new("split_block", split_block);
pub const HARD_BREAK: Command = Command::new("hard_break", hard_break);
pub const INSERT_TASK_ITEM: Command = Command::new("insert_task_item", insert_task_item);

pub fn undo(_state: &EditorState) -> Option<Effect> {
    Some(Effect::Undo)
}

pub fn redo(_state: &EditorState) -> Option<Effect> {
    Some(Effect::Redo)
}

pub fn submit(_state: &EditorState) -> Option<Effect> {
    Some(Effect::Submit)
}

/// Replaces the selection with `text`, inheriting the marks before the cursor.
///
/// `None` when the text is empty or the selection does not sit inside one
/// textblock.
pub fn insert_text(state: &EditorState, text: &str) -> Option<Transaction> {
    if text.is_empty() {
        return None;
    }
    let (from, to) = textblock_range(state)?;
    let offset = from.parent_offset();
    let marks = if offset > 0 {
        from.parent()
            .content()
            .and_then(|content| content.cut(offset - 1, offset).first().map(|node| node.marks().to_vec()))
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    let node = Node::Text {
        text: text.to_string(),
        marks,
    };
    let cursor = from.pos() + text.chars().count();
    Some(
        Transaction::new()
            .replace_range(from.pos(), to.pos(), Fragment::from_nodes(vec![node]))
            .with_selection(Selection::cursor(cursor)),
    )
}

/// Deletes the selection, or the char/inline node before the cursor.
pub fn delete_backward(state: &EditorState) -> Option<Effect> {
    let selection = state.selection();
    if !selection.is_empty() {
        return Some(Effect::Edit(
            Transaction::new()
                .replace_range(selection.from(), selection.to(), Fragment::empty())
                .with_selection(Selection::cursor(selection.from())),
        ));
    }
    let head = selection.head();
    let resolved = state.doc().resolve(head)?;
    if !resolved.parent().kind().is_textblock() || resolved.parent_offset() == 0 {
        return None;
    }
    Some(Effect::Edit(
        Transaction::new()
            .replace_range(head - 1, head, Fragment::empty())
            .with_selection(Selection::cursor(head - 1)),
    ))
}

/// Backspace at the very start of a textblock joins with the previous block.
pub fn join_at_start(state: &EditorState) -> Option<Effect> {
    let selection = state.selection();
    if !selection.is_empty() || matches!(selection, Selection::Node { .. }) {
        return None;
    }
    let resolved = state.doc().resolve(selection.head())?;
    if !resolved.parent().kind().is_textblock() || resolved.parent_offset() != 0 {
        return None;
    }
    join_backward(state)
}

/// Joins the selected block (or the nearest ancestor that has one) with its
/// previous sibling.
pub fn join_backward(state: &EditorState) -> Option<Effect> {
    let selection = state.selection();
    let resolved = state.doc().resolve(selection.from())?;
    for (depth, index) in join_candidates(&resolved, selection) {
        if index == 0 {
            continue;
        }
        let parent = resolved.node(depth);
        let (Some(prev), Some(cur)) = (parent.child(index - 1), parent.child(index)) else {
            continue;
        };
        let Some(join) = merge_siblings(prev, cur) else {
            continue;
        };
        let start = child_pos(&resolved, depth, index - 1);
        let end = start + prev.node_size() + cur.node_size();
        let cursor = match selection {
            Selection::Text { .. } => selection.head().saturating_sub(join.shift),
            Selection::Node { .. } => start + join.join_offset,
        };
        return Some(Effect::Edit(
            Transaction::new()
                .replace_range(start, end, Fragment::from_nodes(vec![join.node]))
                .with_selection(Selection::cursor(cursor)),
        ));
    }
    None
}

/// Joins the selected block (or the nearest ancestor that has one) with its
/// next sibling.
pub fn join_forward(state: &EditorState) -> Option<Effect> {
    let selection = state.selection();
    let resolved = state.doc().resolve(selection.from())?;
    for (depth, index) in join_candidates(&resolved, selection) {
        let parent = resolved.node(depth);
        let (Some(cur), Some(next)) = (parent.child(index), parent.child(index + 1)) else {
            continue;
        };
        let Some(join) = merge_siblings(cur, next) else {
            continue;
        };
        let start = child_pos(&resolved, depth, index);
        let end = start + cur.node_size() + next.node_size();
        let selection = match selection {
            Selection::Text { .. } => selection,
            Selection::Node { .. } => Selection::cursor(start + join.join_offset),
        };
        return Some(Effect::Edit(
            Transaction::new()
                .replace_range(start, end, Fragment::from_nodes(vec![join.node]))
                .with_selection(selection),
        ));
    }
    None
}

pub fn toggle_strong(state: &EditorState) -> Option<Effect> {
    toggle_mark(state, MarkKind::Strong)
}

pub fn toggle_em(state: &EditorState) -> Option<Effect> {
    toggle_mark(state, MarkKind::Em)
}

pub fn toggle_code(state: &EditorState) -> Option<Effect> {
    toggle_mark(state, MarkKind::Code)
}

/// Adds `kind` to the selected text, or removes it when all of it has it.
pub fn toggle_mark(state: &EditorState, kind: MarkKind) -> Option<Effect> {
    let schema = state.doc().schema();
    if !schema.has_mark(kind) {
        return None;
    }
    let mark = Mark::simple(kind)?;
    let (from, to) = textblock_range(state)?;
    if from.pos() == to.pos() || !schema.allows_marks_in(from.parent().kind()) {
        return None;
    }
    let slice = from
        .parent()
        .content()?
        .cut(from.parent_offset(), to.parent_offset());
    let mut texts = slice.iter().filter(|node| node.is_text()).peekable();
    texts.peek()?;
    let active = texts.all(|node| node.marks().iter().any(|mark| mark.kind() == kind));

    let nodes: Vec<Node> = slice
        .iter()
        .map(|node| match node {
            Node::Text { text, marks } => Node::Text {
                text: text.clone(),
                marks: if active {
                    remove_mark(marks, kind)
                } else {
                    add_mark(marks, mark.clone())
                },
            },
            other => other.clone(),
        })
        .collect();
    Some(Effect::Edit(
        Transaction::new()
            .replace_range(from.pos(), to.pos(), Fragment::from_nodes(nodes).normalized())
            .with_selection(state.selection()),
    ))
}

/// Wraps the textblocks touched by the selection in a blockquote.
pub fn wrap_in_blockquote(state: &EditorState) -> Option<Effect> {
    let doc = state.doc();
    if !doc.schema().has_node(NodeKind::Blockquote) {
        return None;
    }
    let selection = state.selection();
    let from = doc.resolve(selection.from())?;
    let to = doc.resolve(selection.to())?;
    let depth = from.depth();
    if depth == 0
        || to.depth() != depth
        || !from.parent().kind().is_textblock()
        || !to.parent().kind().is_textblock()
        || from.start(depth - 1) != to.start(depth - 1)
    {
        return None;
    }
    let container = from.node(depth - 1);
    let blocks: Vec<Node> = (from.index(depth - 1)..=to.index(depth - 1))
        .filter_map(|index| container.child(index).cloned())
        .collect();
    let start = from.before(depth)?;
    let end = to.after(depth)?;
    let shifted = match selection {
        Selection::Text { anchor, head } => Selection::range(anchor + 1, head + 1),
        Selection::Node { .. } => Selection::cursor(start + 2),
    };
    Some(Effect::Edit(
        Transaction::new()
            .replace_range(
                start,
                end,
                Fragment::from_nodes(vec![Node::Blockquote {
                    content: Fragment::from_nodes(blocks),
                }]),
            )
            .with_selection(shifted),
    ))
}

/// Splits the list item around the cursor; the tail moves to a new item.
///
/// An item holding only an empty paragraph is lifted out of its list instead.
pub fn split_list_item(state: &EditorState) -> Option<Effect> {
    let (from, to) = textblock_range(state)?;
    let depth = from.depth();
    if depth < 2 || from.parent().kind() != NodeKind::Paragraph {
        return None;
    }
    let item = from.node(depth - 1);
    if item.kind() != NodeKind::ListItem {
        return None;
    }
    let item_content = item.content()?;
    let (before, after) = split_textblock(&from, &to)?;
    if before.is_empty() && after.is_empty() && item_content.len() == 1 {
        return lift_list_item(&from, depth - 1);
    }
    let paragraph = from.parent();
    let index = from.index(depth - 1);

    let mut head: Vec<Node> = item_content.iter().take(index).cloned().collect();
    head.push(paragraph.with_content(before));
    let mut tail = vec![paragraph.with_content(after)];
    tail.extend(item_content.iter().skip(index + 1).cloned());

    let first = item.with_content(Fragment::from_nodes(head));
    let second = item.with_content(Fragment::from_nodes(tail));
    let start = from.before(depth - 1)?;
    let end = from.after(depth - 1)?;
    let cursor = start + first.node_size() + 2;
    Some(Effect::Edit(
        Transaction::new()
            .replace_range(start, end, Fragment::from_nodes(vec![first, second]))
            .with_selection(Selection::cursor(cursor)),
    ))
}

/// Replaces the list around the item at `item_depth` with the items before
/// it, the item's own blocks, and the items after it.
fn lift_list_item(resolved: &ResolvedPos, item_depth: usize) -> Option<Effect> {
    let list_depth = item_depth.checked_sub(1).filter(|depth| *depth > 0)?;
    let list = resolved.node(list_depth);
    let items = list.content()?;
    let index = resolved.index(list_depth);
    let item = resolved.node(item_depth);

    let head: Vec<Node> = items.iter().take(index).cloned().collect();
    let tail: Vec<Node> = items.iter().skip(index + 1).cloned().collect();
    let mut blocks = Vec::new();
    if !head.is_empty() {
        blocks.push(list.with_content(Fragment::from_nodes(head)));
    }
    let lifted = blocks.iter().map(Node::node_size).sum::<usize>();
    blocks.extend(item.content()?.iter().cloned());
    if !tail.is_empty() {
        blocks.push(list.with_content(Fragment::from_nodes(tail)));
    }

    let start = resolved.before(list_depth)?;
    let end = resolved.after(list_depth)?;
    Some(Effect::Edit(
        Transaction::new()
            .replace_range(start, end, Fragment::from_nodes(blocks))
            .with_selection(Selection::cursor(start + lifted + 1)),
    ))
}

/// Inserts a newline character inside a code block.
pub fn newline_in_code(state: &EditorState) -> Option<Effect> {
    let (from, to) = textblock_range(state)?;
    if from.parent().kind() != NodeKind::CodeBlock {
        return None;
    }
    Some(Effect::Edit(
        Transaction::new()
            .replace_range(from.pos(), to.pos(), Fragment::from_nodes(vec![Node::text("\n")]))
            .with_selection(Selection::cursor(from.pos() + 1)),
    ))
}

/// Splits the textblock at the cursor. Splitting a heading at its end starts
/// a paragraph.
pub fn split_block(state: &EditorState) -> Option<Effect> {
    let (from, to) = textblock_range(state)?;
    let depth = from.depth();
    if depth == 0 {
        return None;
    }
    let parent = from.parent();
    let (before, after) = split_textblock(&from, &to)?;
    let at_end = to.parent_offset() == parent.content_size();
    let first = parent.with_content(before);
    let second = if at_end && parent.kind() != NodeKind::Paragraph {
        Node::Paragraph { content: after }
    } else {
        parent.with_content(after)
    };
    let start = from.before(depth)?;
    let end = to.after(depth)?;
    let cursor = start + first.node_size() + 1;
    Some(Effect::Edit(
        Transaction::new()
            .replace_range(start, end, Fragment::from_nodes(vec![first, second]))
            .with_selection(Selection::cursor(cursor)),
    ))
}

/// Inserts a hard break (a newline inside code blocks).
pub fn hard_break(state: &EditorState) -> Option<Effect> {
    let (from, to) = textblock_range(state)?;
    if from.parent().kind() == NodeKind::CodeBlock {
        return newline_in_code(state);
    }
    Some(Effect::Edit(
        Transaction::new()
            .replace_range(from.pos(), to.pos(), Fragment::from_nodes(vec![Node::HardBreak]))
            .with_selection(Selection::cursor(from.pos() + 1)),
    ))
}

/// Starts a new unchecked task item after the current one, carrying the
/// text after the cursor.
pub fn insert_task_item(state: &EditorState) -> Option<Effect> {
    let (from, to) = textblock_range(state)?;
    let depth = from.depth();
    if depth < 2 {
        return None;
    }
    let item = from.node(depth - 1);
    if item.kind() != NodeKind::TaskItem {
        return None;
    }
    let checkbox = item.child(0)?.clone();
    let (before, after) = split_textblock(&from, &to)?;
    let paragraph = from.parent();
    let first = item.with_content(Fragment::from_nodes(vec![checkbox, paragraph.with_content(before)]));
    let second = item.with_content(Fragment::from_nodes(vec![
        Node::checkbox(false),
        paragraph.with_content(after),
    ]));
    let start = from.before(depth - 1)?;
    let end = from.after(depth - 1)?;
    let cursor = start + first.node_size() + 3;
    Some(Effect::Edit(
        Transaction::new()
            .replace_range(start, end, Fragment::from_nodes(vec![first, second]))
            .with_selection(Selection::cursor(cursor)),
    ))
}

/// Both selection ends resolved inside the same textblock.
fn textblock_range(state: &EditorState) -> Option<(ResolvedPos, ResolvedPos)> {
    let selection = state.selection();
    if matches!(selection, Selection::Node { .. }) {
        return None;
    }
    let doc = state.doc();
    let from = doc.resolve(selection.from())?;
    let to = doc.resolve(selection.to())?;
    (from.same_parent(&to) && from.parent().kind().is_textblock()).then_some((from, to))
}

/// Inline content before `from` and after `to` within their textblock.
fn split_textblock(from: &ResolvedPos, to: &ResolvedPos) -> Option<(Fragment, Fragment)> {
    let content = from.parent().content()?;
    Some((
        content.cut(0, from.parent_offset()),
        content.cut(to.parent_offset(), content.size()),
    ))
}

/// `(parent depth, child index)` pairs to try joining, innermost first.
fn join_candidates(resolved: &ResolvedPos, selection: Selection) -> Vec<(usize, usize)> {
    match selection {
        Selection::Node { .. } => vec![(resolved.depth(), resolved.index(resolved.depth()))],
        Selection::Text { .. } => (1..=resolved.depth())
            .rev()
            .map(|depth| (depth - 1, resolved.index(depth - 1)))
            .collect(),
    }
}

/// Position directly before child `index` of `resolved.node(depth)`.
fn child_pos(resolved: &ResolvedPos, depth: usize, index: usize) -> usize {
    let preceding: usize = resolved
        .node(depth)
        .content()
        .map(|content| content.iter().take(index).map(Node::node_size).sum())
        .unwrap_or(0);
    resolved.start(depth) + preceding
}

struct Join {
    node: Node,
    /// Offset from the first node's start to the join point.
    join_offset: usize,
    /// How far positions inside the second node move back.
    shift: usize,
}

fn merge_siblings(first: &Node, second: &Node) -> Option<Join> {
    match (first, second) {
        (Node::TaskItem { .. }, Node::TaskItem { .. }) => {
            let checkbox = first.child(0)?.clone();
            let head = first.child(1)?;
            let tail = second.child(1)?;
            let paragraph = head.with_content(head.content()?.append(tail.content()?));
            Some(Join {
                join_offset: 3 + head.content_size(),
                shift: 5,
                node: first.with_content(Fragment::from_nodes(vec![checkbox, paragraph])),
            })
        }
        _ if first.kind().is_leaf() || second.kind().is_leaf() => None,
        _ if first.kind() == second.kind()
            || (first.kind().is_textblock() && second.kind().is_textblock()) =>
        {
            Some(Join {
                join_offset: 1 + first.content_size(),
                shift: 2,
                node: first.with_content(first.content()?.append(second.content()?)),
            })
        }
        _ => None,
    }
}
