//! Interactive widgets derived from the current document.
//!
//! # Responsibility
//! - Compute checkbox toggles and drag handles for a document version.
//! - Turn pointer input on a widget into a command effect.
//!
//! # Invariants
//! - A decoration set is a pure function of `(document, version)`; it is
//!   recomputed in full whenever the version changes.
//! - Pointer handlers never edit directly; they return an `Effect` that the
//!   session applies through the document model.
//!
//! # See also
//! - `session::dispatch` for the table that routes pointer input here.

use crate::command::Effect;
use crate::model::document::Document;
use crate::model::node::{AttrValue, Node, NodeKind};
use crate::model::schema::SchemaId;
use crate::model::selection::Selection;
use crate::session::state::{DocVersion, EditorState};
use crate::transform::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WidgetKind {
    CheckboxToggle,
    DragHandle,
}

impl WidgetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckboxToggle => "checkbox_toggle",
            Self::DragHandle => "drag_handle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    /// Toggle drawn at a checkbox node, carrying its state when computed.
    CheckboxToggle { checked: bool },
    /// Grip drawn before a reorderable block.
    DragHandle { block_pos: usize },
}

impl Widget {
    pub fn kind(&self) -> WidgetKind {
        match self {
            Self::CheckboxToggle { .. } => WidgetKind::CheckboxToggle,
            Self::DragHandle { .. } => WidgetKind::DragHandle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoration {
    pub pos: usize,
    pub widget: Widget,
}

/// Decorations of one document version, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationSet {
    version: DocVersion,
    items: Vec<Decoration>,
}

impl DecorationSet {
    pub fn empty(version: DocVersion) -> Self {
        Self {
            version,
            items: Vec::new(),
        }
    }

    pub fn version(&self) -> DocVersion {
        self.version
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decoration> + '_ {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The decoration of `kind` at `pos`, if any.
    pub fn find(&self, pos: usize, kind: WidgetKind) -> Option<&Decoration> {
        self.items
            .iter()
            .find(|decoration| decoration.pos == pos && decoration.widget.kind() == kind)
    }
}

/// Computes the widget set for `doc`.
///
/// Task documents get one drag handle per task item and one checkbox toggle
/// per checkbox; freeform documents get none.
pub fn compute_decorations(doc: &Document, version: DocVersion) -> DecorationSet {
    let mut items = Vec::new();
    if doc.schema_id() == SchemaId::Task {
        doc.root().descendants(0, &mut |node: &Node, pos: usize| {
            match node {
                Node::TaskItem { .. } => items.push(Decoration {
                    pos,
                    widget: Widget::DragHandle { block_pos: pos },
                }),
                Node::Checkbox { attrs } => items.push(Decoration {
                    pos,
                    widget: Widget::CheckboxToggle {
                        checked: attrs.checked,
                    },
                }),
                _ => {}
            }
            !node.kind().is_textblock()
        });
    }
    DecorationSet { version, items }
}

/// Pointer gestures a host can report on a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PointerKind {
    Click,
    DoubleClick,
    TripleClick,
    /// Mouse-down with the primary button.
    PrimaryPress,
    TouchStart,
}

impl PointerKind {
    /// Maps a DOM-style mouse-down button index; only the primary button counts.
    pub fn from_mouse_down(button: u8) -> Option<Self> {
        (button == 0).then_some(Self::PrimaryPress)
    }
}

/// Pointer input addressed to a widget of a rendered decoration set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerInput {
    pub pos: usize,
    pub widget: WidgetKind,
    pub kind: PointerKind,
    /// Version of the decoration set the host drew.
    pub version: DocVersion,
}

/// Flips the checkbox under the decoration.
pub fn toggle_checkbox(decoration: &Decoration, state: &EditorState) -> Option<Effect> {
    let node = state.doc().node_at(decoration.pos)?;
    if node.kind() != NodeKind::Checkbox {
        return None;
    }
    let Some(AttrValue::Bool(checked)) = node.attr("checked") else {
        return None;
    };
    Some(Effect::Edit(Transaction::new().set_attribute(
        decoration.pos,
        "checked",
        AttrValue::Bool(!checked),
    )))
}

/// Selects the block the drag handle belongs to.
pub fn select_block(decoration: &Decoration, state: &EditorState) -> Option<Effect> {
    let Widget::DragHandle { block_pos } = decoration.widget else {
        return None;
    };
    Selection::node(state.doc(), block_pos).map(Effect::Select)
}
