//! Capability-scoped handler table.
//!
//! # Responsibility
//! - Hold the keymap and the pointer handlers active for one mode.
//! - Register checklist widgets only when the session has that capability.
//!
//! # Invariants
//! - The table is rebuilt whenever the session's mode changes; it never
//!   holds handlers for the other mode.

use crate::command::{build_keymap, Command, Effect, KeyEvent, KeyOverrides, Keymap, Platform};
use crate::decoration::{self, Decoration, PointerKind, WidgetKind};
use crate::model::schema::SchemaId;
use crate::session::capability::Capabilities;
use crate::session::state::EditorState;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

/// Pointer handler for one widget kind and gesture.
pub type PointerHandler = fn(&Decoration, &EditorState) -> Option<Effect>;

#[derive(Clone)]
pub struct HandlerTable {
    mode: SchemaId,
    keymap: Keymap,
    pointer: BTreeMap<(WidgetKind, PointerKind), PointerHandler>,
}

impl HandlerTable {
    pub fn for_mode(
        mode: SchemaId,
        capabilities: Capabilities,
        platform: Platform,
        overrides: &KeyOverrides,
    ) -> Self {
        let mut pointer: BTreeMap<(WidgetKind, PointerKind), PointerHandler> = BTreeMap::new();
        if mode == SchemaId::Task && capabilities.supports_checklist {
            for kind in [PointerKind::Click, PointerKind::DoubleClick, PointerKind::TripleClick] {
                pointer.insert((WidgetKind::CheckboxToggle, kind), decoration::toggle_checkbox);
            }
            for kind in [PointerKind::PrimaryPress, PointerKind::TouchStart] {
                pointer.insert((WidgetKind::DragHandle, kind), decoration::select_block);
            }
        }
        Self {
            mode,
            keymap: build_keymap(mode, capabilities, platform, overrides),
            pointer,
        }
    }

    pub fn mode(&self) -> SchemaId {
        self.mode
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Commands for a key event, in trial order.
    pub fn key_commands(&self, event: &KeyEvent) -> Vec<Command> {
        self.keymap.lookup(event).to_vec()
    }

    pub fn pointer_handler(&self, widget: WidgetKind, kind: PointerKind) -> Option<PointerHandler> {
        self.pointer.get(&(widget, kind)).copied()
    }

    /// True when any widget handler is registered.
    pub fn has_widgets(&self) -> bool {
        !self.pointer.is_empty()
    }
}

impl Debug for HandlerTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTable")
            .field("mode", &self.mode)
            .field("keymap", &self.keymap)
            .field("pointer", &self.pointer.keys().collect::<Vec<_>>())
            .finish()
    }
}
