//! Editing commands and key bindings.
//!
//! # Responsibility
//! - Define commands as named pure functions of the editor state.
//! - Bind key chords to ordered command lists per schema and capability set.
//!
//! # Invariants
//! - Commands never mutate; they describe an `Effect` for the session.
//! - A command returning `None` is "not applicable" and the next bound
//!   command is tried.
//!
//! # See also
//! - `session::dispatch` for how effects are executed.

pub mod commands;
pub mod keymap;

use crate::model::selection::Selection;
use crate::session::state::EditorState;
use crate::transform::Transaction;
use std::fmt::{Debug, Formatter};

/// What a command asks the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Edit(Transaction),
    Undo,
    Redo,
    Submit,
    Select(Selection),
}

pub type CommandFn = fn(&EditorState) -> Option<Effect>;

/// A named command.
#[derive(Clone, Copy)]
pub struct Command {
    pub name: &'static str,
    pub run: CommandFn,
}

impl Command {
    pub const fn new(name: &'static str, run: CommandFn) -> Self {
        Self { name, run }
    }

    pub fn run(&self, state: &EditorState) -> Option<Effect> {
        (self.run)(state)
    }
}

impl Debug for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Command").field(&self.name).finish()
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Command {}

pub use keymap::{build_keymap, KeyChord, KeyEvent, KeyOverrides, Keymap, Platform};
