//! Key chords and per-mode keymaps.
//!
//! # Responsibility
//! - Parse chord strings such as `"Shift-Mod-z"` into platform-normalized
//!   `KeyChord`s.
//! - Build the binding table for one schema, capability set and platform.
//!
//! # Invariants
//! - `Mod` is `Meta` on macOS and `Ctrl` elsewhere.
//! - A single uppercase letter implies `Shift` (`Mod-B` == `Shift-Mod-b`).
//! - A shifted single non-letter key falls back to its unshifted binding.

use crate::command::commands;
use crate::command::Command;
use crate::model::node::MarkKind;
use crate::model::schema::SchemaId;
use crate::session::capability::{Capabilities, EditorCapability};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

static CHORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:[A-Za-z]+-)*)(.+)$").expect("valid chord regex")
});

/// Host platform, used to resolve `Mod` and platform-only bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Mac,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" | "ios" => Self::Mac,
            _ => Self::Other,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Chord remapping applied while a keymap is built: `Some(chord)` renames a
/// default binding, `None` removes it.
pub type KeyOverrides = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordParseError {
    Empty,
    UnknownModifier(String),
}

impl Display for ChordParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "key chord must not be empty"),
            Self::UnknownModifier(name) => write!(f, "unknown key modifier: {name}"),
        }
    }
}

impl Error for ChordParseError {}

/// A key plus its modifier state, normalized for lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyChord {
    key: String,
    alt: bool,
    ctrl: bool,
    meta: bool,
    shift: bool,
}

impl KeyChord {
    /// Parses `"Shift-Mod-z"`-style chord strings.
    pub fn parse(value: &str, platform: Platform) -> Result<Self, ChordParseError> {
        let captures = CHORD_RE
            .captures(value.trim())
            .ok_or(ChordParseError::Empty)?;
        let key = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        let modifiers = captures.get(1).map(|m| m.as_str()).unwrap_or_default();

        let (mut alt, mut ctrl, mut meta, mut shift) = (false, false, false, false);
        for modifier in modifiers.split('-').filter(|part| !part.is_empty()) {
            match modifier {
                "Shift" => shift = true,
                "Alt" => alt = true,
                "Ctrl" | "Control" => ctrl = true,
                "Meta" | "Cmd" => meta = true,
                "Mod" if platform == Platform::Mac => meta = true,
                "Mod" => ctrl = true,
                other => return Err(ChordParseError::UnknownModifier(other.to_string())),
            }
        }
        Ok(Self::normalized(key, alt, ctrl, meta, shift))
    }

    fn normalized(key: &str, alt: bool, ctrl: bool, meta: bool, shift: bool) -> Self {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_alphabetic() && ch.is_uppercase() => Self {
                key: ch.to_lowercase().collect(),
                alt,
                ctrl,
                meta,
                shift: true,
            },
            _ => Self {
                key: key.to_string(),
                alt,
                ctrl,
                meta,
                shift,
            },
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn shift(&self) -> bool {
        self.shift
    }

    fn is_single_non_letter(&self) -> bool {
        let mut chars = self.key.chars();
        matches!((chars.next(), chars.next()), (Some(ch), None) if !ch.is_alphabetic() && ch != ' ')
    }

    fn without_shift(&self) -> Self {
        Self {
            shift: false,
            ..self.clone()
        }
    }
}

impl Display for KeyChord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (on, name) in [
            (self.ctrl, "Ctrl-"),
            (self.alt, "Alt-"),
            (self.shift, "Shift-"),
            (self.meta, "Meta-"),
        ] {
            if on {
                f.write_str(name)?;
            }
        }
        f.write_str(&self.key)
    }
}

/// A key press reported by the host (DOM `KeyboardEvent` naming).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Parses a chord string into the event a host would deliver for it.
    pub fn from_chord(value: &str, platform: Platform) -> Result<Self, ChordParseError> {
        let chord = KeyChord::parse(value, platform)?;
        Ok(Self {
            key: chord.key.clone(),
            ctrl: chord.ctrl,
            alt: chord.alt,
            shift: chord.shift,
            meta: chord.meta,
        })
    }

    pub fn chord(&self) -> KeyChord {
        KeyChord::normalized(&self.key, self.alt, self.ctrl, self.meta, self.shift)
    }
}

/// Chord → ordered command list.
#[derive(Debug, Clone)]
pub struct Keymap {
    platform: Platform,
    overrides: KeyOverrides,
    bindings: HashMap<KeyChord, Vec<Command>>,
}

impl Keymap {
    pub fn new(platform: Platform, overrides: KeyOverrides) -> Self {
        Self {
            platform,
            overrides,
            bindings: HashMap::new(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Appends `command` to the chord's list, after applying overrides.
    ///
    /// Returns `Ok(false)` when an override removed the binding.
    pub fn bind(&mut self, chord: &str, command: Command) -> Result<bool, ChordParseError> {
        let target = match self.overrides.get(chord) {
            Some(None) => return Ok(false),
            Some(Some(renamed)) => renamed.as_str(),
            None => chord,
        };
        let parsed = KeyChord::parse(target, self.platform)?;
        self.bindings.entry(parsed).or_default().push(command);
        Ok(true)
    }

    /// Commands bound to the event, in the order they should be tried.
    pub fn lookup(&self, event: &KeyEvent) -> &[Command] {
        let chord = event.chord();
        if let Some(commands) = self.bindings.get(&chord) {
            return commands;
        }
        if chord.shift() && chord.is_single_non_letter() {
            if let Some(commands) = self.bindings.get(&chord.without_shift()) {
                return commands;
            }
        }
        &[]
    }

    pub fn chords(&self) -> impl Iterator<Item = &KeyChord> + '_ {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn bind_logged(&mut self, chord: &str, command: Command) {
        if let Err(err) = self.bind(chord, command) {
            warn!(
                "event=keymap_bind module=keymap status=error chord={} command={} error={}",
                chord, command.name, err
            );
        }
    }
}

/// Builds the keymap for a session in `mode`.
///
/// Single-line sessions get history, submit and backspace only. Checklist
/// Enter needs the checklist capability.
pub fn build_keymap(
    mode: SchemaId,
    capabilities: Capabilities,
    platform: Platform,
    overrides: &KeyOverrides,
) -> Keymap {
    let mut keymap = Keymap::new(platform, overrides.clone());
    keymap.bind_logged("Mod-Enter", commands::SUBMIT);
    keymap.bind_logged("Mod-z", commands::UNDO);
    keymap.bind_logged("Shift-Mod-z", commands::REDO);
    if platform != Platform::Mac {
        keymap.bind_logged("Mod-y", commands::REDO);
    }
    keymap.bind_logged("Backspace", commands::DELETE_BACKWARD);
    if capabilities.is_single_line() {
        return keymap;
    }

    keymap.bind_logged("Backspace", commands::JOIN_AT_START);
    keymap.bind_logged("Alt-ArrowUp", commands::JOIN_BACKWARD);
    keymap.bind_logged("Alt-ArrowDown", commands::JOIN_FORWARD);
    match mode {
        SchemaId::Text => {
            let schema = mode.schema();
            for (chords, command, mark) in [
                (["Mod-b", "Mod-B"], commands::TOGGLE_STRONG, MarkKind::Strong),
                (["Mod-i", "Mod-I"], commands::TOGGLE_EM, MarkKind::Em),
            ] {
                if schema.has_mark(mark) {
                    for chord in chords {
                        keymap.bind_logged(chord, command);
                    }
                }
            }
            if schema.has_mark(MarkKind::Code) {
                keymap.bind_logged("Mod-`", commands::TOGGLE_CODE);
            }
            keymap.bind_logged("Ctrl->", commands::WRAP_IN_BLOCKQUOTE);
            keymap.bind_logged("Enter", commands::SPLIT_LIST_ITEM);
            keymap.bind_logged("Enter", commands::NEWLINE_IN_CODE);
            keymap.bind_logged("Enter", commands::SPLIT_BLOCK);
            keymap.bind_logged("Shift-Enter", commands::HARD_BREAK);
        }
        SchemaId::Task => {
            if capabilities.allows(EditorCapability::Checklist) {
                keymap.bind_logged("Enter", commands::INSERT_TASK_ITEM);
            }
        }
    }
    keymap
}
