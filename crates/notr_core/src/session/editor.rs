//! Editor session: the host-facing API of the engine.
//!
//! # Responsibility
//! - Own the current `EditorState`, its history and its decorations.
//! - Route key and pointer input through the handler table.
//! - Offer the host operations: query, replace, reset, toggle mode, submit.
//!
//! # Invariants
//! - Every accepted document change or replacement bumps the version and
//!   recomputes decorations before control returns to the host.
//! - Pointer input drawn from an older decoration set is rejected, never
//!   applied.
//! - A session without the mode-toggle capability stays freeform.
//!
//! # See also
//! - `session::dispatch` for the capability-scoped handler table.

use crate::codec::{self, DocError, SerializedDoc};
use crate::command::commands;
use crate::command::{Effect, KeyEvent, KeyOverrides, Platform};
use crate::convert;
use crate::decoration::{compute_decorations, DecorationSet, PointerInput, WidgetKind};
use crate::model::document::Document;
use crate::model::schema::SchemaId;
use crate::model::selection::Selection;
use crate::session::capability::{Capabilities, EditorCapability};
use crate::session::dispatch::HandlerTable;
use crate::session::history::{History, HistoryEntry, DEFAULT_HISTORY_DEPTH};
use crate::session::state::{DocVersion, EditorState};
use crate::transform::{InvalidEdit, Transaction};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::time::Instant;
use uuid::Uuid;

pub type FocusHook = Box<dyn FnMut() + Send>;
pub type SubmitHook = Box<dyn FnMut(&SerializedDoc) + Send>;

/// Construction options of a session.
pub struct EditorOptions {
    pub capabilities: Capabilities,
    pub platform: Platform,
    pub history_depth: usize,
    pub key_overrides: KeyOverrides,
    /// Mode of the first document; ignored without the mode-toggle capability.
    pub initial_mode: SchemaId,
    pub on_focus: Option<FocusHook>,
    pub on_submit: Option<SubmitHook>,
}

impl EditorOptions {
    pub fn title() -> Self {
        Self::default()
    }

    pub fn content() -> Self {
        Self {
            capabilities: Capabilities::CONTENT,
            ..Self::default()
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    pub fn with_initial_mode(mut self, mode: SchemaId) -> Self {
        self.initial_mode = mode;
        self
    }

    /// Renames (`Some`) or removes (`None`) a default chord.
    pub fn with_key_override(mut self, chord: impl Into<String>, target: Option<String>) -> Self {
        self.key_overrides.insert(chord.into(), target);
        self
    }

    pub fn on_focus(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_focus = Some(Box::new(hook));
        self
    }

    pub fn on_submit(mut self, hook: impl FnMut(&SerializedDoc) + Send + 'static) -> Self {
        self.on_submit = Some(Box::new(hook));
        self
    }
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::TITLE,
            platform: Platform::current(),
            history_depth: DEFAULT_HISTORY_DEPTH,
            key_overrides: KeyOverrides::new(),
            initial_mode: SchemaId::Text,
            on_focus: None,
            on_submit: None,
        }
    }
}

impl Debug for EditorOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorOptions")
            .field("capabilities", &self.capabilities)
            .field("platform", &self.platform)
            .field("history_depth", &self.history_depth)
            .field("key_overrides", &self.key_overrides)
            .field("initial_mode", &self.initial_mode)
            .field("on_focus", &self.on_focus.is_some())
            .field("on_submit", &self.on_submit.is_some())
            .finish()
    }
}

/// Stable id of one session, used in logs and as the FFI handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// What an input event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Handled,
    /// The submit chord fired; the host should submit its form.
    Submit,
    Ignored,
}

impl InputOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::Submit => "submit",
            Self::Ignored => "ignored",
        }
    }
}

/// Session-level errors.
#[derive(Debug)]
pub enum EditorError {
    Edit(InvalidEdit),
    Doc(DocError),
    CapabilityDisabled(EditorCapability),
    StaleDecorations {
        rendered: DocVersion,
        current: DocVersion,
    },
    NoDecoration {
        pos: usize,
        widget: WidgetKind,
    },
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Edit(err) => write!(f, "{err}"),
            Self::Doc(err) => write!(f, "{err}"),
            Self::CapabilityDisabled(capability) => {
                write!(f, "capability `{capability}` is not enabled for this editor")
            }
            Self::StaleDecorations { rendered, current } => write!(
                f,
                "pointer input targets decorations of {rendered}, document is at {current}"
            ),
            Self::NoDecoration { pos, widget } => {
                write!(f, "no {} widget at position {pos}", widget.as_str())
            }
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Edit(err) => Some(err),
            Self::Doc(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InvalidEdit> for EditorError {
    fn from(value: InvalidEdit) -> Self {
        Self::Edit(value)
    }
}

impl From<DocError> for EditorError {
    fn from(value: DocError) -> Self {
        Self::Doc(value)
    }
}

/// One editing surface (a note title or a note body).
pub struct Editor {
    id: SessionId,
    placeholder: String,
    capabilities: Capabilities,
    platform: Platform,
    key_overrides: KeyOverrides,
    state: EditorState,
    history: History,
    handlers: HandlerTable,
    decorations: DecorationSet,
    focused: bool,
    on_focus: Option<FocusHook>,
    on_submit: Option<SubmitHook>,
}

impl Editor {
    pub fn new(placeholder: impl Into<String>, options: EditorOptions) -> Self {
        let capabilities = options.capabilities;
        let mode = if capabilities.supports_mode_toggle {
            options.initial_mode
        } else {
            SchemaId::Text
        };
        let state = EditorState::new(mode);
        let handlers =
            HandlerTable::for_mode(mode, capabilities, options.platform, &options.key_overrides);
        let mut editor = Self {
            id: SessionId::new_v4(),
            placeholder: placeholder.into(),
            capabilities,
            platform: options.platform,
            key_overrides: options.key_overrides,
            decorations: DecorationSet::empty(state.version()),
            state,
            history: History::new(options.history_depth),
            handlers,
            focused: false,
            on_focus: options.on_focus,
            on_submit: options.on_submit,
        };
        editor.publish_decorations();
        info!(
            "event=session_open module=session status=ok session_id={} mode={} mode_toggle={} checklist={}",
            editor.id,
            mode.mode_name(),
            capabilities.supports_mode_toggle,
            capabilities.supports_checklist
        );
        editor
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        self.state.doc()
    }

    pub fn selection(&self) -> Selection {
        self.state.selection()
    }

    pub fn version(&self) -> DocVersion {
        self.state.version()
    }

    pub fn mode(&self) -> SchemaId {
        self.state.mode()
    }

    /// `"text"` or `"checklist"`.
    pub fn current_mode(&self) -> &'static str {
        self.mode().mode_name()
    }

    /// True when the document holds nothing but whitespace.
    pub fn is_empty(&self) -> bool {
        self.state.doc().is_blank()
    }

    /// Placeholder label to show while the document has no text at all.
    pub fn placeholder(&self) -> Option<&str> {
        self.state
            .doc()
            .text_content()
            .is_empty()
            .then_some(self.placeholder.as_str())
    }

    pub fn get_doc(&self) -> SerializedDoc {
        codec::serialize(self.state.doc())
    }

    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    /// Live markup of the current document and decorations.
    pub fn render(&self) -> String {
        codec::render_live(self.state.doc(), &self.decorations)
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn can_undo(&self) -> bool {
        self.history.undo_depth() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.history.redo_depth() > 0
    }

    /// Replaces the document with an empty one in the current mode.
    pub fn reset(&mut self) {
        let mode = self.mode();
        self.replace_document(Document::empty(mode));
        info!(
            "event=doc_reset module=session status=ok session_id={} mode={}",
            self.id,
            mode.mode_name()
        );
    }

    /// Replaces the document with a stored one; the mode follows its schema.
    ///
    /// # Errors
    /// - `Doc(SchemaMismatch)` when the tree is invalid under its tag; the
    ///   session is left unchanged.
    pub fn set(&mut self, serialized: &SerializedDoc) -> Result<(), EditorError> {
        let started_at = Instant::now();
        let doc = codec::deserialize(serialized).map_err(|err| self.set_failed(err))?;
        self.install(doc, started_at);
        Ok(())
    }

    /// `set` from a JSON envelope.
    ///
    /// # Errors
    /// - `Doc(Malformed)` for text that is not a `{schema, doc}` object.
    /// - `Doc(SchemaMismatch)` as for `set`.
    pub fn set_json(&mut self, input: &str) -> Result<(), EditorError> {
        let started_at = Instant::now();
        let doc = codec::from_json_str(input).map_err(|err| self.set_failed(err))?;
        self.install(doc, started_at);
        Ok(())
    }

    fn install(&mut self, doc: Document, started_at: Instant) {
        self.replace_document(doc);
        info!(
            "event=doc_set module=session status=ok session_id={} mode={} duration_ms={}",
            self.id,
            self.current_mode(),
            started_at.elapsed().as_millis()
        );
    }

    fn set_failed(&self, err: DocError) -> EditorError {
        let error_code = match err {
            DocError::SchemaMismatch { .. } => "schema_mismatch",
            DocError::Malformed(_) => "malformed_json",
        };
        warn!(
            "event=doc_set_failed module=session status=error session_id={} error_code={} error={}",
            self.id, error_code, err
        );
        EditorError::Doc(err)
    }

    /// Converts the document to the other schema and clears history.
    ///
    /// # Errors
    /// - `CapabilityDisabled(ModeToggle)` for sessions without mode toggle.
    pub fn toggle_mode(&mut self) -> Result<(), EditorError> {
        if !self.capabilities.supports_mode_toggle {
            return Err(EditorError::CapabilityDisabled(EditorCapability::ModeToggle));
        }
        let from = self.mode();
        self.state = self.state.toggle_schema();
        self.history.clear();
        self.rebuild_handlers();
        self.publish_decorations();
        info!(
            "event=mode_toggle module=session status=ok session_id={} from={} to={} version={}",
            self.id,
            from.mode_name(),
            self.current_mode(),
            self.version()
        );
        Ok(())
    }

    pub fn focus(&mut self) {
        self.focused = true;
        if let Some(hook) = self.on_focus.as_mut() {
            hook();
        }
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.state = self.state.with_selection(selection);
    }

    /// Applies a host-built transaction and records it in history.
    pub fn apply(&mut self, tr: &Transaction) -> Result<(), EditorError> {
        self.commit(tr).map_err(EditorError::from)
    }

    /// Replaces the selection with typed text.
    pub fn insert_text(&mut self, text: &str) -> InputOutcome {
        let Some(tr) = commands::insert_text(&self.state, text) else {
            return InputOutcome::Ignored;
        };
        match self.commit(&tr) {
            Ok(()) => InputOutcome::Handled,
            Err(err) => {
                debug!(
                    "event=transaction_rejected module=session status=skipped session_id={} command=insert_text error={}",
                    self.id, err
                );
                InputOutcome::Ignored
            }
        }
    }

    /// Runs the commands bound to `event` until one applies.
    pub fn handle_key(&mut self, event: &KeyEvent) -> InputOutcome {
        for command in self.handlers.key_commands(event) {
            let Some(effect) = command.run(&self.state) else {
                continue;
            };
            if let Some(outcome) = self.run_effect(effect, command.name) {
                return outcome;
            }
        }
        InputOutcome::Ignored
    }

    /// Routes pointer input on a widget drawn from `input.version`.
    ///
    /// # Errors
    /// - `StaleDecorations` when the host drew an older decoration set.
    /// - `NoDecoration` when no such widget exists at `input.pos`.
    /// - `Edit` when the widget's edit is rejected.
    pub fn handle_pointer(&mut self, input: &PointerInput) -> Result<InputOutcome, EditorError> {
        let current = self.version();
        if input.version != current {
            warn!(
                "event=stale_decorations module=session status=rejected session_id={} rendered={} current={}",
                self.id, input.version, current
            );
            return Err(EditorError::StaleDecorations {
                rendered: input.version,
                current,
            });
        }
        let decoration = *self
            .decorations
            .find(input.pos, input.widget)
            .ok_or(EditorError::NoDecoration {
                pos: input.pos,
                widget: input.widget,
            })?;
        let Some(handler) = self.handlers.pointer_handler(input.widget, input.kind) else {
            return Ok(InputOutcome::Ignored);
        };
        match handler(&decoration, &self.state) {
            Some(Effect::Edit(tr)) => {
                self.commit(&tr)?;
                Ok(InputOutcome::Handled)
            }
            Some(effect) => Ok(self
                .run_effect(effect, input.widget.as_str())
                .unwrap_or(InputOutcome::Ignored)),
            None => Ok(InputOutcome::Ignored),
        }
    }

    /// Reverts the most recent edit. Returns false when there is none.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.pop_undo() else {
            return false;
        };
        let next = match self.state.apply(&entry.inverse) {
            Ok((next, _)) => next.with_selection(entry.selection_before),
            Err(err) => {
                warn!(
                    "event=history_undo module=session status=fallback session_id={} error={}",
                    self.id, err
                );
                self.state
                    .replace_doc(entry.before.clone(), Some(entry.selection_before))
            }
        };
        self.state = next;
        self.history.push_redo(entry);
        self.publish_decorations();
        debug!(
            "event=history_undo module=session status=ok session_id={} version={}",
            self.id,
            self.version()
        );
        true
    }

    /// Re-applies the most recently undone edit. Returns false when there is none.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.pop_redo() else {
            return false;
        };
        match self.state.apply(&entry.forward) {
            Ok((next, applied)) => {
                self.history.push_undo(HistoryEntry {
                    before: self.state.doc().clone(),
                    selection_before: self.state.selection(),
                    forward: entry.forward,
                    inverse: applied.inverse,
                });
                self.state = next;
                self.publish_decorations();
                debug!(
                    "event=history_redo module=session status=ok session_id={} version={}",
                    self.id,
                    self.version()
                );
                true
            }
            Err(err) => {
                warn!(
                    "event=history_redo module=session status=error session_id={} error={}",
                    self.id, err
                );
                false
            }
        }
    }

    fn run_effect(&mut self, effect: Effect, source: &str) -> Option<InputOutcome> {
        match effect {
            Effect::Edit(tr) => match self.commit(&tr) {
                Ok(()) => Some(InputOutcome::Handled),
                Err(err) => {
                    debug!(
                        "event=transaction_rejected module=session status=skipped session_id={} command={} error={}",
                        self.id, source, err
                    );
                    None
                }
            },
            Effect::Undo => self.undo().then_some(InputOutcome::Handled),
            Effect::Redo => self.redo().then_some(InputOutcome::Handled),
            Effect::Submit => {
                let doc = self.get_doc();
                if let Some(hook) = self.on_submit.as_mut() {
                    hook(&doc);
                }
                info!(
                    "event=submit module=session status=ok session_id={}",
                    self.id
                );
                Some(InputOutcome::Submit)
            }
            Effect::Select(selection) => {
                self.set_selection(selection);
                Some(InputOutcome::Handled)
            }
        }
    }

    fn commit(&mut self, tr: &Transaction) -> Result<(), InvalidEdit> {
        let (next, applied) = self.state.apply(tr)?;
        if tr.is_empty() {
            self.state = next;
            return Ok(());
        }
        self.history.record(HistoryEntry {
            before: self.state.doc().clone(),
            selection_before: self.state.selection(),
            forward: tr.clone(),
            inverse: applied.inverse,
        });
        self.state = next;
        self.publish_decorations();
        Ok(())
    }

    fn replace_document(&mut self, doc: Document) {
        let doc = if !self.capabilities.supports_mode_toggle && doc.schema_id() == SchemaId::Task {
            convert::to_freeform(&doc)
        } else {
            doc
        };
        self.state = self.state.replace_doc(doc, None);
        self.history.clear();
        self.rebuild_handlers();
        self.publish_decorations();
    }

    fn rebuild_handlers(&mut self) {
        if self.handlers.mode() != self.mode() {
            self.handlers = HandlerTable::for_mode(
                self.mode(),
                self.capabilities,
                self.platform,
                &self.key_overrides,
            );
        }
    }

    fn publish_decorations(&mut self) {
        self.decorations = if self.capabilities.supports_checklist {
            compute_decorations(self.state.doc(), self.state.version())
        } else {
            DecorationSet::empty(self.state.version())
        };
    }
}

impl Debug for Editor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("id", &self.id)
            .field("mode", &self.mode())
            .field("version", &self.version())
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}
