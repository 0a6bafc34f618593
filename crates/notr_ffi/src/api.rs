//! FFI editor API for Flutter-facing calls.
//!
//! # Responsibility
//! - Own the process-wide registry of editor sessions keyed by session id.
//! - Expose session operations to Dart via FRB as sync, envelope-returning calls.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures are reported in the envelope (`ok=false`, `message`); a failed
//!   call leaves its session unchanged.
//! - Documents cross the boundary only as `{schema, doc}` JSON.

use log::warn;
use notr_core::command::KeyOverrides;
use notr_core::{
    core_version as core_version_inner, from_json_str, init_logging as init_logging_inner,
    ping as ping_inner, render_static, to_json_string, Capabilities, Editor, EditorOptions,
    KeyEvent, Platform, PointerInput, PointerKind, SchemaId, SessionId, WidgetKind,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

const DEFAULT_PLACEHOLDER: &str = "Take a note...";
const HISTORY_DEPTH_MAX: usize = 1_000;
static SESSIONS: OnceLock<Mutex<HashMap<SessionId, Editor>>> = OnceLock::new();
static HISTORY_DEPTH: OnceLock<Option<usize>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One keymap override passed at session construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindingOverride {
    /// Default chord as written in the keymap, e.g. `Mod-Enter`.
    pub chord: String,
    /// Replacement chord, or `None` to unbind.
    pub target: Option<String>,
}

/// Session view returned after every successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSnapshot {
    /// `{schema, doc}` JSON of the current document.
    pub doc_json: String,
    /// `text` or `checklist`.
    pub mode: String,
    pub is_empty: bool,
    /// Placeholder label, present only while the document has no text.
    pub placeholder: Option<String>,
    /// Document version the live markup and its `data-pos` values belong to.
    pub version: u64,
    /// Live markup with widgets.
    pub markup: String,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Response envelope for editor calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    pub session_id: Option<String>,
    /// Human-readable message for diagnostics.
    pub message: String,
    /// `handled|submit|ignored` for input calls.
    pub outcome: Option<String>,
    pub snapshot: Option<EditorSnapshot>,
}

impl EditorResponse {
    fn success(message: impl Into<String>, session_id: SessionId, editor: &Editor) -> Self {
        Self {
            ok: true,
            session_id: Some(session_id.to_string()),
            message: message.into(),
            outcome: None,
            snapshot: Some(snapshot(editor)),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            session_id: None,
            message: message.into(),
            outcome: None,
            snapshot: None,
        }
    }

    fn with_outcome(mut self, outcome: &str) -> Self {
        self.outcome = Some(outcome.to_string());
        self
    }
}

/// Static markup response for read-only note previews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResponse {
    pub ok: bool,
    pub markup: String,
    pub message: String,
}

/// Opens a new editor session.
///
/// Input semantics:
/// - `capabilities`: subset of `mode_toggle|checklist`; empty opens a title editor.
/// - `initial_mode`: `text` or `checklist`; ignored without `mode_toggle`.
/// - `platform`: host OS name (`macos`, `ios`, ...); `None` uses the build target.
///
/// # FFI contract
/// - Sync call, in-memory only.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_open(
    placeholder: Option<String>,
    capabilities: Vec<String>,
    initial_mode: Option<String>,
    platform: Option<String>,
    key_overrides: Vec<KeyBindingOverride>,
) -> EditorResponse {
    let capabilities = match Capabilities::from_names(&capabilities) {
        Ok(capabilities) => capabilities,
        Err(err) => return EditorResponse::failure(format!("editor_open failed: {err}")),
    };
    let initial_mode = match initial_mode.as_deref().map(parse_mode).transpose() {
        Ok(mode) => mode.unwrap_or(SchemaId::Text),
        Err(err) => return EditorResponse::failure(format!("editor_open failed: {err}")),
    };
    let platform = platform
        .as_deref()
        .map_or_else(Platform::current, Platform::from_os);

    let mut options = EditorOptions {
        capabilities,
        platform,
        initial_mode,
        key_overrides: to_key_overrides(key_overrides),
        ..EditorOptions::default()
    };
    if let Some(depth) = resolve_history_depth() {
        options = options.with_history_depth(depth);
    }

    let placeholder = placeholder
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string());
    let editor = Editor::new(placeholder, options);
    let session_id = editor.id();
    let response = EditorResponse::success("Session opened.", session_id, &editor);

    match sessions().lock() {
        Ok(mut sessions) => {
            sessions.insert(session_id, editor);
            response
        }
        Err(_) => EditorResponse::failure("editor_open failed: session registry poisoned"),
    }
}

/// Closes a session and drops its document and history.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_close(session_id: String) -> EditorResponse {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(err) => return EditorResponse::failure(format!("editor_close failed: {err}")),
    };
    let removed = match sessions().lock() {
        Ok(mut sessions) => sessions.remove(&id),
        Err(_) => return EditorResponse::failure("editor_close failed: session registry poisoned"),
    };
    match removed {
        Some(_) => EditorResponse {
            ok: true,
            session_id: Some(id.to_string()),
            message: "Session closed.".to_string(),
            outcome: None,
            snapshot: None,
        },
        None => EditorResponse::failure(format!("editor_close failed: unknown session `{id}`")),
    }
}

/// Current document and view state.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_get_doc(session_id: String) -> EditorResponse {
    with_session("editor_get_doc", &session_id, |_| Ok("Snapshot."))
}

/// `true` when the session's document holds no non-whitespace text.
///
/// Returns `false` for unknown sessions.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_is_empty(session_id: String) -> bool {
    editor_get_doc(session_id)
        .snapshot
        .map(|snapshot| snapshot.is_empty)
        .unwrap_or(false)
}

/// `text` or `checklist`, or an empty string for unknown sessions.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_current_mode(session_id: String) -> String {
    editor_get_doc(session_id)
        .snapshot
        .map(|snapshot| snapshot.mode)
        .unwrap_or_default()
}

/// Replaces the document with stored `{schema, doc}` JSON and clears history.
///
/// # FFI contract
/// - A schema mismatch fails the call and keeps the current document; the
///   host must not overwrite the stored value.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_set(session_id: String, doc_json: String) -> EditorResponse {
    with_session("editor_set", &session_id, |editor| {
        editor
            .set_json(&doc_json)
            .map(|()| "Document replaced.")
            .map_err(|err| err.to_string())
    })
}

/// Restores the empty placeholder document and clears history.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_reset(session_id: String) -> EditorResponse {
    with_session("editor_reset", &session_id, |editor| {
        editor.reset();
        Ok("Document reset.")
    })
}

/// Converts the document to the other mode.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_toggle_mode(session_id: String) -> EditorResponse {
    with_session("editor_toggle_mode", &session_id, |editor| {
        editor
            .toggle_mode()
            .map(|()| "Mode toggled.")
            .map_err(|err| err.to_string())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_focus(session_id: String) -> EditorResponse {
    with_session("editor_focus", &session_id, |editor| {
        editor.focus();
        Ok("Focused.")
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_blur(session_id: String) -> EditorResponse {
    with_session("editor_blur", &session_id, |editor| {
        editor.blur();
        Ok("Blurred.")
    })
}

/// Places a text cursor (`anchor == head`) or range.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_select(session_id: String, anchor: u32, head: u32) -> EditorResponse {
    with_session("editor_select", &session_id, |editor| {
        editor.set_selection(notr_core::Selection::range(anchor as usize, head as usize));
        Ok("Selection set.")
    })
}

/// Types text at the selection.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_insert_text(session_id: String, text: String) -> EditorResponse {
    let mut outcome = "ignored";
    let response = with_session("editor_insert_text", &session_id, |editor| {
        outcome = editor.insert_text(&text).as_str();
        Ok("Input processed.")
    });
    response.with_outcome(outcome)
}

/// Routes one key press through the session keymap.
///
/// Input semantics:
/// - `key`: DOM-style key name (`Enter`, `Backspace`, `z`, `ArrowUp`, ...).
/// - An `outcome` of `submit` asks the host to submit its enclosing form.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_key(
    session_id: String,
    key: String,
    ctrl: bool,
    alt: bool,
    shift: bool,
    meta: bool,
) -> EditorResponse {
    let mut event = KeyEvent::new(key);
    event.ctrl = ctrl;
    event.alt = alt;
    event.shift = shift;
    event.meta = meta;
    let mut outcome = "ignored";
    let response = with_session("editor_key", &session_id, |editor| {
        outcome = editor.handle_key(&event).as_str();
        Ok("Input processed.")
    });
    response.with_outcome(outcome)
}

/// Routes pointer input on a widget drawn from snapshot `version`.
///
/// Input semantics:
/// - `widget`: `checkbox_toggle|drag_handle`.
/// - `gesture`: `click|double_click|triple_click|primary_press|touch_start`.
/// - `pos`: the widget's `data-pos` value from the same snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_pointer(
    session_id: String,
    pos: u32,
    widget: String,
    gesture: String,
    version: u64,
) -> EditorResponse {
    let input = match parse_pointer(pos, &widget, &gesture, version) {
        Ok(input) => input,
        Err(err) => return EditorResponse::failure(format!("editor_pointer failed: {err}")),
    };
    let mut outcome = "ignored";
    let response = with_session("editor_pointer", &session_id, |editor| {
        outcome = editor
            .handle_pointer(&input)
            .map_err(|err| err.to_string())?
            .as_str();
        Ok("Input processed.")
    });
    response.with_outcome(outcome)
}

/// Static markup for a stored `{schema, doc}` JSON value.
#[flutter_rust_bridge::frb(sync)]
pub fn render_doc(doc_json: String) -> RenderResponse {
    match from_json_str(&doc_json) {
        Ok(doc) => RenderResponse {
            ok: true,
            markup: render_static(&doc),
            message: String::new(),
        },
        Err(err) => RenderResponse {
            ok: false,
            markup: String::new(),
            message: format!("render_doc failed: {err}"),
        },
    }
}

fn sessions() -> &'static Mutex<HashMap<SessionId, Editor>> {
    SESSIONS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn with_session(
    call: &str,
    session_id: &str,
    f: impl FnOnce(&mut Editor) -> Result<&'static str, String>,
) -> EditorResponse {
    let id = match parse_session_id(session_id) {
        Ok(id) => id,
        Err(err) => return EditorResponse::failure(format!("{call} failed: {err}")),
    };
    let mut sessions = match sessions().lock() {
        Ok(sessions) => sessions,
        Err(_) => return EditorResponse::failure(format!("{call} failed: session registry poisoned")),
    };
    let Some(editor) = sessions.get_mut(&id) else {
        return EditorResponse::failure(format!("{call} failed: unknown session `{id}`"));
    };
    match f(editor) {
        Ok(message) => EditorResponse::success(message, id, editor),
        Err(err) => {
            warn!(
                "event=ffi_call module=ffi status=error call={} session_id={} error={}",
                call, id, err
            );
            let mut response = EditorResponse::failure(format!("{call} failed: {err}"));
            response.session_id = Some(id.to_string());
            response
        }
    }
}

fn snapshot(editor: &Editor) -> EditorSnapshot {
    EditorSnapshot {
        doc_json: to_json_string(editor.document()).unwrap_or_default(),
        mode: editor.current_mode().to_string(),
        is_empty: editor.is_empty(),
        placeholder: editor.placeholder().map(str::to_string),
        version: editor.version().0,
        markup: editor.render(),
        can_undo: editor.can_undo(),
        can_redo: editor.can_redo(),
    }
}

fn parse_session_id(value: &str) -> Result<SessionId, String> {
    SessionId::from_str(value).map_err(|err| format!("invalid session id `{}`: {err}", value.trim()))
}

fn parse_mode(value: &str) -> Result<SchemaId, String> {
    match value.trim() {
        "text" => Ok(SchemaId::Text),
        "checklist" | "task" => Ok(SchemaId::Task),
        other => Err(format!("unsupported mode `{other}`; expected text|checklist")),
    }
}

fn parse_pointer(pos: u32, widget: &str, gesture: &str, version: u64) -> Result<PointerInput, String> {
    let widget = match widget.trim() {
        "checkbox_toggle" => WidgetKind::CheckboxToggle,
        "drag_handle" => WidgetKind::DragHandle,
        other => return Err(format!("unsupported widget `{other}`")),
    };
    let kind = match gesture.trim() {
        "click" => PointerKind::Click,
        "double_click" => PointerKind::DoubleClick,
        "triple_click" => PointerKind::TripleClick,
        "primary_press" => PointerKind::PrimaryPress,
        "touch_start" => PointerKind::TouchStart,
        other => return Err(format!("unsupported gesture `{other}`")),
    };
    Ok(PointerInput {
        pos: pos as usize,
        widget,
        kind,
        version: notr_core::DocVersion(version),
    })
}

fn to_key_overrides(overrides: Vec<KeyBindingOverride>) -> KeyOverrides {
    overrides
        .into_iter()
        .map(|entry| (entry.chord, entry.target))
        .collect()
}

fn resolve_history_depth() -> Option<usize> {
    *HISTORY_DEPTH.get_or_init(|| {
        let raw = std::env::var("NOTR_HISTORY_DEPTH").ok()?;
        raw.trim()
            .parse::<usize>()
            .ok()
            .filter(|depth| *depth > 0)
            .map(|depth| depth.min(HISTORY_DEPTH_MAX))
    })
}
