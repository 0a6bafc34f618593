//! Capability declarations for editor sessions.
//!
//! # Responsibility
//! - Name the optional behaviors a session may enable.
//! - Parse host-supplied capability strings into a `Capabilities` set.
//!
//! # Invariants
//! - A title session (no capabilities) is always freeform.
//! - Capability strings are lowercase and matched exactly.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// One optional editor behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EditorCapability {
    ModeToggle,
    Checklist,
}

impl EditorCapability {
    /// Stable string id used by hosts.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ModeToggle => EDITOR_CAPABILITY_MODE_TOGGLE,
            Self::Checklist => EDITOR_CAPABILITY_CHECKLIST,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::ModeToggle => "Allow switching the note between text and checklist mode.",
            Self::Checklist => "Render checklist toggles and drag handles for task items.",
        }
    }
}

impl Display for EditorCapability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const EDITOR_CAPABILITY_MODE_TOGGLE: &str = "mode_toggle";
pub const EDITOR_CAPABILITY_CHECKLIST: &str = "checklist";

const SUPPORTED_EDITOR_CAPABILITY_STRINGS: &[&str] =
    &[EDITOR_CAPABILITY_MODE_TOGGLE, EDITOR_CAPABILITY_CHECKLIST];

pub fn supported_editor_capability_strings() -> &'static [&'static str] {
    SUPPORTED_EDITOR_CAPABILITY_STRINGS
}

/// Parses one capability string.
pub fn parse_editor_capability(value: &str) -> Result<EditorCapability, CapabilityError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(CapabilityError::EmptyCapability);
    }

    match normalized {
        EDITOR_CAPABILITY_MODE_TOGGLE => Ok(EditorCapability::ModeToggle),
        EDITOR_CAPABILITY_CHECKLIST => Ok(EditorCapability::Checklist),
        other => Err(CapabilityError::UnsupportedCapability(other.to_string())),
    }
}

/// Capability parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    EmptyCapability,
    UnsupportedCapability(String),
}

impl Display for CapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCapability => write!(f, "editor capability value must not be empty"),
            Self::UnsupportedCapability(value) => {
                write!(f, "editor capability is unsupported: {value}")
            }
        }
    }
}

impl Error for CapabilityError {}

/// Capability set of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    pub supports_mode_toggle: bool,
    pub supports_checklist: bool,
}

impl Capabilities {
    /// Single-line title field.
    pub const TITLE: Self = Self {
        supports_mode_toggle: false,
        supports_checklist: false,
    };

    /// Note body with text/checklist modes.
    pub const CONTENT: Self = Self {
        supports_mode_toggle: true,
        supports_checklist: true,
    };

    /// Whether the session is a single-line field with no body capability.
    pub fn is_single_line(&self) -> bool {
        let Self {
            supports_mode_toggle,
            supports_checklist,
        } = *self;
        !supports_mode_toggle && !supports_checklist
    }

    pub fn allows(&self, capability: EditorCapability) -> bool {
        match capability {
            EditorCapability::ModeToggle => self.supports_mode_toggle,
            EditorCapability::Checklist => self.supports_checklist,
        }
    }

    pub fn with(mut self, capability: EditorCapability) -> Self {
        match capability {
            EditorCapability::ModeToggle => self.supports_mode_toggle = true,
            EditorCapability::Checklist => self.supports_checklist = true,
        }
        self
    }

    /// Builds a set from host strings; duplicates are accepted.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, CapabilityError> {
        names.iter().try_fold(Self::TITLE, |caps, name| {
            parse_editor_capability(name.as_ref()).map(|capability| caps.with(capability))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_editor_capability, supported_editor_capability_strings, Capabilities,
        CapabilityError, EditorCapability,
    };

    #[test]
    fn parses_all_supported_capabilities() {
        for value in supported_editor_capability_strings() {
            let capability = parse_editor_capability(value).expect("supported value parses");
            assert_eq!(capability.as_str(), *value);
        }
    }

    #[test]
    fn rejects_empty_and_unknown_capabilities() {
        assert_eq!(
            parse_editor_capability("  ").expect_err("empty must fail"),
            CapabilityError::EmptyCapability
        );
        assert_eq!(
            parse_editor_capability("Checklist").expect_err("case sensitive"),
            CapabilityError::UnsupportedCapability("Checklist".to_string())
        );
    }

    #[test]
    fn builds_presets_from_names() {
        assert_eq!(
            Capabilities::from_names(&["checklist", "mode_toggle"]).expect("valid"),
            Capabilities::CONTENT
        );
        assert_eq!(
            Capabilities::from_names::<&str>(&[]).expect("empty list"),
            Capabilities::TITLE
        );
        assert!(Capabilities::CONTENT.allows(EditorCapability::ModeToggle));
        assert!(!Capabilities::TITLE.allows(EditorCapability::Checklist));
    }

    #[test]
    fn any_body_capability_makes_a_multi_line_session() {
        assert!(Capabilities::TITLE.is_single_line());
        assert!(!Capabilities::CONTENT.is_single_line());
        assert!(!Capabilities::TITLE
            .with(EditorCapability::ModeToggle)
            .is_single_line());
        assert!(!Capabilities::TITLE
            .with(EditorCapability::Checklist)
            .is_single_line());
    }

    #[test]
    fn descriptions_mention_their_behavior() {
        assert!(EditorCapability::ModeToggle.description().contains("mode"));
        assert!(EditorCapability::Checklist.description().contains("checklist"));
    }
}
