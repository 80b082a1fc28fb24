//! Engine settings.
//!
//! # Responsibility
//! - Carry the per-deployment choices the engines need on every save:
//!   cross-reference mode and highlight classes.
//! - Parse settings from JSON with defaults for missing keys.
//!
//! # Invariants
//! - Settings are passed explicitly to services; there is no process-wide
//!   mutable switch.
//! - Highlight class names are non-empty and contain no quotes or
//!   whitespace.

use crate::lexicon::HighlightStyle;
use crate::linker::CrossReferenceMode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Settings consumed by record services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub cross_reference_mode: CrossReferenceMode,
    pub highlight: HighlightStyle,
}

/// Settings parse/validation errors.
#[derive(Debug)]
pub enum SettingsError {
    Parse(serde_json::Error),
    InvalidClassName {
        field: &'static str,
        value: String,
    },
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid settings json: {err}"),
            Self::InvalidClassName { field, value } => {
                write!(f, "invalid css class for `{field}`: `{value}`")
            }
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidClassName { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl EngineSettings {
    /// Parses and validates settings from a JSON document.
    ///
    /// Missing keys fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let style = &self.highlight;
        for (field, value) in [
            ("highlight.unverified_class", &style.unverified_class),
            ("highlight.unchecked_class", &style.unchecked_class),
            ("highlight.verified_class", &style.verified_class),
        ] {
            if !is_valid_class_name(value) {
                return Err(SettingsError::InvalidClassName {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

fn is_valid_class_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::{EngineSettings, SettingsError};
    use crate::linker::CrossReferenceMode;

    #[test]
    fn empty_document_uses_defaults() {
        let settings = EngineSettings::from_json_str("{}").expect("defaults should parse");
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.cross_reference_mode, CrossReferenceMode::Auto);
        assert_eq!(settings.highlight.verified_class, "lexicon-verified");
    }

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let settings = EngineSettings::from_json_str(
            r#"{"cross_reference_mode":"manual","highlight":{"unverified_class":"red"}}"#,
        )
        .expect("partial settings should parse");
        assert_eq!(settings.cross_reference_mode, CrossReferenceMode::Manual);
        assert_eq!(settings.highlight.unverified_class, "red");
        assert_eq!(settings.highlight.unchecked_class, "lexicon-unchecked");
    }

    #[test]
    fn invalid_class_names_are_rejected() {
        let err = EngineSettings::from_json_str(r#"{"highlight":{"verified_class":"a b"}}"#)
            .expect_err("whitespace class must fail");
        assert!(matches!(
            err,
            SettingsError::InvalidClassName {
                field: "highlight.verified_class",
                ..
            }
        ));
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let err = EngineSettings::from_json_str(r#"{"cross_reference_mode":"sometimes"}"#)
            .expect_err("unknown mode must fail");
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
