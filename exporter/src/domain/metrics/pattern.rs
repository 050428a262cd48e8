//! Destination-name template resolution
//!
//! Templates such as `/aws/ecs/{ClusterName}/{TaskId}` are resolved against a
//! label or resource-attribute set. Unknown placeholders become `undefined`.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::types::Labels;
use crate::core::constants::UNDEFINED_MARKER;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Some placeholders had no value; `partial` holds the template with those
    /// placeholders replaced by `undefined`
    #[error("No value for placeholders [{}] in pattern", keys.join(", "))]
    MissingKeys { partial: String, keys: Vec<String> },
}

impl PatternError {
    /// The best-effort resolution carried by the error
    pub fn into_partial(self) -> String {
        match self {
            Self::MissingKeys { partial, .. } => partial,
        }
    }
}

/// Resolves placeholders of a destination-name template
pub trait PatternResolver: Send + Sync {
    fn resolve(&self, template: &str, labels: &Labels) -> Result<String, PatternError>;
}

/// Substitutes `{key}` with the value of label `key`
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelPatternResolver;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("Invalid regex"))
}

impl PatternResolver for LabelPatternResolver {
    fn resolve(&self, template: &str, labels: &Labels) -> Result<String, PatternError> {
        let mut missing = Vec::new();
        let resolved = placeholder_regex().replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            match labels.get(key).filter(|v| !v.is_empty()) {
                Some(value) => value.clone(),
                None => {
                    missing.push(key.to_string());
                    UNDEFINED_MARKER.to_string()
                }
            }
        });
        let resolved = resolved.into_owned();

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(PatternError::MissingKeys {
                partial: resolved,
                keys: missing,
            })
        }
    }
}

/// Resolve a template, swallowing failures into the partial resolution
pub fn resolve_or_partial(
    resolver: &dyn PatternResolver,
    template: &str,
    labels: &Labels,
) -> (String, bool) {
    match resolver.resolve(template, labels) {
        Ok(resolved) => (resolved, true),
        Err(e) => {
            tracing::debug!(template, error = %e, "Pattern not fully resolved");
            (e.into_partial(), false)
        }
    }
}
