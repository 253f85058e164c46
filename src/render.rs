//! Placeholder substitution over YAML template trees.
//!
//! A template is an ordinary YAML document in which some scalars are markers of
//! the form `{{NAME}}`. Rendering folds one `(marker, value)` binding at a time
//! over the tree and always returns a fresh tree, so every intermediate stage
//! can be inspected on its own.
use crate::error::PipelineError;
use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// One placeholder and the value that replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub token: String,
    pub value: Value,
}

impl Binding {
    /// Bind the marker `{{name}}` to `value`.
    pub fn new(name: &str, value: impl Into<Value>) -> Self {
        Self {
            token: placeholder(name),
            value: value.into(),
        }
    }
}

/// Marker text for a placeholder name.
pub fn placeholder(name: &str) -> String {
    format!("{{{{{name}}}}}")
}

/// Whether `text` has marker syntax (`{{` + `[A-Z0-9_]+` + `}}`).
pub fn is_placeholder(text: &str) -> bool {
    let Some(inner) = text
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
    else {
        return false;
    };
    !inner.is_empty()
        && inner
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_')
}

/// Replace every scalar equal to `token` with `replacement`.
///
/// Mapping keys and values are rewritten independently, so a key may itself
/// be a marker.
pub fn substitute(doc: &Value, token: &str, replacement: &Value) -> Value {
    match doc {
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (key, value) in map {
                out.insert(
                    substitute(key, token, replacement),
                    substitute(value, token, replacement),
                );
            }
            Value::Mapping(out)
        }
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(|item| substitute(item, token, replacement))
                .collect(),
        ),
        Value::Tagged(tagged) => {
            let mut tagged = tagged.as_ref().clone();
            tagged.value = substitute(&tagged.value, token, replacement);
            Value::Tagged(Box::new(tagged))
        }
        Value::String(text) if text == token => replacement.clone(),
        other => other.clone(),
    }
}

/// Fold `substitute` over `bindings` in order.
///
/// A replacement that itself looks like a marker would be picked up by a later
/// binding, so it is rejected up front.
pub fn substitute_all(doc: &Value, bindings: &[Binding]) -> Result<Value> {
    for binding in bindings {
        if let Some(marker) = find_placeholder(&binding.value) {
            return Err(PipelineError::ReservedToken {
                token: binding.token.clone(),
                value: marker,
            }
            .into());
        }
    }
    Ok(bindings.iter().fold(doc.clone(), |acc, binding| {
        substitute(&acc, &binding.token, &binding.value)
    }))
}

/// First marker still present anywhere in `doc`, keys included.
pub fn find_placeholder(doc: &Value) -> Option<String> {
    match doc {
        Value::Mapping(map) => map
            .iter()
            .find_map(|(key, value)| find_placeholder(key).or_else(|| find_placeholder(value))),
        Value::Sequence(items) => items.iter().find_map(find_placeholder),
        Value::Tagged(tagged) => find_placeholder(&tagged.value),
        Value::String(text) if is_placeholder(text) => Some(text.clone()),
        _ => None,
    }
}

/// Render a template and require that no marker survives.
pub fn render(template: &Value, bindings: &[Binding], document: &str) -> Result<Value> {
    let rendered = substitute_all(template, bindings)?;
    if let Some(token) = find_placeholder(&rendered) {
        return Err(PipelineError::UnresolvedPlaceholder {
            document: document.to_string(),
            token,
        }
        .into());
    }
    Ok(rendered)
}

pub fn parse_yaml(text: &str, label: &str) -> Result<Value> {
    serde_yaml::from_str(text).with_context(|| format!("parse {label} YAML"))
}

pub fn read_yaml(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_yaml(&text, &path.display().to_string())
}

/// Write `doc` to `path`, creating parent directories.
///
/// `serde_yaml::Mapping` keeps insertion order, so keys come out in template order.
pub fn write_yaml(path: &Path, doc: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_yaml::to_string(doc).context("serialize YAML document")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
