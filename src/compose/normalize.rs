//! Service normalization across loaded documents.
//!
//! The loader hands over one raw document per file; the same service name
//! can appear in several of them (main file plus overrides). Normalization
//! flattens every document's services into fragments, folds fragments
//! sharing a name through the merge engine in encounter order, and conforms
//! the two polymorphic fields to one canonical shape each:
//!
//! - `environment`: a list of `KEY=VALUE` strings becomes a key→value
//!   mapping. This runs per fragment BEFORE the structural merge, because
//!   list-union and mapping-merge behave differently for the same logical
//!   data.
//! - `depends_on`: a bare list of names becomes a mapping of
//!   `name: {condition: null}`. This runs on the merged config, where the
//!   mapping form merges per key.
//!
//! Nothing downstream branches on field shape again.

use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::loader::ConfigDocument;
use super::merge::merge_mappings;
use crate::core::{ComposeGraphError, Result};

/// The key attached to every normalized dependency entry.
const CONDITION_KEY: &str = "condition";

/// The result of merging all fragments sharing one service name.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedService {
    /// Service name, unique across the merged set.
    pub name: String,
    /// Merged and normalized field mapping.
    pub config: Mapping,
}

/// One occurrence of a service's configuration in a single document.
type Fragment = (String, Mapping);

/// Merge and normalize every service declared across `documents`.
///
/// Services are returned in first-seen order. Fails fast on the first
/// service with an unrecognized `environment` or `depends_on` shape; use
/// [`merge_service`] directly to normalize services individually.
///
/// # Errors
///
/// Returns [`ComposeGraphError::SchemaInconsistency`] naming the offending
/// service and field.
pub fn normalize(documents: &[ConfigDocument]) -> Result<Vec<MergedService>> {
    let fragments = collect_fragments(documents);
    let names = distinct_names(&fragments);

    debug!(services = names.len(), fragments = fragments.len(), "normalizing services");

    names
        .into_iter()
        .map(|name| merge_service(&name, &fragments))
        .collect()
}

/// Fold every fragment named `name` into one [`MergedService`].
///
/// Each fragment's `environment` is conformed BEFORE it merges in, so two
/// list-shaped fragments merge per key instead of unioning as lists; the
/// first conformed fragment is the initial base. `depends_on` is conformed
/// on the merged result.
///
/// # Errors
///
/// Returns [`ComposeGraphError::SchemaInconsistency`] if any fragment's
/// `environment`, or the merged `depends_on`, is in neither of its two
/// recognized shapes.
pub fn merge_service(name: &str, fragments: &[Fragment]) -> Result<MergedService> {
    let mut config = Mapping::new();
    for (_, fragment) in fragments.iter().filter(|(n, _)| n == name) {
        let mut fragment = fragment.clone();
        conform_environment(name, &mut fragment)?;
        config = merge_mappings(&config, &fragment);
    }

    conform_depends_on(name, &mut config)?;

    Ok(MergedService {
        name: name.to_string(),
        config,
    })
}

/// Flatten all documents' services into raw `(name, fragment)` pairs, in
/// (document order, then declaration order).
fn collect_fragments(documents: &[ConfigDocument]) -> Vec<Fragment> {
    let mut fragments = Vec::new();

    for document in documents {
        for (name, fragment) in document.services() {
            fragments.push((name.to_string(), fragment.clone()));
        }
    }

    fragments
}

/// Distinct service names in first-seen order.
fn distinct_names(fragments: &[Fragment]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (name, _) in fragments {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

/// Convert a list-shaped `environment` into a key→value mapping in place.
///
/// Entries are `KEY=VALUE` strings; embedded spaces are stripped and the
/// split happens on the first `=`. A mapping-shaped (or absent)
/// `environment` is left untouched.
fn conform_environment(service: &str, fragment: &mut Mapping) -> Result<()> {
    let entries = match fragment.get("environment") {
        None | Some(Value::Null) | Some(Value::Mapping(_)) => return Ok(()),
        Some(Value::Sequence(entries)) => entries.clone(),
        Some(other) => {
            return Err(schema_error(service, "environment", other));
        }
    };

    let mut environment = Mapping::new();
    for entry in &entries {
        let Some(entry) = entry.as_str() else {
            return Err(schema_error(service, "environment", entry));
        };
        let entry = entry.replace(' ', "");
        let Some((key, value)) = entry.split_once('=') else {
            return Err(ComposeGraphError::SchemaInconsistency {
                service: service.to_string(),
                field: "environment".to_string(),
                reason: format!("entry '{entry}' is not a KEY=VALUE pair"),
            });
        };
        environment.insert(
            Value::String(key.to_string()),
            Value::String(value.to_string()),
        );
    }

    fragment.insert(
        Value::String("environment".to_string()),
        Value::Mapping(environment),
    );
    Ok(())
}

/// Conform `depends_on` on a merged config to the canonical mapping shape.
fn conform_depends_on(service: &str, config: &mut Mapping) -> Result<()> {
    let entries = match config.get("depends_on") {
        None | Some(Value::Null) | Some(Value::Mapping(_)) => return Ok(()),
        Some(Value::Sequence(entries)) => entries.clone(),
        Some(other) => {
            return Err(schema_error(service, "depends_on", other));
        }
    };

    let mut depends_on = Mapping::new();
    for entry in &entries {
        let Some(dependency) = entry.as_str() else {
            return Err(schema_error(service, "depends_on", entry));
        };
        let mut gate = Mapping::new();
        gate.insert(Value::String(CONDITION_KEY.to_string()), Value::Null);
        depends_on.insert(Value::String(dependency.to_string()), Value::Mapping(gate));
    }

    config.insert(
        Value::String("depends_on".to_string()),
        Value::Mapping(depends_on),
    );
    Ok(())
}

fn schema_error(service: &str, field: &str, found: &Value) -> ComposeGraphError {
    let shape = match found {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    };
    ComposeGraphError::SchemaInconsistency {
        service: service.to_string(),
        field: field.to_string(),
        reason: format!("expected a list or a mapping, found {shape}"),
    }
}
