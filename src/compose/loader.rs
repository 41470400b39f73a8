//! Compose document loading and `include` resolution.
//!
//! A compose configuration can be split across several files linked through
//! the top-level `include` key. [`load`] follows those links recursively and
//! returns every document in one flat, ordered list: pre-order, depth-first,
//! sibling order preserved, so a document always appears before the
//! documents it includes.
//!
//! Path resolution is threaded explicitly through the recursion — a relative
//! include resolves against the directory of the document that declares it,
//! never against ambient process state. An include chain that revisits a
//! file still being resolved aborts the whole load with
//! [`ComposeGraphError::CyclicInclude`]; a partial document list is never
//! returned.

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::{ComposeGraphError, Result};

/// The raw parsed result of one compose file.
///
/// Immutable once parsed; consumed by the normalizer. The top-level
/// `networks` and `volumes` declarations are carried through untouched for
/// the renderer but not processed further.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: PathBuf,
    root: Mapping,
}

impl ConfigDocument {
    /// Build a document from an already-parsed root mapping.
    ///
    /// The loader resolves `path` before calling this; tests use it to build
    /// synthetic in-memory document sets without touching the filesystem.
    pub fn from_mapping(path: impl Into<PathBuf>, root: Mapping) -> Self {
        Self {
            path: path.into(),
            root,
        }
    }

    /// Resolved absolute path of the file this document was parsed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterate the `services` mapping as `(name, fragment)` pairs in
    /// declaration order.
    ///
    /// Entries whose key is not a string or whose value is not a mapping are
    /// skipped.
    pub fn services(&self) -> impl Iterator<Item = (&str, &Mapping)> {
        self.root
            .get("services")
            .and_then(Value::as_mapping)
            .into_iter()
            .flatten()
            .filter_map(|(name, fragment)| match (name.as_str(), fragment.as_mapping()) {
                (Some(name), Some(fragment)) => Some((name, fragment)),
                _ => None,
            })
    }

    /// Top-level `networks` declaration, if any.
    pub fn top_level_networks(&self) -> Option<&Value> {
        self.root.get("networks")
    }

    /// Top-level `volumes` declaration, if any.
    pub fn top_level_volumes(&self) -> Option<&Value> {
        self.root.get("volumes")
    }

    /// Paths referenced by the `include` directives, in declaration order.
    ///
    /// Accepts both the long form (`- path: [a.yaml, b.yaml]`, with `path`
    /// also allowed as a single string) and the string shorthand
    /// (`- a.yaml`).
    pub fn include_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        let Some(entries) = self.root.get("include").and_then(Value::as_sequence) else {
            return paths;
        };

        for entry in entries {
            match entry {
                Value::String(path) => paths.push(PathBuf::from(path)),
                Value::Mapping(include_set) => match include_set.get("path") {
                    Some(Value::String(path)) => paths.push(PathBuf::from(path)),
                    Some(Value::Sequence(list)) => {
                        paths.extend(
                            list.iter()
                                .filter_map(Value::as_str)
                                .map(PathBuf::from),
                        );
                    }
                    // A typo here (e.g. `paths:`) drops a whole subtree, so
                    // this is worth more than a debug line.
                    _ => warn!(?entry, "include entry without usable 'path', skipping"),
                },
                _ => warn!(?entry, "unrecognized include entry, skipping"),
            }
        }

        paths
    }
}

/// Load `path` and every document reachable through its `include` tree.
///
/// Returns the documents in pre-order: the root first, then each included
/// subtree depth-first, siblings in declaration order.
///
/// # Errors
///
/// - [`ComposeGraphError::FileNotFound`] if any path does not resolve to a
///   readable file
/// - [`ComposeGraphError::ParseError`] if any file is not valid YAML with a
///   mapping at the root
/// - [`ComposeGraphError::CyclicInclude`] if the include tree revisits a
///   file on the active resolution path
pub fn load(path: &Path) -> Result<Vec<ConfigDocument>> {
    let mut documents = Vec::new();
    let mut active = Vec::new();
    load_recursive(path, None, &mut documents, &mut active)?;
    Ok(documents)
}

fn load_recursive(
    path: &Path,
    root_dir: Option<&Path>,
    documents: &mut Vec<ConfigDocument>,
    active: &mut Vec<PathBuf>,
) -> Result<()> {
    let resolved = resolve_path(path, root_dir)?;

    if active.contains(&resolved) {
        return Err(ComposeGraphError::CyclicInclude { path: resolved });
    }

    info!(path = %resolved.display(), "processing compose file");

    let text = fs::read_to_string(&resolved).map_err(|err| map_read_error(&resolved, err))?;

    let root: Value = serde_yaml::from_str(&text).map_err(|err| ComposeGraphError::ParseError {
        path: resolved.clone(),
        reason: err.to_string(),
    })?;
    let Value::Mapping(root) = root else {
        return Err(ComposeGraphError::ParseError {
            path: resolved.clone(),
            reason: "document root is not a mapping".to_string(),
        });
    };

    // Nested includes resolve against this document's directory.
    let next_root = resolved
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let document = ConfigDocument::from_mapping(resolved.clone(), root);
    let includes = document.include_paths();
    documents.push(document);

    active.push(resolved);
    for include in includes {
        load_recursive(&include, Some(&next_root), documents, active)?;
    }
    active.pop();

    Ok(())
}

/// Resolve a possibly-relative path to a canonical absolute one.
///
/// Relative paths join against `root_dir`, falling back to the process
/// working directory for the top-level call.
fn resolve_path(path: &Path, root_dir: Option<&Path>) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let base = match root_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        debug!(rel = %path.display(), base = %base.display(), "resolving relative include");
        base.join(path)
    };

    joined.canonicalize().map_err(|err| map_read_error(&joined, err))
}

fn map_read_error(path: &Path, err: std::io::Error) -> ComposeGraphError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ComposeGraphError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        ComposeGraphError::Io(err)
    }
}
