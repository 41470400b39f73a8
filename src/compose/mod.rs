//! The compose configuration resolution pipeline.
//!
//! Four stages, each in its own module:
//!
//! 1. [`loader`] — load a compose file and recursively follow `include`
//!    directives into a flat, ordered document list
//! 2. [`merge`] — deep-merge overlapping service fragments, honoring the
//!    [`tags`] merge directives (`!override`, `!reset`)
//! 3. [`normalize`] — fold same-named fragments together and conform the
//!    polymorphic `environment` / `depends_on` fields
//! 4. [`relations`] — project the merged services into the port / volume /
//!    network / dependency tables the renderer consumes
//!
//! [`ComposeModel::resolve`] runs the whole pipeline. Every invocation is
//! independent and synchronous; no state is shared across runs.

pub mod loader;
pub mod merge;
pub mod normalize;
pub mod relations;
pub mod tags;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::core::Result;
pub use loader::ConfigDocument;
pub use normalize::MergedService;
pub use relations::{DependencyEdge, ExtractOptions, RelationTable};

/// Switches controlling a resolution run.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Expand `${VAR}` references in extracted strings.
    pub expand_vars: bool,
    /// Resolve relative volume host paths to absolute ones at render time.
    pub resolve_relative_volumes: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            expand_vars: true,
            resolve_relative_volumes: false,
        }
    }
}

/// The fully resolved relational model of one compose tree.
///
/// Owns the merged service list and the four derived tables; the graph
/// renderer consumes this in-process, there is no wire format.
#[derive(Debug)]
pub struct ComposeModel {
    /// Path of the top-level compose file.
    pub source: PathBuf,
    /// Merged, normalized services in first-seen order.
    pub services: Vec<MergedService>,
    /// `service -> ports` (raw strings).
    pub ports: RelationTable,
    /// `service -> volumes` (raw strings).
    pub volumes: RelationTable,
    /// `service -> networks` (raw strings).
    pub networks: RelationTable,
    /// `service -> dependency edges`; dependency-free services are absent.
    pub depends_on: IndexMap<String, Vec<DependencyEdge>>,
    /// Options the model was resolved with; the renderer honors them too.
    pub options: ResolveOptions,
}

impl ComposeModel {
    /// Resolve `path` and every included document into a relational model.
    ///
    /// # Errors
    ///
    /// Propagates loader errors (missing file, parse failure, include
    /// cycle) and normalization errors (unrecognized field shapes); all are
    /// fatal for the run.
    pub fn resolve(path: &Path, options: ResolveOptions) -> Result<Self> {
        let documents = loader::load(path)?;
        debug!(documents = documents.len(), "loaded compose tree");

        let services = normalize::normalize(&documents)?;

        let extract = ExtractOptions {
            expand_vars: options.expand_vars,
        };

        Ok(Self {
            source: path.to_path_buf(),
            ports: relations::port_mappings(&services, extract),
            volumes: relations::volume_mappings(&services, extract),
            networks: relations::network_mappings(&services, extract),
            depends_on: relations::depends_on_mappings(&services),
            services,
            options,
        })
    }

    /// All dependency edges, flattened.
    pub fn dependency_edges(&self) -> Vec<DependencyEdge> {
        self.depends_on.values().flatten().cloned().collect()
    }

    /// Dump the merged service set as a YAML mapping, mainly for
    /// inspection and debugging.
    pub fn services_as_yaml(&self) -> serde_yaml::Result<String> {
        let mut root = serde_yaml::Mapping::new();
        let mut services = serde_yaml::Mapping::new();
        for service in &self.services {
            services.insert(
                serde_yaml::Value::String(service.name.clone()),
                serde_yaml::Value::Mapping(service.config.clone()),
            );
        }
        root.insert(
            serde_yaml::Value::String("services".to_string()),
            serde_yaml::Value::Mapping(services),
        );
        serde_yaml::to_string(&root)
    }
}
