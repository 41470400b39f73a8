//! Relation extraction over the normalized service set.
//!
//! Four independent pure projections, each keyed by service name in
//! first-seen order: port mappings, volume mappings, network memberships,
//! and dependency edges. The string tables keep raw entries exactly as
//! declared (`"8080:80"`, `"./host:/container:ro"`, `"mynet"`) — source
//! order preserved, no deduplication, no structural splitting; parsing into
//! host/container/mode parts is a rendering concern.
//!
//! With [`ExtractOptions::expand_vars`] enabled, every string leaving an
//! extractor is `${VAR}`-expanded before the renderer sees it.

use indexmap::IndexMap;
use serde_yaml::Value;
use tracing::debug;

use super::normalize::MergedService;
use super::tags::sequence_entries;
use crate::expand::expand_vars;

/// Mapping from service name to its raw string entries, insertion-ordered.
pub type RelationTable = IndexMap<String, Vec<String>>;

/// One edge of the service dependency relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    /// The dependent service.
    pub service: String,
    /// The service it depends on.
    pub depends_on: String,
    /// Readiness gate, e.g. `service_healthy`; `None` when the source
    /// schema was a bare list.
    pub condition: Option<String>,
}

/// Extraction switches shared by the string-table extractors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Expand `${VAR}` references in extracted entries.
    pub expand_vars: bool,
}

/// `service -> ports`, defaulting to an empty list when absent.
pub fn port_mappings(services: &[MergedService], options: ExtractOptions) -> RelationTable {
    string_table(services, "ports", options)
}

/// `service -> volumes`, defaulting to an empty list when absent.
pub fn volume_mappings(services: &[MergedService], options: ExtractOptions) -> RelationTable {
    string_table(services, "volumes", options)
}

/// `service -> networks`, defaulting to an empty list when absent.
pub fn network_mappings(services: &[MergedService], options: ExtractOptions) -> RelationTable {
    string_table(services, "networks", options)
}

/// `service -> dependency edges`, from the normalized `depends_on` mapping.
///
/// Services without dependencies are omitted entirely — "no dependency" is
/// not representable as an empty entry, so downstream edge drawing never
/// confuses it with a cleared one.
pub fn depends_on_mappings(services: &[MergedService]) -> IndexMap<String, Vec<DependencyEdge>> {
    let mut table = IndexMap::new();

    for service in services {
        let Some(depends_on) = service.config.get("depends_on").and_then(Value::as_mapping)
        else {
            continue;
        };
        if depends_on.is_empty() {
            continue;
        }

        let edges: Vec<DependencyEdge> = depends_on
            .iter()
            .filter_map(|(dependency, gate)| {
                let dependency = dependency.as_str()?;
                let condition = gate
                    .as_mapping()
                    .and_then(|gate| gate.get("condition"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Some(DependencyEdge {
                    service: service.name.clone(),
                    depends_on: dependency.to_string(),
                    condition,
                })
            })
            .collect();

        table.insert(service.name.clone(), edges);
    }

    table
}

fn string_table(
    services: &[MergedService],
    field: &str,
    options: ExtractOptions,
) -> RelationTable {
    let mut table = RelationTable::new();

    for service in services {
        let entries = service
            .config
            .get(field)
            .and_then(sequence_entries)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| string_entry(entry, field, &service.name))
                    .map(|entry| {
                        if options.expand_vars {
                            expand_vars(&entry)
                        } else {
                            entry
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        table.insert(service.name.clone(), entries);
    }

    table
}

/// Render one table entry as a string.
///
/// Compose allows bare numbers where strings are expected (`ports: [8080]`),
/// so numbers are formatted; structured (long-syntax) entries are skipped.
fn string_entry(entry: &Value, field: &str, service: &str) -> Option<String> {
    match entry {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => {
            debug!(service, field, ?other, "skipping non-string entry");
            None
        }
    }
}
