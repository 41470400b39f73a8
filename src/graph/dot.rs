//! Graphviz DOT emission for a resolved compose model.
//!
//! Produces a left-to-right digraph on a dark background with one cluster
//! per concern: a Services cluster holding one sub-cluster and record node
//! per service, and a Host cluster holding the Exposed Ports, Mounted
//! Volumes and Networks clusters. Edges run from each resource node to the
//! record field of the service consuming it; `depends_on` edges connect
//! services directly and carry their readiness condition as the edge label.
//!
//! Emitted by hand rather than through petgraph's `Dot` writer, which has
//! no subgraph/cluster support.

use std::fmt::Write as _;
use std::path::Path;

use crate::compose::ComposeModel;
use crate::core::Result;

const FONTNAME: &str = "Helvetica";
const BGCOLOR: &str = "#2f2f2f";
const ALPHA: &str = "10";

const COLOR_SERVICES: &str = "#FF00FF";
const COLOR_HOST: &str = "#FFFF00";
const COLOR_PORTS: &str = "#FFFFFF";
const COLOR_VOLUMES: &str = "#00FFFF";
const COLOR_NETWORKS: &str = "#FFA500";
const COLOR_DEPENDS_ON: &str = "yellow";

/// Render the model as DOT text.
pub fn render(model: &ComposeModel) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "digraph compose {{");
    let _ = writeln!(out, "  label={};", quote(&model.source.display().to_string()));
    let _ = writeln!(
        out,
        "  rankdir=LR; bgcolor={}; fontname={}; splines=line;",
        quote(BGCOLOR),
        quote(FONTNAME)
    );
    let _ = writeln!(out, "  pad=1.5; nodesep=0.3; ranksep=10;");

    services_cluster(&mut out, model);
    host_cluster(&mut out, model);
    resource_edges(&mut out, model);

    let _ = writeln!(out, "}}");
    out
}

/// Render the model and write it to `path`.
pub fn write_dot(model: &ComposeModel, path: &Path) -> Result<()> {
    std::fs::write(path, render(model))?;
    Ok(())
}

fn services_cluster(out: &mut String, model: &ComposeModel) {
    let _ = writeln!(out, "  subgraph cluster_services {{");
    let _ = writeln!(
        out,
        "    label=\"Services\"; fontsize=40; rankdir=TB; style=\"filled,rounded\";"
    );
    let _ = writeln!(
        out,
        "    color={c}; fontcolor={c}; fillcolor={f};",
        c = quote(COLOR_SERVICES),
        f = quote(&format!("{COLOR_SERVICES}{ALPHA}"))
    );

    for service in &model.services {
        let id = service_node_id(&service.name);
        let _ = writeln!(
            out,
            "    subgraph {} {{",
            quote(&format!("cluster_service_{}", service.name))
        );
        let _ = writeln!(
            out,
            "      label={}; style=\"filled,rounded\"; color=\"white\"; fontcolor=\"white\";",
            quote(&service.name)
        );
        let _ = writeln!(
            out,
            "      {} [shape=Mrecord, style=filled, color=\"#0A0A0A\", fillcolor=\"#A0A0A0\", label={}];",
            quote(&id),
            quote(&service_label(service, model))
        );
        let _ = writeln!(out, "    }}");
    }

    // depends_on edges live inside the services cluster
    for edges in model.depends_on.values() {
        for edge in edges {
            let mut attrs = format!(
                "color={}, style=bold, dir=both, arrowhead=dot, arrowtail=dot",
                quote(COLOR_DEPENDS_ON)
            );
            if let Some(condition) = &edge.condition {
                let _ = write!(attrs, ", label={}, fontcolor={}", quote(condition), quote(COLOR_DEPENDS_ON));
            }
            let _ = writeln!(
                out,
                "    {} -> {} [{attrs}];",
                quote(&service_node_id(&edge.depends_on)),
                quote(&service_node_id(&edge.service)),
            );
        }
    }

    let _ = writeln!(out, "  }}");
}

fn host_cluster(out: &mut String, model: &ComposeModel) {
    let _ = writeln!(out, "  subgraph cluster_host {{");
    let _ = writeln!(
        out,
        "    label=\"Host\"; fontsize=40; rankdir=TB; style=\"filled,rounded\";"
    );
    let _ = writeln!(
        out,
        "    color={c}; fontcolor={c}; fillcolor={f};",
        c = quote(COLOR_HOST),
        f = quote(&format!("{COLOR_HOST}{ALPHA}"))
    );

    concern_cluster(out, "cluster_ports", "Exposed Ports", COLOR_PORTS, |out| {
        for (service, mappings) in &model.ports {
            for mapping in mappings {
                let (host, _) = split_port(mapping);
                let _ = writeln!(
                    out,
                    "      {} [shape=circle, style=filled, color=\"black\", fillcolor={}, label={}];",
                    quote(&port_node_id(service, mapping)),
                    quote(COLOR_PORTS),
                    quote(host)
                );
            }
        }
    });

    concern_cluster(out, "cluster_volumes", "Mounted Volumes", COLOR_VOLUMES, |out| {
        for mappings in model.volumes.values() {
            for mapping in mappings {
                let parts = split_volume(mapping, model.options.resolve_relative_volumes);
                let _ = writeln!(
                    out,
                    "      {} [shape=box, style=\"filled,rounded\", color=\"black\", fillcolor={}];",
                    quote(&parts.host),
                    quote(COLOR_VOLUMES)
                );
            }
        }
    });

    concern_cluster(out, "cluster_networks", "Networks", COLOR_NETWORKS, |out| {
        for mappings in model.networks.values() {
            for network in mappings {
                let _ = writeln!(
                    out,
                    "      {} [shape=box, style=\"filled,rounded\", color=\"black\", fillcolor={}];",
                    quote(network),
                    quote(COLOR_NETWORKS)
                );
            }
        }
    });

    let _ = writeln!(out, "  }}");
}

fn concern_cluster(
    out: &mut String,
    name: &str,
    label: &str,
    color: &str,
    body: impl FnOnce(&mut String),
) {
    let _ = writeln!(out, "    subgraph {name} {{");
    let _ = writeln!(
        out,
        "      label={}; fontsize=40; rankdir=TB; style=\"filled,rounded\";",
        quote(label)
    );
    let _ = writeln!(
        out,
        "      color={c}; fontcolor={c}; fillcolor={f};",
        c = quote(color),
        f = quote(&format!("{color}{ALPHA}"))
    );
    body(out);
    let _ = writeln!(out, "    }}");
}

fn resource_edges(out: &mut String, model: &ComposeModel) {
    for (service, mappings) in &model.ports {
        for mapping in mappings {
            let _ = writeln!(
                out,
                "  {} -> {} [color={}, dir=both, arrowhead=dot, arrowtail=dot];",
                quote(&port_node_id(service, mapping)),
                quote(&service_node_id(service)),
                quote(COLOR_PORTS)
            );
        }
    }

    for (service, mappings) in &model.volumes {
        for mapping in mappings {
            let parts = split_volume(mapping, model.options.resolve_relative_volumes);
            // Read-only mounts get a dashed edge, like the original palette.
            let style = if parts.mode == "ro" { "dashed" } else { "solid" };
            let _ = writeln!(
                out,
                "  {} -> {} [color={}, style={style}, dir=both, arrowhead=dot, arrowtail=dot];",
                quote(&parts.host),
                quote(&service_node_id(service)),
                quote(COLOR_VOLUMES)
            );
        }
    }

    for (service, mappings) in &model.networks {
        for network in mappings {
            let _ = writeln!(
                out,
                "  {} -> {} [color={}, dir=both, arrowhead=dot, arrowtail=dot];",
                quote(network),
                quote(&service_node_id(service)),
                quote(COLOR_NETWORKS)
            );
        }
    }
}

/// Record-shaped label summarizing one service.
fn service_label(service: &crate::compose::MergedService, model: &ComposeModel) -> String {
    let field = |key: &str| -> String {
        service
            .config
            .get(key)
            .and_then(serde_yaml::Value::as_str)
            .map_or_else(|| "-".to_string(), |value| maybe_expand(value, model))
    };

    let command = match service.config.get("command") {
        Some(serde_yaml::Value::String(command)) => command.clone(),
        Some(serde_yaml::Value::Sequence(words)) => words
            .iter()
            .filter_map(serde_yaml::Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => "-".to_string(),
    };

    let container_name = field("container_name");
    let hostname = field("hostname");
    let restart = field("restart");
    let image = field("image");

    let fields = [
        ("service", service.name.as_str()),
        ("container_name", container_name.as_str()),
        ("hostname", hostname.as_str()),
        ("restart", restart.as_str()),
        ("image", image.as_str()),
        ("command", command.as_str()),
    ];

    fields
        .iter()
        .map(|(key, value)| format!("{{{}|{{{}}}}}", escape_record(key), escape_record(value)))
        .collect::<Vec<_>>()
        .join("|")
}

fn maybe_expand(value: &str, model: &ComposeModel) -> String {
    if model.options.expand_vars {
        crate::expand::expand_vars(value)
    } else {
        value.to_string()
    }
}

fn service_node_id(service: &str) -> String {
    format!("service_{service}")
}

fn port_node_id(service: &str, mapping: &str) -> String {
    let (host, container) = split_port(mapping);
    format!("{service}__{host}__{container}")
}

/// `host:container` split on the first colon; a bare port exposes itself.
fn split_port(mapping: &str) -> (&str, &str) {
    mapping.split_once(':').unwrap_or((mapping, mapping))
}

struct VolumeParts {
    host: String,
    mode: String,
}

/// Split `host:container[:mode]`, defaulting the mode to `rw`.
fn split_volume(mapping: &str, resolve_relative: bool) -> VolumeParts {
    let mut parts = mapping.splitn(3, ':');
    let host = parts.next().unwrap_or(mapping);
    let _container = parts.next();
    let mode = parts.next().unwrap_or("rw");

    let host = if resolve_relative && Path::new(host).is_relative() {
        std::path::absolute(host)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| host.to_string())
    } else {
        host.to_string()
    };

    VolumeParts {
        host,
        mode: mode.to_string(),
    }
}

/// Quote a DOT identifier or attribute value.
fn quote(raw: &str) -> String {
    format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Escape Mrecord label metacharacters.
fn escape_record(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
