//! compose-graph — render docker-compose configuration trees as Graphviz
//! dependency graphs.
//!
//! A compose deployment is rarely one file: a main `docker-compose.yaml`
//! pulls in overrides and sibling stacks through the top-level `include`
//! key, and the same service is declared in pieces across several of them.
//! This crate resolves that tree into a single relational model and draws
//! it:
//!
//! 1. [`compose::loader`] loads the file and follows `include` directives
//!    recursively (pre-order, depth-first, cycle-guarded)
//! 2. [`compose::merge`] deep-merges service fragments — lists union in
//!    order, scalars take the later value, and the `!override` / `!reset`
//!    tags ([`compose::tags`]) force replace/clear semantics
//! 3. [`compose::normalize`] conforms the polymorphic `environment` and
//!    `depends_on` fields to one canonical shape each
//! 4. [`compose::relations`] projects the merged services into port,
//!    volume, network, and dependency tables
//! 5. [`graph`] turns the model into a clustered DOT digraph
//!
//! # Example
//!
//! ```rust,no_run
//! use compose_graph::compose::{ComposeModel, ResolveOptions};
//! use compose_graph::graph::dot;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let model = ComposeModel::resolve(
//!     Path::new("docker-compose.yaml"),
//!     ResolveOptions::default(),
//! )?;
//! println!("{}", dot::render(&model));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod compose;
pub mod core;
pub mod expand;
pub mod graph;

pub use crate::core::{ComposeGraphError, Result};
