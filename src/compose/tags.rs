//! Custom YAML tags recognized in compose files.
//!
//! Two tags carry merge directives through the configuration:
//!
//! - `!override` on a sequence — when merged over an existing value, the
//!   tagged sequence *replaces* it instead of extending it
//! - `!reset` on a mapping — signals "clear this key's contents" rather
//!   than "merge into it"
//!
//! Both ride on [`serde_yaml::Value::Tagged`], so a parse → serialize →
//! parse round-trip reproduces the tag, the container type, and the entries
//! exactly. Untagged sequences and mappings never classify as either tag.

use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Sequence, Value};

/// Tag marking a sequence that replaces rather than extends on merge.
pub const OVERRIDE_TAG: &str = "override";

/// Tag marking a mapping that clears the target key on merge.
pub const RESET_TAG: &str = "reset";

/// Merge-relevant classification of a YAML value.
///
/// Computed once per value at the top of the merge dispatch, so the merge
/// engine pattern-matches on a closed set of variants instead of probing
/// tags throughout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TagShape<'a> {
    /// An `!override`-tagged sequence; replaces wholesale.
    Override(&'a Sequence),
    /// A `!reset`-tagged mapping; clears the target.
    Reset(&'a Mapping),
    /// Any untagged (or unrecognized-tag) value; plain merge rules apply.
    Plain(&'a Value),
}

/// Classify a value by its merge-relevant tag.
pub fn classify(value: &Value) -> TagShape<'_> {
    match value {
        Value::Tagged(tagged) if tagged.tag == OVERRIDE_TAG => match &tagged.value {
            Value::Sequence(seq) => TagShape::Override(seq),
            other => TagShape::Plain(other),
        },
        Value::Tagged(tagged) if tagged.tag == RESET_TAG => match &tagged.value {
            Value::Mapping(map) => TagShape::Reset(map),
            other => TagShape::Plain(other),
        },
        other => TagShape::Plain(other),
    }
}

/// Build an `!override`-tagged sequence value.
pub fn override_array(items: Sequence) -> Value {
    Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(OVERRIDE_TAG),
        value: Value::Sequence(items),
    }))
}

/// Build a `!reset`-tagged mapping value.
pub fn reset_marker(fields: Mapping) -> Value {
    Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(RESET_TAG),
        value: Value::Mapping(fields),
    }))
}

/// The inner sequence of an `!override`-tagged value, if that is what
/// `value` is.
pub fn as_override_array(value: &Value) -> Option<&Sequence> {
    match classify(value) {
        TagShape::Override(seq) => Some(seq),
        _ => None,
    }
}

/// The inner mapping of a `!reset`-tagged value, if that is what `value` is.
pub fn as_reset_marker(value: &Value) -> Option<&Mapping> {
    match classify(value) {
        TagShape::Reset(map) => Some(map),
        _ => None,
    }
}

/// View a value as a sequence, looking through an `!override` tag.
///
/// Services declared in a single document are never folded through the
/// merge engine, so a tagged sequence can survive into the merged config;
/// extractors use this to read `ports` and friends either way.
pub fn sequence_entries(value: &Value) -> Option<&Sequence> {
    match value {
        Value::Sequence(seq) => Some(seq),
        other => as_override_array(other),
    }
}
