//! Deterministic naming of schema-visible types.
//!
//! A synthesized name is a pure function of the property path and the role
//! of the node: every path segment is capitalized and concatenated, then a
//! role tag is appended. `PostType.categories.status` as an enum becomes
//! `PostTypeCategoriesStatusEnum`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::metadata::TypeKind;

static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[_a-zA-Z][_a-zA-Z0-9]*$").expect("Invalid identifier regex")
});

/// Checks a declared name against `^[_a-zA-Z][_a-zA-Z0-9]*$`.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_REGEX.is_match(name)
}

/// Which side of the schema a node appears on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeSide {
    /// Values produced by resolvers.
    Output,
    /// Arguments and input declarations.
    Input,
}

/// Assigns names to anonymous schema-visible nodes.
///
/// Implementations must be pure: the same `(path, kind, side)` always maps to
/// the same name, independent of call order.
pub trait NamingStrategy: Send + Sync {
    /// Returns the schema name for a node of `kind` located at `property_path`.
    fn type_name(&self, property_path: &str, kind: TypeKind, side: TypeSide) -> String;
}

/// Default camel-concatenating strategy with role suffixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNamingStrategy;

impl DefaultNamingStrategy {
    fn role_tag(kind: TypeKind, side: TypeSide) -> &'static str {
        match (kind, side) {
            (TypeKind::Enum, _) => "Enum",
            (TypeKind::Union, _) => "Union",
            (_, TypeSide::Input) => "Input",
            (_, TypeSide::Output) => "Model",
        }
    }
}

impl NamingStrategy for DefaultNamingStrategy {
    fn type_name(&self, property_path: &str, kind: TypeKind, side: TypeSide) -> String {
        let mut name: String = property_path
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(pascal_segment)
            .collect();
        name.push_str(Self::role_tag(kind, side));
        name
    }
}

/// Capitalizes a path segment and drops characters that cannot appear in a
/// schema name.
fn pascal_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut upper_next = true;
    for ch in segment.chars() {
        if ch.is_ascii_alphanumeric() {
            if upper_next {
                out.push(ch.to_ascii_uppercase());
                upper_next = false;
            } else {
                out.push(ch);
            }
        } else if ch == '_' && !out.is_empty() {
            out.push(ch);
        } else {
            upper_next = true;
        }
    }
    out
}

/// Turns an arbitrary literal into an enum item name.
///
/// Valid identifiers are kept as-is; anything else has its invalid
/// characters replaced with `_` and is prefixed with `_` when it would start
/// with a digit.
#[must_use]
pub fn enumerant_name(raw: &str) -> String {
    if is_valid_identifier(raw) {
        return raw.to_string();
    }
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    out
}
