// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Function identifiers
//!
//! Durations are bucketed by a human-readable identifier rather than by
//! object identity. Free functions are identified by their bare name and
//! anything defined inside an `impl` block by `Type.name`:
//!
//! | Callable                           | Identifier              |
//! |------------------------------------|-------------------------|
//! | `fn get_answer()`                  | `get_answer`            |
//! | `fn call(&self)` on `AnswerFactory`| `AnswerFactory.call`    |
//! | `fn create()` on `AnswerFactory`   | `AnswerFactory.create`  |
//! | closure inside `fn main()`         | `main.<closure>`        |
//!
//! Two callables sharing a qualified name share a bucket.

use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

const CLOSURE_SEGMENT: &str = "{{closure}}";
const CLOSURE_NAME: &str = "<closure>";

/// Identifier a profiled callable records its durations under
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(Cow<'static, str>);

impl FunctionId {
    /// Create an identifier from any string
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    /// Create an identifier from a string literal
    ///
    /// Usable in `static` items, which is how `profiled!` computes each
    /// identifier exactly once.
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Identifier for a method or associated function of `type_name`
    pub fn method(type_name: &str, name: &str) -> Self {
        Self(Cow::Owned(format!("{type_name}.{name}")))
    }

    /// Derive the identifier of a callable from its type
    ///
    /// Works for function items, methods and closures, whose types are
    /// unique and named after their definition path. A function pointer
    /// (`fn() -> u32`) carries no name; use [`FunctionId::new`] for those.
    pub fn of<F>(_callable: &F) -> Self {
        Self::from_type_name(std::any::type_name::<F>())
    }

    /// Derive an identifier from a type path such as
    /// `my_crate::factory::AnswerFactory::call`
    pub fn from_type_name(type_name: &str) -> Self {
        let type_name = type_name.trim();

        if let Some(rest) = type_name.strip_prefix('<') {
            if let Some(close) = matching_angle(rest) {
                // `<Self as Trait>::method`
                let qualified_self = &rest[..close];
                let self_type = split_top_level(qualified_self, " as ")
                    .into_iter()
                    .next()
                    .unwrap_or(qualified_self);
                let owner = last_segment(self_type);
                let tail = rest[close + 1..].trim_start_matches("::");
                let mut parts = vec![owner];
                parts.extend(path_segments(tail));
                return Self(Cow::Owned(parts.join(".")));
            }
        }

        let segments = path_segments(type_name);
        if segments.is_empty() {
            return Self(Cow::Owned(type_name.to_string()));
        }

        let last = segments.len() - 1;
        let mut start = segments[..last]
            .iter()
            .rposition(|segment| is_type_segment(segment))
            .unwrap_or(last);
        while start > 0 && segments[start] == CLOSURE_NAME {
            start -= 1;
        }

        Self(Cow::Owned(segments[start..].join(".")))
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FunctionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FunctionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for FunctionId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

impl From<String> for FunctionId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

/// Split a path on top-level `::`, dropping generic arguments from each
/// segment and renaming closure segments.
fn path_segments(path: &str) -> Vec<String> {
    split_top_level(path, "::")
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if segment == CLOSURE_SEGMENT {
                CLOSURE_NAME.to_string()
            } else {
                strip_generics(segment).to_string()
            }
        })
        .collect()
}

/// Split on `separator` occurrences that are not nested inside `<...>`
fn split_top_level<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut index = 0;

    while index < text.len() {
        let rest = &text[index..];
        if rest.starts_with('<') {
            depth += 1;
        } else if rest.starts_with('>') {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && rest.starts_with(separator) {
            parts.push(&text[start..index]);
            index += separator.len();
            start = index;
            continue;
        }
        index += rest.chars().next().map_or(1, char::len_utf8);
    }
    parts.push(&text[start..]);
    parts
}

/// Byte offset of the `>` closing an already opened `<`
fn matching_angle(text: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (index, ch) in text.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_generics(segment: &str) -> &str {
    match segment.find('<') {
        Some(0) | None => segment,
        Some(index) => &segment[..index],
    }
}

/// Last path segment of a type, without references, generics or `dyn`
fn last_segment(type_path: &str) -> String {
    let trimmed = type_path
        .trim()
        .trim_start_matches('&')
        .trim_start_matches("mut ")
        .trim_start_matches("dyn ");
    path_segments(trimmed)
        .pop()
        .unwrap_or_else(|| trimmed.to_string())
}

fn is_type_segment(segment: &str) -> bool {
    segment.chars().next().is_some_and(char::is_uppercase)
}
