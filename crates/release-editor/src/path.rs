//! Typed paths into nested JSON documents
//!
//! A [`Path`] is a sequence of key / index segments. Paths parse from the
//! dotted-and-bracketed strings used by form fields
//! (`release_contributors[0].given_name`, `platforms.2`) and drive the
//! [`read`] / [`write`] / [`remove`] accessors over a `serde_json::Value`.
//! Keys that would not survive a display/parse round trip are written in
//! quoted bracket form, `files["v1.0"]`.

use std::fmt::{self, Display, Formatter, Write};
use std::iter::Peekable;
use std::str::{Chars, FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced when parsing a path string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("empty segment in path '{0}'")]
    EmptySegment(String),

    #[error("unclosed '[' in path '{0}'")]
    UnclosedBracket(String),

    #[error("unexpected characters after ']' in path '{0}'")]
    TrailingCharacters(String),
}

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Object member
    Key(String),
    /// Array element
    Index(usize),
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// Location inside a nested document.
///
/// The empty path addresses the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<Segment>);

impl Path {
    /// Empty path (root)
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Parse a dotted / bracketed path string.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        input.parse()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Path without its last segment (if not root)
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, parents)| Self(parents.to_vec()))
    }

    /// Append a segment, returning new path
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }
}

impl<S: Into<Segment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

fn is_index(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) || (s.len() > 1 && s.starts_with('0'))
    {
        return None;
    }
    s.parse().ok()
}

fn bare_segment(name: String) -> Segment {
    match is_index(&name) {
        Some(i) => Segment::Index(i),
        None => Segment::Key(name),
    }
}

/// Keys that only survive a display/parse round trip inside `["..."]`.
fn needs_quotes(key: &str) -> bool {
    key.is_empty() || is_index(key).is_some() || key.contains(['.', '[', ']', '"', '\'', '\\'])
}

/// Body of a `[...]` group, the opening bracket already consumed.
///
/// Quoted content (`"..."` or `'...'`) is always a key and may contain any
/// character; `\` escapes the next one.
fn parse_bracket(chars: &mut Peekable<Chars<'_>>, input: &str) -> Result<Segment, PathError> {
    let unclosed = || PathError::UnclosedBracket(input.to_string());

    if let Some(quote @ ('"' | '\'')) = chars.peek().copied() {
        chars.next();
        let mut key = String::new();
        loop {
            match chars.next().ok_or_else(unclosed)? {
                '\\' => key.push(chars.next().ok_or_else(unclosed)?),
                c if c == quote => break,
                c => key.push(c),
            }
        }
        return match chars.next() {
            Some(']') => Ok(Segment::Key(key)),
            Some(_) => Err(PathError::TrailingCharacters(input.to_string())),
            None => Err(unclosed()),
        };
    }

    let mut content = String::new();
    loop {
        match chars.next().ok_or_else(unclosed)? {
            ']' => break,
            c => content.push(c),
        }
    }
    if content.is_empty() {
        return Err(PathError::EmptySegment(input.to_string()));
    }
    Ok(bare_segment(content))
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }

        let mut chars = input.chars().peekable();
        let mut segments = Vec::new();
        loop {
            let mut name = String::new();
            while let Some(c) = chars.next_if(|c| *c != '.' && *c != '[') {
                name.push(c);
            }
            let bracketed = chars.peek() == Some(&'[');
            if name.is_empty() && !bracketed {
                return Err(PathError::EmptySegment(input.to_string()));
            }
            if !name.is_empty() {
                segments.push(bare_segment(name));
            }
            while chars.next_if_eq(&'[').is_some() {
                segments.push(parse_bracket(&mut chars, input)?);
            }
            match chars.next() {
                None => break,
                Some('.') => continue,
                Some(_) => return Err(PathError::TrailingCharacters(input.to_string())),
            }
        }
        Ok(Self(segments))
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Index(idx) => write!(f, "[{}]", idx)?,
                Segment::Key(key) if needs_quotes(key) => {
                    f.write_str("[\"")?;
                    for c in key.chars() {
                        if c == '"' || c == '\\' {
                            f.write_char('\\')?;
                        }
                        f.write_char(c)?;
                    }
                    f.write_str("\"]")?
                }
                Segment::Key(key) if i == 0 => write!(f, "{}", key)?,
                Segment::Key(key) => write!(f, ".{}", key)?,
            }
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

/// Resolve `path` against `root`.
///
/// Returns `None` when a segment is missing or addresses the wrong kind of
/// container.
pub fn read<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Index(i), Value::Array(items)) => items.get(*i),
            _ => None,
        })
}

/// Mutable counterpart of [`read`]. Never creates anything.
pub fn read_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.get_mut(key),
            (Segment::Index(i), Value::Array(items)) => items.get_mut(*i),
            _ => None,
        })
}

/// Step into `segment`, turning `node` into the right kind of container and
/// creating the child slot if needed.
fn step_mut<'a>(node: &'a mut Value, segment: &Segment) -> &'a mut Value {
    match segment {
        Segment::Key(key) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            match node {
                Value::Object(map) => map.entry(key.clone()).or_insert(Value::Null),
                _ => unreachable!("node was normalised to an object"),
            }
        }
        Segment::Index(index) => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            match node {
                Value::Array(items) => {
                    if items.len() <= *index {
                        items.resize(*index + 1, Value::Null);
                    }
                    &mut items[*index]
                }
                _ => unreachable!("node was normalised to an array"),
            }
        }
    }
}

/// Set `value` at `path`, creating intermediate containers on the way.
///
/// Sibling members of every container along the path are left in place.
/// Writing the root path replaces `root`.
pub fn write(root: &mut Value, path: &Path, value: Value) {
    let slot = path
        .segments()
        .iter()
        .fold(root, |node, segment| step_mut(node, segment));
    *slot = value;
}

/// Detach the value at `path`, returning it.
///
/// Removing an array element shifts the following elements down.
pub fn remove(root: &mut Value, path: &Path) -> Option<Value> {
    let (last, _) = path.segments().split_last()?;
    let parent = read_mut(root, &path.parent()?)?;
    match (last, parent) {
        (Segment::Key(key), Value::Object(map)) => map.remove(key),
        (Segment::Index(i), Value::Array(items)) if *i < items.len() => Some(items.remove(*i)),
        _ => None,
    }
}
