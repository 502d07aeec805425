//! Variable harvesting and `$vars.path` substitution.

use crate::error::{Result, UpError};
use indexmap::IndexMap;
use uplang_ast::{Block, Document, Table, Value};

/// Prefix of a variable reference inside a scalar.
pub const VAR_MARKER: &str = "$vars.";

/// Name of the top-level block that declares variables.
pub const VARS_KEY: &str = "vars";

/// Dotted variable path → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vars {
    entries: IndexMap<String, Value>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.get(path)
    }

    /// Record a value. Blocks are also flattened into their dotted leaves.
    pub fn insert(&mut self, path: impl Into<String>, value: Value) {
        let path = path.into();
        if let Value::Block(block) = &value {
            self.flatten(block, &path);
        }
        self.entries.insert(path, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Record every entry of the document's top-level `vars` blocks.
    pub fn harvest(&mut self, document: &Document) {
        for node in document.iter().filter(|node| node.key == VARS_KEY) {
            if let Value::Block(block) = &node.value {
                self.flatten(block, "");
            }
        }
    }

    fn flatten(&mut self, block: &Block, prefix: &str) {
        for (key, value) in block {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            self.insert(path, value.clone());
        }
    }

    /// Re-resolve every entry against the map until nothing changes.
    ///
    /// Returns the number of passes taken. Failing to converge within
    /// `max_iterations`, or converging on a value that still references a
    /// known path, means the variables reference each other in a cycle.
    pub fn resolve_to_fixpoint(&mut self, max_iterations: usize) -> Result<usize> {
        for iteration in 1..=max_iterations {
            let mut changed = Vec::new();
            let resolved: IndexMap<String, Value> = self
                .entries
                .iter()
                .map(|(path, value)| {
                    let next = self.substitute(value);
                    if next != *value {
                        changed.push(path.clone());
                    }
                    (path.clone(), next)
                })
                .collect();
            self.entries = resolved;

            if changed.is_empty() {
                let unresolved: Vec<String> = self
                    .entries
                    .iter()
                    .filter(|(_, value)| self.references_known(value))
                    .map(|(path, _)| path.clone())
                    .collect();
                if !unresolved.is_empty() {
                    return Err(UpError::CircularVariable {
                        iterations: iteration,
                        unresolved,
                    });
                }
                return Ok(iteration);
            }
            if iteration == max_iterations {
                return Err(UpError::CircularVariable {
                    iterations: max_iterations,
                    unresolved: changed,
                });
            }
        }

        Err(UpError::CircularVariable {
            iterations: max_iterations,
            unresolved: self.entries.keys().cloned().collect(),
        })
    }

    /// True when a scalar or table cell inside `value` still mentions a path
    /// present in the map.
    fn references_known(&self, value: &Value) -> bool {
        match value {
            Value::Scalar(text) => self.text_references_known(text),
            Value::Block(block) => block.values().any(|v| self.references_known(v)),
            Value::List(items) => items.iter().any(|v| self.references_known(v)),
            Value::Table(table) => table
                .rows
                .iter()
                .flatten()
                .any(|cell| self.text_references_known(cell)),
            Value::UseDirective { .. } => false,
        }
    }

    fn text_references_known(&self, text: &str) -> bool {
        text.match_indices(VAR_MARKER).any(|(start, _)| {
            let rest = &text[start + VAR_MARKER.len()..];
            let path = &rest[..reference_len(rest)];
            !path.is_empty() && self.entries.contains_key(path)
        })
    }

    /// Substitute references throughout a value.
    pub fn substitute(&self, value: &Value) -> Value {
        match value {
            Value::Scalar(text) => self.substitute_str(text),
            Value::Block(block) => Value::Block(
                block
                    .iter()
                    .map(|(k, v)| (k.clone(), self.substitute(v)))
                    .collect(),
            ),
            Value::List(items) => Value::List(items.iter().map(|v| self.substitute(v)).collect()),
            Value::Table(table) => Value::Table(Table {
                columns: table.columns.clone(),
                rows: table
                    .rows
                    .iter()
                    .map(|row| row.iter().map(|cell| self.splice(cell)).collect())
                    .collect(),
            }),
            Value::UseDirective { .. } => value.clone(),
        }
    }

    /// A string that is exactly one known reference yields the referenced
    /// value as-is, keeping blocks and lists structured. Anything else is
    /// spliced as text.
    pub fn substitute_str(&self, text: &str) -> Value {
        if !text.contains(VAR_MARKER) {
            return Value::Scalar(text.to_string());
        }

        if let Some(path) = text.strip_prefix(VAR_MARKER) {
            if reference_len(path) == path.len() {
                if let Some(value) = self.entries.get(path) {
                    return value.clone();
                }
            }
        }

        Value::Scalar(self.splice(text))
    }

    /// Replace each known reference with its text, left to right. Inserted
    /// text is not rescanned; unknown references stay verbatim.
    fn splice(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(VAR_MARKER) {
            let path_start = start + VAR_MARKER.len();
            let path = &rest[path_start..path_start + reference_len(&rest[path_start..])];
            let end = path_start + path.len();

            output.push_str(&rest[..start]);
            match self.entries.get(path) {
                Some(value) if !path.is_empty() => output.push_str(&value.to_string()),
                _ => output.push_str(&rest[start..end]),
            }
            rest = &rest[end..];
        }

        output.push_str(rest);
        output
    }
}

/// Byte length of the variable path at the start of `text`: ASCII letters,
/// digits, `_` and `.`, without trailing dots.
fn reference_len(text: &str) -> usize {
    let run = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(text.len());
    text[..run].trim_end_matches('.').len()
}
