//! Document model and parser for UP documents.
//!
//! UP is a line-oriented configuration language. A document is an ordered
//! list of nodes, each a key with an optional `!annotation` and a value:
//!
//! ```text
//! name John Doe
//! age!int 30
//! website: https://example.com   # line-oriented syntax
//! server {
//!   host localhost
//! }
//! ```

use std::fmt;
use std::io;

use indexmap::IndexMap;
use thiserror::Error;

mod line;
mod parser;
mod scanner;

pub use line::{split_entry, Entry};
pub use parser::{dedent_lines, DedentFn, LinePredicate, Parser, DEFAULT_MAX_DEPTH};
pub use scanner::{Line, Scanner};

/// Key of the node produced by a top-level `!use` line.
pub const USE_KEY: &str = "_use";
/// Key of the node produced by a top-level `!lint` line.
pub const LINT_KEY: &str = "_lint";
/// Annotation carried by directive nodes.
pub const DIRECTIVE_ANNOTATION: &str = "directive";

// ============================================================================
// Document
// ============================================================================

/// A parsed UP document: nodes in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// First node with the given key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.key == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// A key, its optional type annotation, and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub key: String,
    pub annotation: Option<String>,
    pub value: Value,
}

impl Node {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            annotation: None,
            value,
        }
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    /// True for the `_use` / `_lint` nodes produced by top-level directives.
    pub fn is_directive(&self) -> bool {
        self.annotation() == Some(DIRECTIVE_ANNOTATION)
    }
}

// ============================================================================
// Values
// ============================================================================

/// Block entries in insertion order. Re-inserting a key replaces its value
/// and keeps its original position.
pub type Block = IndexMap<String, Value>;

/// A value in a UP document. Scalars are opaque text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(String),
    Block(Block),
    List(Vec<Value>),
    Table(Table),
    UseDirective { namespaces: Vec<String> },
}

/// Table value: column names and rows of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Value {
    pub fn scalar(text: impl Into<String>) -> Self {
        Value::Scalar(text.into())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Value::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Block(_) => "block",
            Value::List(_) => "list",
            Value::Table(_) => "table",
            Value::UseDirective { .. } => "use directive",
        }
    }
}

/// Renders the value in UP inline syntax. Scalars render as their text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => f.write_str(s),
            Value::Block(block) => {
                f.write_str("{")?;
                for (i, (key, value)) in block.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key} {value}")?;
                }
                f.write_str("}")
            }
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Table(table) => {
                write!(f, "{{columns [{}], rows [", table.columns.join(", "))?;
                for (i, row) in table.rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "[{}]", row.join(", "))?;
                }
                f.write_str("]}")
            }
            Value::UseDirective { namespaces } => write!(f, "[{}]", namespaces.join(", ")),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Scalar(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Scalar(text)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("directive error at line {line}: {message}")]
    Directive { line: usize, message: String },

    #[error("nesting deeper than {max_depth} levels at line {line}")]
    TooDeep { line: usize, max_depth: usize },

    #[error("failed to read line {line}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },
}

impl ParseError {
    /// 1-based source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            ParseError::Syntax { line, .. }
            | ParseError::Directive { line, .. }
            | ParseError::TooDeep { line, .. }
            | ParseError::Io { line, .. } => *line,
        }
    }

    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn directive(line: usize, message: impl Into<String>) -> Self {
        ParseError::Directive {
            line,
            message: message.into(),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a document with the default parser configuration.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    Parser::new().parse_str(source)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lookup_by_key() {
        let doc = Document::new(vec![
            Node::new("name", Value::scalar("first")),
            Node::new("name", Value::scalar("second")),
            Node::new("port", Value::scalar("80")).with_annotation("int"),
        ]);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.get("name").unwrap().value, Value::scalar("first"));
        assert_eq!(doc.get("port").unwrap().annotation(), Some("int"));
        assert!(doc.get("missing").is_none());
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["name", "name", "port"]);
    }

    #[test]
    fn display_renders_inline_syntax() {
        let mut block = Block::new();
        block.insert("host".to_string(), Value::scalar("localhost"));
        block.insert(
            "tags".to_string(),
            Value::List(vec![Value::scalar("a"), Value::scalar("b")]),
        );
        assert_eq!(Value::Block(block).to_string(), "{host localhost, tags [a, b]}");

        let table = Table {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![vec!["1".to_string(), "x".to_string()]],
        };
        assert_eq!(
            Value::Table(table).to_string(),
            "{columns [id, name], rows [[1, x]]}"
        );
    }

    #[test]
    fn error_reports_line() {
        let err = ParseError::syntax(7, "missing key");
        assert_eq!(err.line(), 7);
        assert_eq!(err.to_string(), "syntax error at line 7: missing key");
    }
}
