//! UP - a line-oriented configuration document language
//!
//! This crate layers a template engine over the `uplang-ast` parser:
//! - `!base` and `!include` compose documents from other files
//! - `!overlay` and `!patch` adjust the composed result
//! - `!merge` selects how blocks and lists combine
//! - `$vars.path` references resolve against `vars` blocks
//!
//! # Example
//!
//! ```rust
//! use uplang::Value;
//!
//! let doc = uplang::process_str(
//!     "vars {\nhost localhost\n}\nurl http://$vars.host/",
//!     ".",
//! ).unwrap();
//!
//! assert_eq!(doc.get("url").unwrap().value, Value::scalar("http://localhost/"));
//! ```

// Public modules
pub mod engine;
pub mod error;
pub mod json;
pub mod merge;
pub mod options;
pub mod patch;
pub mod template_loader;
pub mod vars;

pub use engine::TemplateEngine;
pub use error::{Result, UpError};
pub use json::{document_to_json, value_from_json, value_to_json};
pub use options::{ListStrategy, MergeStrategy, TemplateOptions};
pub use uplang_ast::{Block, Document, Node, ParseError, Parser, Table, Value};
pub use vars::Vars;

use std::path::{Path, PathBuf};

/// A parsed document that can be processed repeatedly with different
/// variables.
#[derive(Debug, Clone)]
pub struct Template {
    document: Document,
    base_dir: PathBuf,
}

impl Template {
    /// Parse a template whose references resolve against the current
    /// directory.
    ///
    /// # Example
    ///
    /// ```rust
    /// use serde_json::json;
    ///
    /// let tmpl = uplang::Template::parse("name svc-$vars.env").unwrap();
    /// let doc = tmpl.process(json!({"env": "prod"})).unwrap();
    /// assert_eq!(doc.get("name").unwrap().value.as_scalar(), Some("svc-prod"));
    /// ```
    pub fn parse(source: &str) -> Result<Self> {
        Self::parse_with_base_dir(source, ".")
    }

    /// Parse a template whose `!base`/`!include` paths resolve against `base_dir`.
    pub fn parse_with_base_dir(source: &str, base_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            document: uplang_ast::parse(source)?,
            base_dir: base_dir.as_ref().to_path_buf(),
        })
    }

    /// Process the template, seeding variables from a JSON object.
    pub fn process(&self, vars: serde_json::Value) -> Result<Document> {
        let options = TemplateOptions::default().with_base_dir(self.base_dir.clone());
        TemplateEngine::new()
            .with_options(options)
            .with_json_vars(vars)?
            .process(&self.document)
    }

    /// The parsed, unprocessed document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Parse a document without template processing.
pub fn parse(source: &str) -> Result<Document> {
    Ok(uplang_ast::parse(source)?)
}

/// Convenience function: parse and process source text in one call
pub fn process_str(source: &str, base_dir: impl AsRef<Path>) -> Result<Document> {
    Template::parse_with_base_dir(source, base_dir)?.process(serde_json::json!({}))
}

/// Convenience function: load and process a file
///
/// # Example
///
/// ```rust,ignore
/// let doc = uplang::process_file("config/production.up").unwrap();
/// ```
pub fn process_file(path: impl AsRef<Path>) -> Result<Document> {
    TemplateEngine::new().process_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_reuse() {
        let tmpl = Template::parse("greeting hello $vars.name").unwrap();

        let first = tmpl.process(json!({"name": "Alice"})).unwrap();
        assert_eq!(first.get("greeting").unwrap().value, Value::scalar("hello Alice"));

        let second = tmpl.process(json!({"name": "Bob"})).unwrap();
        assert_eq!(second.get("greeting").unwrap().value, Value::scalar("hello Bob"));
    }

    #[test]
    fn test_parse_error_is_wrapped() {
        let err = parse("server {\nhost a").unwrap_err();
        assert!(matches!(err, UpError::ParseError(_)));
    }
}
