//! Template engine: composes a document with its base, includes, overlays
//! and patches, then resolves `$vars` references.

use crate::error::{Result, UpError};
use crate::json::value_from_json;
use crate::merge::Merger;
use crate::options::TemplateOptions;
use crate::patch::apply_patches;
use crate::template_loader::{LoadedSource, TemplateLoader};
use crate::vars::Vars;
use std::path::Path;
use uplang_ast::{Block, Document, Node, Parser, Value};

/// Processes UP documents with template directives.
///
/// Each engine owns its variable map and include chain; both are reset at
/// the start of every `process*` call.
#[derive(Debug, Default)]
pub struct TemplateEngine {
    parser: Parser,
    options: TemplateOptions,
    initial_vars: Vars,
    vars: Vars,
    loader: TemplateLoader,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: TemplateOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a custom parser for every document the engine reads.
    pub fn with_parser(mut self, parser: Parser) -> Self {
        self.parser = parser;
        self
    }

    /// Seed variables available to every document.
    pub fn with_vars<K: Into<String>>(mut self, vars: impl IntoIterator<Item = (K, Value)>) -> Self {
        for (path, value) in vars {
            self.initial_vars.insert(path, value);
        }
        self
    }

    /// Seed variables from a JSON object.
    pub fn with_json_vars(self, data: serde_json::Value) -> Result<Self> {
        match value_from_json(data) {
            Value::Block(block) => Ok(self.with_vars(block)),
            other => Err(UpError::TypeError {
                message: format!("variables must be an object, got {}", other.type_name()),
            }),
        }
    }

    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    /// Variables as resolved by the last call.
    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    /// Load and process a file. References inside it resolve against the
    /// file's own directory.
    pub fn process_file(&mut self, path: impl AsRef<Path>) -> Result<Document> {
        self.begin();
        let loaded = self.loader.load_path(path.as_ref())?;
        self.process_loaded(loaded, self.default_merger())
    }

    /// Parse and process source text; references resolve against
    /// `options.base_dir`.
    pub fn process_str(&mut self, source: &str) -> Result<Document> {
        let document = self.parser.parse_str(source)?;
        self.process(&document)
    }

    /// Process an already parsed document.
    pub fn process(&mut self, document: &Document) -> Result<Document> {
        self.begin();
        let base_dir = self.options.base_dir.clone();
        let composed = self.compose_document(document, &base_dir, self.default_merger())?;
        self.resolve(&composed)
    }

    fn begin(&mut self) {
        self.vars = self.initial_vars.clone();
        self.loader.clear();
    }

    fn default_merger(&self) -> Merger {
        Merger::new(self.options.merge_strategy, self.options.list_strategy)
    }

    fn process_reference(&mut self, base_dir: &Path, reference: &str, merger: Merger) -> Result<Document> {
        let loaded = self.loader.load(base_dir, reference)?;
        self.process_loaded(loaded, merger)
    }

    /// Compose a loaded file and resolve it with the variables known so far.
    /// References to variables declared further up stay verbatim for the
    /// including document to resolve.
    fn process_loaded(&mut self, loaded: LoadedSource, merger: Merger) -> Result<Document> {
        tracing::debug!(
            path = %loaded.path.display(),
            depth = self.loader.depth(),
            "loading document"
        );
        let document =
            self.parser
                .parse_str(&loaded.source)
                .map_err(|source| UpError::FileParseError {
                    path: loaded.path.clone(),
                    source,
                })?;

        self.loader.push_include(&loaded.path);
        let composed = self.compose_document(&document, loaded.dir(), merger);
        self.loader.pop_include();

        self.resolve(&composed?)
    }

    /// Merge a document with its processed base and includes and harvest
    /// its variables. Its own references are left for `resolve`.
    fn compose_document(&mut self, document: &Document, base_dir: &Path, inherited: Merger) -> Result<Document> {
        let directives = Directives::extract(document)?;
        let merger = directives.merger(inherited)?;

        let base = match &directives.base {
            Some(reference) => {
                tracing::debug!(base = %reference, "processing base");
                Some(self.process_reference(base_dir, reference, merger)?)
            }
            None => None,
        };

        let mut includes = Vec::with_capacity(directives.includes.len());
        for reference in &directives.includes {
            tracing::debug!(include = %reference, "processing include");
            includes.push(self.process_reference(base_dir, reference, merger)?);
        }

        let own = Document::new(directives.own);

        if let Some(base) = &base {
            self.vars.harvest(base);
        }
        for include in &includes {
            self.vars.harvest(include);
        }
        self.vars.harvest(&own);

        let mut merged = base.unwrap_or_default();
        for include in &includes {
            merged = merger.merge_documents(&merged, include);
        }
        merged = merger.merge_documents(&merged, &own);

        for (key, value) in &directives.overlays {
            tracing::debug!(key = %key, "applying overlay");
            merged = merger.merge_into_document(&merged, key, value);
        }

        if !directives.patches.is_empty() {
            tracing::debug!(count = directives.patches.len(), "applying patches");
            merged = apply_patches(&merged, &directives.patches);
        }

        Ok(merged)
    }

    /// Resolve the variable map, then substitute references in the composed
    /// document.
    fn resolve(&mut self, composed: &Document) -> Result<Document> {
        let iterations = self.vars.resolve_to_fixpoint(self.options.max_iterations)?;
        tracing::debug!(iterations, vars = self.vars.len(), "variables resolved");

        Ok(Document::new(
            composed
                .iter()
                .map(|node| Node {
                    key: node.key.clone(),
                    annotation: node.annotation.clone(),
                    value: self.vars.substitute(&node.value),
                })
                .collect(),
        ))
    }
}

/// Top-level template directives of one document, separated from its own nodes.
#[derive(Debug, Default)]
struct Directives {
    base: Option<String>,
    includes: Vec<String>,
    overlays: Vec<(String, Value)>,
    patches: Vec<(String, Value)>,
    merges: Vec<Block>,
    own: Vec<Node>,
}

impl Directives {
    fn extract(document: &Document) -> Result<Self> {
        let mut directives = Directives::default();

        for node in document {
            match (node.annotation(), &node.value) {
                (Some("base"), Value::Scalar(reference)) => {
                    directives.base = Some(reference.clone());
                }
                (Some("overlay"), Value::Block(_)) => {
                    directives
                        .overlays
                        .push((node.key.clone(), node.value.clone()));
                }
                (Some("include"), Value::Scalar(reference)) => {
                    directives.includes.push(reference.clone());
                }
                (Some("include"), Value::List(items)) => {
                    for item in items {
                        let reference = item.as_scalar().ok_or_else(|| {
                            UpError::directive(format!(
                                "!include on '{}' lists a {}, expected file paths",
                                node.key,
                                item.type_name()
                            ))
                        })?;
                        directives.includes.push(reference.to_string());
                    }
                }
                (Some("patch"), Value::Block(block)) => {
                    directives
                        .patches
                        .extend(block.iter().map(|(path, value)| (path.clone(), value.clone())));
                }
                (Some("merge"), Value::Block(block)) => {
                    directives.merges.push(block.clone());
                }
                (Some(kind @ ("base" | "overlay" | "include" | "patch" | "merge")), value) => {
                    return Err(UpError::directive(format!(
                        "!{kind} on '{}' cannot take a {}",
                        node.key,
                        value.type_name()
                    )));
                }
                _ => directives.own.push(node.clone()),
            }
        }

        Ok(directives)
    }

    /// Strategies for this document: inherited, then `!merge` overrides.
    fn merger(&self, inherited: Merger) -> Result<Merger> {
        let mut merger = inherited;
        for block in &self.merges {
            if let Some(strategy) = block.get("strategy").and_then(Value::as_scalar) {
                merger.merge_strategy = strategy.parse()?;
            }
            if let Some(strategy) = block.get("list_strategy").and_then(Value::as_scalar) {
                merger.list_strategy = strategy.parse()?;
            }
        }
        Ok(merger)
    }
}
