//! Recursive descent parser for UP documents.
//!
//! Reads one line at a time from a [`Scanner`] and never backtracks: a line
//! that opens a block, list, table, or multiline text hands the scanner to the
//! matching sub-parser, which consumes lines up to its closing delimiter.

use std::fmt;
use std::io::BufRead;

use crate::line::split_entry;
use crate::scanner::{Line, Scanner};
use crate::{
    Block, Document, Node, ParseError, Table, Value, DIRECTIVE_ANNOTATION, LINT_KEY, USE_KEY,
};

/// Dedent strategy for multiline values: `(text, width) -> text`.
pub type DedentFn = Box<dyn Fn(&str, usize) -> String + Send + Sync>;

/// Predicate deciding whether a trimmed line is skipped.
pub type LinePredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Default nesting limit for blocks, lists, and tables.
pub const DEFAULT_MAX_DEPTH: usize = 100;

const FENCE: &str = "```";

/// Configurable UP parser.
///
/// # Example
///
/// ```rust
/// use uplang_ast::{Parser, Value};
///
/// let doc = Parser::new().parse_str("age!int 30").unwrap();
/// let node = &doc.nodes()[0];
/// assert_eq!(node.key, "age");
/// assert_eq!(node.annotation(), Some("int"));
/// assert_eq!(node.value, Value::scalar("30"));
/// ```
pub struct Parser {
    dedent: DedentFn,
    skip_empty_line: LinePredicate,
    skip_comment: LinePredicate,
    max_depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            dedent: Box::new(dedent_lines),
            skip_empty_line: Box::new(|line| line.trim().is_empty()),
            skip_comment: Box::new(|line| line.trim_start().starts_with('#')),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the function applied to multiline text with a numeric annotation.
    pub fn with_dedent_fn(
        mut self,
        dedent: impl Fn(&str, usize) -> String + Send + Sync + 'static,
    ) -> Self {
        self.dedent = Box::new(dedent);
        self
    }

    pub fn with_skip_empty_line(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.skip_empty_line = Box::new(predicate);
        self
    }

    pub fn with_skip_comment(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.skip_comment = Box::new(predicate);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn parse_str(&self, source: &str) -> Result<Document, ParseError> {
        self.parse_reader(source.as_bytes())
    }

    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<Document, ParseError> {
        let mut state = ParseState {
            parser: self,
            scanner: Scanner::new(reader),
        };
        state.parse_document()
    }
}

struct ParseState<'p, R> {
    parser: &'p Parser,
    scanner: Scanner<R>,
}

impl<R: BufRead> ParseState<'_, R> {
    fn parse_document(&mut self) -> Result<Document, ParseError> {
        let mut nodes = Vec::new();

        while let Some(line) = self.scanner.next_line()? {
            let text = line.text.trim();
            if self.is_skippable(text) {
                continue;
            }

            let node = if text.starts_with('!') {
                self.parse_directive(text, line.number)?
            } else {
                let node = self.parse_entry(text, line.number, 0)?;
                if node.key == USE_KEY || node.key == LINT_KEY {
                    return Err(ParseError::syntax(
                        line.number,
                        format!("key '{}' is reserved for directives", node.key),
                    ));
                }
                node
            };
            nodes.push(node);
        }

        Ok(Document::new(nodes))
    }

    fn is_skippable(&self, text: &str) -> bool {
        (self.parser.skip_empty_line)(text) || (self.parser.skip_comment)(text)
    }

    fn check_depth(&self, line: usize, depth: usize) -> Result<(), ParseError> {
        if depth > self.parser.max_depth {
            return Err(ParseError::TooDeep {
                line,
                max_depth: self.parser.max_depth,
            });
        }
        Ok(())
    }

    /// Next line inside a construct opened at `open_line`; running out of
    /// input is an error reported at the opening line.
    fn next_inside(&mut self, open_line: usize, construct: &str) -> Result<Line, ParseError> {
        self.scanner.next_line()?.ok_or_else(|| {
            ParseError::syntax(open_line, format!("unterminated {construct}"))
        })
    }

    fn parse_entry(&mut self, text: &str, line: usize, depth: usize) -> Result<Node, ParseError> {
        let entry = split_entry(text);
        if entry.key.is_empty() {
            return Err(ParseError::syntax(line, format!("missing key in '{text}'")));
        }

        let value = self.parse_value(entry.annotation.as_deref(), &entry.value, line, depth)?;
        Ok(Node {
            key: entry.key,
            annotation: entry.annotation,
            value,
        })
    }

    fn parse_value(
        &mut self,
        annotation: Option<&str>,
        raw: &str,
        line: usize,
        depth: usize,
    ) -> Result<Value, ParseError> {
        if raw.starts_with(FENCE) {
            return self.parse_multiline(annotation, line).map(Value::Scalar);
        }
        if annotation == Some("table") && raw.starts_with('{') {
            return self.parse_table(line, depth + 1).map(Value::Table);
        }
        if raw == "{" {
            return self.parse_block(line, depth + 1).map(Value::Block);
        }
        if raw == "[" {
            return self.parse_list(line, depth + 1).map(Value::List);
        }
        if raw.starts_with('[') && raw.ends_with(']') {
            return Ok(Value::List(inline_list(raw)));
        }
        if raw.starts_with('{') && raw.contains('}') {
            return inline_block(raw, line).map(Value::Block);
        }
        Ok(Value::Scalar(raw.to_string()))
    }

    fn parse_multiline(&mut self, annotation: Option<&str>, open_line: usize) -> Result<String, ParseError> {
        let mut content = Vec::new();
        loop {
            let line = self.next_inside(open_line, "multiline text (missing closing ```)")?;
            if line.text.trim() == FENCE {
                break;
            }
            content.push(line.text);
        }

        let text = content.join("\n");
        match annotation.and_then(|a| a.parse::<usize>().ok()) {
            Some(width) => Ok((self.parser.dedent)(&text, width)),
            None => Ok(text),
        }
    }

    fn parse_block(&mut self, open_line: usize, depth: usize) -> Result<Block, ParseError> {
        self.check_depth(open_line, depth)?;
        let mut block = Block::new();

        loop {
            let line = self.next_inside(open_line, "block (missing '}')")?;
            let text = line.text.trim();
            if text == "}" {
                return Ok(block);
            }
            if self.is_skippable(text) {
                continue;
            }

            let node = self.parse_entry(text, line.number, depth)?;
            block.insert(node.key, node.value);
        }
    }

    fn parse_list(&mut self, open_line: usize, depth: usize) -> Result<Vec<Value>, ParseError> {
        self.check_depth(open_line, depth)?;
        let mut items = Vec::new();

        loop {
            let line = self.next_inside(open_line, "list (missing ']')")?;
            let text = line.text.trim();
            if text == "]" {
                return Ok(items);
            }
            if self.is_skippable(text) {
                continue;
            }

            items.push(self.parse_list_item(text, line.number, depth)?);
        }
    }

    fn parse_list_item(&mut self, text: &str, line: usize, depth: usize) -> Result<Value, ParseError> {
        if text.starts_with('{') {
            if text.contains('}') {
                return inline_block(text, line).map(Value::Block);
            }
            return self.parse_block(line, depth + 1).map(Value::Block);
        }
        if text == "[" {
            return self.parse_list(line, depth + 1).map(Value::List);
        }
        if text.starts_with('[') {
            return Ok(Value::List(inline_list(text)));
        }
        Ok(Value::Scalar(text.to_string()))
    }

    fn parse_table(&mut self, open_line: usize, depth: usize) -> Result<Table, ParseError> {
        self.check_depth(open_line, depth)?;
        let mut table = Table::default();

        loop {
            let line = self.next_inside(open_line, "table (missing '}')")?;
            let text = line.text.trim();
            if text == "}" {
                return Ok(table);
            }
            if self.is_skippable(text) {
                continue;
            }

            if let Some(columns) = text.strip_prefix("columns") {
                table.columns = inline_strings(columns);
            } else if text.starts_with("rows") {
                table.rows = self.parse_rows(line.number, depth + 1)?;
            }
        }
    }

    fn parse_rows(&mut self, open_line: usize, depth: usize) -> Result<Vec<Vec<String>>, ParseError> {
        self.check_depth(open_line, depth)?;
        let mut rows = Vec::new();

        loop {
            let line = self.next_inside(open_line, "table rows (missing '}')")?;
            let text = line.text.trim();
            if text == "}" {
                return Ok(rows);
            }
            if self.is_skippable(text) {
                continue;
            }
            if text.starts_with('[') {
                rows.push(inline_strings(text));
            }
        }
    }

    fn parse_directive(&mut self, text: &str, line: usize) -> Result<Node, ParseError> {
        let body = &text[1..];
        let name_len = body
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(body.len());
        let (name, rest) = body.split_at(name_len);
        let rest = rest.trim();

        match name {
            "use" => {
                let items = if rest == "[" {
                    self.parse_list(line, 1)?
                } else if rest.starts_with('[') && rest.ends_with(']') {
                    inline_list(rest)
                } else {
                    return Err(ParseError::directive(
                        line,
                        "!use expects a list of namespaces",
                    ));
                };

                let namespaces = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Scalar(namespace) => Ok(namespace),
                        other => Err(ParseError::directive(
                            line,
                            format!("!use namespaces must be names, found a {}", other.type_name()),
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Node::new(USE_KEY, Value::UseDirective { namespaces })
                    .with_annotation(DIRECTIVE_ANNOTATION))
            }
            "lint" => {
                let block = if rest == "{" {
                    self.parse_block(line, 1)?
                } else if rest.starts_with('{') && rest.contains('}') {
                    inline_block(rest, line)?
                } else {
                    return Err(ParseError::directive(line, "!lint expects a block"));
                };

                Ok(Node::new(LINT_KEY, Value::Block(block)).with_annotation(DIRECTIVE_ANNOTATION))
            }
            "" => Err(ParseError::directive(line, "missing directive name after '!'")),
            other => Err(ParseError::directive(
                line,
                format!("unknown directive '!{other}'"),
            )),
        }
    }
}

/// `[a, b, c]` → scalars. Every comma separates, quoted or not.
fn inline_list(raw: &str) -> Vec<Value> {
    inline_strings(raw).into_iter().map(Value::Scalar).collect()
}

fn inline_strings(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('[').unwrap_or(raw);
    let raw = raw.strip_suffix(']').unwrap_or(raw).trim();
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|item| item.trim().to_string()).collect()
}

/// `{host localhost, port!int 80}` → block of scalars.
fn inline_block(raw: &str, line: usize) -> Result<Block, ParseError> {
    let close = raw.rfind('}').unwrap_or(raw.len());
    let interior = raw.get(1..close).unwrap_or("");

    let mut block = Block::new();
    for segment in interior.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let entry = split_entry(segment);
        if entry.key.is_empty() {
            return Err(ParseError::syntax(
                line,
                format!("missing key in inline block segment '{segment}'"),
            ));
        }
        block.insert(entry.key, Value::Scalar(entry.value));
    }
    Ok(block)
}

/// Remove `width` leading characters from every line. Lines shorter than
/// `width` are left untouched.
pub fn dedent_lines(text: &str, width: usize) -> String {
    text.split('\n')
        .map(|line| {
            if line.chars().count() < width {
                return line;
            }
            match line.char_indices().nth(width) {
                Some((idx, _)) => &line[idx..],
                None => "",
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
