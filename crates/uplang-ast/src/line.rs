//! Key/value splitting for a single trimmed line.

/// A key/value line split into its parts. The value is raw text and has not
/// been dispatched to a block, list, or table yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub annotation: Option<String>,
    pub value: String,
}

/// Split a trimmed line into key, annotation, and raw value.
///
/// Both surface syntaxes are accepted:
///
/// - `key value` with the value taken verbatim (minus one layer of quotes)
/// - `key: value  # comment` where the trailing colon marks line-oriented
///   syntax, enabling `#` comments after the value
///
/// A key token containing `://` is never line-oriented, so
/// `website https://example.com` keeps its value intact.
pub fn split_entry(line: &str) -> Entry {
    let (key_token, rest) = match line.find(char::is_whitespace) {
        Some(idx) => (&line[..idx], line[idx..].trim()),
        None => (line, ""),
    };

    let (key_part, value) = match key_token.strip_suffix(':') {
        Some(stripped) if !key_token.contains("://") => {
            (stripped, strip_quotes(strip_trailing_comment(rest).trim()))
        }
        _ => (key_token, strip_quotes(rest)),
    };

    let (key, annotation) = split_annotation(key_part);

    if annotation == Some("quoted") {
        return Entry {
            key: key.to_string(),
            annotation: Some("string".to_string()),
            value: ensure_quoted(value),
        };
    }

    Entry {
        key: key.to_string(),
        annotation: annotation.map(str::to_string),
        value: value.to_string(),
    }
}

/// `age!int` → (`age`, `int`). An empty annotation counts as none.
fn split_annotation(key_part: &str) -> (&str, Option<&str>) {
    match key_part.split_once('!') {
        Some((key, annotation)) if !annotation.is_empty() => (key, Some(annotation)),
        Some((key, _)) => (key, None),
        None => (key_part, None),
    }
}

/// Cut the value at the first `#` outside double quotes.
fn strip_trailing_comment(value: &str) -> &str {
    let mut in_quotes = false;
    for (idx, ch) in value.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &value[..idx],
            _ => {}
        }
    }
    value
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn ensure_quoted(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value.to_string()
    } else {
        format!("\"{value}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, annotation: Option<&str>, value: &str) -> Entry {
        Entry {
            key: key.to_string(),
            annotation: annotation.map(str::to_string),
            value: value.to_string(),
        }
    }

    #[test]
    fn traditional_syntax() {
        assert_eq!(split_entry("name John Doe"), entry("name", None, "John Doe"));
        assert_eq!(split_entry("age!int 30"), entry("age", Some("int"), "30"));
        assert_eq!(split_entry("flag"), entry("flag", None, ""));
        assert_eq!(split_entry("color #fff"), entry("color", None, "#fff"));
    }

    #[test]
    fn tabs_separate_key_and_value() {
        assert_eq!(split_entry("name\t  value"), entry("name", None, "value"));
    }

    #[test]
    fn line_oriented_syntax() {
        assert_eq!(split_entry("name: John Doe"), entry("name", None, "John Doe"));
        assert_eq!(split_entry("port!int: 8080"), entry("port", Some("int"), "8080"));
        assert_eq!(
            split_entry("title: Hello  # greeting"),
            entry("title", None, "Hello")
        );
        assert_eq!(
            split_entry("title: \"a # b\"  # note"),
            entry("title", None, "a # b")
        );
        assert_eq!(split_entry("empty:"), entry("empty", None, ""));
    }

    #[test]
    fn url_values_are_not_line_oriented() {
        assert_eq!(
            split_entry("website https://example.com"),
            entry("website", None, "https://example.com")
        );
        assert_eq!(
            split_entry("http://host: value"),
            entry("http://host:", None, "value")
        );
    }

    #[test]
    fn strips_one_layer_of_quotes() {
        assert_eq!(split_entry("motto \"be kind\""), entry("motto", None, "be kind"));
        assert_eq!(split_entry("nested \"\"x\"\""), entry("nested", None, "\"x\""));
        assert_eq!(split_entry("lone \""), entry("lone", None, "\""));
    }

    #[test]
    fn quoted_annotation_keeps_quotes() {
        assert_eq!(
            split_entry("motto!quoted \"be kind\""),
            entry("motto", Some("string"), "\"be kind\"")
        );
        assert_eq!(
            split_entry("motto!quoted be kind"),
            entry("motto", Some("string"), "\"be kind\"")
        );
    }

    #[test]
    fn empty_annotation_is_absent() {
        assert_eq!(split_entry("key! value"), entry("key", None, "value"));
    }
}
