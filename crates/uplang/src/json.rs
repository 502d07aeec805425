//! Conversion between UP values and JSON.

use serde_json::{Map, Value as JsonValue};
use uplang_ast::{Block, Document, Value};

/// Convert a document into a JSON object in node order.
///
/// Repeated top-level keys keep the last value, matching block semantics.
pub fn document_to_json(document: &Document) -> JsonValue {
    let mut object = Map::new();
    for node in document {
        object.insert(node.key.clone(), value_to_json(&node.value));
    }
    JsonValue::Object(object)
}

/// Convert a UP value to JSON. Scalars stay strings since the parser never
/// interprets them.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Scalar(text) => JsonValue::String(text.clone()),
        Value::Block(block) => JsonValue::Object(
            block
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
        Value::List(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
        Value::Table(table) => {
            let mut object = Map::new();
            object.insert("columns".to_string(), strings(&table.columns));
            object.insert(
                "rows".to_string(),
                JsonValue::Array(table.rows.iter().map(|row| strings(row)).collect()),
            );
            JsonValue::Object(object)
        }
        Value::UseDirective { namespaces } => strings(namespaces),
    }
}

fn strings(items: &[String]) -> JsonValue {
    JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect())
}

/// Convert a JSON value into a UP value.
///
/// Numbers and booleans become their textual form and `null` an empty scalar.
pub fn value_from_json(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Scalar(String::new()),
        JsonValue::Bool(b) => Value::Scalar(b.to_string()),
        JsonValue::Number(n) => Value::Scalar(n.to_string()),
        JsonValue::String(s) => Value::Scalar(s),
        JsonValue::Array(items) => Value::List(items.into_iter().map(value_from_json).collect()),
        JsonValue::Object(object) => {
            let block: Block = object
                .into_iter()
                .map(|(k, v)| (k, value_from_json(v)))
                .collect();
            Value::Block(block)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use uplang_ast::parse;

    #[test]
    fn test_document_to_json() {
        let doc = parse(
            "name app\nserver {\nhost localhost\nport!int 8080\n}\ntags [a, b]\n!use [core]",
        )
        .unwrap();
        assert_eq!(
            document_to_json(&doc),
            json!({
                "name": "app",
                "server": {"host": "localhost", "port": "8080"},
                "tags": ["a", "b"],
                "_use": ["core"]
            })
        );
    }

    #[test]
    fn test_table_to_json() {
        let doc = parse("t!table {\ncolumns [id, name]\nrows {\n[1, a]\n}\n}").unwrap();
        assert_eq!(
            document_to_json(&doc),
            json!({"t": {"columns": ["id", "name"], "rows": [["1", "a"]]}})
        );
    }

    #[test]
    fn test_json_object_order_is_preserved() {
        let doc = parse("zeta 1\nalpha 2\nmid 3").unwrap();
        let json = document_to_json(&doc);
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_value_from_json() {
        let value = value_from_json(json!({"name": "test", "count": 42, "on": true, "none": null}));
        let block = value.as_block().unwrap();
        assert_eq!(block["name"], Value::scalar("test"));
        assert_eq!(block["count"], Value::scalar("42"));
        assert_eq!(block["on"], Value::scalar("true"));
        assert_eq!(block["none"], Value::scalar(""));
    }
}
