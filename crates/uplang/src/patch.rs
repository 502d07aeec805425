//! Patch application.
//!
//! A patch assigns a value at a dotted path such as `server.host`. A segment
//! may carry a list selector: `servers[*].cpu` addresses every element,
//! `servers[0].cpu` only the first. Patches only walk existing blocks; a
//! missing segment ends the patch without creating anything.

use uplang_ast::{Block, Document, Value};

/// One parsed path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub key: String,
    pub selector: Option<Selector>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    All,
    Index(usize),
}

/// Split `servers[*].cpu` into segments. `None` when a selector is not
/// understood, in which case the patch is skipped.
pub fn parse_path(path: &str) -> Option<Vec<Segment>> {
    path.split('.').map(parse_segment).collect()
}

fn parse_segment(segment: &str) -> Option<Segment> {
    let Some((key, selector)) = segment.split_once('[') else {
        return Some(Segment {
            key: segment.to_string(),
            selector: None,
        });
    };

    let selector = match selector.strip_suffix(']')? {
        "*" => Selector::All,
        index => Selector::Index(index.parse().ok()?),
    };
    Some(Segment {
        key: key.to_string(),
        selector: Some(selector),
    })
}

/// Return a copy of `document` with every `(path, value)` patch applied in order.
pub fn apply_patches(document: &Document, patches: &[(String, Value)]) -> Document {
    let mut nodes = document.nodes().to_vec();

    for (path, value) in patches {
        let Some(segments) = parse_path(path) else {
            tracing::trace!(path = %path, "skipping patch with unsupported selector");
            continue;
        };
        let Some((first, rest)) = segments.split_first() else {
            continue;
        };

        match nodes.iter_mut().find(|node| node.key == first.key) {
            Some(node) => apply_at(&mut node.value, first.selector, rest, value),
            None => tracing::trace!(path = %path, "patch target not found"),
        }
    }

    Document::new(nodes)
}

fn apply_in_block(block: &mut Block, path: &[Segment], value: &Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };

    if first.selector.is_none() && rest.is_empty() {
        block.insert(first.key.clone(), value.clone());
        return;
    }
    if let Some(slot) = block.get_mut(&first.key) {
        apply_at(slot, first.selector, rest, value);
    }
}

/// Apply the remaining path to the value stored under a segment's key.
fn apply_at(slot: &mut Value, selector: Option<Selector>, rest: &[Segment], value: &Value) {
    let Some(selector) = selector else {
        if rest.is_empty() {
            *slot = value.clone();
        } else if let Value::Block(block) = slot {
            apply_in_block(block, rest, value);
        }
        return;
    };

    let Value::List(items) = slot else {
        return;
    };
    match selector {
        Selector::All => {
            for item in items.iter_mut() {
                apply_to_item(item, rest, value);
            }
        }
        Selector::Index(index) => {
            if let Some(item) = items.get_mut(index) {
                apply_to_item(item, rest, value);
            }
        }
    }
}

/// Non-block elements are skipped when the path continues past the selector.
fn apply_to_item(item: &mut Value, rest: &[Segment], value: &Value) {
    if rest.is_empty() {
        *item = value.clone();
    } else if let Value::Block(block) = item {
        apply_in_block(block, rest, value);
    }
}
