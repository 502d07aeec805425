//! Document and value merging.

use crate::options::{ListStrategy, MergeStrategy};
use std::collections::HashSet;
use uplang_ast::{Block, Document, Node, Value};

/// Combines documents and values under a pair of strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Merger {
    pub merge_strategy: MergeStrategy,
    pub list_strategy: ListStrategy,
}

impl Merger {
    pub fn new(merge_strategy: MergeStrategy, list_strategy: ListStrategy) -> Self {
        Self {
            merge_strategy,
            list_strategy,
        }
    }

    /// Merge `overlay` onto `base` by top-level key.
    ///
    /// Base order is kept; a matching key is merged in place and takes the
    /// overlay's annotation when it has one; new keys are appended.
    pub fn merge_documents(&self, base: &Document, overlay: &Document) -> Document {
        let mut nodes = base.nodes().to_vec();

        for overlay_node in overlay {
            match nodes.iter_mut().find(|node| node.key == overlay_node.key) {
                Some(target) => {
                    tracing::trace!(key = %overlay_node.key, "merging node");
                    target.value = self.merge_values(&target.value, &overlay_node.value);
                    if overlay_node.annotation.is_some() {
                        target.annotation = overlay_node.annotation.clone();
                    }
                }
                None => nodes.push(overlay_node.clone()),
            }
        }

        Document::new(nodes)
    }

    /// Merge a node's value into the same-named top-level node, appending the
    /// node when no such key exists.
    pub fn merge_into_document(&self, document: &Document, key: &str, value: &Value) -> Document {
        let mut nodes = document.nodes().to_vec();
        match nodes.iter_mut().find(|node| node.key == key) {
            Some(target) => target.value = self.merge_values(&target.value, value),
            None => nodes.push(Node::new(key, value.clone())),
        }
        Document::new(nodes)
    }

    pub fn merge_values(&self, base: &Value, overlay: &Value) -> Value {
        match (base, overlay) {
            (Value::Block(base), Value::Block(overlay))
                if self.merge_strategy == MergeStrategy::Deep =>
            {
                Value::Block(self.merge_blocks(base, overlay))
            }
            (Value::List(base), Value::List(overlay)) => Value::List(self.merge_lists(base, overlay)),
            _ => overlay.clone(),
        }
    }

    fn merge_blocks(&self, base: &Block, overlay: &Block) -> Block {
        let mut result = base.clone();
        for (key, value) in overlay {
            let merged = match result.get(key) {
                Some(existing) => self.merge_values(existing, value),
                None => value.clone(),
            };
            result.insert(key.clone(), merged);
        }
        result
    }

    fn merge_lists(&self, base: &[Value], overlay: &[Value]) -> Vec<Value> {
        match self.list_strategy {
            ListStrategy::Append => base.iter().chain(overlay).cloned().collect(),
            ListStrategy::Unique => unique_scalars(base.iter().chain(overlay).cloned()),
            ListStrategy::Replace => overlay.to_vec(),
        }
    }
}

/// Drop repeated scalar items, keeping the first. Non-scalars are always kept.
pub fn unique_scalars(items: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match item {
            Value::Scalar(text) => seen.insert(text.clone()),
            _ => true,
        })
        .collect()
}
