//! Merge strategies and engine options.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UpError;

/// Default bound on variable fixpoint iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// How two blocks combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Union keys recursively; nested blocks merge, other values are replaced.
    #[default]
    Deep,
    /// The later block wins outright.
    Shallow,
    /// The later block wins outright.
    Replace,
}

/// How two lists combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStrategy {
    #[default]
    Append,
    /// Append, then drop repeated scalars (first occurrence wins).
    Unique,
    Replace,
}

impl FromStr for MergeStrategy {
    type Err = UpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deep" => Ok(MergeStrategy::Deep),
            "shallow" => Ok(MergeStrategy::Shallow),
            "replace" => Ok(MergeStrategy::Replace),
            other => Err(UpError::UnknownStrategy {
                kind: "merge",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for ListStrategy {
    type Err = UpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(ListStrategy::Append),
            "unique" => Ok(ListStrategy::Unique),
            "replace" => Ok(ListStrategy::Replace),
            other => Err(UpError::UnknownStrategy {
                kind: "list",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergeStrategy::Deep => "deep",
            MergeStrategy::Shallow => "shallow",
            MergeStrategy::Replace => "replace",
        })
    }
}

impl fmt::Display for ListStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListStrategy::Append => "append",
            ListStrategy::Unique => "unique",
            ListStrategy::Replace => "replace",
        })
    }
}

/// Template engine configuration.
///
/// Deserializable so applications can keep it in their own config files:
///
/// ```rust
/// let options: uplang::TemplateOptions =
///     serde_json::from_str(r#"{"list_strategy": "unique"}"#).unwrap();
/// assert_eq!(options.list_strategy, uplang::ListStrategy::Unique);
/// assert_eq!(options.merge_strategy, uplang::MergeStrategy::Deep);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    pub merge_strategy: MergeStrategy,
    pub list_strategy: ListStrategy,
    /// Directory that relative references resolve against when processing
    /// a document that did not come from a file.
    pub base_dir: PathBuf,
    pub max_iterations: usize,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            merge_strategy: MergeStrategy::Deep,
            list_strategy: ListStrategy::Append,
            base_dir: PathBuf::from("."),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl TemplateOptions {
    pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    pub fn with_list_strategy(mut self, strategy: ListStrategy) -> Self {
        self.list_strategy = strategy;
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names() {
        assert_eq!("deep".parse::<MergeStrategy>().unwrap(), MergeStrategy::Deep);
        assert_eq!("shallow".parse::<MergeStrategy>().unwrap(), MergeStrategy::Shallow);
        assert_eq!("unique".parse::<ListStrategy>().unwrap(), ListStrategy::Unique);
        assert_eq!(ListStrategy::Replace.to_string(), "replace");
    }

    #[test]
    fn test_unknown_strategy() {
        let result = "sideways".parse::<MergeStrategy>();
        assert!(matches!(
            result,
            Err(UpError::UnknownStrategy { kind: "merge", .. })
        ));
    }

    #[test]
    fn test_options_from_json() {
        let options: TemplateOptions = serde_json::from_str(
            r#"{"merge_strategy": "replace", "base_dir": "conf", "max_iterations": 5}"#,
        )
        .unwrap();
        assert_eq!(options.merge_strategy, MergeStrategy::Replace);
        assert_eq!(options.list_strategy, ListStrategy::Append);
        assert_eq!(options.base_dir, PathBuf::from("conf"));
        assert_eq!(options.max_iterations, 5);
    }
}
