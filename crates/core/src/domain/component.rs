use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A unit of work the orchestrator can process.
///
/// The orchestrator only ever reads items; `name` and `labels` feed the
/// selectors and `describe` feeds the completion logs.
pub trait WorkItem {
    fn name(&self) -> &str;

    fn labels(&self) -> Option<&BTreeMap<String, String>> {
        None
    }

    fn describe(&self) -> String {
        self.name().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Render command overriding the platform default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Component {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            labels: BTreeMap::new(),
            command: None,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

impl WorkItem for Component {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> Option<&BTreeMap<String, String>> {
        Some(&self.labels)
    }

    fn describe(&self) -> String {
        format!("component {} at {}", self.name, self.path.display())
    }
}
