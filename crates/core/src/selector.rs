//! Selection of the work set from a platform.
//!
//! A criterion is either a name pattern or a label selector:
//! - `web-.*` matches items whose whole name matches the regular expression
//! - `tier=frontend,env!=prod` matches items whose labels satisfy every
//!   requirement
//!
//! An empty [`Selectors`] selects everything.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::WorkItem;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelRequirement {
    Equals { key: String, value: String },
    NotEquals { key: String, value: String },
}

impl LabelRequirement {
    fn parse(raw: &str, selector: &str) -> Result<Self> {
        let raw = raw.trim();
        let (key, value, negated) = if let Some((key, value)) = raw.split_once("!=") {
            (key, value, true)
        } else if let Some((key, value)) = raw.split_once("==") {
            (key, value, false)
        } else if let Some((key, value)) = raw.split_once('=') {
            (key, value, false)
        } else {
            return Err(CoreError::invalid_selector(
                selector,
                format!("requirement {:?} has no operator", raw),
            ));
        };

        let key = key.trim();
        let value = value.trim();
        validate_label_part(key, "key", selector)?;
        if !value.is_empty() {
            validate_label_part(value, "value", selector)?;
        }

        let (key, value) = (key.to_string(), value.to_string());
        Ok(if negated {
            Self::NotEquals { key, value }
        } else {
            Self::Equals { key, value }
        })
    }

    /// An absent key satisfies `!=` and fails `=`.
    pub fn matches(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        let lookup = |key: &str| labels.and_then(|l| l.get(key)).map(String::as_str);
        match self {
            Self::Equals { key, value } => lookup(key) == Some(value.as_str()),
            Self::NotEquals { key, value } => lookup(key) != Some(value.as_str()),
        }
    }
}

fn validate_label_part(part: &str, what: &str, selector: &str) -> Result<()> {
    if part.is_empty() {
        return Err(CoreError::invalid_selector(
            selector,
            format!("label {} must not be empty", what),
        ));
    }
    if let Some(c) = part
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')))
    {
        return Err(CoreError::invalid_selector(
            selector,
            format!("label {} {:?} contains invalid character {:?}", what, part, c),
        ));
    }
    Ok(())
}

/// One filter criterion.
#[derive(Debug, Clone)]
pub enum Selector {
    Name { raw: String, pattern: Regex },
    Labels {
        raw: String,
        requirements: Vec<LabelRequirement>,
    },
}

impl Selector {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::invalid_selector(raw, "selector must not be empty"));
        }

        if trimmed.contains('=') {
            let requirements = trimmed
                .split(',')
                .map(|part| LabelRequirement::parse(part, trimmed))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Self::Labels {
                raw: trimmed.to_string(),
                requirements,
            });
        }

        let pattern = Regex::new(&format!("^(?:{})$", trimmed))
            .map_err(|e| CoreError::invalid_selector(trimmed, e.to_string()))?;
        Ok(Self::Name {
            raw: trimmed.to_string(),
            pattern,
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Name { raw, .. } | Self::Labels { raw, .. } => raw,
        }
    }

    pub fn matches<T: WorkItem + ?Sized>(&self, item: &T) -> bool {
        match self {
            Self::Name { pattern, .. } => pattern.is_match(item.name()),
            Self::Labels { requirements, .. } => {
                let labels = item.labels();
                requirements.iter().all(|r| r.matches(labels))
            }
        }
    }
}

impl FromStr for Selector {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of criteria; an item is selected when any criterion matches.
#[derive(Debug, Clone, Default)]
pub struct Selectors(Vec<Selector>);

impl Selectors {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self(selectors)
    }

    /// Parses every criterion, failing the whole set on the first invalid one.
    pub fn parse<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .map(|s| Selector::parse(s.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selector> {
        self.0.iter()
    }

    pub fn matches<T: WorkItem + ?Sized>(&self, item: &T) -> bool {
        self.0.is_empty() || self.0.iter().any(|s| s.matches(item))
    }

    /// The matching subset of `items`, in input order.
    pub fn select<T: WorkItem>(&self, items: &[Arc<T>]) -> Vec<Arc<T>> {
        items
            .iter()
            .filter(|item| self.matches::<T>(item))
            .cloned()
            .collect()
    }
}

impl From<Vec<Selector>> for Selectors {
    fn from(selectors: Vec<Selector>) -> Self {
        Self(selectors)
    }
}
