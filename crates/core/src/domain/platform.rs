use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::component::Component;
use crate::error::{CoreError, Result};
use crate::selector::Selectors;

/// A named, ordered collection of components.
///
/// Components are held behind `Arc` so a selection can be handed to
/// concurrent workers while the platform keeps ownership.
#[derive(Debug, Clone)]
pub struct Platform {
    name: String,
    components: Vec<Arc<Component>>,
}

impl Platform {
    pub fn new(name: impl Into<String>, components: Vec<Component>) -> Result<Self> {
        let mut seen = HashSet::new();
        for component in &components {
            if component.name.trim().is_empty() {
                return Err(CoreError::Validation(
                    "component name must not be empty".to_string(),
                ));
            }
            if !seen.insert(component.name.as_str()) {
                return Err(CoreError::DuplicateComponent(component.name.clone()));
            }
        }

        Ok(Self {
            name: name.into(),
            components: components.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[Arc<Component>] {
        &self.components
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Component>> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components matching at least one selector, in platform order.
    pub fn select(&self, selectors: &Selectors) -> Vec<Arc<Component>> {
        selectors.select(&self.components)
    }
}
