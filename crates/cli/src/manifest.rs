//! Platform manifest loading.
//!
//! ```toml
//! name = "example"
//!
//! [defaults]
//! command = "make render"
//! concurrency = 4
//!
//! [[components]]
//! name = "web"
//! path = "components/web"
//! labels = { tier = "frontend" }
//! ```

use anyhow::{Context, Result};
use platform_core::{Component, Platform};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MANIFEST: &str = "platform.toml";

#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    /// Render command for components that do not set their own.
    pub command: Option<String>,
    pub concurrency: Option<i64>,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse platform manifest")
    }

    /// Build the platform, resolving component paths against `root`.
    pub fn into_platform(self, root: &Path) -> Result<(Platform, Defaults)> {
        let components = self
            .components
            .into_iter()
            .map(|mut component| {
                if component.path.is_relative() {
                    component.path = root.join(&component.path);
                }
                component
            })
            .collect();

        let platform = Platform::new(self.name, components).context("Invalid platform manifest")?;
        Ok((platform, self.defaults))
    }
}

pub async fn load_platform(path: &Path) -> Result<(Platform, Defaults)> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest = Manifest::parse(&content)
        .with_context(|| format!("Invalid manifest {}", path.display()))?;

    let root = path.parent().unwrap_or_else(|| Path::new("."));
    manifest.into_platform(root)
}
