//! Renders a component by running its command in the component directory.

use orchestrator::{BoxError, RunContext};
use platform_core::Component;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Bytes of stderr kept in a failure message.
const STDERR_TAIL: usize = 2048;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No render command configured for component {0}")]
    NoCommand(String),

    #[error("Render of {component} cancelled")]
    Cancelled { component: String },

    #[error("Render of {component} exited with {status}: {stderr}")]
    Failed {
        component: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to run render command for {component}: {source}")]
    Spawn {
        component: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ShellRenderer {
    default_command: Option<String>,
}

impl ShellRenderer {
    pub fn new(default_command: Option<String>) -> Self {
        Self { default_command }
    }

    pub fn command_for<'a>(&'a self, component: &'a Component) -> Option<&'a str> {
        component
            .command
            .as_deref()
            .or(self.default_command.as_deref())
    }

    /// Runs `sh -c <command>`; the child is killed if the run is cancelled.
    pub async fn render(
        &self,
        ctx: RunContext,
        index: usize,
        component: Arc<Component>,
    ) -> Result<(), BoxError> {
        let command = self
            .command_for(&component)
            .ok_or_else(|| RenderError::NoCommand(component.name.clone()))?;

        let spawn_error = |source| RenderError::Spawn {
            component: component.name.clone(),
            source,
        };

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&component.path)
            .env("PLATFORM_COMPONENT", &component.name)
            .env("PLATFORM_COMPONENT_INDEX", index.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let output = tokio::select! {
            _ = ctx.cancelled() => {
                return Err(RenderError::Cancelled {
                    component: component.name.clone(),
                }
                .into());
            }
            output = child.wait_with_output() => output.map_err(spawn_error)?,
        };

        if !output.status.success() {
            return Err(RenderError::Failed {
                component: component.name.clone(),
                status: output.status.to_string(),
                stderr: tail(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL),
            }
            .into());
        }

        debug!(
            component = %component.name,
            stdout_bytes = output.stdout.len(),
            "Render command succeeded"
        );
        Ok(())
    }
}

fn tail(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}
