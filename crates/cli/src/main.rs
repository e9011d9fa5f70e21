use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use events::{Event, EventBus, EventEnvelope};
use orchestrator::{execute, ExecuteOptions, RunContext};
use platform_core::{Component, Platform, Selectors};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod manifest;
mod render;

use manifest::{load_platform, DEFAULT_MANIFEST};
use render::ShellRenderer;

#[derive(Parser)]
#[command(name = "platctl")]
#[command(about = "Render platform components with bounded concurrency", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Platform manifest to load
    #[arg(short, long, global = true, default_value = DEFAULT_MANIFEST)]
    manifest: PathBuf,

    /// Log per-component timings at info level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the selected components
    #[command(alias = "get")]
    List {
        /// Name pattern or label selector (key=value,key!=value); repeatable
        #[arg(short, long = "selector")]
        selectors: Vec<String>,

        #[arg(long)]
        json: bool,
    },
    /// Run each selected component's render command
    Render {
        /// Name pattern or label selector (key=value,key!=value); repeatable
        #[arg(short, long = "selector")]
        selectors: Vec<String>,

        /// Components rendered at once; defaults to the manifest, then the CPU count
        #[arg(short, long, allow_negative_numbers = true)]
        concurrency: Option<i64>,

        /// Cancel the render after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::List { selectors, json } => list(&cli.manifest, &selectors, json).await,
        Commands::Render {
            selectors,
            concurrency,
            timeout,
        } => render(&cli.manifest, &selectors, concurrency, timeout, cli.verbose).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "platctl=info,orchestrator=info"
    } else {
        "platctl=warn,orchestrator=warn"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

async fn list(manifest_path: &Path, selectors: &[String], json: bool) -> Result<()> {
    let (platform, _) = load_platform(manifest_path).await?;
    let selectors = Selectors::parse(selectors).context("Invalid selector")?;
    let components = platform.select(&selectors);

    if components.is_empty() {
        bail!("not found");
    }

    if json {
        let components: Vec<&Component> = components.iter().map(Arc::as_ref).collect();
        println!("{}", serde_json::to_string_pretty(&components)?);
        return Ok(());
    }

    print!("{}", format_table(&platform, &components));
    Ok(())
}

fn format_table(platform: &Platform, components: &[Arc<Component>]) -> String {
    let cwd = std::env::current_dir().unwrap_or_default();
    let rows: Vec<[String; 3]> = components
        .iter()
        .map(|c| {
            let path = c
                .path
                .strip_prefix(&cwd)
                .unwrap_or(&c.path)
                .display()
                .to_string();
            let labels = c
                .labels
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(",");
            [c.name.clone(), path, labels]
        })
        .collect();

    let header = ["NAME", "PATH", "LABELS"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = format!("Platform: {}\n", platform.name());
    let mut push_row = |cells: [&str; 3]| {
        let line = format!(
            "{:<w0$}    {:<w1$}    {}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1]
        );
        out.push_str(line.trim_end());
        out.push('\n');
    };
    push_row(header);
    for row in &rows {
        push_row([row[0].as_str(), row[1].as_str(), row[2].as_str()]);
    }
    out
}

async fn render(
    manifest_path: &Path,
    selectors: &[String],
    concurrency: Option<i64>,
    timeout: Option<u64>,
    verbose: bool,
) -> Result<()> {
    let (platform, defaults) = load_platform(manifest_path).await?;

    let mut options = ExecuteOptions::default()
        .with_verbose(verbose)
        .with_selector_strs(selectors)
        .context("Invalid selector")?;
    if let Some(concurrency) = concurrency.or(defaults.concurrency) {
        options = options.with_concurrency(concurrency);
    }

    let selected = options.selectors.select(platform.components());
    let bus = run_bus(selected.len());
    let mut recorder = bus.recorder();
    let ctx = RunContext::new().with_events(bus);

    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling render");
            interrupt.cancel();
        }
    });

    if let Some(seconds) = timeout {
        let deadline = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            tracing::warn!(timeout_secs = seconds, "Render timed out, cancelling");
            deadline.cancel();
        });
    }

    tracing::info!(
        platform = %platform.name(),
        selected = selected.len(),
        limit = options.limit(),
        "Rendering platform"
    );

    let renderer = Arc::new(ShellRenderer::new(defaults.command));
    let result = execute(
        &ctx,
        &selected,
        move |ctx: RunContext, index: usize, component: Arc<Component>| {
            let renderer = Arc::clone(&renderer);
            async move { renderer.render(ctx, index, component).await }
        },
        &options,
    )
    .await;

    if let Some(summary) = RenderSummary::from_events(recorder.drain()) {
        println!(
            "Rendered {}/{} components of {} in {:.1}s ({} failed)",
            summary.rendered,
            summary.total,
            platform.name(),
            summary.duration_ms as f64 / 1000.0,
            summary.failed
        );
    }

    result.context("Render failed")
}

/// A bus that holds every event of a run over `selected` items, so the
/// summary can be read after the run without losing any to lag.
fn run_bus(selected: usize) -> EventBus {
    EventBus::with_capacity(selected + 1)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RenderSummary {
    rendered: usize,
    failed: usize,
    total: usize,
    duration_ms: u64,
}

impl RenderSummary {
    /// `None` until the run's aggregate event has been seen.
    fn from_events(events: Vec<EventEnvelope>) -> Option<Self> {
        let mut summary = Self::default();
        let mut finished = false;
        for envelope in events {
            match envelope.event {
                Event::ItemCompleted { success: true, .. } => summary.rendered += 1,
                Event::ItemCompleted { success: false, .. } => summary.failed += 1,
                Event::RunCompleted {
                    total, duration_ms, ..
                } => {
                    summary.total = total;
                    summary.duration_ms = duration_ms;
                    finished = true;
                }
            }
        }
        finished.then_some(summary)
    }
}
