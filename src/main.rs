use agent_brain::server::{run_server, StartupOptions};
use agent_brain::infrastructure::config::types::Mode;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "agent-brain")]
#[command(about = "Agent Brain - per-project retrieval daemon")]
#[command(version)]
struct Cli {
    /// Path to a settings TOML file, layered over the embedded defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root override; defaults to the nearest VCS/project-marker
    /// ancestor of the current directory.
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Explicit port to bind; defaults to the first free port in the
    /// configured range.
    #[arg(long)]
    port: Option<u16>,

    /// Force `project` or `shared` daemon mode, overriding configuration.
    #[arg(long)]
    mode: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let mode = match cli.mode.as_deref() {
        Some("project") => Some(Mode::Project),
        Some("shared") => Some(Mode::Shared),
        Some(other) => return Err(format!("unrecognized --mode {other:?}, expected project|shared").into()),
        None => None,
    };

    run_server(StartupOptions {
        config_path: cli.config,
        project_root: cli.project,
        port: cli.port,
        mode,
    })
    .await
}
