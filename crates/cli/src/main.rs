use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "shelf", version, about = "Shelf book review service")]
struct Cli {
    /// Directory holding base.toml and the per-environment overlays
    #[arg(long, env = "SHELF_CONFIG_DIR", global = true)]
    config_dir: Option<PathBuf>,

    /// Environment overlay to load (local, staging, production)
    #[arg(long, env = "SHELF_ENV", global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Migrate the database and serve the HTTP API
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Print the merged OpenAPI document
    Openapi,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        match (&self.config_dir, &self.env) {
            (None, None) => Settings::load(),
            (dir, env) => Settings::load_from(
                dir.as_deref().unwrap_or(Path::new("config")),
                env.as_deref().unwrap_or("local"),
            ),
        }
        .context("failed to load Shelf settings")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Command::Openapi = cli.command {
        let registry = shelf_app::build_registry();
        let document = shelf_http::router::merged_openapi(&registry);
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let settings = cli.settings()?;
    shelf_telemetry::init(&settings.telemetry)?;
    tracing::info!(env = ?settings.environment, command = ?cli.command, "shelf cli");

    match cli.command {
        Command::Serve => shelf_app::serve(settings).await,
        Command::Migrate => {
            let (registry, _state) = shelf_app::prepare(settings).await?;
            tracing::info!(modules = registry.modules().len(), "database ready");
            Ok(())
        }
        Command::Openapi => Ok(()),
    }
}
