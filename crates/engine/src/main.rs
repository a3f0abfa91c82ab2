//! regionward Engine - Main entry point.
//!
//! Loads region definitions, then answers JSON-line queries on stdin until
//! stdin closes.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use regionward_engine::api::handle_line;
use regionward_engine::infrastructure::config::EngineConfig;
use regionward_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root before reading any configuration.
    load_dotenv_from_repo_root();

    let config = EngineConfig::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        definitions = %config.definitions_path.display(),
        artifacts = %config.artifact_dir.display(),
        "Starting regionward engine"
    );

    let app = App::from_config(&config);
    let loaded = app.reload().await?;
    tracing::info!(regions = loaded, "Region index ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let mut response = handle_line(&app, &line).await;
        response.push('\n');
        stdout.write_all(response.as_bytes()).await?;
        stdout.flush().await?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
