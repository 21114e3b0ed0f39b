use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use mashup_creator::cli::ServeArgs;
use mashup_creator::web::{self, AppState};
use mashup_creator::{utils, Config, MashupPipeline, SmtpMailer};

#[tokio::main]
async fn main() -> Result<()> {
    utils::init_tracing("mashup_creator=info,tower_http=info");

    let args = ServeArgs::parse();
    let config = Config::load()?;

    let missing_deps = utils::check_dependencies(&config.tools).await;
    for dep in missing_deps {
        tracing::warn!("Dependency check: {} not found", dep);
    }

    let mailer = SmtpMailer::new(&config.mail, &args.mail_username, &args.mail_password)?;
    let pipeline = MashupPipeline::from_config(&config);
    let state = AppState::new(Arc::new(pipeline), Arc::new(mailer), config.mail.clone());
    let app = web::create_router(state);

    let port = args.port.unwrap_or(config.server.port);
    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, port))?;

    tracing::info!(
        host = %config.server.host,
        port = port,
        "Mashup web form listening"
    );

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
