use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::MailConfig;
use crate::delivery::{EmailDelivery, Mailer};
use crate::pipeline::MashupPipeline;

pub const SUCCESS_MESSAGE: &str = "Mashup sent successfully!";

const FORM_PAGE: &str = r#"<h2>Mashup Creator</h2>
<form method="POST" action="/submit">
    Singer Name: <input type="text" name="singer" required><br><br>
    Number of Videos: <input type="number" name="videos" required><br><br>
    Duration (sec): <input type="number" name="duration" required><br><br>
    Email: <input type="email" name="email" required><br><br>
    <button type="submit">Submit</button>
</form>
"#;

/// Shared state for the form handlers
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<MashupPipeline>,
    mailer: Arc<dyn Mailer>,
    mail: MailConfig,
}

impl AppState {
    pub fn new(pipeline: Arc<MashupPipeline>, mailer: Arc<dyn Mailer>, mail: MailConfig) -> Self {
        Self {
            pipeline,
            mailer,
            mail,
        }
    }
}

/// Form fields; missing ones arrive empty and are caught by validation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitForm {
    pub singer: String,
    pub videos: String,
    pub duration: String,
    pub email: String,
}

pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/", get(home_handler))
        .route("/submit", post(submit_handler))
        .layer(trace_layer)
        .with_state(state)
}

async fn home_handler() -> Html<&'static str> {
    Html(FORM_PAGE)
}

/// Build a mashup for the form and mail it; the body is always a plain message
async fn submit_handler(State(state): State<AppState>, Form(form): Form<SubmitForm>) -> String {
    let delivery = match EmailDelivery::new(&form.email, state.mailer.clone(), state.mail.clone()) {
        Ok(delivery) => delivery,
        Err(e) => {
            tracing::info!("Rejected submission with invalid email");
            return e.to_string();
        }
    };

    tracing::info!(
        singer = %form.singer,
        videos = %form.videos,
        duration = %form.duration,
        "Mashup requested"
    );

    match state
        .pipeline
        .validate_and_run(
            &form.singer,
            &form.videos,
            &form.duration,
            &state.mail.output_name,
            &delivery,
        )
        .await
    {
        Ok(report) => {
            tracing::info!(
                recipient = %delivery.recipient(),
                clips = report.trimmed,
                seconds = report.total_seconds,
                "Mashup delivered"
            );
            SUCCESS_MESSAGE.to_string()
        }
        Err(e) => format!("{:#}", e),
    }
}
