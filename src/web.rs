use anyhow::{Context, Result};
use axum::extract::{Form, Json, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::GenerationError;
use crate::generator::{SubmissionGate, TweetGenerator};
use crate::normalizer::TweetList;
use crate::render::{cards, render_page, FormValues, PageBody, TweetCard};
use crate::request::{GenerationRequest, RequestError, DEFAULT_TWEETS};
use crate::TARGET_WEB_REQUEST;

/// Shared by every handler; built once in `main`.
pub struct AppState {
    pub generator: TweetGenerator,
    pub gate: SubmissionGate,
    pub languages: Vec<String>,
}

impl AppState {
    pub fn new(generator: TweetGenerator, languages: Vec<String>) -> Self {
        Self {
            generator,
            gate: SubmissionGate::new(),
            languages,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct GenerateForm {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    count: String,
    language: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ApiRequest {
    topic: String,
    #[serde(default = "default_count")]
    count: usize,
    language: Option<String>,
}

fn default_count() -> usize {
    DEFAULT_TWEETS
}

#[derive(Serialize, Debug)]
pub struct ApiResponse {
    topic: String,
    fallback: bool,
    tweets: Vec<TweetCard>,
}

#[derive(Serialize, Debug)]
pub struct ApiError {
    error: String,
}

/// Why a submission produced no tweets.
#[derive(Debug)]
enum Rejection {
    /// Form problem shown as a warning; the provider was not called.
    Invalid(StatusCode, String),
    /// Generation failed.
    Failed(StatusCode, String),
}

impl Rejection {
    fn status(&self) -> StatusCode {
        match self {
            Rejection::Invalid(status, _) | Rejection::Failed(status, _) => *status,
        }
    }

    fn message(&self) -> &str {
        match self {
            Rejection::Invalid(_, message) | Rejection::Failed(_, message) => message,
        }
    }
}

impl From<RequestError> for Rejection {
    fn from(err: RequestError) -> Self {
        let status = match err {
            // A blank topic only warns and waits for the user.
            RequestError::EmptyTopic => StatusCode::OK,
            RequestError::CountOutOfRange(_) => StatusCode::BAD_REQUEST,
        };
        Rejection::Invalid(status, err.to_string())
    }
}

impl From<GenerationError> for Rejection {
    fn from(err: GenerationError) -> Self {
        let status = match err {
            GenerationError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            GenerationError::Provider(_) => StatusCode::BAD_GATEWAY,
        };
        Rejection::Failed(status, err.user_message())
    }
}

async fn submit(
    state: &AppState,
    topic: &str,
    count: usize,
    language: Option<&str>,
) -> Result<(GenerationRequest, TweetList), Rejection> {
    let request = GenerationRequest::new(topic, count, language)?;

    let _permit = state.gate.try_acquire().ok_or_else(|| {
        warn!(target: TARGET_WEB_REQUEST, "Rejecting '{}', a generation is already in flight", request.topic());
        Rejection::Failed(
            StatusCode::TOO_MANY_REQUESTS,
            "A generation is already in progress, please wait for it to finish.".to_string(),
        )
    })?;

    let tweets = state.generator.generate(&request).await?;
    Ok((request, tweets))
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(
        &state.languages,
        state.generator.prompt().template.uses_language(),
        &FormValues::default(),
        PageBody::Empty,
    ))
}

async fn generate_page(
    State(state): State<Arc<AppState>>,
    Form(form): Form<GenerateForm>,
) -> (StatusCode, Html<String>) {
    info!(target: TARGET_WEB_REQUEST, "Form submission for topic '{}'", form.topic);

    let show_language = state.generator.prompt().template.uses_language();
    let count = form.count.trim().parse::<usize>();
    let values = FormValues {
        topic: &form.topic,
        count: *count.as_ref().unwrap_or(&DEFAULT_TWEETS),
        language: form.language.as_deref(),
    };

    let result = match count {
        Ok(count) => submit(&state, &form.topic, count, form.language.as_deref()).await,
        Err(_) => Err(Rejection::Invalid(
            StatusCode::BAD_REQUEST,
            "Number of tweets must be a whole number.".to_string(),
        )),
    };

    match result {
        Ok((_, tweets)) => (
            StatusCode::OK,
            Html(render_page(
                &state.languages,
                show_language,
                &values,
                PageBody::Tweets(&tweets),
            )),
        ),
        Err(rejection) => {
            let body = match &rejection {
                Rejection::Invalid(_, message) => PageBody::Warning(message),
                Rejection::Failed(_, message) => PageBody::Error(message),
            };
            let html = render_page(&state.languages, show_language, &values, body);
            (rejection.status(), Html(html))
        }
    }
}

async fn generate_api(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ApiRequest>,
) -> Result<Json<ApiResponse>, (StatusCode, Json<ApiError>)> {
    info!(target: TARGET_WEB_REQUEST, "API request for {} tweets on '{}'", payload.count, payload.topic);

    match submit(&state, &payload.topic, payload.count, payload.language.as_deref()).await {
        Ok((request, tweets)) => Ok(Json(ApiResponse {
            topic: request.topic().to_string(),
            fallback: tweets.is_fallback(),
            tweets: cards(&tweets),
        })),
        Err(rejection) => {
            // An empty topic is still an error for API clients.
            let status = match &rejection {
                Rejection::Invalid(status, _) if *status == StatusCode::OK => StatusCode::BAD_REQUEST,
                other => other.status(),
            };
            Err((
                status,
                Json(ApiError {
                    error: rejection.message().to_string(),
                }),
            ))
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate_page))
        .route("/api/tweets", post(generate_api))
        .with_state(state)
}

/// Runs the form server until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = router(Arc::new(state));
    let addr = format!("0.0.0.0:{}", port);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
