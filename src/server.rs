//! HTTP front door for the story pipeline.

use crate::core::config::ServerConfig;
use crate::core::error::{GenerationError, ModelCallError};
use crate::core::story::{StoryDocument, StoryRequest, MAX_AGE, MIN_AGE};
use crate::services::story::StoryGenerator;
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    generator: Arc<StoryGenerator>,
}

impl AppState {
    pub fn new(generator: Arc<StoryGenerator>) -> Self {
        Self { generator }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/story", post(create_story))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Storybook service listening on http://{}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Storybook service shutting down");
        })
        .await
        .context("HTTP server error")?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct StoryInput {
    pub text: String,
    pub paragraph: String,
    pub age: f64,
    pub generate_images: Option<bool>,
}

impl StoryInput {
    pub fn into_request(self) -> Result<StoryRequest, String> {
        if self.text.trim().is_empty() {
            return Err("text should not be empty".to_string());
        }
        if self.paragraph.trim().is_empty() {
            return Err("paragraph should not be empty".to_string());
        }
        if self.age.fract() != 0.0 || self.age < MIN_AGE as f64 || self.age > MAX_AGE as f64 {
            return Err(format!("age must be a whole number between {} and {}", MIN_AGE, MAX_AGE));
        }

        Ok(StoryRequest::new(self.text, self.paragraph, self.age as u8)
            .with_images(self.generate_images.unwrap_or(true)))
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        let status = match &err {
            GenerationError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GenerationError::Model(ModelCallError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            GenerationError::Model(_) | GenerationError::Parse(_) => StatusCode::BAD_GATEWAY,
        };
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "statusCode": self.status.as_u16(),
            "message": self.message,
            "error": self.status.canonical_reason().unwrap_or("Error"),
        });
        (self.status, Json(body)).into_response()
    }
}

async fn index() -> &'static str {
    "Storybook service is running"
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn create_story(
    State(state): State<AppState>,
    payload: Result<Json<StoryInput>, JsonRejection>,
) -> Result<Json<StoryDocument>, ApiError> {
    let Json(input) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = input.into_request().map_err(ApiError::bad_request)?;

    let document = state.generator.generate(&request).await.map_err(|e| {
        log::error!("Error generating story: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ResponseParseError;

    fn input(age: f64) -> StoryInput {
        StoryInput {
            text: "The Brave Fox".to_string(),
            paragraph: "A fox explores a forest.".to_string(),
            age,
            generate_images: None,
        }
    }

    #[test]
    fn test_input_conversion() {
        let req = input(6.0).into_request().unwrap();
        assert_eq!(req.title, "The Brave Fox");
        assert_eq!(req.story, "A fox explores a forest.");
        assert_eq!(req.target_age, 6);
        assert!(req.generate_images);
    }

    #[test]
    fn test_input_rejects_bad_age() {
        assert!(input(2.0).into_request().is_err());
        assert!(input(13.0).into_request().is_err());
        assert!(input(6.5).into_request().is_err());
        assert!(input(3.0).into_request().is_ok());
        assert!(input(12.0).into_request().is_ok());
    }

    #[test]
    fn test_input_rejects_blank_fields() {
        let mut body = input(6.0);
        body.paragraph = "   ".to_string();
        assert!(body.into_request().unwrap_err().contains("paragraph"));
    }

    #[test]
    fn test_error_status_mapping() {
        let err: ApiError = GenerationError::InvalidRequest("x".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = GenerationError::Model(ModelCallError::Timeout(60)).into();
        assert_eq!(err.status, StatusCode::GATEWAY_TIMEOUT);

        let err: ApiError = GenerationError::Parse(ResponseParseError::new("bad", "Sorry")).into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert!(err.message.contains("Sorry"));
    }
}
