//! HTTP API routes.

use crate::conversation::sanitize::image_count;
use crate::conversation::{ContentBlock, ConversationStore, ImageRef, Role};
use crate::error::HubError;
use crate::models::Models;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use hub_common::config::Config;
use hub_common::logging::generate_trace_id;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;

/// Reply used when the chat model fails.
pub const FALLBACK_REPLY: &str = "I'm sorry, I'm having trouble right now. Please try again!";

const FALLBACK_MODEL: &str = "Error fallback";

const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Room for multipart boundaries, part headers and text fields on top of
/// the per-file upload limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub conversations: ConversationStore,
    pub models: Models,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(conversations: ConversationStore, models: Models) -> Self {
        Self {
            conversations,
            models,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            conversations: ConversationStore::new(config.conversation.max_turns),
            models: Models::from_config(&config.models),
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ConversationStore::default(), Models::default())
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        // Single-shot models
        .route("/predict", post(predict))
        .route("/sentiment_analysis", get(sentiment_analysis))
        // Chat and history
        .route("/chat", post(chat))
        .route("/chat/sessions", get(list_sessions))
        .route(
            "/chat/history/:session_id",
            get(get_history).delete(clear_history),
        )
        .layer(DefaultBodyLimit::max(limit))
        .layer(RequestBodyLimitLayer::new(limit))
        .with_state(state)
}

// ============ Health ============

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "msg": "Up and running! Visit /health for status."
    }))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active_sessions = state.conversations.session_count().await;

    Json(serde_json::json!({
        "status": "healthy",
        "service": "hub-server",
        "version": env!("CARGO_PKG_VERSION"),
        "msg": "Up and running! Chat is available.",
        "models": {
            "chat": state.models.chat.name(),
            "sentiment": state.models.sentiment.name(),
            "classifier": state.models.classifier.as_ref().map(|c| c.name()),
        },
        "active_sessions": active_sessions,
    }))
}

// ============ Uploads ============

/// One uploaded file pulled out of a multipart body.
struct Upload {
    file_name: Option<String>,
    image: ImageRef,
}

/// Validate an upload's declared type and size and wrap it as an image.
fn accept_image(
    content_type: Option<String>,
    file_name: Option<String>,
    data: Vec<u8>,
    max_bytes: usize,
) -> hub_common::Result<Upload> {
    let media_type = content_type.unwrap_or_default();
    if !ACCEPTED_IMAGE_TYPES.contains(&media_type.as_str()) {
        tracing::warn!(media_type = %media_type, "Rejected image upload");
        return Err(hub_common::Error::UnsupportedMediaType(
            "Please upload a JPEG or PNG image.".to_string(),
        ));
    }
    if data.is_empty() {
        return Err(hub_common::Error::InvalidInput("empty image upload".into()));
    }
    if data.len() > max_bytes {
        return Err(hub_common::Error::PayloadTooLarge(format!(
            "image is {} bytes, limit is {max_bytes}",
            data.len()
        )));
    }

    Ok(Upload {
        file_name,
        image: ImageRef::new(media_type, data),
    })
}

// ============ Classification ============

#[derive(Debug, Serialize)]
struct PredictResponse {
    filename: Option<String>,
    predicted_class: String,
    confidence: f64,
}

async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HubError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await?;
        upload = Some(accept_image(
            content_type,
            file_name,
            data.to_vec(),
            state.max_upload_bytes,
        )?);
    }

    let upload = upload.ok_or_else(|| HubError::InvalidRequest("missing file field".into()))?;

    let classifier = state
        .models
        .classifier
        .as_ref()
        .ok_or_else(|| HubError::ModelUnavailable("no image classifier configured".into()))?;

    let prediction = classifier.classify(&upload.image).await?;

    tracing::info!(
        label = %prediction.label,
        confidence = prediction.confidence,
        size_bytes = upload.image.size_bytes,
        "Image classified"
    );

    Ok(Json(PredictResponse {
        filename: upload.file_name,
        predicted_class: prediction.label,
        confidence: (prediction.confidence * 10_000.0).round() / 10_000.0,
    }))
}

// ============ Sentiment ============

#[derive(Debug, Deserialize)]
struct SentimentQuery {
    text: Option<String>,
}

async fn sentiment_analysis(
    State(state): State<AppState>,
    Query(query): Query<SentimentQuery>,
) -> Result<impl IntoResponse, HubError> {
    let text = query
        .text
        .ok_or_else(|| HubError::InvalidRequest("missing text query parameter".into()))?;

    let sentiment = state.models.sentiment.analyze(&text).await?;

    Ok(Json(serde_json::json!({
        "text": text,
        "sentiment": sentiment,
    })))
}

// ============ Chat ============

#[derive(Debug, Serialize)]
struct ChatResponse {
    message: String,
    response: String,
    has_image: bool,
    model_used: String,
    session_id: String,
    conversation_length: usize,
}

async fn chat(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HubError> {
    let mut message = None;
    let mut session_id = None;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("message") => message = Some(field.text().await?),
            Some("session_id") => session_id = Some(field.text().await?),
            Some("image") => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                // Browsers send an empty part when no file was picked.
                if !data.is_empty() {
                    upload = Some(accept_image(
                        content_type,
                        file_name,
                        data.to_vec(),
                        state.max_upload_bytes,
                    )?);
                }
            }
            _ => {}
        }
    }

    let message =
        message.ok_or_else(|| HubError::InvalidRequest("missing message field".into()))?;
    let session_id = session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let has_image = upload.is_some();
    let trace_id = generate_trace_id();
    let start = Instant::now();

    let mut content = Vec::with_capacity(2);
    if let Some(upload) = upload {
        content.push(ContentBlock::image(upload.image));
    }
    content.push(ContentBlock::text(message.clone()));
    let (epoch, history) = state
        .conversations
        .append_and_sanitize(&session_id, Role::User, content)
        .await;
    let context_images = image_count(&history);
    let chat_model = &state.models.chat;

    let (response, model_used) = match chat_model.generate(&history).await {
        Ok(reply) => (reply, chat_model.name().to_string()),
        Err(e) => {
            tracing::error!(
                trace_id = %trace_id,
                session_id = %session_id,
                error = %e,
                "Chat generation failed, using fallback reply"
            );
            (FALLBACK_REPLY.to_string(), FALLBACK_MODEL.to_string())
        }
    };

    // A session cleared while the model ran stays cleared.
    let conversation_length = state
        .conversations
        .append_to_epoch(
            &session_id,
            epoch,
            Role::Assistant,
            vec![ContentBlock::text(response.clone())],
        )
        .await
        .unwrap_or_else(|| {
            tracing::info!(
                trace_id = %trace_id,
                session_id = %session_id,
                "Session cleared during generation, reply not stored"
            );
            0
        });

    tracing::info!(
        trace_id = %trace_id,
        session_id = %session_id,
        has_image,
        context_images,
        history_len = conversation_length,
        duration_ms = start.elapsed().as_millis() as u64,
        "Chat turn completed"
    );

    Ok(Json(ChatResponse {
        message,
        response,
        has_image,
        model_used,
        session_id,
        conversation_length,
    }))
}

async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let history = state.conversations.get_history(&session_id).await;
    let length = history.len();

    Json(serde_json::json!({
        "session_id": session_id,
        "history": history,
        "length": length,
    }))
}

async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let existed = state.conversations.clear(&session_id).await;
    let message = if existed {
        format!("Conversation history cleared for session {session_id}")
    } else {
        format!("No conversation history found for session {session_id}")
    };

    tracing::info!(session_id = %session_id, existed, "Conversation cleared");

    Json(serde_json::json!({
        "message": message,
        "session_id": session_id,
        "existed": existed,
    }))
}

async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.conversations.list_sessions().await;
    let total = sessions.len();

    Json(serde_json::json!({
        "active_sessions": sessions,
        "total_sessions": total,
    }))
}
