use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use log::error;

use crate::{
    feedback_prompt, simple_chat_prompt, ApiError, AppState, ChatRequest, ChatResponse,
    SimpleChatRequest, SimpleChatResponse,
};

#[utoipa::path(
    post,
    path = "/chat/weather",
    request_body = ChatRequest,
    responses(
        (status = OK, description = "Feedback on the plan for that day", body = ChatResponse),
        (status = BAD_REQUEST, description = "Invalid time or location"),
        (status = INTERNAL_SERVER_ERROR, description = "Weather data or model reply unavailable")
    ))]
pub async fn chat_weather(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let window = body.time.window(state.reference_year)?;
    let point = body.location.point()?;

    let summary = state.weather.summarize(point, window).await?;
    let prompt = feedback_prompt(
        &summary,
        &body.time.start_time,
        &body.time.end_time,
        &body.prompt,
    );
    let res = state.chat.complete(prompt).await?;
    Ok(Json(ChatResponse { res }))
}

#[utoipa::path(
    post,
    path = "/chat/simple",
    request_body = SimpleChatRequest,
    responses(
        (status = OK, description = "Model reply", body = SimpleChatResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Model unavailable", body = SimpleChatResponse)
    ))]
pub async fn simple_chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SimpleChatRequest>,
) -> (StatusCode, Json<SimpleChatResponse>) {
    let prompt = simple_chat_prompt(
        &body.prompt,
        body.location.as_ref(),
        body.current_time.as_deref(),
        body.weather_data.as_ref(),
    );

    match state.chat.complete(prompt).await {
        Ok(reply) => (StatusCode::OK, Json(SimpleChatResponse::success(reply))),
        Err(e) => {
            error!("simple chat failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SimpleChatResponse::error(e)),
            )
        }
    }
}
