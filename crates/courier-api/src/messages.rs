use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, warn};

use courier_types::api::{
    Claims, MessageDetail, MessageEnvelope, MessageReceipt, ReadReceipt, SendMessageRequest,
    UserSummary,
};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // Run blocking DB query off the async runtime
    let db = state.clone();
    let username = claims.sub.clone();

    let row = tokio::task::spawn_blocking(move || db.db.get_message_for(message_id, &username))
        .await
        .map_err(|e| { error!("spawn_blocking join error: {}", e); ApiError::Internal })?
        .map_err(ApiError::internal)?
        // Missing id and foreign message look the same on purpose
        .ok_or(ApiError::NotFound)?;

    let detail = MessageDetail {
        id: row.id,
        body: row.body,
        sent_at: parse_sqlite_timestamp(&row.sent_at),
        read_at: row.read_at.as_deref().map(parse_sqlite_timestamp),
        from_user: UserSummary {
            username: row.from_username,
            first_name: row.from_first_name,
            last_name: row.from_last_name,
            phone: row.from_phone,
        },
        to_user: UserSummary {
            username: row.to_username,
            first_name: row.to_first_name,
            last_name: row.to_last_name,
            phone: row.to_phone,
        },
    };

    Ok(Json(MessageEnvelope { message: detail }))
}

pub async fn create_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.body.trim().is_empty() {
        return Err(ApiError::EmptyBody);
    }

    // Sender identity comes from the token, never from the payload
    let db = state.clone();
    let from_username = claims.sub.clone();

    let row = tokio::task::spawn_blocking(move || {
        db.db.insert_message(&from_username, &req.to_username, &req.body)
    })
    .await
    .map_err(|e| { error!("spawn_blocking join error: {}", e); ApiError::Internal })?
    .map_err(ApiError::internal)?
    .ok_or(ApiError::UnknownRecipient)?;

    let receipt = MessageReceipt {
        id: row.id,
        from_username: row.from_username,
        to_username: row.to_username,
        body: row.body,
        sent_at: parse_sqlite_timestamp(&row.sent_at),
    };

    Ok((StatusCode::CREATED, Json(MessageEnvelope { message: receipt })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let username = claims.sub.clone();

    let row = tokio::task::spawn_blocking(move || db.db.mark_read(message_id, &username))
        .await
        .map_err(|e| { error!("spawn_blocking join error: {}", e); ApiError::Internal })?
        .map_err(ApiError::internal)?
        // Covers a missing id and a caller who is not the recipient
        .ok_or(ApiError::NotFound)?;

    let receipt = ReadReceipt {
        id: row.id,
        read_at: parse_sqlite_timestamp(&row.read_at),
    };

    Ok(Json(MessageEnvelope { message: receipt }))
}

fn parse_sqlite_timestamp(raw: &str) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            chrono::DateTime::default()
        })
}
