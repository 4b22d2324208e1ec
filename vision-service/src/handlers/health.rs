use crate::dtos::HealthResponse;
use axum::{response::IntoResponse, Json};

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse::default())
}
