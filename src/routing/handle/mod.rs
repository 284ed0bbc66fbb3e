use axum::http::StatusCode;

pub mod auth;
pub mod browse;
pub mod download;
pub mod delete;
pub mod suggest;
pub mod upload;
pub mod admin;

pub async fn ping() -> (StatusCode, &'static str) {
    (StatusCode::OK, "pong")
}
