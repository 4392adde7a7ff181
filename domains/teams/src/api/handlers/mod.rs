//! HTTP handlers for the Teams domain

pub mod admin;
pub mod oauth;
pub mod teams;
pub mod users;

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};

/// 302 to `location`
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}
