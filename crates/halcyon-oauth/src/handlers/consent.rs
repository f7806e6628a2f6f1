//! Placeholder consent endpoint.

use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConsentQuery {
    pub challenge: Option<String>,
}

/// Development stand-in for the external consent provider.
///
/// A real deployment points `consent_url` at its own consent application,
/// which authenticates the user, signs a consent decision over the
/// challenge and redirects back. This handler only makes the missing
/// integration visible.
pub async fn consent_placeholder_handler(Query(query): Query<ConsentQuery>) -> Response {
    if query.challenge.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Html("<p>Missing consent challenge.</p>".to_string()),
        )
            .into_response();
    }

    Html(
        "<p>This endpoint is a placeholder. Configure a consent provider \
         that verifies the challenge, authenticates the user and redirects \
         back with a signed consent decision.</p>"
            .to_string(),
    )
    .into_response()
}
