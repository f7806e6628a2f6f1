//! Token revocation endpoint handler.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};

use crate::error::OAuthError;
use crate::handlers::client_auth::extract_client_credentials;
use crate::models::RevocationRequest;
use crate::router::OAuthState;

/// Token revocation per RFC 7009.
///
/// Revoking an unknown, expired or already-revoked token returns the
/// same `200 OK` as revoking a live one, so the endpoint leaks nothing
/// about token validity. Client authentication failures are still
/// reported.
#[utoipa::path(
    post,
    path = "/oauth2/revoke",
    request_body(content = RevocationRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Revocation processed"),
        (status = 401, description = "Client authentication failed"),
    ),
    tag = "OAuth2"
)]
pub async fn revocation_handler(
    State(state): State<OAuthState>,
    headers: HeaderMap,
    Form(form): Form<RevocationRequest>,
) -> Response {
    match revoke(&state, &headers, form).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn revoke(
    state: &OAuthState,
    headers: &HeaderMap,
    form: RevocationRequest,
) -> Result<(), OAuthError> {
    let (client_id, client_secret) = extract_client_credentials(
        headers,
        form.client_id.as_deref(),
        form.client_secret.as_deref(),
    )?;
    let client = state
        .engine
        .authenticate_client(&client_id, client_secret.as_deref())
        .await?;

    state
        .engine
        .revoke(&form.token, form.token_type_hint.as_deref())
        .await?;

    tracing::info!(
        target: "token_lifecycle",
        client_id = %client.client_id,
        "token revocation processed"
    );
    Ok(())
}
