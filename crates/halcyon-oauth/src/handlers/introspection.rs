//! Token introspection endpoint handler.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Form, Json,
};

use crate::error::OAuthError;
use crate::handlers::client_auth::extract_client_credentials;
use crate::models::{IntrospectionRequest, IntrospectionResponse};
use crate::router::OAuthState;
use crate::session::TokenKind;

/// Token introspection per RFC 7662.
///
/// The verdict comes from the grant engine: an engine miss is rendered
/// as `{ "active": false }`, an engine failure as `server_error`. Only
/// authenticated clients may introspect.
#[utoipa::path(
    post,
    path = "/oauth2/introspect",
    request_body(content = IntrospectionRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Introspection result", body = IntrospectionResponse),
        (status = 401, description = "Client authentication failed"),
    ),
    tag = "OAuth2"
)]
pub async fn introspection_handler(
    State(state): State<OAuthState>,
    headers: HeaderMap,
    Form(form): Form<IntrospectionRequest>,
) -> Response {
    match introspect(&state, &headers, form).await {
        Ok(body) => Json(body).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn introspect(
    state: &OAuthState,
    headers: &HeaderMap,
    form: IntrospectionRequest,
) -> Result<IntrospectionResponse, OAuthError> {
    let (client_id, client_secret) = extract_client_credentials(
        headers,
        form.client_id.as_deref(),
        form.client_secret.as_deref(),
    )?;
    state
        .engine
        .authenticate_client(&client_id, client_secret.as_deref())
        .await?;

    let Some(access) = state.engine.introspect(&form.token).await? else {
        return Ok(IntrospectionResponse::inactive());
    };

    // Sessions without an explicit access-token expiry fall back to the
    // configured lifespan, anchored at the original request time.
    let exp = access
        .session
        .expiry(TokenKind::AccessToken)
        .unwrap_or(access.requested_at + state.config.access_token_lifespan);

    Ok(IntrospectionResponse {
        active: true,
        client_id: Some(access.client.client_id.clone()),
        scope: Some(access.granted_scopes.join(" ")),
        exp: Some(exp.timestamp()),
        iat: Some(access.requested_at.timestamp()),
        sub: Some(access.session.subject.clone()),
        username: (!access.session.username.is_empty())
            .then(|| access.session.username.clone()),
        aud: Some(access.client.client_id.clone()),
        ext: (!access.session.extra.is_empty()).then(|| access.session.extra.clone()),
    })
}
