//! Token endpoint handler.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Form, Json,
};

use crate::error::OAuthError;
use crate::handlers::client_auth::extract_client_credentials;
use crate::models::{TokenRequest, TokenResponse};
use crate::router::OAuthState;
use crate::scope::is_scope_allowed;
use crate::session::Session;

/// Token endpoint per RFC 6749 Section 3.2.
///
/// Exchanges an authorization code, refresh token or client credentials
/// for token material. Grants carrying an external subject are mirrored
/// into the token registry before the response is written; a registry
/// failure fails the whole exchange.
#[utoipa::path(
    post,
    path = "/oauth2/token",
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid grant or request"),
        (status = 401, description = "Client authentication failed"),
    ),
    tag = "OAuth2"
)]
pub async fn token_handler(
    State(state): State<OAuthState>,
    headers: HeaderMap,
    Form(form): Form<TokenRequest>,
) -> Response {
    match issue_token(&state, &headers, form).await {
        Ok(body) => Json(body).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn issue_token(
    state: &OAuthState,
    headers: &HeaderMap,
    form: TokenRequest,
) -> Result<TokenResponse, OAuthError> {
    let (client_id, client_secret) = extract_client_credentials(
        headers,
        form.client_id.as_deref(),
        form.client_secret.as_deref(),
    )?;

    let client = state
        .engine
        .authenticate_client(&client_id, client_secret.as_deref())
        .await?;

    if !client.allows_grant_type(&form.grant_type) {
        return Err(OAuthError::UnauthorizedClient(format!(
            "client may not use grant type {}",
            form.grant_type
        )));
    }

    let mut access = state.engine.access_request(&form, &client).await?;

    // Client-credentials grants have no consent step, so the session and
    // the granted scopes are decided here: the subject is the client
    // itself, and requested scopes are filtered against the client's
    // registered scopes instead of being rejected outright.
    if form.grant_type == "client_credentials" {
        access.session = Session::new(client.client_id.clone());
        let requested = access.requested_scopes.clone();
        for scope in &requested {
            if is_scope_allowed(&client.scopes, scope) {
                access.grant_scope(scope);
            }
        }
    }

    let response = state.engine.access_response(&mut access).await?;

    if let Some(external_subject) = access.session.external_subject.clone() {
        state
            .registry
            .create_token(&response.access_token, response.expires_in)
            .await?;
        state
            .registry
            .assign_token(&response.access_token, &external_subject)
            .await?;
    }

    tracing::info!(
        target: "token_lifecycle",
        client_id = %client.client_id,
        grant_type = %access.grant_type,
        scope = %response.scope,
        "access token issued"
    );

    Ok(TokenResponse {
        access_token: response.access_token,
        token_type: response.token_type,
        expires_in: response.expires_in,
        refresh_token: response.refresh_token,
        scope: (!response.scope.is_empty()).then(|| response.scope.clone()),
    })
}
