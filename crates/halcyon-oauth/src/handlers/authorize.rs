//! Authorization endpoint handler.
//!
//! Drives the consent handshake across three HTTP interactions: the
//! initial authorize request, the redirect to the external consent
//! provider, and the return with a signed consent proof. The consent
//! session cookie is the only state the browser carries across that gap.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use url::Url;

use crate::consent::ConsentCookie;
use crate::error::{render_authorize_error, OAuthError};
use crate::models::{AuthorizeParams, AuthorizeRequest};
use crate::router::{OAuthState, AUTH_PATH};
use crate::scope::{is_scope_allowed, parse_scope};

/// Authorization endpoint, query-parameter form.
#[utoipa::path(
    get,
    path = "/oauth2/auth",
    params(AuthorizeParams),
    responses(
        (status = 302, description = "Redirect to the consent provider (challenge) or back to the client (code or error)"),
    ),
    tag = "OAuth2"
)]
pub async fn authorize_query_handler(
    State(state): State<OAuthState>,
    headers: HeaderMap,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    process_authorize(&state, &headers, params).await
}

/// Authorization endpoint, form-encoded body.
pub async fn authorize_form_handler(
    State(state): State<OAuthState>,
    headers: HeaderMap,
    Form(params): Form<AuthorizeParams>,
) -> Response {
    process_authorize(&state, &headers, params).await
}

async fn process_authorize(
    state: &OAuthState,
    headers: &HeaderMap,
    params: AuthorizeParams,
) -> Response {
    let consent_url = &state.config.consent_url;

    // Until the redirect URI has been validated against the client's
    // registration, no error may be redirected to it.
    let request = match build_request(state, &params).await {
        Ok(request) => request,
        Err(err) => return render_authorize_error(&err, None, consent_url),
    };

    if !request.client.allows_response_type(&request.response_type) {
        let err = OAuthError::UnsupportedResponseType(request.response_type.clone());
        return render_authorize_error(&err, Some(&request), consent_url);
    }
    for scope in &request.scopes {
        if !is_scope_allowed(&request.client.scopes, scope) {
            let err = OAuthError::InvalidScope(format!("client may not request scope {scope}"));
            return render_authorize_error(&err, Some(&request), consent_url);
        }
    }

    let mut cookie = ConsentCookie::from_headers(headers, &state.config.cookie_key);

    match params.consent.as_deref() {
        None => match redirect_to_consent(state, headers, &params, &request, &mut cookie) {
            Ok(response) => response,
            Err(err) => render_authorize_error(&err, Some(&request), consent_url),
        },
        Some(proof) => finish_authorize(state, &request, proof, &mut cookie).await,
    }
}

/// Resolve the client and validate the redirect URI. Everything that can
/// fail here fails before the redirect URI is trusted.
async fn build_request(
    state: &OAuthState,
    params: &AuthorizeParams,
) -> Result<AuthorizeRequest, OAuthError> {
    let client = state.engine.client(&params.client_id).await?;

    if !client.has_redirect_uri(&params.redirect_uri) {
        return Err(OAuthError::InvalidRequest(
            "redirect_uri is not registered for this client".to_string(),
        ));
    }
    let redirect_uri = Url::parse(&params.redirect_uri)
        .map_err(|_| OAuthError::InvalidRequest("redirect_uri is not a valid URL".to_string()))?;

    Ok(AuthorizeRequest {
        client,
        response_type: params.response_type.clone(),
        scopes: params.scope.as_deref().map(parse_scope).unwrap_or_default(),
        redirect_uri,
        state: params.state.clone(),
        nonce: params.nonce.clone(),
        redirect_valid: true,
    })
}

/// Received → Pending-Consent: mint a challenge and send the browser to
/// the consent provider, persisting the nonce cookie alongside.
fn redirect_to_consent(
    state: &OAuthState,
    headers: &HeaderMap,
    params: &AuthorizeParams,
    request: &AuthorizeRequest,
    cookie: &mut ConsentCookie,
) -> Result<Response, OAuthError> {
    let return_url = authorize_return_url(state, headers, params)?;
    let challenge = state
        .consent
        .issue_challenge(request, &return_url, cookie)?;

    let mut target = state.config.consent_url.clone();
    target
        .query_pairs_mut()
        .append_pair("challenge", &challenge);

    let set_cookie = persist_cookie(state, cookie)?;

    tracing::info!(
        client_id = %request.client.client_id,
        "consent challenge issued"
    );

    let mut response =
        (StatusCode::FOUND, [(header::LOCATION, target.to_string())]).into_response();
    response.headers_mut().insert(header::SET_COOKIE, set_cookie);
    Ok(response)
}

/// Consented → Terminal: validate the proof, persist the rotated cookie,
/// and let the grant engine mint the final authorize response.
///
/// Once validation has consumed the nonce, every outcome carries the
/// rotated cookie. An error redirect without it would leave the old
/// nonce live in the browser and the consent response replayable.
async fn finish_authorize(
    state: &OAuthState,
    request: &AuthorizeRequest,
    proof: &str,
    cookie: &mut ConsentCookie,
) -> Response {
    let consent_url = &state.config.consent_url;

    let session = match state.consent.validate_response(request, proof, cookie) {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(
                client_id = %request.client.client_id,
                error = %err,
                "consent validation failed"
            );
            return render_authorize_error(&OAuthError::from(err), Some(request), consent_url);
        }
    };

    let set_cookie = match persist_cookie(state, cookie) {
        Ok(value) => value,
        Err(err) => return render_authorize_error(&err, Some(request), consent_url),
    };

    let subject = session.subject.clone();
    let mut response = match state.engine.authorize_response(request, session).await {
        Ok(grant) => {
            let mut target = request.redirect_uri.clone();
            {
                let mut query = target.query_pairs_mut();
                for (key, value) in &grant.redirect_params {
                    query.append_pair(key, value);
                }
                if let Some(client_state) = &request.state {
                    query.append_pair("state", client_state);
                }
            }
            tracing::info!(
                client_id = %request.client.client_id,
                subject = %subject,
                "authorization granted"
            );
            (StatusCode::FOUND, [(header::LOCATION, target.to_string())]).into_response()
        }
        Err(err) => render_authorize_error(&OAuthError::from(err), Some(request), consent_url),
    };

    response.headers_mut().insert(header::SET_COOKIE, set_cookie);
    response
}

/// The URL the consent provider sends the user back to: this endpoint,
/// with the original parameters.
fn authorize_return_url(
    state: &OAuthState,
    headers: &HeaderMap,
    params: &AuthorizeParams,
) -> Result<String, OAuthError> {
    let scheme = if state.config.forced_http { "http" } else { "https" };
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| OAuthError::InvalidRequest("Host header is required".to_string()))?;
    let query = serde_urlencoded::to_string(params)
        .map_err(|_| OAuthError::Internal("could not encode authorize request".to_string()))?;

    Ok(format!("{scheme}://{host}{AUTH_PATH}?{query}"))
}

fn persist_cookie(
    state: &OAuthState,
    cookie: &ConsentCookie,
) -> Result<HeaderValue, OAuthError> {
    let value = cookie.to_set_cookie(&state.config.cookie_key, !state.config.forced_http);
    HeaderValue::from_str(&value)
        .map_err(|_| OAuthError::Internal("could not persist consent session cookie".to_string()))
}
