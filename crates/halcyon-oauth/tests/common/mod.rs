//! Shared helpers for integration tests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::Duration;
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;

use halcyon_oauth::{
    oauth_router, Client, MemoryEngine, OAuthConfig, OAuthState, SignedConsentStrategy,
    TokenRegistry, TokenRegistryConfig,
};

pub const COOKIE_KEY: &[u8] = b"integration-test-cookie-key-32b!";
pub const HOST: &str = "idp.example.test";
pub const ISSUER: &str = "https://idp.example.test";
pub const CONSENT_URL: &str = "https://consent.example.test/ui";
pub const APP_REDIRECT: &str = "https://app.example.test/cb";

/// A router wired to an in-memory engine, plus handles on the pieces the
/// tests drive directly.
pub struct TestServer {
    pub app: Router,
    pub engine: MemoryEngine,
    pub strategy: Arc<SignedConsentStrategy>,
}

pub fn test_server() -> TestServer {
    test_server_with_registry(TokenRegistryConfig::default())
}

pub fn test_server_with_registry(registry: TokenRegistryConfig) -> TestServer {
    let config = OAuthConfig::new(
        ISSUER,
        Url::parse(CONSENT_URL).unwrap(),
        Duration::hours(1),
        COOKIE_KEY.to_vec(),
    )
    .unwrap()
    .with_forced_http(true);

    let engine = MemoryEngine::new(Duration::hours(1));
    engine.register_client(Client {
        client_id: "web-app".to_string(),
        client_secret: Some("web-secret".to_string()),
        redirect_uris: vec![APP_REDIRECT.to_string()],
        scopes: vec!["read".to_string(), "write".to_string()],
        grant_types: vec![
            "authorization_code".to_string(),
            "refresh_token".to_string(),
        ],
        response_types: vec!["code".to_string()],
    });
    engine.register_client(Client {
        client_id: "service".to_string(),
        client_secret: Some("service-secret".to_string()),
        redirect_uris: vec![],
        scopes: vec!["read".to_string()],
        grant_types: vec!["client_credentials".to_string()],
        response_types: vec![],
    });

    let strategy = Arc::new(SignedConsentStrategy::from_config(&config));

    let state = OAuthState {
        engine: Arc::new(engine.clone()),
        consent: strategy.clone(),
        config: Arc::new(config),
        registry: Arc::new(TokenRegistry::new(registry).unwrap()),
    };

    TestServer {
        app: oauth_router(state),
        engine,
        strategy,
    }
}

/// Drive one request through the router and collect the response parts.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Response<Body>) {
    let response = app.clone().oneshot(request).await.unwrap();
    (response.status(), response)
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The `Location` header, parsed.
pub fn location(response: &Response<Body>) -> Url {
    let value = response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap();
    Url::parse(value).unwrap()
}

pub fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// The `name=value` pair from a `Set-Cookie` header, ready to be echoed
/// back as a `Cookie` header.
pub fn cookie_pair(response: &Response<Body>) -> String {
    let value = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("missing Set-Cookie header")
        .to_str()
        .unwrap();
    value.split(';').next().unwrap().to_string()
}

pub fn authorize_uri(query: &str) -> String {
    format!("/oauth2/auth?{query}")
}

pub fn authorize_request(query: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(authorize_uri(query))
        .header(header::HOST, HOST);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_request(path: &str, form: &str, basic_auth: Option<(&str, &str)>) -> Request<Body> {
    use base64::{engine::general_purpose::STANDARD, Engine};

    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some((id, secret)) = basic_auth {
        let encoded = STANDARD.encode(format!("{id}:{secret}"));
        builder = builder.header(header::AUTHORIZATION, format!("Basic {encoded}"));
    }
    builder.body(Body::from(form.to_string())).unwrap()
}
