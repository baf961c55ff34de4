use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use wdr_api::{CallResponse, ContractFault, ContractHandler, ContractRegistration};
use wdr_auth::{PermittedScopes, StaticTokenConfig};
use wdr_core::RoutePrefix;
use wdr_server::{AppConfig, ContractMount, build_app, build_state};

const STUDY: &str = "Study:9B2C3F48-2941-4A57-A5B6-6FA8A1B4D3C2";

struct StoreContract;

#[async_trait]
impl ContractHandler for StoreContract {
    async fn invoke(
        &self,
        operation: &str,
        args: Value,
        _caller: &PermittedScopes,
    ) -> Result<CallResponse, ContractFault> {
        match operation {
            "Echo" => Ok(CallResponse::new(args)),
            "Fail" => Err(ContractFault::failed("store offline")),
            other => Err(ContractFault::unknown_operation(other)),
        }
    }
}

fn config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.api.oauth_token_request_url = Some("https://login.example.org/authorize".into());
    cfg.auth
        .roles
        .insert("editor".into(), vec!["WdrStoreAccess".into(), "NotPublished".into()]);
    cfg.auth.static_tokens = vec![
        StaticTokenConfig {
            token: "editor-token".into(),
            subject: "alice".into(),
            roles: vec!["editor".into()],
            scopes: vec![STUDY.into()],
            ..Default::default()
        },
        StaticTokenConfig {
            token: "reader-token".into(),
            subject: "bob".into(),
            scopes: vec![STUDY.into()],
            ..Default::default()
        },
        StaticTokenConfig {
            token: "expired-token".into(),
            subject: "carol".into(),
            roles: vec!["editor".into()],
            expires_at: Some(time::OffsetDateTime::UNIX_EPOCH),
            ..Default::default()
        },
        StaticTokenConfig {
            token: "disabled-token".into(),
            subject: "dave".into(),
            roles: vec!["editor".into()],
            disabled: true,
            ..Default::default()
        },
    ];
    cfg
}

fn app() -> Router {
    let cfg = config();
    let mount = ContractMount::new(
        ContractRegistration::new("IWdrStore", RoutePrefix::parse("wdr/v2/Store").unwrap())
            .with_capability("WdrStoreAccess"),
        Arc::new(StoreContract),
    );
    let state = build_state(&cfg, &[mount]).expect("state");
    build_app(state, &cfg)
}

async fn call(app: Router, path: &str, token: Option<&str>, body: &str) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let response = app
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn healthz_is_ok() {
    let response = app()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn discovery_version_and_capabilities() {
    let (status, body) = call(app(), "/wdr/v2/WdrApiInfo/GetApiVersion", None, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"return": "2.0.0"}));

    let (status, body) = call(app(), "/wdr/v2/WdrApiInfo/GetCapabilities", None, "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"return": ["WdrStoreAccess"]}));

    let (_, body) = call(app(), "/wdr/v2/WdrApiInfo/GetOAuthTokenRequestUrl", None, "").await;
    assert_eq!(body, json!({"return": "https://login.example.org/authorize"}));
}

#[tokio::test]
async fn discovery_permitted_scopes() {
    let path = "/wdr/v2/WdrApiInfo/GetPermittedAuthScopes";

    let (status, body) = call(app(), path, None, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"return": [], "authState": 0}));

    let (_, body) = call(app(), path, Some("editor-token"), "").await;
    assert_eq!(body, json!({"return": ["WdrStoreAccess", STUDY], "authState": 1}));

    let (_, body) = call(app(), path, Some("expired-token"), "").await;
    assert_eq!(body, json!({"return": [], "authState": -1}));

    let (_, body) = call(app(), path, Some("disabled-token"), "").await;
    assert_eq!(body, json!({"return": [], "authState": -2}));

    let (_, body) = call(app(), path, Some("never-issued"), "").await;
    assert_eq!(body, json!({"return": [], "authState": -2}));
}

#[tokio::test]
async fn non_bearer_authorization_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/wdr/v2/WdrApiInfo/GetPermittedAuthScopes")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gated_contract_status_codes() {
    let path = "/wdr/v2/Store/Echo";

    let (status, body) = call(app(), path, Some("editor-token"), r#"{"value": 42}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"return": {"value": 42}}));

    let (status, body) = call(app(), path, None, "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["authState"], json!(0));
    assert!(body["fault"].is_string());

    let (status, body) = call(app(), path, Some("expired-token"), "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["authState"], json!(-1));

    let (status, body) = call(app(), path, Some("reader-token"), "").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.get("authState").is_none());

    let (status, body) = call(app(), "/wdr/v2/Store/Fail", Some("editor-token"), "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"fault": "store offline"}));
}

#[tokio::test]
async fn unknown_routes_and_bad_bodies() {
    let (status, body) = call(app(), "/wdr/v2/Nowhere/Call", None, "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["fault"].as_str().unwrap().contains("wdr/v2/Nowhere/Call"));

    let (status, _) = call(app(), "/wdr/v2/WdrApiInfo/Shutdown", None, "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(app(), "/wdr/v2/WdrApiInfo/GetApiVersion", None, "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(app(), "/wdr/v2/WdrApiInfo/GetApiVersion", None, "[1]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test]
fn conflicting_routes_abort_startup() {
    let cfg = config();
    let mount = ContractMount::new(
        ContractRegistration::new(
            "IImpostor",
            RoutePrefix::parse("wdr/v2/WdrApiInfo").unwrap(),
        ),
        Arc::new(StoreContract),
    );
    let err = build_state(&cfg, &[mount]).err().expect("duplicate route must fail");
    assert!(format!("{err:#}").contains("IImpostor"));
}
