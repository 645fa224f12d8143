//! Bearer handling and the refresh-and-replay path of the API client.

#![allow(clippy::unwrap_used)]

use marketstall_integration_tests::{TestContext, cart_json};
use marketstall_storefront::{ApiError, ClientEvent, TokenKey, TokenStore};
use secrecy::ExposeSecret;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_refresh(ctx: &TestContext, response: ResponseTemplate, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/refresh-token"))
        .and(body_json(json!({ "refreshToken": "refresh-1" })))
        .respond_with(response)
        .expect(expected_calls)
        .mount(&ctx.server)
        .await;
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.server)
        .await;

    ctx.storefront
        .api()
        .get_items(Default::default())
        .await
        .unwrap();

    let requests = ctx.requests_to("GET", "/api/items").await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_bearer_attached_when_token_stored() {
    let ctx = TestContext::with_tokens(Some("access-1"), None).await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(&[])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    ctx.storefront.api().get_cart().await.unwrap();
}

#[tokio::test]
async fn test_single_401_refreshes_once_and_replays() {
    let ctx = TestContext::with_tokens(Some("expired"), Some("refresh-1")).await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(&[(5, 1)])))
        .expect(1)
        .mount(&ctx.server)
        .await;
    mount_refresh(
        &ctx,
        ResponseTemplate::new(200).set_body_json(json!({ "token": "access-2" })),
        1,
    )
    .await;

    let body = ctx.storefront.api().get_cart().await.unwrap();

    assert_eq!(body["items"][0]["quantity"], 1);
    assert_eq!(
        ctx.tokens.get(TokenKey::Access).unwrap().expose_secret(),
        "access-2"
    );
}

#[tokio::test]
async fn test_401_on_replay_is_returned_without_second_refresh() {
    let ctx = TestContext::with_tokens(Some("expired"), Some("refresh-1")).await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(401).set_body_string("still no"))
        .expect(2)
        .mount(&ctx.server)
        .await;
    mount_refresh(
        &ctx,
        ResponseTemplate::new(200).set_body_json(json!({ "token": "access-2" })),
        1,
    )
    .await;

    let err = ctx.storefront.api().get_cart().await.unwrap_err();

    assert_eq!(err.status().map(|status| status.as_u16()), Some(401));
    assert!(!err.is_session_expired());
}

#[tokio::test]
async fn test_refresh_failure_clears_tokens_and_requests_login() {
    let ctx = TestContext::with_tokens(Some("expired"), Some("refresh-1")).await;
    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&ctx.server)
        .await;
    mount_refresh(&ctx, ResponseTemplate::new(401), 1).await;

    let mut events = ctx.storefront.api().subscribe();
    let err = ctx.storefront.api().list_orders().await.unwrap_err();

    assert!(matches!(err, ApiError::RefreshFailed(_)));
    assert!(ctx.tokens.get(TokenKey::Access).is_none());
    assert!(ctx.tokens.get(TokenKey::Refresh).is_none());
    assert_eq!(
        events.try_recv().unwrap(),
        ClientEvent::LoginRequired {
            login_path: "/login".to_string()
        }
    );
}

#[tokio::test]
async fn test_missing_refresh_token_is_a_refresh_failure() {
    let ctx = TestContext::with_tokens(Some("expired"), None).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/history"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&ctx.server)
        .await;
    mount_refresh(&ctx, ResponseTemplate::new(200), 0).await;

    let err = ctx.storefront.api().order_history().await.unwrap_err();

    assert!(err.is_session_expired());
    assert!(!ctx.tokens.has_access_token());
}

#[tokio::test]
async fn test_other_error_statuses_pass_through() {
    let ctx = TestContext::with_tokens(Some("access-1"), Some("refresh-1")).await;
    Mock::given(method("GET"))
        .and(path("/api/orders/9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such order"))
        .mount(&ctx.server)
        .await;
    mount_refresh(&ctx, ResponseTemplate::new(200), 0).await;

    let err = ctx
        .storefront
        .api()
        .get_order(marketstall_core::OrderId::new(9))
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, body, .. } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, "no such order");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(ctx.tokens.has_access_token());
}
