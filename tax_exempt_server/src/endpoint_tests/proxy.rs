use actix_web::{http::StatusCode, test::TestRequest};
use chrono::{Duration, Utc};
use log::*;

use super::{helpers::*, mocks::MockCustomerDirectory};
use crate::dispatcher::{DirectoryError, ExemptionUpdate};

fn no_calls() -> MockCustomerDirectory {
    let mut directory = MockCustomerDirectory::new();
    directory.expect_update_tax_exemption().never();
    directory
}

fn expect_update(customer_id: &'static str, enable: bool) -> MockCustomerDirectory {
    let mut directory = MockCustomerDirectory::new();
    directory
        .expect_update_tax_exemption()
        .withf(move |id, e| id.as_str() == customer_id && *e == enable)
        .times(1)
        .returning(|_, enable| Ok(ExemptionUpdate { tax_exempt: enable, user_errors: vec![] }));
    directory
}

#[actix_web::test]
async fn session_token_enables_exemption() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/proxy?enable=1")
        .insert_header(("Authorization", bearer("gid://shopify/Customer/123")));
    let (status, body) = send_request(req, auth_config(), expect_update("123", true)).await;
    info!("Response body: {body}");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true,"taxExempt":true}"#);
}

#[actix_web::test]
async fn session_token_disables_exemption() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/proxy?enable=false")
        .insert_header(("Authorization", bearer("gid://shopify/Customer/42")));
    let (status, body) = send_request(req, auth_config(), expect_update("42", false)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true,"taxExempt":false}"#);
}

#[actix_web::test]
async fn session_token_ignores_customer_id_in_query() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/proxy?enable=1&customerId=999")
        .insert_header(("Authorization", bearer("gid://shopify/Customer/123")));
    let (status, _) = send_request(req, auth_config(), expect_update("123", true)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn enabling_twice_is_idempotent() {
    let _ = env_logger::try_init().ok();
    for _ in 0..2 {
        let req = TestRequest::post()
            .uri("/api/proxy?enable=1")
            .insert_header(("Authorization", bearer("gid://shopify/Customer/123")));
        let (status, body) = send_request(req, auth_config(), expect_update("123", true)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"ok":true,"taxExempt":true}"#);
    }
}

#[actix_web::test]
async fn signed_ping_does_not_touch_the_directory() {
    let _ = env_logger::try_init().ok();
    let query = signed_proxy_query("ping=1");
    let req = TestRequest::get().uri(&format!("/api/proxy?{query}"));
    let (status, body) = send_request(req, auth_config(), no_calls()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true}"#);
}

#[actix_web::test]
async fn signed_ping_with_trailing_slash() {
    let _ = env_logger::try_init().ok();
    let query = signed_proxy_query("ping=1");
    let req = TestRequest::post().uri(&format!("/api/proxy/?{query}"));
    let (status, body) = send_request(req, auth_config(), no_calls()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true}"#);
}

#[actix_web::test]
async fn signed_mutation_for_logged_in_customer() {
    let _ = env_logger::try_init().ok();
    let query = signed_proxy_query("enable=1&logged_in_customer_id=777");
    let req = TestRequest::post().uri(&format!("/api/proxy?{query}"));
    let (status, body) = send_request(req, auth_config(), expect_update("777", true)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true,"taxExempt":true}"#);
}

#[actix_web::test]
async fn signed_mutation_with_customer_id_parameter() {
    let _ = env_logger::try_init().ok();
    let query = signed_proxy_query("customerId=555&enable=0");
    let req = TestRequest::post().uri(&format!("/api/proxy?{query}"));
    let (status, body) = send_request(req, auth_config(), expect_update("555", false)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true,"taxExempt":false}"#);
}

#[actix_web::test]
async fn no_credential() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/proxy?enable=1&customerId=123");
    let (status, body) = send_request(req, auth_config(), no_calls()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"ok":false,"message":"No credential"}"#);
}

#[actix_web::test]
async fn tampered_signature() {
    let _ = env_logger::try_init().ok();
    // Sign for customer 555, then swap in another customer
    let query = signed_proxy_query("customerId=555&enable=1").replace("customerId=555", "customerId=556");
    let req = TestRequest::post().uri(&format!("/api/proxy?{query}"));
    let (status, body) = send_request(req, auth_config(), no_calls()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"ok":false,"message":"Bad signature"}"#);
}

#[actix_web::test]
async fn expired_session_token() {
    let _ = env_logger::try_init().ok();
    let token = session_token("gid://shopify/Customer/123", Duration::seconds(-10));
    let req = TestRequest::post().uri("/api/proxy?enable=1").insert_header(("Authorization", format!("Bearer {token}")));
    let (status, body) = send_request(req, auth_config(), no_calls()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"ok":false,"message":"Bad session token"}"#);
}

#[actix_web::test]
async fn ping_with_bad_token_is_relaxed_by_default() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/api/proxy?ping=1").insert_header(("Authorization", "Bearer not-a-token"));
    let (status, body) = send_request(req, auth_config(), no_calls()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true}"#);
}

#[actix_web::test]
async fn ping_with_bad_token_when_relaxation_is_off() {
    let _ = env_logger::try_init().ok();
    let mut config = auth_config();
    config.allow_unauthenticated_token_ping = false;
    let req = TestRequest::get().uri("/api/proxy?ping=1").insert_header(("Authorization", "Bearer not-a-token"));
    let (status, body) = send_request(req, config, no_calls()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"ok":false,"message":"Bad session token"}"#);
}

#[actix_web::test]
async fn stale_request() {
    let _ = env_logger::try_init().ok();
    let timestamp = Utc::now().timestamp() - 301;
    let query = signed(&format!("customerId=555&enable=1&shop={SHOP}&timestamp={timestamp}"));
    let req = TestRequest::post().uri(&format!("/api/proxy?{query}"));
    let (status, body) = send_request(req, auth_config(), no_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"ok":false,"message":"Stale request"}"#);
}

#[actix_web::test]
async fn wrong_shop() {
    let _ = env_logger::try_init().ok();
    let timestamp = Utc::now().timestamp();
    let query = signed(&format!("customerId=555&enable=1&shop=other.myshopify.com&timestamp={timestamp}"));
    let req = TestRequest::post().uri(&format!("/api/proxy?{query}"));
    let (status, body) = send_request(req, auth_config(), no_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"ok":false,"message":"Wrong shop"}"#);
}

#[actix_web::test]
async fn signed_mutation_without_customer() {
    let _ = env_logger::try_init().ok();
    let query = signed_proxy_query("enable=1");
    let req = TestRequest::post().uri(&format!("/api/proxy?{query}"));
    let (status, body) = send_request(req, auth_config(), no_calls()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"ok":false,"message":"customerId required"}"#);
}

#[actix_web::test]
async fn invalid_enable_flag() {
    let _ = env_logger::try_init().ok();
    for uri in ["/api/proxy", "/api/proxy?enable=yes", "/api/proxy?enable="] {
        let req = TestRequest::post().uri(uri).insert_header(("Authorization", bearer("gid://shopify/Customer/123")));
        let (status, body) = send_request(req, auth_config(), no_calls()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body.starts_with(r#"{"ok":false,"message":"Invalid enable flag."#), "was: {body}");
    }
}

#[actix_web::test]
async fn mutations_must_be_posted() {
    let _ = env_logger::try_init().ok();
    for req in [TestRequest::get(), TestRequest::put(), TestRequest::delete()] {
        let req = req.uri("/api/proxy?enable=1").insert_header(("Authorization", bearer("gid://shopify/Customer/123")));
        let (status, body) = send_request(req, auth_config(), no_calls()).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(body.starts_with(r#"{"ok":false,"message":"Method "#), "was: {body}");
    }
}

#[actix_web::test]
async fn ping_only_accepts_get_and_post() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::put().uri("/api/proxy?ping=1").insert_header(("Authorization", bearer("gid://shopify/Customer/123")));
    let (status, body) = send_request(req, auth_config(), no_calls()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, r#"{"ok":false,"message":"Method PUT is not allowed"}"#);
}

#[actix_web::test]
async fn preflight_skips_authentication() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::default().method(actix_web::http::Method::OPTIONS).uri("/api/proxy?enable=1");
    let (status, body) = send_request(req, auth_config(), no_calls()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn upstream_failure() {
    let _ = env_logger::try_init().ok();
    let mut directory = MockCustomerDirectory::new();
    directory
        .expect_update_tax_exemption()
        .times(1)
        .returning(|_, _| Err(DirectoryError::Unavailable("connection reset".into())));
    let req = TestRequest::post()
        .uri("/api/proxy?enable=1")
        .insert_header(("Authorization", bearer("gid://shopify/Customer/123")));
    let (status, body) = send_request(req, auth_config(), directory).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("connection reset"), "was: {body}");
    assert!(body.starts_with(r#"{"ok":false,"message":"Upstream error."#), "was: {body}");
}

#[actix_web::test]
async fn directory_user_error() {
    let _ = env_logger::try_init().ok();
    let mut directory = MockCustomerDirectory::new();
    directory.expect_update_tax_exemption().times(1).returning(|_, _| {
        Ok(ExemptionUpdate {
            tax_exempt: false,
            user_errors: vec!["Customer does not exist".into(), "Second error".into()],
        })
    });
    let req = TestRequest::post()
        .uri("/api/proxy?enable=1")
        .insert_header(("Authorization", bearer("gid://shopify/Customer/123")));
    let (status, body) = send_request(req, auth_config(), directory).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"ok":false,"message":"Customer does not exist"}"#);
}

#[actix_web::test]
async fn bypass_accepts_unsigned_requests() {
    let _ = env_logger::try_init().ok();
    let mut config = auth_config();
    config.disable_proxy_signature = true;
    let timestamp = Utc::now().timestamp();
    let uri = format!("/api/proxy?customerId=555&enable=1&shop={SHOP}&timestamp={timestamp}");
    let req = TestRequest::post().uri(&uri);
    let (status, body) = send_request(req, config, expect_update("555", true)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"ok":true,"taxExempt":true}"#);
}
