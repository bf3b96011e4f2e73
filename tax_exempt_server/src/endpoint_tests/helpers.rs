use actix_web::{
    body::MessageBody,
    http::StatusCode,
    middleware::NormalizePath,
    test,
    test::TestRequest,
    web,
    App,
};
use chrono::{Duration, Utc};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
};
use log::debug;
use txe_common::Secret;

use super::mocks::MockCustomerDirectory;
use crate::{
    auth::{session_token::SessionTokenClaims, sign_query, RequestAuthenticator},
    config::ProxyAuthConfig,
    dispatcher::MutationDispatcher,
    middleware::ProxyAuthMiddlewareFactory,
    routes::ProxyRoute,
};

pub const SHOP: &str = "b2b-test.myshopify.com";
// DO NOT re-use this secret anywhere.
pub const SECRET: &str = "e2a2f1b6c3d94c9b8a7f6e5d4c3b2a19";

pub fn auth_config() -> ProxyAuthConfig {
    ProxyAuthConfig::new(SHOP, Secret::from(SECRET))
}

/// Appends a valid signature to `query`.
pub fn signed(query: &str) -> String {
    format!("{query}&signature={}", sign_query(query, SECRET.as_bytes()))
}

/// A signed query for `SHOP` with a current timestamp. `extra` is prepended to the platform parameters.
pub fn signed_proxy_query(extra: &str) -> String {
    let query = format!("{extra}&shop={SHOP}&timestamp={}", Utc::now().timestamp());
    signed(query.trim_start_matches('&'))
}

pub fn session_token(subject: &str, valid_for: Duration) -> String {
    let mut claims = Claims::new(SessionTokenClaims { sub: subject.to_string() });
    claims.expiration = Some(Utc::now() + valid_for);
    let header = Header::empty().with_token_type("JWT");
    Hs256.token(&header, &claims, &Hs256Key::new(SECRET.as_bytes())).expect("Failed to sign token")
}

pub fn bearer(subject: &str) -> String {
    format!("Bearer {}", session_token(subject, Duration::minutes(1)))
}

/// Sends `req` to an app with the proxy route behind the authentication middleware, exactly as the server mounts it.
pub async fn send_request(
    req: TestRequest,
    config: ProxyAuthConfig,
    directory: MockCustomerDirectory,
) -> (StatusCode, String) {
    let authenticator = RequestAuthenticator::new(&config);
    let app = App::new()
        .wrap(NormalizePath::trim())
        .app_data(web::Data::new(MutationDispatcher::new(directory)))
        .service(
            web::scope("/api")
                .wrap(ProxyAuthMiddlewareFactory::new(authenticator))
                .service(ProxyRoute::<MockCustomerDirectory>::new()),
        );
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::call_service(&service, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
