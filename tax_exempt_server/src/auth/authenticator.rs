//! The authentication decision for a single proxy request.
//!
//! Two credentials are understood, checked in this order:
//! 1. An `Authorization: Bearer` session token. If the header is present, it alone decides the outcome.
//! 2. A signed app proxy query string (`signature` parameter), followed by shop and freshness checks.
//!
//! Anything else is rejected. [`RequestAuthenticator::authenticate`] is a pure function of the request (including its
//! arrival time) and the configuration, so it can be exercised without a server.
//!
//! ## Customer identity
//! Under a session token the customer is the token's subject. Under a proxy signature the customer comes from the
//! `logged_in_customer_id` parameter that Shopify adds, or failing that, from the `customerId` parameter the
//! storefront sent. Both are covered by the signature, but `customerId` is chosen by the storefront script, so it is
//! a weaker trust path than a session token. Prefer session tokens.
use actix_web::{http::header::AUTHORIZATION, http::Method, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use log::*;
use serde::Serialize;
use txe_common::CustomerId;

use super::{
    query::{QueryParameterSet, SIGNATURE_PARAM},
    session_token::SessionTokenVerifier,
    signature::ProxySignatureVerifier,
};
use crate::{config::ProxyAuthConfig, errors::AuthRejection};

pub const PING_PARAM: &str = "ping";
pub const SHOP_PARAM: &str = "shop";
pub const TIMESTAMP_PARAM: &str = "timestamp";
pub const CUSTOMER_ID_PARAM: &str = "customerId";
pub const LOGGED_IN_CUSTOMER_ID_PARAM: &str = "logged_in_customer_id";
pub const ENABLE_PARAM: &str = "enable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub method: Method,
    /// The query string exactly as received, without the leading `?`.
    pub raw_query: String,
    pub authorization: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl IncomingRequest {
    pub fn new(method: Method, raw_query: &str, authorization: Option<&str>, received_at: DateTime<Utc>) -> Self {
        Self {
            method,
            raw_query: raw_query.to_string(),
            authorization: authorization.map(String::from),
            received_at,
        }
    }

    pub fn from_http_request(req: &HttpRequest, received_at: DateTime<Utc>) -> Self {
        let authorization = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        Self::new(req.method().clone(), req.query_string(), authorization, received_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Channel {
    ProxySignature,
    SessionToken,
}

/// A customer identity that came out of a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    customer_id: CustomerId,
    channel: Channel,
}

impl VerifiedIdentity {
    fn new(customer_id: CustomerId, channel: Channel) -> Self {
        Self { customer_id, channel }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(customer_id: &str, channel: Channel) -> Self {
        Self::new(customer_id.parse().expect("valid customer id"), channel)
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }
}

/// The result of a successful authentication. `identity` is absent for signed requests that name no customer and for
/// relaxed health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    channel: Channel,
    identity: Option<VerifiedIdentity>,
    ping: bool,
}

impl Authorization {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn identity(&self) -> Option<&VerifiedIdentity> {
        self.identity.as_ref()
    }

    pub fn is_ping(&self) -> bool {
        self.ping
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized(Authorization),
    Rejected(AuthRejection),
}

/// Freshness rules for signed proxy requests. Session tokens carry their own expiry.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    /// Maximum distance, in either direction, between `timestamp` and the arrival time. The bound is inclusive.
    pub max_age: Duration,
    pub require_timestamp: bool,
}

impl FreshnessPolicy {
    pub fn is_fresh(&self, timestamp: &str, now: DateTime<Utc>) -> bool {
        let Ok(timestamp) = timestamp.trim().parse::<i64>() else {
            return false;
        };
        now.timestamp()
            .checked_sub(timestamp)
            .and_then(i64::checked_abs)
            .is_some_and(|age| age <= self.max_age.num_seconds())
    }
}

#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    signature_verifier: ProxySignatureVerifier,
    token_verifier: SessionTokenVerifier,
    shop: String,
    freshness: FreshnessPolicy,
    allow_unauthenticated_token_ping: bool,
}

impl RequestAuthenticator {
    pub fn new(config: &ProxyAuthConfig) -> Self {
        Self {
            signature_verifier: ProxySignatureVerifier::new(
                config.proxy_secret.clone(),
                !config.disable_proxy_signature,
            ),
            token_verifier: SessionTokenVerifier::new(config.session_token_secret.clone(), config.session_token_leeway),
            shop: config.shop.clone(),
            freshness: FreshnessPolicy { max_age: config.max_request_age, require_timestamp: config.require_timestamp },
            allow_unauthenticated_token_ping: config.allow_unauthenticated_token_ping,
        }
    }

    pub fn authenticate(&self, request: &IncomingRequest) -> AuthOutcome {
        let params = QueryParameterSet::parse(&request.raw_query);
        let ping = params.get(PING_PARAM).is_some_and(|v| v == "1");
        trace!("🔐️ Authenticating {} request with {} query parameters", request.method, params.len());
        if let Some(header) = request.authorization.as_deref().filter(|h| is_bearer(h)) {
            return self.authenticate_session_token(header, ping, request.received_at);
        }
        // With signature checks disabled, unsigned requests are treated as signed ones
        if params.contains(SIGNATURE_PARAM) || !self.signature_verifier.is_enabled() {
            return self.authenticate_proxy_request(request, &params, ping);
        }
        debug!("🔐️ Request carries neither a session token nor a proxy signature");
        AuthOutcome::Rejected(AuthRejection::NoCredential)
    }

    fn authenticate_session_token(&self, header: &str, ping: bool, now: DateTime<Utc>) -> AuthOutcome {
        let customer_id = self.token_verifier.verify(header, now).and_then(|claims| {
            CustomerId::from_gid(&claims.subject)
                .map_err(|e| debug!("🔐️ Session token subject is not a customer. {e}"))
                .ok()
        });
        match customer_id {
            Some(customer_id) => {
                trace!("🔐️ Session token check for customer #{customer_id} ✅️");
                let identity = VerifiedIdentity::new(customer_id, Channel::SessionToken);
                AuthOutcome::Authorized(Authorization { channel: Channel::SessionToken, identity: Some(identity), ping })
            },
            None if ping && self.allow_unauthenticated_token_ping => {
                debug!("🔐️ Allowing health check with an invalid session token");
                AuthOutcome::Authorized(Authorization { channel: Channel::SessionToken, identity: None, ping })
            },
            None => AuthOutcome::Rejected(AuthRejection::BadSessionToken),
        }
    }

    fn authenticate_proxy_request(
        &self,
        request: &IncomingRequest,
        params: &QueryParameterSet,
        ping: bool,
    ) -> AuthOutcome {
        if !self.signature_verifier.verify(&request.raw_query) {
            return AuthOutcome::Rejected(AuthRejection::BadSignature);
        }
        if let Some(shop) = params.get(SHOP_PARAM) {
            if shop != self.shop {
                warn!("🔐️ Signed request is for shop {shop}, not {}", self.shop);
                return AuthOutcome::Rejected(AuthRejection::WrongShop);
            }
        }
        match params.get(TIMESTAMP_PARAM) {
            Some(ts) if !self.freshness.is_fresh(&ts, request.received_at) => {
                debug!("🔐️ Signed request timestamp {ts} is outside the allowed window");
                return AuthOutcome::Rejected(AuthRejection::StaleRequest);
            },
            None if self.freshness.require_timestamp => {
                debug!("🔐️ Signed request has no timestamp");
                return AuthOutcome::Rejected(AuthRejection::StaleRequest);
            },
            _ => {},
        }
        let identity = proxy_customer_id(params).map(|id| VerifiedIdentity::new(id, Channel::ProxySignature));
        trace!("🔐️ Proxy signature check ✅️");
        AuthOutcome::Authorized(Authorization { channel: Channel::ProxySignature, identity, ping })
    }
}

fn is_bearer(header: &str) -> bool {
    header.split_whitespace().next().is_some_and(|scheme| scheme.eq_ignore_ascii_case("bearer"))
}

fn proxy_customer_id(params: &QueryParameterSet) -> Option<CustomerId> {
    let logged_in = params.get(LOGGED_IN_CUSTOMER_ID_PARAM).filter(|s| !s.trim().is_empty());
    let (source, value) = match logged_in {
        Some(id) => (LOGGED_IN_CUSTOMER_ID_PARAM, id),
        None => (CUSTOMER_ID_PARAM, params.get(CUSTOMER_ID_PARAM)?),
    };
    value.parse().map_err(|e| warn!("🔐️ Ignoring invalid {source} in signed request. {e}")).ok()
}
