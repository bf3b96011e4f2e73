//! App proxy signature verification.
//!
//! Shopify signs app proxy requests by computing HMAC-SHA256 over the canonical form of the query string (see
//! [`QueryParameterSet::canonical_candidate`]) using the app's API secret, and appending the hex digest as the
//! `signature` parameter.
use hmac::{Hmac, Mac};
use log::{trace, warn};
use sha2::Sha256;
use txe_common::Secret;

use super::query::QueryParameterSet;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Debug)]
pub struct ProxySignatureVerifier {
    secret: Secret<String>,
    // If false, every request passes signature verification. Only ever set from server configuration.
    enabled: bool,
}

impl ProxySignatureVerifier {
    pub fn new(secret: Secret<String>, enabled: bool) -> Self {
        Self { secret, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn verify(&self, raw_query: &str) -> bool {
        if !self.enabled {
            trace!("🔐️ Proxy signature checks are disabled. Allowing request.");
            return true;
        }
        verify_proxy_signature(raw_query, self.secret.as_bytes())
    }
}

/// Verifies the `signature` parameter of a raw (undecoded) query string.
///
/// Returns false when the signature is missing, empty, repeated or not hex, and when it is the only parameter. The comparison itself is constant time.
pub fn verify_proxy_signature(raw_query: &str, secret: &[u8]) -> bool {
    let params = QueryParameterSet::parse(raw_query);
    let sent = match params.signatures().as_slice() {
        [sig] if !sig.is_empty() => sig.to_string(),
        [] | [_] => {
            trace!("🔐️ No proxy signature in request");
            return false;
        },
        _ => {
            warn!("🔐️ Request carries more than one signature parameter. Denying access.");
            return false;
        },
    };
    let Ok(sent) = hex::decode(sent) else {
        trace!("🔐️ Proxy signature is not a hex string");
        return false;
    };
    let candidate = params.canonical_candidate();
    if candidate.is_empty() {
        trace!("🔐️ Proxy signature covers no parameters");
        return false;
    }
    trace!("🔐️ Checking proxy signature over {} canonical bytes", candidate.len());
    let mut mac = new_mac(secret);
    mac.update(candidate.as_bytes());
    mac.verify_slice(&sent).is_ok()
}

/// Lower-case hex HMAC-SHA256 of `data`.
pub fn calculate_hmac(secret: &[u8], data: &[u8]) -> String {
    let mut mac = new_mac(secret);
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Signs a raw query string the way the app proxy does, returning the hex digest.
pub fn sign_query(raw_query: &str, secret: &[u8]) -> String {
    let candidate = QueryParameterSet::parse(raw_query).canonical_candidate();
    calculate_hmac(secret, candidate.as_bytes())
}

fn new_mac(secret: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(secret).expect("HMAC can take a key of any size")
}
