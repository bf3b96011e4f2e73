//! Request authentication for the app proxy endpoint.
//!
//! * [`query`] turns a raw query string into the canonical string that Shopify signs.
//! * [`signature`] verifies app proxy signatures.
//! * [`session_token`] verifies session tokens from storefront UI extensions.
//! * [`authenticator`] combines the two into a single decision per request.
pub mod authenticator;
pub mod query;
pub mod session_token;
pub mod signature;

pub use authenticator::{
    AuthOutcome,
    Authorization,
    Channel,
    FreshnessPolicy,
    IncomingRequest,
    RequestAuthenticator,
    VerifiedIdentity,
};
pub use query::{QueryParameterSet, SignatureCandidate};
pub use session_token::{SessionClaims, SessionTokenVerifier};
pub use signature::{calculate_hmac, sign_query, ProxySignatureVerifier};
