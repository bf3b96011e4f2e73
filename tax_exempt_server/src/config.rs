use std::env;

use chrono::Duration;
use log::*;
use shopify_tools::ShopifyConfig;
use txe_common::Secret;

use crate::errors::ServerError;

const DEFAULT_TXE_HOST: &str = "127.0.0.1";
const DEFAULT_TXE_PORT: u16 = 8370;
const DEFAULT_PROXY_MAX_AGE_SECS: i64 = 300;
const DEFAULT_SESSION_TOKEN_LEEWAY_SECS: i64 = 0;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub auth: ProxyAuthConfig,
    /// Shopify Admin API configuration
    pub shopify_config: ShopifyConfig,
}

/// Everything needed to authenticate proxy requests. Loaded once at startup and never modified afterwards.
#[derive(Clone, Debug)]
pub struct ProxyAuthConfig {
    /// The shop's myshopify domain. Signed requests naming any other shop are rejected.
    pub shop: String,
    /// The app's API secret. Shopify signs app proxy requests with it.
    pub proxy_secret: Secret<String>,
    /// The HS256 key for session tokens. Shopify signs these with the app's API secret too, so this is normally the
    /// same value as `proxy_secret`.
    pub session_token_secret: Secret<String>,
    /// Grace period applied to session token expiry.
    pub session_token_leeway: Duration,
    /// If true, proxy signatures are not checked at all. **DANGER** Local development only.
    pub disable_proxy_signature: bool,
    /// How far a signed request's `timestamp` may be from the server clock.
    pub max_request_age: Duration,
    /// If true, signed requests without a `timestamp` are rejected as stale.
    pub require_timestamp: bool,
    /// If true, `ping=1` requests with an invalid session token still get a successful reply.
    pub allow_unauthenticated_token_ping: bool,
}

impl ProxyAuthConfig {
    /// A configuration with every optional setting at its default.
    pub fn new(shop: &str, secret: Secret<String>) -> Self {
        Self {
            shop: shop.to_string(),
            proxy_secret: secret.clone(),
            session_token_secret: secret,
            session_token_leeway: Duration::seconds(DEFAULT_SESSION_TOKEN_LEEWAY_SECS),
            disable_proxy_signature: false,
            max_request_age: Duration::seconds(DEFAULT_PROXY_MAX_AGE_SECS),
            require_timestamp: true,
            allow_unauthenticated_token_ping: true,
        }
    }

    pub fn try_from_env(shop: &str) -> Result<Self, ServerError> {
        let proxy_secret = env::var("TXE_SHOPIFY_API_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .map(Secret::new)
            .ok_or_else(|| ServerError::ConfigurationError("TXE_SHOPIFY_API_SECRET is not set".into()))?;
        let session_token_secret = match env::var("TXE_SESSION_TOKEN_SECRET") {
            Ok(s) if !s.is_empty() => Secret::new(s),
            _ => {
                debug!("🪛️ TXE_SESSION_TOKEN_SECRET is not set. Session tokens are verified with the API secret.");
                proxy_secret.clone()
            },
        };
        let disable_proxy_signature = env_flag("TXE_DISABLE_PROXY_SIGNATURE", false);
        if disable_proxy_signature {
            warn!(
                "🚨️🚨️🚨️ App proxy signature checks are DISABLED. Anyone can change tax exemptions for any customer. \
                 Never run production like this. 🚨️🚨️🚨️"
            );
        }
        let config = Self {
            shop: shop.to_string(),
            proxy_secret,
            session_token_secret,
            session_token_leeway: env_seconds("TXE_SESSION_TOKEN_LEEWAY", DEFAULT_SESSION_TOKEN_LEEWAY_SECS),
            disable_proxy_signature,
            max_request_age: env_seconds("TXE_PROXY_MAX_AGE_SECS", DEFAULT_PROXY_MAX_AGE_SECS),
            require_timestamp: env_flag("TXE_PROXY_REQUIRE_TIMESTAMP", true),
            allow_unauthenticated_token_ping: env_flag("TXE_ALLOW_UNAUTHENTICATED_TOKEN_PING", true),
        };
        if !config.require_timestamp {
            warn!("🪛️ Signed requests without a timestamp will be accepted. Replay protection is weakened.");
        }
        Ok(config)
    }
}

impl ServerConfig {
    /// Loads the configuration from the environment. Missing secrets are an error, so the server refuses to start
    /// rather than failing every request.
    pub fn try_from_env() -> Result<Self, ServerError> {
        let host = env::var("TXE_HOST").ok().unwrap_or_else(|| DEFAULT_TXE_HOST.into());
        let port = env::var("TXE_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TXE_PORT. {e} Using the default, {DEFAULT_TXE_PORT}, instead."
                    );
                    DEFAULT_TXE_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TXE_PORT);
        let shopify_config = ShopifyConfig::try_from_env().map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
        let auth = ProxyAuthConfig::try_from_env(&shopify_config.shop)?;
        info!("🪛️ Serving app proxy requests for {}", shopify_config.shop);
        Ok(Self { host, port, auth, shopify_config })
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(s) => parse_flag(&s).unwrap_or_else(|| {
            warn!("🪛️ Invalid value for {name}: {s}. Using the default, {default}.");
            default
        }),
        Err(_) => default,
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn env_seconds(name: &str, default: i64) -> Duration {
    env::var(name)
        .map_err(|_| trace!("🪛️ {name} is not set. Using the default value of {default} s."))
        .and_then(|s| parse_seconds(&s).ok_or_else(|| warn!("🪛️ Invalid configuration value for {name}: {s}")))
        .map(Duration::seconds)
        .unwrap_or_else(|_| Duration::seconds(default))
}

fn parse_seconds(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok().filter(|v| *v >= 0)
}
