mod proxy_auth;

pub use proxy_auth::{ProxyAuthMiddlewareFactory, ProxyAuthMiddlewareService};
