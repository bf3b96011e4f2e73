use std::time::Duration;

use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::{Logger, NormalizePath},
    web,
    App,
    HttpServer,
};
use log::*;
use shopify_tools::ShopifyApi;

use crate::{
    auth::RequestAuthenticator,
    config::ServerConfig,
    dispatcher::{CustomerDirectory, MutationDispatcher},
    errors::ServerError,
    middleware::ProxyAuthMiddlewareFactory,
    routes::{health, ProxyRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let shopify = ShopifyApi::new(config.shopify_config.clone()).map_err(|e| {
        error!("🛍️️ Could not create the Shopify API client. {e}");
        ServerError::InitializeError(e.to_string())
    })?;
    let srv = create_server_instance(config, shopify)?;
    srv.await.map_err(ServerError::from)
}

/// Builds the HTTP server. Each worker gets its own authenticator and dispatcher, built from the same immutable
/// configuration.
pub fn create_server_instance<B>(config: ServerConfig, directory: B) -> Result<Server, ServerError>
where B: CustomerDirectory + Clone + Send + 'static {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let dispatcher = MutationDispatcher::new(directory.clone());
        let authenticator = RequestAuthenticator::new(&config.auth);
        // The query string holds the signature, so the access log only records the path
        let proxy_scope = web::scope("/api")
            .wrap(ProxyAuthMiddlewareFactory::new(authenticator))
            .service(ProxyRoute::<B>::new());
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("txe::access_log"))
            .app_data(web::Data::new(dispatcher))
            .service(health)
            .service(proxy_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    info!("🚀️ Listening on {host}:{port}");
    Ok(srv)
}
