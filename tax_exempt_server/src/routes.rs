//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers never check credentials themselves. Everything under `/api` sits behind
//! [`crate::middleware::ProxyAuthMiddlewareFactory`], and the only way for a handler to learn who is calling is the
//! [`Authorization`] extractor.
use actix_web::{get, http::Method, web, HttpRequest, HttpResponse, Responder};
use log::*;

use crate::{
    auth::{authenticator::ENABLE_PARAM, Authorization, QueryParameterSet},
    data_objects::JsonResponse,
    dispatcher::{CustomerDirectory, MutationDispatcher},
    errors::ServerError,
    helpers::parse_enable_flag,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Proxy routes accept every method. Preflight requests get an empty 204; everything else goes to the handler, which
// decides which methods it supports.
#[macro_export]
macro_rules! route {
    ($name:ident => $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .route(actix_web::web::route().guard(actix_web::guard::Options()).to($crate::routes::preflight))
                    .route(actix_web::web::route().to($name::< $( [< T $bounds:camel >], )+>));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

pub async fn preflight() -> HttpResponse {
    trace!("💻️ Received preflight request");
    HttpResponse::NoContent().finish()
}

//----------------------------------------------   Proxy  ----------------------------------------------------
route!(proxy => "/proxy" impl CustomerDirectory);
/// Route handler for the app proxy endpoint.
///
/// * `ping=1` (GET or POST) answers `{"ok":true}` once the request is authenticated.
/// * Otherwise the request is a mutation and must be a POST. `enable` (`1`, `0`, `true`, `false`) says whether the
///   tax exemption is added or removed for the authenticated customer. The reply carries the resulting `taxExempt`
///   state.
pub async fn proxy<B>(
    req: HttpRequest,
    auth: Authorization,
    dispatcher: web::Data<MutationDispatcher<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CustomerDirectory,
{
    let method = req.method();
    if auth.is_ping() {
        trace!("💻️ Received ping via {:?}", auth.channel());
        return if method == Method::GET || method == Method::POST {
            Ok(HttpResponse::Ok().json(JsonResponse::success()))
        } else {
            Err(ServerError::MethodNotAllowed(method.to_string()))
        };
    }
    if method != Method::POST {
        debug!("💻️ Tax exemption changes must be POSTed, not sent with {method}");
        return Err(ServerError::MethodNotAllowed(method.to_string()));
    }
    let params = QueryParameterSet::parse(req.query_string());
    let enable = parse_enable_flag(params.get(ENABLE_PARAM).as_deref())?;
    let identity = auth.identity().ok_or_else(|| {
        debug!("💻️ Tax exemption request via {:?} did not identify a customer", auth.channel());
        ServerError::MissingCustomerId
    })?;
    let status = dispatcher.set_exemption(identity, enable).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::tax_exempt(status.tax_exempt)))
}
