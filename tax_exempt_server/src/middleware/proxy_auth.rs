//! App proxy authentication middleware for Actix Web.
//!
//! Every request that reaches the wrapped service has been through [`RequestAuthenticator::authenticate`]. Requests
//! that pass carry an [`Authorization`] in their extensions, which handlers pick up as an extractor. Requests that fail
//! never reach the handler; the middleware answers them directly with the rejection's status code and JSON body.
//!
//! CORS preflight (`OPTIONS`) requests are let through untouched, since browsers never attach credentials to them.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error,
    FromRequest,
    HttpMessage,
    HttpRequest,
};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use log::{debug, trace};

use crate::{
    auth::{AuthOutcome, Authorization, IncomingRequest, RequestAuthenticator},
    errors::{AuthRejection, ServerError},
};

pub struct ProxyAuthMiddlewareFactory {
    authenticator: Rc<RequestAuthenticator>,
}

impl ProxyAuthMiddlewareFactory {
    pub fn new(authenticator: RequestAuthenticator) -> Self {
        ProxyAuthMiddlewareFactory { authenticator: Rc::new(authenticator) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ProxyAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = ProxyAuthMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ProxyAuthMiddlewareService {
            authenticator: Rc::clone(&self.authenticator),
            service: Rc::new(service),
        }))
    }
}

pub struct ProxyAuthMiddlewareService<S> {
    authenticator: Rc<RequestAuthenticator>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ProxyAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        if req.method() == Method::OPTIONS {
            trace!("🔐️ Preflight request. Skipping authentication.");
            return Box::pin(async move { service.call(req).await.map(ServiceResponse::map_into_left_body) });
        }
        let request = IncomingRequest::from_http_request(req.request(), Utc::now());
        let outcome = self.authenticator.authenticate(&request);
        Box::pin(async move {
            match outcome {
                AuthOutcome::Authorized(authorization) => {
                    trace!("🔐️ Request authorized via {:?}", authorization.channel());
                    req.extensions_mut().insert(authorization);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                },
                AuthOutcome::Rejected(reason) => {
                    debug!("🔐️ Rejecting {} {}. {reason}", req.method(), req.path());
                    Ok(req.error_response(ServerError::from(reason)).map_into_right_body())
                },
            }
        })
    }
}

impl FromRequest for Authorization {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let authorization = req.extensions().get::<Authorization>().cloned().ok_or_else(|| {
            debug!("🔐️ No authorization found in request extensions. Is the route behind the proxy auth middleware?");
            ServerError::AuthenticationError(AuthRejection::NoCredential)
        });
        ready(authorization)
    }
}
