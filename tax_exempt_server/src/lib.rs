//! # Tax exemption proxy server
//! Lets a storefront customer add or remove their own tax exemption.
//!
//! Requests reach the server by one of two routes, and each carries its own credential:
//! * Through the Shopify app proxy. Shopify appends `shop`, `timestamp`, `logged_in_customer_id` and a `signature`
//!   to the query string. The signature is an HMAC-SHA256 of the other parameters, keyed with the app's API secret.
//! * Directly from a checkout UI extension, with a session token (an HS256 JWT) in the `Authorization` header.
//!
//! Either way, the [`auth::RequestAuthenticator`] decides who the customer is before anything else happens, and the
//! [`dispatcher::MutationDispatcher`] sends exactly one mutation to Shopify for that customer.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/proxy`: The app proxy endpoint. `ping=1` checks credentials only; otherwise `enable=1|0` is applied.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod dispatcher;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
