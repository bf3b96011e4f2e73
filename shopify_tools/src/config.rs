use std::env;

use log::*;
use txe_common::Secret;

use crate::ShopifyApiError;

pub const DEFAULT_API_VERSION: &str = "2025-07";
/// The exemption applied to B2B customers that have supplied a valid EU VAT number.
pub const DEFAULT_TAX_EXEMPTION: &str = "EU_REVERSE_CHARGE_EXEMPTION_RULE";

#[derive(Debug, Clone, Default)]
pub struct ShopifyConfig {
    /// The shop's myshopify domain, e.g. "my-shop.myshopify.com"
    pub shop: String,
    pub admin_access_token: Secret<String>,
    pub api_version: String,
    /// The tax exemption code that gets added to, or removed from, customers.
    pub tax_exemption: String,
}

impl ShopifyConfig {
    /// Loads the Admin API configuration. The shop and admin access token are required; everything else falls back
    /// to a default.
    pub fn try_from_env() -> Result<Self, ShopifyApiError> {
        let shop = required_var("TXE_SHOPIFY_SHOP")?;
        let admin_access_token = Secret::new(required_var("TXE_SHOPIFY_ADMIN_ACCESS_TOKEN")?);
        let api_version = env::var("TXE_SHOPIFY_API_VERSION").unwrap_or_else(|_| {
            info!("🪛️ TXE_SHOPIFY_API_VERSION not set, using {DEFAULT_API_VERSION} as default");
            DEFAULT_API_VERSION.to_string()
        });
        let tax_exemption = env::var("TXE_SHOPIFY_TAX_EXEMPTION").unwrap_or_else(|_| DEFAULT_TAX_EXEMPTION.to_string());
        Ok(Self { shop, admin_access_token, api_version, tax_exemption })
    }
}

fn required_var(name: &str) -> Result<String, ShopifyApiError> {
    match env::var(name) {
        Ok(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => {
            error!("🪛️ {name} is not set. The server cannot talk to Shopify without it.");
            Err(ShopifyApiError::MissingConfiguration(name.to_string()))
        },
    }
}
