mod api;
mod config;
mod error;

mod data_objects;

pub use api::ShopifyApi;
pub use config::{ShopifyConfig, DEFAULT_API_VERSION, DEFAULT_TAX_EXEMPTION};
pub use data_objects::{CustomerTaxStatus, TaxExemptionPayload, UserError};
pub use error::ShopifyApiError;
