//! [`CustomerDirectory`] backed by the Shopify Admin GraphQL API.
use log::*;
use shopify_tools::{ShopifyApi, ShopifyApiError, TaxExemptionPayload};
use txe_common::CustomerId;

use crate::dispatcher::{CustomerDirectory, DirectoryError, ExemptionUpdate};

impl CustomerDirectory for ShopifyApi {
    async fn update_tax_exemption(
        &self,
        customer_id: &CustomerId,
        enable: bool,
    ) -> Result<ExemptionUpdate, DirectoryError> {
        let payload = self.set_tax_exemption(customer_id, enable).await.map_err(directory_error)?;
        Ok(exemption_update(payload, &self.config().tax_exemption, enable))
    }
}

/// A customer is reported as tax exempt when the configured exemption is present on the record Shopify returns. If
/// Shopify leaves the customer out of the payload, the requested state is reported instead.
pub fn exemption_update(payload: TaxExemptionPayload, exemption: &str, enable: bool) -> ExemptionUpdate {
    let tax_exempt = payload.has_exemption(exemption).unwrap_or_else(|| {
        trace!("🛍️️ Shopify did not return the customer. Reporting the requested state.");
        enable
    });
    let user_errors = payload.user_errors.into_iter().map(|e| e.message).collect();
    ExemptionUpdate { tax_exempt, user_errors }
}

fn directory_error(e: ShopifyApiError) -> DirectoryError {
    match e {
        ShopifyApiError::JsonError(_) | ShopifyApiError::EmptyResponse | ShopifyApiError::InvalidGraphQL(_) => {
            DirectoryError::InvalidResponse(e.to_string())
        },
        _ => DirectoryError::Unavailable(e.to_string()),
    }
}
