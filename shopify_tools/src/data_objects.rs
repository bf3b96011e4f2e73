use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerTaxStatus {
    pub id: String,
    #[serde(default)]
    pub tax_exempt: bool,
    #[serde(default)]
    pub tax_exemptions: Vec<String>,
}

/// A validation error reported by the Admin API inside an otherwise successful response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload of both `customerAddTaxExemptions` and `customerRemoveTaxExemptions`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxExemptionPayload {
    #[serde(default)]
    pub customer: Option<CustomerTaxStatus>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

impl TaxExemptionPayload {
    /// Whether `exemption` is present on the customer returned by the mutation, or `None` if Shopify did not return
    /// the customer.
    pub fn has_exemption(&self, exemption: &str) -> Option<bool> {
        self.customer.as_ref().map(|c| c.tax_exemptions.iter().any(|e| e == exemption))
    }
}
