use std::sync::Arc;

use graphql_parser::parse_query;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use txe_common::CustomerId;

use crate::{config::ShopifyConfig, data_objects::TaxExemptionPayload, ShopifyApiError};

const ADD_TAX_EXEMPTIONS: &str = r#"
mutation AddTaxExemptions($id: ID!, $exemptions: [TaxExemption!]!) {
  customerAddTaxExemptions(customerId: $id, taxExemptions: $exemptions) {
    customer { id taxExempt taxExemptions }
    userErrors { field message }
  }
}"#;

const REMOVE_TAX_EXEMPTIONS: &str = r#"
mutation RemoveTaxExemptions($id: ID!, $exemptions: [TaxExemption!]!) {
  customerRemoveTaxExemptions(customerId: $id, taxExemptions: $exemptions) {
    customer { id taxExempt taxExemptions }
    userErrors { field message }
  }
}"#;

#[derive(Clone)]
pub struct ShopifyApi {
    config: ShopifyConfig,
    client: Arc<Client>,
}

impl ShopifyApi {
    pub fn new(config: ShopifyConfig) -> Result<Self, ShopifyApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.admin_access_token.reveal().as_str())
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        headers.insert("X-Shopify-Access-Token", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &ShopifyConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, ShopifyApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| ShopifyApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| ShopifyApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| ShopifyApiError::RestResponseError(e.to_string()))?;
            Err(ShopifyApiError::QueryError { status, message })
        }
    }

    pub async fn graphql_query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<T, ShopifyApiError> {
        let query = parse_query::<String>(query).map_err(|e| ShopifyApiError::InvalidGraphQL(e.to_string()))?;
        let mut body = serde_json::json!({
            "query": query.to_string(),
        });
        if let Some(vars) = variables {
            body["variables"] = vars;
        }
        trace!("Sending GraphQL query: {body}");
        let result = self.rest_query::<Value, Value>(Method::POST, "/graphql.json", Some(body)).await?;
        if let Some(errors) = result["errors"].as_array() {
            let e = errors.iter().map(|e| e.to_string()).collect::<Vec<String>>().join(", ");
            return Err(ShopifyApiError::GraphQLError(e));
        }
        let data = result["data"].clone();
        let costs = result["extensions"]["cost"].clone();
        trace!("GraphQL response: {data}");
        trace!("GraphQL costs: {costs}");
        if data.is_null() {
            return Err(ShopifyApiError::EmptyResponse);
        }
        let result = serde_json::from_value(data).map_err(|e| ShopifyApiError::JsonError(e.to_string()))?;
        Ok(result)
    }

    pub fn url(&self, path: &str) -> String {
        format!("https://{}/admin/api/{}{path}", self.config.shop, self.config.api_version)
    }

    /// Adds (`enable == true`) or removes the configured tax exemption on the given customer.
    ///
    /// User errors reported by Shopify are returned as part of the payload and are NOT converted into an `Err`. It is
    /// up to the caller to decide how to surface them.
    pub async fn set_tax_exemption(
        &self,
        customer_id: &CustomerId,
        enable: bool,
    ) -> Result<TaxExemptionPayload, ShopifyApiError> {
        let (mutation, field) = tax_exemption_mutation(enable);
        let variables = serde_json::json!({
            "id": customer_id.to_gid(),
            "exemptions": [self.config.tax_exemption],
        });
        debug!("Calling {field} for customer #{customer_id}");
        let response = self.graphql_query::<Value>(mutation, Some(variables)).await?;
        let payload = response[field].clone();
        if payload.is_null() {
            return Err(ShopifyApiError::EmptyResponse);
        }
        let payload = serde_json::from_value::<TaxExemptionPayload>(payload)
            .map_err(|e| ShopifyApiError::JsonError(e.to_string()))?;
        info!("{field} completed for customer #{customer_id} with {} user errors", payload.user_errors.len());
        Ok(payload)
    }
}

/// Returns the mutation document and the name of the payload field it produces.
fn tax_exemption_mutation(enable: bool) -> (&'static str, &'static str) {
    if enable {
        (ADD_TAX_EXEMPTIONS, "customerAddTaxExemptions")
    } else {
        (REMOVE_TAX_EXEMPTIONS, "customerRemoveTaxExemptions")
    }
}
