use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of a Shopify global id (GID) that refers to a customer record.
pub const CUSTOMER_GID_PREFIX: &str = "gid://shopify/Customer/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomerIdError {
    #[error("Customer id is empty")]
    Empty,
    #[error("Customer id must be numeric or a customer GID")]
    InvalidFormat,
    #[error("Not a customer GID")]
    NotACustomerGid,
}

/// The numeric part of a Shopify customer id, e.g. `123` for `gid://shopify/Customer/123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerId(String);

impl CustomerId {
    /// Accepts only the full GID form, `gid://shopify/Customer/<digits>`. Session token subjects must look like this
    /// before they are trusted as a customer identity.
    pub fn from_gid(gid: &str) -> Result<Self, CustomerIdError> {
        let id = gid.strip_prefix(CUSTOMER_GID_PREFIX).ok_or(CustomerIdError::NotACustomerGid)?;
        Self::from_numeric(id)
    }

    fn from_numeric(id: &str) -> Result<Self, CustomerIdError> {
        if id.is_empty() {
            return Err(CustomerIdError::Empty);
        }
        if !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CustomerIdError::InvalidFormat);
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn to_gid(&self) -> String {
        format!("{CUSTOMER_GID_PREFIX}{}", self.0)
    }
}

/// Parses either a bare numeric id or a customer GID.
impl FromStr for CustomerId {
    type Err = CustomerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("gid://") {
            Self::from_gid(s)
        } else {
            Self::from_numeric(s)
        }
    }
}

impl TryFrom<String> for CustomerId {
    type Error = CustomerIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CustomerId> for String {
    fn from(id: CustomerId) -> Self {
        id.0
    }
}

impl Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
