//! Applies a tax exemption change for an authenticated customer.
//!
//! The dispatcher only accepts a [`VerifiedIdentity`], so a customer id from an unauthenticated source can never
//! reach the customer directory.
use log::*;
use serde::Serialize;
use thiserror::Error;
use txe_common::CustomerId;

use crate::auth::VerifiedIdentity;

/// The external service that owns customer records.
#[allow(async_fn_in_trait)]
pub trait CustomerDirectory {
    /// Adds (`enable == true`) or removes the tax exemption for a customer. Validation problems reported by the
    /// directory belong in [`ExemptionUpdate::user_errors`]; `Err` is reserved for failing to get an answer at all.
    async fn update_tax_exemption(&self, customer_id: &CustomerId, enable: bool)
        -> Result<ExemptionUpdate, DirectoryError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExemptionUpdate {
    pub tax_exempt: bool,
    pub user_errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("Could not reach the customer directory. {0}")]
    Unavailable(String),
    #[error("The customer directory returned an invalid response. {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    DomainUser(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExemptionStatus {
    pub tax_exempt: bool,
}

pub struct MutationDispatcher<B> {
    directory: B,
}

impl<B> MutationDispatcher<B>
where B: CustomerDirectory
{
    pub fn new(directory: B) -> Self {
        Self { directory }
    }

    /// Sends exactly one mutation. The first user error reported by the directory wins.
    pub async fn set_exemption(
        &self,
        identity: &VerifiedIdentity,
        enable: bool,
    ) -> Result<ExemptionStatus, DispatchError> {
        let customer_id = identity.customer_id();
        debug!("🛍️️ Setting tax exemption to {enable} for customer #{customer_id} ({:?})", identity.channel());
        let update = self.directory.update_tax_exemption(customer_id, enable).await.map_err(|e| {
            error!("🛍️️ Tax exemption update for customer #{customer_id} failed. {e}");
            DispatchError::Upstream(e.to_string())
        })?;
        if let Some(message) = update.user_errors.into_iter().next() {
            info!("🛍️️ Tax exemption update for customer #{customer_id} was refused. {message}");
            return Err(DispatchError::DomainUser(message));
        }
        info!("🛍️️ Customer #{customer_id} tax exempt: {}", update.tax_exempt);
        Ok(ExemptionStatus { tax_exempt: update.tax_exempt })
    }
}
