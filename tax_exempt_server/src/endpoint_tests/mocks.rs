use mockall::mock;
use txe_common::CustomerId;

use crate::dispatcher::{CustomerDirectory, DirectoryError, ExemptionUpdate};

mock! {
    pub CustomerDirectory {}
    impl CustomerDirectory for CustomerDirectory {
        async fn update_tax_exemption(&self, customer_id: &CustomerId, enable: bool) -> Result<ExemptionUpdate, DirectoryError>;
    }
}
