mod customer_id;
mod secret;

pub use customer_id::{CustomerId, CustomerIdError, CUSTOMER_GID_PREFIX};
pub use secret::Secret;
