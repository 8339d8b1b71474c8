//! Customer model.
//!
//! Customers are only referenced by orders; the panel has no customer
//! resource.

use catalog_core::CustomerId;
use serde::Serialize;

/// A customer who can place orders.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
}
