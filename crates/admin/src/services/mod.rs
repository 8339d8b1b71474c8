//! Business logic services for admin.
//!
//! # Services
//!
//! - `records` - Resource-kind dispatch over the repositories
//! - `storage` - Image uploads on the local disk
//! - `submission` - Merge, derive, validate and persist form submissions

pub mod records;
pub mod storage;
pub mod submission;

pub use records::{RecordError, Records, product_scope};
pub use storage::{Storage, StorageError};
pub use submission::{Outcome, Submissions, Target};
