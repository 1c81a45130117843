//! Core data models for housetab
//!
//! Pure data types: housemates, categories, bills with their splits, the
//! cents-based money type, and billing-month grouping keys. Business logic
//! (split computation, balance folding) lives in [`crate::ledger`].

pub mod bill;
pub mod category;
pub mod housemate;
pub mod ids;
pub mod money;
pub mod month;

pub use bill::{Bill, BillKind, BillValidationError, Split, SplitMethod};
pub use category::BillCategory;
pub use housemate::Housemate;
pub use ids::{BillId, CategoryId, HousemateId};
pub use money::Money;
pub use month::BillingMonth;
