//! housetab - Bill-splitting ledger for a shared household
//!
//! This library records shared expenses, computes each housemate's owed
//! share under several splitting policies, tracks running balances, and
//! plans minimal settlement transfers. The ledger persists to a local JSON
//! store and, when configured, mirrors to a remote key-value service, with
//! optional passphrase encryption of every record.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (housemates, bills, splits, money)
//! - `ledger`: The in-memory ledger, split calculator, and balance engine
//! - `crypto`: Passphrase encryption and PIN key-wrapping
//! - `session`: Per-session secrets (passphrase, credential, access token)
//! - `storage`: Local and remote persistence with a durable write queue
//! - `import`: Typed spreadsheet-row parsing
//! - `export`: Full-ledger JSON export and import
//!
//! # Example
//!
//! ```rust,ignore
//! use housetab::config::{HousetabPaths, Settings};
//!
//! let paths = HousetabPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod export;
pub mod import;
pub mod ledger;
pub mod models;
pub mod session;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
