//! Configuration module
//!
//! Path resolution and user settings persistence.

pub mod paths;
pub mod settings;

pub use paths::HousetabPaths;
pub use settings::{EncryptionSettings, RemoteSettings, Settings};
