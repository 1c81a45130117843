//! Persistence key scheme
//!
//! The ledger metadata lives under its own key; bills are stored one record
//! per calendar year so a client can load recent years without pulling the
//! full history.

use std::fmt;

/// A key in the backing stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Roster, categories, schema version
    Meta,
    /// The bill array for one calendar year
    Bills(i32),
}

impl StoreKey {
    /// Stable string form used by both the local and remote stores
    pub fn name(&self) -> String {
        match self {
            Self::Meta => "meta".to_string(),
            Self::Bills(year) => format!("bills-{}", year),
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(StoreKey::Meta.name(), "meta");
        assert_eq!(StoreKey::Bills(2025).name(), "bills-2025");
    }

    #[test]
    fn test_year_keys_are_distinct() {
        assert_ne!(StoreKey::Bills(2024).name(), StoreKey::Bills(2025).name());
    }
}
