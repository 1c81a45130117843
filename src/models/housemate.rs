//! Housemate model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::HousemateId;

/// A participant in the shared household ledger
///
/// Removing a housemate from the active roster never cascades into bills:
/// historical bills keep referencing the id, and the balance fold still
/// accumulates entries for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Housemate {
    /// Unique identifier
    pub id: HousemateId,

    /// Display name
    pub name: String,
}

impl Housemate {
    /// Create a new housemate with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: HousemateId::new(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Housemate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_housemate() {
        let hm = Housemate::new("Alice");
        assert_eq!(hm.name, "Alice");
        assert!(!hm.id.as_uuid().is_nil());
    }

    #[test]
    fn test_serialization() {
        let hm = Housemate::new("Bob");
        let json = serde_json::to_string(&hm).unwrap();
        let back: Housemate = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, hm.id);
        assert_eq!(back.name, "Bob");
    }
}
