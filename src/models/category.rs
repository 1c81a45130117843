//! Bill category model

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::CategoryId;

/// A category bills can be filed under (rent, groceries, utilities, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillCategory {
    /// Unique identifier
    pub id: CategoryId,

    /// Display name
    pub name: String,

    /// Whether this is the category preselected for new bills
    #[serde(default)]
    pub is_default: bool,
}

impl BillCategory {
    /// Create a new category with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            is_default: false,
        }
    }

    /// Create a new default category
    pub fn new_default(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            is_default: true,
        }
    }
}

impl fmt::Display for BillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_category() {
        let cat = BillCategory::new("Groceries");
        assert_eq!(cat.name, "Groceries");
        assert!(!cat.is_default);

        let def = BillCategory::new_default("Rent");
        assert!(def.is_default);
    }

    #[test]
    fn test_default_flag_optional_in_json() {
        // Old documents without the flag must still parse.
        let json = format!(
            r#"{{"id":"{}","name":"Misc"}}"#,
            CategoryId::new().as_uuid()
        );
        let cat: BillCategory = serde_json::from_str(&json).unwrap();
        assert!(!cat.is_default);
    }
}
