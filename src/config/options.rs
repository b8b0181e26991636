//! Per-plugin options

use serde::{Deserialize, Serialize};

use super::defaults::RESERVED_SELECTOR_PREFIX;
use crate::storage::StoreSelector;

/// Options of the `fromprofile` plugin: which profile store to read.
///
/// ```toml
/// [plugins.fromprofile]
/// db = "crowd"   # omit, or leave blank, for the default store
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FromProfileOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
}

impl FromProfileOptions {
    pub fn with_db(db: impl Into<String>) -> Self {
        Self {
            db: Some(db.into()),
        }
    }

    /// Deserialize from a plugin's TOML option table.
    pub fn from_toml(value: &toml::Value) -> Result<Self, toml::de::Error> {
        value.clone().try_into()
    }

    pub fn store_selector(&self) -> StoreSelector {
        StoreSelector::from_name(self.db.as_deref())
    }

    /// Human-readable problems with these options; empty when valid.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if let StoreSelector::Named(name) = self.store_selector() {
            if name.starts_with(RESERVED_SELECTOR_PREFIX) {
                problems.push(format!(
                    "db '{name}' uses the reserved prefix '{RESERVED_SELECTOR_PREFIX}'"
                ));
            }
            if name.chars().any(char::is_control) {
                problems.push(format!("db {name:?} contains control characters"));
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<FromProfileOptions, toml::de::Error> {
        let value: toml::Value = toml::from_str(toml_str).unwrap();
        FromProfileOptions::from_toml(&value)
    }

    #[test]
    fn test_missing_db_selects_default() {
        let options = parse("").unwrap();
        assert_eq!(options, FromProfileOptions::default());
        assert_eq!(options.store_selector(), StoreSelector::Default);
        assert!(options.problems().is_empty());
    }

    #[test]
    fn test_blank_db_selects_default() {
        let options = parse("db = \"  \"").unwrap();
        assert_eq!(options.store_selector(), StoreSelector::Default);
    }

    #[test]
    fn test_named_db() {
        let options = parse("db = \"crowd\"").unwrap();
        assert_eq!(options, FromProfileOptions::with_db("crowd"));
        assert_eq!(
            options.store_selector(),
            StoreSelector::Named("crowd".to_string())
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse("dbname = \"crowd\"").unwrap_err();
        assert!(err.to_string().contains("dbname"));
    }

    #[test]
    fn test_reserved_and_control_names_flagged() {
        assert_eq!(FromProfileOptions::with_db("__sled__default").problems().len(), 1);
        assert_eq!(FromProfileOptions::with_db("a\tb").problems().len(), 1);
        assert!(FromProfileOptions::with_db("crowd").problems().is_empty());
    }
}
