//! Table definitions

use serde::{Deserialize, Serialize};

use super::column::ColumnDefinition;

/// Schema-qualified table with ordered columns and primary key
///
/// Destination definitions describe tables that already exist. Staging and
/// dedup definitions are produced per operation by
/// [`StageTableDefinitionFactory`](crate::staging::StageTableDefinitionFactory)
/// and carry `temporary = true`.
///
/// # Example
///
/// ```rust
/// use warehouse_import::models::{ColumnDefinition, TableDefinition};
///
/// let table = TableDefinition::new(
///     "analytics",
///     "accounts",
///     vec![
///         ColumnDefinition::new("id", "INTEGER"),
///         ColumnDefinition::new("name", "VARCHAR"),
///     ],
/// )
/// .with_primary_keys(["id"]);
///
/// assert_eq!(table.column_names(), vec!["id", "name"]);
/// assert!(table.has_primary_keys());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDefinition {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub temporary: bool,
}

impl TableDefinition {
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<ColumnDefinition>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns,
            primary_keys: Vec::new(),
            temporary: false,
        }
    }

    /// Replace the primary key; duplicate names are collapsed keeping first order
    pub fn with_primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut primary_keys: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if !primary_keys.contains(&key) {
                primary_keys.push(key);
            }
        }
        self.primary_keys = primary_keys;
        self
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    /// Column names in definition order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Find a column by exact (case-sensitive) name
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn has_primary_keys(&self) -> bool {
        !self.primary_keys.is_empty()
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_keys.iter().any(|k| k == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableDefinition {
        TableDefinition::new(
            "s",
            "t",
            vec![
                ColumnDefinition::new("Id", "INTEGER"),
                ColumnDefinition::new("val", "VARCHAR"),
            ],
        )
    }

    #[test]
    fn test_column_lookup_is_case_sensitive() {
        let table = table();
        assert!(table.has_column("Id"));
        assert!(!table.has_column("id"));
    }

    #[test]
    fn test_primary_keys_deduplicated() {
        let table = table().with_primary_keys(["Id", "val", "Id"]);
        assert_eq!(table.primary_keys, vec!["Id", "val"]);
        assert!(table.is_primary_key("val"));
    }

    #[test]
    fn test_temporary_flag() {
        assert!(!table().temporary);
        assert!(table().temporary().temporary);
    }
}
