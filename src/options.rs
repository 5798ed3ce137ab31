//! Import options

use serde::{Deserialize, Serialize};

use crate::executor::SessionId;

/// Name of the column stamped with the import time when timestamps are enabled
pub const TIMESTAMP_COLUMN_NAME: &str = "_timestamp";

/// Backend-specific behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportFeature {
    /// Replace the destination with one `CREATE OR REPLACE TABLE ... AS SELECT`
    CtasFullLoad,
}

/// Options for one import operation
///
/// Built once per operation and never mutated by the importers.
///
/// # Example
///
/// ```rust
/// use warehouse_import::ImportOptions;
///
/// let options = ImportOptions::new()
///     .incremental(true)
///     .use_timestamp(true)
///     .convert_empty_values_to_null(["name"]);
///
/// assert!(options.is_incremental());
/// assert!(options.converts_empty_to_null("name"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    #[serde(default)]
    convert_empty_values_to_null: Vec<String>,
    #[serde(default)]
    incremental: bool,
    #[serde(default)]
    use_timestamp: bool,
    #[serde(default)]
    number_of_ignored_lines: usize,
    #[serde(default)]
    using_typed_source: bool,
    #[serde(default = "default_true")]
    null_manipulation: bool,
    #[serde(default)]
    features: Vec<ImportFeature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session: Option<SessionId>,
}

fn default_true() -> bool {
    true
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            convert_empty_values_to_null: Vec::new(),
            incremental: false,
            use_timestamp: false,
            number_of_ignored_lines: 0,
            using_typed_source: false,
            null_manipulation: true,
            features: Vec::new(),
            session: None,
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns whose empty strings become NULL in the destination
    pub fn convert_empty_values_to_null<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.convert_empty_values_to_null = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn use_timestamp(mut self, use_timestamp: bool) -> Self {
        self.use_timestamp = use_timestamp;
        self
    }

    /// Header lines the stage loader skips; carried for the loader only
    pub fn number_of_ignored_lines(mut self, lines: usize) -> Self {
        self.number_of_ignored_lines = lines;
        self
    }

    pub fn using_typed_source(mut self, typed: bool) -> Self {
        self.using_typed_source = typed;
        self
    }

    /// Turn empty/NULL normalisation on or off (on by default)
    pub fn null_manipulation(mut self, enabled: bool) -> Self {
        self.null_manipulation = enabled;
        self
    }

    pub fn with_feature(mut self, feature: ImportFeature) -> Self {
        if !self.features.contains(&feature) {
            self.features.push(feature);
        }
        self
    }

    /// Run every statement of the operation in an existing session
    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }

    pub fn converted_empty_columns(&self) -> &[String] {
        &self.convert_empty_values_to_null
    }

    pub fn converts_empty_to_null(&self, column: &str) -> bool {
        self.convert_empty_values_to_null.iter().any(|c| c == column)
    }

    pub fn is_incremental(&self) -> bool {
        self.incremental
    }

    pub fn uses_timestamp(&self) -> bool {
        self.use_timestamp
    }

    pub fn ignored_lines(&self) -> usize {
        self.number_of_ignored_lines
    }

    pub fn is_using_typed_source(&self) -> bool {
        self.using_typed_source
    }

    pub fn is_null_manipulation_enabled(&self) -> bool {
        self.null_manipulation
    }

    pub fn has_feature(&self, feature: ImportFeature) -> bool {
        self.features.contains(&feature)
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }
}
