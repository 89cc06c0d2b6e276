//! Source catalog data model: translation functions, occurrences, records.

use crate::config::ConfigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Which catalog table a source string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SourceKind {
    /// Dot-delimited `group.key` identifiers (`trans`, `trans_choice`).
    Grouped,
    /// Free-form strings used as their own key (`__`).
    Text,
}

impl SourceKind {
    /// Both kinds, in reconciliation order.
    pub const ALL: [SourceKind; 2] = [SourceKind::Grouped, SourceKind::Text];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Grouped => "grouped",
            SourceKind::Text => "text",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grouped" => Ok(SourceKind::Grouped),
            "text" => Ok(SourceKind::Text),
            _ => Err(ConfigError::UnknownSourceKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for SourceKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A configured translation function and the argument holding its literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFunction {
    pub name: String,
    /// Zero-based index of the argument carrying the source string.
    #[serde(default)]
    pub argument: usize,
    pub kind: SourceKind,
}

impl SourceFunction {
    pub fn new(name: &str, argument: usize, kind: SourceKind) -> Self {
        Self {
            name: name.to_string(),
            argument,
            kind,
        }
    }
}

/// Validated lookup from function name to its [`SourceFunction`].
#[derive(Debug, Clone)]
pub struct FunctionTable {
    functions: Vec<SourceFunction>,
    by_name: HashMap<String, usize>,
}

impl FunctionTable {
    /// Build a table, rejecting function names configured more than once.
    pub fn new(functions: Vec<SourceFunction>) -> Result<Self, ConfigError> {
        let mut by_name = HashMap::with_capacity(functions.len());
        for (idx, func) in functions.iter().enumerate() {
            if by_name.insert(func.name.clone(), idx).is_some() {
                return Err(ConfigError::DuplicateFunction(func.name.clone()));
            }
        }
        Ok(Self { functions, by_name })
    }

    pub fn get(&self, name: &str) -> Option<&SourceFunction> {
        self.by_name.get(name).map(|&idx| &self.functions[idx])
    }

    /// Kind of source produced by the named function, if it is configured.
    pub fn kind_of(&self, name: &str) -> Option<SourceKind> {
        self.get(name).map(|f| f.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFunction> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// The Laravel helpers: `__` for text sources, `trans`/`trans_choice` for grouped ones.
pub fn default_functions() -> Vec<SourceFunction> {
    vec![
        SourceFunction::new("__", 0, SourceKind::Text),
        SourceFunction::new("trans", 0, SourceKind::Grouped),
        SourceFunction::new("trans_choice", 0, SourceKind::Grouped),
    ]
}

impl Default for FunctionTable {
    fn default() -> Self {
        let functions = default_functions();
        let by_name = functions
            .iter()
            .enumerate()
            .map(|(idx, f)| (f.name.clone(), idx))
            .collect();
        Self { functions, by_name }
    }
}

/// One literal string found at a translation call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub function: String,
    pub value: String,
}

/// An occurrence resolved to its source kind, after deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FoundSource {
    pub value: String,
    pub kind: SourceKind,
}

/// What to do with catalogued sources that a scan no longer finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    #[default]
    DoNothing,
    Delete,
    Mark,
}

impl MissingPolicy {
    /// Resolve the policy from the delete/mark flags. Delete wins when both are set.
    pub fn from_flags(delete: bool, mark: bool) -> Self {
        if delete {
            MissingPolicy::Delete
        } else if mark {
            MissingPolicy::Mark
        } else {
            MissingPolicy::DoNothing
        }
    }

    /// Past-tense verb for operator messages ("deleted", "marked as missing").
    pub fn action_word(self) -> &'static str {
        match self {
            MissingPolicy::DoNothing => "left untouched",
            MissingPolicy::Delete => "deleted",
            MissingPolicy::Mark => "marked as missing",
        }
    }
}

/// A persisted source string row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub id: i64,
    pub locale: String,
    pub source: String,
    /// Always `None` for text sources.
    pub namespace: Option<String>,
    pub missing: bool,
    pub created_at: DateTime<Utc>,
    pub missing_at: Option<DateTime<Utc>>,
}

/// A translated message owned by exactly one source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationMessage {
    pub id: i64,
    pub source_kind: SourceKind,
    pub source_id: i64,
    pub locale: String,
    pub message: String,
    pub review: bool,
    pub created_at: DateTime<Utc>,
}
