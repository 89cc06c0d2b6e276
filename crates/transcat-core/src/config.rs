//! Configuration for source scanning and the translation catalog.
//!
//! Load order: `.transcat/config.toml` → environment variables → defaults.

use crate::source::{FunctionTable, MissingPolicy, SourceFunction, SourceKind, default_functions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".transcat";
const CONFIG_FILE: &str = "config.toml";

/// Errors raised while loading or validating configuration. All are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown source kind '{0}' (expected 'grouped' or 'text')")]
    UnknownSourceKind(String),
    #[error("translation function '{0}' is configured more than once")]
    DuplicateFunction(String),
    #[error("invalid table name '{0}'")]
    InvalidTableName(String),
    #[error("source locale must not be empty")]
    EmptyLocale,
    #[error("invalid flag value '{0}' (expected true/false, yes/no, on/off or a number)")]
    InvalidFlag(String),
}

/// Top-level transcat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscatConfig {
    /// Locale the application's source strings are written in.
    pub source_locale: String,
    /// Directories scanned for translation calls, relative to the project root.
    pub parse_roots: Vec<PathBuf>,
    /// Delete catalogued sources that a scan no longer finds.
    pub delete_missing: bool,
    /// Flag catalogued sources that a scan no longer finds as missing.
    pub mark_missing: bool,
    /// SQLite catalog location, relative to the project root.
    pub database: PathBuf,
    pub tables: TableNames,
    pub functions: Vec<SourceFunction>,
}

/// Catalog table identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub source_grouped: String,
    pub source_text: String,
    pub translations: String,
}

impl Default for TranscatConfig {
    fn default() -> Self {
        Self {
            source_locale: "en".to_string(),
            parse_roots: ["app", "resources", "routes", "database", "config", "bootstrap"]
                .iter()
                .map(PathBuf::from)
                .collect(),
            delete_missing: false,
            mark_missing: true,
            database: Path::new(CONFIG_DIR).join("catalog.db"),
            tables: TableNames::default(),
            functions: default_functions(),
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            source_grouped: "translation_source_grouped".to_string(),
            source_text: "translation_source_text".to_string(),
            translations: "translation_messages".to_string(),
        }
    }
}

impl TableNames {
    /// Source table holding rows of the given kind.
    pub fn for_kind(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::Grouped => &self.source_grouped,
            SourceKind::Text => &self.source_text,
        }
    }

    /// Table names are spliced into SQL, so only plain identifiers are accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in [&self.source_grouped, &self.source_text, &self.translations] {
            if !is_identifier(name) {
                return Err(ConfigError::InvalidTableName(name.clone()));
            }
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a boolean option value the way the `--delete`/`--mark` flags accept them.
///
/// Numbers are true when non-zero.
pub fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    let v = value.trim().to_ascii_lowercase();
    match v.as_str() {
        "true" | "yes" | "on" => return Ok(true),
        "false" | "no" | "off" => return Ok(false),
        _ => {}
    }
    v.parse::<i64>()
        .map(|n| n != 0)
        .map_err(|_| ConfigError::InvalidFlag(value.to_string()))
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    target: &mut T,
) {
    if let Some(v) = lookup(var)
        && let Ok(parsed) = v.parse()
    {
        *target = parsed;
    }
}

fn env_flag_override(lookup: &impl Fn(&str) -> Option<String>, var: &str, target: &mut bool) {
    if let Some(v) = lookup(var) {
        match parse_flag(&v) {
            Ok(flag) => *target = flag,
            Err(e) => tracing::warn!(var, error = %e, "ignoring environment override"),
        }
    }
}

/// Report a bad `kind` in `[[functions]]` as its own error rather than a generic parse failure.
fn check_function_kinds(raw: &toml::Table) -> Result<(), ConfigError> {
    let Some(functions) = raw.get("functions").and_then(toml::Value::as_array) else {
        return Ok(());
    };
    for kind in functions
        .iter()
        .filter_map(|f| f.get("kind").and_then(toml::Value::as_str))
    {
        kind.parse::<SourceKind>()?;
    }
    Ok(())
}

impl TranscatConfig {
    /// Path of the config file for a given project root.
    pub fn config_path(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load config from `.transcat/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let config_path = Self::config_path(project_root);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|source| {
                ConfigError::Io {
                    path: config_path.clone(),
                    source,
                }
            })?;
            let raw: toml::Table = toml::from_str(&content)?;
            check_function_kinds(&raw)?;
            toml::Value::Table(raw).try_into::<Self>()?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|var| std::env::var(var).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `TRANSCAT_*` overrides read through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        env_override(&lookup, "TRANSCAT_SOURCE_LOCALE", &mut self.source_locale);
        env_override(&lookup, "TRANSCAT_DATABASE", &mut self.database);
        env_flag_override(&lookup, "TRANSCAT_DELETE_MISSING", &mut self.delete_missing);
        env_flag_override(&lookup, "TRANSCAT_MARK_MISSING", &mut self.mark_missing);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_locale.trim().is_empty() {
            return Err(ConfigError::EmptyLocale);
        }
        self.tables.validate()?;
        self.function_table()?;
        Ok(())
    }

    pub fn function_table(&self) -> Result<FunctionTable, ConfigError> {
        FunctionTable::new(self.functions.clone())
    }

    /// Policy from the configured flags, with optional per-run overrides.
    pub fn missing_policy(&self, delete: Option<bool>, mark: Option<bool>) -> MissingPolicy {
        MissingPolicy::from_flags(
            delete.unwrap_or(self.delete_missing),
            mark.unwrap_or(self.mark_missing),
        )
    }

    /// Roots to scan: explicit overrides when given, else `parse_roots`,
    /// resolved against the project root.
    pub fn resolve_roots(&self, project_root: &Path, overrides: &[PathBuf]) -> Vec<PathBuf> {
        let roots: &[PathBuf] = if overrides.is_empty() {
            &self.parse_roots
        } else {
            overrides
        };
        roots.iter().map(|r| project_root.join(r)).collect()
    }

    pub fn database_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.database)
    }
}
