//! Serve translated messages from the catalog.

use crate::store::{CatalogError, SqliteCatalog, source_column};
use rusqlite::ToSql;
use std::collections::BTreeMap;
use transcat_core::source::SourceKind;

/// Group and namespace wildcard. `*`/`*` selects text sources.
pub const WILDCARD: &str = "*";

/// Resolves `(locale, group, namespace)` to a key→message map.
pub struct TranslationLoader<'a> {
    catalog: &'a SqliteCatalog,
    source_locale: String,
}

impl<'a> TranslationLoader<'a> {
    pub fn new(catalog: &'a SqliteCatalog, source_locale: impl Into<String>) -> Self {
        Self {
            catalog,
            source_locale: source_locale.into(),
        }
    }

    /// Messages for one locale and group.
    ///
    /// The source locale never has stored messages, so it always loads empty.
    /// For grouped sources the `group.` prefix is stripped from each key.
    pub fn load(
        &self,
        locale: &str,
        group: &str,
        namespace: Option<&str>,
    ) -> Result<BTreeMap<String, String>, CatalogError> {
        if locale == self.source_locale {
            return Ok(BTreeMap::new());
        }
        if group == WILDCARD && namespace == Some(WILDCARD) {
            return self.load_text(locale);
        }
        let namespace = namespace.filter(|ns| *ns != WILDCARD);
        self.load_grouped(locale, group, namespace)
    }

    fn load_text(&self, locale: &str) -> Result<BTreeMap<String, String>, CatalogError> {
        let tables = self.catalog.tables();
        let sql = format!(
            "SELECT src.source, msg.message
             FROM {text} src JOIN {messages} msg ON msg.{column} = src.id
             WHERE msg.locale = ?1
             ORDER BY msg.id",
            text = tables.source_text,
            messages = tables.translations,
            column = source_column(SourceKind::Text),
        );
        let rows = self.query_pairs(&sql, &[&locale])?;
        Ok(rows.into_iter().collect())
    }

    fn load_grouped(
        &self,
        locale: &str,
        group: &str,
        namespace: Option<&str>,
    ) -> Result<BTreeMap<String, String>, CatalogError> {
        let tables = self.catalog.tables();
        let prefix = format!("{group}.");
        let pattern = format!("{}.%", escape_like(group));
        let namespace_filter = if namespace.is_some() {
            " AND src.namespace = ?3"
        } else {
            ""
        };
        let sql = format!(
            "SELECT src.source, msg.message
             FROM {grouped} src JOIN {messages} msg ON msg.{column} = src.id
             WHERE msg.locale = ?1 AND src.source LIKE ?2 ESCAPE '\\'{namespace_filter}
             ORDER BY msg.id",
            grouped = tables.source_grouped,
            messages = tables.translations,
            column = source_column(SourceKind::Grouped),
        );

        let rows = match namespace {
            Some(ns) => self.query_pairs(&sql, &[&locale, &pattern, &ns])?,
            None => self.query_pairs(&sql, &[&locale, &pattern])?,
        };
        // LIKE is case-insensitive for ASCII; keep only exact prefix matches.
        Ok(rows
            .into_iter()
            .filter_map(|(source, message)| {
                source
                    .strip_prefix(&prefix)
                    .map(|key| (key.to_string(), message))
            })
            .collect())
    }

    fn query_pairs(
        &self,
        sql: &str,
        values: &[&dyn ToSql],
    ) -> Result<Vec<(String, String)>, CatalogError> {
        let mut stmt = self.catalog.connection().prepare(sql)?;
        let rows = stmt.query_map(values, |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

/// Escape `LIKE` metacharacters for use with `ESCAPE '\'`.
fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
