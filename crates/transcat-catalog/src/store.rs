//! Catalog persistence: snapshots of known sources and bulk mutations.

use crate::schema;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ToSql, params, params_from_iter};
use std::collections::HashMap;
use std::path::Path;
use transcat_core::config::{ConfigError, TableNames};
use transcat_core::source::{MissingPolicy, SourceKind, SourceRecord, TranslationMessage};

/// Upper bound on bound ids (or inserted rows) per statement.
pub const CHUNK_SIZE: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Catalogued state of one source value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub id: i64,
    pub missing: bool,
}

/// Every source of one kind, keyed by value.
pub type KindSnapshot = HashMap<String, SnapshotEntry>;

/// Mutations for one kind, derived from a snapshot and the found sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindPlan {
    /// New source values, in discovery order.
    pub inserts: Vec<String>,
    /// Ids of missing rows that were found again.
    pub renew: Vec<i64>,
    /// Ids of rows not found, subject to the missing policy. Sorted.
    pub pending: Vec<i64>,
}

impl KindPlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.renew.is_empty() && self.pending.is_empty()
    }
}

/// Rows actually affected when applying a [`KindPlan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindOutcome {
    pub inserted: usize,
    pub renewed: usize,
    pub missing_acted: usize,
}

impl std::ops::AddAssign for KindOutcome {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.renewed += other.renewed;
        self.missing_acted += other.missing_acted;
    }
}

/// Storage the reconciler reads snapshots from and applies plans to.
pub trait CatalogStore {
    /// All sources of `kind`. Grouped snapshots cover only un-namespaced rows.
    fn snapshot(&self, kind: SourceKind) -> Result<KindSnapshot, CatalogError>;

    /// Apply a plan atomically for one kind.
    fn apply(
        &self,
        kind: SourceKind,
        plan: &KindPlan,
        policy: MissingPolicy,
        locale: &str,
        now: DateTime<Utc>,
    ) -> Result<KindOutcome, CatalogError>;
}

/// SQLite catalog database.
pub struct SqliteCatalog {
    conn: Connection,
    tables: TableNames,
}

impl SqliteCatalog {
    /// Open (or create) the catalog at `path` and ensure its tables exist.
    pub fn open(path: &Path, tables: TableNames) -> Result<Self, CatalogError> {
        tables.validate()?;
        let conn = Connection::open(path)?;
        tracing::debug!("opened catalog {}", path.display());
        Self::init(conn, tables)
    }

    pub fn open_in_memory(tables: TableNames) -> Result<Self, CatalogError> {
        tables.validate()?;
        Self::init(Connection::open_in_memory()?, tables)
    }

    fn init(conn: Connection, tables: TableNames) -> Result<Self, CatalogError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::create_tables(&conn, &tables)?;
        Ok(Self { conn, tables })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// Every row of one source table, ordered by id.
    pub fn records(&self, kind: SourceKind) -> Result<Vec<SourceRecord>, CatalogError> {
        let table = self.tables.for_kind(kind);
        let namespace = match kind {
            SourceKind::Grouped => "namespace",
            SourceKind::Text => "NULL",
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, locale, source, {namespace}, missing, created_at, missing_at
             FROM {table} ORDER BY id"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(SourceRecord {
                id: row.get(0)?,
                locale: row.get(1)?,
                source: row.get(2)?,
                namespace: row.get(3)?,
                missing: row.get(4)?,
                created_at: row.get(5)?,
                missing_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Look up one source row by value. Grouped lookups ignore namespaced rows.
    pub fn find(&self, kind: SourceKind, source: &str) -> Result<Option<SourceRecord>, CatalogError> {
        Ok(self
            .records(kind)?
            .into_iter()
            .find(|r| r.source == source && r.namespace.is_none()))
    }

    /// Insert a single source row, optionally namespaced (grouped only).
    pub fn insert_source(
        &self,
        kind: SourceKind,
        namespace: Option<&str>,
        source: &str,
        locale: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, CatalogError> {
        let table = self.tables.for_kind(kind);
        match kind {
            SourceKind::Grouped => self.conn.execute(
                &format!(
                    "INSERT INTO {table} (locale, namespace, source, missing, created_at)
                     VALUES (?1, ?2, ?3, 0, ?4)"
                ),
                params![locale, namespace, source, now],
            )?,
            SourceKind::Text => self.conn.execute(
                &format!(
                    "INSERT INTO {table} (locale, source, missing, created_at) VALUES (?1, ?2, 0, ?3)"
                ),
                params![locale, source, now],
            )?,
        };
        Ok(self.conn.last_insert_rowid())
    }

    /// Attach a translated message to a source row.
    pub fn insert_message(
        &self,
        kind: SourceKind,
        source_id: i64,
        locale: &str,
        message: &str,
    ) -> Result<i64, CatalogError> {
        let column = source_column(kind);
        self.conn.execute(
            &format!(
                "INSERT INTO {} ({column}, locale, message, review, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                self.tables.translations
            ),
            params![source_id, locale, message, Utc::now()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Every message row, ordered by id.
    pub fn messages(&self) -> Result<Vec<TranslationMessage>, CatalogError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, source_grouped_id, source_text_id, locale, message, review, created_at
             FROM {} ORDER BY id",
            self.tables.translations
        ))?;
        let rows = stmt.query_map([], |row| {
            let grouped: Option<i64> = row.get(1)?;
            let text: Option<i64> = row.get(2)?;
            let (source_kind, source_id) = match (grouped, text) {
                (Some(id), _) => (SourceKind::Grouped, id),
                (None, Some(id)) => (SourceKind::Text, id),
                (None, None) => (SourceKind::Text, 0),
            };
            Ok(TranslationMessage {
                id: row.get(0)?,
                source_kind,
                source_id,
                locale: row.get(3)?,
                message: row.get(4)?,
                review: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Number of rows in a source table.
    pub fn count(&self, kind: SourceKind) -> Result<usize, CatalogError> {
        let table = self.tables.for_kind(kind);
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

impl CatalogStore for SqliteCatalog {
    fn snapshot(&self, kind: SourceKind) -> Result<KindSnapshot, CatalogError> {
        let table = self.tables.for_kind(kind);
        let filter = match kind {
            SourceKind::Grouped => " WHERE namespace IS NULL",
            SourceKind::Text => "",
        };
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id, source, missing FROM {table}{filter}"))?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(1)?,
                SnapshotEntry {
                    id: row.get(0)?,
                    missing: row.get(2)?,
                },
            ))
        })?;
        let snapshot: KindSnapshot = rows.collect::<Result<_, _>>()?;
        tracing::debug!(kind = %kind, rows = snapshot.len(), "snapshot");
        Ok(snapshot)
    }

    fn apply(
        &self,
        kind: SourceKind,
        plan: &KindPlan,
        policy: MissingPolicy,
        locale: &str,
        now: DateTime<Utc>,
    ) -> Result<KindOutcome, CatalogError> {
        let table = self.tables.for_kind(kind);
        let tx = self.conn.unchecked_transaction()?;

        match apply_inner(&tx, table, plan, policy, locale, now) {
            Ok(outcome) => {
                tx.commit()?;
                tracing::debug!(
                    kind = %kind,
                    inserted = outcome.inserted,
                    renewed = outcome.renewed,
                    missing = outcome.missing_acted,
                    "applied plan"
                );
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback() {
                    tracing::warn!(kind = %kind, error = %rollback, "rollback failed");
                }
                Err(e.into())
            }
        }
    }
}

fn apply_inner(
    conn: &Connection,
    table: &str,
    plan: &KindPlan,
    policy: MissingPolicy,
    locale: &str,
    now: DateTime<Utc>,
) -> rusqlite::Result<KindOutcome> {
    let mut outcome = KindOutcome::default();

    for chunk in plan.inserts.chunks(CHUNK_SIZE) {
        let rows = vec!["(?, ?, 0, ?)"; chunk.len()].join(", ");
        let sql = format!("INSERT INTO {table} (locale, source, missing, created_at) VALUES {rows}");
        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() * 3);
        for source in chunk {
            values.push(&locale);
            values.push(source);
            values.push(&now);
        }
        outcome.inserted += conn.execute(&sql, values.as_slice())?;
    }

    for chunk in plan.renew.chunks(CHUNK_SIZE) {
        let sql = format!(
            "UPDATE {table} SET missing = 0, missing_at = NULL WHERE id IN ({})",
            placeholders(chunk.len())
        );
        outcome.renewed += conn.execute(&sql, params_from_iter(chunk))?;
    }

    match policy {
        MissingPolicy::Delete => {
            for chunk in plan.pending.chunks(CHUNK_SIZE) {
                let sql = format!(
                    "DELETE FROM {table} WHERE id IN ({})",
                    placeholders(chunk.len())
                );
                outcome.missing_acted += conn.execute(&sql, params_from_iter(chunk))?;
            }
        }
        MissingPolicy::Mark => {
            for chunk in plan.pending.chunks(CHUNK_SIZE) {
                let sql = format!(
                    "UPDATE {table} SET missing = 1, missing_at = ?
                     WHERE missing_at IS NULL AND id IN ({})",
                    placeholders(chunk.len())
                );
                let mut values: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() + 1);
                values.push(&now);
                values.extend(chunk.iter().map(|id| id as &dyn ToSql));
                outcome.missing_acted += conn.execute(&sql, values.as_slice())?;
            }
        }
        MissingPolicy::DoNothing => {}
    }

    Ok(outcome)
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Messages column referencing a source row of `kind`.
pub(crate) fn source_column(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Grouped => "source_grouped_id",
        SourceKind::Text => "source_text_id",
    }
}
