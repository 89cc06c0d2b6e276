//! Catalog table definitions.

use rusqlite::Connection;
use transcat_core::config::TableNames;

/// Create the grouped, text and messages tables if they do not exist yet.
///
/// Table names must already be validated; they are spliced into the DDL.
pub fn create_tables(conn: &Connection, tables: &TableNames) -> rusqlite::Result<()> {
    let grouped = &tables.source_grouped;
    let text = &tables.source_text;
    let messages = &tables.translations;

    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {grouped} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            locale TEXT NOT NULL,
            namespace TEXT,
            source TEXT NOT NULL,
            missing INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            missing_at TEXT
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_{grouped}_namespace_source
            ON {grouped}(namespace, source);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_{grouped}_global_source
            ON {grouped}(source) WHERE namespace IS NULL;

        CREATE TABLE IF NOT EXISTS {text} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            locale TEXT NOT NULL,
            source TEXT NOT NULL UNIQUE,
            missing INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            missing_at TEXT
        );

        CREATE TABLE IF NOT EXISTS {messages} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_grouped_id INTEGER REFERENCES {grouped}(id) ON DELETE CASCADE,
            source_text_id INTEGER REFERENCES {text}(id) ON DELETE CASCADE,
            locale TEXT NOT NULL,
            message TEXT NOT NULL,
            review INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            CHECK ((source_grouped_id IS NULL) <> (source_text_id IS NULL))
        );
        CREATE INDEX IF NOT EXISTS idx_{messages}_grouped ON {messages}(source_grouped_id);
        CREATE INDEX IF NOT EXISTS idx_{messages}_text ON {messages}(source_text_id);
        CREATE INDEX IF NOT EXISTS idx_{messages}_locale ON {messages}(locale);"
    ))?;

    tracing::debug!("catalog tables ensured: {grouped}, {text}, {messages}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_create_tables_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let tables = TableNames::default();
        create_tables(&conn, &tables).unwrap();
        create_tables(&conn, &tables).unwrap();
        assert_eq!(
            table_names(&conn),
            vec![
                "translation_messages",
                "translation_source_grouped",
                "translation_source_text"
            ]
        );
    }

    #[test]
    fn test_message_needs_exactly_one_source() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn, &TableNames::default()).unwrap();
        let both_null = conn.execute(
            "INSERT INTO translation_messages (locale, message, created_at) VALUES ('de', 'x', '2024-01-01')",
            [],
        );
        assert!(both_null.is_err());
    }

    #[test]
    fn test_custom_table_names() {
        let conn = Connection::open_in_memory().unwrap();
        let tables = TableNames {
            source_grouped: "lt_grouped".into(),
            source_text: "lt_text".into(),
            translations: "lt_messages".into(),
        };
        create_tables(&conn, &tables).unwrap();
        assert_eq!(table_names(&conn), vec!["lt_grouped", "lt_messages", "lt_text"]);
    }
}
