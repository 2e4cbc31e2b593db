use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::path::Path;

/// Open the catalog database file, creating it (and its parent directory) on
/// first run.
pub async fn connect(db_path: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_path.is_absolute() {
        db_path.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_path)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;
    Ok(conn)
}

/// Ensure required tables and indexes exist (minimal schema bootstrap)
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let check_table = r#"
        SELECT name FROM sqlite_master
        WHERE type='table' AND name='listing';
    "#;
    let table_exists = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            check_table.to_string(),
        ))
        .await?;

    if table_exists.is_empty() {
        tracing::info!("Creating listing table");
        let create_listing_table_sql = r#"
            CREATE TABLE listing (
                id TEXT PRIMARY KEY NOT NULL,
                make TEXT NOT NULL,
                model TEXT NOT NULL,
                year INTEGER NOT NULL,
                price REAL NOT NULL,
                mileage INTEGER,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#;
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            create_listing_table_sql.to_string(),
        ))
        .await?;
    }

    // Index shapes follow the read paths: status-filtered recency listing and
    // make/model lookups
    let index_ddl = [
        "CREATE INDEX IF NOT EXISTS idx_listing_status_created ON listing(status, created_at);",
        "CREATE INDEX IF NOT EXISTS idx_listing_make_model ON listing(make, model);",
    ];
    for ddl in index_ddl {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            ddl.to_string(),
        ))
        .await?;
    }

    Ok(())
}

/// In-memory database for tests. A single pooled connection is required:
/// every new `sqlite::memory:` connection gets its own empty database.
#[cfg(test)]
pub(crate) async fn in_memory() -> DatabaseConnection {
    use sea_orm::ConnectOptions;

    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);
    let conn = Database::connect(options)
        .await
        .expect("failed to open in-memory sqlite");
    bootstrap_schema(&conn)
        .await
        .expect("failed to bootstrap schema");
    conn
}
