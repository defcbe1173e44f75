use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::path::Path;

/// Tables read by the dashboard. Local SQLite deployments get them created on
/// first start; hosted backends own their schema.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS dimensiones (
        nombre TEXT PRIMARY KEY NOT NULL,
        peso REAL NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS subdimensiones (
        nombre TEXT PRIMARY KEY NOT NULL,
        nombre_dimension TEXT NOT NULL,
        peso REAL NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS definicion_indicadores (
        nombre TEXT PRIMARY KEY NOT NULL,
        nombre_subdimension TEXT NOT NULL,
        importancia TEXT,
        formula TEXT,
        fuente TEXT,
        origen_indicador TEXT,
        activo INTEGER
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS resultado_indicadores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        nombre_indicador TEXT NOT NULL,
        pais TEXT,
        periodo INTEGER,
        valor_calculado REAL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_resultado_indicadores_lookup
        ON resultado_indicadores (nombre_indicador, pais, periodo);
    "#,
];

/// Open (and create if needed) the SQLite database at `db_file`.
pub async fn connect_sqlite(db_file: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening SQLite database at {}", absolute_path.display());
    let conn = Database::connect(&db_url).await?;
    Ok(conn)
}

/// Create the KPI tables when they do not exist yet.
pub async fn ensure_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for sql in SCHEMA {
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
            .await?;
    }
    tracing::debug!("KPI schema ready ({} statements)", SCHEMA.len());
    Ok(())
}
