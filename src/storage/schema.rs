//! Database schema definitions

/// SQL schema for the page store
pub const SCHEMA_SQL: &str = r#"
-- Latest extracted text per page
CREATE TABLE IF NOT EXISTS pages (
    key TEXT PRIMARY KEY,
    host TEXT NOT NULL,
    route TEXT NOT NULL,
    text TEXT NOT NULL,
    stored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_host ON pages(host);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
