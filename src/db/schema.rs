use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Licenses mirrored from the remote service.
        -- license_key is the natural identity; id is local only.
        -- Timestamps are unix seconds, NULL when unknown.
        CREATE TABLE IF NOT EXISTS licenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            license_key TEXT NOT NULL UNIQUE,
            customer_email TEXT,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
            activation_count INTEGER NOT NULL DEFAULT 0 CHECK (activation_count >= 0),
            max_activations INTEGER NOT NULL DEFAULT 1 CHECK (max_activations >= 1),
            activated_domains TEXT NOT NULL DEFAULT '',
            created_at INTEGER,
            updated_at INTEGER,
            email_sent_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_licenses_customer_email ON licenses(customer_email);
        CREATE INDEX IF NOT EXISTS idx_licenses_status ON licenses(status);
        CREATE INDEX IF NOT EXISTS idx_licenses_created ON licenses(created_at DESC);
        "#,
    )?;

    Ok(())
}
