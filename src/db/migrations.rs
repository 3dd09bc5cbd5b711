use crate::db::Database;
use crate::error::Result;

const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS pesticide_applications (
        id TEXT PRIMARY KEY,
        position INTEGER NOT NULL,
        product_name TEXT NOT NULL CHECK (length(trim(product_name)) > 0),
        withdrawal_days INTEGER NOT NULL CHECK (withdrawal_days >= 1),
        applied_date TEXT NOT NULL,
        safe_date TEXT NOT NULL,
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    // Migration 2: Add indexes
    r#"
    CREATE INDEX IF NOT EXISTS idx_pesticide_applications_position
        ON pesticide_applications(position);
    CREATE INDEX IF NOT EXISTS idx_pesticide_applications_safe_date
        ON pesticide_applications(safe_date);
    "#,
];

pub fn run(db: &Database) -> Result<()> {
    db.with_conn_mut(|conn| {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;

        let current_version: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                tracing::info!("Applying migration {}", version);
                let tx = conn.transaction()?;
                tx.execute_batch(migration)?;
                tx.execute(
                    "INSERT INTO schema_migrations (version) VALUES (?1)",
                    [version],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_recorded_once() {
        let db = Database::open_in_memory().unwrap();
        // running again is a no-op
        run(&db).unwrap();

        let versions: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                    row.get(0)
                })?)
            })
            .unwrap();
        assert_eq!(versions, MIGRATIONS.len() as i64);
    }
}
