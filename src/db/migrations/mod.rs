use sqlx::SqlitePool;
use tracing::debug;

/// Schema files, applied in order. Every statement must be idempotent.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_create_events.sql",
        include_str!("sql/001_create_events.sql"),
    ),
    ("002_add_indexes.sql", include_str!("sql/002_add_indexes.sql")),
];

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for (name, sql) in MIGRATIONS {
        sqlx::raw_sql(sql).execute(pool).await?;
        debug!("Applied migration: {}", name);
    }

    Ok(())
}
