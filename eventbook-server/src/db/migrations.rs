//! Database migrations for the bookings table

use sqlx::PgPool;

/// Run all booking migrations. Safe to call on every connect.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::debug!("Running booking migrations...");

    // gen_random_uuid() is built in from PostgreSQL 13
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            event_id TEXT NOT NULL,
            slug TEXT NOT NULL,
            email TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT bookings_event_id_not_empty CHECK (btrim(event_id, E' \t\r\n') <> ''),
            CONSTRAINT bookings_slug_not_empty CHECK (btrim(slug, E' \t\r\n') <> ''),
            CONSTRAINT bookings_email_not_empty CHECK (btrim(email, E' \t\r\n') <> '')
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS bookings_event_id_idx ON bookings (event_id)")
        .execute(pool)
        .await?;

    tracing::debug!("Booking migrations complete");
    Ok(())
}
