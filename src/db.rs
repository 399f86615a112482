//! Database module
//!
//! Connectivity and schema checks. The schema itself lives in `migrations/`.

use sqlx::PgPool;

/// Tables the credential store reads and writes
const REQUIRED_TABLES: &[&str] = &[
    "users",
    "accounts",
    "member_roles",
    "members",
    "transaction_types",
    "transactions",
    "event_types",
    "account_events",
];

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check that required tables exist and the administrator role is seeded
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(*table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    let admin_role: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM member_roles WHERE id = $1)")
            .bind(crate::domain::RoleId::ADMINISTRATOR.0)
            .fetch_one(pool)
            .await?;

    if !admin_role {
        tracing::error!("Administrator member role (id 1) is not seeded. Please run migrations.");
        return Ok(false);
    }

    Ok(true)
}
