use sqlx::PgPool;
use tracing::debug;

use crate::database::{DatabaseError, Tab, User};

pub const DEFAULT_LIMIT: i64 = 1000;

/// Tabs, each owned by one user and unique per (user, url)
#[derive(Clone)]
pub struct TabService {
    pool: PgPool,
}

impl TabService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Archive `tab` for `user`. Resubmitting a url updates the existing row and
    /// keeps the later of the two `seen` times.
    #[tracing::instrument(skip_all, fields(user_id = user.id))]
    pub async fn append(&self, user: &User, tab: &Tab) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO tabs (user_id, url, title, favicon, seen)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, url) DO UPDATE SET
                title = EXCLUDED.title,
                favicon = EXCLUDED.favicon,
                seen = GREATEST(tabs.seen, EXCLUDED.seen),
                modified_at = NOW()
            "#,
        )
        .bind(user.id)
        .bind(&tab.url)
        .bind(&tab.title)
        .bind(&tab.favicon)
        .bind(tab.seen)
        .execute(&self.pool)
        .await?;

        debug!(url = %tab.url, rows = result.rows_affected(), "tab stored");
        Ok(())
    }

    /// The user's tabs, most recently seen first
    pub async fn list(&self, user: &User, limit: i64, offset: i64) -> Result<Vec<Tab>, DatabaseError> {
        let (limit, offset) = clamp_page(limit, offset);

        let tabs = sqlx::query_as::<_, Tab>(
            r#"
            SELECT url, title, favicon, seen
            FROM tabs
            WHERE user_id = $1
            ORDER BY seen DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user.id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(tabs)
    }

    /// Count all tabs across users
    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tabs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(0, DEFAULT_LIMIT), offset.max(0))
}
