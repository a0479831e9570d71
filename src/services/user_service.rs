use sqlx::PgPool;
use tracing::debug;

use crate::auth::VerifiedIdentity;
use crate::database::{DatabaseError, User};

const SELECT_USER: &str = r#"
    SELECT id, google_id AS external_id, name AS display_name, email, created_at, modified_at
    FROM users
    WHERE id = $1
"#;

/// Users keyed by their identity-provider subject
#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the user for `identity`, or refresh name/email/modified_at if the
    /// subject is already known. Absent name or email keep the stored value.
    #[tracing::instrument(skip_all, fields(subject = %identity.subject))]
    pub async fn upsert(&self, identity: &VerifiedIdentity) -> Result<User, DatabaseError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (google_id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (google_id) DO UPDATE SET
                name = COALESCE(EXCLUDED.name, users.name),
                email = COALESCE(EXCLUDED.email, users.email),
                modified_at = NOW()
            RETURNING id
            "#,
        )
        .bind(&identity.subject)
        .bind(&identity.name)
        .bind(&identity.email)
        .fetch_one(&self.pool)
        .await?;

        let user = self.load(id).await?;
        debug!(user_id = user.id, "user upserted");
        Ok(user)
    }

    pub async fn load(&self, id: i64) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(SELECT_USER)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DatabaseError::NoSuchUser(id))
    }

    /// Count all users
    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
