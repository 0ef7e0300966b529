use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct DBSession {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl DBSession {
    pub async fn create(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Self> {
        sqlx::query_as::<_, DBSession>(
            r"
            INSERT INTO Sessions (session_id, user_id)
            VALUES ($1, $2)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find(pool: &PgPool, session_id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, DBSession>(
            r"
            SELECT *
            FROM Sessions
            WHERE session_id = $1
            ",
        )
        .bind(session_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, session_id: Uuid) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM Sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
