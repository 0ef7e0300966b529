use sqlx::PgPool;
use uuid::Uuid;

/// An in-flight GitHub OAuth login. The id doubles as the OAuth `state`
/// parameter.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoginState {
    pub login_state_id: Uuid,
    pub state: String,
    pub return_to: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl LoginState {
    pub async fn create(pool: &PgPool, return_to: Option<&str>) -> sqlx::Result<Self> {
        sqlx::query_as::<_, LoginState>(
            r"
            INSERT INTO LoginStates (login_state_id, state, return_to)
            VALUES ($1, 'created', $2)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(return_to)
        .fetch_one(pool)
        .await
    }

    /// Marks a `created` login as completed and returns it. `None` means the
    /// state is unknown or was already used.
    pub async fn complete(pool: &PgPool, login_state_id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, LoginState>(
            r"
            UPDATE LoginStates
            SET state = 'completed', updated_at = NOW()
            WHERE login_state_id = $1 AND state = 'created'
            RETURNING *
            ",
        )
        .bind(login_state_id)
        .fetch_optional(pool)
        .await
    }
}
