use async_trait::async_trait;
use db::{sessions::DBSession, PgPool};
use uuid::Uuid;

/// Login sessions behind the `session_id` cookie.
#[async_trait]
pub(crate) trait LoginSessions: Send + Sync {
    /// Starts a session for `user_id` and returns its id.
    async fn create(&self, user_id: Uuid) -> sqlx::Result<Uuid>;

    /// The user a session belongs to, if the session still exists.
    async fn user_for(&self, session_id: Uuid) -> sqlx::Result<Option<Uuid>>;

    async fn end(&self, session_id: Uuid) -> sqlx::Result<()>;
}

#[derive(Debug, Clone)]
pub(crate) struct PgLoginSessions {
    pool: PgPool,
}

impl PgLoginSessions {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginSessions for PgLoginSessions {
    async fn create(&self, user_id: Uuid) -> sqlx::Result<Uuid> {
        Ok(DBSession::create(&self.pool, user_id).await?.session_id)
    }

    async fn user_for(&self, session_id: Uuid) -> sqlx::Result<Option<Uuid>> {
        Ok(DBSession::find(&self.pool, session_id)
            .await?
            .map(|session| session.user_id))
    }

    async fn end(&self, session_id: Uuid) -> sqlx::Result<()> {
        DBSession::delete(&self.pool, session_id).await
    }
}


#[cfg(test)]
mod tests {
    use super::{memory::MemoryLoginSessions, *};

    async fn contract(sessions: &dyn LoginSessions, user_id: Uuid) {
        let session_id = sessions.create(user_id).await.unwrap();
        assert_eq!(sessions.user_for(session_id).await.unwrap(), Some(user_id));
        assert_eq!(sessions.user_for(Uuid::new_v4()).await.unwrap(), None);

        sessions.end(session_id).await.unwrap();
        assert_eq!(sessions.user_for(session_id).await.unwrap(), None);
        sessions.end(session_id).await.unwrap();
    }

    #[tokio::test]
    async fn memory_sessions_follow_the_contract() {
        contract(&MemoryLoginSessions::default(), Uuid::new_v4()).await;
    }

    #[sqlx::test(migrations = "../db/migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn postgres_sessions_follow_the_contract(pool: PgPool) {
        let user = db::users::UserFromDB::upsert_from_github(&pool, "gh-1", "me")
            .await
            .unwrap();

        contract(&PgLoginSessions::new(pool), user.user_id).await;
    }
}
