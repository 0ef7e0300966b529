use sqlx::{types::Uuid, PgPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserFromDB {
    pub user_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GithubLink {
    pub github_link_id: Uuid,
    pub user_id: Uuid,
    pub external_github_id: String,
    pub external_github_login: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl UserFromDB {
    /// Finds the user linked to a GitHub account, creating both the user and
    /// the link the first time the account logs in.
    ///
    /// The login name is refreshed on every call since GitHub lets people
    /// rename themselves.
    pub async fn upsert_from_github(
        pool: &PgPool,
        external_github_id: &str,
        external_github_login: &str,
    ) -> sqlx::Result<Self> {
        let mut tx = pool.begin().await?;

        let existing = sqlx::query_as::<_, GithubLink>(
            r"
            UPDATE GithubLinks
            SET external_github_login = $2, updated_at = NOW()
            WHERE external_github_id = $1
            RETURNING *
            ",
        )
        .bind(external_github_id)
        .bind(external_github_login)
        .fetch_optional(&mut *tx)
        .await?;

        let user_id = if let Some(link) = existing {
            link.user_id
        } else {
            let user = sqlx::query_as::<_, UserFromDB>(
                r"
                INSERT INTO Users (user_id)
                VALUES ($1)
                RETURNING *
                ",
            )
            .bind(Uuid::new_v4())
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r"
                INSERT INTO GithubLinks (github_link_id, user_id, external_github_id, external_github_login)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(Uuid::new_v4())
            .bind(user.user_id)
            .bind(external_github_id)
            .bind(external_github_login)
            .execute(&mut *tx)
            .await?;

            user.user_id
        };

        let user = sqlx::query_as::<_, UserFromDB>("SELECT * FROM Users WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn github_login_reuses_the_same_user(pool: PgPool) {
        let first = UserFromDB::upsert_from_github(&pool, "MDQ6VXNlcjE=", "octocat")
            .await
            .unwrap();
        let second = UserFromDB::upsert_from_github(&pool, "MDQ6VXNlcjE=", "octocat-renamed")
            .await
            .unwrap();

        assert_eq!(first.user_id, second.user_id);

        let login: String = sqlx::query_scalar(
            "SELECT external_github_login FROM GithubLinks WHERE external_github_id = $1",
        )
        .bind("MDQ6VXNlcjE=")
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(login, "octocat-renamed");
    }
}
