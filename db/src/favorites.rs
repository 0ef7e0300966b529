use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

/// A saved recipe snapshot. Rows are only ever inserted or deleted, and every
/// query is scoped to the owning user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FavoriteRow {
    pub favorite_id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: String,
    pub recipe_title: String,
    pub recipe_data: Json<serde_json::Value>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewFavorite<'a> {
    pub user_id: Uuid,
    pub recipe_id: &'a str,
    pub recipe_title: &'a str,
    pub recipe_data: serde_json::Value,
    pub source: &'a str,
}

impl FavoriteRow {
    /// Inserts a favorite. A second favorite with the same title for the same
    /// user violates `favorites_user_title_idx`; callers detect that with
    /// [`is_unique_violation`].
    pub async fn insert(pool: &PgPool, new: NewFavorite<'_>) -> sqlx::Result<Self> {
        sqlx::query_as::<_, FavoriteRow>(
            r"
            INSERT INTO Favorites (favorite_id, user_id, recipe_id, recipe_title, recipe_data, source)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.recipe_id)
        .bind(new.recipe_title)
        .bind(Json(new.recipe_data))
        .bind(new.source)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, FavoriteRow>(
            r"
            SELECT *
            FROM Favorites
            WHERE user_id = $1
            ORDER BY created_at DESC, favorite_id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_for_user(
        pool: &PgPool,
        user_id: Uuid,
        favorite_id: Uuid,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, FavoriteRow>(
            r"
            SELECT *
            FROM Favorites
            WHERE user_id = $1 AND favorite_id = $2
            ",
        )
        .bind(user_id)
        .bind(favorite_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_title_for_user(
        pool: &PgPool,
        user_id: Uuid,
        recipe_title: &str,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, FavoriteRow>(
            r"
            SELECT *
            FROM Favorites
            WHERE user_id = $1 AND recipe_title = $2
            ",
        )
        .bind(user_id)
        .bind(recipe_title)
        .fetch_optional(pool)
        .await
    }

    /// Returns the number of rows removed.
    pub async fn delete_by_title_for_user(
        pool: &PgPool,
        user_id: Uuid,
        recipe_title: &str,
    ) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM Favorites WHERE user_id = $1 AND recipe_title = $2")
            .bind(user_id)
            .bind(recipe_title)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Returns the number of rows removed.
    pub async fn delete_for_user(
        pool: &PgPool,
        user_id: Uuid,
        favorite_id: Uuid,
    ) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM Favorites WHERE user_id = $1 AND favorite_id = $2")
            .bind(user_id)
            .bind(favorite_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
