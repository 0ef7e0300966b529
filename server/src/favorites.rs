use async_trait::async_trait;
use chrono::{DateTime, Utc};
use db::{
    favorites::{is_unique_violation, FavoriteRow, NewFavorite},
    PgPool,
};
use serde::Serialize;
use uuid::Uuid;

use crate::recipes::{Recipe, RecipeSource};

#[derive(Debug, thiserror::Error)]
pub(crate) enum FavoritesError {
    #[error("\"{0}\" is already in your favorites")]
    Conflict(String),
    #[error("Favorite not found")]
    NotFound,
    #[error("Could not access favorites")]
    Database(#[from] sqlx::Error),
    #[error("A stored favorite could not be read")]
    Corrupt(#[from] serde_json::Error),
}

/// A saved recipe snapshot. Never updated once stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: String,
    pub recipe_title: String,
    pub recipe_data: Recipe,
    pub source: RecipeSource,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<FavoriteRow> for Favorite {
    type Error = FavoritesError;

    fn try_from(row: FavoriteRow) -> Result<Self, Self::Error> {
        let recipe_data: Recipe = serde_json::from_value(row.recipe_data.0)?;

        Ok(Self {
            id: row.favorite_id,
            user_id: row.user_id,
            recipe_id: row.recipe_id,
            recipe_title: row.recipe_title,
            source: recipe_data.source,
            recipe_data,
            created_at: row.created_at,
        })
    }
}

/// Per-user favorites. Every operation is scoped to `user_id`; another
/// user's favorite behaves as if it did not exist.
#[async_trait]
pub(crate) trait FavoritesStore: Send + Sync {
    /// Newest first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Favorite>, FavoritesError>;

    async fn add(&self, user_id: Uuid, recipe: &Recipe) -> Result<Favorite, FavoritesError>;

    /// Removing a title that is not a favorite succeeds.
    async fn remove_by_title(&self, user_id: Uuid, title: &str) -> Result<(), FavoritesError>;

    async fn remove_by_id(&self, user_id: Uuid, favorite_id: Uuid)
        -> Result<(), FavoritesError>;

    async fn get_by_id(&self, user_id: Uuid, favorite_id: Uuid)
        -> Result<Favorite, FavoritesError>;

    async fn find_by_title(
        &self,
        user_id: Uuid,
        title: &str,
    ) -> Result<Option<Favorite>, FavoritesError>;
}

#[derive(Debug, Clone)]
pub(crate) struct PgFavoritesStore {
    pool: PgPool,
}

impl PgFavoritesStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoritesStore for PgFavoritesStore {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Favorite>, FavoritesError> {
        FavoriteRow::list_for_user(&self.pool, user_id)
            .await?
            .into_iter()
            .map(Favorite::try_from)
            .collect()
    }

    #[tracing::instrument(skip(self, recipe), fields(recipe.id = %recipe.id), err)]
    async fn add(&self, user_id: Uuid, recipe: &Recipe) -> Result<Favorite, FavoritesError> {
        let new = NewFavorite {
            user_id,
            recipe_id: &recipe.id,
            recipe_title: &recipe.title,
            recipe_data: serde_json::to_value(recipe)?,
            source: recipe.source.as_str(),
        };

        match FavoriteRow::insert(&self.pool, new).await {
            Ok(row) => row.try_into(),
            Err(e) if is_unique_violation(&e) => {
                Err(FavoritesError::Conflict(recipe.title.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_by_title(&self, user_id: Uuid, title: &str) -> Result<(), FavoritesError> {
        let removed = FavoriteRow::delete_by_title_for_user(&self.pool, user_id, title).await?;
        tracing::debug!(removed, "Removed favorites by title");

        Ok(())
    }

    async fn remove_by_id(
        &self,
        user_id: Uuid,
        favorite_id: Uuid,
    ) -> Result<(), FavoritesError> {
        match FavoriteRow::delete_for_user(&self.pool, user_id, favorite_id).await? {
            0 => Err(FavoritesError::NotFound),
            _ => Ok(()),
        }
    }

    async fn get_by_id(
        &self,
        user_id: Uuid,
        favorite_id: Uuid,
    ) -> Result<Favorite, FavoritesError> {
        FavoriteRow::find_for_user(&self.pool, user_id, favorite_id)
            .await?
            .ok_or(FavoritesError::NotFound)?
            .try_into()
    }

    async fn find_by_title(
        &self,
        user_id: Uuid,
        title: &str,
    ) -> Result<Option<Favorite>, FavoritesError> {
        FavoriteRow::find_by_title_for_user(&self.pool, user_id, title)
            .await?
            .map(Favorite::try_from)
            .transpose()
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;

    use super::*;

    /// Same ownership and uniqueness rules as the Postgres store, kept in a
    /// `Vec` in insertion order.
    #[derive(Default)]
    pub(crate) struct MemoryFavoritesStore {
        rows: Mutex<Vec<Favorite>>,
    }

    #[async_trait]
    impl FavoritesStore for MemoryFavoritesStore {
        async fn list(&self, user_id: Uuid) -> Result<Vec<Favorite>, FavoritesError> {
            let rows = self.rows.lock().unwrap();

            Ok(rows
                .iter()
                .rev()
                .filter(|f| f.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn add(&self, user_id: Uuid, recipe: &Recipe) -> Result<Favorite, FavoritesError> {
            let mut rows = self.rows.lock().unwrap();

            if rows
                .iter()
                .any(|f| f.user_id == user_id && f.recipe_title == recipe.title)
            {
                return Err(FavoritesError::Conflict(recipe.title.clone()));
            }

            let favorite = Favorite {
                id: Uuid::new_v4(),
                user_id,
                recipe_id: recipe.id.clone(),
                recipe_title: recipe.title.clone(),
                recipe_data: recipe.clone(),
                source: recipe.source,
                created_at: Utc::now(),
            };
            rows.push(favorite.clone());

            Ok(favorite)
        }

        async fn remove_by_title(
            &self,
            user_id: Uuid,
            title: &str,
        ) -> Result<(), FavoritesError> {
            self.rows
                .lock()
                .unwrap()
                .retain(|f| !(f.user_id == user_id && f.recipe_title == title));

            Ok(())
        }

        async fn remove_by_id(
            &self,
            user_id: Uuid,
            favorite_id: Uuid,
        ) -> Result<(), FavoritesError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|f| !(f.user_id == user_id && f.id == favorite_id));

            if rows.len() == before {
                Err(FavoritesError::NotFound)
            } else {
                Ok(())
            }
        }

        async fn get_by_id(
            &self,
            user_id: Uuid,
            favorite_id: Uuid,
        ) -> Result<Favorite, FavoritesError> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|f| f.user_id == user_id && f.id == favorite_id)
                .cloned()
                .ok_or(FavoritesError::NotFound)
        }

        async fn find_by_title(
            &self,
            user_id: Uuid,
            title: &str,
        ) -> Result<Option<Favorite>, FavoritesError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|f| f.user_id == user_id && f.recipe_title == title)
                .cloned())
        }
    }
}
