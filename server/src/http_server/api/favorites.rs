use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    favorites::Favorite,
    http_server::{
        api::parse_json,
        errors::{ApiError, ApiResult, ApiResponse},
        session::CurrentUser,
    },
    recipes::Recipe,
    AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct TitleQuery {
    title: Option<String>,
}

impl TitleQuery {
    fn required(self) -> Result<String, ApiError> {
        self.title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidInput("title is required".to_string()))
    }
}

fn favorite_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Favorite not found".to_string()))
}

fn recipe_from_body(body: &Bytes) -> Result<Recipe, ApiError> {
    let mut recipe: Recipe = serde_json::from_value(parse_json(body)?)
        .map_err(|e| ApiError::InvalidInput(format!("Body is not a valid recipe: {e}")))?;

    // Titles are looked up trimmed, so they are stored trimmed too.
    let title = recipe.title.trim();
    if title.is_empty() {
        return Err(ApiError::InvalidInput(
            "Recipe title must not be empty".to_string(),
        ));
    }
    recipe.title = title.to_string();

    Ok(recipe)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Removed {
    removed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FavoriteStatus {
    title: String,
    is_favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    favorite_id: Option<Uuid>,
}

pub(crate) async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Vec<Favorite>> {
    Ok(ApiResponse(state.favorites.list(user.user_id).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %user.user_id))]
pub(crate) async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = recipe_from_body(&body)?;

    let favorite = state.favorites.add(user.user_id, &recipe).await?;
    tracing::info!(favorite_id = %favorite.id, "Saved favorite");

    Ok((StatusCode::CREATED, ApiResponse(favorite)))
}

pub(crate) async fn get_one(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Favorite> {
    let favorite = state
        .favorites
        .get_by_id(user.user_id, favorite_id(&id)?)
        .await?;

    Ok(ApiResponse(favorite))
}

pub(crate) async fn remove_one(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Removed> {
    state
        .favorites
        .remove_by_id(user.user_id, favorite_id(&id)?)
        .await?;

    Ok(ApiResponse(Removed { removed: true }))
}

pub(crate) async fn remove_by_title(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<TitleQuery>,
) -> ApiResult<Removed> {
    let title = query.required()?;

    state.favorites.remove_by_title(user.user_id, &title).await?;

    Ok(ApiResponse(Removed { removed: true }))
}

pub(crate) async fn status(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<TitleQuery>,
) -> ApiResult<FavoriteStatus> {
    let title = query.required()?;

    let favorite = state.favorites.find_by_title(user.user_id, &title).await?;

    Ok(ApiResponse(FavoriteStatus {
        is_favorite: favorite.is_some(),
        favorite_id: favorite.map(|f| f.id),
        title,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_bodies_are_validated() {
        let bytes = Bytes::from_static(b"{\"title\": \"Soup\"}");
        assert!(matches!(
            recipe_from_body(&bytes),
            Err(ApiError::InvalidInput(_))
        ));

        let bytes = Bytes::from_static(b"{not json");
        assert!(matches!(
            recipe_from_body(&bytes),
            Err(ApiError::InvalidJson(_))
        ));
    }

    #[test]
    fn stored_titles_match_title_queries() {
        let recipe =
            crate::recipes::testing::sample_recipe(" Soup ", crate::recipes::RecipeSource::Api);
        let bytes = Bytes::from(serde_json::to_vec(&recipe).unwrap());

        let stored = recipe_from_body(&bytes).unwrap().title;
        let queried = TitleQuery {
            title: Some(" Soup ".to_string()),
        }
        .required()
        .unwrap();

        assert_eq!(stored, "Soup");
        assert_eq!(stored, queried);
    }

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(
            favorite_id("not-a-uuid"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn title_query_requires_a_title() {
        assert!(TitleQuery { title: None }.required().is_err());
        assert!(TitleQuery {
            title: Some("  ".to_string())
        }
        .required()
        .is_err());
        assert_eq!(
            TitleQuery {
                title: Some(" Soup ".to_string())
            }
            .required()
            .unwrap(),
            "Soup"
        );
    }
}
