use axum::{body::Bytes, extract::State};
use serde::Serialize;
use serde_json::Value;

use crate::{
    http_server::{
        api::parse_json,
        errors::{ApiError, ApiResult, ApiResponse},
        session::SearchSession,
    },
    recipes::search::SearchOutcome,
    AppState,
};

pub(crate) const MAX_INGREDIENTS: usize = 20;

#[derive(Debug, PartialEq)]
struct SearchRequest {
    ingredients: Vec<String>,
    force_refresh: bool,
}

fn search_request(body: &Value) -> Result<SearchRequest, ApiError> {
    let invalid = |msg: &str| ApiError::InvalidInput(msg.to_string());

    let ingredients = body
        .get("ingredients")
        .ok_or_else(|| invalid("ingredients is required"))?
        .as_array()
        .ok_or_else(|| invalid("ingredients must be an array of strings"))?;

    if ingredients.is_empty() {
        return Err(invalid("Provide at least one ingredient"));
    }
    if ingredients.len() > MAX_INGREDIENTS {
        return Err(ApiError::InvalidInput(format!(
            "Provide at most {MAX_INGREDIENTS} ingredients"
        )));
    }

    let ingredients = ingredients
        .iter()
        .map(|item| match item.as_str().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            Some(_) => Err(invalid("Ingredients must not be blank")),
            None => Err(invalid("ingredients must be an array of strings")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let force_refresh = match body.get("forceRefresh") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => return Err(invalid("forceRefresh must be a boolean")),
    };

    Ok(SearchRequest {
        ingredients,
        force_refresh,
    })
}

#[tracing::instrument(skip_all, fields(session = %session.0))]
pub(crate) async fn search(
    State(state): State<AppState>,
    SearchSession(session): SearchSession,
    body: Bytes,
) -> ApiResult<SearchOutcome> {
    let request = search_request(&parse_json(&body)?)?;

    let recipes = state.recipes.clone();
    let outcome = tokio::spawn(async move {
        recipes
            .search(session, &request.ingredients, request.force_refresh)
            .await
    })
    .await
    .map_err(|e| ApiError::Search(e.to_string()))?;

    tracing::info!(
        total = outcome.total,
        ai = outcome.sources.ai,
        api = outcome.sources.api,
        from_cache = outcome.from_cache,
        "Search complete"
    );

    Ok(ApiResponse(outcome))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Alternatives {
    ingredient: String,
    alternatives: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recipe_context: Option<String>,
}

fn alternatives_request(body: &Value) -> Result<(String, Option<String>), ApiError> {
    let ingredient = match body.get("ingredient").and_then(Value::as_str).map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Err(ApiError::InvalidInput(
                "ingredient must be a non-empty string".to_string(),
            ))
        }
    };

    let recipe_context = match body.get("recipeContext") {
        None | Some(Value::Null) => None,
        Some(Value::String(context)) => Some(context.trim().to_string()).filter(|c| !c.is_empty()),
        Some(_) => {
            return Err(ApiError::InvalidInput(
                "recipeContext must be a string".to_string(),
            ))
        }
    };

    Ok((ingredient, recipe_context))
}

#[tracing::instrument(skip_all)]
pub(crate) async fn alternatives(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Alternatives> {
    let (ingredient, recipe_context) = alternatives_request(&parse_json(&body)?)?;

    let alternatives = state
        .generator
        .suggest_alternatives(&ingredient, recipe_context.as_deref())
        .await
        .map_err(ApiError::Alternatives)?;

    Ok(ApiResponse(Alternatives {
        ingredient,
        alternatives,
        recipe_context,
    }))
}
