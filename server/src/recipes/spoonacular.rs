use std::{
    sync::{Arc, LazyLock},
    time::Duration,
};

use async_trait::async_trait;
use color_eyre::eyre::Context as _;
use futures::future::join_all;
use regex::Regex;
use serde::Deserialize;
use tracing::instrument;

use super::{
    number_instructions,
    sources::{RecipeGenerator, RecipeSearcher},
    Difficulty, Ingredient, Pantry, Recipe, RecipeSource,
};
use crate::state::env_or;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";

#[derive(Debug, Clone)]
pub(crate) struct SpoonacularConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_results: usize,
    /// Language the upstream catalogue is searched in.
    pub search_language: String,
    /// Language recipes are shown to users in.
    pub display_language: String,
    pub request_timeout: Duration,
}

impl SpoonacularConfig {
    #[instrument(name = "SpoonacularConfig::from_env")]
    pub(crate) fn from_env() -> color_eyre::Result<Self> {
        let api_key = std::env::var("SPOONACULAR_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("SPOONACULAR_API_KEY is not set, external recipe search is disabled");
        }

        Ok(Self {
            api_key,
            base_url: env_or("SPOONACULAR_BASE_URL", DEFAULT_BASE_URL.to_string())?,
            max_results: env_or("SPOONACULAR_MAX_RESULTS", 5)?,
            search_language: env_or("RECIPE_SEARCH_LANGUAGE", "English".to_string())?,
            display_language: env_or("RECIPE_DISPLAY_LANGUAGE", "Japanese".to_string())?,
            request_timeout: Duration::from_secs(env_or("UPSTREAM_TIMEOUT_SECS", 60)?),
        })
    }

    fn needs_translation(&self) -> bool {
        !self
            .search_language
            .eq_ignore_ascii_case(&self.display_language)
    }
}

/// Recipe search against the Spoonacular catalogue.
///
/// Ingredients are translated into the search language before the lookup and
/// results are translated back into the display language. A recipe that
/// cannot be translated is dropped.
#[derive(Clone)]
pub(crate) struct Spoonacular {
    config: SpoonacularConfig,
    client: reqwest::Client,
    translator: Arc<dyn RecipeGenerator>,
}

impl Spoonacular {
    pub(crate) fn new(
        config: SpoonacularConfig,
        translator: Arc<dyn RecipeGenerator>,
    ) -> color_eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            config,
            client,
            translator,
        })
    }

    async fn search_terms(&self, ingredients: &[String]) -> Vec<String> {
        if !self.config.needs_translation() {
            return ingredients.to_vec();
        }

        match self
            .translator
            .translate_ingredients(ingredients, &self.config.search_language)
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(error = %e, "Could not translate ingredients, searching with the originals");
                ingredients.to_vec()
            }
        }
    }

    async fn find_by_ingredients(
        &self,
        api_key: &str,
        terms: &[String],
    ) -> color_eyre::Result<Vec<FoundRecipe>> {
        let ingredients = terms.join(",");
        let number = self.config.max_results.to_string();

        let found = self
            .client
            .get(format!(
                "{}/recipes/findByIngredients",
                self.config.base_url
            ))
            .query(&[
                ("apiKey", api_key),
                ("ingredients", ingredients.as_str()),
                ("number", number.as_str()),
                ("ranking", "2"),
                ("ignorePantry", "false"),
            ])
            .send()
            .await
            .wrap_err("Failed to reach Spoonacular")?
            .error_for_status()
            .wrap_err("Spoonacular search failed")?
            .json()
            .await
            .wrap_err("Spoonacular search returned an unexpected body")?;

        Ok(found)
    }

    #[instrument(skip(self, api_key), err)]
    async fn information(&self, api_key: &str, id: u64) -> color_eyre::Result<RecipeInformation> {
        let info = self
            .client
            .get(format!(
                "{}/recipes/{id}/information",
                self.config.base_url
            ))
            .query(&[("apiKey", api_key)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(info)
    }

    async fn localize(&self, recipe: Recipe) -> Option<Recipe> {
        if !self.config.needs_translation() {
            return Some(recipe);
        }

        match self
            .translator
            .translate_recipe(&recipe, &self.config.display_language)
            .await
        {
            Ok(translated) => Some(translated),
            Err(e) => {
                tracing::warn!(recipe.id = %recipe.id, error = %e, "Could not translate recipe, dropping it");
                None
            }
        }
    }

    async fn try_search(&self, ingredients: &[String]) -> color_eyre::Result<Vec<Recipe>> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Ok(vec![]);
        };

        let terms = self.search_terms(ingredients).await;
        let mut found = self.find_by_ingredients(api_key, &terms).await?;
        tracing::debug!(count = found.len(), "Spoonacular candidates");
        found.truncate(self.config.max_results);

        let details = join_all(found.iter().map(|f| self.information(api_key, f.id))).await;

        let pantry = Pantry::new(ingredients);
        let recipes = details
            .into_iter()
            .filter_map(Result::ok)
            .map(|info| transform(info, &pantry));

        let localized = join_all(recipes.map(|r| self.localize(r))).await;

        Ok(localized.into_iter().flatten().collect())
    }
}

#[async_trait]
impl RecipeSearcher for Spoonacular {
    #[instrument(skip(self))]
    async fn search(&self, ingredients: &[String]) -> Vec<Recipe> {
        match self.try_search(ingredients).await {
            Ok(recipes) => recipes,
            Err(e) => {
                tracing::warn!(error = ?e, "Spoonacular search failed");
                vec![]
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct FoundRecipe {
    id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeInformation {
    id: u64,
    title: Option<String>,
    summary: Option<String>,
    servings: Option<u32>,
    ready_in_minutes: Option<u32>,
    image: Option<String>,
    extended_ingredients: Option<Vec<ExtendedIngredient>>,
    analyzed_instructions: Option<Vec<AnalyzedInstruction>>,
    dish_types: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ExtendedIngredient {
    name: Option<String>,
    original: Option<String>,
    amount: Option<f64>,
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnalyzedInstruction {
    steps: Option<Vec<AnalyzedStep>>,
}

#[derive(Debug, Deserialize)]
struct AnalyzedStep {
    step: String,
}

fn transform(info: RecipeInformation, pantry: &Pantry) -> Recipe {
    let cook_time = info.ready_in_minutes.filter(|m| *m > 0).unwrap_or(30);

    let ingredients = info
        .extended_ingredients
        .unwrap_or_default()
        .into_iter()
        .filter_map(|ingredient| {
            let name = ingredient
                .name
                .filter(|n| !n.trim().is_empty())
                .or(ingredient.original)?;

            Some(Ingredient {
                amount: format_amount(ingredient.amount, ingredient.unit.as_deref()),
                is_available: pantry.has(&name),
                name,
            })
        })
        .collect();

    let steps = info
        .analyzed_instructions
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|block| block.steps)
        .unwrap_or_default();

    Recipe {
        id: format!("api-spoonacular-{}", info.id),
        title: info
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Untitled Recipe".to_string()),
        description: info
            .summary
            .map(|s| strip_html(&s))
            .filter(|s| !s.is_empty()),
        servings: info.servings.filter(|s| *s > 0).unwrap_or(2),
        cook_time,
        difficulty: Difficulty::from_cook_time(cook_time),
        ingredients,
        instructions: number_instructions(
            steps
                .into_iter()
                .map(|s| s.step.trim().to_string())
                .filter(|s| !s.is_empty()),
        ),
        image_url: info.image.filter(|i| !i.is_empty()),
        tags: info.dish_types.filter(|t| !t.is_empty()),
        source: RecipeSource::Api,
    }
}

/// Renders an amount and unit as display text, e.g. `1.5 cups`.
fn format_amount(amount: Option<f64>, unit: Option<&str>) -> String {
    let amount = amount.filter(|a| a.abs() > f64::EPSILON);
    let unit = unit.map(str::trim).filter(|u| !u.is_empty());

    match (amount, unit) {
        (Some(amount), Some(unit)) => {
            let amount = if amount.fract().abs() < f64::EPSILON {
                amount.to_string()
            } else {
                format!("{amount:.2}")
                    .trim_end_matches('0')
                    .trim_end_matches('.')
                    .to_string()
            };
            format!("{amount} {unit}")
        }
        (Some(amount), None) => amount.to_string(),
        (None, Some(unit)) => unit.to_string(),
        (None, None) => String::new(),
    }
}

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

fn strip_html(html: &str) -> String {
    HTML_TAG
        .replace_all(html, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
