use async_trait::async_trait;
use gemini::GeminiError;

use super::Recipe;

#[derive(Debug, thiserror::Error)]
pub(crate) enum GenerationError {
    #[error("The language model call failed")]
    Upstream(#[from] GeminiError),
    #[error("The language model returned malformed JSON")]
    Parse(#[from] serde_json::Error),
    #[error("Item {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("Expected {expected} items from the language model but got {actual}")]
    WrongCount { expected: usize, actual: usize },
}

impl GenerationError {
    /// Whether the model answered but the answer could not be used, as
    /// opposed to the call itself failing.
    pub(crate) fn is_parse_error(&self) -> bool {
        !matches!(self, Self::Upstream(_))
    }
}

/// Everything the service asks of the language model.
#[async_trait]
pub(crate) trait RecipeGenerator: Send + Sync {
    /// Generates recipes that use the given ingredients.
    async fn generate_recipes(&self, ingredients: &[String])
        -> Result<Vec<Recipe>, GenerationError>;

    /// Suggests exactly three replacements for `ingredient`.
    async fn suggest_alternatives(
        &self,
        ingredient: &str,
        recipe_context: Option<&str>,
    ) -> Result<Vec<String>, GenerationError>;

    /// Translates ingredient names, preserving order and count.
    async fn translate_ingredients(
        &self,
        ingredients: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, GenerationError>;

    /// Produces a translated copy of `recipe`.
    async fn translate_recipe(
        &self,
        recipe: &Recipe,
        target_language: &str,
    ) -> Result<Recipe, GenerationError>;
}

/// A best-effort recipe source. Failures are logged by the implementation and
/// surface as an empty list.
#[async_trait]
pub(crate) trait RecipeSearcher: Send + Sync {
    async fn search(&self, ingredients: &[String]) -> Vec<Recipe>;
}
