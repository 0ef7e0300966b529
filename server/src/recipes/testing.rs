use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use gemini::GeminiError;

use super::{
    number_instructions,
    sources::{GenerationError, RecipeGenerator, RecipeSearcher},
    Difficulty, Ingredient, Recipe, RecipeSource,
};

pub(crate) fn sample_recipe(title: &str, source: RecipeSource) -> Recipe {
    let slug = title.to_lowercase().replace(' ', "-");
    let id = match source {
        RecipeSource::Ai => format!("ai-test-{slug}"),
        RecipeSource::Api => format!("api-spoonacular-test-{slug}"),
    };

    Recipe {
        id,
        title: title.to_string(),
        description: Some("A test recipe".to_string()),
        servings: 2,
        cook_time: 15,
        difficulty: Difficulty::Easy,
        ingredients: vec![Ingredient {
            name: "onion".to_string(),
            amount: "1".to_string(),
            is_available: true,
        }],
        instructions: number_instructions(["Simmer".to_string()]),
        image_url: None,
        tags: None,
        source,
    }
}

fn unavailable() -> GenerationError {
    GenerationError::Upstream(GeminiError::MissingApiKey)
}

/// A scripted language model. `None` recipes means every call fails.
pub(crate) struct FakeGenerator {
    recipes: Option<Vec<Recipe>>,
    pub generate_calls: AtomicUsize,
    pub translate_calls: AtomicUsize,
}

impl FakeGenerator {
    pub(crate) fn with_titles(titles: &[&str]) -> Self {
        Self {
            recipes: Some(
                titles
                    .iter()
                    .map(|t| sample_recipe(t, RecipeSource::Ai))
                    .collect(),
            ),
            generate_calls: AtomicUsize::new(0),
            translate_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            recipes: None,
            generate_calls: AtomicUsize::new(0),
            translate_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn generate_count(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipeGenerator for FakeGenerator {
    async fn generate_recipes(
        &self,
        _ingredients: &[String],
    ) -> Result<Vec<Recipe>, GenerationError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);

        self.recipes.clone().ok_or_else(unavailable)
    }

    async fn suggest_alternatives(
        &self,
        ingredient: &str,
        _recipe_context: Option<&str>,
    ) -> Result<Vec<String>, GenerationError> {
        if self.recipes.is_none() {
            return Err(unavailable());
        }

        Ok(["leek", "shallot", "chive"]
            .iter()
            .map(|alt| format!("{alt} (for {ingredient})"))
            .collect())
    }

    async fn translate_ingredients(
        &self,
        ingredients: &[String],
        _target_language: &str,
    ) -> Result<Vec<String>, GenerationError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        if self.recipes.is_none() {
            return Err(unavailable());
        }

        Ok(ingredients.to_vec())
    }

    async fn translate_recipe(
        &self,
        recipe: &Recipe,
        target_language: &str,
    ) -> Result<Recipe, GenerationError> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        if self.recipes.is_none() {
            return Err(unavailable());
        }

        Ok(Recipe {
            title: format!("[{target_language}] {}", recipe.title),
            ..recipe.clone()
        })
    }
}

pub(crate) struct FakeSearcher {
    recipes: Vec<Recipe>,
    pub calls: AtomicUsize,
}

impl FakeSearcher {
    pub(crate) fn with_titles(titles: &[&str]) -> Self {
        Self {
            recipes: titles
                .iter()
                .map(|t| sample_recipe(t, RecipeSource::Api))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::with_titles(&[])
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipeSearcher for FakeSearcher {
    async fn search(&self, _ingredients: &[String]) -> Vec<Recipe> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        self.recipes.clone()
    }
}
