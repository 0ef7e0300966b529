use std::time::Duration;

use async_trait::async_trait;
use gemini::GeminiConfig;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{
    number_instructions,
    sources::{GenerationError, RecipeGenerator},
    Difficulty, Ingredient, Pantry, Recipe, RecipeSource,
};
use crate::state::env_or;

const ALTERNATIVE_COUNT: usize = 3;

#[derive(Debug, Clone)]
pub(crate) struct GenerativeConfig {
    pub recipe_count: usize,
    pub display_language: String,
    pub request_timeout: Duration,
}

impl GenerativeConfig {
    #[instrument(name = "GenerativeConfig::from_env")]
    pub(crate) fn from_env() -> color_eyre::Result<Self> {
        Ok(Self {
            recipe_count: env_or("AI_RECIPE_COUNT", 3)?,
            display_language: env_or("RECIPE_DISPLAY_LANGUAGE", "Japanese".to_string())?,
            request_timeout: Duration::from_secs(env_or("UPSTREAM_TIMEOUT_SECS", 60)?),
        })
    }
}

/// Recipe generation, alternative suggestions and translation backed by
/// Gemini.
#[derive(Debug, Clone)]
pub(crate) struct GeminiRecipes {
    gemini: GeminiConfig,
    client: reqwest::Client,
    config: GenerativeConfig,
}

impl GeminiRecipes {
    pub(crate) fn new(gemini: GeminiConfig, config: GenerativeConfig) -> color_eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            gemini,
            client,
            config,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let text = gemini::generate_content(&self.gemini, &self.client, prompt).await?;

        Ok(text)
    }
}

#[async_trait]
impl RecipeGenerator for GeminiRecipes {
    #[instrument(skip(self), err)]
    async fn generate_recipes(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<Recipe>, GenerationError> {
        let prompt = recipe_prompt(
            ingredients,
            self.config.recipe_count,
            &self.config.display_language,
        );
        let text = self.complete(&prompt).await?;

        let recipes = decode_recipes(&text, ingredients, self.config.recipe_count)?;
        tracing::info!(count = recipes.len(), "Generated recipes");

        Ok(recipes)
    }

    #[instrument(skip(self), err)]
    async fn suggest_alternatives(
        &self,
        ingredient: &str,
        recipe_context: Option<&str>,
    ) -> Result<Vec<String>, GenerationError> {
        let prompt = alternatives_prompt(ingredient, recipe_context, &self.config.display_language);
        let text = self.complete(&prompt).await?;

        let mut alternatives = decode_names(&text)?;
        if alternatives.len() < ALTERNATIVE_COUNT {
            return Err(GenerationError::WrongCount {
                expected: ALTERNATIVE_COUNT,
                actual: alternatives.len(),
            });
        }
        alternatives.truncate(ALTERNATIVE_COUNT);

        Ok(alternatives)
    }

    #[instrument(skip(self), err)]
    async fn translate_ingredients(
        &self,
        ingredients: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, GenerationError> {
        let prompt = translate_ingredients_prompt(ingredients, target_language);
        let text = self.complete(&prompt).await?;

        let translated = decode_names(&text)?;
        if translated.len() != ingredients.len() {
            return Err(GenerationError::WrongCount {
                expected: ingredients.len(),
                actual: translated.len(),
            });
        }

        Ok(translated)
    }

    #[instrument(skip(self, recipe), fields(recipe.id = %recipe.id), err)]
    async fn translate_recipe(
        &self,
        recipe: &Recipe,
        target_language: &str,
    ) -> Result<Recipe, GenerationError> {
        let prompt = translate_recipe_prompt(recipe, target_language)?;
        let text = self.complete(&prompt).await?;

        apply_translation(recipe, &text)
    }
}

fn recipe_prompt(ingredients: &[String], count: usize, language: &str) -> String {
    let ingredient_list = ingredients.join(", ");

    format!(
        r#"You are a professional cook. Suggest {count} recipes that use the following ingredients.

Ingredients: {ingredient_list}

Follow these rules:
1. Suggest exactly {count} recipes.
2. Write every human-readable field in {language}.
3. Each recipe has: title, description (one or two sentences), servings, cookTime (minutes),
   difficulty ("easy", "medium" or "hard"), ingredients (name, amount, isAvailable),
   instructions (step, description) and tags (cuisine or keywords such as "quick").
4. Output a JSON array in exactly this shape:

[
  {{
    "id": "ai-recipe-1",
    "title": "Recipe title",
    "description": "Short description",
    "servings": 2,
    "cookTime": 30,
    "difficulty": "easy",
    "ingredients": [{{ "name": "Ingredient", "amount": "Amount", "isAvailable": true }}],
    "instructions": [{{ "step": 1, "description": "What to do" }}],
    "tags": ["tag"],
    "source": "ai"
  }}
]

5. Ingredients the user has ({ingredient_list}) must have "isAvailable": true.
6. Any additional ingredient must have "isAvailable": false.
7. Every id must start with "ai-" and be unique.
8. Output JSON only, with no other text."#
    )
}

fn alternatives_prompt(ingredient: &str, recipe_context: Option<&str>, language: &str) -> String {
    let context = recipe_context
        .map(|dish| format!("Dish: {dish}\n"))
        .unwrap_or_default();

    format!(
        r#"You are a professional cook. Suggest {ALTERNATIVE_COUNT} substitutes for the following ingredient.

Ingredient: {ingredient}
{context}
Follow these rules:
1. Suggest exactly {ALTERNATIVE_COUNT} substitutes, written in {language}.
2. Prefer substitutes with a similar taste and texture.
3. Prefer substitutes that are easy to buy.
4. Output a JSON array of strings: ["substitute 1", "substitute 2", "substitute 3"]
5. Output JSON only, with no other text."#
    )
}

fn translate_ingredients_prompt(ingredients: &[String], language: &str) -> String {
    let names = serde_json::Value::from(ingredients.to_vec());

    format!(
        r#"Translate the following ingredient names into {language}.

Ingredients: {names}

Follow these rules:
1. Use the common culinary name for each ingredient.
2. Keep the original order and the same number of items.
3. Output a JSON array of strings: ["ingredient1", "ingredient2", ...]
4. Output JSON only, with no other text."#
    )
}

#[derive(Serialize)]
struct TranslatableRecipe<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    ingredients: Vec<TranslatableIngredient<'a>>,
    instructions: Vec<TranslatableInstruction<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
}

#[derive(Serialize)]
struct TranslatableIngredient<'a> {
    name: &'a str,
    amount: &'a str,
}

#[derive(Serialize)]
struct TranslatableInstruction<'a> {
    step: u32,
    description: &'a str,
}

fn translate_recipe_prompt(recipe: &Recipe, language: &str) -> Result<String, GenerationError> {
    let translatable = TranslatableRecipe {
        title: &recipe.title,
        description: recipe.description.as_deref(),
        ingredients: recipe
            .ingredients
            .iter()
            .map(|i| TranslatableIngredient {
                name: &i.name,
                amount: &i.amount,
            })
            .collect(),
        instructions: recipe
            .instructions
            .iter()
            .map(|i| TranslatableInstruction {
                step: i.step,
                description: &i.description,
            })
            .collect(),
        tags: recipe.tags.as_deref(),
    };
    let json = serde_json::to_string_pretty(&translatable)?;

    Ok(format!(
        r#"Translate the following recipe into {language}.

Recipe JSON:
{json}

Follow these rules:
1. Translate title, description, ingredients[].name, ingredients[].amount,
   instructions[].description and tags.
2. Keep the same number of ingredients and instructions, in the same order.
3. Use common names for ingredients and local units for amounts (for example "1 cup").
4. Output a single JSON object with the same fields.
5. Output JSON only, with no other text."#
    ))
}

/// Removes a surrounding markdown code fence (```` ```json ```` or bare
/// ```` ``` ````) if the model added one.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);

    rest.trim()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedRecipe {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    servings: Option<u32>,
    cook_time: Option<u32>,
    difficulty: Option<String>,
    ingredients: Option<Vec<GeneratedIngredient>>,
    instructions: Option<Vec<GeneratedInstruction>>,
    image_url: Option<String>,
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedIngredient {
    name: Option<String>,
    amount: Option<serde_json::Value>,
    is_available: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct GeneratedInstruction {
    description: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Models write amounts as either `"2 cups"` or `2`.
fn amount_text(amount: Option<serde_json::Value>) -> String {
    match amount {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_difficulty(difficulty: Option<&str>, cook_time: u32) -> Difficulty {
    match difficulty.map(|d| d.trim().to_lowercase()).as_deref() {
        Some("easy") => Difficulty::Easy,
        Some("medium") => Difficulty::Medium,
        Some("hard") => Difficulty::Hard,
        _ => Difficulty::from_cook_time(cook_time),
    }
}

/// Decodes the model's recipe array into exactly `expected` recipes.
///
/// Extra recipes are dropped; too few is an error. Ids that do not carry the
/// `ai-` prefix are replaced so they can never collide with external ids.
pub(crate) fn decode_recipes(
    text: &str,
    user_ingredients: &[String],
    expected: usize,
) -> Result<Vec<Recipe>, GenerationError> {
    let generated: Vec<GeneratedRecipe> = serde_json::from_str(strip_code_fences(text))?;

    if generated.len() < expected {
        return Err(GenerationError::WrongCount {
            expected,
            actual: generated.len(),
        });
    }

    let pantry = Pantry::new(user_ingredients);
    let stamp = chrono::Utc::now().timestamp_millis();

    generated
        .into_iter()
        .take(expected)
        .enumerate()
        .map(|(i, raw)| {
            let index = i + 1;

            let title = non_blank(raw.title).ok_or(GenerationError::MissingField {
                index,
                field: "title",
            })?;
            let id = raw
                .id
                .map(|id| id.trim().to_string())
                .filter(|id| id.starts_with("ai-"))
                .unwrap_or_else(|| format!("ai-{stamp}-{index}"));
            let cook_time = raw.cook_time.unwrap_or(30);

            let ingredients: Vec<Ingredient> = raw
                .ingredients
                .unwrap_or_default()
                .into_iter()
                .filter_map(|ingredient| {
                    let name = non_blank(ingredient.name)?;
                    let is_available = ingredient
                        .is_available
                        .unwrap_or_else(|| pantry.has(&name));

                    Some(Ingredient {
                        amount: amount_text(ingredient.amount),
                        is_available,
                        name,
                    })
                })
                .collect();
            if ingredients.is_empty() {
                return Err(GenerationError::MissingField {
                    index,
                    field: "ingredients",
                });
            }

            let instructions = number_instructions(
                raw.instructions
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|step| non_blank(step.description)),
            );
            if instructions.is_empty() {
                return Err(GenerationError::MissingField {
                    index,
                    field: "instructions",
                });
            }

            Ok(Recipe {
                id,
                title,
                description: non_blank(raw.description),
                servings: raw.servings.filter(|s| *s > 0).unwrap_or(2),
                cook_time,
                difficulty: parse_difficulty(raw.difficulty.as_deref(), cook_time),
                ingredients,
                instructions,
                image_url: non_blank(raw.image_url),
                tags: raw.tags,
                source: RecipeSource::Ai,
            })
        })
        .collect()
}

/// Decodes a JSON array of strings, dropping blank entries.
pub(crate) fn decode_names(text: &str) -> Result<Vec<String>, GenerationError> {
    let names: Vec<String> = serde_json::from_str(strip_code_fences(text))?;

    Ok(names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect())
}

#[derive(Debug, Deserialize)]
struct TranslatedRecipe {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    ingredients: Vec<TranslatedIngredient>,
    #[serde(default)]
    instructions: Vec<GeneratedInstruction>,
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TranslatedIngredient {
    name: Option<String>,
    amount: Option<serde_json::Value>,
}

/// Builds the translated copy of `original` from the model's answer.
///
/// Only human-readable text is taken from the model. Ids, numbers,
/// availability and the source tag always come from `original`.
pub(crate) fn apply_translation(original: &Recipe, text: &str) -> Result<Recipe, GenerationError> {
    let translated: TranslatedRecipe = serde_json::from_str(strip_code_fences(text))?;

    let title = non_blank(translated.title).ok_or(GenerationError::MissingField {
        index: 1,
        field: "title",
    })?;

    if translated.ingredients.len() != original.ingredients.len() {
        return Err(GenerationError::WrongCount {
            expected: original.ingredients.len(),
            actual: translated.ingredients.len(),
        });
    }
    if translated.instructions.len() != original.instructions.len() {
        return Err(GenerationError::WrongCount {
            expected: original.instructions.len(),
            actual: translated.instructions.len(),
        });
    }

    let ingredients = original
        .ingredients
        .iter()
        .zip(translated.ingredients)
        .map(|(before, after)| Ingredient {
            name: non_blank(after.name).unwrap_or_else(|| before.name.clone()),
            amount: after
                .amount
                .map_or_else(|| before.amount.clone(), |a| amount_text(Some(a))),
            is_available: before.is_available,
        })
        .collect();

    let instructions = number_instructions(
        original
            .instructions
            .iter()
            .zip(translated.instructions)
            .map(|(before, after)| {
                non_blank(after.description).unwrap_or_else(|| before.description.clone())
            }),
    );

    Ok(Recipe {
        title,
        description: non_blank(translated.description).or_else(|| original.description.clone()),
        ingredients,
        instructions,
        tags: translated.tags.or_else(|| original.tags.clone()),
        ..original.clone()
    })
}
