use serde::Serialize;

use super::{
    sources::{RecipeGenerator, RecipeSearcher},
    Recipe, RecipeSource,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct SourceCounts {
    pub ai: usize,
    pub api: usize,
}

impl SourceCounts {
    pub(crate) fn tally(recipes: &[Recipe]) -> Self {
        recipes
            .iter()
            .fold(Self::default(), |mut counts, recipe| {
                match recipe.source {
                    RecipeSource::Ai => counts.ai += 1,
                    RecipeSource::Api => counts.api += 1,
                }
                counts
            })
    }
}

#[derive(Debug)]
pub(crate) struct MergedRecipes {
    pub recipes: Vec<Recipe>,
    pub sources: SourceCounts,
}

/// Queries both sources concurrently and concatenates AI results followed by
/// external results. A failing source contributes nothing.
#[tracing::instrument(skip(generator, searcher))]
pub(crate) async fn merge_sources(
    generator: &dyn RecipeGenerator,
    searcher: &dyn RecipeSearcher,
    ingredients: &[String],
) -> MergedRecipes {
    let (generated, found) = tokio::join!(
        generator.generate_recipes(ingredients),
        searcher.search(ingredients)
    );

    let generated = generated.unwrap_or_else(|e| {
        if e.is_parse_error() {
            tracing::warn!(error = %e, "Generated recipes could not be decoded, continuing without them");
        } else {
            tracing::warn!(error = %e, "Recipe generation failed, continuing without it");
        }
        vec![]
    });

    let sources = SourceCounts {
        ai: generated.len(),
        api: found.len(),
    };
    let mut recipes = generated;
    recipes.extend(found);

    MergedRecipes { recipes, sources }
}
