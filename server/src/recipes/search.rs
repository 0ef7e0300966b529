use std::sync::Arc;

use serde::Serialize;

use super::{
    cache::{ResultCache, SessionToken},
    merge::{merge_sources, SourceCounts},
    sources::{RecipeGenerator, RecipeSearcher},
    Recipe,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchOutcome {
    pub recipes: Vec<Recipe>,
    pub total: usize,
    pub sources: SourceCounts,
    pub from_cache: bool,
}

impl SearchOutcome {
    fn new(recipes: Vec<Recipe>, sources: SourceCounts, from_cache: bool) -> Self {
        Self {
            total: recipes.len(),
            recipes,
            sources,
            from_cache,
        }
    }
}

/// Cache-aware search over both recipe sources.
#[derive(Clone)]
pub(crate) struct RecipeSearch {
    generator: Arc<dyn RecipeGenerator>,
    searcher: Arc<dyn RecipeSearcher>,
    cache: Arc<dyn ResultCache>,
}

impl RecipeSearch {
    pub(crate) fn new(
        generator: Arc<dyn RecipeGenerator>,
        searcher: Arc<dyn RecipeSearcher>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        Self {
            generator,
            searcher,
            cache,
        }
    }

    #[tracing::instrument(skip(self), fields(%session))]
    pub(crate) async fn search(
        &self,
        session: SessionToken,
        ingredients: &[String],
        force_refresh: bool,
    ) -> SearchOutcome {
        if force_refresh {
            self.cache.invalidate(session, ingredients).await;
        } else if let Some(recipes) = self.cache.get(session, ingredients).await {
            let sources = SourceCounts::tally(&recipes);
            return SearchOutcome::new(recipes, sources, true);
        }

        let merged = merge_sources(&*self.generator, &*self.searcher, ingredients).await;

        self.cache
            .set(session, ingredients, merged.recipes.clone())
            .await;

        SearchOutcome::new(merged.recipes, merged.sources, false)
    }

    pub(crate) async fn forget_session(&self, session: SessionToken) {
        self.cache.clear_session(session).await;
    }
}
