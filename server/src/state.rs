use std::{str::FromStr, sync::Arc};

use color_eyre::eyre::Context;
use db::setup_db_pool;
use gemini::GeminiConfig;
use sqlx::PgPool;
use tracing::instrument;
use url::Url;

use crate::{
    favorites::{FavoritesStore, PgFavoritesStore},
    github::GithubConfig,
    http_server::cookies::CookieKey,
    login_sessions::{LoginSessions, PgLoginSessions},
    recipes::{
        cache::{CacheConfig, MemoryResultCache},
        generative::{GeminiRecipes, GenerativeConfig},
        search::RecipeSearch,
        sources::RecipeGenerator,
        spoonacular::{Spoonacular, SpoonacularConfig},
    },
};

/// Reads `name` from the environment, falling back to `default` when it is
/// unset or blank. A value that is set but does not parse is an error.
pub(crate) fn env_or<T>(name: &str, default: T) -> color_eyre::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid value for {name}: {raw}")),
        _ => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: Url,
}

impl AppConfig {
    #[instrument(name = "AppConfig::from_env")]
    pub fn from_env() -> color_eyre::Result<Self> {
        let base_url = std::env::var("APP_BASE_URL")
            .wrap_err("Missing APP_BASE_URL, needed for app launch")?;
        let base_url = Url::parse(&base_url).wrap_err("Invalid APP_BASE_URL not parsable")?;

        Ok(Self { base_url })
    }

    pub fn app_url(&self, path: &str) -> String {
        let mut url = self.base_url.clone();

        url.set_path(path);

        url.into()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub git_commit: &'static str,
    pub rustc_version: &'static str,
}

impl VersionInfo {
    pub fn from_build() -> Self {
        Self {
            git_commit: option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
            rustc_version: option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown"),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub app: AppConfig,
    pub github: GithubConfig,
    pub versions: VersionInfo,
    pub db: PgPool,
    pub cookie_key: CookieKey,
    pub recipes: RecipeSearch,
    pub generator: Arc<dyn RecipeGenerator>,
    pub favorites: Arc<dyn FavoritesStore>,
    pub sessions: Arc<dyn LoginSessions>,
}

impl AppState {
    #[instrument(name = "AppState::from_env", err)]
    pub async fn from_env() -> color_eyre::Result<Self> {
        let pool = setup_db_pool().await?;

        let generator: Arc<dyn RecipeGenerator> = Arc::new(GeminiRecipes::new(
            GeminiConfig::from_env(),
            GenerativeConfig::from_env()?,
        )?);
        let searcher = Arc::new(Spoonacular::new(
            SpoonacularConfig::from_env()?,
            generator.clone(),
        )?);
        let cache = Arc::new(MemoryResultCache::new(CacheConfig::from_env()?));

        Ok(Self {
            app: AppConfig::from_env()?,
            github: GithubConfig::from_env()?,
            versions: VersionInfo::from_build(),
            cookie_key: CookieKey::from_env_or_generate()?,
            recipes: RecipeSearch::new(generator.clone(), searcher, cache),
            generator,
            favorites: Arc::new(PgFavoritesStore::new(pool.clone())),
            sessions: Arc::new(PgLoginSessions::new(pool.clone())),
            db: pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_and_rejects_garbage() {
        std::env::remove_var("RECIPE_TEST_UNSET");
        assert_eq!(env_or("RECIPE_TEST_UNSET", 5usize).unwrap(), 5);

        std::env::set_var("RECIPE_TEST_COUNT", " 7 ");
        assert_eq!(env_or("RECIPE_TEST_COUNT", 5usize).unwrap(), 7);

        std::env::set_var("RECIPE_TEST_BAD", "seven");
        assert!(env_or("RECIPE_TEST_BAD", 5usize).is_err());
    }

    #[test]
    fn app_url_replaces_the_path() {
        let app = AppConfig {
            base_url: Url::parse("https://recipes.example/ignored").unwrap(),
        };

        assert_eq!(app.app_url("/auth/github"), "https://recipes.example/auth/github");
    }
}
