use std::{collections::HashMap, fmt, num::NonZeroUsize, time::Duration};

use async_trait::async_trait;
use color_eyre::eyre::eyre;
use lru::LruCache;
use tokio::{sync::Mutex, time::Instant};
use uuid::Uuid;

use super::Recipe;
use crate::state::env_or;

/// Identifies one browsing session's slice of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SessionToken(pub Uuid);

impl SessionToken {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The same ingredients in any order share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey(String);

impl CacheKey {
    pub(crate) fn from_ingredients(ingredients: &[String]) -> Self {
        let mut sorted = ingredients.to_vec();
        sorted.sort();

        Self(sorted.join(","))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub(crate) trait ResultCache: Send + Sync {
    async fn get(&self, session: SessionToken, ingredients: &[String]) -> Option<Vec<Recipe>>;

    async fn set(&self, session: SessionToken, ingredients: &[String], recipes: Vec<Recipe>);

    async fn invalidate(&self, session: SessionToken, ingredients: &[String]);

    /// Drops everything stored for `session`.
    async fn clear_session(&self, session: SessionToken);
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CacheConfig {
    pub max_sessions: NonZeroUsize,
    pub session_ttl: Duration,
}

impl CacheConfig {
    #[tracing::instrument(name = "CacheConfig::from_env")]
    pub(crate) fn from_env() -> color_eyre::Result<Self> {
        let max_sessions: usize = env_or("SEARCH_CACHE_MAX_SESSIONS", 1000)?;
        let max_sessions = NonZeroUsize::new(max_sessions)
            .ok_or_else(|| eyre!("SEARCH_CACHE_MAX_SESSIONS must be greater than zero"))?;

        Ok(Self {
            max_sessions,
            session_ttl: Duration::from_secs(env_or("SEARCH_CACHE_TTL_SECS", 86_400)?),
        })
    }
}

struct SessionBucket {
    entries: HashMap<CacheKey, Vec<Recipe>>,
    last_seen: Instant,
}

impl SessionBucket {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            last_seen: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() >= ttl
    }
}

/// Session-scoped search results held in process memory.
///
/// At most `max_sessions` sessions are kept; the least recently used one is
/// evicted first. A session idle for `session_ttl` is treated as ended.
pub(crate) struct MemoryResultCache {
    sessions: Mutex<LruCache<SessionToken, SessionBucket>>,
    ttl: Duration,
}

impl MemoryResultCache {
    pub(crate) fn new(config: CacheConfig) -> Self {
        Self {
            sessions: Mutex::new(LruCache::new(config.max_sessions)),
            ttl: config.session_ttl,
        }
    }
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn get(&self, session: SessionToken, ingredients: &[String]) -> Option<Vec<Recipe>> {
        let key = CacheKey::from_ingredients(ingredients);
        let mut sessions = self.sessions.lock().await;

        if sessions.peek(&session)?.is_expired(self.ttl) {
            sessions.pop(&session);
            tracing::debug!(%session, "Search session expired");
            return None;
        }

        let bucket = sessions.get_mut(&session)?;
        bucket.last_seen = Instant::now();
        let hit = bucket.entries.get(&key).cloned();
        tracing::debug!(%session, key = key.as_str(), hit = hit.is_some(), "Search cache lookup");

        hit
    }

    async fn set(&self, session: SessionToken, ingredients: &[String], recipes: Vec<Recipe>) {
        let key = CacheKey::from_ingredients(ingredients);
        let mut sessions = self.sessions.lock().await;

        let live = sessions
            .peek(&session)
            .is_some_and(|bucket| !bucket.is_expired(self.ttl));
        if !live {
            sessions.put(session, SessionBucket::new());
        }

        if let Some(bucket) = sessions.get_mut(&session) {
            bucket.last_seen = Instant::now();
            bucket.entries.insert(key, recipes);
        }
    }

    async fn invalidate(&self, session: SessionToken, ingredients: &[String]) {
        let key = CacheKey::from_ingredients(ingredients);

        if let Some(bucket) = self.sessions.lock().await.get_mut(&session) {
            bucket.entries.remove(&key);
        }
    }

    async fn clear_session(&self, session: SessionToken) {
        self.sessions.lock().await.pop(&session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::{testing::sample_recipe, RecipeSource};

    fn cache(max_sessions: usize, ttl: Duration) -> MemoryResultCache {
        MemoryResultCache::new(CacheConfig {
            max_sessions: NonZeroUsize::new(max_sessions).unwrap(),
            session_ttl: ttl,
        })
    }

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn recipes(title: &str) -> Vec<Recipe> {
        vec![sample_recipe(title, RecipeSource::Ai)]
    }

    #[test]
    fn key_ignores_order() {
        assert_eq!(
            CacheKey::from_ingredients(&list(&["potato", "carrot", "onion"])),
            CacheKey::from_ingredients(&list(&["onion", "potato", "carrot"]))
        );
        assert_eq!(
            CacheKey::from_ingredients(&list(&["b", "a"])).as_str(),
            "a,b"
        );
    }

    #[tokio::test]
    async fn lookups_ignore_ingredient_order() {
        let cache = cache(10, Duration::from_secs(60));
        let session = SessionToken::generate();

        cache
            .set(session, &list(&["onion", "carrot"]), recipes("Stew"))
            .await;

        let hit = cache.get(session, &list(&["carrot", "onion"])).await;
        assert_eq!(hit, Some(recipes("Stew")));
    }

    #[tokio::test]
    async fn invalidate_then_set_stores_fresh_results() {
        let cache = cache(10, Duration::from_secs(60));
        let session = SessionToken::generate();
        let key = list(&["onion"]);

        cache.set(session, &key, recipes("Old")).await;
        cache.invalidate(session, &key).await;
        assert_eq!(cache.get(session, &key).await, None);

        cache.set(session, &key, recipes("New")).await;
        assert_eq!(cache.get(session, &key).await, Some(recipes("New")));
    }

    #[tokio::test]
    async fn sessions_do_not_share_results() {
        let cache = cache(10, Duration::from_secs(60));
        let key = list(&["onion"]);
        let mine = SessionToken::generate();
        let theirs = SessionToken::generate();

        cache.set(mine, &key, recipes("Mine")).await;

        assert_eq!(cache.get(theirs, &key).await, None);

        cache.clear_session(mine).await;
        assert_eq!(cache.get(mine, &key).await, None);
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let cache = cache(10, Duration::ZERO);
        let session = SessionToken::generate();
        let key = list(&["onion"]);

        cache.set(session, &key, recipes("Stew")).await;

        assert_eq!(cache.get(session, &key).await, None);
    }

    #[tokio::test]
    async fn least_recently_used_session_is_evicted() {
        let cache = cache(2, Duration::from_secs(60));
        let key = list(&["onion"]);
        let first = SessionToken::generate();
        let second = SessionToken::generate();
        let third = SessionToken::generate();

        cache.set(first, &key, recipes("First")).await;
        cache.set(second, &key, recipes("Second")).await;
        assert!(cache.get(first, &key).await.is_some());
        cache.set(third, &key, recipes("Third")).await;

        assert!(cache.get(first, &key).await.is_some());
        assert_eq!(cache.get(second, &key).await, None);
        assert!(cache.get(third, &key).await.is_some());
    }
}
