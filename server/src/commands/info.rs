use color_eyre::Result;

use crate::{
    recipes::{cache::CacheConfig, generative::GenerativeConfig, spoonacular::SpoonacularConfig},
    state::VersionInfo,
};

pub(crate) fn print_info() -> Result<()> {
    let versions = VersionInfo::from_build();
    let gemini = gemini::GeminiConfig::from_env();
    let generative = GenerativeConfig::from_env()?;
    let spoonacular = SpoonacularConfig::from_env()?;
    let cache = CacheConfig::from_env()?;

    println!("Git Commit: {}", versions.git_commit);
    println!("Rust Version: {}", versions.rustc_version);
    println!();
    println!(
        "Gemini: model {} ({})",
        gemini.model,
        if gemini.api_key.is_some() { "configured" } else { "no API key" }
    );
    println!(
        "Spoonacular: up to {} results ({})",
        spoonacular.max_results,
        if spoonacular.api_key.is_some() { "configured" } else { "no API key" }
    );
    println!(
        "Languages: search in {}, display in {}",
        spoonacular.search_language, generative.display_language
    );
    println!("AI recipes per search: {}", generative.recipe_count);
    println!(
        "Search cache: {} sessions, {}s idle timeout",
        cache.max_sessions,
        cache.session_ttl.as_secs()
    );

    Ok(())
}
