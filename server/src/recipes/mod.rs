use serde::{Deserialize, Serialize};

pub(crate) mod cache;
pub(crate) mod generative;
pub(crate) mod merge;
pub(crate) mod search;
pub(crate) mod sources;
pub(crate) mod spoonacular;

#[cfg(test)]
pub(crate) mod testing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Estimates difficulty from total cook time in minutes.
    pub(crate) fn from_cook_time(minutes: u32) -> Self {
        match minutes {
            0..=20 => Self::Easy,
            21..=45 => Self::Medium,
            _ => Self::Hard,
        }
    }
}

/// Which adapter produced a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RecipeSource {
    /// Generated by the language model.
    Ai,
    /// Fetched from the external recipe API.
    Api,
}

impl RecipeSource {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Api => "api",
        }
    }
}

impl std::str::FromStr for RecipeSource {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai" => Ok(Self::Ai),
            "api" => Ok(Self::Api),
            other => Err(color_eyre::eyre::eyre!("Unknown recipe source {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Ingredient {
    pub name: String,
    pub amount: String,
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Instruction {
    pub step: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub servings: u32,
    pub cook_time: u32,
    pub difficulty: Difficulty,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Instruction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub source: RecipeSource,
}

/// Builds instructions numbered `1..=n` in list order, whatever numbering the
/// upstream data used.
pub(crate) fn number_instructions<I>(descriptions: I) -> Vec<Instruction>
where
    I: IntoIterator<Item = String>,
{
    descriptions
        .into_iter()
        .zip(1..)
        .map(|(description, step)| Instruction { step, description })
        .collect()
}

/// Lowercased, non-blank copy of what the user said they have.
pub(crate) struct Pantry(Vec<String>);

impl Pantry {
    pub(crate) fn new(ingredients: &[String]) -> Self {
        Self(
            ingredients
                .iter()
                .map(|i| i.trim().to_lowercase())
                .filter(|i| !i.is_empty())
                .collect(),
        )
    }

    /// Case-insensitive substring match in either direction, so "onion"
    /// matches "red onion" and "green onions" matches "onion".
    pub(crate) fn has(&self, ingredient_name: &str) -> bool {
        let name = ingredient_name.trim().to_lowercase();
        if name.is_empty() {
            return false;
        }

        self.0
            .iter()
            .any(|held| name.contains(held.as_str()) || held.contains(name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_thresholds() {
        assert_eq!(Difficulty::from_cook_time(0), Difficulty::Easy);
        assert_eq!(Difficulty::from_cook_time(20), Difficulty::Easy);
        assert_eq!(Difficulty::from_cook_time(21), Difficulty::Medium);
        assert_eq!(Difficulty::from_cook_time(45), Difficulty::Medium);
        assert_eq!(Difficulty::from_cook_time(46), Difficulty::Hard);
        assert_eq!(Difficulty::from_cook_time(240), Difficulty::Hard);
    }

    #[test]
    fn pantry_matches_case_insensitive_substrings_both_ways() {
        let pantry = Pantry::new(&["Onion".to_string(), "carrots".to_string()]);

        assert!(pantry.has("red onion"));
        assert!(pantry.has("ONION"));
        assert!(pantry.has("carrot"));
        assert!(!pantry.has("potato"));
        assert!(!pantry.has(""));
    }

    #[test]
    fn blank_pantry_entries_match_nothing() {
        let pantry = Pantry::new(&[String::new(), "  ".to_string()]);

        assert!(!pantry.has("salt"));
    }

    #[test]
    fn instructions_are_renumbered_from_one() {
        let steps = number_instructions(["Chop".to_string(), "Fry".to_string()]);

        assert_eq!(
            steps,
            vec![
                Instruction {
                    step: 1,
                    description: "Chop".to_string()
                },
                Instruction {
                    step: 2,
                    description: "Fry".to_string()
                },
            ]
        );
    }

    #[test]
    fn recipe_json_uses_camel_case_and_lowercase_tags() {
        let recipe = Recipe {
            id: "api-spoonacular-1".to_string(),
            title: "Soup".to_string(),
            description: None,
            servings: 2,
            cook_time: 30,
            difficulty: Difficulty::Medium,
            ingredients: vec![Ingredient {
                name: "onion".to_string(),
                amount: "1".to_string(),
                is_available: true,
            }],
            instructions: number_instructions(["Boil".to_string()]),
            image_url: Some("https://img".to_string()),
            tags: None,
            source: RecipeSource::Api,
        };

        let json = serde_json::to_value(&recipe).unwrap();

        assert_eq!(json["cookTime"], 30);
        assert_eq!(json["imageUrl"], "https://img");
        assert_eq!(json["difficulty"], "medium");
        assert_eq!(json["source"], "api");
        assert_eq!(json["ingredients"][0]["isAvailable"], true);
        assert!(json.get("description").is_none());
    }
}
