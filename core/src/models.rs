use std::fmt;

use anyhow::bail;
use chrono::Utc;
use serde::{Deserialize, Serialize, Serializer};

/// The fixed set of recipe categories.
///
/// Recipes store the category as plain text, so a row may carry a label that
/// is not one of these; `from_display_name` maps anything unknown to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Breakfast,
    Brunch,
    Lunch,
    Dinner,
    Desserts,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Breakfast,
        Category::Brunch,
        Category::Lunch,
        Category::Dinner,
        Category::Desserts,
        Category::Other,
    ];

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Breakfast => "Breakfast",
            Category::Brunch => "Brunch",
            Category::Lunch => "Lunch",
            Category::Dinner => "Dinner",
            Category::Desserts => "Desserts",
            Category::Other => "Other",
        }
    }

    /// Exact label lookup, falling back to `Other`.
    #[must_use]
    pub fn from_display_name(name: &str) -> Category {
        Category::ALL
            .into_iter()
            .find(|c| c.display_name() == name)
            .unwrap_or(Category::Other)
    }

    #[must_use]
    pub fn display_names() -> Vec<&'static str> {
        Category::ALL.iter().map(|c| c.display_name()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Assigned by the database on insert; `0` until then.
    #[serde(default)]
    pub id: i64,
    pub title: String,
    /// Newline-separated list.
    pub ingredients: String,
    /// Newline-separated ordered steps.
    pub instructions: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl Recipe {
    /// An unsaved recipe with both timestamps set to now.
    pub fn new(
        title: impl Into<String>,
        ingredients: impl Into<String>,
        instructions: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let now = now_millis();
        Recipe {
            id: 0,
            title: title.into(),
            ingredients: ingredients.into(),
            instructions: instructions.into(),
            category: category.into(),
            image_path: None,
            protein: None,
            carbs: None,
            fat: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(now_millis());
    }
}

#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Checks the fields a user must fill in before a recipe is saved.
///
/// The database accepts anything; callers run this first.
pub fn validate_recipe(recipe: &Recipe) -> anyhow::Result<()> {
    if recipe.title.trim().is_empty() {
        bail!("Recipe name is required");
    }
    if recipe.ingredients.trim().is_empty() {
        bail!("Ingredients are required");
    }
    if recipe.instructions.trim().is_empty() {
        bail!("Instructions are required");
    }
    for (name, value) in [
        ("protein", recipe.protein),
        ("carbs", recipe.carbs),
        ("fat", recipe.fat),
    ] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                bail!("Invalid {name} value '{v}'. Must be a non-negative number of grams");
            }
        }
    }
    Ok(())
}
