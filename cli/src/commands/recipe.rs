use anyhow::{Result, bail};
use clap::Args;

use cookbook_core::RecipeRepository;
use cookbook_core::models::{Category, Recipe, validate_recipe};

use super::helpers::{exit_not_found, list_from_args, parse_category, print_recipe_detail};

/// Recipe fields shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
pub(crate) struct RecipeFields {
    /// Category: breakfast, brunch, lunch, dinner, desserts, other
    #[arg(short, long)]
    pub category: Option<String>,
    /// Ingredient line (repeat for each ingredient)
    #[arg(short = 'i', long = "ingredient", value_name = "LINE")]
    pub ingredients: Vec<String>,
    /// Instruction step (repeat for each step, in order)
    #[arg(short = 's', long = "step", value_name = "LINE")]
    pub steps: Vec<String>,
    /// Path to an image of the dish
    #[arg(long, value_name = "PATH")]
    pub image: Option<String>,
    /// Protein in grams
    #[arg(long)]
    pub protein: Option<f64>,
    /// Carbohydrates in grams
    #[arg(long)]
    pub carbs: Option<f64>,
    /// Fat in grams
    #[arg(long)]
    pub fat: Option<f64>,
}

pub(crate) async fn cmd_add(
    repo: &RecipeRepository,
    title: &str,
    fields: RecipeFields,
    json: bool,
) -> Result<()> {
    let Some(category) = fields.category.as_deref() else {
        bail!(
            "Category is required. Must be one of: {}",
            Category::display_names().join(", ")
        );
    };
    let category = parse_category(category)?;

    let mut recipe = Recipe::new(
        title,
        list_from_args(&fields.ingredients),
        list_from_args(&fields.steps),
        category.display_name(),
    );
    recipe.image_path = fields.image;
    recipe.protein = fields.protein;
    recipe.carbs = fields.carbs;
    recipe.fat = fields.fat;
    validate_recipe(&recipe)?;

    let id = repo.insert_recipe(recipe.clone()).await?;

    if json {
        let saved = Recipe { id, ..recipe };
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        println!("Saved recipe: {title} (id: {id}, category: {category})");
    }
    Ok(())
}

/// Apply the given edits on top of `recipe`. Untouched fields keep their
/// current values, so the update that follows still carries every column.
pub(crate) fn apply_edits(
    recipe: &mut Recipe,
    title: Option<String>,
    fields: RecipeFields,
    clear_image: bool,
    clear_macros: bool,
) -> Result<()> {
    if let Some(title) = title {
        recipe.title = title;
    }
    if let Some(category) = fields.category.as_deref() {
        recipe.category = parse_category(category)?.display_name().to_string();
    }
    if !fields.ingredients.is_empty() {
        recipe.ingredients = list_from_args(&fields.ingredients);
    }
    if !fields.steps.is_empty() {
        recipe.instructions = list_from_args(&fields.steps);
    }
    if clear_image {
        recipe.image_path = None;
    } else if fields.image.is_some() {
        recipe.image_path = fields.image;
    }
    if clear_macros {
        recipe.protein = None;
        recipe.carbs = None;
        recipe.fat = None;
    }
    if fields.protein.is_some() {
        recipe.protein = fields.protein;
    }
    if fields.carbs.is_some() {
        recipe.carbs = fields.carbs;
    }
    if fields.fat.is_some() {
        recipe.fat = fields.fat;
    }
    recipe.touch();
    Ok(())
}

pub(crate) async fn cmd_edit(
    repo: &RecipeRepository,
    id: i64,
    title: Option<String>,
    fields: RecipeFields,
    clear_image: bool,
    clear_macros: bool,
    json: bool,
) -> Result<()> {
    let Some(mut recipe) = repo.get_recipe_by_id(id).await? else {
        exit_not_found(id, json);
    };

    apply_edits(&mut recipe, title, fields, clear_image, clear_macros)?;
    validate_recipe(&recipe)?;

    if !repo.update_recipe(recipe.clone()).await? {
        exit_not_found(id, json);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        let title = &recipe.title;
        println!("Updated recipe: {title} (id: {id})");
    }
    Ok(())
}

pub(crate) async fn cmd_delete(repo: &RecipeRepository, id: i64, json: bool) -> Result<()> {
    if !repo.delete_recipe_by_id(id).await? {
        exit_not_found(id, json);
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted recipe {id}");
    }
    Ok(())
}

pub(crate) async fn cmd_show(repo: &RecipeRepository, id: i64, json: bool) -> Result<()> {
    let Some(recipe) = repo.get_recipe_by_id(id).await? else {
        exit_not_found(id, json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        print_recipe_detail(&recipe);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> Recipe {
        let mut r = Recipe::new("Pancakes", "Flour\nEggs", "Mix\nCook", "Breakfast");
        r.id = 7;
        r.image_path = Some("pancakes.jpg".to_string());
        r.protein = Some(10.0);
        r.carbs = Some(40.0);
        r.fat = Some(5.0);
        r.created_at = Some(1_000);
        r.updated_at = Some(1_000);
        r
    }

    #[test]
    fn test_apply_edits_keeps_untouched_fields() {
        let mut recipe = existing();
        apply_edits(
            &mut recipe,
            Some("Crepes".to_string()),
            RecipeFields::default(),
            false,
            false,
        )
        .unwrap();

        assert_eq!(recipe.id, 7);
        assert_eq!(recipe.title, "Crepes");
        assert_eq!(recipe.ingredients, "Flour\nEggs");
        assert_eq!(recipe.instructions, "Mix\nCook");
        assert_eq!(recipe.category, "Breakfast");
        assert_eq!(recipe.image_path.as_deref(), Some("pancakes.jpg"));
        assert_eq!(recipe.protein, Some(10.0));
        assert_eq!(recipe.created_at, Some(1_000));
        assert!(recipe.updated_at.unwrap() > 1_000);
    }

    #[test]
    fn test_apply_edits_replaces_lists_and_category() {
        let mut recipe = existing();
        let fields = RecipeFields {
            category: Some("desserts".to_string()),
            ingredients: vec!["1) Sugar".to_string(), "2) Butter".to_string()],
            steps: vec!["Melt".to_string()],
            ..RecipeFields::default()
        };
        apply_edits(&mut recipe, None, fields, false, false).unwrap();

        assert_eq!(recipe.category, "Desserts");
        assert_eq!(recipe.ingredients, "Sugar\nButter");
        assert_eq!(recipe.instructions, "Melt");
    }

    #[test]
    fn test_apply_edits_clear_flags() {
        let mut recipe = existing();
        let fields = RecipeFields {
            fat: Some(2.0),
            ..RecipeFields::default()
        };
        apply_edits(&mut recipe, None, fields, true, true).unwrap();

        assert!(recipe.image_path.is_none());
        assert!(recipe.protein.is_none());
        assert!(recipe.carbs.is_none());
        assert_eq!(recipe.fat, Some(2.0));
    }

    #[test]
    fn test_apply_edits_rejects_unknown_category() {
        let mut recipe = existing();
        let fields = RecipeFields {
            category: Some("Snack".to_string()),
            ..RecipeFields::default()
        };
        assert!(apply_edits(&mut recipe, None, fields, false, false).is_err());
        assert_eq!(recipe.category, "Breakfast");
    }

    #[tokio::test]
    async fn test_add_then_edit_roundtrip() {
        let repo = RecipeRepository::open_in_memory().unwrap();
        let fields = RecipeFields {
            category: Some("lunch".to_string()),
            ingredients: vec!["Bread".to_string(), "Cheese".to_string()],
            steps: vec!["Toast".to_string()],
            ..RecipeFields::default()
        };
        cmd_add(&repo, "Cheese Toast", fields, true).await.unwrap();

        let saved = repo
            .database()
            .search_recipes("Cheese Toast")
            .unwrap()
            .remove(0);
        assert_eq!(saved.category, "Lunch");
        assert_eq!(saved.ingredients, "Bread\nCheese");

        let edits = RecipeFields {
            protein: Some(14.0),
            ..RecipeFields::default()
        };
        cmd_edit(&repo, saved.id, None, edits, false, false, true)
            .await
            .unwrap();

        let edited = repo.get_recipe_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(edited.protein, Some(14.0));
        assert_eq!(edited.title, "Cheese Toast");
    }

    #[tokio::test]
    async fn test_add_requires_category_and_fields() {
        let repo = RecipeRepository::open_in_memory().unwrap();

        let err = cmd_add(&repo, "No Category", RecipeFields::default(), true)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Category is required"));

        let fields = RecipeFields {
            category: Some("Dinner".to_string()),
            steps: vec!["Cook".to_string()],
            ..RecipeFields::default()
        };
        let err = cmd_add(&repo, "Stew", fields, true).await.unwrap_err();
        assert_eq!(err.to_string(), "Ingredients are required");

        assert!(repo.database().list_recipes().unwrap().is_empty());
    }
}
