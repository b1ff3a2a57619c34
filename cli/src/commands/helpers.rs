use anyhow::{Result, bail};
use chrono::{Local, TimeZone};
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use cookbook_core::format::{format_list, parse_list};
use cookbook_core::models::{Category, Recipe};

/// Case-insensitive category lookup for command-line input.
///
/// Unlike `Category::from_display_name`, unknown names are an error here so a
/// typo does not silently file a recipe under "Other".
pub(crate) fn parse_category(s: &str) -> Result<Category> {
    let trimmed = s.trim();
    match Category::ALL
        .into_iter()
        .find(|c| c.display_name().eq_ignore_ascii_case(trimmed))
    {
        Some(category) => Ok(category),
        None => bail!(
            "Invalid category '{s}'. Must be one of: {}",
            Category::display_names().join(", ")
        ),
    }
}

/// Join repeated `--ingredient`/`--step` values into one newline-separated
/// list, dropping any `N) ` numbering pasted from `cookbook show`.
pub(crate) fn list_from_args(lines: &[String]) -> String {
    parse_list(&lines.join("\n"))
}

pub(crate) fn count_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn exit_not_found(id: i64, json: bool) -> ! {
    let message = format!("Recipe {id} not found");
    if json {
        println!("{}", json_error(&message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

fn format_grams(value: Option<f64>) -> String {
    value.map_or("-".into(), |v| format!("{v:.1}"))
}

fn format_timestamp(millis: Option<i64>) -> Option<String> {
    let dt = Local.timestamp_millis_opt(millis?).single()?;
    Some(dt.format("%Y-%m-%d %H:%M").to_string())
}

pub(crate) fn print_recipe_table(recipes: &[Recipe]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
        #[tabled(rename = "Steps")]
        steps: usize,
        #[tabled(rename = "P (g)")]
        protein: String,
        #[tabled(rename = "C (g)")]
        carbs: String,
        #[tabled(rename = "F (g)")]
        fat: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: r.id,
            title: truncate(&r.title, 35),
            category: r.category.clone(),
            ingredients: count_lines(&r.ingredients),
            steps: count_lines(&r.instructions),
            protein: format_grams(r.protein),
            carbs: format_grams(r.carbs),
            fat: format_grams(r.fat),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_recipe_detail(recipe: &Recipe) {
    let title = &recipe.title;
    let category = &recipe.category;
    let id = recipe.id;
    println!("=== {title} ===");
    println!("  Category: {category}  |  ID: {id}");
    if let Some(image) = &recipe.image_path {
        println!("  Image: {image}");
    }
    if recipe.protein.is_some() || recipe.carbs.is_some() || recipe.fat.is_some() {
        let p = format_grams(recipe.protein);
        let c = format_grams(recipe.carbs);
        let f = format_grams(recipe.fat);
        println!("  Macros: P:{p}g C:{c}g F:{f}g");
    }

    println!("\n  INGREDIENTS:");
    for line in format_list(&recipe.ingredients).lines() {
        println!("    {line}");
    }

    println!("\n  INSTRUCTIONS:");
    for line in format_list(&recipe.instructions).lines() {
        println!("    {line}");
    }

    let created = format_timestamp(recipe.created_at);
    let updated = format_timestamp(recipe.updated_at);
    if created.is_some() || updated.is_some() {
        println!();
        if let Some(created) = created {
            println!("  Created: {created}");
        }
        if let Some(updated) = updated {
            println!("  Updated: {updated}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("Breakfast").unwrap(), Category::Breakfast);
        assert_eq!(parse_category("desserts").unwrap(), Category::Desserts);
        assert_eq!(parse_category("  DINNER ").unwrap(), Category::Dinner);
    }

    #[test]
    fn test_parse_category_invalid() {
        let err = parse_category("Snack").unwrap_err();
        assert!(err.to_string().contains("Breakfast, Brunch, Lunch, Dinner, Desserts, Other"));
        assert!(parse_category("").is_err());
    }

    #[test]
    fn test_list_from_args_joins_lines() {
        let lines = vec!["Eggs".to_string(), "Flour".to_string()];
        assert_eq!(list_from_args(&lines), "Eggs\nFlour");
    }

    #[test]
    fn test_list_from_args_strips_pasted_numbering() {
        let lines = vec!["1) Eggs\n2) Flour".to_string(), "3) Milk".to_string()];
        assert_eq!(list_from_args(&lines), "Eggs\nFlour\nMilk");
    }

    #[test]
    fn test_list_from_args_empty() {
        assert_eq!(list_from_args(&[]), "");
    }

    #[test]
    fn test_count_lines_skips_blanks() {
        assert_eq!(count_lines("Eggs\n\n  \nFlour"), 2);
        assert_eq!(count_lines(""), 0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long recipe title", 10), "a very ...");
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("nope"), r#"{"error":"nope"}"#);
    }

    #[test]
    fn test_format_grams() {
        assert_eq!(format_grams(Some(12.0)), "12.0");
        assert_eq!(format_grams(None), "-");
    }

    #[test]
    fn test_format_timestamp_absent() {
        assert!(format_timestamp(None).is_none());
        assert!(format_timestamp(Some(0)).is_some());
    }
}
