use anyhow::{Context, Result};
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use cookbook_core::models::{Category, Recipe};
use cookbook_core::{LiveQuery, RecipeRepository};

use super::helpers::{parse_category, print_recipe_table};

async fn first_emission(mut live: LiveQuery) -> Result<Vec<Recipe>> {
    live.next().await.context("Database was closed")
}

fn print_recipes(recipes: &[Recipe], empty_message: &str, json: bool) -> Result<()> {
    if recipes.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("{empty_message}");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(recipes)?);
    } else {
        print_recipe_table(recipes);
    }
    Ok(())
}

pub(crate) async fn cmd_list(
    repo: &RecipeRepository,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let live = match category {
        Some(c) => {
            repo.recipes_by_category(parse_category(c)?.display_name())
                .await?
        }
        None => repo.all_recipes().await?,
    };
    let recipes = first_emission(live).await?;
    print_recipes(&recipes, "No recipes found", json)
}

pub(crate) async fn cmd_search(
    repo: &RecipeRepository,
    query: &str,
    category: Option<&str>,
    json: bool,
) -> Result<()> {
    let live = match category {
        Some(c) => {
            repo.search_recipes_in_category(parse_category(c)?.display_name(), query)
                .await?
        }
        None => repo.search_recipes(query).await?,
    };
    let recipes = first_emission(live).await?;
    print_recipes(&recipes, &format!("No recipes match '{query}'"), json)
}

pub(crate) async fn cmd_categories(repo: &RecipeRepository, json: bool) -> Result<()> {
    #[derive(Serialize, Tabled)]
    struct CategoryRow {
        #[tabled(rename = "Category")]
        category: Category,
        #[tabled(rename = "Recipes")]
        count: i64,
    }

    let mut rows = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let count = repo
            .count_recipes_by_category(category.display_name())
            .await?;
        rows.push(CategoryRow { category, count });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}
