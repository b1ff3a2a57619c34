mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    RecipeFields, cmd_add, cmd_categories, cmd_delete, cmd_edit, cmd_list, cmd_search, cmd_show,
};
use crate::config::Config;
use cookbook_core::{Database, RecipeRepository};

#[derive(Parser)]
#[command(
    name = "cookbook",
    version,
    about = "A simple, local-first recipe manager",
    long_about = "Keep your recipes in a local database: browse them by category, \
                  search titles and ingredients, and read them back as numbered lists."
)]
struct Cli {
    /// Database file (default: cookbook.db in the platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new recipe
    Add {
        /// Recipe title
        title: String,
        #[command(flatten)]
        fields: RecipeFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a recipe; only the given fields change
    Edit {
        /// Recipe ID
        id: i64,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        #[command(flatten)]
        fields: RecipeFields,
        /// Remove the image path
        #[arg(long, conflicts_with = "image")]
        clear_image: bool,
        /// Remove protein/carbs/fat before applying any new values
        #[arg(long)]
        clear_macros: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe by ID
    Delete {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe with numbered ingredients and steps
    Show {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recipes, optionally in one category
    List {
        /// Category to list
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search titles and ingredients (case-sensitive)
    Search {
        /// Text to look for
        query: String,
        /// Only search within this category
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show how many recipes each category holds
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    let db = Arc::new(Database::open(&config.db_path)?);
    tracing::debug!(path = %config.db_path.display(), "database opened");
    let repo = RecipeRepository::new(db);

    let result = dispatch(&repo, cli.command).await;
    repo.close()?;
    result
}

async fn dispatch(repo: &RecipeRepository, command: Commands) -> Result<()> {
    match command {
        Commands::Add {
            title,
            fields,
            json,
        } => cmd_add(repo, &title, fields, json).await,
        Commands::Edit {
            id,
            title,
            fields,
            clear_image,
            clear_macros,
            json,
        } => cmd_edit(repo, id, title, fields, clear_image, clear_macros, json).await,
        Commands::Delete { id, json } => cmd_delete(repo, id, json).await,
        Commands::Show { id, json } => cmd_show(repo, id, json).await,
        Commands::List { category, json } => cmd_list(repo, category.as_deref(), json).await,
        Commands::Search {
            query,
            category,
            json,
        } => cmd_search(repo, &query, category.as_deref(), json).await,
        Commands::Categories { json } => cmd_categories(repo, json).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_repeated_lines() {
        let cli = Cli::try_parse_from([
            "cookbook", "add", "Pancakes", "-c", "breakfast", "-i", "Flour", "-i", "Eggs", "-s",
            "Mix", "--protein", "12",
        ])
        .unwrap();
        let Commands::Add { title, fields, json } = cli.command else {
            panic!("expected add");
        };
        assert_eq!(title, "Pancakes");
        assert_eq!(fields.category.as_deref(), Some("breakfast"));
        assert_eq!(fields.ingredients, vec!["Flour", "Eggs"]);
        assert_eq!(fields.steps, vec!["Mix"]);
        assert_eq!(fields.protein, Some(12.0));
        assert!(!json);
    }

    #[test]
    fn test_global_db_flag() {
        let cli = Cli::try_parse_from(["cookbook", "list", "--db", "/tmp/x.db"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
    }

    #[test]
    fn test_clear_image_conflicts_with_image() {
        let result = Cli::try_parse_from([
            "cookbook",
            "edit",
            "1",
            "--image",
            "a.jpg",
            "--clear-image",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_against_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("cookbook.db");
        let cli = Cli::try_parse_from([
            "cookbook",
            "--db",
            db_path.to_str().unwrap(),
            "add",
            "Soup",
            "-c",
            "dinner",
            "-i",
            "Water",
            "-s",
            "Boil",
            "--json",
        ])
        .unwrap();
        run(cli).await.unwrap();

        let db = Database::open(&db_path).unwrap();
        let recipes = db.list_recipes_by_category("Dinner").unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].title, "Soup");
    }
}
