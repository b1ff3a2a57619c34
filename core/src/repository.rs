use std::sync::Arc;

use anyhow::{Context, Result};

use crate::db::Database;
use crate::live::{LiveQuery, RecipeQuery};
use crate::models::Recipe;

/// The API the presentation layer talks to.
///
/// Every method forwards to [`Database`]. Writes and point lookups run on
/// tokio's blocking pool so the calling task is never blocked on SQLite;
/// reads over lists come back as [`LiveQuery`] streams.
#[derive(Clone)]
pub struct RecipeRepository {
    db: Arc<Database>,
}

impl RecipeRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(Database::open_in_memory()?)))
    }

    #[must_use]
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .context("Database task panicked")?
    }

    // --- Live reads ---
    //
    // The first snapshot is taken on the blocking pool; later emissions are
    // computed by whichever write triggers them.

    pub async fn all_recipes(&self) -> Result<LiveQuery> {
        self.watch(RecipeQuery::All).await
    }

    pub async fn recipes_by_category(&self, category: &str) -> Result<LiveQuery> {
        self.watch(RecipeQuery::ByCategory(category.to_string()))
            .await
    }

    pub async fn search_recipes(&self, query: &str) -> Result<LiveQuery> {
        self.watch(RecipeQuery::Search(query.to_string())).await
    }

    pub async fn search_recipes_in_category(
        &self,
        category: &str,
        query: &str,
    ) -> Result<LiveQuery> {
        self.watch(RecipeQuery::SearchInCategory {
            category: category.to_string(),
            query: query.to_string(),
        })
        .await
    }

    async fn watch(&self, query: RecipeQuery) -> Result<LiveQuery> {
        self.run(move |db| db.watch(query)).await
    }

    // --- Point operations ---

    pub async fn get_recipe_by_id(&self, id: i64) -> Result<Option<Recipe>> {
        self.run(move |db| db.get_recipe_by_id(id)).await
    }

    pub async fn insert_recipe(&self, recipe: Recipe) -> Result<i64> {
        self.run(move |db| db.insert_recipe(&recipe)).await
    }

    pub async fn update_recipe(&self, recipe: Recipe) -> Result<bool> {
        self.run(move |db| db.update_recipe(&recipe)).await
    }

    pub async fn delete_recipe(&self, recipe: Recipe) -> Result<bool> {
        self.run(move |db| db.delete_recipe(&recipe)).await
    }

    pub async fn delete_recipe_by_id(&self, id: i64) -> Result<bool> {
        self.run(move |db| db.delete_recipe_by_id(id)).await
    }

    pub async fn count_recipes_by_category(&self, category: &str) -> Result<i64> {
        let category = category.to_string();
        self.run(move |db| db.count_recipes_by_category(&category))
            .await
    }

    pub fn close(&self) -> Result<()> {
        self.db.close()
    }
}
