use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::live::{LiveQuery, RecipeQuery, Registry, Subscriber};
use crate::models::Recipe;

const RECIPE_COLUMNS: &str = "id, title, ingredients, instructions, category, image_path, \
                              protein, carbs, fat, created_at, updated_at";

/// Owner of the SQLite connection and of the live-query registry.
///
/// Share one instance per process behind an `Arc`. After [`Database::close`]
/// every operation fails.
pub struct Database {
    conn: Mutex<Option<Connection>>,
    watchers: Arc<Registry>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::migrate(&conn)?;
        Ok(Database {
            conn: Mutex::new(Some(conn)),
            watchers: Arc::default(),
        })
    }

    fn migrate(conn: &Connection) -> Result<()> {
        let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    ingredients TEXT NOT NULL,
                    instructions TEXT NOT NULL,
                    category TEXT NOT NULL,
                    image_path TEXT,
                    protein REAL,
                    carbs REAL,
                    fat REAL,
                    created_at INTEGER,
                    updated_at INTEGER
                );

                CREATE INDEX IF NOT EXISTS idx_recipes_category ON recipes(category);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    /// Close the connection and end every live query.
    pub fn close(&self) -> Result<()> {
        let conn = self.lock_conn().take();
        self.watchers.clear();
        match conn {
            Some(conn) => {
                conn.close()
                    .map_err(|(_, e)| e)
                    .context("Failed to close database")?;
                debug!("database closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lock_conn().is_some()
    }

    fn lock_conn(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let guard = self.lock_conn();
        let conn = guard.as_ref().context("Database is closed")?;
        Ok(f(conn)?)
    }

    // --- Row mapping helpers ---

    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            id: row.get(0)?,
            title: row.get(1)?,
            ingredients: row.get(2)?,
            instructions: row.get(3)?,
            category: row.get(4)?,
            image_path: row.get(5)?,
            protein: row.get(6)?,
            carbs: row.get(7)?,
            fat: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn select(
        conn: &Connection,
        filter: &str,
        order: &str,
        params: impl rusqlite::Params,
    ) -> rusqlite::Result<Vec<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes {filter} ORDER BY {order}");
        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.query_map(params, Self::recipe_from_row)?.collect()
    }

    pub(crate) fn run_query(conn: &Connection, query: &RecipeQuery) -> rusqlite::Result<Vec<Recipe>> {
        match query {
            RecipeQuery::All => Self::select(conn, "", "category ASC, title ASC", []),
            RecipeQuery::ByCategory(category) => Self::select(
                conn,
                "WHERE category = ?1",
                "title ASC",
                params![category],
            ),
            RecipeQuery::Search(query) => Self::select(
                conn,
                "WHERE instr(title, ?1) > 0 OR instr(ingredients, ?1) > 0",
                "title ASC",
                params![query],
            ),
            RecipeQuery::SearchInCategory { category, query } => Self::select(
                conn,
                "WHERE category = ?1 AND (instr(title, ?2) > 0 OR instr(ingredients, ?2) > 0)",
                "title ASC",
                params![category, query],
            ),
        }
    }

    // --- Writes ---

    /// Insert a new row, ignoring `recipe.id`. Returns the assigned id.
    pub fn insert_recipe(&self, recipe: &Recipe) -> Result<i64> {
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO recipes (title, ingredients, instructions, category, image_path,
                                      protein, carbs, fat, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    recipe.title,
                    recipe.ingredients,
                    recipe.instructions,
                    recipe.category,
                    recipe.image_path,
                    recipe.protein,
                    recipe.carbs,
                    recipe.fat,
                    recipe.created_at,
                    recipe.updated_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        debug!(id, category = %recipe.category, "inserted recipe");
        self.notify_watchers();
        Ok(id)
    }

    /// Replace every column of the row with `recipe.id`.
    ///
    /// Returns false (and changes nothing) when no such row exists.
    pub fn update_recipe(&self, recipe: &Recipe) -> Result<bool> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE recipes SET title = ?1, ingredients = ?2, instructions = ?3,
                        category = ?4, image_path = ?5, protein = ?6, carbs = ?7, fat = ?8,
                        created_at = ?9, updated_at = ?10
                 WHERE id = ?11",
                params![
                    recipe.title,
                    recipe.ingredients,
                    recipe.instructions,
                    recipe.category,
                    recipe.image_path,
                    recipe.protein,
                    recipe.carbs,
                    recipe.fat,
                    recipe.created_at,
                    recipe.updated_at,
                    recipe.id,
                ],
            )
        })?;
        debug!(id = recipe.id, changed, "updated recipe");
        self.notify_watchers();
        Ok(changed > 0)
    }

    pub fn delete_recipe(&self, recipe: &Recipe) -> Result<bool> {
        self.delete_recipe_by_id(recipe.id)
    }

    pub fn delete_recipe_by_id(&self, id: i64) -> Result<bool> {
        let changed =
            self.with_conn(|conn| conn.execute("DELETE FROM recipes WHERE id = ?1", params![id]))?;
        debug!(id, changed, "deleted recipe");
        self.notify_watchers();
        Ok(changed > 0)
    }

    // --- Reads ---

    pub fn get_recipe_by_id(&self, id: i64) -> Result<Option<Recipe>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1"),
                params![id],
                Self::recipe_from_row,
            )
            .optional()
        })
    }

    /// One-shot snapshot of a query.
    pub fn recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>> {
        self.with_conn(|conn| Self::run_query(conn, query))
    }

    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        self.recipes(&RecipeQuery::All)
    }

    pub fn list_recipes_by_category(&self, category: &str) -> Result<Vec<Recipe>> {
        self.recipes(&RecipeQuery::ByCategory(category.to_string()))
    }

    pub fn search_recipes(&self, query: &str) -> Result<Vec<Recipe>> {
        self.recipes(&RecipeQuery::Search(query.to_string()))
    }

    pub fn search_recipes_in_category(&self, category: &str, query: &str) -> Result<Vec<Recipe>> {
        self.recipes(&RecipeQuery::SearchInCategory {
            category: category.to_string(),
            query: query.to_string(),
        })
    }

    pub fn count_recipes_by_category(&self, category: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM recipes WHERE category = ?1",
                params![category],
                |row| row.get(0),
            )
        })
    }

    // --- Live queries ---

    /// Subscribe to `query`. The handle yields the current result first and
    /// a fresh one after every write, until it is dropped or the database is
    /// closed.
    pub fn watch(&self, query: RecipeQuery) -> Result<LiveQuery> {
        // Registry before connection, so no write lands between the
        // snapshot and the registration.
        let mut subscribers = self.watchers.lock();
        let initial = self.recipes(&query)?;
        let (tx, rx) = watch::channel(initial);
        let id = self.watchers.next_id();
        subscribers.insert(
            id,
            Subscriber {
                query: query.clone(),
                tx,
            },
        );
        debug!(subscription = id, ?query, "live query subscribed");
        Ok(LiveQuery::new(id, query, rx, Arc::downgrade(&self.watchers)))
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.watchers.lock().len()
    }

    /// Re-run every live query and push the results.
    ///
    /// Holds the registry lock throughout, so the last value each subscriber
    /// receives reflects the last write.
    fn notify_watchers(&self) {
        let mut subscribers = self.watchers.lock();
        subscribers.retain(|_, s| !s.tx.is_closed());
        if subscribers.is_empty() {
            return;
        }

        let guard = self.lock_conn();
        let Some(conn) = guard.as_ref() else {
            return;
        };
        for (id, subscriber) in subscribers.iter() {
            match Self::run_query(conn, &subscriber.query) {
                Ok(recipes) => {
                    subscriber.tx.send_replace(recipes);
                }
                Err(e) => warn!(subscription = id, error = %e, "failed to refresh live query"),
            }
        }
    }
}
