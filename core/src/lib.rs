pub mod db;
pub mod format;
pub mod live;
pub mod models;
pub mod repository;

pub use db::Database;
pub use live::{LiveQuery, RecipeQuery};
pub use models::{Category, Recipe};
pub use repository::RecipeRepository;
