mod helpers;
mod recipe;
mod search;

pub(crate) use recipe::{RecipeFields, cmd_add, cmd_delete, cmd_edit, cmd_show};
pub(crate) use search::{cmd_categories, cmd_list, cmd_search};
