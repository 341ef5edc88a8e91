mod models;
mod slug;

pub use models::*;
pub use slug::slugify;
