mod articles;
mod feeds;
mod query;
mod schema;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, Feed, NewArticle, Tag};
