use std::sync::Arc;
use thiserror::Error;

use crate::nav::{Article, QueryError};

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process has locked the database
    #[error("Another instance of glance appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }

    /// The store could not be reached at all, as opposed to rejecting a
    /// statement.
    pub fn is_unreachable(&self) -> bool {
        match self {
            DatabaseError::InstanceLocked => true,
            DatabaseError::Migration(_) => false,
            DatabaseError::Other(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
        }
    }
}

impl From<DatabaseError> for QueryError {
    fn from(err: DatabaseError) -> Self {
        if err.is_unreachable() {
            QueryError::Offline(err.to_string())
        } else {
            QueryError::Storage(err.to_string())
        }
    }
}

// ============================================================================
// Row Types
// ============================================================================

/// Internal row type for article queries
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ArticleDbRow {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub published: Option<i64>,
    pub image: Option<String>,
    pub read: bool,
}

impl ArticleDbRow {
    pub(crate) fn into_article(self) -> Article {
        Article {
            id: self.id,
            feed_id: self.feed_id,
            title: Arc::from(self.title),
            url: self.url.map(Arc::from),
            published: self.published,
            image: self.image.map(Arc::from),
            read: self.read,
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Feed data from database
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub id: i64,
    pub title: Arc<str>,
    pub url: String,
    pub category: Option<String>,
    pub unread_count: i64,
}

/// An article to be stored, before it has an id
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub guid: String,
    pub title: String,
    pub url: Option<String>,
    pub published: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}
