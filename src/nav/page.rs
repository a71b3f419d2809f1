//! The presented page: sorting, de-duplication and day grouping.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, TimeZone};

use super::types::{Article, ArticleId, PageRange};

/// Articles per page. Not configurable.
pub const PAGE_SIZE: usize = 50;

/// Range of a zero-based page index: `[index * PAGE_SIZE, index * PAGE_SIZE + PAGE_SIZE)`.
pub fn page_range(page_index: usize) -> PageRange {
    let from = page_index.saturating_mul(PAGE_SIZE);
    PageRange {
        from,
        to: from.saturating_add(PAGE_SIZE),
    }
}

/// The ordered page currently shown.
///
/// Order is fixed for the lifetime of the page: newest first, ties broken by
/// descending id, undated articles last. Identifiers are unique and the
/// length never exceeds [`PAGE_SIZE`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresentedPage {
    articles: Vec<Article>,
}

impl PresentedPage {
    pub fn new(mut articles: Vec<Article>) -> Self {
        let mut seen = HashSet::with_capacity(articles.len());
        articles.retain(|a| seen.insert(a.id));
        articles.sort_by_key(|a| (a.published.is_none(), Reverse(a.published), Reverse(a.id)));
        if articles.len() > PAGE_SIZE {
            tracing::warn!(
                received = articles.len(),
                "Page query returned more than a page of articles, truncating"
            );
            articles.truncate(PAGE_SIZE);
        }
        Self { articles }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Mutable access to one article; the sequence itself cannot be
    /// reordered from outside.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Article> {
        self.articles.get_mut(index)
    }

    pub fn find(&self, id: ArticleId) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.articles.iter().filter(|a| !a.read).count()
    }

    /// Group consecutive articles by calendar day in `tz`.
    pub fn organize_by_days<Tz: TimeZone>(&self, tz: &Tz) -> Vec<DayGroup> {
        let mut groups: Vec<DayGroup> = Vec::new();
        for (index, article) in self.articles.iter().enumerate() {
            let day = article
                .published
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|utc| utc.with_timezone(tz).date_naive());

            match groups.last_mut() {
                Some(group) if group.day == day => group.indices.push(index),
                _ => groups.push(DayGroup {
                    day,
                    indices: vec![index],
                }),
            }
        }
        groups
    }
}

/// Articles of one calendar day, as indices into the presented page.
/// `day` is `None` for undated articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    pub day: Option<NaiveDate>,
    pub indices: Vec<usize>,
}
