//! Pure lookups over the presented sequence.
//!
//! Every function returns an index into the slice it was given, so callers
//! can read or mutate the article afterwards without a second search.

use super::types::{Article, ArticleId};
use super::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// First article, in sequence order, whose element intersects the viewport.
///
/// Returns `None` for an empty sequence and when nothing intersects.
pub fn first_visible<V: Viewport + ?Sized>(articles: &[Article], viewport: &V) -> Option<usize> {
    articles.iter().position(|a| viewport.is_visible(a.id))
}

/// Adjacent article of `reference`.
///
/// `None` at either boundary, when `reference` is `None`, or when the
/// reference is not part of the sequence.
pub fn neighbour(
    articles: &[Article],
    direction: Direction,
    reference: Option<ArticleId>,
) -> Option<usize> {
    let index = position_of(articles, reference?)?;
    match direction {
        Direction::Prev => index.checked_sub(1),
        Direction::Next => Some(index + 1).filter(|&next| next < articles.len()),
    }
}

/// Phase of a single [`next_unread`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchPhase {
    LocatingReference,
    /// Scanning forward from `origin`; `step` counts visited slots.
    ScanningUnread { origin: usize, step: usize },
    Done(Option<usize>),
}

/// Next unread article after `reference`, wrapping to the start of the
/// sequence.
///
/// The scan visits every slot at most once and inspects the reference slot
/// last, so the result is `None` exactly when every article is read. With no
/// reference the scan starts at index 0. A reference that is not part of the
/// sequence yields `None`.
pub fn next_unread(articles: &[Article], reference: Option<ArticleId>) -> Option<usize> {
    let len = articles.len();
    if len == 0 {
        return None;
    }

    let mut phase = SearchPhase::LocatingReference;
    loop {
        phase = match phase {
            SearchPhase::LocatingReference => match reference {
                None => SearchPhase::ScanningUnread {
                    origin: len - 1,
                    step: 0,
                },
                Some(id) => match position_of(articles, id) {
                    Some(origin) => SearchPhase::ScanningUnread { origin, step: 0 },
                    None => SearchPhase::Done(None),
                },
            },
            SearchPhase::ScanningUnread { step, .. } if step == len => SearchPhase::Done(None),
            SearchPhase::ScanningUnread { origin, step } => {
                let index = (origin + 1 + step) % len;
                if articles[index].read {
                    SearchPhase::ScanningUnread {
                        origin,
                        step: step + 1,
                    }
                } else {
                    SearchPhase::Done(Some(index))
                }
            }
            SearchPhase::Done(found) => return found,
        };
    }
}

fn position_of(articles: &[Article], id: ArticleId) -> Option<usize> {
    articles.iter().position(|a| a.id == id)
}
