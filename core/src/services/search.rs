//! Fuzzy nickname search: edit-distance matching against a datastore.

use std::sync::Arc;

use crate::collaborators::Datastore;
use crate::error::DatastoreError;
use crate::model::Stream;

const MAX_EDIT_DISTANCE: usize = 3;
const MAX_RESULTS: usize = 20;

/// Escapes a query for safe embedding in a SQL `LIKE` pattern:
/// backslash, percent, and underscore are each escaped with a backslash.
pub fn escape_like_query(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '%' => escaped.push_str("\\%"),
            '_' => escaped.push_str("\\_"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Searches online streams for a player nickname within an edit distance
/// of 3, case-insensitive, capped at 20 results.
pub async fn search_streams(
    datastore: &Arc<dyn Datastore>,
    query: &str,
) -> Result<Vec<Stream>, DatastoreError> {
    let escaped = escape_like_query(query);
    datastore
        .search_streams_by_nickname(&escaped, MAX_EDIT_DISTANCE, MAX_RESULTS)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_backslash_percent_and_underscore() {
        assert_eq!(escape_like_query("a_b%c\\d"), "a\\_b\\%c\\\\d");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(escape_like_query("plainname"), "plainname");
    }
}
