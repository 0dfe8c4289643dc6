//! One page of a query, and the cursor to the next one.

use std::ops::Deref;

use tracing::debug;

use crate::client::CloudClient;
use crate::error::CloudError;
use crate::query::Query;
use crate::traits::Collection;

/// The items of one page plus, when the server has more, the query for the
/// next page.
///
/// A result is bound to the collection type that produced it, so it can only
/// ever page through that same collection. It never changes after
/// construction; moving forward yields a new result.
#[derive(Debug)]
pub struct QueryResult<C: Collection> {
    items: Vec<C::Item>,
    next_query: Option<Query>,
    collection: C,
}

impl<C: Collection> QueryResult<C> {
    /// Build a page. An absent or empty `pagination_key` means this is the
    /// last page.
    pub fn new(
        query: &Query,
        pagination_key: Option<String>,
        collection: C,
        items: Vec<C::Item>,
    ) -> Self {
        let next_query = pagination_key
            .filter(|key| !key.is_empty())
            .map(|key| query.with_pagination_key(key));
        QueryResult {
            items,
            next_query,
            collection,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_query.is_some()
    }

    /// The query for the next page: the originating query unchanged except
    /// for the continuation token.
    pub fn next_query(&self) -> Option<&Query> {
        self.next_query.as_ref()
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    pub fn items(&self) -> &[C::Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<C::Item> {
        self.items
    }

    fn require_next(&self) -> Result<Query, CloudError> {
        self.next_query
            .as_ref()
            .map(Query::duplicate)
            .ok_or_else(|| {
                CloudError::InvalidOperation("End of the page. no more results.".into())
            })
    }

    /// Fetch the next page from the collection that produced this one.
    pub fn get_next_page(&self, client: &CloudClient) -> Result<QueryResult<C>, CloudError> {
        let next = self.require_next()?;
        debug!(
            event = "Query",
            phase = "NextPage",
            pagination_key = next.pagination_key()
        );
        self.collection.execute_query(client, &next)
    }

    /// Callback form of [`QueryResult::get_next_page`]. On the last page the
    /// callback receives `InvalidOperation` and nothing is sent.
    pub fn get_next_page_async<F>(&self, client: &CloudClient, callback: F)
    where
        F: FnOnce(Result<QueryResult<C>, CloudError>) + Send + 'static,
    {
        let collection = self.collection.clone();
        let next = self.require_next();
        let worker = client.clone();
        client.spawn_completion(
            move || collection.execute_query(&worker, &next?),
            callback,
        );
    }
}

impl<C: Collection> Clone for QueryResult<C> {
    fn clone(&self) -> Self {
        QueryResult {
            items: self.items.clone(),
            next_query: self.next_query.as_ref().map(Query::duplicate),
            collection: self.collection.clone(),
        }
    }
}

impl<C: Collection> Deref for QueryResult<C> {
    type Target = [C::Item];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl<C: Collection> IntoIterator for QueryResult<C> {
    type Item = C::Item;
    type IntoIter = std::vec::IntoIter<C::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
