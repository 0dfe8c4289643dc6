use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use strum::IntoEnumIterator;

use crate::client::CloudClient;
use crate::error::CloudError;
use crate::query::Query;
use crate::query_result::QueryResult;

/// A closed set of actions belonging to exactly one resource kind.
pub trait AclAction:
    Copy
    + Eq
    + Hash
    + Debug
    + Display
    + FromStr
    + IntoEnumIterator
    + Into<&'static str>
    + Send
    + Sync
    + 'static
{
    /// The resource kind this vocabulary belongs to, used in error messages.
    const KIND: &'static str;

    /// The name sent on the wire, e.g. `CREATE_OBJECTS_IN_BUCKET`.
    fn wire_name(self) -> &'static str {
        self.into()
    }

    /// Map a wire name back to an action. Names outside the vocabulary are a
    /// contract mismatch with the server and are never coerced.
    fn from_wire_name(name: &str) -> Result<Self, CloudError> {
        Self::from_str(name).map_err(|_| {
            CloudError::FormatError(format!(
                "unexpected value '{name}' for {} action",
                Self::KIND
            ))
        })
    }

    /// Every action in the vocabulary.
    fn vocabulary() -> Vec<Self> {
        Self::iter().collect()
    }
}

/// A remote resource that carries its own access control list.
///
/// This is the capability record the generic ACL engine needs from a
/// resource kind: its vocabulary, how to address it, and whether it has to
/// be persisted before an entry can reference it.
pub trait AccessControllable: Clone + Debug + Send + Sync + 'static {
    type Action: AclAction;

    /// The server-side identity of the resource, `None` while it only exists locally.
    fn parent_id(&self) -> Option<String>;

    /// The absolute URL of the resource.
    fn parent_url(&self, client: &CloudClient) -> Result<String, CloudError>;

    /// Make sure the resource exists remotely. Resources addressed by a stable
    /// name have nothing to do.
    fn ensure_persisted(&mut self, _client: &CloudClient) -> Result<(), CloudError> {
        Ok(())
    }
}

/// A remote collection that can be queried page by page.
pub trait Collection: Clone + Debug + Send + Sync + 'static {
    type Item: Clone + Debug + Send + Sync + 'static;

    /// Run one page of `query` against the collection.
    fn execute_query(
        &self,
        client: &CloudClient,
        query: &Query,
    ) -> Result<QueryResult<Self>, CloudError>;

    /// Callback form of [`Collection::execute_query`].
    fn execute_query_async<F>(&self, client: &CloudClient, query: Query, callback: F)
    where
        F: FnOnce(Result<QueryResult<Self>, CloudError>) + Send + 'static,
    {
        let collection = self.clone();
        let worker = client.clone();
        client.spawn_completion(move || collection.execute_query(&worker, &query), callback);
    }
}
