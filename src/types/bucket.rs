//! Buckets: named containers of objects.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::acl::AclEntry;
use crate::client::{CloudClient, url_path};
use crate::error::CloudError;
use crate::http::{HttpMethod, QUERY_CONTENT_TYPE};
use crate::query::Query;
use crate::query_result::QueryResult;
use crate::traits::{AccessControllable, Collection};

use super::action::BucketAction;
use super::object::CloudObject;
use super::scope::Scope;

static BUCKET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{2,64}$").expect("bucket name pattern is valid"));

const COUNT_FIELD: &str = "count_field";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    results: Vec<Value>,
    #[serde(default)]
    next_pagination_key: Option<String>,
}

#[derive(Deserialize)]
struct CountResponse {
    aggregations: CountAggregations,
}

#[derive(Deserialize)]
struct CountAggregations {
    count_field: u64,
}

/// A bucket, addressed by its scope and name. It needs no persistence step
/// before its ACL can be edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bucket {
    scope: Scope,
    name: String,
}

impl Bucket {
    pub fn new(scope: Scope, name: impl Into<String>) -> Result<Self, CloudError> {
        let name = name.into();
        if !BUCKET_NAME.is_match(&name) {
            return Err(CloudError::InvalidArgument(format!(
                "invalid bucket name '{name}'"
            )));
        }
        scope.validate()?;
        Ok(Bucket { scope, name })
    }

    /// An application-scope bucket.
    pub fn app(name: impl Into<String>) -> Result<Self, CloudError> {
        Bucket::new(Scope::App, name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn url(&self, client: &CloudClient) -> String {
        self.scope.resource_url(client, "buckets", &self.name)
    }

    /// A new object in this bucket, not yet saved.
    pub fn new_object(&self) -> CloudObject {
        CloudObject::new(self.clone())
    }

    pub fn acl(&self) -> AclEntry<Bucket> {
        AclEntry::new(self.clone())
    }

    pub fn acl_for(&self, action: BucketAction) -> AclEntry<Bucket> {
        AclEntry::scoped(self.clone(), action)
    }

    /// Run the first page of `query`.
    pub fn query(&self, client: &CloudClient, query: &Query) -> Result<QueryResult<Bucket>, CloudError> {
        self.execute_query(client, query)
    }

    pub fn query_async<F>(&self, client: &CloudClient, query: Query, callback: F)
    where
        F: FnOnce(Result<QueryResult<Bucket>, CloudError>) + Send + 'static,
    {
        self.execute_query_async(client, query, callback);
    }

    /// Count the objects matching `query`, or every object when `None`.
    /// Any continuation token on the query is ignored.
    pub fn count(&self, client: &CloudClient, query: Option<&Query>) -> Result<u64, CloudError> {
        let mut body = query.cloned().unwrap_or_default().to_json()?;
        body["bucketQuery"]["aggregations"] = json!([
            { "type": "COUNT", "putAggregationInto": COUNT_FIELD }
        ]);

        let url = self.query_url(client);
        let mut request = client.request(&url, HttpMethod::Post);
        request.set_content_type(QUERY_CONTENT_TYPE);
        debug!(event = "Query", phase = "Count", bucket = self.name.as_str());

        let response = client.send(request, HttpMethod::Post, &url, Some(body.to_string()))?;
        let parsed: CountResponse = serde_json::from_str(response.body())?;
        Ok(parsed.aggregations.count_field)
    }

    pub fn count_async<F>(&self, client: &CloudClient, query: Option<Query>, callback: F)
    where
        F: FnOnce(Result<u64, CloudError>) + Send + 'static,
    {
        let bucket = self.clone();
        let worker = client.clone();
        client.spawn_completion(move || bucket.count(&worker, query.as_ref()), callback);
    }

    fn query_url(&self, client: &CloudClient) -> String {
        url_path(&[self.url(client).as_str(), "query"])
    }
}

impl AccessControllable for Bucket {
    type Action = BucketAction;

    fn parent_id(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn parent_url(&self, client: &CloudClient) -> Result<String, CloudError> {
        Ok(self.url(client))
    }
}

impl Collection for Bucket {
    type Item = CloudObject;

    fn execute_query(
        &self,
        client: &CloudClient,
        query: &Query,
    ) -> Result<QueryResult<Self>, CloudError> {
        let url = self.query_url(client);
        let mut request = client.request(&url, HttpMethod::Post);
        request.set_content_type(QUERY_CONTENT_TYPE);
        debug!(
            event = "Query",
            phase = "Execute",
            bucket = self.name.as_str(),
            pagination_key = query.pagination_key()
        );

        let body = query.to_json()?.to_string();
        let response = client.send(request, HttpMethod::Post, &url, Some(body))?;
        let parsed: QueryResponse = serde_json::from_str(response.body())?;

        let items = parsed
            .results
            .into_iter()
            .map(|value| CloudObject::from_json(self.clone(), value))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            event = "Query",
            phase = "Page",
            bucket = self.name.as_str(),
            count = items.len(),
            has_next = parsed.next_pagination_key.is_some()
        );
        Ok(QueryResult::new(
            query,
            parsed.next_pagination_key,
            self.clone(),
            items,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mock::MockTransport;
    use yare::parameterized;

    #[parameterized(
        too_short = { "b" },
        bad_char = { "my bucket" },
        dot = { "a.b" },
        empty = { "" },
    )]
    fn test_invalid_bucket_names(name: &str) {
        assert!(matches!(Bucket::app(name), Err(CloudError::InvalidArgument(_))));
    }

    #[parameterized(
        short = { "b1" },
        dashes = { "my-bucket_2" },
    )]
    fn test_valid_bucket_names(name: &str) {
        assert_eq!(Bucket::app(name).unwrap().name(), name);
    }

    #[test]
    fn test_bucket_name_length_limit() {
        assert!(Bucket::app("x".repeat(64)).is_ok());
        assert!(Bucket::app("x".repeat(65)).is_err());
    }

    #[test]
    fn test_query_request_shape() {
        let transport = MockTransport::default();
        transport.reply(200, r#"{"results": []}"#);
        let client = transport.client();
        let bucket = Bucket::new(Scope::user("u1"), "notes").unwrap();

        let page = bucket.query(&client, &Query::all().with_limit(5)).unwrap();
        assert!(page.is_empty());
        assert!(!page.has_next());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(
            requests[0].url,
            "https://api.example.com/api/apps/app1/users/u1/buckets/notes/query"
        );
        assert_eq!(requests[0].content_type.as_deref(), Some(QUERY_CONTENT_TYPE));
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({ "bucketQuery": { "clause": { "type": "all" } }, "bestEffortLimit": 5 })
        );
    }

    #[test]
    fn test_query_decodes_objects() {
        let transport = MockTransport::default();
        transport.reply(
            200,
            r#"{
                "results": [
                    {"_id": "o1", "_created": 10, "_modified": 11, "_version": "1", "color": "red"},
                    {"_id": "o2", "_created": 20, "color": "blue"}
                ],
                "nextPaginationKey": "tok1"
            }"#,
        );
        let client = transport.client();
        let page = Bucket::app("b1").unwrap().query(&client, &Query::all()).unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id().map(|id| id.id()), Some("o1"));
        assert_eq!(page[0].created_at(), Some(10));
        assert_eq!(page[0].version(), Some("1"));
        assert_eq!(page[1].get("color"), Some(&json!("blue")));
        assert_eq!(page.next_query().unwrap().pagination_key(), Some("tok1"));
    }

    #[parameterized(
        not_json = { "nope" },
        missing_results = { r#"{"items": []}"# },
        result_without_id = { r#"{"results": [{"color": "red"}]}"# },
    )]
    fn test_query_rejects_malformed_response(body: &str) {
        let transport = MockTransport::default();
        transport.reply(200, body);
        let client = transport.client();
        let result = Bucket::app("b1").unwrap().query(&client, &Query::all());
        assert!(matches!(result, Err(CloudError::FormatError(_))));
    }

    #[test]
    fn test_count_adds_aggregation() {
        let transport = MockTransport::default();
        transport.reply(200, r#"{"aggregations": {"count_field": 42}}"#);
        let client = transport.client();
        let bucket = Bucket::app("b1").unwrap();

        let query = Query::new(Some(crate::Clause::equals("k", 1).unwrap()));
        assert_eq!(bucket.count(&client, Some(&query)).unwrap(), 42);

        let requests = transport.requests();
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        insta::with_settings!({sort_maps => true}, {
            insta::assert_json_snapshot!(body, @r#"
            {
              "bucketQuery": {
                "aggregations": [
                  {
                    "putAggregationInto": "count_field",
                    "type": "COUNT"
                  }
                ],
                "clause": {
                  "field": "k",
                  "type": "eq",
                  "value": 1
                }
              }
            }
            "#);
        });
    }

    #[test]
    fn test_count_ignores_continuation_token() {
        let transport = MockTransport::default();
        transport.reply(200, r#"{"aggregations": {"count_field": 9}}"#);
        let client = transport.client();

        let next_page = Query::all().with_limit(5).with_pagination_key("tok1");
        let count = Bucket::app("b1").unwrap().count(&client, Some(&next_page));
        assert_eq!(count, Ok(9));
        assert_eq!(next_page.pagination_key(), Some("tok1"));

        let requests = transport.requests();
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert!(body.get("paginationKey").is_none());
        assert_eq!(body["bestEffortLimit"], 5);
    }

    #[tokio::test]
    async fn test_count_async_without_query() {
        let transport = MockTransport::default();
        transport.reply(200, r#"{"aggregations": {"count_field": 3}}"#);
        let client = transport.client();

        let (tx, rx) = tokio::sync::oneshot::channel();
        Bucket::app("b1")
            .unwrap()
            .count_async(&client, None, move |result| tx.send(result).unwrap());

        assert_eq!(rx.await.unwrap(), Ok(3));
    }
}
