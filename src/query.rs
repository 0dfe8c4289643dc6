//! Bucket queries.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;
use serde_json::Value;

use crate::clause::Clause;
use crate::error::CloudError;

/// A filter, an optional sort key and an optional result-count hint over a
/// collection, plus the continuation token of the page it asks for.
///
/// The token is opaque and only ever set by the crate when deriving the query
/// for the next page, so a query held by the caller always asks for a first
/// page.
#[derive(Debug, PartialEq)]
pub struct Query {
    clause: Clause,
    order_by: Option<String>,
    descending: bool,
    limit: u32,
    pagination_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    bucket_query: BucketQuery<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    best_effort_limit: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BucketQuery<'a> {
    clause: &'a Clause,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_by: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    descending: Option<bool>,
}

impl Query {
    /// A query filtering with `clause`; `None` matches everything.
    pub fn new(clause: Option<Clause>) -> Self {
        Query {
            clause: clause.unwrap_or_else(Clause::all),
            order_by: None,
            descending: false,
            limit: 0,
            pagination_key: None,
        }
    }

    /// Matches every object.
    pub fn all() -> Self {
        Query::new(None)
    }

    /// Sort ascending by `key`, replacing any previous sort.
    pub fn sort_by_asc(&mut self, key: &str) -> Result<(), CloudError> {
        self.sort_by(key, false)
    }

    /// Sort descending by `key`, replacing any previous sort.
    pub fn sort_by_desc(&mut self, key: &str) -> Result<(), CloudError> {
        self.sort_by(key, true)
    }

    fn sort_by(&mut self, key: &str, descending: bool) -> Result<(), CloudError> {
        if key.is_empty() {
            return Err(CloudError::InvalidArgument(
                "Empty key is not acceptable.".into(),
            ));
        }
        self.order_by = Some(key.to_string());
        self.descending = descending;
        Ok(())
    }

    /// Best-effort cap on the page size. The server may return fewer results,
    /// never more. Zero or negative values mean "server default".
    pub fn set_limit(&mut self, limit: i64) {
        self.limit = u32::try_from(limit.max(0)).unwrap_or(u32::MAX);
    }

    /// Builder form of [`Query::set_limit`].
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.set_limit(limit);
        self
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn clause(&self) -> &Clause {
        &self.clause
    }

    /// The active sort key and whether it is descending.
    pub fn sort(&self) -> Option<(&str, bool)> {
        self.order_by.as_deref().map(|key| (key, self.descending))
    }

    pub fn pagination_key(&self) -> Option<&str> {
        self.pagination_key.as_deref()
    }

    /// A copy of this query asking for the page behind `key`.
    pub(crate) fn with_pagination_key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.pagination_key = Some(key.into());
        next
    }

    /// An exact copy, continuation token included.
    pub(crate) fn duplicate(&self) -> Self {
        match self.pagination_key() {
            Some(key) => self.with_pagination_key(key),
            None => self.clone(),
        }
    }

    /// The wire object sent as the request body.
    pub fn to_json(&self) -> Result<Value, CloudError> {
        Ok(serde_json::to_value(self.wire())?)
    }

    fn wire(&self) -> QueryRequest<'_> {
        QueryRequest {
            bucket_query: BucketQuery {
                clause: &self.clause,
                order_by: self.order_by.as_deref(),
                descending: self.order_by.as_ref().map(|_| self.descending),
            },
            pagination_key: self.pagination_key.as_deref(),
            best_effort_limit: (self.limit > 0).then_some(self.limit),
        }
    }
}

/// Copies the filter, the sort and the limit. The continuation token is never
/// copied, so a clone always asks for a first page.
impl Clone for Query {
    fn clone(&self) -> Self {
        Query {
            clause: self.clause.clone(),
            order_by: self.order_by.clone(),
            descending: self.descending,
            limit: self.limit,
            pagination_key: None,
        }
    }
}

impl Default for Query {
    fn default() -> Self {
        Query::all()
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let json = serde_json::to_string(&self.wire()).map_err(|_| std::fmt::Error)?;
        write!(f, "{json}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use yare::parameterized;

    #[test]
    fn test_default_query_matches_all() {
        let query = Query::all();
        assert_eq!(
            query.to_json().unwrap(),
            json!({ "bucketQuery": { "clause": { "type": "all" } } })
        );
        assert_eq!(query.to_string(), r#"{"bucketQuery":{"clause":{"type":"all"}}}"#);
    }

    #[test]
    fn test_query_wire_object() {
        let mut query = Query::new(Some(Clause::equals("kind", "note").unwrap())).with_limit(10);
        query.sort_by_desc("_created").unwrap();
        let next = query.with_pagination_key("tok1");
        insta::with_settings!({sort_maps => true}, {
            insta::assert_json_snapshot!(next.to_json().unwrap(), @r#"
            {
              "bestEffortLimit": 10,
              "bucketQuery": {
                "clause": {
                  "field": "kind",
                  "type": "eq",
                  "value": "note"
                },
                "descending": true,
                "orderBy": "_created"
              },
              "paginationKey": "tok1"
            }
            "#);
        });
    }

    #[parameterized(
        negative = { -5, 0 },
        zero = { 0, 0 },
        positive = { 25, 25 },
    )]
    fn test_limit_normalization(limit: i64, expected: u32) {
        let query = Query::all().with_limit(limit);
        assert_eq!(query.limit(), expected);
        let wire = query.to_json().unwrap();
        if expected == 0 {
            assert!(wire.get("bestEffortLimit").is_none());
        } else {
            assert_eq!(wire["bestEffortLimit"], json!(expected));
        }
    }

    #[test]
    fn test_sort_replaces_previous_key() {
        let mut query = Query::all();
        query.sort_by_asc("name").unwrap();
        query.sort_by_desc("age").unwrap();
        assert_eq!(query.sort(), Some(("age", true)));
        let wire = query.to_json().unwrap();
        assert_eq!(wire["bucketQuery"]["orderBy"], json!("age"));
        assert_eq!(wire["bucketQuery"]["descending"], json!(true));
    }

    #[parameterized(
        ascending = { false },
        descending = { true },
    )]
    fn test_empty_sort_key_rejected(descending: bool) {
        let mut query = Query::all();
        let result = if descending {
            query.sort_by_desc("")
        } else {
            query.sort_by_asc("")
        };
        assert!(matches!(result, Err(CloudError::InvalidArgument(_))));
        assert_eq!(query.sort(), None);
    }

    #[test]
    fn test_clone_is_independent_of_original() {
        let mut original = Query::all();
        original.sort_by_asc("name").unwrap();

        let mut cloned = original.clone();
        cloned.sort_by_asc("score").unwrap();

        assert_eq!(original.to_json().unwrap()["bucketQuery"]["orderBy"], json!("name"));
        assert_eq!(cloned.to_json().unwrap()["bucketQuery"]["orderBy"], json!("score"));
    }

    #[test]
    fn test_clone_drops_pagination_key() {
        let next = Query::all().with_limit(3).with_pagination_key("tok1");
        assert_eq!(next.pagination_key(), Some("tok1"));

        let cloned = next.clone();
        assert_eq!(cloned.pagination_key(), None);
        assert_eq!(cloned.limit(), 3);
        assert!(cloned.to_json().unwrap().get("paginationKey").is_none());
    }

    #[test]
    fn test_descending_omitted_without_sort() {
        let wire = Query::all().to_json().unwrap();
        assert!(wire["bucketQuery"].get("descending").is_none());
        assert!(wire["bucketQuery"].get("orderBy").is_none());
    }
}
