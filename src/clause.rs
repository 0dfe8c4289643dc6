//! Filter clauses for bucket queries.
//!
//! A clause is a JSON predicate tree sent verbatim inside the query's
//! `bucketQuery`. This crate never interprets it.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum_macros::Display;

use crate::error::CloudError;

/// The server rejects `in` clauses with more values than this.
pub const MAX_IN_VALUES: usize = 200;

static ALL_CLAUSE: Lazy<Value> = Lazy::new(|| json!({ "type": "all" }));

/// Field types understood by [`Clause::has_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Integer,
    Decimal,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Clause(Value);

fn require_field(field: &str) -> Result<(), CloudError> {
    if field.is_empty() {
        return Err(CloudError::InvalidArgument(
            "field must not be an empty string".into(),
        ));
    }
    Ok(())
}

impl Clause {
    /// Matches every object.
    pub fn all() -> Self {
        Clause(ALL_CLAUSE.clone())
    }

    /// Wrap a clause tree produced elsewhere. Only objects are accepted.
    pub fn from_json(value: Value) -> Result<Self, CloudError> {
        if !value.is_object() {
            return Err(CloudError::InvalidArgument(format!(
                "clause must be a JSON object, got {value}"
            )));
        }
        Ok(Clause(value))
    }

    pub fn equals(field: &str, value: impl Into<Value>) -> Result<Self, CloudError> {
        require_field(field)?;
        Ok(Clause(json!({
            "type": "eq",
            "field": field,
            "value": value.into(),
        })))
    }

    pub fn not_equals(field: &str, value: impl Into<Value>) -> Result<Self, CloudError> {
        Ok(Clause::not(Clause::equals(field, value)?))
    }

    pub fn greater_than(field: &str, value: impl Into<Value>) -> Result<Self, CloudError> {
        Self::lower_bound(field, value.into(), false)
    }

    pub fn greater_than_or_equal(field: &str, value: impl Into<Value>) -> Result<Self, CloudError> {
        Self::lower_bound(field, value.into(), true)
    }

    pub fn less_than(field: &str, value: impl Into<Value>) -> Result<Self, CloudError> {
        Self::upper_bound(field, value.into(), false)
    }

    pub fn less_than_or_equal(field: &str, value: impl Into<Value>) -> Result<Self, CloudError> {
        Self::upper_bound(field, value.into(), true)
    }

    fn lower_bound(field: &str, value: Value, included: bool) -> Result<Self, CloudError> {
        require_field(field)?;
        Ok(Clause(json!({
            "type": "range",
            "field": field,
            "lowerLimit": value,
            "lowerIncluded": included,
        })))
    }

    fn upper_bound(field: &str, value: Value, included: bool) -> Result<Self, CloudError> {
        require_field(field)?;
        Ok(Clause(json!({
            "type": "range",
            "field": field,
            "upperLimit": value,
            "upperIncluded": included,
        })))
    }

    /// Matches when the field equals one of `values`.
    pub fn in_values<V: Into<Value>>(
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self, CloudError> {
        require_field(field)?;
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(CloudError::InvalidArgument(
                "in clause needs at least one value".into(),
            ));
        }
        if values.len() > MAX_IN_VALUES {
            return Err(CloudError::InvalidArgument(format!(
                "in clause accepts at most {MAX_IN_VALUES} values, got {}",
                values.len()
            )));
        }
        Ok(Clause(json!({
            "type": "in",
            "field": field,
            "values": values,
        })))
    }

    pub fn starts_with(field: &str, prefix: &str) -> Result<Self, CloudError> {
        require_field(field)?;
        Ok(Clause(json!({
            "type": "prefix",
            "field": field,
            "prefix": prefix,
        })))
    }

    pub fn has_field(field: &str, field_type: FieldType) -> Result<Self, CloudError> {
        require_field(field)?;
        Ok(Clause(json!({
            "type": "hasField",
            "field": field,
            "fieldType": field_type.to_string(),
        })))
    }

    pub fn not(clause: Clause) -> Self {
        Clause(json!({ "type": "not", "clause": clause.0 }))
    }

    /// All of `clauses`; a single clause is returned unchanged.
    pub fn and(clauses: Vec<Clause>) -> Result<Self, CloudError> {
        Self::combine("and", clauses)
    }

    /// Any of `clauses`; a single clause is returned unchanged.
    pub fn or(clauses: Vec<Clause>) -> Result<Self, CloudError> {
        Self::combine("or", clauses)
    }

    fn combine(kind: &str, mut clauses: Vec<Clause>) -> Result<Self, CloudError> {
        match clauses.len() {
            0 => Err(CloudError::InvalidArgument(format!(
                "{kind} clause needs at least one clause"
            ))),
            1 => Ok(clauses.remove(0)),
            _ => {
                let inner: Vec<Value> = clauses.into_iter().map(|c| c.0).collect();
                Ok(Clause(json!({ "type": kind, "clauses": inner })))
            }
        }
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

impl Default for Clause {
    fn default() -> Self {
        Clause::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[test]
    fn test_all_clause() {
        assert_eq!(Clause::all().as_json(), &json!({ "type": "all" }));
        assert_eq!(Clause::default(), Clause::all());
    }

    #[test]
    fn test_not_equals_wraps_equals() {
        let clause = Clause::not_equals("name", "bob").unwrap();
        assert_eq!(
            clause.as_json(),
            &json!({
                "type": "not",
                "clause": { "type": "eq", "field": "name", "value": "bob" }
            })
        );
    }

    #[test]
    fn test_range_clauses() {
        assert_eq!(
            Clause::greater_than_or_equal("score", 10).unwrap().as_json(),
            &json!({ "type": "range", "field": "score", "lowerLimit": 10, "lowerIncluded": true })
        );
        assert_eq!(
            Clause::less_than("score", 2.5).unwrap().as_json(),
            &json!({ "type": "range", "field": "score", "upperLimit": 2.5, "upperIncluded": false })
        );
    }

    #[test]
    fn test_and_with_single_clause_is_identity() {
        let eq = Clause::equals("a", 1).unwrap();
        assert_eq!(Clause::and(vec![eq.clone()]).unwrap(), eq);
    }

    #[test]
    fn test_or_combines() {
        let clause = Clause::or(vec![
            Clause::equals("a", 1).unwrap(),
            Clause::starts_with("b", "x").unwrap(),
        ])
        .unwrap();
        insta::with_settings!({sort_maps => true}, {
            insta::assert_json_snapshot!(clause, @r#"
            {
              "clauses": [
                {
                  "field": "a",
                  "type": "eq",
                  "value": 1
                },
                {
                  "field": "b",
                  "prefix": "x",
                  "type": "prefix"
                }
              ],
              "type": "or"
            }
            "#);
        });
    }

    #[test]
    fn test_has_field() {
        let clause = Clause::has_field("age", FieldType::Integer).unwrap();
        assert_eq!(clause.as_json()["fieldType"], json!("INTEGER"));
    }

    #[parameterized(
        empty_field_equals = { Clause::equals("", 1) },
        empty_field_prefix = { Clause::starts_with("", "a") },
        empty_in = { Clause::in_values("a", Vec::<i64>::new()) },
        too_many_in = { Clause::in_values("a", 0..(MAX_IN_VALUES as i64 + 1)) },
        empty_and = { Clause::and(vec![]) },
        empty_or = { Clause::or(vec![]) },
        non_object_json = { Clause::from_json(json!([1, 2])) },
    )]
    fn test_invalid_clauses(result: Result<Clause, CloudError>) {
        assert!(matches!(result, Err(CloudError::InvalidArgument(_))));
    }

    #[test]
    fn test_in_values_at_limit() {
        let clause = Clause::in_values("a", 0..(MAX_IN_VALUES as i64)).unwrap();
        assert_eq!(clause.as_json()["values"].as_array().unwrap().len(), MAX_IN_VALUES);
    }
}
