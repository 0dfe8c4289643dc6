//! Identifiers tagged with the kind of entity they name.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Marker type for users
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum UserMarker {}

/// Marker type for groups
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum GroupMarker {}

/// Marker type for stored objects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ObjectMarker {}

/// A server-assigned identifier, with zero runtime cost over `String`.
///
/// The marker keeps a group id from being passed where a user id is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct TypedId<T> {
    id: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> TypedId<T> {
    pub fn new(id: impl Into<String>) -> Self {
        TypedId {
            id: id.into(),
            _marker: PhantomData,
        }
    }

    /// Get the raw id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Render as `<prefix>:<id>`, the form used in ACL addresses.
    pub fn fmt_prefixed(&self, prefix: &str) -> String {
        format!("{prefix}:{}", self.id)
    }
}

impl<T> Display for TypedId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.id)
    }
}

impl<T> From<&str> for TypedId<T> {
    fn from(id: &str) -> Self {
        TypedId::new(id)
    }
}

impl<T> From<String> for TypedId<T> {
    fn from(id: String) -> Self {
        TypedId::new(id)
    }
}

/// A user's id.
pub type UserId = TypedId<UserMarker>;

/// A group's id.
pub type GroupId = TypedId<GroupMarker>;

/// A stored object's id.
pub type ObjectId = TypedId<ObjectMarker>;
