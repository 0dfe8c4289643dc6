//! Identities that can be named as the grantee of an ACL entry.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CloudError;

use super::typed_id::{GroupId, UserId};

const USER_PREFIX: &str = "UserID";
const GROUP_PREFIX: &str = "GroupID";
const ANONYMOUS_USER_ID: &str = "ANONYMOUS_USER";
const ANY_AUTHENTICATED_USER_ID: &str = "ANY_AUTHENTICATED_USER";

/// A grantee for an ACL entry.
///
/// Every variant renders into its own prefix namespace, so two different
/// subjects never share a wire string:
/// - `User`: `UserID:<id>`
/// - `AnonymousUser`: `UserID:ANONYMOUS_USER`
/// - `AnyAuthenticatedUser`: `UserID:ANY_AUTHENTICATED_USER`
/// - `Group`: `GroupID:<id>`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub enum Subject {
    User(UserId),
    AnonymousUser,
    AnyAuthenticatedUser,
    Group(GroupId),
}

/// Anyone, signed in or not.
pub static ANONYMOUS_USER: Subject = Subject::AnonymousUser;

/// Any user holding a valid access token.
pub static ANY_AUTHENTICATED_USER: Subject = Subject::AnyAuthenticatedUser;

impl Subject {
    pub fn user(id: impl Into<UserId>) -> Self {
        Subject::User(id.into())
    }

    pub fn group(id: impl Into<GroupId>) -> Self {
        Subject::Group(id.into())
    }

    pub fn anonymous() -> &'static Subject {
        &ANONYMOUS_USER
    }

    pub fn any_authenticated() -> &'static Subject {
        &ANY_AUTHENTICATED_USER
    }

    /// The wire string used in ACL addresses.
    pub fn render(&self) -> String {
        match self {
            Subject::User(id) => id.fmt_prefixed(USER_PREFIX),
            Subject::AnonymousUser => format!("{USER_PREFIX}:{ANONYMOUS_USER_ID}"),
            Subject::AnyAuthenticatedUser => format!("{USER_PREFIX}:{ANY_AUTHENTICATED_USER_ID}"),
            Subject::Group(id) => id.fmt_prefixed(GROUP_PREFIX),
        }
    }

    /// User and group subjects need a non-empty id.
    pub fn validate(&self) -> Result<(), CloudError> {
        let empty = match self {
            Subject::User(id) => id.is_empty(),
            Subject::Group(id) => id.is_empty(),
            Subject::AnonymousUser | Subject::AnyAuthenticatedUser => false,
        };
        if empty {
            return Err(CloudError::InvalidArgument(format!(
                "subject '{self}' has an empty id"
            )));
        }
        Ok(())
    }

    /// Map a bare user id from an ACL listing; the environment subjects are
    /// matched case-insensitively.
    pub(crate) fn from_user_id(user_id: &str) -> Self {
        if user_id.eq_ignore_ascii_case(ANONYMOUS_USER_ID) {
            Subject::AnonymousUser
        } else if user_id.eq_ignore_ascii_case(ANY_AUTHENTICATED_USER_ID) {
            Subject::AnyAuthenticatedUser
        } else {
            Subject::user(user_id)
        }
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.render())
    }
}

impl FromStr for Subject {
    type Err = CloudError;

    /// Parse a rendered subject, e.g. `UserID:alice` or `GroupID:devs`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, id) = s.split_once(':').ok_or_else(|| {
            CloudError::FormatError(format!(
                "Failed to parse subject '{s}' (expected format: UserID:<id> or GroupID:<id>)"
            ))
        })?;

        if id.is_empty() {
            return Err(CloudError::FormatError(format!(
                "Failed to parse subject '{s}': empty id"
            )));
        }

        match prefix {
            USER_PREFIX => Ok(Subject::from_user_id(id)),
            GROUP_PREFIX => Ok(Subject::group(id)),
            other => Err(CloudError::FormatError(format!(
                "Failed to parse subject: unexpected prefix '{other}' in '{s}'"
            ))),
        }
    }
}

impl From<UserId> for Subject {
    fn from(id: UserId) -> Self {
        Subject::User(id)
    }
}

impl From<GroupId> for Subject {
    fn from(id: GroupId) -> Self {
        Subject::Group(id)
    }
}

impl From<&Subject> for Subject {
    fn from(subject: &Subject) -> Self {
        subject.clone()
    }
}
