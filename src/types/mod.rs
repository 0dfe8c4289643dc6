//! Value types and the resource kinds that carry ACLs.
//!
//! Canonical string forms:
//! - Subject: `UserID:<id>`, `UserID:ANONYMOUS_USER`, `UserID:ANY_AUTHENTICATED_USER`, `GroupID:<id>`
//! - Action: the `SCREAMING_SNAKE_CASE` name, e.g. `READ_EXISTING_OBJECT`

mod action;
mod bucket;
mod object;
mod scope;
mod subject;
mod topic;
mod typed_id;

pub use action::{AclOperation, BucketAction, ObjectAction, TopicAction};
pub use bucket::Bucket;
pub use object::CloudObject;
pub use scope::Scope;
pub use subject::{ANONYMOUS_USER, ANY_AUTHENTICATED_USER, Subject};
pub use topic::Topic;
pub use typed_id::{GroupId, GroupMarker, ObjectId, ObjectMarker, TypedId, UserId, UserMarker};
