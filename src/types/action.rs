//! Per-resource action vocabularies for ACL entries.
//!
//! Each resource kind owns a closed set of actions. The wire name of an
//! action is its `SCREAMING_SNAKE_CASE` spelling, and the mapping is a
//! bijection within a vocabulary; values are never shared across kinds.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use utoipa::ToSchema;

use crate::traits::AclAction;

/// Actions that can be granted on a bucket.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BucketAction {
    QueryObjectsInBucket,
    CreateObjectsInBucket,
    DropBucketWithAllContent,
    ReadObjectsInBucket,
}

impl AclAction for BucketAction {
    const KIND: &'static str = "bucket";
}

/// Actions that can be granted on a single stored object.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectAction {
    ReadExistingObject,
    WriteExistingObject,
}

impl AclAction for ObjectAction {
    const KIND: &'static str = "object";
}

/// Actions that can be granted on a push topic.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicAction {
    SendMessageToTopic,
    SubscribeToTopic,
}

impl AclAction for TopicAction {
    const KIND: &'static str = "topic";
}

/// Whether a save adds or removes the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AclOperation {
    Grant,
    Revoke,
}
