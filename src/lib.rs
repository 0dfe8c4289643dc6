// src/lib.rs
pub use acl::AclEntry;
pub use clause::{Clause, FieldType, MAX_IN_VALUES};
pub use client::{CloudClient, url_path};
pub use config::{CloudConfig, Site};
pub use error::CloudError;
pub use http::{HttpClientFactory, HttpMethod, HttpRequest, HttpResponse};
pub use query::Query;
pub use query_result::QueryResult;
#[cfg(feature = "reqwest")]
pub use reqwest_client::ReqwestClientFactory;
pub use traits::{AccessControllable, AclAction, Collection};
pub use types::{
    ANONYMOUS_USER, ANY_AUTHENTICATED_USER, AclOperation, Bucket, BucketAction, CloudObject,
    GroupId, ObjectAction, ObjectId, Scope, Subject, Topic, TopicAction, TypedId, UserId,
};

mod acl;
mod clause;
mod client;
mod config;
mod error;
pub mod http;
mod query;
mod query_result;
#[cfg(feature = "reqwest")]
mod reqwest_client;
mod timers;
mod traits;
pub mod types;
