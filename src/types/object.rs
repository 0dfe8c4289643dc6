//! Objects stored in a bucket.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::acl::AclEntry;
use crate::client::{CloudClient, url_path};
use crate::error::CloudError;
use crate::http::{HttpMethod, JSON_CONTENT_TYPE};
use crate::traits::AccessControllable;

use super::action::ObjectAction;
use super::bucket::Bucket;
use super::typed_id::ObjectId;

static OBJECT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]{2,100}$").expect("object id pattern is valid"));

const ID_KEY: &str = "_id";
const CREATED_KEY: &str = "_created";
const MODIFIED_KEY: &str = "_modified";
const VERSION_KEY: &str = "_version";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveResponse {
    #[serde(rename = "objectID", default)]
    object_id: Option<String>,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    modified_at: Option<i64>,
}

/// A JSON document in a bucket.
///
/// An object built locally has no id until it is saved. Its ACL can only be
/// edited once it exists remotely, so saving an ACL entry for an unsaved
/// object saves the object first.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudObject {
    bucket: Bucket,
    id: Option<ObjectId>,
    fields: Map<String, Value>,
    created_at: Option<i64>,
    modified_at: Option<i64>,
    version: Option<String>,
}

pub(crate) fn validate_object_id(id: &str) -> Result<(), CloudError> {
    if OBJECT_ID.is_match(id) {
        Ok(())
    } else {
        Err(CloudError::InvalidArgument(format!("invalid object id '{id}'")))
    }
}

fn take_i64(fields: &mut Map<String, Value>, key: &str) -> Result<Option<i64>, CloudError> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            CloudError::FormatError(format!("'{key}' is not an integer: {value}"))
        }),
    }
}

impl CloudObject {
    /// A local object without an id.
    pub fn new(bucket: Bucket) -> Self {
        CloudObject {
            bucket,
            id: None,
            fields: Map::new(),
            created_at: None,
            modified_at: None,
            version: None,
        }
    }

    /// A reference to an object with a known id. Saving it replaces the
    /// remote object with this one's fields.
    pub fn with_id(bucket: Bucket, id: impl Into<String>) -> Result<Self, CloudError> {
        let id = id.into();
        validate_object_id(&id)?;
        let mut object = CloudObject::new(bucket);
        object.id = Some(ObjectId::new(id));
        Ok(object)
    }

    /// Decode an object from a query result entry. `_id` is required; the
    /// other metadata keys are optional.
    pub fn from_json(bucket: Bucket, value: Value) -> Result<Self, CloudError> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(CloudError::FormatError(format!(
                    "object entry is not a JSON object: {other}"
                )));
            }
        };

        let id = match fields.remove(ID_KEY) {
            Some(Value::String(id)) if !id.is_empty() => ObjectId::new(id),
            _ => {
                return Err(CloudError::FormatError(format!(
                    "object entry without '{ID_KEY}'"
                )));
            }
        };
        let created_at = take_i64(&mut fields, CREATED_KEY)?;
        let modified_at = take_i64(&mut fields, MODIFIED_KEY)?;
        let version = match fields.remove(VERSION_KEY) {
            Some(Value::String(version)) => Some(version),
            Some(Value::Number(number)) => Some(number.to_string()),
            _ => None,
        };

        Ok(CloudObject {
            bucket,
            id: Some(id),
            fields,
            created_at,
            modified_at,
            version,
        })
    }

    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    pub fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    pub fn created_at(&self) -> Option<i64> {
        self.created_at
    }

    pub fn modified_at(&self) -> Option<i64> {
        self.modified_at
    }

    /// The server's version tag of the last seen state.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// `<bucketUrl>/objects/<id>`. Fails for an object that has not been saved.
    pub fn url(&self, client: &CloudClient) -> Result<String, CloudError> {
        let id = self.id.as_ref().ok_or_else(|| {
            CloudError::InvalidState("object has no id; save it first".into())
        })?;
        Ok(url_path(&[
            self.bucket.url(client).as_str(),
            "objects",
            id.id(),
        ]))
    }

    pub fn acl(&self) -> AclEntry<CloudObject> {
        AclEntry::new(self.clone())
    }

    pub fn acl_for(&self, action: ObjectAction) -> AclEntry<CloudObject> {
        AclEntry::scoped(self.clone(), action)
    }

    /// Create the object when it has no id, replace it otherwise.
    pub fn save(&mut self, client: &CloudClient) -> Result<(), CloudError> {
        let (method, url) = match &self.id {
            None => (
                HttpMethod::Post,
                url_path(&[self.bucket.url(client).as_str(), "objects"]),
            ),
            Some(_) => (HttpMethod::Put, self.url(client)?),
        };

        let mut request = client.request(&url, method);
        request.set_content_type(JSON_CONTENT_TYPE);
        let body = Value::Object(self.fields.clone()).to_string();
        let response = client.send(request, method, &url, Some(body))?;
        let saved: SaveResponse = serde_json::from_str(response.body())?;

        if self.id.is_none() {
            let object_id = saved.object_id.ok_or_else(|| {
                CloudError::FormatError("create response without 'objectID'".into())
            })?;
            validate_object_id(&object_id).map_err(|_| {
                CloudError::FormatError(format!("server returned invalid object id '{object_id}'"))
            })?;
            self.id = Some(ObjectId::new(object_id));
        }
        if let Some(created_at) = saved.created_at {
            self.created_at = Some(created_at);
        }
        self.modified_at = saved.modified_at.or(self.created_at);
        if let Some(etag) = response.header("ETag") {
            self.version = Some(etag.to_string());
        }

        info!(
            event = "Object",
            phase = "Saved",
            bucket = self.bucket.name(),
            id = self.id.as_ref().map(|id| id.id())
        );
        Ok(())
    }

    /// Callback form of [`CloudObject::save`]; the callback gets the saved object.
    pub fn save_async<F>(self, client: &CloudClient, callback: F)
    where
        F: FnOnce(Result<CloudObject, CloudError>) + Send + 'static,
    {
        let worker = client.clone();
        let mut object = self;
        client.spawn_completion(
            move || {
                object.save(&worker)?;
                Ok(object)
            },
            callback,
        );
    }
}

impl AccessControllable for CloudObject {
    type Action = ObjectAction;

    fn parent_id(&self) -> Option<String> {
        self.id.as_ref().map(|id| id.id().to_string())
    }

    fn parent_url(&self, client: &CloudClient) -> Result<String, CloudError> {
        self.url(client)
    }

    fn ensure_persisted(&mut self, client: &CloudClient) -> Result<(), CloudError> {
        if self.id.is_none() {
            debug!(event = "Acl", phase = "PersistParent", bucket = self.bucket.name());
            self.save(client)?;
        }
        Ok(())
    }
}
