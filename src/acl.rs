//! The generic ACL engine.
//!
//! One algorithm serves every resource kind. A kind plugs in through
//! [`AccessControllable`], which supplies its action vocabulary, how to
//! address it, and whether it must be persisted before it can be referenced.
//!
//! Wire protocol:
//! - grant: `PUT <parentUrl>/acl/<ACTION>/<subject>` with an empty body
//! - revoke: `DELETE <parentUrl>/acl/<ACTION>/<subject>`
//! - list: `GET <parentUrl>/acl`, answered with an object mapping each action
//!   name to its subjects, e.g. `{"READ_EXISTING_OBJECT": [{"userID": "alice"}]}`

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::{CloudClient, url_path};
use crate::error::CloudError;
use crate::http::HttpMethod;
use crate::traits::{AccessControllable, AclAction};
use crate::types::{AclOperation, Subject};

/// One `(resource, action, subject)` binding.
///
/// An entry obtained from a resource's `acl()` is unscoped and can only list.
/// [`AclEntry::with_action`] scopes it to one action; a subject is attached
/// with [`AclEntry::with_subject`] before saving.
#[derive(Debug, Clone)]
pub struct AclEntry<R: AccessControllable> {
    parent: R,
    action: Option<R::Action>,
    subject: Option<Subject>,
}

/// A listed subject, either as an entry object or as a rendered string.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireSubject {
    User {
        #[serde(rename = "userID")]
        user_id: String,
    },
    Group {
        #[serde(rename = "groupID")]
        group_id: String,
    },
    Rendered(String),
}

impl WireSubject {
    fn into_subject(self) -> Result<Subject, CloudError> {
        match self {
            WireSubject::User { user_id } if !user_id.is_empty() => {
                Ok(Subject::from_user_id(&user_id))
            }
            WireSubject::Group { group_id } if !group_id.is_empty() => {
                Ok(Subject::group(group_id))
            }
            WireSubject::Rendered(rendered) => rendered.parse(),
            _ => Err(CloudError::FormatError(
                "ACL subject with an empty id".into(),
            )),
        }
    }
}

impl<R: AccessControllable> AclEntry<R> {
    /// An unscoped entry, used for listing.
    pub fn new(parent: R) -> Self {
        AclEntry {
            parent,
            action: None,
            subject: None,
        }
    }

    /// An entry scoped to `action`.
    pub fn scoped(parent: R, action: R::Action) -> Self {
        AclEntry {
            parent,
            action: Some(action),
            subject: None,
        }
    }

    /// A new entry for the same resource scoped to `action`. The receiver is
    /// left as it is, and no subject is carried over.
    pub fn with_action(&self, action: R::Action) -> Self {
        AclEntry::scoped(self.parent.clone(), action)
    }

    pub fn with_subject(mut self, subject: impl Into<Subject>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn parent(&self) -> &R {
        &self.parent
    }

    pub fn action(&self) -> Option<R::Action> {
        self.action
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    /// The resource this entry belongs to. After a save it reflects any
    /// persistence the save performed, such as a freshly assigned object id.
    pub fn into_parent(self) -> R {
        self.parent
    }

    fn bound(&self) -> Result<(R::Action, &Subject), CloudError> {
        match (self.action, self.subject.as_ref()) {
            (Some(action), Some(subject)) => {
                subject.validate()?;
                Ok((action, subject))
            }
            (None, _) => Err(CloudError::InvalidState(
                "ACL entry has no action to save".into(),
            )),
            (_, None) => Err(CloudError::InvalidState(
                "ACL entry has no subject to save".into(),
            )),
        }
    }

    /// Grant or revoke this entry on the server.
    ///
    /// The action and the subject must both be set. A resource that does not
    /// exist remotely yet is persisted first when its kind allows it.
    pub fn save(&mut self, client: &CloudClient, operation: AclOperation) -> Result<(), CloudError> {
        self.bound()?;
        self.parent.ensure_persisted(client)?;
        if !has_identity(&self.parent) {
            return Err(CloudError::InvalidState(
                "ACL parent has no identity; save it first".into(),
            ));
        }

        let (action, subject) = self.bound()?;
        let url = url_path(&[
            self.parent.parent_url(client)?.as_str(),
            "acl",
            action.wire_name(),
            subject.render().as_str(),
        ]);
        let method = match operation {
            AclOperation::Grant => HttpMethod::Put,
            AclOperation::Revoke => HttpMethod::Delete,
        };

        debug!(
            event = "Acl",
            phase = "Save",
            kind = <R::Action as AclAction>::KIND,
            operation = %operation,
            action = action.wire_name(),
            subject = %subject
        );

        let request = client.request(&url, method);
        client.send(request, method, &url, None).inspect_err(|e| {
            warn!(event = "Acl", phase = "SaveFailed", operation = %operation, error = %e);
        })?;
        Ok(())
    }

    /// Callback form of [`AclEntry::save`].
    ///
    /// The callback always gets the entry back next to the outcome, so a
    /// parent persisted by the save is never lost even when the ACL request
    /// itself fails.
    pub fn save_async<F>(self, client: &CloudClient, operation: AclOperation, callback: F)
    where
        F: FnOnce(AclEntry<R>, Result<(), CloudError>) + Send + 'static,
    {
        let worker = client.clone();
        let untouched = self.clone();
        let mut entry = self;
        client.spawn_outcome(
            move || {
                let result = entry.save(&worker, operation);
                (entry, result)
            },
            move |error| (untouched, Err(error)),
            move |(entry, result)| callback(entry, result),
        );
    }

    /// Fetch the full ACL of the resource. Each listed binding comes back as
    /// a scoped entry with its subject set, ready to be revoked.
    ///
    /// Any action name outside the resource's vocabulary, or any subject that
    /// cannot be decoded, fails the whole listing.
    pub fn list_entries(&self, client: &CloudClient) -> Result<Vec<AclEntry<R>>, CloudError> {
        if self.action.is_some() {
            return Err(CloudError::InvalidOperation(
                "only an unscoped ACL entry can list entries".into(),
            ));
        }
        if !has_identity(&self.parent) {
            return Err(CloudError::InvalidOperation(
                "the resource does not exist in the cloud".into(),
            ));
        }

        let url = url_path(&[self.parent.parent_url(client)?.as_str(), "acl"]);
        debug!(
            event = "Acl",
            phase = "List",
            kind = <R::Action as AclAction>::KIND,
            url = url.as_str()
        );

        let request = client.request(&url, HttpMethod::Get);
        let response = client.send(request, HttpMethod::Get, &url, None)?;
        let entries = self.decode_listing(response.body())?;

        debug!(event = "Acl", phase = "Listed", count = entries.len());
        Ok(entries)
    }

    /// Callback form of [`AclEntry::list_entries`].
    pub fn list_entries_async<F>(&self, client: &CloudClient, callback: F)
    where
        F: FnOnce(Result<Vec<AclEntry<R>>, CloudError>) + Send + 'static,
    {
        let entry = self.clone();
        let worker = client.clone();
        client.spawn_completion(move || entry.list_entries(&worker), callback);
    }

    fn decode_listing(&self, body: &str) -> Result<Vec<AclEntry<R>>, CloudError> {
        let listing: BTreeMap<String, Vec<WireSubject>> = serde_json::from_str(body)?;
        let mut entries = Vec::new();
        for (name, subjects) in listing {
            let action = R::Action::from_wire_name(&name)?;
            for subject in subjects {
                entries.push(self.with_action(action).with_subject(subject.into_subject()?));
            }
        }
        Ok(entries)
    }
}

fn has_identity<R: AccessControllable>(parent: &R) -> bool {
    parent.parent_id().is_some_and(|id| !id.is_empty())
}
