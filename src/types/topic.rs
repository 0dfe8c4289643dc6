use crate::acl::AclEntry;
use crate::client::CloudClient;
use crate::error::CloudError;
use crate::traits::AccessControllable;

use super::action::TopicAction;
use super::scope::Scope;

/// A push-messaging topic. Like a bucket it is addressed by a stable name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    scope: Scope,
    name: String,
}

impl Topic {
    pub fn new(scope: Scope, name: impl Into<String>) -> Result<Self, CloudError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CloudError::InvalidArgument(
                "topic name must not be empty".into(),
            ));
        }
        scope.validate()?;
        Ok(Topic { scope, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn url(&self, client: &CloudClient) -> String {
        self.scope.resource_url(client, "topics", &self.name)
    }

    pub fn acl(&self) -> AclEntry<Topic> {
        AclEntry::new(self.clone())
    }

    pub fn acl_for(&self, action: TopicAction) -> AclEntry<Topic> {
        AclEntry::scoped(self.clone(), action)
    }
}

impl AccessControllable for Topic {
    type Action = TopicAction;

    fn parent_id(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn parent_url(&self, client: &CloudClient) -> Result<String, CloudError> {
        Ok(self.url(client))
    }
}
