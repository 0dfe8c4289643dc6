use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::client::{CloudClient, url_path};
use crate::error::CloudError;

use super::typed_id::{GroupId, UserId};

/// Who owns a bucket or a topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Scope {
    #[default]
    App,
    User(UserId),
    Group(GroupId),
}

impl Scope {
    pub fn user(id: impl Into<UserId>) -> Self {
        Scope::User(id.into())
    }

    pub fn group(id: impl Into<GroupId>) -> Self {
        Scope::Group(id.into())
    }

    /// The path segments between the app URL and the resource collection.
    fn segments(&self) -> [&str; 2] {
        match self {
            Scope::App => ["", ""],
            Scope::User(id) => ["users", id.id()],
            Scope::Group(id) => ["groups", id.id()],
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CloudError> {
        let empty = match self {
            Scope::App => false,
            Scope::User(id) => id.is_empty(),
            Scope::Group(id) => id.is_empty(),
        };
        if empty {
            return Err(CloudError::InvalidArgument(format!(
                "scope owner id must not be empty: {self:?}"
            )));
        }
        Ok(())
    }

    /// `<base>/apps/<appId>/[users/<id>/|groups/<id>/]<collection>/<name>`
    pub(crate) fn resource_url(&self, client: &CloudClient, collection: &str, name: &str) -> String {
        let app_url = client.app_url();
        let [kind, owner] = self.segments();
        url_path(&[app_url.as_str(), kind, owner, collection, name])
    }
}
