//! The transport contract this crate drives.
//!
//! Requests are created by an [`HttpClientFactory`] and sent once. The
//! transport reports every HTTP status as a response; classifying non-2xx
//! statuses into [`CloudError`] happens in [`crate::CloudClient`].

use std::collections::BTreeMap;

use strum_macros::{Display, EnumString};

use crate::error::CloudError;

/// Content type of a query request body.
pub const QUERY_CONTENT_TYPE: &str = "application/vnd.kii.QueryRequest+json";

/// Content type of a plain JSON body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

/// Creates one request per remote call.
pub trait HttpClientFactory: Send + Sync {
    fn create(
        &self,
        url: &str,
        app_id: &str,
        app_key: &str,
        method: HttpMethod,
    ) -> Box<dyn HttpRequest>;
}

/// A single, not yet sent request.
pub trait HttpRequest: Send {
    fn set_content_type(&mut self, content_type: &str);

    fn set_header(&mut self, name: &str, value: &str);

    /// Send the request. Network failures are `Err`; any HTTP status,
    /// successful or not, is `Ok`.
    fn send(self: Box<Self>, body: Option<String>) -> Result<HttpResponse, CloudError>;
}

/// A response as seen by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    headers: BTreeMap<String, String>,
    body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Header names are stored lowercased.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}
