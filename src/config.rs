//! Application configuration.
//!
//! A configuration names the application (`app_id`, `app_key`) and where its
//! backend lives, either as a [`Site`] or as an explicit `base_url`. It can be
//! built in code or loaded from JSON:
//!
//! ```rust
//! use kii_storage_core::CloudConfig;
//! let config = CloudConfig::from_json_str(r#"{"app_id": "app", "app_key": "key", "site": "JP"}"#).unwrap();
//! assert_eq!(config.base_url(), "https://api-jp.kii.com/api");
//! ```

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::CloudError;

/// Hosted backend regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Site {
    #[default]
    Us,
    Jp,
    Cn,
    Sg,
    Cn3,
    Eu,
}

impl Site {
    pub fn base_url(&self) -> &'static str {
        match self {
            Site::Us => "https://api.kii.com/api",
            Site::Jp => "https://api-jp.kii.com/api",
            Site::Cn => "https://api-cn2.kii.com/api",
            Site::Sg => "https://api-sg.kii.com/api",
            Site::Cn3 => "https://api-cn3.kii.com/api",
            Site::Eu => "https://api-eu.kii.com/api",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    pub app_id: String,
    pub app_key: String,
    #[serde(default)]
    pub site: Site,
    /// Overrides the site's URL, e.g. for a private deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl CloudConfig {
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>, site: Site) -> Self {
        CloudConfig {
            app_id: app_id.into(),
            app_key: app_key.into(),
            site,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, CloudError> {
        let config: CloudConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CloudError> {
        if self.app_id.is_empty() {
            return Err(CloudError::InvalidArgument("app_id must not be empty".into()));
        }
        if self.app_key.is_empty() {
            return Err(CloudError::InvalidArgument("app_key must not be empty".into()));
        }
        if matches!(&self.base_url, Some(url) if url.is_empty()) {
            return Err(CloudError::InvalidArgument("base_url must not be empty".into()));
        }
        Ok(())
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.site.base_url())
    }
}
