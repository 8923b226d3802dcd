//! Store configuration, passed as JSON by the host application.

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

pub const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_COMMENT_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Directory of the LMDB environment. Created on first open.
    pub storage_path: String,
    pub map_size_bytes: usize,
    pub likes_domain: String,
    pub comments_domain: String,
    pub max_comment_chars: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        PortalConfig {
            storage_path: "portal_store.lmdb".to_string(),
            map_size_bytes: DEFAULT_MAP_SIZE,
            likes_domain: "birthday_likes".to_string(),
            comments_domain: "birthday_comments".to_string(),
            max_comment_chars: DEFAULT_MAX_COMMENT_CHARS,
        }
    }
}

impl PortalConfig {
    /// Parses a config document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, AppResponse> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(AppResponse::BadRequest("config must be a JSON object".to_string()));
        }
        let config: PortalConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.storage_path.trim().is_empty() {
            return Err(AppResponse::BadRequest("storage_path must not be empty".to_string()));
        }
        if self.map_size_bytes == 0 {
            return Err(AppResponse::BadRequest("map_size_bytes must be positive".to_string()));
        }
        if self.max_comment_chars == 0 {
            return Err(AppResponse::BadRequest("max_comment_chars must be positive".to_string()));
        }
        for domain in [&self.likes_domain, &self.comments_domain] {
            if domain.is_empty() || !domain.is_ascii() {
                return Err(AppResponse::BadRequest(format!(
                    "domain name must be non-empty ASCII: {:?}",
                    domain
                )));
            }
        }
        if self.likes_domain == self.comments_domain {
            return Err(AppResponse::BadRequest(
                "likes_domain and comments_domain must differ".to_string(),
            ));
        }
        Ok(())
    }
}
