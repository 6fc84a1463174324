//! Delivery API key endpoints

use super::common::{segment, space_path, Sys};
use super::{ApiError, Client};
use reqwest::Method;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    #[serde(default)]
    pub sys: Sys,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Delivery API token, generated by the server
    #[serde(default)]
    pub access_token: Option<String>,
}

impl ApiKey {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
            ..Default::default()
        }
    }
}

/// Writable part of an API key
#[derive(Debug, Serialize)]
struct ApiKeyPayload<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

pub struct ApiKeysApi<'a> {
    client: &'a Client,
}

impl<'a> ApiKeysApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn key_path(space_id: &str, key_id: &str) -> String {
        format!("{}/{}", space_path(space_id, "api_keys"), segment(key_id))
    }

    /// GET /spaces/{space}/api_keys/{id}
    pub async fn get(&self, space_id: &str, key_id: &str) -> Result<ApiKey, ApiError> {
        self.client.get(&Self::key_path(space_id, key_id)).await
    }

    /// POST a new key when it has no id yet, otherwise PUT at its current version
    pub async fn upsert(&self, space_id: &str, key: &ApiKey) -> Result<ApiKey, ApiError> {
        let payload = ApiKeyPayload {
            name: &key.name,
            description: key.description.as_deref(),
        };

        if key.sys.id.is_empty() {
            self.client
                .post(&space_path(space_id, "api_keys"), &payload)
                .await
        } else {
            self.client
                .put(
                    &Self::key_path(space_id, &key.sys.id),
                    Some(&payload),
                    Some(key.sys.version),
                )
                .await
        }
    }

    /// DELETE /spaces/{space}/api_keys/{id}
    pub async fn delete(&self, space_id: &str, key: &ApiKey) -> Result<(), ApiError> {
        self.client
            .send(
                Method::DELETE,
                &Self::key_path(space_id, &key.sys.id),
                Some(key.sys.version),
            )
            .await
    }
}
