//! Asset endpoints

use super::common::{segment, space_path, Link, Sys};
use super::{ApiError, Client};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An asset with its localized fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default, skip_serializing)]
    pub sys: Sys,
    /// Locale the asset was configured with; not part of the API payload
    #[serde(skip)]
    pub locale: String,
    #[serde(default)]
    pub fields: AssetFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetFields {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub title: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub description: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub file: BTreeMap<String, File>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub file_name: String,
    pub content_type: String,
    /// Public URL, filled in once the file has been processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Remote URL the file is fetched from during processing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<String>,
    /// Link to a previously created upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_from: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<FileDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileDetails {
    pub size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageDetails>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDetails {
    pub width: i64,
    pub height: i64,
}

impl Asset {
    pub fn is_published(&self) -> bool {
        self.sys.is_published()
    }

    pub fn is_archived(&self) -> bool {
        self.sys.is_archived()
    }
}

pub struct AssetsApi<'a> {
    client: &'a Client,
}

impl<'a> AssetsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn asset_path(space_id: &str, asset_id: &str) -> String {
        format!("{}/{}", space_path(space_id, "assets"), segment(asset_id))
    }

    /// GET /spaces/{space}/assets/{id}
    pub async fn get(&self, space_id: &str, asset_id: &str) -> Result<Asset, ApiError> {
        self.client.get(&Self::asset_path(space_id, asset_id)).await
    }

    /// Create or update an asset
    ///
    /// Assets with an id are PUT to that id, which also creates them when the
    /// id is new; the version header is only sent for existing assets.
    /// Assets without an id are POSTed and get a generated one.
    pub async fn upsert(&self, space_id: &str, asset: &Asset) -> Result<Asset, ApiError> {
        let mut saved: Asset = if asset.sys.id.is_empty() {
            self.client
                .post(&space_path(space_id, "assets"), asset)
                .await?
        } else {
            let version = (asset.sys.version > 0).then_some(asset.sys.version);
            self.client
                .put(
                    &Self::asset_path(space_id, &asset.sys.id),
                    Some(asset),
                    version,
                )
                .await?
        };
        saved.locale = asset.locale.clone();
        Ok(saved)
    }

    /// Ask the server to fetch and process the file of every locale
    pub async fn process(&self, space_id: &str, asset: &Asset) -> Result<(), ApiError> {
        for locale in asset.fields.file.keys() {
            let path = format!(
                "{}/files/{}/process",
                Self::asset_path(space_id, &asset.sys.id),
                segment(locale)
            );
            tracing::debug!("Processing asset {} file for {}", asset.sys.id, locale);
            self.client
                .send(Method::PUT, &path, Some(asset.sys.version))
                .await?;
        }
        Ok(())
    }

    /// PUT /spaces/{space}/assets/{id}/published
    pub async fn publish(&self, space_id: &str, asset: &Asset) -> Result<Asset, ApiError> {
        self.state_change(Method::PUT, space_id, asset, "published")
            .await
    }

    /// DELETE /spaces/{space}/assets/{id}/published
    pub async fn unpublish(&self, space_id: &str, asset: &Asset) -> Result<Asset, ApiError> {
        self.state_change(Method::DELETE, space_id, asset, "published")
            .await
    }

    /// PUT /spaces/{space}/assets/{id}/archived
    pub async fn archive(&self, space_id: &str, asset: &Asset) -> Result<Asset, ApiError> {
        self.state_change(Method::PUT, space_id, asset, "archived")
            .await
    }

    /// DELETE /spaces/{space}/assets/{id}/archived
    pub async fn unarchive(&self, space_id: &str, asset: &Asset) -> Result<Asset, ApiError> {
        self.state_change(Method::DELETE, space_id, asset, "archived")
            .await
    }

    /// DELETE /spaces/{space}/assets/{id}
    pub async fn delete(&self, space_id: &str, asset: &Asset) -> Result<(), ApiError> {
        self.client
            .send(
                Method::DELETE,
                &Self::asset_path(space_id, &asset.sys.id),
                Some(asset.sys.version),
            )
            .await
    }

    async fn state_change(
        &self,
        method: Method,
        space_id: &str,
        asset: &Asset,
        marker: &str,
    ) -> Result<Asset, ApiError> {
        let path = format!("{}/{}", Self::asset_path(space_id, &asset.sys.id), marker);
        let version = Some(asset.sys.version);

        let mut updated: Asset = if method == Method::DELETE {
            self.client.delete(&path, version).await?
        } else {
            self.client
                .put::<Asset, ()>(&path, None, version)
                .await?
        };
        updated.locale = asset.locale.clone();
        Ok(updated)
    }
}
