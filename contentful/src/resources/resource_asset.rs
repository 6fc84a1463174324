//! Asset resource implementation
//!
//! Besides the field payload, an asset carries two remote lifecycle flags,
//! published and archived. Every create and update ends with a
//! reconciliation step that issues one state-change call per flag whose
//! remote value differs from the configured one.

use super::{api_error, not_configured, provider_data_from};
use crate::api::{ApiError, Asset, AssetFields, File, FileDetails, ImageDetails, Link, Sys};
use crate::{ContentfulProviderData, SettleConfig};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfplug::schema::{
    AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, NestingMode, Schema,
    SchemaBuilder,
};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

pub const TYPE_NAME: &str = "contentful_asset";

#[derive(Default)]
pub struct AssetResource {
    provider_data: Option<ContentfulProviderData>,
}

impl AssetResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a Contentful asset")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Asset identifier")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("asset_id", AttributeType::String)
                    .description("Identifier to create the asset under")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("space_id", AttributeType::String)
                    .description("Space the asset belongs to")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("locale", AttributeType::String)
                    .description("Locale of the asset file, e.g. en-US")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("version", AttributeType::Number)
                    .description("Current version of the asset")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("published", AttributeType::Bool)
                    .description("Whether the asset is published")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("archived", AttributeType::Bool)
                    .description("Whether the asset is archived")
                    .required()
                    .build(),
            )
            .block(fields_block())
            .build()
    }
}

fn localized_text_block(name: &str, description: &str) -> NestedBlock {
    NestedBlockBuilder::new(name, NestingMode::List)
        .description(description)
        .attribute(
            AttributeBuilder::new("content", AttributeType::String)
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("locale", AttributeType::String)
                .required()
                .build(),
        )
        .build()
}

fn fields_block() -> NestedBlock {
    let image = NestedBlockBuilder::new("image", NestingMode::Set)
        .attribute(
            AttributeBuilder::new("width", AttributeType::Number)
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("height", AttributeType::Number)
                .required()
                .build(),
        )
        .build();

    let details = NestedBlockBuilder::new("details", NestingMode::Set)
        .description("Size and image dimensions of the file")
        .attribute(
            AttributeBuilder::new("size", AttributeType::Number)
                .required()
                .build(),
        )
        .block(image)
        .build();

    let file = NestedBlockBuilder::new("file", NestingMode::List)
        .max_items(1)
        .attribute(
            AttributeBuilder::new("file_name", AttributeType::String)
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("content_type", AttributeType::String)
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("upload", AttributeType::String)
                .description("Remote URL the file is fetched from")
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("url", AttributeType::String)
                .description("Public URL of the processed file")
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("upload_from", AttributeType::String)
                .description("Id of an upload the file was created from")
                .computed()
                .build(),
        )
        .block(details)
        .build();

    NestedBlockBuilder::new("fields", NestingMode::List)
        .min_items(1)
        .max_items(1)
        .block(localized_text_block("title", "Localized titles"))
        .block(localized_text_block("description", "Localized descriptions"))
        .block(file)
        .build()
}

fn fields_path() -> AttributePath {
    AttributePath::new("fields").index(0)
}

fn file_path() -> AttributePath {
    fields_path().attribute("file").index(0)
}

fn config_error(detail: &str) -> Diagnostic {
    Diagnostic::error("Invalid asset configuration", detail)
}

fn map_string(entry: &Dynamic, key: &str) -> Option<String> {
    entry
        .as_map()
        .and_then(|m| m.get(key))
        .and_then(Dynamic::as_string)
        .cloned()
}

fn map_i64(entry: &Dynamic, key: &str) -> Option<i64> {
    entry
        .as_map()
        .and_then(|m| m.get(key))
        .and_then(Dynamic::as_number)
        .map(|n| n as i64)
}

/// Flatten a list of `{content, locale}` blocks into a locale map
fn localized(config: &DynamicValue, path: &AttributePath) -> BTreeMap<String, String> {
    config
        .get_list(path)
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| Some((map_string(entry, "locale")?, map_string(entry, "content")?)))
        .collect()
}

fn file_details(config: &DynamicValue) -> Option<FileDetails> {
    let details = config.get_list(&file_path().attribute("details")).ok()?;
    let first = details.first()?;
    let size = map_i64(first, "size")?;
    let image = first
        .as_map()
        .and_then(|m| m.get("image"))
        .and_then(Dynamic::as_list)
        .and_then(|images| images.first())
        .and_then(|img| {
            Some(ImageDetails {
                width: map_i64(img, "width")?,
                height: map_i64(img, "height")?,
            })
        });

    Some(FileDetails { size, image })
}

/// Optional string attribute; empty strings count as unset
fn optional_string(config: &DynamicValue, path: &AttributePath) -> Option<String> {
    config.get_string(path).ok().filter(|s| !s.is_empty())
}

/// Space id plus the local asset built from configuration
fn build_asset(config: &DynamicValue) -> Result<(String, Asset), Diagnostic> {
    let space_id = config
        .get_string(&AttributePath::new("space_id"))
        .map_err(|_| config_error("space_id is required"))?;
    let asset_id = config
        .get_string(&AttributePath::new("asset_id"))
        .map_err(|_| config_error("asset_id is required"))?;
    let locale = config
        .get_string(&AttributePath::new("locale"))
        .map_err(|_| config_error("locale is required"))?;

    if config.get_map(&fields_path()).is_err() {
        return Err(config_error("fields block not defined in asset"));
    }
    if config.get_map(&file_path()).is_err() {
        return Err(config_error("file block not defined in asset"));
    }

    let file_path = file_path();
    let file = File {
        file_name: config
            .get_string(&file_path.clone().attribute("file_name"))
            .map_err(|_| config_error("file_name is required"))?,
        content_type: config
            .get_string(&file_path.clone().attribute("content_type"))
            .map_err(|_| config_error("content_type is required"))?,
        url: optional_string(config, &file_path.clone().attribute("url")),
        upload: optional_string(config, &file_path.clone().attribute("upload")),
        upload_from: optional_string(config, &file_path.attribute("upload_from"))
            .map(|id| Link::new("Upload", id)),
        details: file_details(config),
    };

    let asset = Asset {
        sys: Sys::with_id(asset_id),
        fields: AssetFields {
            title: localized(config, &fields_path().attribute("title")),
            description: localized(config, &fields_path().attribute("description")),
            file: BTreeMap::from([(locale.clone(), file)]),
        },
        locale,
    };

    Ok((space_id, asset))
}

fn set_asset_properties(state: &mut DynamicValue, asset: &Asset) -> tfplug::Result<()> {
    state.set_string(&AttributePath::new("id"), asset.sys.id.clone())?;
    if !asset.sys.space_id().is_empty() {
        state.set_string(&AttributePath::new("space_id"), asset.sys.space_id())?;
    }
    state.set_i64(&AttributePath::new("version"), asset.sys.version)?;
    state.set_bool(&AttributePath::new("published"), asset.is_published())?;
    state.set_bool(&AttributePath::new("archived"), asset.is_archived())?;

    // Computed file attributes only exist once the file block does
    if state.get_map(&file_path()).is_ok() {
        let file = asset.fields.file.get(&asset.locale);
        let url_path = file_path().attribute("url");
        match file.and_then(|f| f.url.clone()) {
            Some(url) => state.set_string(&url_path, url)?,
            None => state.set_null(&url_path)?,
        }
        let upload_from_path = file_path().attribute("upload_from");
        match file.and_then(|f| f.upload_from.as_ref()) {
            Some(link) => state.set_string(&upload_from_path, link.sys.id.clone())?,
            None => state.set_null(&upload_from_path)?,
        }
    }
    Ok(())
}

/// Read only tracks where the asset lives and how far it has moved
fn set_remote_version(state: &mut DynamicValue, asset: &Asset) -> tfplug::Result<()> {
    if !asset.sys.space_id().is_empty() {
        state.set_string(&AttributePath::new("space_id"), asset.sys.space_id())?;
    }
    state.set_i64(&AttributePath::new("version"), asset.sys.version)
}

fn write_back(state: &mut DynamicValue, asset: &Asset, diagnostics: &mut Vec<Diagnostic>) {
    if let Err(e) = set_asset_properties(state, asset) {
        diagnostics.push(Diagnostic::error(
            "Failed to record asset state",
            e.to_string(),
        ));
    }
}

/// Space and asset id of an existing asset, from prior state
fn state_ids(state: &DynamicValue) -> Option<(String, String)> {
    let space_id = state.get_string(&AttributePath::new("space_id")).ok()?;
    let asset_id = state.get_string(&AttributePath::new("id")).ok()?;
    (!asset_id.is_empty()).then_some((space_id, asset_id))
}

/// One remote call moving an asset along the publish or archive axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Publish,
    Unpublish,
    Archive,
    Unarchive,
}

impl Transition {
    fn verb(self) -> &'static str {
        match self {
            Transition::Publish => "publish",
            Transition::Unpublish => "unpublish",
            Transition::Archive => "archive",
            Transition::Unarchive => "unarchive",
        }
    }
}

/// Calls needed to bring `remote` to the desired flags.
///
/// Unarchive runs before publishing and unpublish before archiving, as the
/// API rejects publishing an archived asset and archiving a published one.
fn plan_transitions(published: bool, archived: bool, remote: &Asset) -> Vec<Transition> {
    let mut plan = Vec::new();

    if !archived && remote.is_archived() {
        plan.push(Transition::Unarchive);
    }
    if published && !remote.is_published() {
        plan.push(Transition::Publish);
    }
    if !published && remote.is_published() {
        plan.push(Transition::Unpublish);
    }
    if archived && !remote.is_archived() {
        plan.push(Transition::Archive);
    }

    plan
}

fn desired_flags(config: &DynamicValue) -> (bool, bool) {
    (
        config
            .get_bool(&AttributePath::new("published"))
            .unwrap_or(false),
        config
            .get_bool(&AttributePath::new("archived"))
            .unwrap_or(false),
    )
}

impl AssetResource {
    /// Re-read the asset until processing has bumped its version past
    /// `version`. Running out of attempts is not an error.
    async fn settle(
        provider_data: &ContentfulProviderData,
        space_id: &str,
        asset_id: &str,
        version: i64,
    ) -> Result<(), ApiError> {
        let SettleConfig { attempts, delay } = provider_data.settle;
        let api = provider_data.client.assets();

        for attempt in 1..=attempts {
            tokio::time::sleep(delay).await;
            match api.get(space_id, asset_id).await {
                Ok(asset) if asset.sys.version > version => {
                    tracing::debug!(
                        "Asset {} settled at version {} after {} attempt(s)",
                        asset_id,
                        asset.sys.version,
                        attempt
                    );
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        tracing::warn!(
            "Asset {} still at version {} after {} attempt(s), continuing",
            asset_id,
            version,
            attempts
        );
        Ok(())
    }

    /// Fetch the asset and issue whatever publish/archive calls it needs
    async fn reconcile(
        provider_data: &ContentfulProviderData,
        space_id: &str,
        asset_id: &str,
        locale: &str,
        published: bool,
        archived: bool,
    ) -> Result<Asset, Diagnostic> {
        let api = provider_data.client.assets();
        let mut asset = api
            .get(space_id, asset_id)
            .await
            .map_err(|e| api_error("Failed to read asset", &e))?;
        asset.locale = locale.to_string();

        for transition in plan_transitions(published, archived, &asset) {
            tracing::debug!("Asset {}: {}", asset_id, transition.verb());
            let result = match transition {
                Transition::Publish => api.publish(space_id, &asset).await,
                Transition::Unpublish => api.unpublish(space_id, &asset).await,
                Transition::Archive => api.archive(space_id, &asset).await,
                Transition::Unarchive => api.unarchive(space_id, &asset).await,
            };
            asset = result
                .map_err(|e| api_error(&format!("Failed to {} asset", transition.verb()), &e))?;
        }

        Ok(asset)
    }
}

#[async_trait]
impl Resource for AssetResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Self::schema_static()
    }

    async fn create(&self, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics,
            };
        };

        let (space_id, asset) = match build_asset(&request.config) {
            Ok(built) => built,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };
        let (published, archived) = desired_flags(&request.config);
        let mut new_state = request.planned_state;

        let api = provider_data.client.assets();
        let saved = match api.upsert(&space_id, &asset).await {
            Ok(saved) => saved,
            Err(e) => {
                diagnostics.push(api_error("Failed to create asset", &e));
                return CreateResourceResponse {
                    new_state,
                    diagnostics,
                };
            }
        };
        tracing::info!("Created asset {} in space {}", saved.sys.id, space_id);
        write_back(&mut new_state, &saved, &mut diagnostics);

        if let Err(e) = api.process(&space_id, &saved).await {
            diagnostics.push(api_error("Failed to process asset", &e));
            return CreateResourceResponse {
                new_state,
                diagnostics,
            };
        }

        if let Err(e) = Self::settle(provider_data, &space_id, &saved.sys.id, saved.sys.version).await
        {
            diagnostics.push(api_error("Failed to read asset", &e));
            return CreateResourceResponse {
                new_state,
                diagnostics,
            };
        }

        match Self::reconcile(
            provider_data,
            &space_id,
            &saved.sys.id,
            &saved.locale,
            published,
            archived,
        )
        .await
        {
            Ok(asset) => write_back(&mut new_state, &asset, &mut diagnostics),
            Err(diag) => diagnostics.push(diag),
        }

        CreateResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn read(&self, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let Some((space_id, asset_id)) = state_ids(&request.current_state) else {
            return ReadResourceResponse {
                new_state: None,
                diagnostics,
            };
        };

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics,
            };
        };

        match provider_data.client.assets().get(&space_id, &asset_id).await {
            Ok(asset) => {
                let mut new_state = request.current_state;
                if let Err(e) = set_remote_version(&mut new_state, &asset) {
                    diagnostics.push(Diagnostic::error(
                        "Failed to record asset state",
                        e.to_string(),
                    ));
                }
                ReadResourceResponse {
                    new_state: Some(new_state),
                    diagnostics,
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("Asset {} no longer exists, removing from state", asset_id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read asset", &e));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        };

        let (space_id, mut asset) = match build_asset(&request.config) {
            Ok(built) => built,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };
        if let Some((_, id)) = state_ids(&request.prior_state) {
            asset.sys.id = id;
        }
        asset.sys.version = request
            .prior_state
            .get_i64(&AttributePath::new("version"))
            .unwrap_or(0);
        let (published, archived) = desired_flags(&request.config);

        let api = provider_data.client.assets();
        if let Err(e) = api.get(&space_id, &asset.sys.id).await {
            diagnostics.push(api_error("Failed to read asset", &e));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        }

        let saved = match api.upsert(&space_id, &asset).await {
            Ok(saved) => saved,
            Err(e) => {
                diagnostics.push(api_error("Failed to update asset", &e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let mut new_state = request.planned_state;
        write_back(&mut new_state, &saved, &mut diagnostics);

        if let Err(e) = api.process(&space_id, &saved).await {
            diagnostics.push(api_error("Failed to process asset", &e));
            return UpdateResourceResponse {
                new_state,
                diagnostics,
            };
        }

        match Self::reconcile(
            provider_data,
            &space_id,
            &saved.sys.id,
            &saved.locale,
            published,
            archived,
        )
        .await
        {
            Ok(asset) => write_back(&mut new_state, &asset, &mut diagnostics),
            Err(diag) => diagnostics.push(diag),
        }

        UpdateResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn delete(&self, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let Some((space_id, asset_id)) = state_ids(&request.prior_state) else {
            return DeleteResourceResponse { diagnostics };
        };

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return DeleteResourceResponse { diagnostics };
        };

        let api = provider_data.client.assets();
        let asset = match api.get(&space_id, &asset_id).await {
            Ok(asset) => asset,
            Err(e) if e.is_not_found() => {
                tracing::warn!("Asset {} already deleted", asset_id);
                return DeleteResourceResponse { diagnostics };
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read asset", &e));
                return DeleteResourceResponse { diagnostics };
            }
        };

        match api.delete(&space_id, &asset).await {
            Ok(()) => tracing::info!("Deleted asset {} from space {}", asset_id, space_id),
            Err(e) => diagnostics.push(api_error("Failed to delete asset", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for AssetResource {
    async fn configure(&mut self, request: ConfigureResourceRequest) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        match provider_data_from(request) {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureResourceResponse { diagnostics }
    }
}
