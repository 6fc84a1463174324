//! Delivery API key resource implementation

use super::{api_error, not_configured, provider_data_from};
use crate::api::ApiKey;
use crate::ContentfulProviderData;
use async_trait::async_trait;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

pub const TYPE_NAME: &str = "contentful_apikey";

#[derive(Default)]
pub struct ApiKeyResource {
    provider_data: Option<ContentfulProviderData>,
}

impl ApiKeyResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a Contentful delivery API key")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("API key identifier")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("space_id", AttributeType::String)
                    .description("Space the API key belongs to")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the API key")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description of the API key")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("version", AttributeType::Number)
                    .description("Current version of the API key")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("access_token", AttributeType::String)
                    .description("Content Delivery API token")
                    .computed()
                    .sensitive()
                    .build(),
            )
            .build()
    }
}

/// User-controlled part of the key, read from configuration
struct ApiKeyConfig {
    space_id: String,
    name: String,
    description: Option<String>,
}

fn extract_config(config: &DynamicValue) -> Result<ApiKeyConfig, Diagnostic> {
    let space_id = config
        .get_string(&AttributePath::new("space_id"))
        .map_err(|_| {
            Diagnostic::error("Missing space_id", "The 'space_id' attribute is required")
                .with_attribute(AttributePath::new("space_id"))
        })?;
    let name = config.get_string(&AttributePath::new("name")).map_err(|_| {
        Diagnostic::error("Missing name", "The 'name' attribute is required")
            .with_attribute(AttributePath::new("name"))
    })?;
    let description = config.get_string(&AttributePath::new("description")).ok();

    Ok(ApiKeyConfig {
        space_id,
        name,
        description,
    })
}

/// Copy what the API reports about a key into Terraform state
fn set_api_key_properties(state: &mut DynamicValue, key: &ApiKey) -> tfplug::Result<()> {
    state.set_string(&AttributePath::new("id"), key.sys.id.clone())?;
    if !key.sys.space_id().is_empty() {
        state.set_string(&AttributePath::new("space_id"), key.sys.space_id())?;
    }
    state.set_string(&AttributePath::new("name"), key.name.clone())?;
    match &key.description {
        Some(description) => {
            state.set_string(&AttributePath::new("description"), description.clone())?
        }
        None => state.set_null(&AttributePath::new("description"))?,
    }
    state.set_i64(&AttributePath::new("version"), key.sys.version)?;
    match &key.access_token {
        Some(token) => state.set_string(&AttributePath::new("access_token"), token.clone())?,
        None => state.set_null(&AttributePath::new("access_token"))?,
    }
    Ok(())
}

fn write_back(state: &mut DynamicValue, key: &ApiKey, diagnostics: &mut Vec<Diagnostic>) {
    if let Err(e) = set_api_key_properties(state, key) {
        diagnostics.push(Diagnostic::error(
            "Failed to record API key state",
            e.to_string(),
        ));
    }
}

/// Space and key id of an existing key, from prior state
fn state_ids(state: &DynamicValue) -> Option<(String, String)> {
    let space_id = state.get_string(&AttributePath::new("space_id")).ok()?;
    let key_id = state.get_string(&AttributePath::new("id")).ok()?;
    (!key_id.is_empty()).then_some((space_id, key_id))
}

#[async_trait]
impl Resource for ApiKeyResource {
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

        let config = match extract_config(&request.config) {
            Ok(config) => config,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                };
            }
        };

        let key = ApiKey::new(config.name, config.description);
        let mut new_state = request.planned_state;

        match provider_data
            .client
            .api_keys()
            .upsert(&config.space_id, &key)
            .await
        {
            Ok(created) => {
                tracing::info!(
                    "Created API key {} in space {}",
                    created.sys.id,
                    config.space_id
                );
                write_back(&mut new_state, &created, &mut diagnostics);
            }
            Err(e) => diagnostics.push(api_error("Failed to create API key", &e)),
        }

        CreateResourceResponse {
            new_state,
            diagnostics,
        }
    }

    async fn read(&self, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let Some((space_id, key_id)) = state_ids(&request.current_state) else {
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

        match provider_data.client.api_keys().get(&space_id, &key_id).await {
            Ok(key) => {
                let mut new_state = request.current_state;
                write_back(&mut new_state, &key, &mut diagnostics);
                ReadResourceResponse {
                    new_state: Some(new_state),
                    diagnostics,
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("API key {} no longer exists, removing from state", key_id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read API key", &e));
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

        let config = match extract_config(&request.config) {
            Ok(config) => config,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };

        let Some((_, key_id)) = state_ids(&request.prior_state) else {
            diagnostics.push(Diagnostic::error(
                "Missing API key id",
                "Prior state does not contain an API key id",
            ));
            return UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics,
            };
        };

        let api = provider_data.client.api_keys();
        let mut key = match api.get(&config.space_id, &key_id).await {
            Ok(key) => key,
            Err(e) => {
                diagnostics.push(api_error("Failed to read API key", &e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                };
            }
        };
        key.name = config.name;
        key.description = config.description;

        match api.upsert(&config.space_id, &key).await {
            Ok(updated) => {
                let mut new_state = request.planned_state;
                write_back(&mut new_state, &updated, &mut diagnostics);
                UpdateResourceResponse {
                    new_state,
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to update API key", &e));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
        }
    }

    async fn delete(&self, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let Some((space_id, key_id)) = state_ids(&request.prior_state) else {
            return DeleteResourceResponse { diagnostics };
        };

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return DeleteResourceResponse { diagnostics };
        };

        let api = provider_data.client.api_keys();
        let key = match api.get(&space_id, &key_id).await {
            Ok(key) => key,
            Err(e) if e.is_not_found() => {
                tracing::warn!("API key {} already deleted", key_id);
                return DeleteResourceResponse { diagnostics };
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read API key", &e));
                return DeleteResourceResponse { diagnostics };
            }
        };

        match api.delete(&space_id, &key).await {
            Ok(()) => tracing::info!("Deleted API key {} from space {}", key_id, space_id),
            Err(e) => diagnostics.push(api_error("Failed to delete API key", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for ApiKeyResource {
    async fn configure(&mut self, request: ConfigureResourceRequest) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        match provider_data_from(request) {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureResourceResponse { diagnostics }
    }
}
