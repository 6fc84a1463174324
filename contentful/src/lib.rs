pub mod api;
pub mod provider_data;
pub mod resources;

pub use provider_data::{ContentfulProviderData, SettleConfig};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, Provider, ResourceFactory,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

pub const TOKEN_ENV: &str = "CONTENTFUL_MANAGEMENT_TOKEN";
pub const ORGANIZATION_ENV: &str = "CONTENTFUL_ORGANIZATION_ID";
pub const BASE_URL_ENV: &str = "CONTENTFUL_BASE_URL";

#[derive(Default)]
pub struct ContentfulProvider {
    provider_data: Option<ContentfulProviderData>,
}

impl ContentfulProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Provider setting from config, falling back to the environment
fn setting(config: &DynamicValue, name: &str, env: &str) -> Option<String> {
    config
        .get_string(&AttributePath::new(name))
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var(env).ok().filter(|v| !v.is_empty()))
}

#[async_trait]
impl Provider for ContentfulProvider {
    fn type_name(&self) -> &str {
        "contentful"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .description("Manage Contentful spaces through the Content Management API")
            .attribute(
                AttributeBuilder::new("cma_token", AttributeType::String)
                    .description("Content Management API token")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_id", AttributeType::String)
                    .description("Organization the token acts on behalf of")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("base_url", AttributeType::String)
                    .description("Content Management API endpoint")
                    .optional()
                    .build(),
            )
            .build()
    }

    async fn configure(&mut self, request: ConfigureProviderRequest) -> ConfigureProviderResponse {
        let mut diagnostics = vec![];

        let Some(token) = setting(&request.config, "cma_token", TOKEN_ENV) else {
            diagnostics.push(Diagnostic::error(
                "cma_token is required (set in provider config or CONTENTFUL_MANAGEMENT_TOKEN env var)",
                "",
            ));
            return ConfigureProviderResponse {
                diagnostics,
                provider_data: None,
            };
        };
        let organization_id = setting(&request.config, "organization_id", ORGANIZATION_ENV);
        let base_url = setting(&request.config, "base_url", BASE_URL_ENV)
            .unwrap_or_else(|| api::DEFAULT_BASE_URL.to_string());

        match api::Client::with_config(
            &base_url,
            &token,
            organization_id,
            api::RetryConfig::default(),
        ) {
            Ok(client) => {
                tracing::debug!(
                    "Configured Contentful provider against {} (terraform {})",
                    client.base_url(),
                    request.terraform_version
                );
                let data = ContentfulProviderData::new(client);
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: Some(Arc::new(data)),
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                ));
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            resources::resource_apikey::TYPE_NAME.to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(resources::ApiKeyResource::new())
            }),
        );
        factories.insert(
            resources::resource_asset::TYPE_NAME.to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(resources::AssetResource::new())
            }),
        );
        factories
    }
}
