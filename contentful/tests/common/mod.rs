use contentful::ContentfulProvider;
use tfplug::provider::{ConfigureProviderRequest, Provider};
use tfplug::types::{Dynamic, DynamicValue};
use tfplug::logging::{self, LogLevel};
use tfplug::ResourceWithConfigure;

pub const TOKEN: &str = "cfpat-integration";

/// Configure the provider against a mock server and build one of its resources
pub async fn configured(server_url: &str, type_name: &str) -> Box<dyn ResourceWithConfigure> {
    // Only the first test in a binary installs the subscriber
    let _ = logging::init(LogLevel::from_env());

    let mut provider = ContentfulProvider::new();
    let config = DynamicValue::new(Dynamic::object([
        ("cma_token", Dynamic::from(TOKEN)),
        ("organization_id", Dynamic::from("org1")),
        ("base_url", Dynamic::from(server_url)),
    ]));

    let response = provider
        .configure(ConfigureProviderRequest {
            terraform_version: "1.9.0".to_string(),
            config,
        })
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

    tfplug::configured_resource(&provider, type_name, response.provider_data)
        .await
        .unwrap()
}
