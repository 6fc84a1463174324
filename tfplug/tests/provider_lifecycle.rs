//! Drives a small in-memory provider through the provider and resource traits

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tfplug::provider::{ConfigureProviderRequest, ConfigureProviderResponse, Provider};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest,
};
use tfplug::types::{Diagnostic, Dynamic};
use tfplug::{
    AttributeBuilder, AttributePath, AttributeType, DynamicValue, Resource,
    ResourceFactory, ResourceWithConfigure, Schema, SchemaBuilder, TfplugError,
};

type Store = Arc<Mutex<HashMap<String, String>>>;

#[derive(Default)]
struct MemoryProvider;

#[async_trait]
impl Provider for MemoryProvider {
    fn type_name(&self) -> &str {
        "memory"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new().build()
    }

    async fn configure(&mut self, _request: ConfigureProviderRequest) -> ConfigureProviderResponse {
        tokio::time::sleep(Duration::from_millis(1)).await;
        let store: Store = Arc::default();
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(store)),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            "memory_item".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> { Box::new(ItemResource::default()) }),
        );
        factories
    }
}

#[derive(Default)]
struct ItemResource {
    store: Option<Store>,
}

impl ItemResource {
    fn store(&self) -> &Store {
        self.store.as_ref().unwrap()
    }
}

#[async_trait]
impl Resource for ItemResource {
    fn type_name(&self) -> &str {
        "memory_item"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("key", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("value", AttributeType::String)
                    .required()
                    .build(),
            )
            .build()
    }

    async fn create(&self, request: CreateResourceRequest) -> CreateResourceResponse {
        let key = request.config.get_string(&AttributePath::new("key")).unwrap();
        let value = request
            .config
            .get_string(&AttributePath::new("value"))
            .unwrap();
        self.store().lock().unwrap().insert(key, value);
        CreateResourceResponse {
            new_state: request.planned_state,
            diagnostics: vec![],
        }
    }

    async fn read(&self, request: ReadResourceRequest) -> ReadResourceResponse {
        let key = request
            .current_state
            .get_string(&AttributePath::new("key"))
            .unwrap();
        let stored = self.store().lock().unwrap().get(&key).cloned();
        let new_state = stored.map(|value| {
            let mut state = request.current_state;
            state
                .set_string(&AttributePath::new("value"), value)
                .unwrap();
            state
        });
        ReadResourceResponse {
            new_state,
            diagnostics: vec![],
        }
    }

    async fn update(&self, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let create = self
            .create(CreateResourceRequest {
                type_name: request.type_name,
                planned_state: request.planned_state,
                config: request.config,
            })
            .await;
        UpdateResourceResponse {
            new_state: create.new_state,
            diagnostics: create.diagnostics,
        }
    }

    async fn delete(&self, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let key = request
            .prior_state
            .get_string(&AttributePath::new("key"))
            .unwrap();
        self.store().lock().unwrap().remove(&key);
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for ItemResource {
    async fn configure(&mut self, request: ConfigureResourceRequest) -> ConfigureResourceResponse {
        let store = request
            .provider_data
            .and_then(|data| data.downcast_ref::<Store>().cloned());
        let diagnostics = match store {
            Some(store) => {
                self.store = Some(store);
                vec![]
            }
            None => vec![Diagnostic::error("Invalid provider data", "expected a store")],
        };
        ConfigureResourceResponse { diagnostics }
    }
}

fn item(key: &str, value: &str) -> DynamicValue {
    DynamicValue::new(Dynamic::object([
        ("key", Dynamic::from(key)),
        ("value", Dynamic::from(value)),
    ]))
}

#[tokio::test]
async fn full_lifecycle_through_configured_resource() {
    let mut provider = MemoryProvider;
    let configured = provider
        .configure(ConfigureProviderRequest {
            terraform_version: "1.9.0".to_string(),
            config: DynamicValue::object(),
        })
        .await;

    let resource = tfplug::configured_resource(&provider, "memory_item", configured.provider_data)
        .await
        .unwrap();

    let config = item("greeting", "hello");
    resource
        .create(CreateResourceRequest {
            type_name: "memory_item".to_string(),
            planned_state: config.clone(),
            config: config.clone(),
        })
        .await;

    let read = resource
        .read(ReadResourceRequest {
            type_name: "memory_item".to_string(),
            current_state: config.clone(),
        })
        .await;
    assert_eq!(read.new_state, Some(config.clone()));

    let changed = item("greeting", "hi");
    resource
        .update(UpdateResourceRequest {
            type_name: "memory_item".to_string(),
            prior_state: config.clone(),
            planned_state: changed.clone(),
            config: changed.clone(),
        })
        .await;
    let read = resource
        .read(ReadResourceRequest {
            type_name: "memory_item".to_string(),
            current_state: config.clone(),
        })
        .await;
    assert_eq!(read.new_state, Some(changed.clone()));

    resource
        .delete(DeleteResourceRequest {
            type_name: "memory_item".to_string(),
            prior_state: changed.clone(),
        })
        .await;
    let read = resource
        .read(ReadResourceRequest {
            type_name: "memory_item".to_string(),
            current_state: changed,
        })
        .await;
    assert!(read.new_state.is_none());
}

#[tokio::test]
async fn resources_share_provider_data() {
    let mut provider = MemoryProvider;
    let configured = provider
        .configure(ConfigureProviderRequest {
            terraform_version: "1.9.0".to_string(),
            config: DynamicValue::object(),
        })
        .await;

    let writer =
        tfplug::configured_resource(&provider, "memory_item", configured.provider_data.clone())
            .await
            .unwrap();
    let reader = tfplug::configured_resource(&provider, "memory_item", configured.provider_data)
        .await
        .unwrap();

    let config = item("shared", "yes");
    writer
        .create(CreateResourceRequest {
            type_name: "memory_item".to_string(),
            planned_state: config.clone(),
            config: config.clone(),
        })
        .await;

    let read = reader
        .read(ReadResourceRequest {
            type_name: "memory_item".to_string(),
            current_state: config.clone(),
        })
        .await;
    assert_eq!(read.new_state, Some(config));
}

#[tokio::test]
async fn concurrent_calls_on_one_resource() {
    let mut provider = MemoryProvider;
    let configured = provider
        .configure(ConfigureProviderRequest {
            terraform_version: "1.9.0".to_string(),
            config: DynamicValue::object(),
        })
        .await;
    let resource: Arc<dyn ResourceWithConfigure> = Arc::from(
        tfplug::configured_resource(&provider, "memory_item", configured.provider_data)
            .await
            .unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..8 {
        let resource = Arc::clone(&resource);
        handles.push(tokio::spawn(async move {
            let config = item(&format!("k{}", i), &format!("v{}", i));
            resource
                .create(CreateResourceRequest {
                    type_name: "memory_item".to_string(),
                    planned_state: config.clone(),
                    config,
                })
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().diagnostics.is_empty());
    }

    let read = resource
        .read(ReadResourceRequest {
            type_name: "memory_item".to_string(),
            current_state: item("k7", "stale"),
        })
        .await;
    assert_eq!(read.new_state, Some(item("k7", "v7")));
}

#[tokio::test]
async fn configure_errors_surface_as_not_configured() {
    let provider = MemoryProvider;
    let wrong_data: tfplug::ProviderData = Arc::new(42u8);

    let result = tfplug::configured_resource(&provider, "memory_item", Some(wrong_data)).await;
    assert!(matches!(result, Err(TfplugError::ProviderNotConfigured)));

    let result = tfplug::configured_resource(&provider, "memory_other", None).await;
    assert!(matches!(result, Err(TfplugError::ResourceNotFound(name)) if name == "memory_other"));
}

#[tokio::test]
async fn default_validation_reports_missing_attributes() {
    let resource = ItemResource::default();
    let response = resource
        .validate(ValidateResourceConfigRequest {
            type_name: "memory_item".to_string(),
            config: DynamicValue::new(Dynamic::object([("key", Dynamic::from("only"))])),
        })
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Missing required argument");
    assert_eq!(
        response.diagnostics[0].attribute,
        Some(AttributePath::new("value"))
    );
}
