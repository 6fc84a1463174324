//! Provider trait
//!
//! A provider owns the connection settings for a remote system and hands
//! resources whatever they need to talk to it.

use crate::error::{Result, TfplugError};
use crate::resource::{ConfigureResourceRequest, ResourceWithConfigure};
use crate::schema::Schema;
use crate::types::{has_errors, Diagnostic, DynamicValue};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Creates a fresh, unconfigured resource instance
pub type ResourceFactory = Box<dyn Fn() -> Box<dyn ResourceWithConfigure> + Send + Sync>;

/// Shared data produced by `Provider::configure`
pub type ProviderData = Arc<dyn Any + Send + Sync>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Prefix shared by every resource type, e.g. "contentful"
    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    async fn configure(&mut self, request: ConfigureProviderRequest)
        -> ConfigureProviderResponse;

    /// Factories keyed by resource type name
    fn resources(&self) -> HashMap<String, ResourceFactory>;
}

pub struct ConfigureProviderRequest {
    pub terraform_version: String,
    pub config: DynamicValue,
}

pub struct ConfigureProviderResponse {
    pub diagnostics: Vec<Diagnostic>,
    pub provider_data: Option<ProviderData>,
}

/// Build a resource from the provider's factory and hand it provider data
///
/// This is the step Terraform's plugin server performs before every
/// resource RPC.
pub async fn configured_resource<P: Provider + ?Sized>(
    provider: &P,
    type_name: &str,
    provider_data: Option<ProviderData>,
) -> Result<Box<dyn ResourceWithConfigure>> {
    let factories = provider.resources();
    let factory = factories
        .get(type_name)
        .ok_or_else(|| TfplugError::ResourceNotFound(type_name.to_string()))?;

    let mut resource = factory();
    let response = resource
        .configure(ConfigureResourceRequest { provider_data })
        .await;

    if has_errors(&response.diagnostics) {
        tracing::debug!(
            "configuring {} failed: {:?}",
            type_name,
            response.diagnostics
        );
        return Err(TfplugError::ProviderNotConfigured);
    }

    Ok(resource)
}
