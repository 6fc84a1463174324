//! tfplug - Terraform Plugin Framework for Rust
//!
//! Value model, schemas and the provider/resource traits a Terraform
//! provider is written against. The plugin transport lives outside this
//! crate.

pub mod error;
pub mod logging;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod types;

pub use error::{Result, TfplugError};
pub use logging::LogLevel;
pub use provider::{configured_resource, Provider, ProviderData, ResourceFactory};
pub use resource::{Resource, ResourceWithConfigure};
pub use schema::{
    AttributeBuilder, AttributeType, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder,
};
pub use types::{AttributePath, Config, Diagnostic, Dynamic, DynamicValue, State};
