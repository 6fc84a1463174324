//! Contentful Content Management API client

pub mod api_keys;
pub mod assets;
pub mod client;
pub mod common;
pub mod error;

#[cfg(test)]
pub mod test_helpers;

pub use api_keys::ApiKey;
pub use assets::{Asset, AssetFields, File, FileDetails, ImageDetails};
pub use client::{Client, RetryConfig, DEFAULT_BASE_URL};
pub use common::{Link, Sys};
pub use error::ApiError;
