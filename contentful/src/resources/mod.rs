//! Resource implementations

pub mod resource_apikey;
pub mod resource_asset;

pub use resource_apikey::ApiKeyResource;
pub use resource_asset::AssetResource;

use crate::api::ApiError;
use crate::ContentfulProviderData;
use tfplug::resource::ConfigureResourceRequest;
use tfplug::types::Diagnostic;

fn api_error(summary: &str, err: &ApiError) -> Diagnostic {
    Diagnostic::error(summary, format!("API error: {}", err))
}

fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

/// Pull ContentfulProviderData out of a configure request
fn provider_data_from(
    request: ConfigureResourceRequest,
) -> Result<ContentfulProviderData, Diagnostic> {
    let data = request.provider_data.ok_or_else(|| {
        Diagnostic::error(
            "No provider data",
            "No provider data was provided to the resource",
        )
    })?;

    data.downcast_ref::<ContentfulProviderData>()
        .cloned()
        .ok_or_else(|| {
            Diagnostic::error(
                "Invalid provider data",
                "Failed to extract ContentfulProviderData from provider data",
            )
        })
}
