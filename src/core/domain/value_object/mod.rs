mod api_token;
mod cpu_threshold;
mod endpoint_url;
pub(crate) mod serde_helpers;

pub use api_token::ApiToken;
pub use cpu_threshold::CpuThreshold;
pub use endpoint_url::EndpointUrl;

// Re-export validation functions for internal use
pub(crate) use api_token::validate_api_token;
pub(crate) use cpu_threshold::validate_cpu_threshold;
pub(crate) use endpoint_url::validate_endpoint_url;
