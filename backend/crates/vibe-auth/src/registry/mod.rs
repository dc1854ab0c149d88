mod provider_registry;
mod scheme_registry;

pub use provider_registry::ProviderRegistry;
pub use scheme_registry::{DynamicSchemeRegistrar, SchemeRegistry};
