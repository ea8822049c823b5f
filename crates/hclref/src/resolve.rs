//! schema resolution
use crate::{
    provider::{Provider, ProviderError},
    schema::Block,
    variable::ResourceMode,
};

/// Schema of a managed resource or data source type
///
/// Returns `Ok(None)` when the provider does not list the type or lists it without schema support. Only types
/// listed with a schema are fetched; a failing fetch is returned as an error.
#[tracing::instrument(level = "trace", skip(provider))]
pub fn resolve_schema<P>(
    mode: ResourceMode,
    resource_type: &str,
    provider: &P,
) -> Result<Option<Block>, ProviderError>
where
    P: Provider + ?Sized,
{
    let listed = provider
        .types(mode)
        .into_iter()
        .find(|metadata| metadata.name == resource_type);

    match listed {
        None => {
            tracing::trace!("type not listed by provider");
            Ok(None)
        }
        Some(metadata) if !metadata.schema_available => {
            tracing::trace!("provider has no schema for type");
            Ok(None)
        }
        Some(_) => {
            tracing::trace!("fetching schema");
            provider.schema(mode, resource_type).map(Some)
        }
    }
}
