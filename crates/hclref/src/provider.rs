//! provider interface
//!
//! A provider lists the managed resource and data source types it implements and hands out their schemas.
//! Providers that predate schema support still list their types but mark them as having no schema.
//!
//! [Manifest] is a provider backed by a file:
//! ```yaml
//! resources:
//!   aws_instance:
//!     schema:
//!       attributes:
//!         ami: { type: string, required: true }
//!   legacy_thing:
//!     schema_available: false
//! data_sources:
//!   aws_ami:
//!     schema: {}
//! ```
use crate::{schema::Block, variable::ResourceMode};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub trait Provider {
    /// Managed resource types
    fn resources(&self) -> Vec<TypeMetadata>;

    /// Data source types
    fn data_sources(&self) -> Vec<TypeMetadata>;

    fn resource_type_schema(&self, name: &str) -> Result<Block, ProviderError>;

    fn data_source_schema(&self, name: &str) -> Result<Block, ProviderError>;

    /// Types of the given mode
    fn types(&self, mode: ResourceMode) -> Vec<TypeMetadata> {
        match mode {
            ResourceMode::Managed => self.resources(),
            ResourceMode::Data => self.data_sources(),
        }
    }

    /// Schema of a type of the given mode
    fn schema(&self, mode: ResourceMode, name: &str) -> Result<Block, ProviderError> {
        match mode {
            ResourceMode::Managed => self.resource_type_schema(name),
            ResourceMode::Data => self.data_source_schema(name),
        }
    }
}

/// Listing entry of a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_new::new)]
pub struct TypeMetadata {
    pub name: String,
    pub schema_available: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("provider has no {mode} type {name:?}")]
    UnknownType { mode: ResourceMode, name: String },
    #[error("provider claims a schema for {mode} type {name:?} but has none")]
    MissingSchema { mode: ResourceMode, name: String },
    #[error("provider request failed")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// File backed [Provider]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub resources: IndexMap<String, ManifestEntry>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub data_sources: IndexMap<String, ManifestEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestEntry {
    /// Defaults to whether [ManifestEntry::schema] is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Block>,
}

impl ManifestEntry {
    pub fn schema_available(&self) -> bool {
        self.schema_available.unwrap_or(self.schema.is_some())
    }
}

impl Manifest {
    fn entries(&self, mode: ResourceMode) -> &IndexMap<String, ManifestEntry> {
        match mode {
            ResourceMode::Managed => &self.resources,
            ResourceMode::Data => &self.data_sources,
        }
    }

    fn listing(&self, mode: ResourceMode) -> Vec<TypeMetadata> {
        self.entries(mode)
            .iter()
            .map(|(name, entry)| TypeMetadata::new(name.clone(), entry.schema_available()))
            .collect()
    }

    fn lookup(&self, mode: ResourceMode, name: &str) -> Result<Block, ProviderError> {
        let entry = self
            .entries(mode)
            .get(name)
            .ok_or_else(|| ProviderError::UnknownType {
                mode,
                name: name.to_string(),
            })?;

        entry
            .schema
            .clone()
            .ok_or_else(|| ProviderError::MissingSchema {
                mode,
                name: name.to_string(),
            })
    }
}

impl Provider for Manifest {
    fn resources(&self) -> Vec<TypeMetadata> {
        self.listing(ResourceMode::Managed)
    }

    fn data_sources(&self) -> Vec<TypeMetadata> {
        self.listing(ResourceMode::Data)
    }

    fn resource_type_schema(&self, name: &str) -> Result<Block, ProviderError> {
        self.lookup(ResourceMode::Managed, name)
    }

    fn data_source_schema(&self, name: &str) -> Result<Block, ProviderError> {
        self.lookup(ResourceMode::Data, name)
    }
}
