//! schema model
//!
//! A [Block] describes the shape of one configuration body: its attributes and the block types that may be
//! nested inside it. Nested block types own their child [Block], so a schema is always a tree.
//!
//! ```hcl
//! # attributes of the resource's block
//! ami           = "ami-123"
//! instance_type = "t3.micro"
//!
//! # a nested block type ("ebs_block_device") with NestingMode::List
//! ebs_block_device {
//!   device_name = "/dev/sdb"
//! }
//! ```
//!
//! Schemas are read-only once constructed and can be shared freely between threads.
mod value_type;

pub use value_type::ValueType;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema node describing a configuration body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, Attribute>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub block_types: IndexMap<String, NestedBlock>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn with_block_type(mut self, name: impl Into<String>, nested: NestedBlock) -> Self {
        self.block_types.insert(name.into(), nested);
        self
    }

    /// The object type a body decoded with this schema produces
    ///
    /// Attributes contribute their own type, nested block types are wrapped according to their nesting mode.
    ///
    /// # Panic
    /// Panics on [NestingMode::Invalid], see [Block::validate]
    pub fn implied_type(&self) -> ValueType {
        let mut attributes: IndexMap<String, ValueType> = self
            .attributes
            .iter()
            .map(|(name, attribute)| (name.clone(), attribute.ty.clone()))
            .collect();

        for (name, nested) in &self.block_types {
            let child = nested.block.implied_type();
            let ty = match nested.nesting {
                NestingMode::Single => child,
                NestingMode::List => ValueType::list(child),
                NestingMode::Set => ValueType::set(child),
                NestingMode::Map => ValueType::map(child),
                NestingMode::Invalid => {
                    panic!("invalid nesting mode for block type {name:?}")
                }
            };
            attributes.insert(name.clone(), ty);
        }

        ValueType::Object(attributes)
    }

    /// Check the schema for mistakes the type system does not rule out
    ///
    /// All issues of the whole tree are reported at once.
    pub fn validate(&self) -> Result<(), InvalidSchema> {
        let mut issues = vec![];
        self.collect_issues("", &mut issues);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(InvalidSchema { issues })
        }
    }

    fn collect_issues(&self, prefix: &str, issues: &mut Vec<SchemaIssue>) {
        let path = |name: &str| {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            }
        };

        for (name, attribute) in &self.attributes {
            if hcl::Identifier::new(name.as_str()).is_err() {
                issues.push(SchemaIssue::InvalidName(path(name)));
            }
            if attribute.required && attribute.optional {
                issues.push(SchemaIssue::RequiredAndOptional(path(name)));
            }
            if attribute.required && attribute.computed {
                issues.push(SchemaIssue::RequiredAndComputed(path(name)));
            }
        }

        for (name, nested) in &self.block_types {
            if hcl::Identifier::new(name.as_str()).is_err() {
                issues.push(SchemaIssue::InvalidName(path(name)));
            }
            if self.attributes.contains_key(name) {
                issues.push(SchemaIssue::NameCollision(path(name)));
            }
            if nested.nesting == NestingMode::Invalid {
                issues.push(SchemaIssue::InvalidNesting(path(name)));
            }

            nested.block.collect_issues(&path(name), issues);
        }
    }
}

/// Leaf of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub ty: ValueType,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub optional: bool,

    /// Set by the provider. Decodes to null when not configured.
    #[serde(default)]
    pub computed: bool,
}

impl Attribute {
    pub fn required(ty: ValueType) -> Self {
        Self {
            ty,
            required: true,
            optional: false,
            computed: false,
        }
    }

    pub fn optional(ty: ValueType) -> Self {
        Self {
            ty,
            required: false,
            optional: true,
            computed: false,
        }
    }

    pub fn computed(ty: ValueType) -> Self {
        Self {
            ty,
            required: false,
            optional: false,
            computed: true,
        }
    }
}

/// A block type that may appear inside a body, and how often
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, derive_new::new)]
pub struct NestedBlock {
    #[serde(default)]
    pub nesting: NestingMode,

    #[serde(default)]
    pub block: Block,
}

/// Repetition semantics of a nested block type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestingMode {
    /// Not a valid mode. Only reachable through [Default], e.g. a schema file without `nesting`.
    #[default]
    #[serde(skip)]
    Invalid,
    /// Exactly one block or null
    Single,
    /// Ordered sequence of blocks, duplicates allowed
    List,
    /// Unordered, deduplicated collection of blocks
    Set,
    /// Blocks keyed by their single label
    Map,
}

impl fmt::Display for NestingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NestingMode::Invalid => f.write_str("invalid"),
            NestingMode::Single => f.write_str("single"),
            NestingMode::List => f.write_str("list"),
            NestingMode::Set => f.write_str("set"),
            NestingMode::Map => f.write_str("map"),
        }
    }
}

/// Every issue found by [Block::validate]
#[derive(Debug)]
pub struct InvalidSchema {
    pub issues: Vec<SchemaIssue>,
}

impl fmt::Display for InvalidSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid schema: ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InvalidSchema {}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SchemaIssue {
    #[error("{0}: name is not a valid identifier")]
    InvalidName(String),
    #[error("{0}: name is used by an attribute and a block type")]
    NameCollision(String),
    #[error("{0}: block type has no valid nesting mode")]
    InvalidNesting(String),
    #[error("{0}: attribute cannot be both required and optional")]
    RequiredAndOptional(String),
    #[error("{0}: attribute cannot be both required and computed")]
    RequiredAndComputed(String),
}
