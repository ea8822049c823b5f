//! interpolated variables
//!
//! A canonical key such as `aws_instance.web.0.id` or `var.region` is classified into an
//! [InterpolatedVariable]:
//!
//! | key                          | variable                                                        |
//! |------------------------------|-----------------------------------------------------------------|
//! | `var.region`                 | user variable `region`                                          |
//! | `var.amis.us-east-1`         | user variable `amis`, element `us-east-1`                       |
//! | `aws_instance.web`           | every instance of `aws_instance.web` (index -1, multi)          |
//! | `aws_instance.web.*.id`      | attribute `id` of every instance (index -1, multi)              |
//! | `aws_instance.web.2.id`      | attribute `id` of instance 2 (multi)                            |
//! | `aws_instance.web.id`        | attribute `id` of the single instance (index -1, not multi)     |
//! | `data.aws_ami.ubuntu.id`     | same rules for data sources                                     |
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Roots that are not resource types but belong to other kinds of variables
const RESERVED_NAMESPACES: &[&str] = &["count", "path", "self", "terraform", "module", "local"];

const USER_NAMESPACE: &str = "var";

/// A value an expression depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterpolatedVariable {
    User(UserVariable),
    Resource(ResourceVariable),
}

impl FromStr for InterpolatedVariable {
    type Err = VariableNameError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        if key.is_empty() {
            return Err(VariableNameError::Empty);
        }

        if key == USER_NAMESPACE {
            return Err(VariableNameError::MissingUserName(key.to_string()));
        }

        if let Some(rest) = key.strip_prefix("var.") {
            return UserVariable::parse(key, rest).map(InterpolatedVariable::User);
        }

        ResourceVariable::parse(key).map(InterpolatedVariable::Resource)
    }
}

/// Reference to an input variable, `var.NAME`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_new::new)]
pub struct UserVariable {
    pub name: String,
    /// Path into the variable's value, empty when the whole value is referenced
    pub elem: String,
}

impl UserVariable {
    fn parse(key: &str, rest: &str) -> Result<Self, VariableNameError> {
        let (name, elem) = rest.split_once('.').unwrap_or((rest, ""));
        if name.is_empty() {
            return Err(VariableNameError::MissingUserName(key.to_string()));
        }

        Ok(Self::new(name.to_string(), elem.to_string()))
    }
}

/// Reference to an attribute or instance of a managed resource or data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceVariable {
    pub mode: ResourceMode,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Selected instance, or [ResourceVariable::ALL_INSTANCES]
    pub index: i64,
    /// Attribute after the instance selector, empty when whole instances are referenced
    pub field: String,
    /// Set when an instance selector (`*` or a number) is present, or no attribute is given at all
    pub multi: bool,
}

impl ResourceVariable {
    pub const ALL_INSTANCES: i64 = -1;

    /// `TYPE.NAME` or `data.TYPE.NAME`
    pub fn resource_id(&self) -> String {
        match self.mode {
            ResourceMode::Managed => format!("{}.{}", self.resource_type, self.name),
            ResourceMode::Data => format!("data.{}.{}", self.resource_type, self.name),
        }
    }

    /// References every instance of the resource
    pub fn is_splat(&self) -> bool {
        self.multi && self.index == Self::ALL_INSTANCES
    }

    fn parse(key: &str) -> Result<Self, VariableNameError> {
        let (mode, rest) = match key.strip_prefix("data.") {
            Some(rest) => (ResourceMode::Data, rest),
            None => (ResourceMode::Managed, key),
        };

        let mut parts = rest.splitn(3, '.');
        let resource_type = parts.next().unwrap_or_default();
        let Some(name) = parts.next() else {
            return Err(VariableNameError::TooFewParts(key.to_string()));
        };

        if resource_type.is_empty() || name.is_empty() {
            return Err(VariableNameError::EmptyPart(key.to_string()));
        }

        if mode == ResourceMode::Managed && RESERVED_NAMESPACES.contains(&resource_type) {
            return Err(VariableNameError::ReservedNamespace {
                key: key.to_string(),
                namespace: resource_type.to_string(),
            });
        }

        let (index, multi, field) = match parts.next() {
            None => (Self::ALL_INSTANCES, true, ""),
            Some(rest) => {
                let (selector, tail) = rest.split_once('.').unwrap_or((rest, ""));
                let field = tail.split('.').next().unwrap_or_default();

                if selector == "*" {
                    (Self::ALL_INSTANCES, true, field)
                } else if let Ok(index) = selector.parse::<i64>() {
                    (index, true, field)
                } else {
                    (Self::ALL_INSTANCES, false, selector)
                }
            }
        };

        Ok(Self {
            mode,
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            index,
            field: field.to_string(),
            multi,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    /// `resource` blocks
    Managed,
    /// `data` blocks
    Data,
}

impl fmt::Display for ResourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceMode::Managed => f.write_str("resource"),
            ResourceMode::Data => f.write_str("data source"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VariableNameError {
    #[error("empty variable name")]
    Empty,
    #[error("{0}: user variables must be of the form var.NAME")]
    MissingUserName(String),
    #[error("{0}: resource variables must have at least two parts: TYPE.NAME")]
    TooFewParts(String),
    #[error("{0}: resource type and name must not be empty")]
    EmptyPart(String),
    #[error("{key}: {namespace:?} does not name a resource type")]
    ReservedNamespace { key: String, namespace: String },
}
