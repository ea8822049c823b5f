//! semantic value types
//!
//! Serialized the same way cty encodes types as JSON:
//! - primitives are plain strings: `"bool"`, `"number"`, `"string"`, `"dynamic"`
//! - collections are pairs: `["list", "string"]`, `["set", "number"]`, `["map", "bool"]`
//! - structural types carry their members: `["object", {"id": "string"}]`, `["tuple", ["string", "number"]]`
use indexmap::IndexMap;
use serde::{
    de::{self, SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::fmt;

const PRIMITIVES: &[&str] = &["bool", "number", "string", "dynamic"];
const COMPOUNDS: &[&str] = &["list", "set", "map", "object", "tuple"];

/// Type of a value an attribute (or a whole block) decodes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Bool,
    Number,
    String,
    /// Any type, decided when the value is known
    Dynamic,
    List(Box<ValueType>),
    Set(Box<ValueType>),
    Map(Box<ValueType>),
    Object(IndexMap<String, ValueType>),
    Tuple(Vec<ValueType>),
}

impl ValueType {
    pub fn list(element: ValueType) -> Self {
        Self::List(Box::new(element))
    }

    pub fn set(element: ValueType) -> Self {
        Self::Set(Box::new(element))
    }

    pub fn map(element: ValueType) -> Self {
        Self::Map(Box::new(element))
    }

    pub fn object<K, I>(attributes: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ValueType)>,
    {
        Self::Object(
            attributes
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        )
    }

    /// Element type of a list, set or map
    pub fn element_type(&self) -> Option<&ValueType> {
        match self {
            ValueType::List(element) | ValueType::Set(element) | ValueType::Map(element) => {
                Some(element)
            }
            _ => None,
        }
    }
}

/// Renders the type in hcl type constraint syntax, e.g. `list(object({id=string}))`
impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => f.write_str("bool"),
            ValueType::Number => f.write_str("number"),
            ValueType::String => f.write_str("string"),
            ValueType::Dynamic => f.write_str("any"),
            ValueType::List(element) => write!(f, "list({element})"),
            ValueType::Set(element) => write!(f, "set({element})"),
            ValueType::Map(element) => write!(f, "map({element})"),
            ValueType::Object(attributes) => {
                f.write_str("object({")?;
                for (i, (name, ty)) in attributes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}={ty}")?;
                }
                f.write_str("})")
            }
            ValueType::Tuple(elements) => {
                f.write_str("tuple([")?;
                for (i, ty) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str("])")
            }
        }
    }
}

impl Serialize for ValueType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ValueType::Bool => serializer.serialize_str("bool"),
            ValueType::Number => serializer.serialize_str("number"),
            ValueType::String => serializer.serialize_str("string"),
            ValueType::Dynamic => serializer.serialize_str("dynamic"),
            ValueType::List(element) => ("list", element).serialize(serializer),
            ValueType::Set(element) => ("set", element).serialize(serializer),
            ValueType::Map(element) => ("map", element).serialize(serializer),
            ValueType::Object(attributes) => ("object", attributes).serialize(serializer),
            ValueType::Tuple(elements) => ("tuple", elements).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueTypeVisitor)
    }
}

struct ValueTypeVisitor;

const EXPECTED_PAIR: &str = "a [kind, argument] pair";

impl<'de> Visitor<'de> for ValueTypeVisitor {
    type Value = ValueType;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a primitive type name or ")?;
        f.write_str(EXPECTED_PAIR)
    }

    fn visit_str<E>(self, value: &str) -> Result<ValueType, E>
    where
        E: de::Error,
    {
        match value {
            "bool" => Ok(ValueType::Bool),
            "number" => Ok(ValueType::Number),
            "string" => Ok(ValueType::String),
            "dynamic" => Ok(ValueType::Dynamic),
            other => Err(E::unknown_variant(other, PRIMITIVES)),
        }
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<ValueType, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let kind: String = element(&mut seq, 0)?;

        let ty = match kind.as_str() {
            "list" => ValueType::list(element(&mut seq, 1)?),
            "set" => ValueType::set(element(&mut seq, 1)?),
            "map" => ValueType::map(element(&mut seq, 1)?),
            "object" => ValueType::Object(element(&mut seq, 1)?),
            "tuple" => ValueType::Tuple(element(&mut seq, 1)?),
            other => return Err(de::Error::unknown_variant(other, COMPOUNDS)),
        };

        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(3, &EXPECTED_PAIR));
        }

        Ok(ty)
    }
}

fn element<'de, T, A>(seq: &mut A, index: usize) -> Result<T, A::Error>
where
    T: Deserialize<'de>,
    A: SeqAccess<'de>,
{
    seq.next_element()?
        .ok_or_else(|| de::Error::invalid_length(index, &EXPECTED_PAIR))
}
