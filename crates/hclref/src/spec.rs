//! decode specifications
//!
//! [Block::decoder_spec] compiles a schema into a [DecodeSpec]: one [Rule] per attribute and per nested block
//! type. A body decoder walks a configuration body with it; [crate::visit] uses it to find the traversals a
//! body references.
use crate::schema::{Block, NestingMode, ValueType};
use indexmap::IndexMap;
use serde::Serialize;

/// Label names of blocks decoded by a [Rule::BlockMap]
///
/// Schemas cannot declare labels, so map-nested blocks always take exactly one label called `key`.
pub const MAP_LABEL_NAMES: &[&str] = &["key"];

/// Compiled form of a [Block]
///
/// Keys are exactly the attribute names and block type names of the source block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DecodeSpec(IndexMap<String, Rule>);

impl DecodeSpec {
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How to decode one name of a body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    Attr(AttrSpec),
    /// [NestingMode::Single]: one object or null
    Block(BlockSpec),
    /// [NestingMode::List]
    BlockList(BlockSpec),
    /// [NestingMode::Set]
    BlockSet(BlockSpec),
    /// [NestingMode::Map]
    BlockMap(BlockMapSpec),
}

impl Rule {
    /// Attribute name or block type name
    pub fn name(&self) -> &str {
        match self {
            Rule::Attr(attr) => &attr.name,
            Rule::Block(block) | Rule::BlockList(block) | Rule::BlockSet(block) => &block.type_name,
            Rule::BlockMap(block) => &block.type_name,
        }
    }

    /// Spec of the body inside blocks of this type
    pub fn nested(&self) -> Option<&DecodeSpec> {
        match self {
            Rule::Attr(_) => None,
            Rule::Block(block) | Rule::BlockList(block) | Rule::BlockSet(block) => {
                Some(&block.nested)
            }
            Rule::BlockMap(block) => Some(&block.nested),
        }
    }

    /// Labels a block of this type carries, `None` for attributes
    pub fn label_names(&self) -> Option<&[String]> {
        match self {
            Rule::Attr(_) => None,
            Rule::Block(_) | Rule::BlockList(_) | Rule::BlockSet(_) => Some(&[]),
            Rule::BlockMap(block) => Some(&block.label_names),
        }
    }

    /// Nesting mode the rule was compiled from, `None` for attributes
    pub fn nesting(&self) -> Option<NestingMode> {
        match self {
            Rule::Attr(_) => None,
            Rule::Block(_) => Some(NestingMode::Single),
            Rule::BlockList(_) => Some(NestingMode::List),
            Rule::BlockSet(_) => Some(NestingMode::Set),
            Rule::BlockMap(_) => Some(NestingMode::Map),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, derive_new::new)]
pub struct AttrSpec {
    pub name: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub ty: ValueType,
}

#[derive(Debug, Clone, PartialEq, Serialize, derive_new::new)]
pub struct BlockSpec {
    pub type_name: String,
    pub nested: DecodeSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockMapSpec {
    pub type_name: String,
    pub nested: DecodeSpec,
    pub label_names: Vec<String>,
}

impl BlockMapSpec {
    pub fn new(type_name: impl Into<String>, nested: DecodeSpec, label_names: &[&str]) -> Self {
        Self {
            type_name: type_name.into(),
            nested,
            label_names: label_names.iter().map(|label| label.to_string()).collect(),
        }
    }
}

impl Block {
    /// Compile this schema into a [DecodeSpec]
    ///
    /// Attributes are copied verbatim, nested block types are compiled recursively and wrapped by their nesting
    /// mode. A block type sharing its name with an attribute replaces the attribute's rule ([Block::validate]
    /// reports such schemas).
    ///
    /// # Panic
    /// Panics on a block type with [NestingMode::Invalid]. That schema was built incorrectly and there is no
    /// meaningful spec for it.
    pub fn decoder_spec(&self) -> DecodeSpec {
        let mut spec = IndexMap::with_capacity(self.attributes.len() + self.block_types.len());

        for (name, attribute) in &self.attributes {
            spec.insert(
                name.clone(),
                Rule::Attr(AttrSpec::new(
                    name.clone(),
                    attribute.required,
                    attribute.ty.clone(),
                )),
            );
        }

        for (name, nested) in &self.block_types {
            let child = nested.block.decoder_spec();
            let rule = match nested.nesting {
                NestingMode::Single => Rule::Block(BlockSpec::new(name.clone(), child)),
                NestingMode::List => Rule::BlockList(BlockSpec::new(name.clone(), child)),
                NestingMode::Set => Rule::BlockSet(BlockSpec::new(name.clone(), child)),
                NestingMode::Map => {
                    Rule::BlockMap(BlockMapSpec::new(name.as_str(), child, MAP_LABEL_NAMES))
                }
                NestingMode::Invalid => panic!(
                    "unsupported child block nesting mode {} for {name:?}",
                    nested.nesting
                ),
            };
            spec.insert(name.clone(), rule);
        }

        DecodeSpec(spec)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{Attribute, NestedBlock};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn child() -> Block {
        Block::new().with_attribute("port", Attribute::required(ValueType::Number))
    }

    fn schema() -> Block {
        Block::new()
            .with_attribute("name", Attribute::required(ValueType::String))
            .with_attribute("tags", Attribute::optional(ValueType::map(ValueType::String)))
            .with_block_type("single", NestedBlock::new(NestingMode::Single, child()))
            .with_block_type("list", NestedBlock::new(NestingMode::List, child()))
            .with_block_type("set", NestedBlock::new(NestingMode::Set, child()))
            .with_block_type("map", NestedBlock::new(NestingMode::Map, child()))
    }

    #[test]
    fn names_match_schema() {
        let schema = schema();
        let spec = schema.decoder_spec();

        let expected: BTreeSet<&str> = schema
            .attributes
            .keys()
            .chain(schema.block_types.keys())
            .map(String::as_str)
            .collect();
        let names: BTreeSet<&str> = spec.names().collect();

        assert_eq!(names, expected);
        assert_eq!(spec.len(), 6);
    }

    #[test]
    fn attributes_are_copied_verbatim() {
        let spec = schema().decoder_spec();

        assert_eq!(
            spec.get("tags"),
            Some(&Rule::Attr(AttrSpec::new(
                "tags".into(),
                false,
                ValueType::map(ValueType::String)
            )))
        );
        assert_eq!(
            spec.get("name"),
            Some(&Rule::Attr(AttrSpec::new("name".into(), true, ValueType::String)))
        );
    }

    #[test]
    fn rules_follow_nesting_mode() {
        let schema = schema();
        let spec = schema.decoder_spec();

        for (name, nested) in &schema.block_types {
            let rule = spec.get(name).expect("block type must be compiled");
            assert_eq!(rule.nesting(), Some(nested.nesting));
            assert_eq!(rule.name(), name.as_str());
            assert_eq!(rule.nested(), Some(&child().decoder_spec()));
        }

        assert!(matches!(spec.get("single"), Some(Rule::Block(_))));
        assert!(matches!(spec.get("list"), Some(Rule::BlockList(_))));
        assert!(matches!(spec.get("set"), Some(Rule::BlockSet(_))));

        let Some(Rule::BlockMap(map)) = spec.get("map") else {
            panic!("map block type must compile to a map rule");
        };
        assert_eq!(map.label_names, vec!["key".to_string()]);
    }

    #[test]
    fn nested_specs_are_compiled_recursively() {
        let schema = Block::new().with_block_type(
            "outer",
            NestedBlock::new(
                NestingMode::List,
                Block::new().with_block_type("inner", NestedBlock::new(NestingMode::Map, child())),
            ),
        );

        let spec = schema.decoder_spec();
        let inner = spec
            .get("outer")
            .and_then(Rule::nested)
            .and_then(|outer| outer.get("inner"))
            .expect("inner block type must be compiled");

        assert_eq!(inner.label_names(), Some(["key".to_string()].as_slice()));
        assert!(matches!(
            inner.nested().and_then(|spec| spec.get("port")),
            Some(Rule::Attr(attr)) if attr.required
        ));
    }

    #[test]
    fn compiling_is_deterministic() {
        assert_eq!(schema().decoder_spec(), schema().decoder_spec());
    }

    #[test]
    fn empty_schema() {
        assert!(Block::new().decoder_spec().is_empty());
    }

    #[test]
    #[should_panic(expected = "unsupported child block nesting mode invalid for \"broken\"")]
    fn invalid_nesting_aborts() {
        let schema = Block::new()
            .with_attribute("fine", Attribute::optional(ValueType::String))
            .with_block_type("broken", NestedBlock::new(NestingMode::Invalid, child()));

        schema.decoder_spec();
    }
}
