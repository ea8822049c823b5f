//! variable lowering
//!
//! Turns the traversals a body references into canonical keys and [InterpolatedVariable]s.
//!
//! | traversal                          | canonical key                  |
//! |------------------------------------|--------------------------------|
//! | `var.region`                       | `var.region`                   |
//! | `test_resource.foo[1].bar["baz"]`  | `test_resource.foo.1.bar.baz`  |
//! | `test_resource.splatted.*.id`      | `test_resource.splatted`       |
//! | `aws_instance.web[1.5]`            | skipped, not a whole index     |
//!
//! String indices are appended as they are. A key containing a `.` is indistinguishable from two steps:
//! `foo["a.b"]` and `foo.a.b` lower to the same key.
//!
//! Lowering never fails. Traversals that cannot be lowered are reported in [Lowering::skipped] and logged; they
//! are diagnosed again once the expression is evaluated.
use crate::{
    schema::Block,
    spec::DecodeSpec,
    variable::{InterpolatedVariable, VariableNameError},
};
use hcl::{Expression, Number, Traversal, TraversalOperator};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

const SEPARATOR: char = '.';

/// Provides the traversals a body references but cannot resolve itself
pub trait TraversalSource {
    fn traversals(&self, spec: &DecodeSpec) -> Vec<Traversal>;
}

/// Find all variables referenced by `body`
pub fn detect_variables<S>(body: &S, schema: &Block) -> Lowering
where
    S: TraversalSource + ?Sized,
{
    detect_variables_with_spec(body, &schema.decoder_spec())
}

/// Same as [detect_variables] for an already compiled spec
pub fn detect_variables_with_spec<S>(body: &S, spec: &DecodeSpec) -> Lowering
where
    S: TraversalSource + ?Sized,
{
    lower_traversals(&body.traversals(spec))
}

/// Lower each traversal to a canonical key and classify it
///
/// Traversals with the same key are stored once, the last one wins.
pub fn lower_traversals<'t, I>(traversals: I) -> Lowering
where
    I: IntoIterator<Item = &'t Traversal>,
{
    let mut lowering = Lowering::default();

    for traversal in traversals {
        let key = match flatten(traversal) {
            Flattened::Full(key) => key,
            Flattened::Partial(key) => {
                tracing::trace!(%key, "partial traversal");
                key
            }
            Flattened::Skip(skipped) => {
                tracing::debug!(key = %skipped.key, reason = %skipped.reason, "skip traversal");
                lowering.skipped.push(skipped);
                continue;
            }
        };

        match key.parse::<InterpolatedVariable>() {
            Ok(variable) => {
                lowering.variables.insert(key, variable);
            }
            Err(err) => {
                tracing::warn!(%key, %err, "unable to classify variable");
                lowering
                    .skipped
                    .push(Skipped::new(key, SkipReason::Unclassifiable(err)));
            }
        }
    }

    lowering
}

/// Result of [flatten]
#[derive(Debug, Clone, PartialEq)]
pub enum Flattened {
    /// Every step was lowered
    Full(String),
    /// Lowering stopped at an unsupported step, the key covers the steps before it
    Partial(String),
    /// The traversal cannot be lowered at all
    Skip(Skipped),
}

/// Lower a traversal to its canonical key
///
/// Root and attribute steps contribute their name, numeric indices their decimal value and string indices their
/// raw value. Splats and computed indices end the key.
pub fn flatten(traversal: &Traversal) -> Flattened {
    let Expression::Variable(root) = &traversal.expr else {
        return Flattened::Skip(Skipped::new(String::new(), SkipReason::NotAbsolute));
    };

    let mut key = root.as_str().to_string();
    let mut complete = true;

    for operator in &traversal.operators {
        let step = match operator {
            TraversalOperator::GetAttr(ident) => ident.as_str().to_string(),
            TraversalOperator::Index(Expression::String(index)) => index.clone(),
            TraversalOperator::Index(Expression::Number(index)) => match whole_index(index) {
                Some(index) => index.to_string(),
                None => {
                    return Flattened::Skip(Skipped::new(
                        key,
                        SkipReason::InvalidIndex(index.clone()),
                    ))
                }
            },
            TraversalOperator::LegacyIndex(index) => match i64::try_from(*index) {
                Ok(index) => index.to_string(),
                Err(_) => {
                    return Flattened::Skip(Skipped::new(
                        key,
                        SkipReason::InvalidIndex(Number::from(*index)),
                    ))
                }
            },
            _ => {
                complete = false;
                break;
            }
        };

        key.push(SEPARATOR);
        key.push_str(&step);
    }

    // an empty string index leaves a dangling separator
    if key.ends_with(SEPARATOR) {
        key.pop();
    }

    if complete {
        Flattened::Full(key)
    } else {
        Flattened::Partial(key)
    }
}

/// The integer value of `number` if it has one
fn whole_index(number: &Number) -> Option<i64> {
    if let Some(index) = number.as_i64() {
        return Some(index);
    }

    if !number.is_f64() {
        // integer beyond i64
        return None;
    }

    let float = number.as_f64()?;
    let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
    if float.fract() == 0.0 && in_range {
        Some(float as i64)
    } else {
        None
    }
}

/// Variables of a body and the traversals that did not make it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Lowering {
    pub variables: BTreeMap<String, InterpolatedVariable>,
    pub skipped: Vec<Skipped>,
}

impl Lowering {
    pub fn into_variables(self) -> BTreeMap<String, InterpolatedVariable> {
        self.variables
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, derive_new::new)]
pub struct Skipped {
    /// Canonical key, or the part of it lowered before the problem was found
    pub key: String,
    #[serde(serialize_with = "serialize_display")]
    pub reason: SkipReason,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("index {0} is not a whole number")]
    InvalidIndex(Number),
    #[error("traversal is not rooted at a variable")]
    NotAbsolute,
    #[error(transparent)]
    Unclassifiable(VariableNameError),
}

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: std::fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        schema::{Attribute, NestedBlock, NestingMode, ValueType},
        variable::{ResourceMode, ResourceVariable, UserVariable},
    };
    use pretty_assertions::assert_eq;

    fn traversal(expr: &str) -> Traversal {
        match hcl::parse(&format!("value = {expr}"))
            .expect("body must parse")
            .into_attributes()
            .next()
            .map(|attr| attr.expr)
        {
            Some(Expression::Traversal(traversal)) => *traversal,
            Some(Expression::Variable(variable)) => {
                Traversal::new(variable, Vec::<TraversalOperator>::new())
            }
            other => panic!("not a traversal: {other:?}"),
        }
    }

    fn user(name: &str) -> InterpolatedVariable {
        InterpolatedVariable::User(UserVariable::new(name.into(), "".into()))
    }

    #[test]
    fn flatten_steps() {
        assert_eq!(
            flatten(&traversal("test_resource.foo[1].bar[\"baz\"]")),
            Flattened::Full("test_resource.foo.1.bar.baz".into())
        );
        assert_eq!(
            flatten(&traversal("aws_instance.web.0.id")),
            Flattened::Full("aws_instance.web.0.id".into())
        );
        assert_eq!(flatten(&traversal("standalone")), Flattened::Full("standalone".into()));
    }

    #[test]
    fn string_index_keeps_dots() {
        assert_eq!(
            flatten(&traversal("var.map[\"a.b\"]")),
            flatten(&traversal("var.map.a.b"))
        );
    }

    #[test]
    fn unsupported_steps_keep_prefix() {
        assert_eq!(
            flatten(&traversal("test_resource.splatted.*.id")),
            Flattened::Partial("test_resource.splatted".into())
        );
        assert_eq!(
            flatten(&traversal("test_resource.foo[*].id")),
            Flattened::Partial("test_resource.foo".into())
        );
        assert_eq!(
            flatten(&traversal("var.map[var.key].id")),
            Flattened::Partial("var.map".into())
        );
        assert_eq!(
            flatten(&traversal("var.list[true]")),
            Flattened::Partial("var.list".into())
        );
    }

    /// `root.first.second...` followed by `operators`
    fn build(path: &str, operators: Vec<TraversalOperator>) -> Traversal {
        let mut names = path.split('.');
        let root = hcl::Variable::unchecked(names.next().unwrap_or_default());
        let steps = names
            .map(|name| TraversalOperator::GetAttr(hcl::Identifier::unchecked(name)))
            .chain(operators);
        Traversal::new(root, steps.collect::<Vec<_>>())
    }

    fn index(number: Number) -> TraversalOperator {
        TraversalOperator::Index(Expression::Number(number))
    }

    #[test]
    fn numeric_indices() {
        let whole_float = build("var.list", vec![index(Number::from_f64(2.0).unwrap())]);
        assert_eq!(flatten(&whole_float), Flattened::Full("var.list.2".into()));

        let fraction = build(
            "var.list",
            vec![
                index(Number::from_f64(1.5).unwrap()),
                TraversalOperator::GetAttr(hcl::Identifier::unchecked("after")),
            ],
        );
        assert!(matches!(
            flatten(&fraction),
            Flattened::Skip(Skipped { key, reason: SkipReason::InvalidIndex(_) }) if key == "var.list"
        ));

        let too_large = build("var.list", vec![index(Number::from(u64::MAX))]);
        assert!(matches!(
            flatten(&too_large),
            Flattened::Skip(Skipped { reason: SkipReason::InvalidIndex(_), .. })
        ));

        let too_large_float = build("var.list", vec![index(Number::from_f64(1e300).unwrap())]);
        assert!(matches!(
            flatten(&too_large_float),
            Flattened::Skip(Skipped { reason: SkipReason::InvalidIndex(_), .. })
        ));
    }

    #[test]
    fn legacy_indices() {
        let legacy = build(
            "aws_instance.web",
            vec![
                TraversalOperator::LegacyIndex(3),
                TraversalOperator::GetAttr(hcl::Identifier::unchecked("id")),
            ],
        );
        assert_eq!(flatten(&legacy), Flattened::Full("aws_instance.web.3.id".into()));

        let overflow = build("aws_instance.web", vec![TraversalOperator::LegacyIndex(u64::MAX)]);
        assert!(matches!(
            flatten(&overflow),
            Flattened::Skip(Skipped { reason: SkipReason::InvalidIndex(_), .. })
        ));
    }

    #[test]
    fn empty_string_index_is_trimmed() {
        let traversal = build(
            "var.map",
            vec![TraversalOperator::Index(Expression::String(String::new()))],
        );
        assert_eq!(flatten(&traversal), Flattened::Full("var.map".into()));
    }

    #[test]
    fn relative_traversals_are_skipped() {
        let relative = Traversal::new(
            Expression::Array(vec![]),
            vec![TraversalOperator::LegacyIndex(0)],
        );
        assert_eq!(
            flatten(&relative),
            Flattened::Skip(Skipped::new(String::new(), SkipReason::NotAbsolute))
        );
    }

    #[test]
    fn partial_keys_have_no_trailing_separator() {
        let traversal = build(
            "first.second",
            vec![
                TraversalOperator::AttrSplat,
                TraversalOperator::GetAttr(hcl::Identifier::unchecked("fourth")),
            ],
        );

        assert_eq!(flatten(&traversal), Flattened::Partial("first.second".into()));
    }

    #[test]
    fn flatten_is_deterministic() {
        let traversal = traversal("test_resource.foo[1].bar[\"baz\"]");
        assert_eq!(flatten(&traversal), flatten(&traversal));
    }

    #[test]
    fn lowering_deduplicates_keys() {
        let traversals = vec![traversal("var.list1"), traversal("var.list1"), traversal("var.list2")];

        let lowering = lower_traversals(&traversals);

        assert_eq!(
            lowering.variables,
            BTreeMap::from([
                ("var.list1".to_string(), user("list1")),
                ("var.list2".to_string(), user("list2")),
            ])
        );
        assert!(lowering.skipped.is_empty());
    }

    #[test]
    fn lowering_reports_skipped() {
        let traversals = vec![
            traversal("var.ok"),
            traversal("x"),
            traversal("var.list[1.5]"),
            traversal("count.index"),
        ];

        let lowering = lower_traversals(&traversals);

        assert_eq!(lowering.variables.keys().collect::<Vec<_>>(), vec!["var.ok"]);
        assert_eq!(
            lowering
                .skipped
                .iter()
                .map(|skipped| skipped.key.as_str())
                .collect::<Vec<_>>(),
            vec!["x", "var.list", "count.index"]
        );
        assert!(matches!(
            lowering.skipped[0].reason,
            SkipReason::Unclassifiable(VariableNameError::TooFewParts(_))
        ));
        assert!(matches!(lowering.skipped[1].reason, SkipReason::InvalidIndex(_)));
    }

    #[test]
    fn skipped_serializes_reason_as_message() {
        let skipped = Skipped::new("x".into(), SkipReason::NotAbsolute);
        assert_eq!(
            serde_json::to_value(&skipped).unwrap(),
            serde_json::json!({"key": "x", "reason": "traversal is not rooted at a variable"})
        );
    }

    fn schema() -> Block {
        let string = || Attribute::required(ValueType::String);
        let strings = || Attribute::required(ValueType::list(ValueType::String));

        Block::new()
            .with_attribute("literal", string())
            .with_attribute("interp", string())
            .with_attribute("var", string())
            .with_attribute("list", strings())
            .with_attribute("complex", string())
            .with_attribute("splat", strings())
            .with_attribute("for_expr", strings())
            .with_block_type(
                "block",
                NestedBlock::new(
                    NestingMode::Single,
                    Block::new().with_attribute("in_block", string()),
                ),
            )
    }

    #[test]
    fn detect_variables_in_body() {
        let body = hcl::parse(
            r#"
literal = "hello"
interp  = "${var.interp}"
var     = var.var
list    = [var.list1, var.list2, var.list1]

complex = test_resource.foo[1].bar["baz"]

splat = test_resource.splatted.*.id

for_expr = [for x in var.for_expr: [x, var.for_expr_elem]]

ignored_because_not_in_schema = var.ignored

block {
  in_block = var.in_block
}
"#,
        )
        .expect("body must parse");

        let lowering = detect_variables(&body, &schema());

        let expected = BTreeMap::from([
            ("var.interp".to_string(), user("interp")),
            ("var.var".to_string(), user("var")),
            ("var.list1".to_string(), user("list1")),
            ("var.list2".to_string(), user("list2")),
            (
                "test_resource.foo.1.bar.baz".to_string(),
                InterpolatedVariable::Resource(ResourceVariable {
                    mode: ResourceMode::Managed,
                    resource_type: "test_resource".into(),
                    name: "foo".into(),
                    index: 1,
                    field: "bar".into(),
                    multi: true,
                }),
            ),
            (
                "test_resource.splatted".to_string(),
                InterpolatedVariable::Resource(ResourceVariable {
                    mode: ResourceMode::Managed,
                    resource_type: "test_resource".into(),
                    name: "splatted".into(),
                    index: -1,
                    field: "".into(),
                    multi: true,
                }),
            ),
            ("var.for_expr".to_string(), user("for_expr")),
            ("var.for_expr_elem".to_string(), user("for_expr_elem")),
            ("var.in_block".to_string(), user("in_block")),
        ]);

        assert_eq!(lowering.variables, expected);
        assert!(lowering.skipped.is_empty());
    }

    #[test]
    fn precompiled_spec_gives_same_result() {
        let body = hcl::parse("var = var.var\nblock {\n  in_block = var.in_block\n}\n")
            .expect("body must parse");
        let schema = schema();

        assert_eq!(
            detect_variables_with_spec(&body, &schema.decoder_spec()),
            detect_variables(&body, &schema)
        );
    }
}
