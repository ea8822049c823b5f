use super::Visit;
use crate::spec::{DecodeSpec, Rule};
use hcl::{
    template::{Directive, Element},
    Body, Expression, ObjectKey, Operation, Structure, Template, Traversal, TraversalOperator,
};

/// Recursively visit all absolute [hcl::Traversal]s
///
/// A traversal is absolute when its root is a variable (`var.region`, `aws_instance.web[0].id`). Traversals of
/// other expressions (`f(x)[0]`) are not visited themselves, their expression is searched instead.
pub trait VisitTraversals {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>);
}

/// A [Body] as seen through a [DecodeSpec]
///
/// Only attributes and blocks named in the [DecodeSpec] are searched, just like a decoder would only ever evaluate those.
#[derive(derive_new::new)]
pub struct SpecBody<'a> {
    body: &'a Body,
    spec: &'a DecodeSpec,
}

impl VisitTraversals for SpecBody<'_> {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>) {
        for structure in self.body.iter() {
            match structure {
                Structure::Attribute(attr) => {
                    if !matches!(self.spec.get(attr.key()), Some(Rule::Attr(_))) {
                        tracing::trace!(name = attr.key(), "attribute not in spec");
                        continue;
                    }

                    attr.expr().visit_traversals(visitor);
                }
                Structure::Block(block) => {
                    let Some(rule) = self.spec.get(block.identifier()) else {
                        tracing::trace!(name = block.identifier(), "block not in spec");
                        continue;
                    };

                    let (Some(nested), Some(label_names)) = (rule.nested(), rule.label_names())
                    else {
                        tracing::trace!(name = block.identifier(), "block where attribute expected");
                        continue;
                    };

                    if block.labels().len() != label_names.len() {
                        tracing::trace!(
                            name = block.identifier(),
                            labels = block.labels().len(),
                            expected = label_names.len(),
                            "block label mismatch"
                        );
                        continue;
                    }

                    SpecBody::new(block.body(), nested).visit_traversals(visitor);
                }
            }
        }
    }
}

impl VisitTraversals for Expression {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>) {
        match self {
            Expression::Variable(variable) => {
                // a standalone variable is a traversal with no operators...kind of
                let traversal = Traversal::new(
                    Expression::Variable(variable.clone()),
                    Vec::<TraversalOperator>::new(),
                );
                visitor.visit(&traversal);
            }
            Expression::Traversal(traversal) => {
                if matches!(traversal.expr, Expression::Variable(_)) {
                    visitor.visit(traversal);
                } else {
                    traversal.expr.visit_traversals(visitor);
                }

                for operator in &traversal.operators {
                    if let TraversalOperator::Index(index) = operator {
                        index.visit_traversals(visitor);
                    }
                }
            }
            Expression::Array(array) => {
                for expr in array {
                    expr.visit_traversals(visitor);
                }
            }
            Expression::Object(object) => {
                for (key, value) in object {
                    if let ObjectKey::Expression(key) = key {
                        key.visit_traversals(visitor);
                    }
                    value.visit_traversals(visitor);
                }
            }
            Expression::TemplateExpr(template_expr) => match Template::from_expr(template_expr) {
                Ok(template) => template.visit_traversals(visitor),
                Err(err) => tracing::debug!(%err, "unable to parse template"),
            },
            Expression::FuncCall(func_call) => {
                for arg in &func_call.args {
                    arg.visit_traversals(visitor);
                }
            }
            Expression::Parenthesis(expr) => {
                expr.visit_traversals(visitor);
            }
            Expression::Conditional(cond) => {
                cond.cond_expr.visit_traversals(visitor);
                cond.true_expr.visit_traversals(visitor);
                cond.false_expr.visit_traversals(visitor);
            }
            Expression::Operation(operation) => match operation.as_ref() {
                Operation::Binary(binop) => {
                    binop.lhs_expr.visit_traversals(visitor);
                    binop.rhs_expr.visit_traversals(visitor);
                }
                Operation::Unary(unop) => {
                    unop.expr.visit_traversals(visitor);
                }
            },
            Expression::ForExpr(forexpr) => {
                forexpr.collection_expr.visit_traversals(visitor);

                let bound = forexpr
                    .key_var
                    .iter()
                    .chain(Some(&forexpr.value_var))
                    .map(|ident| ident.as_str())
                    .collect();
                let scoped = &mut Scoped {
                    bound,
                    inner: &mut *visitor,
                };

                forexpr
                    .key_expr
                    .iter()
                    .for_each(|e| e.visit_traversals(scoped));
                forexpr.value_expr.visit_traversals(scoped);
                forexpr
                    .cond_expr
                    .iter()
                    .for_each(|e| e.visit_traversals(scoped));
            }
            _ => {}
        }
    }
}

impl VisitTraversals for Template {
    fn visit_traversals(&self, visitor: &mut dyn Visit<Traversal>) {
        for element in self.elements() {
            match element {
                Element::Interpolation(interpolation) => {
                    interpolation.expr.visit_traversals(visitor);
                }
                Element::Directive(directive) => match directive {
                    Directive::If(ifdir) => {
                        ifdir.cond_expr.visit_traversals(visitor);
                        ifdir.true_template.visit_traversals(visitor);
                        ifdir
                            .false_template
                            .iter()
                            .for_each(|t| t.visit_traversals(visitor));
                    }
                    Directive::For(fordir) => {
                        fordir.collection_expr.visit_traversals(visitor);

                        let bound = fordir
                            .key_var
                            .iter()
                            .chain(Some(&fordir.value_var))
                            .map(|ident| ident.as_str())
                            .collect();
                        fordir.template.visit_traversals(&mut Scoped {
                            bound,
                            inner: &mut *visitor,
                        });
                    }
                },
                Element::Literal(_) => {}
            }
        }
    }
}

/// Hides traversals of variables bound by an enclosing `for`
struct Scoped<'a, V: ?Sized> {
    bound: Vec<&'a str>,
    inner: &'a mut V,
}

impl<V> Visit<Traversal> for Scoped<'_, V>
where
    V: Visit<Traversal> + ?Sized,
{
    fn visit(&mut self, traversal: &Traversal) {
        if let Expression::Variable(variable) = &traversal.expr {
            if self.bound.contains(&variable.as_str()) {
                tracing::trace!(variable = variable.as_str(), "skip bound variable");
                return;
            }
        }

        self.inner.visit(traversal);
    }
}
