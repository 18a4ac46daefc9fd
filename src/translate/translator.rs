//! Recursive descent from [`Node`] trees to parameterized SQL expressions.
//!
//! Two positions exist. In *predicate* position a node must produce a
//! boolean: comparisons, AND/OR/NOT, method matches, bool fields and raw SQL.
//! In *value* position it must produce an operand: fields, literals and
//! captured values. Anything else is a [`TranslationError`].

use serde::Serialize;

use super::params::{Binding, ParamSet};
use super::predicate::{BinaryOp, Method, Node, UnaryOp};
use crate::error::TranslationError;
use crate::metadata::TableDefinition;
use crate::sql::{paren, BinaryOperator, Dialect, Expr, ExprExt, FieldType, SqlDialect};
use crate::value::Value;

type Result<T> = std::result::Result<T, TranslationError>;

/// Translates predicates over one table into a shared [`ParamSet`].
pub struct Translator<'a> {
    table: &'a TableDefinition,
    qualifier: Option<String>,
    params: &'a mut ParamSet,
}

impl<'a> Translator<'a> {
    /// `qualifier` prefixes every column (`[t].[CustomerID]`); `None` leaves
    /// columns bare.
    pub fn new(table: &'a TableDefinition, qualifier: Option<&str>, params: &'a mut ParamSet) -> Self {
        Self {
            table,
            qualifier: qualifier.map(String::from),
            params,
        }
    }

    /// Translate a node in predicate position.
    pub fn predicate(&mut self, node: &Node) -> Result<Expr> {
        match node {
            Node::Binary { op, left, right } if op.is_logical() => {
                let left = self.predicate(left)?;
                let right = self.predicate(right)?;
                let op = match op {
                    BinaryOp::And => BinaryOperator::And,
                    _ => BinaryOperator::Or,
                };
                Ok(paren(left.binary(op, right)))
            }

            Node::Binary { op, left, right } if op.is_comparison() => {
                self.comparison(*op, left, right)
            }

            Node::Binary { op, .. } => Err(TranslationError::UnsupportedOperator {
                operator: op.to_string(),
            }),

            Node::Unary {
                op: UnaryOp::Not,
                operand,
            } => {
                let inner = self.predicate(operand)?;
                if inner.is_parenthesized() {
                    Ok(inner.not())
                } else {
                    Ok(paren(inner).not())
                }
            }

            Node::Unary {
                op: UnaryOp::Convert(_),
                operand,
            } => self.predicate(operand),

            Node::Unary { op, .. } => Err(TranslationError::UnsupportedOperator {
                operator: op.to_string(),
            }),

            Node::Column(name) if self.field_type(name) == Some(FieldType::Bool) => {
                let column = self.column(name)?;
                Ok(column.eq(self.params.bind(Value::Bool(true))))
            }

            Node::Method {
                method,
                target,
                argument,
            } => self.pattern_match(method, target, argument),

            // Grouped so an OR inside the fragment cannot bind to its neighbours
            Node::Raw(sql) => Ok(paren(Expr::Raw(sql.clone()))),

            other => Err(TranslationError::UnexpectedNode {
                node: other.describe(),
                position: "a predicate",
            }),
        }
    }

    /// Translate a node in value position.
    pub fn value(&mut self, node: &Node) -> Result<Expr> {
        match node {
            Node::Column(name) => self.column(name),
            Node::Literal(value) => Ok(self.params.bind(value.clone())),
            Node::Captured { eval, .. } => Ok(self.params.bind(eval())),
            Node::Unary {
                op: UnaryOp::Convert(_),
                operand,
            } => self.value(operand),
            Node::Raw(sql) => Ok(Expr::Raw(sql.clone())),

            Node::Binary { op, .. } if !op.is_comparison() && !op.is_logical() => {
                Err(TranslationError::UnsupportedOperator {
                    operator: op.to_string(),
                })
            }
            Node::Unary {
                op: UnaryOp::Negate,
                ..
            } => Err(TranslationError::UnsupportedOperator {
                operator: UnaryOp::Negate.to_string(),
            }),

            other => Err(TranslationError::UnexpectedNode {
                node: other.describe(),
                position: "a value",
            }),
        }
    }

    fn comparison(&mut self, op: BinaryOp, left: &Node, right: &Node) -> Result<Expr> {
        // Captured values are evaluated exactly once
        let left_value = constant(left);
        let right_value = constant(right);

        let null_side = match (&left_value, &right_value) {
            (_, Some(Value::Null)) => Some((left, left_value.clone())),
            (Some(Value::Null), _) => Some((right, right_value.clone())),
            _ => None,
        };

        if let Some((operand, operand_value)) = null_side {
            let negated = match op {
                BinaryOp::Eq => false,
                BinaryOp::Ne => true,
                _ => {
                    return Err(TranslationError::NullOrdering {
                        operator: op.to_string(),
                    })
                }
            };
            let expr = self.operand(operand, operand_value)?;
            return Ok(if negated { expr.is_not_null() } else { expr.is_null() });
        }

        let left = self.operand(left, left_value)?;
        let right = self.operand(right, right_value)?;
        let op = match op {
            BinaryOp::Eq => BinaryOperator::Eq,
            BinaryOp::Ne => BinaryOperator::Ne,
            BinaryOp::Lt => BinaryOperator::Lt,
            BinaryOp::Lte => BinaryOperator::Lte,
            BinaryOp::Gt => BinaryOperator::Gt,
            _ => BinaryOperator::Gte,
        };
        Ok(left.binary(op, right))
    }

    fn operand(&mut self, node: &Node, evaluated: Option<Value>) -> Result<Expr> {
        match evaluated {
            Some(value) => Ok(self.params.bind(value)),
            None => self.value(node),
        }
    }

    fn pattern_match(&mut self, method: &Method, target: &Node, argument: &Node) -> Result<Expr> {
        let wrap: fn(&str) -> String = match method {
            Method::StartsWith => |s| format!("{}%", s),
            Method::EndsWith => |s| format!("%{}", s),
            Method::Contains => |s| format!("%{}%", s),
            Method::Other(name) => {
                return Err(TranslationError::UnsupportedMethod {
                    method: name.clone(),
                })
            }
        };

        let column = match strip_convert(target) {
            Node::Column(name) => self.column(name)?,
            other => {
                return Err(TranslationError::UnexpectedNode {
                    node: other.describe(),
                    position: "a method target",
                })
            }
        };

        let text = match constant(argument) {
            Some(Value::Text(text)) => text,
            Some(other) => {
                return Err(TranslationError::InvalidPattern {
                    method: method.to_string(),
                    found: other.type_name().to_string(),
                })
            }
            None => {
                return Err(TranslationError::InvalidPattern {
                    method: method.to_string(),
                    found: argument.describe(),
                })
            }
        };

        Ok(column.like(self.params.bind(Value::Text(wrap(&text)))))
    }

    fn column(&self, name: &str) -> Result<Expr> {
        if let Some(column) = self.table.column(name) {
            return Ok(Expr::Column {
                table: self.qualifier.clone(),
                column: column.name.clone(),
            });
        }
        if let Some(custom) = self.table.custom_column(name) {
            let dialect = self.params.dialect();
            let alias = dialect.quote_identifier(self.qualifier.as_deref().unwrap_or(&self.table.table));
            return Ok(paren(Expr::Raw(custom.template.replace("{alias}", &alias))));
        }
        Err(TranslationError::UnknownField {
            entity: self.table.entity.clone(),
            field: name.to_string(),
        })
    }

    fn field_type(&self, name: &str) -> Option<FieldType> {
        self.table
            .column(name)
            .map(|c| c.field_type)
            .or_else(|| self.table.custom_column(name).map(|c| c.field_type))
    }
}

/// Literal or captured value behind any number of conversions.
fn constant(node: &Node) -> Option<Value> {
    match strip_convert(node) {
        Node::Literal(value) => Some(value.clone()),
        Node::Captured { eval, .. } => Some(eval()),
        _ => None,
    }
}

fn strip_convert(node: &Node) -> &Node {
    match node {
        Node::Unary {
            op: UnaryOp::Convert(_),
            operand,
        } => strip_convert(operand),
        other => other,
    }
}

/// A translated predicate rendered for one dialect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub sql: String,
    pub bindings: Vec<Binding>,
}

/// Translate a standalone predicate over `table` aliased as `alias`.
///
/// Bindings are named `p1`, `p2`, ... within the fragment.
pub fn translate(
    predicate: &Node,
    table: &TableDefinition,
    alias: &str,
    dialect: Dialect,
) -> Result<Fragment> {
    let mut params = ParamSet::new(dialect, "p");
    let expr = Translator::new(table, Some(alias), &mut params).predicate(predicate)?;
    Ok(Fragment {
        sql: expr.to_tokens().serialize(dialect),
        bindings: params.into_bindings(),
    })
}
