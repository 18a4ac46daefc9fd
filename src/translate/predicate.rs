//! Predicate input AST and its fluent builder.
//!
//! Callers never hand the translator SQL text. They build a small tree of
//! [`Node`]s through [`field`], [`Col`], [`lit`], [`captured`] and the
//! [`PredicateExt`] combinators:
//!
//! ```ignore
//! use quarry::prelude::*;
//!
//! let min_total = settings.min_total;
//! let predicate = Order::CUSTOMER_ID
//!     .eq(5)
//!     .and(Order::CREATE_DATE.is_not_null())
//!     .and(field("total").gte(captured("min_total", move || min_total)))
//!     .and(Order::SKU.starts_with("SKU_"));
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::sql::FieldType;
use crate::value::Value;

/// A predicate or value expression.
#[derive(Clone)]
pub enum Node {
    /// A field of the queried entity (field name, not column name).
    Column(String),

    /// A constant.
    Literal(Value),

    /// An outer value read when the predicate is translated.
    Captured {
        name: String,
        eval: Arc<dyn Fn() -> Value + Send + Sync>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    Unary { op: UnaryOp, operand: Box<Node> },

    /// Method call on a field, such as a prefix match.
    Method {
        method: Method,
        target: Box<Node>,
        argument: Box<Node>,
    },

    /// Trusted SQL emitted verbatim. Never build this from user input.
    Raw(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    // Parsed but not translatable
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Coalesce,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Coalesce => "COALESCE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    /// Type conversion; transparent in SQL.
    Convert(FieldType),
    Negate,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => f.write_str("NOT"),
            UnaryOp::Convert(ty) => write!(f, "CAST AS {}", ty),
            UnaryOp::Negate => f.write_str("unary -"),
        }
    }
}

/// Methods callable on a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    StartsWith,
    EndsWith,
    Contains,
    /// Anything else; rejected by the translator.
    Other(String),
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::StartsWith => f.write_str("StartsWith"),
            Method::EndsWith => f.write_str("EndsWith"),
            Method::Contains => f.write_str("Contains"),
            Method::Other(name) => f.write_str(name),
        }
    }
}

impl Node {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Node::Column(name) => format!("field {}", name),
            Node::Literal(v) => format!("{} literal", v.type_name()),
            Node::Captured { name, .. } => format!("captured value {}", name),
            Node::Binary { op, .. } => format!("operator {}", op),
            Node::Unary { op, .. } => format!("operator {}", op),
            Node::Method { method, .. } => format!("method {}", method),
            Node::Raw(_) => "raw sql".to_string(),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Column(name) => f.debug_tuple("Column").field(name).finish(),
            Node::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Node::Captured { name, .. } => f.debug_struct("Captured").field("name", name).finish(),
            Node::Binary { op, left, right } => f
                .debug_struct("Binary")
                .field("op", op)
                .field("left", left)
                .field("right", right)
                .finish(),
            Node::Unary { op, operand } => f
                .debug_struct("Unary")
                .field("op", op)
                .field("operand", operand)
                .finish(),
            Node::Method {
                method,
                target,
                argument,
            } => f
                .debug_struct("Method")
                .field("method", method)
                .field("target", target)
                .field("argument", argument)
                .finish(),
            Node::Raw(sql) => f.debug_tuple("Raw").field(sql).finish(),
        }
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Reference a field of the queried entity by name.
pub fn field(name: &str) -> Node {
    Node::Column(name.into())
}

pub fn lit(value: impl Into<Value>) -> Node {
    Node::Literal(value.into())
}

pub fn null() -> Node {
    Node::Literal(Value::Null)
}

/// An outer value, evaluated each time the predicate is translated.
pub fn captured<F, V>(name: &str, eval: F) -> Node
where
    F: Fn() -> V + Send + Sync + 'static,
    V: Into<Value>,
{
    Node::Captured {
        name: name.into(),
        eval: Arc::new(move || eval().into()),
    }
}

/// Trusted SQL fragment, emitted as-is.
///
/// # Security Warning
///
/// **Never pass user input to this function.** It is the one place where
/// text reaches the command without becoming a bound parameter.
pub fn raw_sql(sql: &str) -> Node {
    Node::Raw(sql.into())
}

/// A typed handle to an entity field, usually declared as an associated const.
///
/// ```ignore
/// impl Order {
///     pub const CUSTOMER_ID: Col<i32> = Col::new("customer_id");
/// }
/// ```
pub struct Col<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> Col<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Col<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Col<T> {}

impl<T> fmt::Debug for Col<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Col").field(&self.name).finish()
    }
}

// =============================================================================
// Conversion into nodes
// =============================================================================

/// Anything usable as an operand: nodes, field handles and plain values.
pub trait IntoNode {
    fn into_node(self) -> Node;
}

impl IntoNode for Node {
    fn into_node(self) -> Node {
        self
    }
}

impl<T> IntoNode for Col<T> {
    fn into_node(self) -> Node {
        Node::Column(self.name.to_string())
    }
}

macro_rules! literal_into_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoNode for $ty {
                fn into_node(self) -> Node {
                    Node::Literal(self.into())
                }
            }
        )*
    };
}

literal_into_node!(
    bool,
    i16,
    i32,
    i64,
    f32,
    f64,
    String,
    &str,
    Vec<u8>,
    NaiveDate,
    NaiveDateTime,
    Uuid,
    Value,
);

impl<T: Into<Value>> IntoNode for Option<T> {
    fn into_node(self) -> Node {
        Node::Literal(self.into())
    }
}

// =============================================================================
// Combinators
// =============================================================================

fn binary(left: Node, op: BinaryOp, right: Node) -> Node {
    Node::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn method(target: Node, method: Method, argument: Node) -> Node {
    Node::Method {
        method,
        target: Box::new(target),
        argument: Box::new(argument),
    }
}

/// Fluent predicate combinators for [`Node`] and [`Col`].
pub trait PredicateExt: IntoNode + Sized {
    fn binary(self, op: BinaryOp, other: impl IntoNode) -> Node {
        binary(self.into_node(), op, other.into_node())
    }

    fn eq(self, other: impl IntoNode) -> Node {
        self.binary(BinaryOp::Eq, other)
    }

    fn ne(self, other: impl IntoNode) -> Node {
        self.binary(BinaryOp::Ne, other)
    }

    fn lt(self, other: impl IntoNode) -> Node {
        self.binary(BinaryOp::Lt, other)
    }

    fn lte(self, other: impl IntoNode) -> Node {
        self.binary(BinaryOp::Lte, other)
    }

    fn gt(self, other: impl IntoNode) -> Node {
        self.binary(BinaryOp::Gt, other)
    }

    fn gte(self, other: impl IntoNode) -> Node {
        self.binary(BinaryOp::Gte, other)
    }

    fn and(self, other: impl IntoNode) -> Node {
        self.binary(BinaryOp::And, other)
    }

    fn or(self, other: impl IntoNode) -> Node {
        self.binary(BinaryOp::Or, other)
    }

    fn not(self) -> Node {
        Node::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self.into_node()),
        }
    }

    fn cast(self, ty: FieldType) -> Node {
        Node::Unary {
            op: UnaryOp::Convert(ty),
            operand: Box::new(self.into_node()),
        }
    }

    #[allow(clippy::wrong_self_convention)]
    fn is_null(self) -> Node {
        self.eq(null())
    }

    #[allow(clippy::wrong_self_convention)]
    fn is_not_null(self) -> Node {
        self.ne(null())
    }

    fn starts_with(self, prefix: impl IntoNode) -> Node {
        method(self.into_node(), Method::StartsWith, prefix.into_node())
    }

    fn ends_with(self, suffix: impl IntoNode) -> Node {
        method(self.into_node(), Method::EndsWith, suffix.into_node())
    }

    fn contains(self, fragment: impl IntoNode) -> Node {
        method(self.into_node(), Method::Contains, fragment.into_node())
    }

    /// Any other method by name. Only the three above translate.
    fn call(self, name: &str, argument: impl IntoNode) -> Node {
        method(
            self.into_node(),
            Method::Other(name.into()),
            argument.into_node(),
        )
    }
}

impl PredicateExt for Node {}

impl<T> PredicateExt for Col<T> {}
