//! Predicate translation.
//!
//! ```text
//! Node tree ──▶ Translator ──▶ sql::Expr (with Param placeholders)
//!                   │
//!                   └──▶ ParamSet ──▶ Vec<Binding> (name, position, value)
//! ```
//!
//! Every literal and captured value becomes a binding; the only text that
//! reaches the command unbound is [`Node::Raw`].

mod params;
mod predicate;
mod translator;

pub use params::{Binding, ParamSet};
pub use predicate::{
    captured, field, lit, null, raw_sql, BinaryOp, Col, IntoNode, Method, Node, PredicateExt,
    UnaryOp,
};
pub use translator::{translate, Fragment, Translator};
