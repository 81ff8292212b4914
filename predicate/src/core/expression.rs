use std::{fmt, sync::Arc};

use super::ScalarValue;

/// Reference identifying a feature attribute used inside predicates.
///
/// The path is kept verbatim (for example `address/city` for nested
/// properties); whether it resolves is decided by the schema at split time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeRef {
    /// Attribute path as written by the caller.
    pub path: Arc<str>,
}

impl AttributeRef {
    /// Creates a new attribute reference from a path.
    #[must_use]
    pub fn new<N>(path: N) -> Self
    where
        N: Into<Arc<str>>,
    {
        Self { path: path.into() }
    }
}

/// Binary arithmetic operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MathOp {
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Subtract,
    /// Multiplication (`*`).
    Multiply,
    /// Division (`/`).
    Divide,
}

impl MathOp {
    /// Returns a textual representation of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MathOp::Add => "+",
            MathOp::Subtract => "-",
            MathOp::Multiply => "*",
            MathOp::Divide => "/",
        }
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value-producing node referenced by predicates.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// Reference to a feature attribute.
    Attribute(AttributeRef),
    /// Literal value.
    Literal(ScalarValue),
    /// Binary arithmetic.
    Math {
        /// Operator.
        op: MathOp,
        /// Left operand.
        left: Box<Expression>,
        /// Right operand.
        right: Box<Expression>,
    },
    /// Named function call. A missing name marks a call that could not be resolved.
    Function {
        /// Function name.
        name: Option<Arc<str>>,
        /// Positional arguments.
        args: Vec<Expression>,
    },
}

impl Expression {
    /// Reference to the attribute at `path`.
    #[must_use]
    pub fn attribute<N>(path: N) -> Self
    where
        N: Into<Arc<str>>,
    {
        Expression::Attribute(AttributeRef::new(path))
    }

    /// Literal expression.
    #[must_use]
    pub fn literal<V>(value: V) -> Self
    where
        V: Into<ScalarValue>,
    {
        Expression::Literal(value.into())
    }

    /// Arithmetic expression `left op right`.
    #[must_use]
    pub fn math<L, R>(left: L, op: MathOp, right: R) -> Self
    where
        L: Into<Expression>,
        R: Into<Expression>,
    {
        Expression::Math {
            op,
            left: Box::new(left.into()),
            right: Box::new(right.into()),
        }
    }

    /// Call of the function `name` with the supplied arguments.
    #[must_use]
    pub fn function<N, I>(name: N, args: I) -> Self
    where
        N: Into<Arc<str>>,
        I: IntoIterator<Item = Expression>,
    {
        Expression::Function {
            name: Some(name.into()),
            args: args.into_iter().collect(),
        }
    }
}

impl From<AttributeRef> for Expression {
    fn from(value: AttributeRef) -> Self {
        Self::Attribute(value)
    }
}

impl From<ScalarValue> for Expression {
    fn from(value: ScalarValue) -> Self {
        Self::Literal(value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Attribute(attribute) => f.write_str(&attribute.path),
            Expression::Literal(value) => write!(f, "{value}"),
            Expression::Math { op, left, right } => write!(f, "({left} {op} {right})"),
            Expression::Function { name, args } => {
                f.write_str(name.as_deref().unwrap_or("<unnamed>"))?;
                f.write_str("(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
