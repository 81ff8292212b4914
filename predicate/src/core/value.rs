use std::{cmp::Ordering, fmt, sync::Arc};

/// Axis-aligned bounding rectangle used as the literal geometry representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    /// Minimum x ordinate.
    pub min_x: f64,
    /// Minimum y ordinate.
    pub min_y: f64,
    /// Maximum x ordinate.
    pub max_x: f64,
    /// Maximum y ordinate.
    pub max_y: f64,
}

impl Envelope {
    /// Creates an envelope, normalising the corner order.
    #[must_use]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Degenerate envelope covering a single point.
    #[must_use]
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    /// Returns true when the two rectangles share at least one point.
    #[must_use]
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Returns true when `other` lies entirely inside this rectangle.
    #[must_use]
    pub fn contains(&self, other: &Envelope) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Euclidean gap between the two rectangles; zero when they intersect.
    #[must_use]
    pub fn distance(&self, other: &Envelope) -> f64 {
        let dx = (other.min_x - self.max_x).max(self.min_x - other.max_x).max(0.0);
        let dy = (other.min_y - self.max_y).max(self.min_y - other.max_y).max(0.0);
        dx.hypot(dy)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ENVELOPE({} {}, {} {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Literal values accepted by predicate expressions.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    /// Absent or unset literal.
    Null,
    /// Boolean literal.
    Boolean(bool),
    /// Signed 64-bit integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    Utf8(Arc<str>),
    /// Literal geometry, carried as its bounding rectangle.
    Geometry(Envelope),
}

impl ScalarValue {
    /// Returns true when the literal is the `Null` variant.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Returns the numeric value widened to `f64`, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int64(v) => Some(*v as f64),
            ScalarValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string slice when this is a UTF-8 literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Utf8(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the envelope when this is a geometry literal.
    #[must_use]
    pub fn as_envelope(&self) -> Option<&Envelope> {
        match self {
            ScalarValue::Geometry(v) => Some(v),
            _ => None,
        }
    }

    /// Compares this scalar with another, returning the ordering when both sides are comparable.
    ///
    /// Integers and floats compare numerically with each other; `Null` and
    /// geometries never order.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        use ScalarValue::*;
        match (self, other) {
            (Null, _) | (_, Null) => None,
            (Boolean(lhs), Boolean(rhs)) => Some(lhs.cmp(rhs)),
            (Int64(lhs), Int64(rhs)) => Some(lhs.cmp(rhs)),
            (Utf8(lhs), Utf8(rhs)) => Some(lhs.cmp(rhs)),
            (Int64(_) | Float64(_), Int64(_) | Float64(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("NULL"),
            ScalarValue::Boolean(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{v:?}"),
            ScalarValue::Utf8(v) => write!(f, "'{}'", v.replace('\'', "''")),
            ScalarValue::Geometry(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int64(i64::from(value))
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.into())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value.into())
    }
}

impl From<Envelope> for ScalarValue {
    fn from(value: Envelope) -> Self {
        ScalarValue::Geometry(value)
    }
}

impl<T> From<Option<T>> for ScalarValue
where
    T: Into<ScalarValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(ScalarValue::Null, Into::into)
    }
}
